//! Streaming demultiplexer for the upstream event feed
//!
//! Reassembles logical lines from arbitrary byte frames, dispatches
//! each `data:` record on its event type, and reduces the upstream
//! event algebra to [`crate::types::StreamEvent`] with exactly-once
//! terminal semantics and cancellation that closes the upstream
//! transport.

pub mod demux;
pub mod line;
pub mod session;

pub use demux::demux_events;
pub use line::LineAssembler;
pub use session::StreamSession;
