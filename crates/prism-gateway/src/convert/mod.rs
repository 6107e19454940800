//! Conversion between canonical types and the three wire formats
//!
//! Inbound converters turn a caller dialect request into a
//! [`crate::types::CanonicalRequest`]; outbound converters render a
//! [`crate::types::CanonicalResponse`] or stream of
//! [`crate::types::StreamEvent`] back into the caller's dialect; the
//! upstream converter builds the provider request and normalizes its
//! buffered answer.

pub mod claude;
pub mod openai;
pub mod upstream;

pub use claude::{ClaudeStreamEncoder, canonical_to_claude, claude_to_canonical};
pub use openai::{OpenAiStreamEncoder, canonical_to_openai, openai_to_canonical};
pub use upstream::{canonical_to_upstream, upstream_to_canonical};
