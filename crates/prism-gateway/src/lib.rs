//! Translation, streaming, and resilience core of the prism gateway
//!
//! Accepts Claude Messages and OpenAI Chat Completions requests,
//! normalizes them into one canonical shape for a Responses-style
//! upstream, demultiplexes the upstream streaming event feed back into
//! either caller dialect, and wraps every upstream call in circuit
//! breaker, retry, and graceful degradation machinery.

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

pub mod context;
pub mod convert;
pub mod dialect;
pub mod error;
pub mod gateway;
#[cfg(feature = "http")]
pub mod handler;
pub mod protocol;
pub mod provider;
pub mod resilience;
pub mod stream;
pub mod transform;
pub mod transport;
pub mod types;

pub use dialect::IncomingRequest;
pub use error::GatewayError;
pub use gateway::{Gateway, StreamHandle};
#[cfg(feature = "http")]
pub use handler::gateway_router;
pub use provider::{ResponsesProvider, UpstreamProvider};
pub use types::{CanonicalRequest, CanonicalResponse, StreamEvent};
