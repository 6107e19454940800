//! Shared primitives for the prism gateway
//!
//! Holds the pieces every feature crate needs without pulling in axum:
//! the HTTP error seam, the per-request context, and the message
//! sanitizer used before anything is echoed back to a caller.

pub mod context;
pub mod error;
pub mod sanitize;

pub use context::RequestContext;
pub use error::HttpError;
pub use sanitize::{contains_injection, redact, strip_control_chars};
