//! Canonical provider-agnostic types
//!
//! The normalized internal representation both caller dialects convert
//! to and from. Wire formats live in [`crate::protocol`] and are only
//! touched at the boundary.

pub mod message;
pub mod request;
pub mod response;
pub mod stream;
pub mod tool;

pub use message::{Message, Role};
pub use request::{CanonicalRequest, ReasoningEffort};
pub use response::{CanonicalResponse, DegradedInfo, OutputItem, Usage};
pub use stream::StreamEvent;
pub use tool::{ToolChoice, ToolDefinition};
