use serde::{Deserialize, Serialize};

use super::response::Usage;

/// Normalized streaming event
///
/// The demultiplexer reduces the upstream wire events to this set;
/// dialect encoders render each variant into their own SSE shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Stream opened; carries the upstream response identity
    Created {
        /// Upstream response identifier
        id: String,
        /// Unix timestamp of creation
        created: u64,
    },
    /// Incremental visible text
    TextDelta {
        /// Text fragment
        text: String,
    },
    /// Incremental hidden deliberation; traced, never forwarded
    ReasoningDelta {
        /// Reasoning fragment
        text: String,
    },
    /// Complete tool invocation requested by the model
    ToolCall {
        /// Call identifier
        id: String,
        /// Tool name
        name: String,
        /// JSON-encoded arguments
        arguments: String,
    },
    /// Terminal event; emitted exactly once per stream
    Completed {
        /// Final token usage (estimated when upstream omits it)
        usage: Usage,
    },
}

impl StreamEvent {
    /// Whether this event terminates the stream
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}
