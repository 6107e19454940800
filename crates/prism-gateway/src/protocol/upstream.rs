//! Responses-style upstream API wire format types
//!
//! The single provider dialect the gateway speaks upstream: a buffered
//! `/responses` completion shape plus a newline-delimited `data:` event
//! feed for streaming.

use serde::{Deserialize, Serialize};

// -- Request types --

/// Upstream completion request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamRequest {
    /// Model identifier
    pub model: String,
    /// Conversation input
    pub input: UpstreamInput,
    /// System instructions (top-level, not in input)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    /// Maximum tokens to generate
    pub max_output_tokens: u32,
    /// Reasoning controls
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<UpstreamReasoning>,
    /// Sampling temperature
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Nucleus sampling threshold
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    /// Response id this turn continues from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_response_id: Option<String>,
    /// Stop sequences
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop: Option<Vec<String>>,
    /// Tool definitions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<UpstreamTool>>,
    /// Tool choice configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<serde_json::Value>,
    /// Whether to stream the response
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
}

/// Upstream input: a bare string or role-tagged turns
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UpstreamInput {
    /// Single user turn shorthand
    Text(String),
    /// Ordered role-tagged turns
    Turns(Vec<UpstreamTurn>),
}

/// One role-tagged input turn
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamTurn {
    /// Turn role
    pub role: String,
    /// Turn content
    pub content: String,
}

/// Reasoning controls on an upstream request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamReasoning {
    /// Requested effort level
    pub effort: String,
}

/// Upstream tool definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamTool {
    /// Tool type (always "function")
    #[serde(rename = "type")]
    pub tool_type: String,
    /// Function name
    pub name: String,
    /// Human-readable description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// JSON Schema for parameters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<serde_json::Value>,
}

// -- Response types --

/// Upstream buffered completion response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamResponse {
    /// Response identifier
    pub id: String,
    /// Object type (always "response")
    pub object: String,
    /// Creation timestamp
    #[serde(default)]
    pub created: u64,
    /// Model used
    pub model: String,
    /// Output items in emission order
    #[serde(default)]
    pub output: Vec<UpstreamOutputItem>,
    /// Token usage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<UpstreamUsage>,
}

/// One item of upstream output
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UpstreamOutputItem {
    /// Assistant message carrying visible content
    Message {
        /// Content parts
        #[serde(default)]
        content: Vec<UpstreamContentPart>,
    },
    /// Hidden deliberation
    Reasoning {
        /// Reasoning transcript
        #[serde(default)]
        content: String,
        /// Item status
        #[serde(default, skip_serializing_if = "Option::is_none")]
        status: Option<String>,
    },
    /// Tool invocation requested by the model
    FunctionCall {
        /// Call identifier
        #[serde(default)]
        call_id: String,
        /// Function name
        name: String,
        /// JSON-encoded arguments
        #[serde(default)]
        arguments: String,
    },
}

/// Content part within an upstream message item
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UpstreamContentPart {
    /// Visible output text
    OutputText {
        /// The text string
        text: String,
    },
}

/// Upstream token usage
///
/// Some deployments report `input_tokens`/`output_tokens`, others
/// `prompt_tokens`/`completion_tokens`; aliases accept both.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpstreamUsage {
    /// Prompt tokens
    #[serde(default, alias = "input_tokens")]
    pub prompt_tokens: u32,
    /// Completion tokens (reasoning included)
    #[serde(default, alias = "output_tokens")]
    pub completion_tokens: u32,
    /// Total tokens
    #[serde(default)]
    pub total_tokens: u32,
    /// Tokens spent on hidden deliberation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning_tokens: Option<u32>,
}

// -- Streaming types --

/// One upstream streaming event, dispatched on its `type` field
///
/// Unknown event types deserialize into `Other` and are ignored by the
/// demultiplexer after a trace log.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum UpstreamStreamEvent {
    /// Stream opened
    #[serde(rename = "response.created")]
    Created {
        /// Partial response carrying identity
        response: UpstreamCreatedResponse,
    },
    /// Incremental visible text
    #[serde(rename = "response.output_text.delta")]
    OutputTextDelta {
        /// Text fragment
        delta: String,
    },
    /// Incremental hidden deliberation
    #[serde(rename = "response.reasoning_text.delta")]
    ReasoningTextDelta {
        /// Reasoning fragment
        delta: String,
    },
    /// Deliberation finished; carries the full transcript
    #[serde(rename = "response.reasoning_text.done")]
    ReasoningTextDone {
        /// Complete reasoning text
        #[serde(default)]
        text: String,
    },
    /// A complete output item was added
    #[serde(rename = "response.output_item.added")]
    OutputItemAdded {
        /// The added item
        item: UpstreamOutputItem,
    },
    /// Stream finished successfully
    #[serde(rename = "response.completed")]
    Completed {
        /// Final response (usage is what matters here)
        response: UpstreamCompletedResponse,
    },
    /// Stream finished with an upstream failure
    #[serde(rename = "response.failed")]
    Failed {
        /// Failure detail
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<UpstreamErrorDetail>,
    },
    /// Bare error event
    #[serde(rename = "error")]
    Error {
        /// Error message
        #[serde(default)]
        message: String,
        /// Error code
        #[serde(default, skip_serializing_if = "Option::is_none")]
        code: Option<String>,
    },
    /// Any event type this gateway does not handle
    #[serde(other)]
    Other,
}

/// Partial response in a `response.created` event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamCreatedResponse {
    /// Response identifier
    pub id: String,
    /// Creation timestamp
    #[serde(default)]
    pub created: u64,
}

/// Final response in a `response.completed` event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamCompletedResponse {
    /// Response identifier
    pub id: String,
    /// Token usage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<UpstreamUsage>,
}

// -- Error response --

/// Upstream error response body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamErrorResponse {
    /// Error details
    pub error: UpstreamErrorDetail,
}

/// Upstream error detail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamErrorDetail {
    /// Error message
    #[serde(default)]
    pub message: String,
    /// Error type
    #[serde(default, rename = "type")]
    pub error_type: String,
    /// Error code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}
