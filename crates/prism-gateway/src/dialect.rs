//! Caller dialect detection and the parsed request envelope

use prism_config::Dialect;
use serde_json::Value;

use crate::error::GatewayError;
use crate::protocol::claude::ClaudeRequest;
use crate::protocol::openai::OpenAiRequest;

/// A caller request parsed into its wire dialect
///
/// The HTTP layer knows the dialect from the route and parses directly;
/// the detector exists for embedded callers handing over raw JSON.
#[derive(Debug, Clone)]
pub enum IncomingRequest {
    /// Claude Messages shape
    Claude(ClaudeRequest),
    /// OpenAI Chat Completions shape
    OpenAi(OpenAiRequest),
}

impl IncomingRequest {
    /// Detect the dialect of a raw JSON body and parse it
    pub fn parse(body: &[u8], default: Dialect) -> Result<Self, GatewayError> {
        let value: Value = serde_json::from_slice(body).map_err(|e| GatewayError::Validation {
            field: "body".to_owned(),
            message: format!("invalid JSON: {e}"),
        })?;
        let dialect = detect_dialect(&value, default);
        Self::parse_as(value, dialect)
    }

    /// Parse a JSON body as a specific dialect
    pub fn parse_as(value: Value, dialect: Dialect) -> Result<Self, GatewayError> {
        let invalid = |e: serde_json::Error| GatewayError::Validation {
            field: "body".to_owned(),
            message: format!("request does not match the {} shape: {e}", dialect_name(dialect)),
        };
        match dialect {
            Dialect::Claude => Ok(Self::Claude(serde_json::from_value(value).map_err(invalid)?)),
            Dialect::Openai => Ok(Self::OpenAi(serde_json::from_value(value).map_err(invalid)?)),
        }
    }

    /// The dialect this request arrived in
    pub const fn dialect(&self) -> Dialect {
        match self {
            Self::Claude(_) => Dialect::Claude,
            Self::OpenAi(_) => Dialect::Openai,
        }
    }

    /// Whether the caller requested streaming
    pub fn wants_stream(&self) -> bool {
        match self {
            Self::Claude(req) => req.stream.unwrap_or(false),
            Self::OpenAi(req) => req.stream.unwrap_or(false),
        }
    }
}

/// Classify a JSON request body into one of the two caller dialects
///
/// Fields unique to one dialect decide; ambiguous bodies fall back to
/// the configured default. Detection happens once, at parse time.
pub fn detect_dialect(value: &Value, default: Dialect) -> Dialect {
    let Some(obj) = value.as_object() else {
        return default;
    };

    // Fields only the Chat Completions dialect carries
    if obj.contains_key("max_completion_tokens")
        || obj.contains_key("response_format")
        || obj.contains_key("reasoning_effort")
    {
        return Dialect::Openai;
    }

    // Top-level system string and stop_sequences are Claude-only
    if obj.get("system").is_some_and(Value::is_string) || obj.contains_key("stop_sequences") {
        return Dialect::Claude;
    }

    // Claude requires max_tokens; Chat Completions callers usually omit it
    if obj.contains_key("max_tokens") && !obj.contains_key("stop") {
        return Dialect::Claude;
    }

    // Tool shape differs: Claude tools carry input_schema, OpenAI nest a function
    if let Some(first_tool) = obj.get("tools").and_then(|t| t.get(0)) {
        if first_tool.get("input_schema").is_some() {
            return Dialect::Claude;
        }
        if first_tool.get("function").is_some() {
            return Dialect::Openai;
        }
    }

    default
}

const fn dialect_name(dialect: Dialect) -> &'static str {
    match dialect {
        Dialect::Claude => "Claude Messages",
        Dialect::Openai => "Chat Completions",
    }
}
