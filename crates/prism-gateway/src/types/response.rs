use serde::{Deserialize, Serialize};

/// One item of upstream model output, in emission order
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutputItem {
    /// Visible assistant text
    Text {
        /// The text string
        text: String,
    },
    /// Hidden deliberation; never shown to callers
    Reasoning {
        /// Reasoning transcript
        content: String,
        /// Upstream-reported status (e.g. "completed")
        #[serde(default, skip_serializing_if = "Option::is_none")]
        status: Option<String>,
    },
    /// Tool invocation requested by the model
    ToolCall {
        /// Call identifier
        id: String,
        /// Tool name
        name: String,
        /// JSON-encoded arguments
        arguments: String,
    },
}

/// Token usage statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    /// Tokens consumed by the prompt
    pub prompt_tokens: u32,
    /// Tokens generated in the completion (reasoning included)
    pub completion_tokens: u32,
    /// Total tokens
    pub total_tokens: u32,
    /// Tokens spent on hidden deliberation, when reported
    ///
    /// Informational extra; already counted inside `completion_tokens`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning_tokens: Option<u32>,
}

/// Identity of the fallback that produced a degraded response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DegradedInfo {
    /// Which fallback answered (provider name or "static")
    pub fallback: String,
}

/// Internal canonical completion response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalResponse {
    /// Upstream response identifier
    pub id: String,
    /// Unix timestamp of creation
    pub created: u64,
    /// Model that generated the output
    pub model: String,
    /// Output items in upstream emission order
    pub output: Vec<OutputItem>,
    /// Token usage
    pub usage: Usage,
    /// Set when a fallback produced this response instead of the primary
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub degraded: Option<DegradedInfo>,
}

impl CanonicalResponse {
    /// Visible assistant text: ordered concatenation of text items
    ///
    /// Reasoning items are excluded by construction.
    pub fn visible_text(&self) -> String {
        self.output
            .iter()
            .filter_map(|item| match item {
                OutputItem::Text { text } => Some(text.as_str()),
                OutputItem::Reasoning { .. } | OutputItem::ToolCall { .. } => None,
            })
            .collect()
    }

    /// Tool calls requested by the model, in order
    pub fn tool_calls(&self) -> Vec<(&str, &str, &str)> {
        self.output
            .iter()
            .filter_map(|item| match item {
                OutputItem::ToolCall { id, name, arguments } => {
                    Some((id.as_str(), name.as_str(), arguments.as_str()))
                }
                _ => None,
            })
            .collect()
    }

    /// Whether any tool-call item is present
    pub fn has_tool_calls(&self) -> bool {
        self.output.iter().any(|item| matches!(item, OutputItem::ToolCall { .. }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(output: Vec<OutputItem>) -> CanonicalResponse {
        CanonicalResponse {
            id: "resp_1".into(),
            created: 1,
            model: "m".into(),
            output,
            usage: Usage::default(),
            degraded: None,
        }
    }

    #[test]
    fn visible_text_concatenates_in_order() {
        let resp = response(vec![
            OutputItem::Text { text: "Hello".into() },
            OutputItem::Reasoning {
                content: "secret chain of thought".into(),
                status: None,
            },
            OutputItem::Text { text: ", world".into() },
        ]);
        assert_eq!(resp.visible_text(), "Hello, world");
    }

    #[test]
    fn reasoning_is_never_visible() {
        let resp = response(vec![OutputItem::Reasoning {
            content: "thinking".into(),
            status: Some("completed".into()),
        }]);
        assert_eq!(resp.visible_text(), "");
        assert!(!resp.has_tool_calls());
    }

    #[test]
    fn empty_output_yields_empty_text() {
        let resp = response(Vec::new());
        assert_eq!(resp.visible_text(), "");
        assert!(resp.tool_calls().is_empty());
    }
}
