//! Conversion between canonical types and the Claude Messages wire format

use prism_config::LimitsConfig;

use crate::error::GatewayError;
use crate::protocol::claude::{
    ClaudeContent, ClaudeContentBlock, ClaudeMessageDelta, ClaudeRequest, ClaudeResponse, ClaudeResponseBlock,
    ClaudeStreamContentBlock, ClaudeStreamDelta, ClaudeStreamEvent, ClaudeStreamMessage, ClaudeTool, ClaudeToolChoice,
    ClaudeUsage,
};
use crate::transform::clamp_output_tokens;
use crate::types::{
    CanonicalRequest, CanonicalResponse, Message, Role, StreamEvent, ToolChoice, ToolDefinition,
};

// -- Inbound: Claude wire format -> canonical --

/// Convert a Claude Messages request into the canonical shape
pub fn claude_to_canonical(
    req: ClaudeRequest,
    limits: &LimitsConfig,
) -> Result<CanonicalRequest, GatewayError> {
    let mut messages = Vec::with_capacity(req.messages.len());
    for msg in req.messages {
        let role = Role::parse(&msg.role)?;
        messages.push(Message::new(role, flatten_content(msg.content)));
    }

    Ok(CanonicalRequest {
        model: req.model,
        messages,
        system: req.system,
        max_output_tokens: clamp_output_tokens(Some(req.max_tokens), limits)?,
        temperature: req.temperature,
        top_p: req.top_p,
        stop: req.stop_sequences,
        tools: req.tools.map(|tools| tools.into_iter().map(claude_tool_to_canonical).collect()),
        tool_choice: req.tool_choice.map(claude_tool_choice_to_canonical),
        reasoning_effort: None,
        previous_response_id: None,
        stream: req.stream.unwrap_or(false),
    })
}

/// Flatten Claude content blocks into a single text string
///
/// Tool use and tool result blocks are rendered as text markers so
/// multi-turn tool transcripts survive as conversation context.
fn flatten_content(content: ClaudeContent) -> String {
    match content {
        ClaudeContent::Text(text) => text,
        ClaudeContent::Blocks(blocks) => {
            let mut parts = Vec::with_capacity(blocks.len());
            for block in blocks {
                match block {
                    ClaudeContentBlock::Text { text } => parts.push(text),
                    ClaudeContentBlock::ToolUse { name, input, .. } => {
                        parts.push(format!("[tool call: {name}({input})]"));
                    }
                    ClaudeContentBlock::ToolResult { content, .. } => {
                        parts.push(format!("[tool result: {}]", content.unwrap_or_default()));
                    }
                }
            }
            parts.join("\n")
        }
    }
}

fn claude_tool_to_canonical(tool: ClaudeTool) -> ToolDefinition {
    ToolDefinition {
        name: tool.name,
        description: tool.description,
        parameters: Some(tool.input_schema),
    }
}

fn claude_tool_choice_to_canonical(tc: ClaudeToolChoice) -> ToolChoice {
    match tc.choice_type.as_str() {
        "any" => ToolChoice::Required,
        "none" => ToolChoice::None,
        "tool" => tc.name.map_or(ToolChoice::Auto, |name| ToolChoice::Tool { name }),
        // "auto" and unknown types both default to auto
        _ => ToolChoice::Auto,
    }
}

// -- Outbound: canonical -> Claude wire format --

/// Render a canonical response as a Claude Messages response
pub fn canonical_to_claude(resp: &CanonicalResponse) -> ClaudeResponse {
    let mut content = Vec::new();

    let text = resp.visible_text();
    if !text.is_empty() {
        content.push(ClaudeResponseBlock::Text { text });
    }
    for (id, name, arguments) in resp.tool_calls() {
        let input = serde_json::from_str(arguments).unwrap_or_else(|_| serde_json::json!({}));
        content.push(ClaudeResponseBlock::ToolUse {
            id: id.to_owned(),
            name: name.to_owned(),
            input,
        });
    }

    let stop_reason = if resp.has_tool_calls() { "tool_use" } else { "end_turn" };

    ClaudeResponse {
        id: resp.id.clone(),
        response_type: "message".to_owned(),
        role: "assistant".to_owned(),
        content,
        model: resp.model.clone(),
        stop_reason: Some(stop_reason.to_owned()),
        stop_sequence: None,
        usage: ClaudeUsage {
            input_tokens: resp.usage.prompt_tokens,
            output_tokens: resp.usage.completion_tokens,
        },
    }
}

// -- Stream encoding: canonical events -> Claude SSE events --

/// Stateful encoder turning canonical stream events into Claude SSE events
///
/// Tracks block indices so text and tool-use blocks open and close in
/// the order Claude clients expect.
pub struct ClaudeStreamEncoder {
    model: String,
    next_index: u32,
    text_block_open: bool,
    saw_tool_call: bool,
}

impl ClaudeStreamEncoder {
    /// Create an encoder for one stream
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            next_index: 0,
            text_block_open: false,
            saw_tool_call: false,
        }
    }

    /// Encode one canonical event into zero or more Claude SSE events
    pub fn encode(&mut self, event: &StreamEvent) -> Vec<ClaudeStreamEvent> {
        match event {
            StreamEvent::Created { id, .. } => {
                vec![ClaudeStreamEvent::MessageStart {
                    message: ClaudeStreamMessage {
                        id: id.clone(),
                        message_type: "message".to_owned(),
                        role: "assistant".to_owned(),
                        model: self.model.clone(),
                        usage: None,
                    },
                }]
            }

            StreamEvent::TextDelta { text } => {
                let mut events = Vec::new();
                if !self.text_block_open {
                    events.push(ClaudeStreamEvent::ContentBlockStart {
                        index: self.next_index,
                        content_block: ClaudeStreamContentBlock::Text { text: String::new() },
                    });
                    self.text_block_open = true;
                }
                events.push(ClaudeStreamEvent::ContentBlockDelta {
                    index: self.next_index,
                    delta: ClaudeStreamDelta::TextDelta { text: text.clone() },
                });
                events
            }

            // Hidden deliberation never reaches the caller
            StreamEvent::ReasoningDelta { .. } => Vec::new(),

            StreamEvent::ToolCall { id, name, arguments } => {
                self.saw_tool_call = true;
                let mut events = Vec::new();
                if self.text_block_open {
                    events.push(ClaudeStreamEvent::ContentBlockStop { index: self.next_index });
                    self.text_block_open = false;
                    self.next_index += 1;
                }
                let index = self.next_index;
                events.push(ClaudeStreamEvent::ContentBlockStart {
                    index,
                    content_block: ClaudeStreamContentBlock::ToolUse {
                        id: id.clone(),
                        name: name.clone(),
                        input: serde_json::json!({}),
                    },
                });
                events.push(ClaudeStreamEvent::ContentBlockDelta {
                    index,
                    delta: ClaudeStreamDelta::InputJsonDelta {
                        partial_json: arguments.clone(),
                    },
                });
                events.push(ClaudeStreamEvent::ContentBlockStop { index });
                self.next_index += 1;
                events
            }

            StreamEvent::Completed { usage } => {
                let mut events = Vec::new();
                if self.text_block_open {
                    events.push(ClaudeStreamEvent::ContentBlockStop { index: self.next_index });
                    self.text_block_open = false;
                }
                let stop_reason = if self.saw_tool_call { "tool_use" } else { "end_turn" };
                events.push(ClaudeStreamEvent::MessageDelta {
                    delta: ClaudeMessageDelta {
                        stop_reason: Some(stop_reason.to_owned()),
                        stop_sequence: None,
                    },
                    usage: Some(ClaudeUsage {
                        input_tokens: usage.prompt_tokens,
                        output_tokens: usage.completion_tokens,
                    }),
                });
                events.push(ClaudeStreamEvent::MessageStop);
                events
            }
        }
    }
}
