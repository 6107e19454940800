//! Conversion between canonical types and the `OpenAI` Chat Completions wire format

use prism_config::LimitsConfig;

use crate::error::GatewayError;
use crate::protocol::openai::{
    OpenAiChoice, OpenAiChoiceMessage, OpenAiCompletionTokensDetails, OpenAiContent, OpenAiContentPart,
    OpenAiFunctionCall, OpenAiRequest, OpenAiResponse, OpenAiStreamChoice, OpenAiStreamChunk, OpenAiStreamDelta,
    OpenAiStreamFunctionCall, OpenAiStreamToolCall, OpenAiTool, OpenAiToolCall, OpenAiUsage,
};
use crate::transform::clamp_output_tokens;
use crate::types::{
    CanonicalRequest, CanonicalResponse, Message, ReasoningEffort, Role, StreamEvent, ToolChoice, ToolDefinition,
    Usage,
};

// -- Inbound: OpenAI wire format -> canonical --

/// Convert a Chat Completions request into the canonical shape
pub fn openai_to_canonical(
    req: OpenAiRequest,
    limits: &LimitsConfig,
) -> Result<CanonicalRequest, GatewayError> {
    let mut system = None;
    let mut messages = Vec::with_capacity(req.messages.len());
    for msg in req.messages {
        let role = Role::parse(&msg.role)?;
        let content = msg.content.map(flatten_content).unwrap_or_default();
        // The first system message becomes the top-level instruction
        if role == Role::System && system.is_none() && messages.is_empty() {
            system = Some(content);
        } else {
            messages.push(Message::new(role, content));
        }
    }

    // max_completion_tokens supersedes the legacy max_tokens field
    let requested = req.max_completion_tokens.or(req.max_tokens);

    Ok(CanonicalRequest {
        model: req.model,
        messages,
        system,
        max_output_tokens: clamp_output_tokens(requested, limits)?,
        temperature: req.temperature,
        top_p: req.top_p,
        stop: req.stop.map(crate::protocol::openai::OpenAiStop::into_vec),
        tools: req.tools.map(|tools| tools.into_iter().map(openai_tool_to_canonical).collect()),
        tool_choice: req.tool_choice.as_ref().map(openai_tool_choice_to_canonical),
        reasoning_effort: req.reasoning_effort.as_deref().map(ReasoningEffort::parse).transpose()?,
        previous_response_id: None,
        stream: req.stream.unwrap_or(false),
    })
}

fn flatten_content(content: OpenAiContent) -> String {
    match content {
        OpenAiContent::Text(text) => text,
        OpenAiContent::Parts(parts) => parts
            .into_iter()
            .map(|OpenAiContentPart::Text { text }| text)
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

fn openai_tool_to_canonical(tool: OpenAiTool) -> ToolDefinition {
    ToolDefinition {
        name: tool.function.name,
        description: tool.function.description,
        parameters: tool.function.parameters,
    }
}

/// Interpret the loosely typed `tool_choice` value
fn openai_tool_choice_to_canonical(value: &serde_json::Value) -> ToolChoice {
    match value {
        serde_json::Value::String(mode) => match mode.as_str() {
            "none" => ToolChoice::None,
            "required" => ToolChoice::Required,
            _ => ToolChoice::Auto,
        },
        serde_json::Value::Object(obj) => obj
            .get("function")
            .and_then(|f| f.get("name"))
            .and_then(serde_json::Value::as_str)
            .map_or(ToolChoice::Auto, |name| ToolChoice::Tool { name: name.to_owned() }),
        _ => ToolChoice::Auto,
    }
}

// -- Outbound: canonical -> OpenAI wire format --

/// Render a canonical response as a Chat Completions response
pub fn canonical_to_openai(resp: &CanonicalResponse) -> OpenAiResponse {
    let text = resp.visible_text();
    let tool_calls: Vec<OpenAiToolCall> = resp
        .tool_calls()
        .into_iter()
        .map(|(id, name, arguments)| OpenAiToolCall {
            id: id.to_owned(),
            tool_type: "function".to_owned(),
            function: OpenAiFunctionCall {
                name: name.to_owned(),
                arguments: arguments.to_owned(),
            },
        })
        .collect();

    let finish_reason = if tool_calls.is_empty() { "stop" } else { "tool_calls" };
    let message = OpenAiChoiceMessage {
        role: "assistant".to_owned(),
        content: if text.is_empty() && !tool_calls.is_empty() { None } else { Some(text) },
        tool_calls: if tool_calls.is_empty() { None } else { Some(tool_calls) },
    };

    OpenAiResponse {
        id: resp.id.clone(),
        object: "chat.completion".to_owned(),
        created: resp.created,
        model: resp.model.clone(),
        choices: vec![OpenAiChoice {
            index: 0,
            message,
            finish_reason: Some(finish_reason.to_owned()),
        }],
        usage: Some(usage_to_openai(&resp.usage)),
    }
}

fn usage_to_openai(usage: &Usage) -> OpenAiUsage {
    OpenAiUsage {
        prompt_tokens: usage.prompt_tokens,
        completion_tokens: usage.completion_tokens,
        total_tokens: usage.total_tokens,
        completion_tokens_details: usage
            .reasoning_tokens
            .map(|reasoning_tokens| OpenAiCompletionTokensDetails { reasoning_tokens }),
    }
}

// -- Stream encoding: canonical events -> chat.completion.chunk --

/// Stateful encoder turning canonical stream events into Chat Completions chunks
///
/// The handler terminates the SSE feed with the literal `[DONE]` line
/// after the last chunk.
pub struct OpenAiStreamEncoder {
    id: String,
    created: u64,
    model: String,
    sent_role: bool,
    next_tool_index: u32,
    saw_tool_call: bool,
}

impl OpenAiStreamEncoder {
    /// Create an encoder for one stream
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            created: 0,
            model: model.into(),
            sent_role: false,
            next_tool_index: 0,
            saw_tool_call: false,
        }
    }

    fn chunk(&self, delta: OpenAiStreamDelta, finish_reason: Option<String>) -> OpenAiStreamChunk {
        OpenAiStreamChunk {
            id: self.id.clone(),
            object: "chat.completion.chunk".to_owned(),
            created: self.created,
            model: self.model.clone(),
            choices: vec![OpenAiStreamChoice {
                index: 0,
                delta,
                finish_reason,
            }],
            usage: None,
        }
    }

    /// Encode one canonical event into zero or more chunks
    pub fn encode(&mut self, event: &StreamEvent) -> Vec<OpenAiStreamChunk> {
        match event {
            StreamEvent::Created { id, created } => {
                self.id.clone_from(id);
                self.created = *created;
                self.sent_role = true;
                vec![self.chunk(
                    OpenAiStreamDelta {
                        role: Some("assistant".to_owned()),
                        ..OpenAiStreamDelta::default()
                    },
                    None,
                )]
            }

            StreamEvent::TextDelta { text } => {
                vec![self.chunk(
                    OpenAiStreamDelta {
                        role: (!self.sent_role).then(|| "assistant".to_owned()),
                        content: Some(text.clone()),
                        tool_calls: None,
                    },
                    None,
                )]
            }

            // Hidden deliberation never reaches the caller
            StreamEvent::ReasoningDelta { .. } => Vec::new(),

            StreamEvent::ToolCall { id, name, arguments } => {
                self.saw_tool_call = true;
                let index = self.next_tool_index;
                self.next_tool_index += 1;
                vec![self.chunk(
                    OpenAiStreamDelta {
                        role: None,
                        content: None,
                        tool_calls: Some(vec![OpenAiStreamToolCall {
                            index,
                            id: Some(id.clone()),
                            tool_type: Some("function".to_owned()),
                            function: Some(OpenAiStreamFunctionCall {
                                name: Some(name.clone()),
                                arguments: Some(arguments.clone()),
                            }),
                        }]),
                    },
                    None,
                )]
            }

            StreamEvent::Completed { usage } => {
                let finish = if self.saw_tool_call { "tool_calls" } else { "stop" };
                let mut final_chunk = self.chunk(OpenAiStreamDelta::default(), Some(finish.to_owned()));
                final_chunk.usage = Some(usage_to_openai(usage));
                vec![final_chunk]
            }
        }
    }
}
