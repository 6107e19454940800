//! Conversion between canonical types and the upstream Responses wire format

use crate::protocol::upstream::{
    UpstreamContentPart, UpstreamInput, UpstreamOutputItem, UpstreamReasoning, UpstreamRequest, UpstreamResponse,
    UpstreamTool, UpstreamTurn, UpstreamUsage,
};
use crate::types::{CanonicalRequest, CanonicalResponse, OutputItem, ToolChoice, Usage};

// -- Outbound: canonical -> upstream wire format --

/// Build the upstream request for a canonical one
pub fn canonical_to_upstream(req: &CanonicalRequest) -> UpstreamRequest {
    let turns = req
        .messages
        .iter()
        .map(|m| UpstreamTurn {
            role: m.role.as_str().to_owned(),
            content: m.content.clone(),
        })
        .collect();

    let tools = req.tools.as_ref().map(|tools| {
        tools
            .iter()
            .map(|t| UpstreamTool {
                tool_type: "function".to_owned(),
                name: t.name.clone(),
                description: t.description.clone(),
                parameters: t.parameters.clone(),
            })
            .collect()
    });

    UpstreamRequest {
        model: req.model.clone(),
        input: UpstreamInput::Turns(turns),
        instructions: req.system.clone(),
        max_output_tokens: req.max_output_tokens,
        reasoning: req.reasoning_effort.map(|effort| UpstreamReasoning {
            effort: effort.as_str().to_owned(),
        }),
        temperature: req.temperature,
        top_p: req.top_p,
        previous_response_id: req.previous_response_id.clone(),
        stop: req.stop.clone(),
        tools,
        tool_choice: req.tool_choice.as_ref().map(tool_choice_to_upstream),
        stream: req.stream.then_some(true),
    }
}

fn tool_choice_to_upstream(choice: &ToolChoice) -> serde_json::Value {
    match choice {
        ToolChoice::None => serde_json::json!("none"),
        ToolChoice::Auto => serde_json::json!("auto"),
        ToolChoice::Required => serde_json::json!("required"),
        ToolChoice::Tool { name } => serde_json::json!({"type": "function", "name": name}),
    }
}

// -- Inbound: upstream wire format -> canonical --

/// Normalize a buffered upstream response
pub fn upstream_to_canonical(resp: UpstreamResponse) -> CanonicalResponse {
    let output = resp.output.into_iter().map(output_item_to_canonical).collect();

    CanonicalResponse {
        id: resp.id,
        created: resp.created,
        model: resp.model,
        output,
        usage: resp.usage.map(usage_to_canonical).unwrap_or_default(),
        degraded: None,
    }
}

/// Map one upstream output item into the canonical algebra
pub fn output_item_to_canonical(item: UpstreamOutputItem) -> OutputItem {
    match item {
        UpstreamOutputItem::Message { content } => OutputItem::Text {
            text: content
                .into_iter()
                .map(|UpstreamContentPart::OutputText { text }| text)
                .collect(),
        },
        UpstreamOutputItem::Reasoning { content, status } => OutputItem::Reasoning { content, status },
        UpstreamOutputItem::FunctionCall { call_id, name, arguments } => OutputItem::ToolCall {
            id: call_id,
            name,
            arguments,
        },
    }
}

/// Map upstream usage, repairing a missing total
pub fn usage_to_canonical(usage: UpstreamUsage) -> Usage {
    let total = if usage.total_tokens == 0 {
        usage.prompt_tokens + usage.completion_tokens
    } else {
        usage.total_tokens
    };
    Usage {
        prompt_tokens: usage.prompt_tokens,
        completion_tokens: usage.completion_tokens,
        total_tokens: total,
        reasoning_tokens: usage.reasoning_tokens,
    }
}
