//! Streaming tests: SSE encoding for both dialects

mod harness;

use harness::config::ConfigBuilder;
use harness::mock_upstream::MockUpstream;
use harness::server::TestServer;

async fn start(mock: &MockUpstream) -> TestServer {
    let config = ConfigBuilder::new().with_primary(&mock.base_url()).build();
    TestServer::start(config).await.unwrap()
}

/// Extract the `data:` payloads from a finished SSE body
fn data_lines(body: &str) -> Vec<String> {
    body.lines()
        .filter_map(|line| line.strip_prefix("data: "))
        .map(str::to_owned)
        .collect()
}

/// Extract the `event:` names from a finished SSE body
fn event_names(body: &str) -> Vec<String> {
    body.lines()
        .filter_map(|line| line.strip_prefix("event: "))
        .map(str::to_owned)
        .collect()
}

#[tokio::test]
async fn openai_stream_delivers_deltas_then_done() {
    let mock = MockUpstream::start().await.unwrap();
    let server = start(&mock).await;

    let body = server
        .client()
        .post(server.url("/v1/chat/completions"))
        .json(&serde_json::json!({
            "model": "m",
            "messages": [{"role": "user", "content": "Hello"}],
            "stream": true,
        }))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    let lines = data_lines(&body);
    assert_eq!(lines.last().map(String::as_str), Some("[DONE]"));

    let chunks: Vec<serde_json::Value> = lines[..lines.len() - 1]
        .iter()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();

    // Role announcement first
    assert_eq!(chunks[0]["choices"][0]["delta"]["role"], "assistant");

    // Content deltas reassemble the mock's text
    let text: String = chunks
        .iter()
        .filter_map(|c| c["choices"][0]["delta"]["content"].as_str())
        .collect();
    assert_eq!(text.trim_end(), "Hello from mock upstream");

    // Final chunk carries finish reason and usage
    let last = chunks.last().unwrap();
    assert_eq!(last["choices"][0]["finish_reason"], "stop");
    assert_eq!(last["usage"]["total_tokens"], 15);

    // A fully consumed stream never counts as an abort
    assert_eq!(mock.stream_aborts(), 0);
}

#[tokio::test]
async fn claude_stream_emits_the_expected_event_sequence() {
    let mock = MockUpstream::start().await.unwrap();
    let server = start(&mock).await;

    let body = server
        .client()
        .post(server.url("/v1/messages"))
        .json(&serde_json::json!({
            "model": "m",
            "max_tokens": 100,
            "messages": [{"role": "user", "content": "Hello"}],
            "stream": true,
        }))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    let names = event_names(&body);
    assert_eq!(names.first().map(String::as_str), Some("message_start"));
    assert!(names.contains(&"content_block_start".to_owned()));
    assert!(names.contains(&"content_block_delta".to_owned()));
    assert!(names.contains(&"content_block_stop".to_owned()));
    let tail: Vec<&str> = names.iter().rev().take(2).map(String::as_str).collect();
    assert_eq!(tail, ["message_stop", "message_delta"]);
}

#[tokio::test]
async fn reasoning_deltas_are_hidden_from_both_dialect_streams() {
    let mock = MockUpstream::start().await.unwrap();
    let server = start(&mock).await;

    for (path, body) in [
        (
            "/v1/messages",
            serde_json::json!({
                "model": "m",
                "max_tokens": 100,
                "messages": [{"role": "user", "content": "Hello"}],
                "stream": true,
            }),
        ),
        (
            "/v1/chat/completions",
            serde_json::json!({
                "model": "m",
                "messages": [{"role": "user", "content": "Hello"}],
                "stream": true,
            }),
        ),
    ] {
        let text = server
            .client()
            .post(server.url(path))
            .json(&body)
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert!(!text.contains("thinking out loud"), "reasoning leaked via {path}");
    }
}

#[tokio::test]
async fn dropping_a_stream_leaves_the_gateway_healthy() {
    let mock = MockUpstream::start().await.unwrap();
    let server = start(&mock).await;

    let mut resp = server
        .client()
        .post(server.url("/v1/chat/completions"))
        .json(&serde_json::json!({
            "model": "m",
            "messages": [{"role": "user", "content": "Hello"}],
            "stream": true,
        }))
        .send()
        .await
        .unwrap();
    // Read one chunk, then drop the response mid-stream
    let first = resp.chunk().await.unwrap();
    assert!(first.is_some());
    drop(resp);
    assert_eq!(mock.request_count(), 1);

    // The abort propagates to the upstream connection exactly once
    for _ in 0..200 {
        if mock.stream_aborts() > 0 {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    assert_eq!(mock.stream_aborts(), 1);

    // The gateway keeps serving after the abandoned stream
    let followup = server
        .client()
        .post(server.url("/v1/chat/completions"))
        .json(&serde_json::json!({
            "model": "m",
            "messages": [{"role": "user", "content": "Hello again"}],
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(followup.status(), 200);
    assert_eq!(mock.request_count(), 2);
}

#[tokio::test]
async fn streamed_tool_calls_reach_the_openai_caller() {
    let mock = MockUpstream::start().await.unwrap();
    let server = start(&mock).await;

    let body = server
        .client()
        .post(server.url("/v1/chat/completions"))
        .json(&serde_json::json!({
            "model": "m",
            "messages": [{"role": "user", "content": "What is the weather?"}],
            "stream": true,
            "tools": [{
                "type": "function",
                "function": {"name": "get_weather", "parameters": {"type": "object"}},
            }],
        }))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    let lines = data_lines(&body);
    let chunks: Vec<serde_json::Value> = lines[..lines.len() - 1]
        .iter()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();

    let tool_chunk = chunks
        .iter()
        .find(|c| c["choices"][0]["delta"]["tool_calls"].is_array())
        .expect("a tool call chunk");
    assert_eq!(
        tool_chunk["choices"][0]["delta"]["tool_calls"][0]["function"]["name"],
        "get_weather"
    );
    let last = chunks.last().unwrap();
    assert_eq!(last["choices"][0]["finish_reason"], "tool_calls");
}
