//! Mock Responses-style upstream for integration tests
//!
//! Serves POST /responses with canned buffered and streaming answers,
//! captures the last request body, and can fail a configurable number
//! of leading requests with a chosen status.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Body;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Json, Router, routing};
use tokio_util::sync::CancellationToken;

const DEFAULT_TEXT: &str = "Hello from mock upstream";
const REASONING_TEXT: &str = "thinking out loud about the answer";

/// Mock upstream returning predictable Responses-shaped answers
pub struct MockUpstream {
    addr: SocketAddr,
    shutdown: CancellationToken,
    state: Arc<MockState>,
}

struct MockState {
    request_count: AtomicU32,
    /// Requests to fail before succeeding (0 = never fail)
    fail_first: AtomicU32,
    /// Status used for injected failures
    fail_status: u16,
    response_text: String,
    last_request: Mutex<Option<serde_json::Value>>,
    /// Streams dropped by the gateway before the final record was sent
    stream_aborts: AtomicU32,
}

impl MockUpstream {
    /// Start a mock that always succeeds
    pub async fn start() -> anyhow::Result<Self> {
        Self::start_inner(0, 500, DEFAULT_TEXT).await
    }

    /// Start a mock that fails the first `n` requests with 500
    pub async fn start_failing(n: u32) -> anyhow::Result<Self> {
        Self::start_inner(n, 500, DEFAULT_TEXT).await
    }

    /// Start a mock that fails the first `n` requests with a given status
    pub async fn start_failing_with(n: u32, status: u16) -> anyhow::Result<Self> {
        Self::start_inner(n, status, DEFAULT_TEXT).await
    }

    /// Start a mock with custom visible text
    pub async fn start_with_response(text: &str) -> anyhow::Result<Self> {
        Self::start_inner(0, 500, text).await
    }

    async fn start_inner(fail_first: u32, fail_status: u16, text: &str) -> anyhow::Result<Self> {
        let state = Arc::new(MockState {
            request_count: AtomicU32::new(0),
            fail_first: AtomicU32::new(fail_first),
            fail_status,
            response_text: text.to_owned(),
            last_request: Mutex::new(None),
            stream_aborts: AtomicU32::new(0),
        });

        let app = Router::new()
            .route("/responses", routing::post(handle_responses))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown_clone.cancelled().await;
                })
                .await
                .ok();
        });

        Ok(Self { addr, shutdown, state })
    }

    /// Base URL for configuring the mock as a provider
    ///
    /// The gateway appends `/responses` itself.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Requests received so far
    pub fn request_count(&self) -> u32 {
        self.state.request_count.load(Ordering::SeqCst)
    }

    /// The most recent request body
    pub fn last_request(&self) -> Option<serde_json::Value> {
        self.state.last_request.lock().unwrap().clone()
    }

    /// Streams dropped before completion
    pub fn stream_aborts(&self) -> u32 {
        self.state.stream_aborts.load(Ordering::SeqCst)
    }
}

impl Drop for MockUpstream {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn handle_responses(
    State(state): State<Arc<MockState>>,
    Json(body): Json<serde_json::Value>,
) -> axum::response::Response {
    state.request_count.fetch_add(1, Ordering::SeqCst);
    *state.last_request.lock().unwrap() = Some(body.clone());

    let remaining = state.fail_first.load(Ordering::SeqCst);
    if remaining > 0 {
        state.fail_first.fetch_sub(1, Ordering::SeqCst);
        let error_type = if state.fail_status >= 500 { "server_error" } else { "invalid_request" };
        return (
            StatusCode::from_u16(state.fail_status).unwrap(),
            Json(serde_json::json!({
                "error": {
                    "message": "mock upstream injected failure",
                    "type": error_type,
                }
            })),
        )
            .into_response();
    }

    let model = body["model"].as_str().unwrap_or("mock-model").to_owned();
    let has_tools = body.get("tools").is_some();

    if body["stream"] == serde_json::json!(true) {
        return streaming_response(&state, has_tools);
    }

    let mut output = vec![serde_json::json!({
        "type": "reasoning",
        "content": REASONING_TEXT,
        "status": "completed",
    })];
    if has_tools {
        output.push(serde_json::json!({
            "type": "function_call",
            "call_id": "call_mock_1",
            "name": "get_weather",
            "arguments": "{\"location\":\"San Francisco\"}",
        }));
    } else {
        output.push(serde_json::json!({
            "type": "message",
            "content": [{"type": "output_text", "text": state.response_text}],
        }));
    }

    Json(serde_json::json!({
        "id": "resp_mock_1",
        "object": "response",
        "created": 1_700_000_000u64,
        "model": model,
        "output": output,
        "usage": {"input_tokens": 10, "output_tokens": 5, "total_tokens": 15},
    }))
    .into_response()
}

/// Flags a stream that was dropped before it finished
struct AbortObserver {
    state: Arc<MockState>,
    finished: bool,
}

impl Drop for AbortObserver {
    fn drop(&mut self) {
        if !self.finished {
            self.state.stream_aborts.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Serve the `data:` event feed one record at a time
///
/// Records are paced so a caller can abort mid-stream; the observer
/// counts a drop before the final record as one abort.
fn streaming_response(state: &Arc<MockState>, has_tools: bool) -> axum::response::Response {
    let mut records = Vec::new();
    let mut push = |value: serde_json::Value| {
        records.push(format!("data: {value}\n\n"));
    };

    push(serde_json::json!({
        "type": "response.created",
        "response": {"id": "resp_stream_1", "created": 1_700_000_000u64},
    }));
    push(serde_json::json!({
        "type": "response.reasoning_text.delta",
        "delta": REASONING_TEXT,
    }));

    if has_tools {
        push(serde_json::json!({
            "type": "response.output_item.added",
            "item": {
                "type": "function_call",
                "call_id": "call_mock_stream",
                "name": "get_weather",
                "arguments": "{\"location\":\"San Francisco\"}",
            },
        }));
    } else {
        for word in state.response_text.split_whitespace() {
            push(serde_json::json!({
                "type": "response.output_text.delta",
                "delta": format!("{word} "),
            }));
        }
    }

    push(serde_json::json!({
        "type": "response.completed",
        "response": {
            "id": "resp_stream_1",
            "usage": {"input_tokens": 10, "output_tokens": 5, "total_tokens": 15},
        },
    }));
    // The terminal record: a drop after this point is normal completion,
    // since the gateway may stop here and treat the trailing [DONE] as
    // optional.
    let terminal_index = records.len() - 1;
    records.push("data: [DONE]\n\n".to_owned());

    let observer = AbortObserver {
        state: Arc::clone(state),
        finished: false,
    };
    let body = Body::from_stream(async_stream::stream! {
        // Rebind so the generator captures the whole observer rather than
        // a disjoint copy of its `finished` field; its Drop must run when
        // this stream is dropped.
        let mut observer = observer;
        for (index, record) in records.into_iter().enumerate() {
            tokio::time::sleep(Duration::from_millis(5)).await;
            // Mark finished in the same poll that hands over the terminal
            // record; code after a yield only runs on the next poll, which
            // never comes once the peer closes the connection.
            if index == terminal_index {
                observer.finished = true;
            }
            yield Ok::<_, Infallible>(record);
        }
    });

    (
        StatusCode::OK,
        [(axum::http::header::CONTENT_TYPE, "text/event-stream")],
        body,
    )
        .into_response()
}
