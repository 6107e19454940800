//! HTTP surface of the gateway
//!
//! Two routes, one per caller dialect: `/v1/messages` speaks Claude
//! Messages and `/v1/chat/completions` speaks Chat Completions. Both
//! share the canonical pipeline and differ only in parse and encode.
//! Streaming responses go out as SSE; dropping the response body drops
//! the upstream byte stream with it, closing the upstream connection.

use std::convert::Infallible;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::HeaderMap;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use futures_util::{Stream, StreamExt};
use prism_config::Dialect;
use prism_core::{HttpError, RequestContext};
use secrecy::SecretString;
use tracing::info;

use crate::convert::{ClaudeStreamEncoder, OpenAiStreamEncoder, canonical_to_claude, canonical_to_openai};
use crate::error::GatewayError;
use crate::gateway::{Gateway, StreamHandle};
use crate::protocol::claude::{ClaudeErrorDetail, ClaudeErrorResponse};
use crate::protocol::openai::{OpenAiErrorDetail, OpenAiErrorResponse};

/// Build the gateway router
pub fn gateway_router(gateway: Gateway) -> Router {
    let body_limit = gateway.max_body_bytes();
    Router::new()
        .route("/v1/messages", post(claude_messages))
        .route("/v1/chat/completions", post(chat_completions))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(gateway)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Claude Messages endpoint
async fn claude_messages(State(gateway): State<Gateway>, headers: HeaderMap, body: Bytes) -> Response {
    let context = context_from_headers(&headers);
    let incoming = match gateway.parse_request_as(&body, Dialect::Claude) {
        Ok(incoming) => incoming,
        Err(error) => return claude_error(&error),
    };

    if incoming.wants_stream() {
        match gateway.complete_stream(incoming, &context).await {
            Ok(handle) => {
                info!(correlation = %context.correlation_id, session = handle.session.id(), "streaming started");
                Sse::new(claude_sse(handle)).keep_alive(KeepAlive::default()).into_response()
            }
            Err(error) => claude_error(&error),
        }
    } else {
        match gateway.complete(incoming, &context).await {
            Ok(response) => Json(canonical_to_claude(&response)).into_response(),
            Err(error) => claude_error(&error),
        }
    }
}

/// Chat Completions endpoint
async fn chat_completions(State(gateway): State<Gateway>, headers: HeaderMap, body: Bytes) -> Response {
    let context = context_from_headers(&headers);
    let incoming = match gateway.parse_request_as(&body, Dialect::Openai) {
        Ok(incoming) => incoming,
        Err(error) => return openai_error(&error),
    };

    if incoming.wants_stream() {
        match gateway.complete_stream(incoming, &context).await {
            Ok(handle) => {
                info!(correlation = %context.correlation_id, session = handle.session.id(), "streaming started");
                Sse::new(openai_sse(handle)).keep_alive(KeepAlive::default()).into_response()
            }
            Err(error) => openai_error(&error),
        }
    } else {
        match gateway.complete(incoming, &context).await {
            Ok(response) => Json(canonical_to_openai(&response)).into_response(),
            Err(error) => openai_error(&error),
        }
    }
}

/// Build the request context from caller headers
fn context_from_headers(headers: &HeaderMap) -> RequestContext {
    let mut context = RequestContext::new();
    if let Some(id) = header_str(headers, "x-correlation-id") {
        context = context.with_correlation(id);
    }
    if let Some(id) = header_str(headers, "x-conversation-id") {
        context = context.with_conversation(id);
    }
    if let Some(auth) = header_str(headers, "authorization")
        && let Some(token) = auth.strip_prefix("Bearer ")
    {
        context.api_key = Some(SecretString::from(token.to_owned()));
    }
    context
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Encode a canonical event stream as named Claude SSE events
///
/// A mid-stream failure becomes one `error` event and ends the feed.
fn claude_sse(handle: StreamHandle) -> impl Stream<Item = Result<Event, Infallible>> {
    async_stream::stream! {
        let StreamHandle { session, mut events, model } = handle;
        let mut encoder = ClaudeStreamEncoder::new(model);

        while let Some(item) = events.next().await {
            match item {
                Ok(event) => {
                    for wire in encoder.encode(&event) {
                        if let Ok(sse) = Event::default().event(wire.event_name()).json_data(&wire) {
                            yield Ok(sse);
                        }
                    }
                }
                Err(error) => {
                    let body = claude_error_body(&error);
                    if let Ok(sse) = Event::default().event("error").json_data(&body) {
                        yield Ok(sse);
                    }
                    break;
                }
            }
        }
        info!(session = session.id(), "stream finished");
    }
}

/// Encode a canonical event stream as Chat Completions chunks
///
/// A normally finished feed is terminated with the literal `[DONE]`
/// data line; a mid-stream failure becomes one error payload instead.
fn openai_sse(handle: StreamHandle) -> impl Stream<Item = Result<Event, Infallible>> {
    async_stream::stream! {
        let StreamHandle { session, mut events, model } = handle;
        let mut encoder = OpenAiStreamEncoder::new(model);
        let mut failed = false;

        while let Some(item) = events.next().await {
            match item {
                Ok(event) => {
                    for chunk in encoder.encode(&event) {
                        if let Ok(sse) = Event::default().json_data(&chunk) {
                            yield Ok(sse);
                        }
                    }
                }
                Err(error) => {
                    let body = openai_error_body(&error);
                    if let Ok(sse) = Event::default().json_data(&body) {
                        yield Ok(sse);
                    }
                    failed = true;
                    break;
                }
            }
        }
        if !failed {
            yield Ok(Event::default().data("[DONE]"));
        }
        info!(session = session.id(), "stream finished");
    }
}

fn claude_error_body(error: &GatewayError) -> ClaudeErrorResponse {
    ClaudeErrorResponse {
        error_type: "error".to_owned(),
        error: ClaudeErrorDetail {
            error_type: error.error_type().to_owned(),
            message: error.client_message(),
        },
    }
}

fn claude_error(error: &GatewayError) -> Response {
    (error.status_code(), Json(claude_error_body(error))).into_response()
}

fn openai_error_body(error: &GatewayError) -> OpenAiErrorResponse {
    OpenAiErrorResponse {
        error: OpenAiErrorDetail {
            message: error.client_message(),
            error_type: error.error_type().to_owned(),
            param: None,
            code: None,
        },
    }
}

fn openai_error(error: &GatewayError) -> Response {
    (error.status_code(), Json(openai_error_body(error))).into_response()
}
