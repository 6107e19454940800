//! Reduction of the upstream event feed to canonical stream events

use std::fmt::Display;
use std::pin::pin;
use std::sync::Arc;

use async_stream::stream;
use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use tracing::{debug, trace};

use super::line::LineAssembler;
use super::session::StreamSession;
use crate::convert::upstream::{output_item_to_canonical, usage_to_canonical};
use crate::error::GatewayError;
use crate::protocol::upstream::UpstreamStreamEvent;
use crate::types::{OutputItem, StreamEvent, Usage};

/// Demultiplex an upstream byte stream into canonical events
///
/// Reassembles `data:` records from arbitrary byte frames and reduces
/// them to [`StreamEvent`]s. Exactly one terminal action happens per
/// session: the first of completion, error, and cancellation claims the
/// session's terminal slot and later signals are ignored. Cancellation
/// ends emission without a terminal event; dropping the byte stream on
/// exit closes the upstream transport.
///
/// `prompt_tokens_estimate` seeds the usage reported when the feed ends
/// with a legacy `[DONE]` and the upstream never sent explicit usage;
/// output tokens are then estimated from the streamed text.
pub fn demux_events<S, E>(
    byte_stream: S,
    session: Arc<StreamSession>,
    prompt_tokens_estimate: u32,
) -> impl Stream<Item = Result<StreamEvent, GatewayError>> + Send
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Display + Send + 'static,
{
    let cancel = session.cancel_token();
    stream! {
        let mut byte_stream = pin!(byte_stream);
        let mut assembler = LineAssembler::new();
        let mut output_chars: usize = 0;
        let mut reasoning_delta_seen = false;

        'feed: loop {
            let chunk = tokio::select! {
                () = cancel.cancelled() => {
                    session.try_terminate();
                    debug!(session = session.id(), "stream cancelled by caller");
                    break 'feed;
                }
                chunk = byte_stream.next() => chunk,
            };

            let Some(chunk) = chunk else {
                // Upstream closed the connection without a terminal record
                if session.try_terminate() {
                    yield Err(GatewayError::Streaming(
                        "upstream closed the stream without a terminal event".to_owned(),
                    ));
                }
                break 'feed;
            };

            let bytes = match chunk {
                Ok(bytes) => bytes,
                Err(e) => {
                    if session.try_terminate() {
                        yield Err(GatewayError::Network(e.to_string()));
                    }
                    break 'feed;
                }
            };

            for record in assembler.feed(&bytes) {
                let Some(payload) = record.strip_prefix("data:") else {
                    continue;
                };
                let payload = payload.trim();
                if payload.is_empty() {
                    continue;
                }

                if payload == "[DONE]" {
                    if session.try_terminate() {
                        yield Ok(StreamEvent::Completed {
                            usage: estimate_usage(prompt_tokens_estimate, output_chars),
                        });
                    }
                    break 'feed;
                }

                let event: UpstreamStreamEvent = match serde_json::from_str(payload) {
                    Ok(event) => event,
                    Err(e) => {
                        trace!(error = %e, "skipping unparseable stream record");
                        continue;
                    }
                };

                match event {
                    UpstreamStreamEvent::Created { response } => {
                        yield Ok(StreamEvent::Created {
                            id: response.id,
                            created: response.created,
                        });
                    }
                    UpstreamStreamEvent::OutputTextDelta { delta } => {
                        output_chars += delta.len();
                        yield Ok(StreamEvent::TextDelta { text: delta });
                    }
                    UpstreamStreamEvent::ReasoningTextDelta { delta } => {
                        reasoning_delta_seen = true;
                        yield Ok(StreamEvent::ReasoningDelta { text: delta });
                    }
                    UpstreamStreamEvent::ReasoningTextDone { text } => {
                        // Only meaningful when the upstream skipped the deltas
                        if !reasoning_delta_seen && !text.is_empty() {
                            yield Ok(StreamEvent::ReasoningDelta { text });
                        }
                    }
                    UpstreamStreamEvent::OutputItemAdded { item } => {
                        if let OutputItem::ToolCall { id, name, arguments } =
                            output_item_to_canonical(item)
                        {
                            yield Ok(StreamEvent::ToolCall { id, name, arguments });
                        }
                    }
                    UpstreamStreamEvent::Completed { response } => {
                        if session.try_terminate() {
                            let usage = response.usage.map_or_else(
                                || estimate_usage(prompt_tokens_estimate, output_chars),
                                usage_to_canonical,
                            );
                            yield Ok(StreamEvent::Completed { usage });
                        }
                        break 'feed;
                    }
                    UpstreamStreamEvent::Failed { error } => {
                        if session.try_terminate() {
                            let message = error.map_or_else(
                                || "upstream reported failure".to_owned(),
                                |e| e.message,
                            );
                            yield Err(GatewayError::Streaming(message));
                        }
                        break 'feed;
                    }
                    UpstreamStreamEvent::Error { message, .. } => {
                        if session.try_terminate() {
                            yield Err(GatewayError::Streaming(message));
                        }
                        break 'feed;
                    }
                    UpstreamStreamEvent::Other => {
                        trace!("ignoring unhandled stream event type");
                    }
                }
            }
        }
        // byte_stream drops here, closing the upstream connection
    }
}

/// Local usage estimate for feeds that end without explicit usage
fn estimate_usage(prompt_tokens: u32, output_chars: usize) -> Usage {
    let completion_tokens = u32::try_from(output_chars / 4).unwrap_or(u32::MAX);
    Usage {
        prompt_tokens,
        completion_tokens,
        total_tokens: prompt_tokens.saturating_add(completion_tokens),
        reasoning_tokens: None,
    }
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use futures::stream;

    use super::*;

    fn frames(parts: &[&str]) -> impl Stream<Item = Result<Bytes, Infallible>> + Send + 'static {
        let owned: Vec<Result<Bytes, Infallible>> =
            parts.iter().map(|p| Ok(Bytes::from((*p).to_owned()))).collect();
        stream::iter(owned)
    }

    async fn collect(
        parts: &[&str],
        session: &Arc<StreamSession>,
    ) -> Vec<Result<StreamEvent, GatewayError>> {
        demux_events(frames(parts), Arc::clone(session), 5).collect().await
    }

    #[tokio::test]
    async fn full_feed_reduces_in_order() {
        let session = Arc::new(StreamSession::new());
        let events = collect(
            &[
                "data: {\"type\":\"response.created\",\"response\":{\"id\":\"resp_1\",\"created\":7}}\n",
                "data: {\"type\":\"response.reasoning_text.delta\",\"delta\":\"let me think\"}\n",
                "data: {\"type\":\"response.output_text.delta\",\"delta\":\"Hi\"}\n",
                "data: {\"type\":\"response.output_text.delta\",\"delta\":\" there\"}\n",
                "data: {\"type\":\"response.completed\",\"response\":{\"id\":\"resp_1\",\"usage\":{\"prompt_tokens\":5,\"completion_tokens\":3,\"total_tokens\":8}}}\n",
            ],
            &session,
        )
        .await;

        assert_eq!(events.len(), 5);
        assert!(matches!(events[0], Ok(StreamEvent::Created { ref id, .. }) if id == "resp_1"));
        assert!(matches!(events[1], Ok(StreamEvent::ReasoningDelta { .. })));
        assert!(matches!(events[2], Ok(StreamEvent::TextDelta { ref text }) if text == "Hi"));
        match &events[4] {
            Ok(StreamEvent::Completed { usage }) => assert_eq!(usage.total_tokens, 8),
            other => panic!("expected completed, got {other:?}"),
        }
        assert!(session.is_terminated());
    }

    #[tokio::test]
    async fn records_split_across_frames_reassemble() {
        let session = Arc::new(StreamSession::new());
        let events = collect(
            &[
                "data: {\"type\":\"response.output_te",
                "xt.delta\",\"delta\":\"Hello\"}\ndata: [DO",
                "NE]\n",
            ],
            &session,
        )
        .await;

        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], Ok(StreamEvent::TextDelta { ref text }) if text == "Hello"));
        assert!(matches!(events[1], Ok(StreamEvent::Completed { .. })));
    }

    #[tokio::test]
    async fn legacy_done_estimates_usage() {
        let session = Arc::new(StreamSession::new());
        let events = collect(
            &[
                "data: {\"type\":\"response.output_text.delta\",\"delta\":\"0123456789abcdef\"}\n",
                "data: [DONE]\n",
            ],
            &session,
        )
        .await;

        match &events[1] {
            Ok(StreamEvent::Completed { usage }) => {
                assert_eq!(usage.prompt_tokens, 5);
                assert_eq!(usage.completion_tokens, 4); // 16 chars / 4
                assert_eq!(usage.total_tokens, 9);
            }
            other => panic!("expected completed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn done_after_completed_is_ignored() {
        let session = Arc::new(StreamSession::new());
        let events = collect(
            &[
                "data: {\"type\":\"response.completed\",\"response\":{\"id\":\"r\",\"usage\":{\"prompt_tokens\":1,\"completion_tokens\":1,\"total_tokens\":2}}}\n",
                "data: [DONE]\n",
            ],
            &session,
        )
        .await;

        let terminals = events
            .iter()
            .filter(|e| matches!(e, Ok(StreamEvent::Completed { .. })))
            .count();
        assert_eq!(terminals, 1);
    }

    #[tokio::test]
    async fn unknown_events_do_not_perturb_the_stream() {
        let session = Arc::new(StreamSession::new());
        let events = collect(
            &[
                "data: {\"type\":\"response.audio.delta\",\"delta\":\"zzzz\"}\n",
                "not a data line\n",
                "data: {\"type\":\"response.output_text.delta\",\"delta\":\"ok\"}\n",
                "data: [DONE]\n",
            ],
            &session,
        )
        .await;

        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], Ok(StreamEvent::TextDelta { ref text }) if text == "ok"));
    }

    #[tokio::test]
    async fn tool_call_items_surface() {
        let session = Arc::new(StreamSession::new());
        let events = collect(
            &[
                "data: {\"type\":\"response.output_item.added\",\"item\":{\"type\":\"function_call\",\"call_id\":\"call_1\",\"name\":\"lookup\",\"arguments\":\"{}\"}}\n",
                "data: [DONE]\n",
            ],
            &session,
        )
        .await;

        assert!(matches!(events[0], Ok(StreamEvent::ToolCall { ref name, .. }) if name == "lookup"));
    }

    #[tokio::test]
    async fn failed_event_yields_inband_error_once() {
        let session = Arc::new(StreamSession::new());
        let events = collect(
            &[
                "data: {\"type\":\"response.failed\",\"error\":{\"message\":\"overloaded\",\"type\":\"server_error\"}}\n",
                "data: [DONE]\n",
            ],
            &session,
        )
        .await;

        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], Err(GatewayError::Streaming(ref m)) if m == "overloaded"));
    }

    #[tokio::test]
    async fn truncated_feed_reports_a_streaming_error() {
        let session = Arc::new(StreamSession::new());
        let events = collect(
            &["data: {\"type\":\"response.output_text.delta\",\"delta\":\"partial\"}\n"],
            &session,
        )
        .await;

        assert_eq!(events.len(), 2);
        assert!(matches!(events[1], Err(GatewayError::Streaming(_))));
    }

    #[tokio::test]
    async fn cancellation_ends_without_a_terminal_event() {
        let session = Arc::new(StreamSession::new());
        session.cancel();
        let events = demux_events(
            stream::pending::<Result<Bytes, Infallible>>(),
            Arc::clone(&session),
            0,
        )
        .collect::<Vec<_>>()
        .await;

        assert!(events.is_empty());
        assert!(session.is_terminated());
    }

    #[tokio::test]
    async fn reasoning_done_only_fires_without_deltas() {
        let session = Arc::new(StreamSession::new());
        let events = collect(
            &[
                "data: {\"type\":\"response.reasoning_text.done\",\"text\":\"full transcript\"}\n",
                "data: [DONE]\n",
            ],
            &session,
        )
        .await;
        assert!(matches!(events[0], Ok(StreamEvent::ReasoningDelta { ref text }) if text == "full transcript"));

        let session = Arc::new(StreamSession::new());
        let events = collect(
            &[
                "data: {\"type\":\"response.reasoning_text.delta\",\"delta\":\"step\"}\n",
                "data: {\"type\":\"response.reasoning_text.done\",\"text\":\"step\"}\n",
                "data: [DONE]\n",
            ],
            &session,
        )
        .await;
        let reasoning = events
            .iter()
            .filter(|e| matches!(e, Ok(StreamEvent::ReasoningDelta { .. })))
            .count();
        assert_eq!(reasoning, 1);
    }
}
