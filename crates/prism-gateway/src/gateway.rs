//! Request orchestration
//!
//! The gateway ties the pipeline together: parse the caller dialect,
//! normalize to the canonical shape, screen and validate, fold in
//! conversation context, infer reasoning effort, and hand the request
//! to the resilient upstream client. Responses come back canonical;
//! the handler layer re-encodes them for the caller.

use std::sync::Arc;

use prism_config::{Config, Dialect, LimitsConfig};
use prism_core::RequestContext;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::context::ContextManager;
use crate::convert::{claude_to_canonical, openai_to_canonical};
use crate::dialect::IncomingRequest;
use crate::error::GatewayError;
use crate::provider::{EventStream, ResponsesProvider, UpstreamProvider};
use crate::resilience::{CircuitRegistry, DegradationManager, ResilientClient};
use crate::stream::StreamSession;
use crate::transform::{EffortPolicy, KeywordEffortPolicy, screen, screen_body_size, validate};
use crate::types::{CanonicalRequest, CanonicalResponse};

/// An open streaming completion handed to the encoder layer
pub struct StreamHandle {
    /// Session owning cancellation and the terminal guard
    pub session: Arc<StreamSession>,
    /// Canonical event feed
    pub events: EventStream,
    /// Model id, needed by the dialect stream encoders
    pub model: String,
}

struct Inner {
    limits: LimitsConfig,
    default_dialect: Dialect,
    client: ResilientClient,
    context: Arc<ContextManager>,
    effort: Box<dyn EffortPolicy>,
}

/// The request pipeline, cheap to clone and share across handlers
#[derive(Clone)]
pub struct Gateway {
    inner: Arc<Inner>,
}

impl Gateway {
    /// Assemble the pipeline from configuration
    pub fn new(config: Config) -> Self {
        let primary: Arc<dyn UpstreamProvider> = Arc::new(ResponsesProvider::new(&config.upstream.primary));
        let fallback: Option<Arc<dyn UpstreamProvider>> = config
            .upstream
            .fallback
            .as_ref()
            .map(|cfg| Arc::new(ResponsesProvider::new(cfg)) as Arc<dyn UpstreamProvider>);

        let registry = Arc::new(CircuitRegistry::new(config.resilience.circuit_breaker.clone()));
        let degradation = DegradationManager::new(config.resilience.degradation.clone(), fallback);
        let client = ResilientClient::new(primary, registry, config.resilience.retry.clone(), degradation);

        Self {
            inner: Arc::new(Inner {
                limits: config.limits,
                default_dialect: config.upstream.default_dialect,
                client,
                context: Arc::new(ContextManager::new(config.context)),
                effort: Box::new(KeywordEffortPolicy::new(config.effort)),
            }),
        }
    }

    /// Dialect assumed when a raw body fingerprints as neither caller shape
    pub fn default_dialect(&self) -> Dialect {
        self.inner.default_dialect
    }

    /// Request body ceiling in bytes
    pub fn max_body_bytes(&self) -> usize {
        self.inner.limits.max_body_bytes
    }

    /// Parse a raw body, detecting its dialect
    pub fn parse_request(&self, body: &[u8]) -> Result<IncomingRequest, GatewayError> {
        screen_body_size(body.len(), self.inner.limits.max_body_bytes)?;
        IncomingRequest::parse(body, self.inner.default_dialect)
    }

    /// Parse a raw body as a known dialect, as the routed endpoints do
    pub fn parse_request_as(&self, body: &[u8], dialect: Dialect) -> Result<IncomingRequest, GatewayError> {
        screen_body_size(body.len(), self.inner.limits.max_body_bytes)?;
        let value = serde_json::from_slice(body).map_err(|e| GatewayError::Validation {
            field: "body".to_owned(),
            message: format!("invalid JSON: {e}"),
        })?;
        IncomingRequest::parse_as(value, dialect)
    }

    /// Run a buffered completion through the full pipeline
    pub async fn complete(
        &self,
        incoming: IncomingRequest,
        context: &RequestContext,
    ) -> Result<CanonicalResponse, GatewayError> {
        let request = self.prepare(incoming, context)?;
        let response = self.inner.client.complete(&request, context).await?;

        if let Some(conversation_id) = &context.conversation_id {
            self.inner.context.record_response(conversation_id, &response);
        }
        Ok(response)
    }

    /// Open a streaming completion through the full pipeline
    ///
    /// Streamed turns do not feed back into conversation history; the
    /// client's next transcript carries the assistant text instead.
    pub async fn complete_stream(
        &self,
        incoming: IncomingRequest,
        context: &RequestContext,
    ) -> Result<StreamHandle, GatewayError> {
        let mut request = self.prepare(incoming, context)?;
        request.stream = true;

        let session = Arc::new(StreamSession::new());
        let model = request.model.clone();
        let events = self
            .inner
            .client
            .complete_stream(&request, context, Arc::clone(&session))
            .await?;

        Ok(StreamHandle { session, events, model })
    }

    /// Normalize, screen, validate, and enrich one incoming request
    fn prepare(
        &self,
        incoming: IncomingRequest,
        context: &RequestContext,
    ) -> Result<CanonicalRequest, GatewayError> {
        let mut request = match incoming {
            IncomingRequest::Claude(req) => claude_to_canonical(req, &self.inner.limits)?,
            IncomingRequest::OpenAi(req) => openai_to_canonical(req, &self.inner.limits)?,
        };

        screen(&mut request)?;
        validate(&request)?;

        if let Some(conversation_id) = &context.conversation_id {
            let summary = self.inner.context.prepare_turn(conversation_id, &mut request);
            debug!(
                correlation = %context.correlation_id,
                conversation = conversation_id,
                total_tokens = summary.total_tokens,
                compressed = summary.compressed,
                "conversation context applied"
            );
        }

        if request.reasoning_effort.is_none() {
            let inferred = self.inner.effort.infer(&request);
            debug!(
                correlation = %context.correlation_id,
                effort = inferred.as_str(),
                "inferred reasoning effort"
            );
            request.reasoning_effort = Some(inferred);
        }

        Ok(request)
    }

    /// Run the conversation eviction sweep until shutdown
    pub fn spawn_context_sweeper(&self, shutdown: CancellationToken) -> JoinHandle<()> {
        self.inner.context.spawn_sweeper(shutdown)
    }
}

#[cfg(test)]
mod tests {
    use prism_config::UpstreamConfig;
    use serde_json::json;

    use super::*;

    fn gateway() -> Gateway {
        Gateway::new(Config {
            upstream: UpstreamConfig {
                default_dialect: Dialect::Openai,
                ..UpstreamConfig::default()
            },
            ..Config::default()
        })
    }

    #[test]
    fn oversized_bodies_are_rejected_before_parsing() {
        let gw = Gateway::new(Config {
            limits: LimitsConfig {
                max_body_bytes: 8,
                ..LimitsConfig::default()
            },
            ..Config::default()
        });
        let err = gw.parse_request(br#"{"model":"m","messages":[]}"#).unwrap_err();
        assert!(matches!(err, GatewayError::Validation { field, .. } if field == "body"));
    }

    #[test]
    fn parse_detects_the_claude_shape() {
        let body = serde_json::to_vec(&json!({
            "model": "m",
            "max_tokens": 50,
            "system": "be brief",
            "messages": [{"role": "user", "content": "hi"}],
        }))
        .unwrap();
        let incoming = gateway().parse_request(&body).unwrap();
        assert_eq!(incoming.dialect(), Dialect::Claude);
    }

    #[test]
    fn prepare_infers_effort_when_unset() {
        let body = serde_json::to_vec(&json!({
            "model": "m",
            "messages": [{"role": "user", "content": "what time is it?"}],
        }))
        .unwrap();
        let gw = gateway();
        let incoming = gw.parse_request(&body).unwrap();
        let request = gw.prepare(incoming, &RequestContext::new()).unwrap();
        assert!(request.reasoning_effort.is_some());
    }

    #[test]
    fn prepare_keeps_an_explicit_effort() {
        let body = serde_json::to_vec(&json!({
            "model": "m",
            "reasoning_effort": "high",
            "messages": [{"role": "user", "content": "hi"}],
        }))
        .unwrap();
        let gw = gateway();
        let incoming = gw.parse_request(&body).unwrap();
        let request = gw.prepare(incoming, &RequestContext::new()).unwrap();
        assert_eq!(request.reasoning_effort, Some(crate::types::ReasoningEffort::High));
    }

    #[test]
    fn prepare_rejects_screened_content() {
        let body = serde_json::to_vec(&json!({
            "model": "m",
            "messages": [{"role": "user", "content": "render {{ secrets }}"}],
        }))
        .unwrap();
        let gw = gateway();
        let incoming = gw.parse_request(&body).unwrap();
        let err = gw.prepare(incoming, &RequestContext::new()).unwrap_err();
        assert!(matches!(err, GatewayError::Security(_)));
    }

    #[test]
    fn prepare_folds_in_conversation_context() {
        let body = serde_json::to_vec(&json!({
            "model": "m",
            "messages": [{"role": "user", "content": "hello there"}],
        }))
        .unwrap();
        let gw = gateway();
        let ctx = RequestContext::new().with_conversation("conv_42");

        let incoming = gw.parse_request(&body).unwrap();
        let request = gw.prepare(incoming, &ctx).unwrap();
        assert_eq!(request.messages.len(), 1);
        assert_eq!(request.previous_response_id, None);
    }
}
