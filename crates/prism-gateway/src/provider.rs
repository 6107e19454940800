//! Upstream provider trait and the Responses API implementation

use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::Stream;
use prism_config::UpstreamProviderConfig;
use prism_core::RequestContext;

use crate::convert::{canonical_to_upstream, upstream_to_canonical};
use crate::error::GatewayError;
use crate::stream::{StreamSession, demux_events};
use crate::transport::UpstreamTransport;
use crate::types::{CanonicalRequest, CanonicalResponse, StreamEvent};

/// Boxed canonical event stream returned by streaming calls
pub type EventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent, GatewayError>> + Send>>;

/// Trait implemented by each upstream completion backend
#[async_trait]
pub trait UpstreamProvider: Send + Sync {
    /// Name used in logs and circuit breaker keys
    fn name(&self) -> &str;

    /// Send a buffered completion request
    async fn complete(
        &self,
        request: &CanonicalRequest,
        context: &RequestContext,
    ) -> Result<CanonicalResponse, GatewayError>;

    /// Open a streaming completion, demultiplexed into canonical events
    ///
    /// The session owns cancellation and the exactly-once terminal
    /// guard for the returned stream.
    async fn complete_stream(
        &self,
        request: &CanonicalRequest,
        context: &RequestContext,
        session: Arc<StreamSession>,
    ) -> Result<EventStream, GatewayError>;
}

/// Provider speaking the Responses wire format over HTTP
pub struct ResponsesProvider {
    transport: UpstreamTransport,
}

impl ResponsesProvider {
    /// Create from provider configuration
    pub fn new(config: &UpstreamProviderConfig) -> Self {
        Self {
            transport: UpstreamTransport::new(config),
        }
    }
}

#[async_trait]
impl UpstreamProvider for ResponsesProvider {
    fn name(&self) -> &str {
        self.transport.name()
    }

    async fn complete(
        &self,
        request: &CanonicalRequest,
        context: &RequestContext,
    ) -> Result<CanonicalResponse, GatewayError> {
        let mut wire_request = canonical_to_upstream(request);
        wire_request.stream = None;

        let response = self.transport.post(&wire_request, context).await?;
        let wire_response = response
            .json()
            .await
            .map_err(|e| GatewayError::Upstream {
                status: 502,
                kind: crate::error::UpstreamErrorKind::Unknown,
                message: format!("failed to parse upstream response: {e}"),
            })?;

        Ok(upstream_to_canonical(wire_response))
    }

    async fn complete_stream(
        &self,
        request: &CanonicalRequest,
        context: &RequestContext,
        session: Arc<StreamSession>,
    ) -> Result<EventStream, GatewayError> {
        let mut wire_request = canonical_to_upstream(request);
        wire_request.stream = Some(true);

        let response = self.transport.post(&wire_request, context).await?;

        // Seed for the usage estimate when the feed ends with a bare [DONE]
        let prompt_estimate = prompt_tokens_estimate(request);

        Ok(Box::pin(demux_events(response.bytes_stream(), session, prompt_estimate)))
    }
}

/// Rough prompt size for streams whose upstream never reports usage
fn prompt_tokens_estimate(request: &CanonicalRequest) -> u32 {
    let chars: usize = request
        .messages
        .iter()
        .map(|m| m.content.len())
        .chain(request.system.as_ref().map(String::len))
        .sum();
    u32::try_from(chars / 4).unwrap_or(u32::MAX)
}
