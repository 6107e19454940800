//! Circuit breaker, retry, and graceful degradation around upstream calls
//!
//! Every upstream call runs through the same sequence: circuit check,
//! bounded retry, result recording, and (for an open circuit or
//! exhausted transient retries) the degradation chain.

pub mod circuit;
pub mod degrade;
pub mod retry;

use std::sync::Arc;

pub use circuit::{CircuitBreaker, CircuitRegistry, CircuitStatus};
pub use degrade::DegradationManager;
use prism_config::RetryConfig;
use prism_core::RequestContext;
pub use retry::retry_with_backoff;

use crate::error::GatewayError;
use crate::provider::{EventStream, UpstreamProvider};
use crate::stream::StreamSession;
use crate::types::{CanonicalRequest, CanonicalResponse};

/// A provider wrapped in the full resilience sequence
///
/// Breaker accounting is per call, not per attempt: one failed call
/// counts once however many retries it burned. A permanent upstream
/// answer (4xx other than 429) closes the breaker, since the upstream
/// proved responsive.
pub struct ResilientClient {
    provider: Arc<dyn UpstreamProvider>,
    registry: Arc<CircuitRegistry>,
    retry: RetryConfig,
    degradation: DegradationManager,
}

impl ResilientClient {
    /// Wrap a provider
    pub fn new(
        provider: Arc<dyn UpstreamProvider>,
        registry: Arc<CircuitRegistry>,
        retry: RetryConfig,
        degradation: DegradationManager,
    ) -> Self {
        Self {
            provider,
            registry,
            retry,
            degradation,
        }
    }

    /// Buffered completion with the full resilience sequence
    pub async fn complete(
        &self,
        request: &CanonicalRequest,
        context: &RequestContext,
    ) -> Result<CanonicalResponse, GatewayError> {
        let breaker = self.registry.breaker(self.provider.name());

        if let Err(open) = breaker.check() {
            return self.degradation.degrade(request, context, open).await;
        }

        let result = retry_with_backoff(&self.retry, "upstream completion", |_| {
            self.provider.complete(request, context)
        })
        .await;

        match result {
            Ok(response) => {
                breaker.record_success();
                Ok(response)
            }
            Err(error) => {
                record_outcome(&breaker, &error);
                self.degradation.degrade(request, context, error).await
            }
        }
    }

    /// Streaming completion; retries happen only before the stream opens
    pub async fn complete_stream(
        &self,
        request: &CanonicalRequest,
        context: &RequestContext,
        session: Arc<StreamSession>,
    ) -> Result<EventStream, GatewayError> {
        let breaker = self.registry.breaker(self.provider.name());

        if let Err(open) = breaker.check() {
            return self.degradation.degrade_stream(request, context, session, open).await;
        }

        let result = retry_with_backoff(&self.retry, "upstream stream open", |_| {
            self.provider.complete_stream(request, context, Arc::clone(&session))
        })
        .await;

        match result {
            Ok(stream) => {
                breaker.record_success();
                Ok(stream)
            }
            Err(error) => {
                record_outcome(&breaker, &error);
                self.degradation.degrade_stream(request, context, session, error).await
            }
        }
    }
}

/// Record a failed call against the breaker
///
/// Transient failures count toward opening; a permanent answer means
/// the upstream is reachable and resets the breaker, which also
/// resolves an in-flight half-open probe.
fn record_outcome(breaker: &CircuitBreaker, error: &GatewayError) {
    if error.is_transient() {
        breaker.record_failure();
    } else {
        breaker.record_success();
    }
}
