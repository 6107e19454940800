//! Graceful degradation after the primary upstream is exhausted

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use prism_config::DegradationConfig;
use prism_core::RequestContext;
use tracing::warn;
use uuid::Uuid;

use crate::error::GatewayError;
use crate::provider::UpstreamProvider;
use crate::types::{CanonicalRequest, CanonicalResponse, DegradedInfo, OutputItem, Usage};

/// Fallback chain tried when the primary call cannot be served
///
/// Invoked only for an open circuit or exhausted transient retries;
/// permanent errors pass straight back to the caller. Substitutes are
/// tried in order: the secondary provider, then a configured static
/// completion. Every substitute success carries the `degraded` marker.
pub struct DegradationManager {
    config: DegradationConfig,
    fallback: Option<Arc<dyn UpstreamProvider>>,
}

impl DegradationManager {
    /// Create a manager over an optional secondary provider
    pub fn new(config: DegradationConfig, fallback: Option<Arc<dyn UpstreamProvider>>) -> Self {
        Self { config, fallback }
    }

    /// Whether an error is eligible for degradation
    pub fn applies_to(error: &GatewayError) -> bool {
        matches!(error, GatewayError::CircuitOpen { .. }) || error.is_transient()
    }

    /// Try substitutes for a failed buffered call
    ///
    /// Returns the original error unchanged when no substitute answers.
    pub async fn degrade(
        &self,
        request: &CanonicalRequest,
        context: &RequestContext,
        error: GatewayError,
    ) -> Result<CanonicalResponse, GatewayError> {
        if !Self::applies_to(&error) {
            return Err(error);
        }

        if self.config.use_fallback_provider
            && let Some(fallback) = &self.fallback
        {
            match fallback.complete(request, context).await {
                Ok(mut response) => {
                    warn!(
                        fallback = fallback.name(),
                        correlation = %context.correlation_id,
                        "primary upstream unavailable, served by fallback"
                    );
                    response.degraded = Some(DegradedInfo {
                        fallback: fallback.name().to_owned(),
                    });
                    return Ok(response);
                }
                Err(e) => {
                    warn!(fallback = fallback.name(), error = %e, "fallback provider also failed");
                }
            }
        }

        if let Some(text) = &self.config.static_completion {
            warn!(correlation = %context.correlation_id, "serving configured static completion");
            return Ok(static_response(request, text));
        }

        Err(error)
    }

    /// Try substitutes for a streaming call that could not be opened
    ///
    /// Only applies before any event reached the caller; once a stream
    /// is open, errors travel in-band instead. The degraded identity is
    /// logged rather than marked, since stream events carry no marker.
    pub async fn degrade_stream(
        &self,
        request: &CanonicalRequest,
        context: &RequestContext,
        session: Arc<crate::stream::StreamSession>,
        error: GatewayError,
    ) -> Result<crate::provider::EventStream, GatewayError> {
        if !Self::applies_to(&error) {
            return Err(error);
        }

        if self.config.use_fallback_provider
            && let Some(fallback) = &self.fallback
        {
            match fallback.complete_stream(request, context, Arc::clone(&session)).await {
                Ok(stream) => {
                    warn!(
                        fallback = fallback.name(),
                        correlation = %context.correlation_id,
                        "primary upstream unavailable, streaming from fallback"
                    );
                    return Ok(stream);
                }
                Err(e) => {
                    warn!(fallback = fallback.name(), error = %e, "fallback provider also failed");
                }
            }
        }

        if let Some(text) = &self.config.static_completion {
            warn!(correlation = %context.correlation_id, "serving configured static completion");
            let response = static_response(request, text);
            session.try_terminate();
            let events = vec![
                Ok(crate::types::StreamEvent::Created {
                    id: response.id,
                    created: response.created,
                }),
                Ok(crate::types::StreamEvent::TextDelta { text: text.to_owned() }),
                Ok(crate::types::StreamEvent::Completed { usage: Usage::default() }),
            ];
            return Ok(Box::pin(futures_util::stream::iter(events)));
        }

        Err(error)
    }
}

fn static_response(request: &CanonicalRequest, text: &str) -> CanonicalResponse {
    let created = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    CanonicalResponse {
        id: format!("resp_degraded_{}", Uuid::new_v4().simple()),
        created,
        model: request.model.clone(),
        output: vec![OutputItem::Text { text: text.to_owned() }],
        usage: Usage::default(),
        degraded: Some(DegradedInfo {
            fallback: "static".to_owned(),
        }),
    }
}
