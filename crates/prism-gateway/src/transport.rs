//! HTTP plumbing for upstream calls
//!
//! Owns the reqwest client, request headers, and the mapping from
//! transport-level and HTTP-level failures into [`GatewayError`].

use prism_config::UpstreamProviderConfig;
use prism_core::RequestContext;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use crate::error::{GatewayError, UpstreamErrorKind};
use crate::protocol::upstream::{UpstreamErrorResponse, UpstreamRequest};

/// Default upstream base URL
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// HTTP transport to one Responses-style upstream
pub struct UpstreamTransport {
    name: String,
    client: Client,
    base_url: Url,
    api_key: Option<SecretString>,
    forward_authorization: bool,
}

impl UpstreamTransport {
    /// Build a transport from provider configuration
    ///
    /// # Panics
    ///
    /// Panics if the hardcoded default base URL is invalid (should never happen).
    pub fn new(config: &UpstreamProviderConfig) -> Self {
        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| Url::parse(DEFAULT_BASE_URL).expect("valid default URL"));

        Self {
            name: config.name.clone(),
            client: Client::new(),
            base_url,
            api_key: config.api_key.clone(),
            forward_authorization: config.forward_authorization,
        }
    }

    /// Upstream name used in logs and circuit breaker keys
    pub fn name(&self) -> &str {
        &self.name
    }

    fn responses_url(&self) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        format!("{base}/responses")
    }

    /// Resolve the API key from config or the caller's forwarded token
    fn resolve_api_key(&self, context: &RequestContext) -> Option<String> {
        if self.forward_authorization
            && let Some(key) = &context.api_key
        {
            return Some(key.expose_secret().to_owned());
        }
        self.api_key.as_ref().map(|k| k.expose_secret().to_owned())
    }

    /// Post a request and classify any failure
    ///
    /// A success response is returned for the caller to consume as JSON
    /// or as a byte stream; everything else becomes a [`GatewayError`].
    pub async fn post(
        &self,
        request: &UpstreamRequest,
        context: &RequestContext,
    ) -> Result<reqwest::Response, GatewayError> {
        let mut builder = self
            .client
            .post(self.responses_url())
            .json(request)
            .header("x-correlation-id", context.correlation_id.as_str())
            .header(
                reqwest::header::USER_AGENT,
                concat!("prism-gateway/", env!("CARGO_PKG_VERSION")),
            );

        if let Some(key) = self.resolve_api_key(context) {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(|e| {
            tracing::error!(upstream = %self.name, error = %e, "upstream request failed");
            map_transport_error(&e)
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(upstream = %self.name, status = %status, "upstream returned error");
            return Err(classify_error_body(status.as_u16(), &body));
        }

        Ok(response)
    }
}

/// Map a reqwest failure to the transport error taxonomy
fn map_transport_error(error: &reqwest::Error) -> GatewayError {
    if error.is_timeout() {
        GatewayError::Timeout(error.to_string())
    } else {
        GatewayError::Network(error.to_string())
    }
}

/// Classify a non-success upstream answer
///
/// The structured error body is preferred; a body that does not parse
/// still yields the right status class.
pub fn classify_error_body(status: u16, body: &str) -> GatewayError {
    let (kind, message) = serde_json::from_str::<UpstreamErrorResponse>(body).map_or_else(
        |_| {
            let fallback = if body.trim().is_empty() {
                format!("upstream returned status {status}")
            } else {
                body.trim().to_owned()
            };
            (UpstreamErrorKind::Unknown, fallback)
        },
        |parsed| {
            (
                UpstreamErrorKind::parse(&parsed.error.error_type),
                parsed.error.message,
            )
        },
    );

    // The type string can lag the status code; the status wins
    let kind = match status {
        401 | 403 => UpstreamErrorKind::Authentication,
        429 => UpstreamErrorKind::RateLimit,
        500..=599 => UpstreamErrorKind::Server,
        _ => kind,
    };

    GatewayError::Upstream { status, kind, message }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structured_error_bodies_parse() {
        let err = classify_error_body(
            400,
            r#"{"error":{"message":"model not found","type":"invalid_request"}}"#,
        );
        match err {
            GatewayError::Upstream { status, kind, message } => {
                assert_eq!(status, 400);
                assert_eq!(kind, UpstreamErrorKind::InvalidRequest);
                assert_eq!(message, "model not found");
            }
            other => panic!("expected upstream error, got {other:?}"),
        }
    }

    #[test]
    fn status_overrides_a_stale_type_string() {
        let err = classify_error_body(429, r#"{"error":{"message":"slow down","type":"server_error"}}"#);
        assert!(matches!(
            err,
            GatewayError::Upstream { kind: UpstreamErrorKind::RateLimit, .. }
        ));
    }

    #[test]
    fn unparseable_bodies_keep_the_status() {
        let err = classify_error_body(503, "<html>bad gateway</html>");
        match err {
            GatewayError::Upstream { status, kind, .. } => {
                assert_eq!(status, 503);
                assert_eq!(kind, UpstreamErrorKind::Server);
            }
            other => panic!("expected upstream error, got {other:?}"),
        }
        // 5xx answers remain retryable
        assert!(classify_error_body(503, "").is_transient());
    }
}
