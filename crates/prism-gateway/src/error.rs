use http::StatusCode;
use prism_core::{HttpError, sanitize};
use thiserror::Error;

/// Errors that can occur while serving a gateway request
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Request failed structural validation
    #[error("invalid {field}: {message}")]
    Validation {
        /// Field that failed validation
        field: String,
        /// What was wrong with it, including the offending value
        message: String,
    },

    /// Request content was rejected by security screening
    #[error("request rejected: {0}")]
    Security(String),

    /// Missing or invalid credentials
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// Caller or upstream rate limit hit
    #[error("rate limit exceeded")]
    RateLimit {
        /// Seconds until the limit resets, when known
        retry_after: Option<u64>,
    },

    /// Upstream did not answer within the attempt budget
    #[error("upstream timeout: {0}")]
    Timeout(String),

    /// Connection-level failure reaching the upstream
    #[error("network error: {0}")]
    Network(String),

    /// Circuit breaker is open for this upstream
    #[error("circuit open for upstream: {upstream}")]
    CircuitOpen {
        /// Upstream name the breaker guards
        upstream: String,
    },

    /// Upstream returned an error response
    #[error("upstream error ({status}): {message}")]
    Upstream {
        /// HTTP status the upstream answered with
        status: u16,
        /// Upstream error classification
        kind: UpstreamErrorKind,
        /// Upstream-provided message (sanitized before reaching callers)
        message: String,
    },

    /// Error inside an established stream
    #[error("streaming error: {0}")]
    Streaming(String),

    /// Unexpected internal error
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Upstream error taxonomy carried on [`GatewayError::Upstream`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamErrorKind {
    /// Upstream rejected the request shape
    InvalidRequest,
    /// Upstream rejected the credentials
    Authentication,
    /// Upstream rate limit
    RateLimit,
    /// Upstream internal failure
    Server,
    /// Anything the upstream did not classify
    Unknown,
}

impl UpstreamErrorKind {
    /// Classify an upstream error `type` string
    pub fn parse(error_type: &str) -> Self {
        match error_type {
            "invalid_request" | "invalid_request_error" => Self::InvalidRequest,
            "authentication" | "authentication_error" => Self::Authentication,
            "rate_limit" | "rate_limit_error" | "rate_limit_exceeded" => Self::RateLimit,
            "server_error" | "api_error" | "internal_error" => Self::Server,
            _ => Self::Unknown,
        }
    }

    /// Caller-facing error type string for this kind
    pub const fn error_type(self) -> &'static str {
        match self {
            Self::InvalidRequest => "invalid_request_error",
            Self::Authentication => "authentication_error",
            Self::RateLimit => "rate_limit_error",
            Self::Server | Self::Unknown => "api_error",
        }
    }
}

impl GatewayError {
    /// Whether this error class may succeed on retry
    ///
    /// Only transient failures retry: connection errors, timeouts, and
    /// upstream 5xx/429 answers. Validation, security, and credential
    /// errors never do.
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout(_) => true,
            Self::Upstream { status, .. } => *status == 429 || (*status >= 500 && *status < 600),
            _ => false,
        }
    }
}

impl HttpError for GatewayError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation { .. } | Self::Security(_) => StatusCode::BAD_REQUEST,
            Self::Authentication(_) => StatusCode::UNAUTHORIZED,
            Self::RateLimit { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Self::Network(_) => StatusCode::BAD_GATEWAY,
            Self::CircuitOpen { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::Upstream { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            Self::Streaming(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_type(&self) -> &str {
        match self {
            Self::Validation { .. } | Self::Security(_) => "invalid_request_error",
            Self::Authentication(_) => "authentication_error",
            Self::RateLimit { .. } => "rate_limit_error",
            Self::Timeout(_) => "timeout_error",
            Self::Upstream { kind, .. } => kind.error_type(),
            Self::Network(_) | Self::CircuitOpen { .. } | Self::Streaming(_) | Self::Internal(_) => "api_error",
        }
    }

    fn client_message(&self) -> String {
        match self {
            Self::Internal(_) => "an internal error occurred".to_owned(),
            other => sanitize::redact(&other.to_string()),
        }
    }
}
