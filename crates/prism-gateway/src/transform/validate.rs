//! Structural validation of canonical requests

use prism_config::LimitsConfig;

use crate::error::GatewayError;
use crate::types::CanonicalRequest;

/// Resolve the caller's `max_output_tokens` against configured limits
///
/// Absent means the configured default; zero is rejected; anything
/// below the provider floor is raised to it.
pub fn clamp_output_tokens(
    requested: Option<u32>,
    limits: &LimitsConfig,
) -> Result<u32, GatewayError> {
    match requested {
        None => Ok(limits.default_output_tokens),
        Some(0) => Err(GatewayError::Validation {
            field: "max_tokens".to_owned(),
            message: "must be greater than 0".to_owned(),
        }),
        Some(n) => Ok(n.max(limits.min_output_tokens)),
    }
}

/// Validate a canonical request against its structural invariants
pub fn validate(request: &CanonicalRequest) -> Result<(), GatewayError> {
    if request.model.trim().is_empty() {
        return Err(invalid("model", "must be a non-empty string"));
    }

    if request.messages.is_empty() {
        return Err(invalid("messages", "must contain at least one message"));
    }

    for (i, message) in request.messages.iter().enumerate() {
        if message.content.trim().is_empty() {
            return Err(GatewayError::Validation {
                field: format!("messages[{i}].content"),
                message: "must be non-empty".to_owned(),
            });
        }
    }

    if let Some(t) = request.temperature {
        if !(0.0..=2.0).contains(&t) {
            return Err(invalid("temperature", &format!("must be between 0 and 2; got {t}")));
        }
    }

    if let Some(p) = request.top_p {
        if !(0.0..=1.0).contains(&p) {
            return Err(invalid("top_p", &format!("must be between 0 and 1; got {p}")));
        }
    }

    Ok(())
}

fn invalid(field: &str, message: &str) -> GatewayError {
    GatewayError::Validation {
        field: field.to_owned(),
        message: message.to_owned(),
    }
}
