//! Bounded retry with exponential backoff

use std::time::Duration;

use prism_config::RetryConfig;
use rand::Rng;
use tracing::debug;

use crate::error::GatewayError;

/// Run an operation with per-attempt timeout and bounded retries
///
/// Only transient failures retry (see [`GatewayError::is_transient`]);
/// everything else returns immediately. The delay between attempts
/// doubles from `base_delay`, is capped by `max_delay`, and carries
/// multiplicative jitter so synchronized callers spread out.
pub async fn retry_with_backoff<T, F, Fut>(
    config: &RetryConfig,
    operation: &str,
    mut attempt_fn: F,
) -> Result<T, GatewayError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, GatewayError>>,
{
    let mut last_error = None;

    for attempt in 0..config.max_attempts {
        let outcome = tokio::time::timeout(config.attempt_timeout, attempt_fn(attempt)).await;

        let error = match outcome {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(e)) => e,
            Err(_) => GatewayError::Timeout(format!(
                "{operation} did not answer within {:?}",
                config.attempt_timeout
            )),
        };

        if !error.is_transient() {
            return Err(error);
        }

        let remaining = config.max_attempts - attempt - 1;
        if remaining > 0 {
            let delay = backoff_delay(config, attempt);
            debug!(
                operation,
                attempt,
                remaining,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "transient failure, retrying"
            );
            tokio::time::sleep(delay).await;
        }
        last_error = Some(error);
    }

    // max_attempts >= 1 is enforced by config validation
    Err(last_error.unwrap_or_else(|| GatewayError::Internal(anyhow::anyhow!("retry loop ran no attempts"))))
}

/// Exponential delay for one attempt, jittered and capped
fn backoff_delay(config: &RetryConfig, attempt: u32) -> Duration {
    let exp = config
        .base_delay
        .saturating_mul(2u32.saturating_pow(attempt))
        .min(config.max_delay);
    exp.mul_f64(rand::rng().random_range(0.9..1.1))
}
