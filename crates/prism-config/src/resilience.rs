use std::time::Duration;

use serde::Deserialize;

/// Circuit breaker, retry, and degradation configuration
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResilienceConfig {
    /// Circuit breaker settings
    #[serde(default)]
    pub circuit_breaker: CircuitBreakerConfig,
    /// Retry settings
    #[serde(default)]
    pub retry: RetryConfig,
    /// Graceful degradation settings
    #[serde(default)]
    pub degradation: DegradationConfig,
}

/// Circuit breaker settings, applied per upstream name
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures before the circuit opens
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
    /// How long the circuit stays open before allowing a probe
    #[serde(default = "default_recovery_timeout", deserialize_with = "duration_str::deserialize_duration")]
    pub recovery_timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            recovery_timeout: default_recovery_timeout(),
        }
    }
}

/// Retry settings for transient upstream failures
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetryConfig {
    /// Total attempts, including the first call
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Backoff before the first retry; doubles each attempt
    #[serde(default = "default_base_delay", deserialize_with = "duration_str::deserialize_duration")]
    pub base_delay: Duration,
    /// Backoff ceiling
    #[serde(default = "default_max_delay", deserialize_with = "duration_str::deserialize_duration")]
    pub max_delay: Duration,
    /// Budget for a single upstream attempt
    #[serde(default = "default_attempt_timeout", deserialize_with = "duration_str::deserialize_duration")]
    pub attempt_timeout: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay: default_base_delay(),
            max_delay: default_max_delay(),
            attempt_timeout: default_attempt_timeout(),
        }
    }
}

/// Graceful degradation settings
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DegradationConfig {
    /// Whether to try the fallback provider after retries exhaust
    #[serde(default = "default_true")]
    pub use_fallback_provider: bool,
    /// Static completion text returned as a last resort
    ///
    /// Unset means degradation fails through to the original error.
    #[serde(default)]
    pub static_completion: Option<String>,
}

impl Default for DegradationConfig {
    fn default() -> Self {
        Self {
            use_fallback_provider: default_true(),
            static_completion: None,
        }
    }
}

fn default_failure_threshold() -> u32 {
    5
}

fn default_recovery_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay() -> Duration {
    Duration::from_millis(200)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(5)
}

fn default_attempt_timeout() -> Duration {
    Duration::from_secs(60)
}

const fn default_true() -> bool {
    true
}
