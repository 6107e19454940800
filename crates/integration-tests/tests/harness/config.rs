//! Programmatic configuration builder for integration tests

use std::time::Duration;

use prism_config::{Config, RetryConfig, UpstreamProviderConfig};
use secrecy::SecretString;
use url::Url;

/// Builder for constructing test configurations
///
/// Defaults to fast retry timing so failure-path tests finish quickly.
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a builder with test-friendly defaults
    pub fn new() -> Self {
        let mut config = Config::default();
        config.resilience.retry = RetryConfig {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            attempt_timeout: Duration::from_secs(2),
        };
        Self { config }
    }

    /// Point the primary provider at a mock upstream
    pub fn with_primary(mut self, base_url: &str) -> Self {
        self.config.upstream.primary = provider("primary", base_url);
        self
    }

    /// Add a fallback provider
    pub fn with_fallback(mut self, base_url: &str) -> Self {
        self.config.upstream.fallback = Some(provider("backup", base_url));
        self
    }

    /// Circuit breaker failure threshold
    pub fn with_failure_threshold(mut self, threshold: u32) -> Self {
        self.config.resilience.circuit_breaker.failure_threshold = threshold;
        self
    }

    /// Total retry attempts per call
    pub fn with_retry_attempts(mut self, attempts: u32) -> Self {
        self.config.resilience.retry.max_attempts = attempts;
        self
    }

    /// Static completion served as the degradation last resort
    pub fn with_static_completion(mut self, text: &str) -> Self {
        self.config.resilience.degradation.static_completion = Some(text.to_owned());
        self
    }

    /// Context window override for one model
    pub fn with_context_window(mut self, model: &str, tokens: u32) -> Self {
        self.config.context.context_windows.insert(model.to_owned(), tokens);
        self
    }

    /// Finish building
    pub fn build(self) -> Config {
        self.config
    }
}

fn provider(name: &str, base_url: &str) -> UpstreamProviderConfig {
    UpstreamProviderConfig {
        name: name.to_owned(),
        base_url: Some(Url::parse(base_url).expect("valid mock base url")),
        api_key: Some(SecretString::from("sk-test".to_owned())),
        forward_authorization: false,
    }
}
