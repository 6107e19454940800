use secrecy::SecretString;
use serde::Deserialize;
use url::Url;

/// Caller-facing wire dialect
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dialect {
    /// Claude Messages API shape
    Claude,
    /// OpenAI Chat Completions shape
    #[default]
    Openai,
}

/// Upstream provider configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpstreamConfig {
    /// Primary Responses-style provider
    #[serde(default)]
    pub primary: UpstreamProviderConfig,
    /// Secondary provider used by graceful degradation
    #[serde(default)]
    pub fallback: Option<UpstreamProviderConfig>,
    /// Dialect assumed when request fingerprinting is ambiguous
    #[serde(default)]
    pub default_dialect: Dialect,
}

/// Configuration for a single Responses-style provider
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpstreamProviderConfig {
    /// Provider name used in logs and circuit breaker keys
    #[serde(default = "default_name")]
    pub name: String,
    /// Base URL (the gateway appends `/responses`)
    #[serde(default)]
    pub base_url: Option<Url>,
    /// API key for authentication
    #[serde(default)]
    pub api_key: Option<SecretString>,
    /// Forward the caller's bearer token instead of the configured key
    #[serde(default)]
    pub forward_authorization: bool,
}

impl Default for UpstreamProviderConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            base_url: None,
            api_key: None,
            forward_authorization: false,
        }
    }
}

fn default_name() -> String {
    "primary".to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructed_defaults_match_deserialized_defaults() {
        let constructed = UpstreamConfig::default();
        assert_eq!(constructed.default_dialect, Dialect::Openai);
        assert_eq!(constructed.primary.name, "primary");
        assert!(constructed.fallback.is_none());

        let parsed: UpstreamConfig = toml::from_str("").unwrap();
        assert_eq!(parsed.default_dialect, constructed.default_dialect);
        assert_eq!(parsed.primary.name, constructed.primary.name);
    }
}
