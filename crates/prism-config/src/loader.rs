use std::path::Path;

use crate::Config;

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Reads the file, expands `{{ env.VAR }}` placeholders, then
    /// deserializes and validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, environment variable
    /// expansion fails, TOML parsing fails, or validation fails
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

        let expanded =
            crate::env::expand_env(&raw).map_err(|e| anyhow::anyhow!("config variable expansion failed: {e}"))?;

        let config: Self = toml::from_str(&expanded).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate that the configuration is internally consistent
    ///
    /// # Errors
    ///
    /// Returns an error on out-of-range thresholds or retry settings
    /// that would never attempt a call
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.resilience.retry.max_attempts == 0 {
            anyhow::bail!("resilience.retry.max_attempts must be at least 1");
        }

        if self.resilience.circuit_breaker.failure_threshold == 0 {
            anyhow::bail!("resilience.circuit_breaker.failure_threshold must be at least 1");
        }

        for (name, value) in [
            ("context.warning_threshold", self.context.warning_threshold),
            ("context.compression_threshold", self.context.compression_threshold),
            ("context.reduction", self.context.reduction),
        ] {
            if !(0.0..=1.0).contains(&value) {
                anyhow::bail!("{name} must be between 0.0 and 1.0, got {value}");
            }
        }

        if self.context.warning_threshold > self.context.compression_threshold {
            anyhow::bail!("context.warning_threshold must not exceed context.compression_threshold");
        }

        if self.limits.min_output_tokens > self.limits.default_output_tokens {
            anyhow::bail!("limits.min_output_tokens must not exceed limits.default_output_tokens");
        }

        Ok(())
    }
}
