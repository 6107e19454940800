use std::time::Duration;

use indexmap::IndexMap;
use serde::Deserialize;

/// Conversation context tracking and compression configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContextConfig {
    /// Utilization above which a warning is logged
    #[serde(default = "default_warning_threshold")]
    pub warning_threshold: f64,
    /// Utilization above which history is compressed
    #[serde(default = "default_compression_threshold")]
    pub compression_threshold: f64,
    /// Compression strategy applied when the hard threshold is crossed
    #[serde(default)]
    pub strategy: CompressionStrategy,
    /// Messages kept verbatim at the tail of a compressed history
    #[serde(default = "default_keep_recent")]
    pub keep_recent: usize,
    /// Reduction target for selective removal, 0.0–1.0
    #[serde(default = "default_reduction")]
    pub reduction: f64,
    /// Context window per model id; `default_context_window` covers the rest
    #[serde(default)]
    pub context_windows: IndexMap<String, u32>,
    /// Context window assumed for unknown models
    #[serde(default = "default_context_window")]
    pub default_context_window: u32,
    /// Age after which idle conversation records are evicted
    #[serde(default = "default_record_ttl", deserialize_with = "duration_str::deserialize_duration")]
    pub record_ttl: Duration,
    /// How often the eviction sweep runs
    #[serde(default = "default_sweep_interval", deserialize_with = "duration_str::deserialize_duration")]
    pub sweep_interval: Duration,
    /// Capacity bound for the token-estimate and compression caches
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: u64,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            warning_threshold: default_warning_threshold(),
            compression_threshold: default_compression_threshold(),
            strategy: CompressionStrategy::default(),
            keep_recent: default_keep_recent(),
            reduction: default_reduction(),
            context_windows: IndexMap::new(),
            default_context_window: default_context_window(),
            record_ttl: default_record_ttl(),
            sweep_interval: default_sweep_interval(),
            cache_capacity: default_cache_capacity(),
        }
    }
}

/// History compression strategy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompressionStrategy {
    /// Extractive summary of everything before the kept tail
    #[default]
    AiSummary,
    /// Drop low-value messages, keeping the tail verbatim
    SelectiveRemoval,
    /// Importance-tiered retention
    Hierarchical,
}

fn default_warning_threshold() -> f64 {
    0.8
}

fn default_compression_threshold() -> f64 {
    0.9
}

fn default_keep_recent() -> usize {
    4
}

fn default_reduction() -> f64 {
    0.5
}

fn default_context_window() -> u32 {
    128_000
}

fn default_record_ttl() -> Duration {
    Duration::from_secs(30 * 60)
}

fn default_sweep_interval() -> Duration {
    Duration::from_secs(60)
}

fn default_cache_capacity() -> u64 {
    10_000
}
