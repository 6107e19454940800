#![allow(clippy::must_use_candidate)]

//! Configuration for the prism gateway
//!
//! Loaded from a TOML file with `{{ env.VAR }}` expansion. Every
//! section has sensible defaults, so an empty file yields a gateway
//! that only needs an upstream base URL and key to run.

pub mod context;
pub mod effort;
mod env;
pub mod limits;
mod loader;
pub mod resilience;
pub mod server;
pub mod upstream;

use serde::Deserialize;

pub use context::{CompressionStrategy, ContextConfig};
pub use effort::EffortConfig;
pub use limits::LimitsConfig;
pub use resilience::{CircuitBreakerConfig, DegradationConfig, ResilienceConfig, RetryConfig};
pub use server::ServerConfig;
pub use upstream::{Dialect, UpstreamConfig, UpstreamProviderConfig};

/// Top-level prism configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Listener configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Upstream provider configuration
    #[serde(default)]
    pub upstream: UpstreamConfig,
    /// Circuit breaker, retry, and degradation configuration
    #[serde(default)]
    pub resilience: ResilienceConfig,
    /// Conversation context tracking and compression
    #[serde(default)]
    pub context: ContextConfig,
    /// Request size and token limits
    #[serde(default)]
    pub limits: LimitsConfig,
    /// Reasoning-effort inference policy table
    #[serde(default)]
    pub effort: EffortConfig,
}
