use serde::Deserialize;

/// Request size and token limits
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LimitsConfig {
    /// Request body ceiling in bytes; larger payloads are rejected
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    /// `max_output_tokens` applied when the caller omits it
    #[serde(default = "default_output_tokens")]
    pub default_output_tokens: u32,
    /// Provider floor for `max_output_tokens`
    #[serde(default = "default_min_output_tokens")]
    pub min_output_tokens: u32,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: default_max_body_bytes(),
            default_output_tokens: default_output_tokens(),
            min_output_tokens: default_min_output_tokens(),
        }
    }
}

const fn default_max_body_bytes() -> usize {
    10 * 1024 * 1024
}

const fn default_output_tokens() -> u32 {
    4000
}

const fn default_min_output_tokens() -> u32 {
    16
}
