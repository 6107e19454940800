//! Reasoning-effort inference
//!
//! When a caller does not state an effort level, the gateway scores the
//! request content against a configurable signal table and picks one.
//! The only contract is monotonicity: adding complexity signals to
//! otherwise identical content never lowers the level.

use prism_config::EffortConfig;

use crate::types::{CanonicalRequest, ReasoningEffort, Role};

/// Pluggable effort inference policy
pub trait EffortPolicy: Send + Sync {
    /// Infer an effort level for a request that did not state one
    fn infer(&self, request: &CanonicalRequest) -> ReasoningEffort;
}

/// Keyword-scoring effort policy
///
/// Scores the user-authored content: architecture and algorithm
/// keywords, simultaneous mention of several frameworks, and raw
/// content length all add points; the total maps to a level through
/// the configured cut-offs.
pub struct KeywordEffortPolicy {
    config: EffortConfig,
}

impl KeywordEffortPolicy {
    /// Build a policy from its signal table
    pub const fn new(config: EffortConfig) -> Self {
        Self { config }
    }

    fn score(&self, content: &str) -> u32 {
        let content = content.to_lowercase();
        let cfg = &self.config;

        let mut score = 0u32;
        for keyword in &cfg.architecture_keywords {
            if content.contains(keyword.as_str()) {
                score += cfg.architecture_weight;
            }
        }
        for keyword in &cfg.algorithm_keywords {
            if content.contains(keyword.as_str()) {
                score += cfg.algorithm_weight;
            }
        }

        let topics = cfg
            .topic_keywords
            .iter()
            .filter(|k| content.contains(k.as_str()))
            .count();
        if topics >= cfg.multi_topic_min {
            score += cfg.multi_topic_weight;
        }

        let length_points = if cfg.length_step == 0 {
            0
        } else {
            u32::try_from(content.len() / cfg.length_step).unwrap_or(u32::MAX)
        };
        score + length_points.min(cfg.length_cap)
    }
}

impl EffortPolicy for KeywordEffortPolicy {
    fn infer(&self, request: &CanonicalRequest) -> ReasoningEffort {
        let content: String = request
            .messages
            .iter()
            .filter(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        let score = self.score(&content);
        let cfg = &self.config;
        if score >= cfg.high_score {
            ReasoningEffort::High
        } else if score >= cfg.medium_score {
            ReasoningEffort::Medium
        } else if score >= cfg.low_score {
            ReasoningEffort::Low
        } else {
            ReasoningEffort::Minimal
        }
    }
}
