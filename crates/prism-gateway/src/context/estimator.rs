//! Heuristic token estimation
//!
//! A vendor tokenizer is deliberately out of scope; the estimate is
//! chars/4 for ASCII and chars/1.5 for everything else, widened by a
//! 15% safety margin so compression triggers early rather than late.

use mini_moka::sync::Cache;

/// Safety margin applied on top of the character heuristic
const MARGIN: f64 = 1.15;

/// Token estimator with a bounded per-message cache
///
/// Message estimates are keyed by id and content length, so an edited
/// message re-estimates while unchanged history stays cached.
pub struct TokenEstimator {
    cache: Cache<(String, usize), u32>,
}

impl TokenEstimator {
    /// Create an estimator with the given cache capacity
    pub fn new(cache_capacity: u64) -> Self {
        Self {
            cache: Cache::builder().max_capacity(cache_capacity).build(),
        }
    }

    /// Estimate tokens for free-standing text
    pub fn estimate_text(text: &str) -> u32 {
        if text.is_empty() {
            return 0;
        }
        let ascii = text.chars().filter(char::is_ascii).count();
        let wide = text.chars().count() - ascii;
        let raw = (ascii as f64 / 4.0 + wide as f64 / 1.5) * MARGIN;
        (raw.ceil() as u32).max(1)
    }

    /// Estimate tokens for a message, cached by id and content length
    pub fn estimate_message(&self, message_id: &str, content: &str) -> u32 {
        let key = (message_id.to_owned(), content.len());
        if let Some(cached) = self.cache.get(&key) {
            return cached;
        }
        let estimate = Self::estimate_text(content);
        self.cache.insert(key, estimate);
        estimate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_is_zero() {
        assert_eq!(TokenEstimator::estimate_text(""), 0);
    }

    #[test]
    fn ascii_estimates_near_chars_over_four() {
        // 400 ASCII chars -> 100 * 1.15 = 115
        let text = "a".repeat(400);
        assert_eq!(TokenEstimator::estimate_text(&text), 115);
    }

    #[test]
    fn wide_characters_cost_more() {
        let ascii = "a".repeat(30);
        let wide = "\u{3042}".repeat(30);
        assert!(TokenEstimator::estimate_text(&wide) > TokenEstimator::estimate_text(&ascii));
    }

    #[test]
    fn short_text_rounds_up_to_one() {
        assert_eq!(TokenEstimator::estimate_text("hi"), 1);
    }

    #[test]
    fn cache_returns_stable_estimates() {
        let estimator = TokenEstimator::new(16);
        let first = estimator.estimate_message("msg_1", "hello world");
        let second = estimator.estimate_message("msg_1", "hello world");
        assert_eq!(first, second);
    }
}
