//! Conversation record types

use std::time::Instant;

use crate::types::Role;

/// Relative importance of a message when history is compressed
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Importance {
    /// Small talk, acknowledgements
    Low,
    /// Ordinary conversation turns
    Medium,
    /// Decisions, code, or explicitly important turns
    High,
}

/// One message held in conversation history
#[derive(Debug, Clone)]
pub struct ContextMessage {
    /// Stable message identifier
    pub id: String,
    /// Author role
    pub role: Role,
    /// Message text
    pub content: String,
    /// Ordering timestamp within the conversation
    pub timestamp: u64,
    /// Cached token estimate
    pub token_count: Option<u32>,
    /// Assigned importance; unset means it is derived on demand
    pub importance: Option<Importance>,
}

/// Classify a message's importance from its content
///
/// Code blocks and decision language rank high, questions medium,
/// everything else low. Used when no importance was assigned.
pub fn classify_importance(content: &str) -> Importance {
    let lower = content.to_lowercase();
    if content.contains("```")
        || lower.contains("decided")
        || lower.contains("decision")
        || lower.contains("important")
        || lower.contains("must ")
        || lower.contains("we will")
    {
        Importance::High
    } else if content.trim_end().ends_with('?') || lower.contains("error") || lower.contains("fail") {
        Importance::Medium
    } else {
        Importance::Low
    }
}

impl ContextMessage {
    /// Importance, assigned or derived
    pub fn importance(&self) -> Importance {
        self.importance.unwrap_or_else(|| classify_importance(&self.content))
    }
}

/// Tracked state of one conversation
#[derive(Debug)]
pub struct ConversationRecord {
    /// Conversation identifier from the caller
    pub id: String,
    /// Full (possibly compressed) history, oldest first
    pub messages: Vec<ContextMessage>,
    /// Last upstream response id, for `previous_response_id` linkage
    pub last_response_id: Option<String>,
    /// Token estimate over the current history
    pub total_tokens: u32,
    /// Client-transcript messages already ingested, for diffing resent
    /// transcripts against the (possibly compressed) stored history
    pub ingested: usize,
    /// Monotonic ordering clock for message timestamps
    pub clock: u64,
    /// Last time this conversation was touched, for eviction
    pub last_touched: Instant,
}

impl ConversationRecord {
    /// Create an empty record
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            messages: Vec::new(),
            last_response_id: None,
            total_tokens: 0,
            ingested: 0,
            clock: 0,
            last_touched: Instant::now(),
        }
    }

    /// Next timestamp for an appended message
    pub fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_and_decisions_rank_high() {
        assert_eq!(classify_importance("we decided to use postgres"), Importance::High);
        assert_eq!(classify_importance("```rust\nfn main() {}\n```"), Importance::High);
    }

    #[test]
    fn questions_rank_medium() {
        assert_eq!(classify_importance("what about retries?"), Importance::Medium);
    }

    #[test]
    fn chatter_ranks_low() {
        assert_eq!(classify_importance("thanks, looks good"), Importance::Low);
    }

    #[test]
    fn assigned_importance_wins_over_heuristic() {
        let msg = ContextMessage {
            id: "m1".to_owned(),
            role: crate::types::Role::User,
            content: "thanks".to_owned(),
            timestamp: 1,
            token_count: None,
            importance: Some(Importance::High),
        };
        assert_eq!(msg.importance(), Importance::High);
    }
}
