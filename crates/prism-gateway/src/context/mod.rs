//! Conversation context tracking, token estimation, and compression

pub mod compress;
pub mod estimator;
pub mod manager;
pub mod record;

pub use compress::{CompressOptions, CompressionOutcome, compress};
pub use estimator::TokenEstimator;
pub use manager::{ContextManager, TurnSummary};
pub use record::{ContextMessage, ConversationRecord, Importance};
