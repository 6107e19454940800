//! Per-conversation context tracking
//!
//! Conversations are keyed by the caller-supplied conversation id.
//! Clients resend their full transcript each turn; the manager diffs it
//! against what it has already ingested, tracks a token estimate against
//! the model's context window, and compresses stored history once the
//! hard threshold is crossed. Idle records are swept out on a timer.

use std::sync::Arc;
use std::time::Instant;

use dashmap::DashMap;
use mini_moka::sync::Cache;
use prism_config::ContextConfig;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::compress::{CompressOptions, compress};
use super::estimator::TokenEstimator;
use super::record::{ContextMessage, ConversationRecord};
use crate::types::{CanonicalRequest, CanonicalResponse, Message};

/// What `prepare_turn` decided about a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnSummary {
    /// Token estimate over the stored history after this turn
    pub total_tokens: u32,
    /// Context window assumed for the requested model
    pub context_window: u32,
    /// Whether history was compressed this turn
    pub compressed: bool,
}

/// Tracks conversation history and applies compression
pub struct ContextManager {
    config: ContextConfig,
    records: DashMap<String, ConversationRecord>,
    estimator: TokenEstimator,
    /// Compression outcomes keyed by conversation state signature
    compressions: Cache<String, Vec<ContextMessage>>,
}

impl ContextManager {
    /// Create a manager from configuration
    pub fn new(config: ContextConfig) -> Self {
        let estimator = TokenEstimator::new(config.cache_capacity);
        let compressions = Cache::builder().max_capacity(config.cache_capacity).build();
        Self {
            config,
            records: DashMap::new(),
            estimator,
            compressions,
        }
    }

    /// Context window for a model id
    pub fn context_window(&self, model: &str) -> u32 {
        self.config
            .context_windows
            .get(model)
            .copied()
            .unwrap_or(self.config.default_context_window)
    }

    /// Fold a request into its conversation before the upstream call
    ///
    /// Ingests transcript messages not seen before, then rewrites the
    /// request to carry the stored (possibly compressed) history and the
    /// `previous_response_id` of the last upstream answer.
    pub fn prepare_turn(&self, conversation_id: &str, request: &mut CanonicalRequest) -> TurnSummary {
        let mut entry = self
            .records
            .entry(conversation_id.to_owned())
            .or_insert_with(|| ConversationRecord::new(conversation_id));
        let record = entry.value_mut();

        let new_messages: Vec<Message> = request
            .messages
            .get(record.ingested..)
            .unwrap_or_default()
            .to_vec();
        for message in new_messages {
            let timestamp = record.tick();
            let id = format!("{conversation_id}_{timestamp}");
            let token_count = self.estimator.estimate_message(&id, &message.content);
            record.messages.push(ContextMessage {
                id,
                role: message.role,
                content: message.content,
                timestamp,
                token_count: Some(token_count),
                importance: None,
            });
        }
        record.ingested = record.ingested.max(request.messages.len());
        record.total_tokens = history_tokens(&record.messages);

        let context_window = self.context_window(&request.model);
        let utilization = f64::from(record.total_tokens) / f64::from(context_window.max(1));

        let mut compressed = false;
        if utilization > self.config.compression_threshold {
            // The signature pins the exact history state, so a retried
            // turn reuses the earlier outcome instead of recomputing.
            let signature = format!("{conversation_id}:{}:{}", record.clock, record.messages.len());
            let kept = match self.compressions.get(&signature) {
                Some(hit) => hit,
                None => {
                    let outcome = compress(
                        &record.messages,
                        self.config.strategy,
                        &CompressOptions {
                            keep_recent: self.config.keep_recent.max(1),
                            reduction: self.config.reduction,
                        },
                    );
                    info!(
                        conversation = conversation_id,
                        tokens_before = outcome.tokens_before,
                        tokens_after = outcome.tokens_after,
                        preserved = outcome.preserved,
                        "compressed conversation history"
                    );
                    self.compressions.insert(signature, outcome.messages.clone());
                    outcome.messages
                }
            };
            record.messages = kept;
            record.total_tokens = history_tokens(&record.messages);
            compressed = true;
        } else if utilization >= self.config.warning_threshold {
            warn!(
                conversation = conversation_id,
                total_tokens = record.total_tokens,
                context_window,
                "conversation approaching its context window"
            );
        }

        request.messages = record
            .messages
            .iter()
            .map(|m| Message::new(m.role, m.content.clone()))
            .collect();
        request.previous_response_id = record.last_response_id.clone();
        record.last_touched = Instant::now();

        TurnSummary {
            total_tokens: record.total_tokens,
            context_window,
            compressed,
        }
    }

    /// Fold an upstream answer back into its conversation
    pub fn record_response(&self, conversation_id: &str, response: &CanonicalResponse) {
        let Some(mut entry) = self.records.get_mut(conversation_id) else {
            return;
        };
        let record = entry.value_mut();
        record.last_response_id = Some(response.id.clone());

        let text = response.visible_text();
        if !text.is_empty() {
            let timestamp = record.tick();
            let id = format!("{conversation_id}_{timestamp}");
            let token_count = self.estimator.estimate_message(&id, &text);
            record.messages.push(ContextMessage {
                id,
                role: crate::types::Role::Assistant,
                content: text,
                timestamp,
                token_count: Some(token_count),
                importance: None,
            });
            // The assistant turn will reappear in the client's next transcript
            record.ingested += 1;
            record.total_tokens = history_tokens(&record.messages);
        }
        record.last_touched = Instant::now();
    }

    /// Evict conversations idle past the configured TTL
    pub fn sweep(&self) -> usize {
        let before = self.records.len();
        self.records
            .retain(|_, record| record.last_touched.elapsed() < self.config.record_ttl);
        let evicted = before - self.records.len();
        if evicted > 0 {
            debug!(evicted, "evicted idle conversation records");
        }
        evicted
    }

    /// Run the eviction sweep on an interval until shutdown
    pub fn spawn_sweeper(self: &Arc<Self>, shutdown: CancellationToken) -> JoinHandle<()> {
        let manager = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(manager.config.sweep_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    () = shutdown.cancelled() => break,
                    _ = ticker.tick() => {
                        manager.sweep();
                    }
                }
            }
        })
    }
}

fn history_tokens(messages: &[ContextMessage]) -> u32 {
    messages
        .iter()
        .map(|m| m.token_count.unwrap_or_else(|| TokenEstimator::estimate_text(&m.content)))
        .sum()
}
