//! History compression strategies
//!
//! Each strategy keeps the newest `keep_recent` messages verbatim and
//! shrinks everything older. Strategies are pure over their inputs;
//! the manager caches outcomes keyed by history signature.

use std::collections::HashMap;

use prism_config::CompressionStrategy;

use super::estimator::TokenEstimator;
use super::record::{ContextMessage, Importance};
use crate::types::Role;

/// Tunables shared by all strategies
#[derive(Debug, Clone, PartialEq)]
pub struct CompressOptions {
    /// Messages kept verbatim at the tail
    pub keep_recent: usize,
    /// Target reduction for selective removal, 0.0 to 1.0
    pub reduction: f64,
}

/// Result of compressing a history
#[derive(Debug, Clone)]
pub struct CompressionOutcome {
    /// The compressed history, oldest first
    pub messages: Vec<ContextMessage>,
    /// Token estimate before compression
    pub tokens_before: u32,
    /// Token estimate after compression
    pub tokens_after: u32,
    /// Messages carried over verbatim
    pub preserved: usize,
}

/// Compress a history with the chosen strategy
pub fn compress(
    messages: &[ContextMessage],
    strategy: CompressionStrategy,
    options: &CompressOptions,
) -> CompressionOutcome {
    let tokens_before = total_tokens(messages);

    if messages.len() <= options.keep_recent {
        return CompressionOutcome {
            messages: messages.to_vec(),
            tokens_before,
            tokens_after: tokens_before,
            preserved: messages.len(),
        };
    }

    let split = messages.len() - options.keep_recent;
    let (head, tail) = messages.split_at(split);

    let mut kept = match strategy {
        CompressionStrategy::AiSummary => vec![summarize(head)],
        CompressionStrategy::SelectiveRemoval => selective_removal(head, options.reduction),
        CompressionStrategy::Hierarchical => hierarchical(head),
    };
    let preserved = kept
        .iter()
        .filter(|m| !m.id.starts_with("summary_"))
        .count()
        + tail.len();
    kept.extend(tail.iter().cloned());

    let tokens_after = total_tokens(&kept);
    CompressionOutcome {
        messages: kept,
        tokens_before,
        tokens_after,
        preserved,
    }
}

fn total_tokens(messages: &[ContextMessage]) -> u32 {
    messages
        .iter()
        .map(|m| m.token_count.unwrap_or_else(|| TokenEstimator::estimate_text(&m.content)))
        .sum()
}

// -- ai-summary --

/// Replace a span of history with one extractive summary message
fn summarize(head: &[ContextMessage]) -> ContextMessage {
    let topics = topic_keywords(head);
    let decisions = decision_lines(head);
    let questions = head
        .iter()
        .flat_map(|m| m.content.split(['.', '\n']))
        .filter(|s| s.trim_end().ends_with('?'))
        .count();
    let code_blocks: usize = head
        .iter()
        .map(|m| m.content.matches("```").count() / 2)
        .sum();

    let mut parts = Vec::new();
    if !topics.is_empty() {
        parts.push(format!("topics: {}", topics.join(", ")));
    }
    if !decisions.is_empty() {
        parts.push(format!("decisions: {}", decisions.join("; ")));
    }
    if questions > 0 {
        parts.push(format!("open questions: {questions}"));
    }
    if code_blocks > 0 {
        parts.push(format!("code blocks shared: {code_blocks}"));
    }

    let body = if parts.is_empty() {
        statistical_fallback(head)
    } else {
        parts.join(". ")
    };

    let first = &head[0];
    ContextMessage {
        id: format!("summary_{}", first.timestamp),
        role: Role::System,
        content: format!("[Summary of {} earlier messages] {body}", head.len()),
        timestamp: first.timestamp,
        token_count: None,
        importance: Some(Importance::High),
    }
}

/// Most frequent substantive words across a span
fn topic_keywords(head: &[ContextMessage]) -> Vec<String> {
    const STOPWORDS: &[&str] = &[
        "about", "after", "again", "because", "before", "being", "could", "should", "there", "these", "thing",
        "think", "those", "where", "which", "while", "would", "really", "please",
    ];

    let mut counts: HashMap<String, usize> = HashMap::new();
    for message in head {
        for word in message.content.split(|c: char| !c.is_alphanumeric()) {
            let word = word.to_lowercase();
            if word.len() > 4 && !STOPWORDS.contains(&word.as_str()) {
                *counts.entry(word).or_insert(0) += 1;
            }
        }
    }

    let mut ranked: Vec<(String, usize)> = counts.into_iter().filter(|(_, n)| *n > 1).collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.into_iter().take(5).map(|(w, _)| w).collect()
}

/// Lines that read like decisions, truncated for the summary
fn decision_lines(head: &[ContextMessage]) -> Vec<String> {
    const MARKERS: &[&str] = &["decided", "decision", "agreed", "we will", "let's go with"];

    head.iter()
        .flat_map(|m| m.content.lines())
        .filter(|line| {
            let lower = line.to_lowercase();
            MARKERS.iter().any(|marker| lower.contains(marker))
        })
        .take(2)
        .map(|line| {
            let line = line.trim();
            if line.len() > 80 {
                format!("{}...", &line[..line.floor_char_boundary(77)])
            } else {
                line.to_owned()
            }
        })
        .collect()
}

/// Counts-only summary used when extraction finds nothing
fn statistical_fallback(head: &[ContextMessage]) -> String {
    let user = head.iter().filter(|m| m.role == Role::User).count();
    let assistant = head.len() - user;
    let first_line = head[0].content.lines().next().unwrap_or_default();
    let first_line = &first_line[..first_line.floor_char_boundary(60.min(first_line.len()))];
    format!("{user} user and {assistant} assistant messages exchanged, beginning: {first_line}")
}

// -- selective-removal --

/// Keep a bounded quota of the head, favoring high-importance messages
///
/// The quota is derived from the requested reduction, so the target is
/// met even when importance alone would retain everything. High
/// importance fills the quota first (newest wins on overflow); any
/// remainder is an every-k-th sample of the rest.
fn selective_removal(head: &[ContextMessage], reduction: f64) -> Vec<ContextMessage> {
    let keep_fraction = (1.0 - reduction.clamp(0.0, 0.9)).max(0.1);
    let quota = ((head.len() as f64 * keep_fraction).ceil() as usize).max(1);

    let mut keep: Vec<usize> = head
        .iter()
        .enumerate()
        .filter(|(_, m)| m.importance() == Importance::High)
        .map(|(i, _)| i)
        .collect();

    if keep.len() > quota {
        keep.drain(..keep.len() - quota);
    } else if keep.len() < quota {
        let interval = (1.0 / keep_fraction).round().max(2.0) as usize;
        for i in (0..head.len()).step_by(interval) {
            if keep.len() >= quota {
                break;
            }
            if !keep.contains(&i) {
                keep.push(i);
            }
        }
        keep.sort_unstable();
    }

    keep.into_iter().map(|i| head[i].clone()).collect()
}

// -- hierarchical --

/// Importance-tiered retention: all high, newest half of medium, newest fifth of low
fn hierarchical(head: &[ContextMessage]) -> Vec<ContextMessage> {
    let mut high = Vec::new();
    let mut medium = Vec::new();
    let mut low = Vec::new();
    for message in head {
        match message.importance() {
            Importance::High => high.push(message.clone()),
            Importance::Medium => medium.push(message.clone()),
            Importance::Low => low.push(message.clone()),
        }
    }

    let mut kept = high;
    let medium_keep = medium.len() / 2;
    kept.extend(medium.into_iter().skip(medium_keep));
    let low_total = low.len();
    kept.extend(low.into_iter().skip(low_total - low_total.div_ceil(5).min(low_total)));
    kept.sort_by_key(|m| m.timestamp);
    kept
}
