//! Per-stream session state

use std::sync::atomic::{AtomicBool, Ordering};

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// State owned by one in-flight streaming request
///
/// The terminal flag is the single point deciding which of completion,
/// error, or cancellation ends the stream: the first check-and-set
/// wins and every later terminal signal is ignored.
#[derive(Debug)]
pub struct StreamSession {
    id: String,
    cancel: CancellationToken,
    terminated: AtomicBool,
}

impl StreamSession {
    /// Start a new session
    pub fn new() -> Self {
        Self {
            id: format!("stream_{}", Uuid::new_v4()),
            cancel: CancellationToken::new(),
            terminated: AtomicBool::new(false),
        }
    }

    /// Session identifier for logs
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Token that fires when the caller abandons the stream
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Request cancellation; loses against an already-recorded terminal
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Claim the terminal slot; true only for the first caller
    pub fn try_terminate(&self) -> bool {
        !self.terminated.swap(true, Ordering::SeqCst)
    }

    /// Whether a terminal has been recorded
    pub fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::SeqCst)
    }
}

impl Default for StreamSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_terminal_wins() {
        let session = StreamSession::new();
        assert!(!session.is_terminated());
        assert!(session.try_terminate());
        assert!(!session.try_terminate());
        assert!(session.is_terminated());
    }

    #[test]
    fn cancellation_fires_the_token() {
        let session = StreamSession::new();
        let token = session.cancel_token();
        assert!(!token.is_cancelled());
        session.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn ids_are_unique() {
        assert_ne!(StreamSession::new().id(), StreamSession::new().id());
    }
}
