use secrecy::SecretString;

/// Runtime context for one inbound gateway request
///
/// Built by the handler layer from headers and threaded through the
/// transform, resilience, and upstream call paths.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Correlation id attached to logs and upstream calls
    pub correlation_id: String,
    /// Conversation id from the `x-conversation-id` header
    ///
    /// Absent means a stateless call: no history tracking, no
    /// compression, no previous-response linkage.
    pub conversation_id: Option<String>,
    /// Caller-provided API key that overrides the configured key
    pub api_key: Option<SecretString>,
}

impl RequestContext {
    /// Create a context with a fresh correlation id
    pub fn new() -> Self {
        Self {
            correlation_id: format!("req_{}", uuid::Uuid::new_v4().simple()),
            conversation_id: None,
            api_key: None,
        }
    }

    /// Attach a conversation id
    #[must_use]
    pub fn with_conversation(mut self, conversation_id: impl Into<String>) -> Self {
        self.conversation_id = Some(conversation_id.into());
        self
    }

    /// Attach a caller-provided correlation id, replacing the generated one
    #[must_use]
    pub fn with_correlation(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = correlation_id.into();
        self
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_context_is_stateless() {
        let ctx = RequestContext::new();
        assert!(ctx.conversation_id.is_none());
        assert!(ctx.api_key.is_none());
        assert!(ctx.correlation_id.starts_with("req_"));
    }

    #[test]
    fn generated_correlation_ids_are_unique() {
        let a = RequestContext::new();
        let b = RequestContext::new();
        assert_ne!(a.correlation_id, b.correlation_id);
    }
}
