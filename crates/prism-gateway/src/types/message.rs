use serde::{Deserialize, Serialize};

use crate::error::GatewayError;

/// Role of a message participant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instruction
    System,
    /// User message
    User,
    /// Assistant response
    Assistant,
}

impl Role {
    /// Parse a wire role string, rejecting anything outside the accepted set
    pub fn parse(role: &str) -> Result<Self, GatewayError> {
        match role {
            "system" => Ok(Self::System),
            "user" => Ok(Self::User),
            "assistant" => Ok(Self::Assistant),
            other => Err(GatewayError::Validation {
                field: "messages.role".to_owned(),
                message: format!("must be one of user, assistant, system; got {other:?}"),
            }),
        }
    }

    /// Wire representation
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// Message in a canonical conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message author
    pub role: Role,
    /// Flattened text content
    pub content: String,
}

impl Message {
    /// Shorthand constructor
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_accepted_roles() {
        assert_eq!(Role::parse("user").unwrap(), Role::User);
        assert_eq!(Role::parse("assistant").unwrap(), Role::Assistant);
        assert_eq!(Role::parse("system").unwrap(), Role::System);
    }

    #[test]
    fn rejects_unknown_roles() {
        let err = Role::parse("tool").unwrap_err();
        assert!(err.to_string().contains("tool"));
    }
}
