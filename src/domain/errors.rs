//! Domain errors for the Deskfy relay.

use thiserror::Error;

/// Domain-level errors raised by the relay's ports and services.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Chat provider call {operation} failed: {reason}")]
    ChatProvider { operation: String, reason: String },

    #[error("Correlation store {operation} failed: {reason}")]
    Store { operation: String, reason: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl DomainError {
    /// Build a chat provider error for the named operation.
    pub fn chat(operation: &str, reason: impl Into<String>) -> Self {
        Self::ChatProvider {
            operation: operation.to_string(),
            reason: reason.into(),
        }
    }

    /// Build a correlation store error for the named operation.
    pub fn store(operation: &str, reason: impl Into<String>) -> Self {
        Self::Store {
            operation: operation.to_string(),
            reason: reason.into(),
        }
    }
}

pub type DomainResult<T> = Result<T, DomainError>;

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::SerializationError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_error_display() {
        let err = DomainError::chat("chat.postMessage", "channel_not_found");
        assert_eq!(
            err.to_string(),
            "Chat provider call chat.postMessage failed: channel_not_found"
        );
    }

    #[test]
    fn test_serde_error_conversion() {
        let err: DomainError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(matches!(err, DomainError::SerializationError(_)));
    }
}
