//! Model-gateway types for Ayla.
//!
//! These types model the narrow contract with the external generative
//! model: a bounded slice of conversation history in, text plus usage
//! metadata out, or a typed failure. Provider-specific wire formats live
//! in `ayla-infra` -- these are provider-agnostic.

use serde::{Deserialize, Serialize};

use crate::conversation::Sender;

/// One prior turn handed to the model gateway as context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub sender: Sender,
    pub content: String,
}

/// A successful generation from the model gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelReply {
    pub text: String,
    pub tokens_used: u32,
    pub latency_ms: u64,
}

/// Typed failures from the model gateway.
///
/// The session manager never retries these itself; retry policy belongs to
/// the caller, guided by [`GatewayError::retryable`].
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Network failure, 5xx, or provider-side throttling. Transient.
    #[error("model endpoint unavailable: {0}")]
    Unavailable(String),

    /// The request was rejected by the provider (4xx). Not transient.
    #[error("invalid model request: {0}")]
    InvalidRequest(String),

    /// The configured deadline elapsed before the model responded.
    #[error("model call timed out after {0}s")]
    Timeout(u64),
}

impl GatewayError {
    /// Whether the caller may reasonably retry the same request.
    pub fn retryable(&self) -> bool {
        matches!(self, GatewayError::Unavailable(_) | GatewayError::Timeout(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(GatewayError::Unavailable("503".to_string()).retryable());
        assert!(GatewayError::Timeout(30).retryable());
        assert!(!GatewayError::InvalidRequest("bad payload".to_string()).retryable());
    }

    #[test]
    fn test_gateway_error_display() {
        let err = GatewayError::Timeout(30);
        assert_eq!(err.to_string(), "model call timed out after 30s");
    }

    #[test]
    fn test_chat_turn_serde() {
        let turn = ChatTurn {
            sender: Sender::User,
            content: "I have a headache".to_string(),
        };
        let json = serde_json::to_string(&turn).unwrap();
        assert!(json.contains("\"sender\":\"user\""));
    }
}
