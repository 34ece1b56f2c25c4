use thiserror::Error;

/// Errors from repository operations (used by trait definitions in ayla-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

/// User-facing error taxonomy for the conversation pipeline.
///
/// Every variant maps to a stable error kind plus a human-readable message
/// at the API boundary. `RateLimited` additionally carries the numeric
/// retry-after hint.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("hourly request limit reached, retry in {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("message rejected by safety filter: {reason}")]
    InputRejected { reason: String },

    #[error("assistant service unavailable: {0}")]
    ModelUnavailable(String),

    #[error("assistant did not respond within {0}s")]
    ModelTimeout(u64),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("conversation not found")]
    NotFound,

    #[error("conversation belongs to another user")]
    Forbidden,

    #[error("request cancelled by caller")]
    Cancelled,

    #[error("storage error: {0}")]
    Storage(String),
}

impl ChatError {
    /// Stable machine-readable kind for API serialization.
    pub fn kind(&self) -> &'static str {
        match self {
            ChatError::RateLimited { .. } => "RATE_LIMITED",
            ChatError::InputRejected { .. } => "INPUT_REJECTED",
            ChatError::ModelUnavailable(_) => "MODEL_UNAVAILABLE",
            ChatError::ModelTimeout(_) => "MODEL_TIMEOUT",
            ChatError::InvalidRequest(_) => "INVALID_REQUEST",
            ChatError::NotFound => "NOT_FOUND",
            ChatError::Forbidden => "FORBIDDEN",
            ChatError::Cancelled => "CANCELLED",
            ChatError::Storage(_) => "STORAGE_ERROR",
        }
    }

    /// Whether the caller may retry the same request unchanged.
    pub fn retryable(&self) -> bool {
        matches!(
            self,
            ChatError::ModelUnavailable(_) | ChatError::ModelTimeout(_)
        )
    }
}

impl From<RepositoryError> for ChatError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::NotFound => ChatError::NotFound,
            other => ChatError::Storage(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_error_display() {
        let err = RepositoryError::Query("syntax error".to_string());
        assert_eq!(err.to_string(), "query error: syntax error");
    }

    #[test]
    fn test_chat_error_kinds_are_stable() {
        assert_eq!(
            ChatError::RateLimited {
                retry_after_secs: 60
            }
            .kind(),
            "RATE_LIMITED"
        );
        assert_eq!(ChatError::NotFound.kind(), "NOT_FOUND");
        assert_eq!(ChatError::ModelTimeout(30).kind(), "MODEL_TIMEOUT");
    }

    #[test]
    fn test_only_transient_errors_are_retryable() {
        assert!(ChatError::ModelUnavailable("503".to_string()).retryable());
        assert!(ChatError::ModelTimeout(30).retryable());
        assert!(!ChatError::RateLimited { retry_after_secs: 1 }.retryable());
        assert!(!ChatError::NotFound.retryable());
        assert!(
            !ChatError::InputRejected {
                reason: "dosing".to_string()
            }
            .retryable()
        );
    }

    #[test]
    fn test_repository_not_found_maps_to_chat_not_found() {
        let err: ChatError = RepositoryError::NotFound.into();
        assert!(matches!(err, ChatError::NotFound));
    }
}
