//! Application error type mapping to HTTP status codes and envelope format.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use ayla_types::error::ChatError;

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Conversation pipeline errors.
    Chat(ChatError),
    /// Authentication failure.
    Unauthorized(String),
    /// Validation error outside the pipeline (bad path/query/body shape).
    Validation(String),
    /// Generic internal error.
    Internal(String),
}

impl From<ChatError> for AppError {
    fn from(e: ChatError) -> Self {
        AppError::Chat(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match &self {
            AppError::Chat(ChatError::RateLimited { retry_after_secs }) => (
                StatusCode::TOO_MANY_REQUESTS,
                "RATE_LIMITED",
                format!("Hourly request limit reached. Retry in {retry_after_secs}s."),
                Some(json!({ "retry_after_secs": retry_after_secs, "retryable": false })),
            ),
            AppError::Chat(ChatError::InputRejected { reason }) => (
                StatusCode::BAD_REQUEST,
                "INPUT_REJECTED",
                format!("Message rejected by safety filter ({reason})."),
                None,
            ),
            AppError::Chat(ChatError::ModelUnavailable(detail)) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "MODEL_UNAVAILABLE",
                format!("Assistant service unavailable: {detail}"),
                Some(json!({ "retryable": true })),
            ),
            AppError::Chat(ChatError::ModelTimeout(secs)) => (
                StatusCode::GATEWAY_TIMEOUT,
                "MODEL_TIMEOUT",
                format!("Assistant did not respond within {secs}s."),
                Some(json!({ "retryable": true })),
            ),
            AppError::Chat(ChatError::InvalidRequest(detail)) => (
                StatusCode::BAD_REQUEST,
                "INVALID_REQUEST",
                detail.clone(),
                None,
            ),
            AppError::Chat(ChatError::NotFound) => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                "Conversation not found".to_string(),
                None,
            ),
            AppError::Chat(ChatError::Forbidden) => (
                StatusCode::FORBIDDEN,
                "FORBIDDEN",
                "Conversation belongs to another user".to_string(),
                None,
            ),
            AppError::Chat(ChatError::Cancelled) => (
                StatusCode::BAD_REQUEST,
                "CANCELLED",
                "Request cancelled by caller".to_string(),
                None,
            ),
            AppError::Chat(ChatError::Storage(detail)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "STORAGE_ERROR",
                detail.clone(),
                None,
            ),
            AppError::Unauthorized(msg) => {
                (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone(), None)
            }
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone(), None)
            }
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                msg.clone(),
                None,
            ),
        };

        let body = json!({
            "data": null,
            "meta": {
                "request_id": "",
                "timestamp": chrono::Utc::now().to_rfc3339(),
                "response_time_ms": 0
            },
            "errors": [{
                "code": code,
                "message": message,
                "details": details,
            }]
        });

        (
            status,
            [(axum::http::header::CONTENT_TYPE, "application/json")],
            body.to_string(),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(
            status_of(AppError::Chat(ChatError::RateLimited {
                retry_after_secs: 10
            })),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            status_of(AppError::Chat(ChatError::NotFound)),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(AppError::Chat(ChatError::ModelTimeout(30))),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            status_of(AppError::Chat(ChatError::ModelUnavailable("x".into()))),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_of(AppError::Unauthorized("no key".into())),
            StatusCode::UNAUTHORIZED
        );
    }
}
