//! Service status endpoint.
//!
//! GET /api/v1/status - Per-user quota usage plus recent model-gateway
//! success/failure counts for service-health reporting.

use std::time::Instant;

use axum::extract::State;
use axum::Json;
use uuid::Uuid;

use crate::http::error::AppError;
use crate::http::extractors::auth::AuthenticatedUser;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// GET /api/v1/status - Service status and the caller's usage statistics.
pub async fn get_status(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let quota = state.session_manager.quota_usage(user_id);
    let gateway = state.session_manager.gateway_snapshot();
    let (total_conversations, total_messages) = state
        .conversation_service
        .usage_counts(&user_id)
        .await?;

    let elapsed = start.elapsed().as_millis() as u64;

    let data = serde_json::json!({
        "service_status": "active",
        "model": state.session_manager.model_name(),
        "user_statistics": {
            "total_conversations": total_conversations,
            "total_messages": total_messages,
            "current_hourly_requests": quota.used,
            "rate_limit": quota.limit,
            "quota_resets_in_secs": quota.resets_in_secs,
            "recent_successful_calls": gateway.recent_successes,
            "recent_failed_calls": gateway.recent_failures,
        },
        "last_gateway_error": gateway.last_error,
        "features": [
            "health_focused_responses",
            "conversation_history",
            "safety_filtering",
            "rate_limiting",
        ],
    });

    let resp = ApiResponse::success(data, request_id, elapsed)
        .with_link("self", "/api/v1/status")
        .with_link("conversations", "/api/v1/conversations");

    Ok(Json(resp))
}
