//! Conversation analytics HTTP handlers.
//!
//! Endpoints:
//! - GET /api/v1/conversations/{id}/analytics - Aggregates for one conversation
//! - GET /api/v1/analytics                    - Aggregates for all active conversations

use std::time::Instant;

use axum::extract::{Path, State};
use axum::Json;
use uuid::Uuid;

use ayla_types::analytics::ConversationAnalytics;

use crate::http::error::AppError;
use crate::http::extractors::auth::AuthenticatedUser;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// GET /api/v1/conversations/{id}/analytics - One conversation's aggregates.
pub async fn get_conversation_analytics(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Path(conversation_id): Path<String>,
) -> Result<Json<ApiResponse<ConversationAnalytics>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let id = conversation_id
        .parse::<Uuid>()
        .map_err(|_| AppError::Validation(format!("Invalid UUID: {conversation_id}")))?;

    let analytics = state
        .conversation_service
        .analytics_for(&user_id, &id)
        .await?;

    let elapsed = start.elapsed().as_millis() as u64;
    let resp = ApiResponse::success(analytics, request_id, elapsed)
        .with_link("self", &format!("/api/v1/conversations/{id}/analytics"))
        .with_link("conversation", &format!("/api/v1/conversations/{id}"));

    Ok(Json(resp))
}

/// GET /api/v1/analytics - Aggregates across the caller's active conversations.
pub async fn list_analytics(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
) -> Result<Json<ApiResponse<Vec<ConversationAnalytics>>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let aggregates = state.conversation_service.analytics_overview(&user_id).await?;

    let elapsed = start.elapsed().as_millis() as u64;
    let resp = ApiResponse::success(aggregates, request_id, elapsed)
        .with_link("self", "/api/v1/analytics");

    Ok(Json(resp))
}
