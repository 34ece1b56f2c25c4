//! Conversation CRUD HTTP handlers.
//!
//! Endpoints:
//! - GET    /api/v1/conversations        - List the caller's conversations
//! - GET    /api/v1/conversations/{id}   - Conversation + full message history
//! - DELETE /api/v1/conversations/{id}   - Soft-delete one conversation
//! - DELETE /api/v1/conversations        - Clear all conversations (confirm required)

use std::time::Instant;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use ayla_types::conversation::{Conversation, ConversationSummary, Message};

use crate::http::error::AppError;
use crate::http::extractors::auth::AuthenticatedUser;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// Query parameters for conversation listing.
#[derive(Debug, Deserialize)]
pub struct ConversationListQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

/// Hard cap on page size.
const MAX_LIMIT: i64 = 100;

/// Request body for the bulk clear endpoint.
#[derive(Debug, Deserialize)]
pub struct ClearAllRequest {
    #[serde(default)]
    pub confirm: bool,
}

/// Conversation detail payload: the conversation plus its ordered messages.
#[derive(Debug, Serialize)]
pub struct ConversationDetail {
    #[serde(flatten)]
    pub conversation: Conversation,
    pub messages: Vec<Message>,
}

/// Parse a UUID from a path parameter, returning a 400 error on invalid format.
fn parse_uuid(s: &str) -> Result<Uuid, AppError> {
    s.parse::<Uuid>()
        .map_err(|_| AppError::Validation(format!("Invalid UUID: {s}")))
}

/// GET /api/v1/conversations - List active conversations, most recent first.
pub async fn list_conversations(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Query(query): Query<ConversationListQuery>,
) -> Result<Json<ApiResponse<Vec<ConversationSummary>>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    if query.limit < 1 || query.offset < 0 {
        return Err(AppError::Validation(
            "limit must be >= 1 and offset must be >= 0".to_string(),
        ));
    }
    let limit = query.limit.min(MAX_LIMIT);

    let summaries = state
        .conversation_service
        .list(&user_id, limit, query.offset)
        .await?;

    let elapsed = start.elapsed().as_millis() as u64;
    let resp = ApiResponse::success(summaries, request_id, elapsed)
        .with_link("self", "/api/v1/conversations");

    Ok(Json(resp))
}

/// GET /api/v1/conversations/{id} - Full ordered message history.
pub async fn get_conversation(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Path(conversation_id): Path<String>,
) -> Result<Json<ApiResponse<ConversationDetail>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let id = parse_uuid(&conversation_id)?;
    let (conversation, messages) = state.conversation_service.detail(&user_id, &id).await?;

    let elapsed = start.elapsed().as_millis() as u64;
    let resp = ApiResponse::success(
        ConversationDetail {
            conversation,
            messages,
        },
        request_id,
        elapsed,
    )
    .with_link("self", &format!("/api/v1/conversations/{id}"))
    .with_link("analytics", &format!("/api/v1/conversations/{id}/analytics"));

    Ok(Json(resp))
}

/// DELETE /api/v1/conversations/{id} - Soft-delete one conversation.
pub async fn delete_conversation(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Path(conversation_id): Path<String>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let id = parse_uuid(&conversation_id)?;
    state.conversation_service.soft_delete(&user_id, &id).await?;

    let elapsed = start.elapsed().as_millis() as u64;
    let resp = ApiResponse::success(
        serde_json::json!({ "deleted": true, "conversation_id": id }),
        request_id,
        elapsed,
    );

    Ok(Json(resp))
}

/// DELETE /api/v1/conversations - Clear all of the caller's conversations.
///
/// Requires `{ "confirm": true }` in the body; a missing or false confirm
/// is rejected before anything is touched.
pub async fn clear_conversations(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Json(body): Json<ClearAllRequest>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    if !body.confirm {
        return Err(AppError::Validation(
            "Confirmation required: pass { \"confirm\": true }".to_string(),
        ));
    }

    let cleared = state.conversation_service.clear_all(&user_id).await?;

    let elapsed = start.elapsed().as_millis() as u64;
    let resp = ApiResponse::success(
        serde_json::json!({ "cleared": cleared }),
        request_id,
        elapsed,
    )
    .with_link("conversations", "/api/v1/conversations");

    Ok(Json(resp))
}
