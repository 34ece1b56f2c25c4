//! Message turn endpoint.
//!
//! POST /api/v1/conversations
//!
//! Sends a message to the assistant, creating a new conversation when no
//! `conversation_id` is supplied. The full pipeline (quota, safety filter,
//! model call, persistence, analytics) runs inside the session manager;
//! this handler only shapes the request and the envelope.

use std::time::Instant;

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use ayla_types::conversation::TurnReply;

use crate::http::error::AppError;
use crate::http::extractors::auth::AuthenticatedUser;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// Request body for sending a message.
#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    /// The user's message.
    pub message: String,
    /// Existing conversation to continue; absent to start a new one.
    pub conversation_id: Option<Uuid>,
}

/// POST /api/v1/conversations - send a message, get the assistant's reply.
pub async fn send_message(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Json(body): Json<SendMessageRequest>,
) -> Result<Json<ApiResponse<TurnReply>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let reply = state
        .session_manager
        .send_message(
            user_id,
            body.conversation_id,
            &body.message,
            CancellationToken::new(),
        )
        .await?;

    let elapsed = start.elapsed().as_millis() as u64;
    let conversation_id = reply.conversation_id;

    let resp = ApiResponse::success(reply, request_id, elapsed)
        .with_link("self", "/api/v1/conversations")
        .with_link(
            "conversation",
            &format!("/api/v1/conversations/{conversation_id}"),
        );

    Ok(Json(resp))
}
