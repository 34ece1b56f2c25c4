//! Conversation and message types for the Ayla session manager.
//!
//! A conversation is owned by exactly one user and holds an append-only,
//! time-ordered list of messages. Deletion is always a soft delete: the
//! `active` flag flips to false and the rows are retained.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

/// Who authored a message.
///
/// Maps to the CHECK constraint in the SQLite schema:
/// `CHECK (sender IN ('user', 'assistant'))`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sender::User => write!(f, "user"),
            Sender::Assistant => write!(f, "assistant"),
        }
    }
}

impl FromStr for Sender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(Sender::User),
            "assistant" => Ok(Sender::Assistant),
            other => Err(format!("invalid sender: '{other}'")),
        }
    }
}

/// A conversation between a user and the assistant.
///
/// `title` is derived once from the first user message and never recomputed.
/// `updated_at` is bumped on every appended message, so listings ordered by
/// `updated_at` DESC surface the most recently active conversations first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Soft-delete flag. Inactive conversations are excluded from listings
    /// and lookups but their rows are retained.
    pub active: bool,
}

/// A single message within a conversation.
///
/// Messages are append-only and ordered by `timestamp` within a
/// conversation. Assistant messages carry generation metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender: Sender,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    /// Model that produced this message (assistant messages only).
    pub model_name: Option<String>,
    /// Generation latency in milliseconds (assistant messages only).
    pub response_time_ms: Option<u64>,
    /// Tokens consumed generating this message (assistant messages only).
    pub tokens_used: Option<u32>,
}

impl Message {
    /// Build a user message for a conversation, stamped now.
    pub fn user(conversation_id: Uuid, content: String) -> Self {
        Self {
            id: Uuid::now_v7(),
            conversation_id,
            sender: Sender::User,
            content,
            timestamp: Utc::now(),
            model_name: None,
            response_time_ms: None,
            tokens_used: None,
        }
    }

    /// Build an assistant message with generation metadata, stamped now.
    pub fn assistant(
        conversation_id: Uuid,
        content: String,
        model_name: String,
        response_time_ms: u64,
        tokens_used: u32,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            conversation_id,
            sender: Sender::Assistant,
            content,
            timestamp: Utc::now(),
            model_name: Some(model_name),
            response_time_ms: Some(response_time_ms),
            tokens_used: Some(tokens_used),
        }
    }
}

/// A conversation summary for listings: no message bodies, but the count
/// and last-activity timestamp the conversation list view needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub id: Uuid,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub message_count: u32,
}

/// The outcome of one successful turn, returned to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnReply {
    pub conversation_id: Uuid,
    pub message_id: Uuid,
    pub response: String,
    pub model_name: String,
    pub tokens_used: u32,
    pub response_time_ms: u64,
    /// True when the model's reply failed the inbound safety filter and was
    /// replaced with the fallback text before storage.
    pub redacted: bool,
    pub timestamp: DateTime<Utc>,
}
