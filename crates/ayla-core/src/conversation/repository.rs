//! ConversationRepository and AnalyticsRepository trait definitions.
//!
//! Every read and write is scoped by the owning `user_id`; a conversation
//! that is missing, inactive, or owned by a different user surfaces as
//! `RepositoryError::NotFound` so callers cannot probe for other users'
//! data. Implementations live in ayla-infra (e.g.
//! `SqliteConversationRepository`). Uses native async fn in traits (RPITIT,
//! Rust 2024 edition).

use ayla_types::analytics::ConversationAnalytics;
use ayla_types::conversation::{Conversation, ConversationSummary, Message};
use ayla_types::error::RepositoryError;
use uuid::Uuid;

/// Repository trait for conversation and message persistence.
pub trait ConversationRepository: Send + Sync {
    /// Create a new conversation owned by `user_id` with a placeholder
    /// title; the real title is derived on the first appended user message.
    fn create(
        &self,
        user_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Conversation, RepositoryError>> + Send;

    /// Load an active conversation owned by `user_id`.
    fn get(
        &self,
        user_id: &Uuid,
        conversation_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Conversation, RepositoryError>> + Send;

    /// Full message history for a conversation, ordered by timestamp ASC.
    fn messages(
        &self,
        conversation_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Vec<Message>, RepositoryError>> + Send;

    /// Append a message: insert it, bump the conversation's `updated_at`,
    /// and derive the title when this is the first user message.
    ///
    /// The stored timestamp is clamped to be non-decreasing within the
    /// conversation; the returned message reflects what was stored.
    fn append(
        &self,
        message: &Message,
    ) -> impl std::future::Future<Output = Result<Message, RepositoryError>> + Send;

    /// Active conversations owned by `user_id`, ordered by `updated_at`
    /// DESC, with per-conversation message counts.
    fn list(
        &self,
        user_id: &Uuid,
        limit: i64,
        offset: i64,
    ) -> impl std::future::Future<Output = Result<Vec<ConversationSummary>, RepositoryError>> + Send;

    /// Soft-delete one conversation. `NotFound` when it is missing,
    /// foreign, or already inactive.
    fn soft_delete(
        &self,
        user_id: &Uuid,
        conversation_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Soft-delete every active conversation owned by `user_id` in one
    /// atomic statement. Returns the number deactivated.
    fn clear_all(
        &self,
        user_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;

    /// Number of active conversations owned by `user_id`.
    fn count_active(
        &self,
        user_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;

    /// Number of messages across `user_id`'s active conversations.
    fn count_messages(
        &self,
        user_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;
}

/// Repository trait for per-conversation analytics persistence.
pub trait AnalyticsRepository: Send + Sync {
    /// Load the aggregate for a conversation, if one exists yet.
    fn get(
        &self,
        conversation_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<ConversationAnalytics>, RepositoryError>> + Send;

    /// Insert or replace the aggregate for a conversation.
    fn upsert(
        &self,
        analytics: &ConversationAnalytics,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Ownership-checked read: `NotFound` when the conversation is missing,
    /// inactive, or not owned by `user_id`.
    fn get_for_user(
        &self,
        user_id: &Uuid,
        conversation_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<ConversationAnalytics, RepositoryError>> + Send;

    /// Aggregates for all of `user_id`'s active conversations.
    fn list_for_user(
        &self,
        user_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Vec<ConversationAnalytics>, RepositoryError>> + Send;
}
