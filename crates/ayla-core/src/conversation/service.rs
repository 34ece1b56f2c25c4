//! Conversation service orchestrating listing, detail, and deletion.
//!
//! `ConversationService` wraps the repositories behind ownership-aware
//! operations used by the API layer: paginated listings, full-history
//! detail, soft delete, bulk clear, and the analytics read paths. Turn
//! processing (the message pipeline) lives in `crate::session`.

use ayla_types::analytics::ConversationAnalytics;
use ayla_types::conversation::{Conversation, ConversationSummary, Message};
use ayla_types::error::ChatError;
use tracing::info;
use uuid::Uuid;

use crate::conversation::repository::{AnalyticsRepository, ConversationRepository};

/// Ownership-scoped read/delete operations over stored conversations.
///
/// Generic over the repository traits to maintain clean architecture
/// (ayla-core never depends on ayla-infra).
pub struct ConversationService<C: ConversationRepository, A: AnalyticsRepository> {
    conversations: C,
    analytics: A,
}

impl<C: ConversationRepository, A: AnalyticsRepository> ConversationService<C, A> {
    /// Create a new service with the given repositories.
    pub fn new(conversations: C, analytics: A) -> Self {
        Self {
            conversations,
            analytics,
        }
    }

    /// Active conversations for a user, most recently updated first.
    pub async fn list(
        &self,
        user_id: &Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ConversationSummary>, ChatError> {
        Ok(self.conversations.list(user_id, limit, offset).await?)
    }

    /// A conversation plus its full ordered message history.
    pub async fn detail(
        &self,
        user_id: &Uuid,
        conversation_id: &Uuid,
    ) -> Result<(Conversation, Vec<Message>), ChatError> {
        let conversation = self.conversations.get(user_id, conversation_id).await?;
        let messages = self.conversations.messages(conversation_id).await?;
        Ok((conversation, messages))
    }

    /// Soft-delete one conversation. Fails `NotFound` when it is missing,
    /// foreign, or already inactive.
    pub async fn soft_delete(
        &self,
        user_id: &Uuid,
        conversation_id: &Uuid,
    ) -> Result<(), ChatError> {
        self.conversations
            .soft_delete(user_id, conversation_id)
            .await?;
        info!(%user_id, %conversation_id, "conversation soft-deleted");
        Ok(())
    }

    /// Soft-delete every active conversation owned by the user; returns the
    /// number deactivated.
    pub async fn clear_all(&self, user_id: &Uuid) -> Result<u64, ChatError> {
        let cleared = self.conversations.clear_all(user_id).await?;
        info!(%user_id, cleared, "all conversations cleared");
        Ok(cleared)
    }

    /// Analytics for one of the user's active conversations.
    pub async fn analytics_for(
        &self,
        user_id: &Uuid,
        conversation_id: &Uuid,
    ) -> Result<ConversationAnalytics, ChatError> {
        Ok(self.analytics.get_for_user(user_id, conversation_id).await?)
    }

    /// Analytics across all of the user's active conversations.
    pub async fn analytics_overview(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<ConversationAnalytics>, ChatError> {
        Ok(self.analytics.list_for_user(user_id).await?)
    }

    /// Active conversation and message counts for status reporting.
    pub async fn usage_counts(&self, user_id: &Uuid) -> Result<(u64, u64), ChatError> {
        let conversations = self.conversations.count_active(user_id).await?;
        let messages = self.conversations.count_messages(user_id).await?;
        Ok((conversations, messages))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Verify ConversationService stays generic over the repository traits.
    fn _assert_service_generic<C: ConversationRepository, A: AnalyticsRepository>(
        _s: &ConversationService<C, A>,
    ) {
    }
}
