//! SQLite analytics repository implementation.
//!
//! Persists one `conversation_analytics` row per conversation. The topic
//! set is stored as a JSON array in a TEXT column. User-facing reads join
//! against `conversations` so ownership and the soft-delete flag are
//! enforced in SQL.

use ayla_core::conversation::repository::AnalyticsRepository;
use ayla_types::analytics::ConversationAnalytics;
use ayla_types::error::RepositoryError;
use chrono::{DateTime, Utc};
use sqlx::Row;
use uuid::Uuid;

use super::pool::DatabasePool;

/// SQLite-backed implementation of `AnalyticsRepository`.
pub struct SqliteAnalyticsRepository {
    pool: DatabasePool,
}

impl SqliteAnalyticsRepository {
    /// Create a new repository backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

/// Internal row type for mapping SQLite rows to domain ConversationAnalytics.
struct AnalyticsRow {
    conversation_id: String,
    total_messages: i64,
    total_user_messages: i64,
    total_bot_messages: i64,
    total_tokens_used: i64,
    average_response_time_ms: Option<f64>,
    health_topics: String,
    created_at: String,
    updated_at: String,
}

impl AnalyticsRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            conversation_id: row.try_get("conversation_id")?,
            total_messages: row.try_get("total_messages")?,
            total_user_messages: row.try_get("total_user_messages")?,
            total_bot_messages: row.try_get("total_bot_messages")?,
            total_tokens_used: row.try_get("total_tokens_used")?,
            average_response_time_ms: row.try_get("average_response_time_ms")?,
            health_topics: row.try_get("health_topics")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_analytics(self) -> Result<ConversationAnalytics, RepositoryError> {
        let conversation_id = Uuid::parse_str(&self.conversation_id)
            .map_err(|e| RepositoryError::Query(format!("invalid conversation_id: {e}")))?;
        let health_topics: Vec<String> = serde_json::from_str(&self.health_topics)
            .map_err(|e| RepositoryError::Query(format!("invalid health_topics json: {e}")))?;

        Ok(ConversationAnalytics {
            conversation_id,
            total_messages: self.total_messages as u32,
            total_user_messages: self.total_user_messages as u32,
            total_bot_messages: self.total_bot_messages as u32,
            total_tokens_used: self.total_tokens_used as u64,
            average_response_time_ms: self.average_response_time_ms,
            health_topics,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

impl AnalyticsRepository for SqliteAnalyticsRepository {
    async fn get(
        &self,
        conversation_id: &Uuid,
    ) -> Result<Option<ConversationAnalytics>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM conversation_analytics WHERE conversation_id = ?")
            .bind(conversation_id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let analytics_row = AnalyticsRow::from_row(&row)
                    .map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(analytics_row.into_analytics()?))
            }
            None => Ok(None),
        }
    }

    async fn upsert(&self, analytics: &ConversationAnalytics) -> Result<(), RepositoryError> {
        let topics = serde_json::to_string(&analytics.health_topics)
            .map_err(|e| RepositoryError::Query(format!("serialize health_topics: {e}")))?;

        sqlx::query(
            r#"INSERT INTO conversation_analytics
                   (conversation_id, total_messages, total_user_messages, total_bot_messages,
                    total_tokens_used, average_response_time_ms, health_topics, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
               ON CONFLICT(conversation_id) DO UPDATE SET
                   total_messages = excluded.total_messages,
                   total_user_messages = excluded.total_user_messages,
                   total_bot_messages = excluded.total_bot_messages,
                   total_tokens_used = excluded.total_tokens_used,
                   average_response_time_ms = excluded.average_response_time_ms,
                   health_topics = excluded.health_topics,
                   updated_at = excluded.updated_at"#,
        )
        .bind(analytics.conversation_id.to_string())
        .bind(analytics.total_messages as i64)
        .bind(analytics.total_user_messages as i64)
        .bind(analytics.total_bot_messages as i64)
        .bind(analytics.total_tokens_used as i64)
        .bind(analytics.average_response_time_ms)
        .bind(topics)
        .bind(analytics.created_at.to_rfc3339())
        .bind(analytics.updated_at.to_rfc3339())
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }

    async fn get_for_user(
        &self,
        user_id: &Uuid,
        conversation_id: &Uuid,
    ) -> Result<ConversationAnalytics, RepositoryError> {
        let row = sqlx::query(
            r#"SELECT a.*
               FROM conversation_analytics a
               JOIN conversations c ON c.id = a.conversation_id
               WHERE a.conversation_id = ? AND c.user_id = ? AND c.active = 1"#,
        )
        .bind(conversation_id.to_string())
        .bind(user_id.to_string())
        .fetch_optional(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let analytics_row = AnalyticsRow::from_row(&row)
                    .map_err(|e| RepositoryError::Query(e.to_string()))?;
                analytics_row.into_analytics()
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    async fn list_for_user(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<ConversationAnalytics>, RepositoryError> {
        let rows = sqlx::query(
            r#"SELECT a.*
               FROM conversation_analytics a
               JOIN conversations c ON c.id = a.conversation_id
               WHERE c.user_id = ? AND c.active = 1
               ORDER BY c.updated_at DESC"#,
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut aggregates = Vec::with_capacity(rows.len());
        for row in &rows {
            let analytics_row =
                AnalyticsRow::from_row(row).map_err(|e| RepositoryError::Query(e.to_string()))?;
            aggregates.push(analytics_row.into_analytics()?);
        }

        Ok(aggregates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::conversation::SqliteConversationRepository;
    use crate::sqlite::pool::DatabasePool;
    use ayla_core::conversation::repository::ConversationRepository;

    async fn test_pool() -> DatabasePool {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let url = format!("sqlite://{}?mode=rwc", db_path.display());
        std::mem::forget(dir);
        DatabasePool::new(&url).await.unwrap()
    }

    fn sample(conversation_id: Uuid) -> ConversationAnalytics {
        let mut analytics = ConversationAnalytics::new(conversation_id);
        analytics.total_messages = 4;
        analytics.total_user_messages = 2;
        analytics.total_bot_messages = 2;
        analytics.total_tokens_used = 250;
        analytics.average_response_time_ms = Some(730.5);
        analytics.add_topic("headache");
        analytics.add_topic("sleep");
        analytics
    }

    #[tokio::test]
    async fn test_upsert_and_get_roundtrip() {
        let pool = test_pool().await;
        let conversations = SqliteConversationRepository::new(pool.clone());
        let repo = SqliteAnalyticsRepository::new(pool);

        let user = Uuid::now_v7();
        let conversation = conversations.create(&user).await.unwrap();

        assert!(repo.get(&conversation.id).await.unwrap().is_none());

        let analytics = sample(conversation.id);
        repo.upsert(&analytics).await.unwrap();

        let found = repo.get(&conversation.id).await.unwrap().unwrap();
        assert_eq!(found.total_messages, 4);
        assert_eq!(found.total_tokens_used, 250);
        assert_eq!(found.average_response_time_ms, Some(730.5));
        assert_eq!(found.health_topics, vec!["headache", "sleep"]);
    }

    #[tokio::test]
    async fn test_upsert_replaces_existing_row() {
        let pool = test_pool().await;
        let conversations = SqliteConversationRepository::new(pool.clone());
        let repo = SqliteAnalyticsRepository::new(pool);

        let user = Uuid::now_v7();
        let conversation = conversations.create(&user).await.unwrap();

        let mut analytics = sample(conversation.id);
        repo.upsert(&analytics).await.unwrap();

        analytics.total_messages = 6;
        analytics.add_topic("stress");
        repo.upsert(&analytics).await.unwrap();

        let found = repo.get(&conversation.id).await.unwrap().unwrap();
        assert_eq!(found.total_messages, 6);
        assert!(found.health_topics.contains(&"stress".to_string()));
    }

    #[tokio::test]
    async fn test_get_for_user_enforces_ownership() {
        let pool = test_pool().await;
        let conversations = SqliteConversationRepository::new(pool.clone());
        let repo = SqliteAnalyticsRepository::new(pool);

        let alice = Uuid::now_v7();
        let bob = Uuid::now_v7();
        let conversation = conversations.create(&alice).await.unwrap();
        repo.upsert(&sample(conversation.id)).await.unwrap();

        assert!(repo.get_for_user(&alice, &conversation.id).await.is_ok());
        let err = repo.get_for_user(&bob, &conversation.id).await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
    }

    #[tokio::test]
    async fn test_soft_deleted_conversations_drop_out_of_reads() {
        let pool = test_pool().await;
        let conversations = SqliteConversationRepository::new(pool.clone());
        let repo = SqliteAnalyticsRepository::new(pool);

        let user = Uuid::now_v7();
        let conversation = conversations.create(&user).await.unwrap();
        repo.upsert(&sample(conversation.id)).await.unwrap();

        assert_eq!(repo.list_for_user(&user).await.unwrap().len(), 1);

        conversations.soft_delete(&user, &conversation.id).await.unwrap();

        assert!(repo.list_for_user(&user).await.unwrap().is_empty());
        let err = repo.get_for_user(&user, &conversation.id).await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));

        // The underlying row survives for audit/replay purposes.
        assert!(repo.get(&conversation.id).await.unwrap().is_some());
    }
}
