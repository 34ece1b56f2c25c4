//! SQLite conversation repository implementation.
//!
//! Implements `ConversationRepository` from `ayla-core` using sqlx with
//! split read/write pools: raw queries, private Row structs, RFC 3339 text
//! timestamps. Every user-facing query is scoped by `user_id`, so foreign
//! and inactive conversations are indistinguishable from missing ones.

use ayla_core::conversation::repository::ConversationRepository;
use ayla_core::conversation::title::{derive_title, PLACEHOLDER_TITLE};
use ayla_types::conversation::{Conversation, ConversationSummary, Message, Sender};
use ayla_types::error::RepositoryError;
use chrono::{DateTime, Utc};
use sqlx::Row;
use uuid::Uuid;

use super::pool::DatabasePool;

/// Title bounds applied when a first user message names a conversation.
#[derive(Debug, Clone, Copy)]
pub struct TitleBounds {
    pub max_words: usize,
    pub max_chars: usize,
}

impl Default for TitleBounds {
    fn default() -> Self {
        Self {
            max_words: 5,
            max_chars: 80,
        }
    }
}

/// SQLite-backed implementation of `ConversationRepository`.
pub struct SqliteConversationRepository {
    pool: DatabasePool,
    title_bounds: TitleBounds,
}

impl SqliteConversationRepository {
    /// Create a new repository backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self {
            pool,
            title_bounds: TitleBounds::default(),
        }
    }

    /// Override the title derivation bounds.
    pub fn with_title_bounds(mut self, title_bounds: TitleBounds) -> Self {
        self.title_bounds = title_bounds;
        self
    }
}

// ---------------------------------------------------------------------------
// Private Row types for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

/// Internal row type for mapping SQLite rows to domain Conversation.
struct ConversationRow {
    id: String,
    user_id: String,
    title: String,
    created_at: String,
    updated_at: String,
    active: i64,
}

impl ConversationRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            title: row.try_get("title")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            active: row.try_get("active")?,
        })
    }

    fn into_conversation(self) -> Result<Conversation, RepositoryError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| RepositoryError::Query(format!("invalid conversation id: {e}")))?;
        let user_id = Uuid::parse_str(&self.user_id)
            .map_err(|e| RepositoryError::Query(format!("invalid user_id: {e}")))?;

        Ok(Conversation {
            id,
            user_id,
            title: self.title,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
            active: self.active != 0,
        })
    }
}

/// Internal row type for mapping SQLite rows to domain Message.
struct MessageRow {
    id: String,
    conversation_id: String,
    sender: String,
    content: String,
    timestamp: String,
    model_name: Option<String>,
    response_time_ms: Option<i64>,
    tokens_used: Option<i64>,
}

impl MessageRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            conversation_id: row.try_get("conversation_id")?,
            sender: row.try_get("sender")?,
            content: row.try_get("content")?,
            timestamp: row.try_get("timestamp")?,
            model_name: row.try_get("model_name")?,
            response_time_ms: row.try_get("response_time_ms")?,
            tokens_used: row.try_get("tokens_used")?,
        })
    }

    fn into_message(self) -> Result<Message, RepositoryError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| RepositoryError::Query(format!("invalid message id: {e}")))?;
        let conversation_id = Uuid::parse_str(&self.conversation_id)
            .map_err(|e| RepositoryError::Query(format!("invalid conversation_id: {e}")))?;
        let sender: Sender = self
            .sender
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;

        Ok(Message {
            id,
            conversation_id,
            sender,
            content: self.content,
            timestamp: parse_datetime(&self.timestamp)?,
            model_name: self.model_name,
            response_time_ms: self.response_time_ms.map(|v| v as u64),
            tokens_used: self.tokens_used.map(|v| v as u32),
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

// ---------------------------------------------------------------------------
// ConversationRepository implementation
// ---------------------------------------------------------------------------

impl ConversationRepository for SqliteConversationRepository {
    async fn create(&self, user_id: &Uuid) -> Result<Conversation, RepositoryError> {
        let now = Utc::now();
        let conversation = Conversation {
            id: Uuid::now_v7(),
            user_id: *user_id,
            title: PLACEHOLDER_TITLE.to_string(),
            created_at: now,
            updated_at: now,
            active: true,
        };

        sqlx::query(
            r#"INSERT INTO conversations (id, user_id, title, created_at, updated_at, active)
               VALUES (?, ?, ?, ?, ?, 1)"#,
        )
        .bind(conversation.id.to_string())
        .bind(conversation.user_id.to_string())
        .bind(&conversation.title)
        .bind(format_datetime(&conversation.created_at))
        .bind(format_datetime(&conversation.updated_at))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(conversation)
    }

    async fn get(
        &self,
        user_id: &Uuid,
        conversation_id: &Uuid,
    ) -> Result<Conversation, RepositoryError> {
        let row = sqlx::query(
            "SELECT * FROM conversations WHERE id = ? AND user_id = ? AND active = 1",
        )
        .bind(conversation_id.to_string())
        .bind(user_id.to_string())
        .fetch_optional(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let conversation_row = ConversationRow::from_row(&row)
                    .map_err(|e| RepositoryError::Query(e.to_string()))?;
                conversation_row.into_conversation()
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    async fn messages(&self, conversation_id: &Uuid) -> Result<Vec<Message>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT * FROM messages WHERE conversation_id = ? ORDER BY timestamp ASC, id ASC",
        )
        .bind(conversation_id.to_string())
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut messages = Vec::with_capacity(rows.len());
        for row in &rows {
            let message_row =
                MessageRow::from_row(row).map_err(|e| RepositoryError::Query(e.to_string()))?;
            messages.push(message_row.into_message()?);
        }

        Ok(messages)
    }

    async fn append(&self, message: &Message) -> Result<Message, RepositoryError> {
        let mut tx = self
            .pool
            .writer
            .begin()
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let row = sqlx::query("SELECT title, updated_at FROM conversations WHERE id = ?")
            .bind(message.conversation_id.to_string())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?
            .ok_or(RepositoryError::NotFound)?;

        let current_title: String = row
            .try_get("title")
            .map_err(|e| RepositoryError::Query(e.to_string()))?;
        let updated_at: String = row
            .try_get("updated_at")
            .map_err(|e| RepositoryError::Query(e.to_string()))?;
        let last_activity = parse_datetime(&updated_at)?;

        // Timestamps never go backwards within a conversation.
        let mut stored = message.clone();
        if stored.timestamp < last_activity {
            stored.timestamp = last_activity;
        }

        sqlx::query(
            r#"INSERT INTO messages (id, conversation_id, sender, content, timestamp, model_name, response_time_ms, tokens_used)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(stored.id.to_string())
        .bind(stored.conversation_id.to_string())
        .bind(stored.sender.to_string())
        .bind(&stored.content)
        .bind(format_datetime(&stored.timestamp))
        .bind(&stored.model_name)
        .bind(stored.response_time_ms.map(|v| v as i64))
        .bind(stored.tokens_used.map(|v| v as i64))
        .execute(&mut *tx)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        // First user message names the conversation; the title is never
        // recomputed afterwards.
        let title = if current_title == PLACEHOLDER_TITLE && stored.sender == Sender::User {
            derive_title(
                &stored.content,
                self.title_bounds.max_words,
                self.title_bounds.max_chars,
            )
        } else {
            current_title
        };

        sqlx::query("UPDATE conversations SET title = ?, updated_at = ? WHERE id = ?")
            .bind(&title)
            .bind(format_datetime(&stored.timestamp))
            .bind(stored.conversation_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(stored)
    }

    async fn list(
        &self,
        user_id: &Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ConversationSummary>, RepositoryError> {
        let rows = sqlx::query(
            r#"SELECT c.id, c.title, c.created_at, c.updated_at, COUNT(m.id) AS message_count
               FROM conversations c
               LEFT JOIN messages m ON m.conversation_id = c.id
               WHERE c.user_id = ? AND c.active = 1
               GROUP BY c.id
               ORDER BY c.updated_at DESC
               LIMIT ? OFFSET ?"#,
        )
        .bind(user_id.to_string())
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut summaries = Vec::with_capacity(rows.len());
        for row in &rows {
            let id: String = row
                .try_get("id")
                .map_err(|e| RepositoryError::Query(e.to_string()))?;
            let title: String = row
                .try_get("title")
                .map_err(|e| RepositoryError::Query(e.to_string()))?;
            let created_at: String = row
                .try_get("created_at")
                .map_err(|e| RepositoryError::Query(e.to_string()))?;
            let updated_at: String = row
                .try_get("updated_at")
                .map_err(|e| RepositoryError::Query(e.to_string()))?;
            let message_count: i64 = row
                .try_get("message_count")
                .map_err(|e| RepositoryError::Query(e.to_string()))?;

            summaries.push(ConversationSummary {
                id: Uuid::parse_str(&id)
                    .map_err(|e| RepositoryError::Query(format!("invalid conversation id: {e}")))?,
                title,
                created_at: parse_datetime(&created_at)?,
                updated_at: parse_datetime(&updated_at)?,
                message_count: message_count as u32,
            });
        }

        Ok(summaries)
    }

    async fn soft_delete(
        &self,
        user_id: &Uuid,
        conversation_id: &Uuid,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE conversations SET active = 0 WHERE id = ? AND user_id = ? AND active = 1",
        )
        .bind(conversation_id.to_string())
        .bind(user_id.to_string())
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn clear_all(&self, user_id: &Uuid) -> Result<u64, RepositoryError> {
        // Single statement on the single-writer pool: a concurrent reader
        // sees either no conversations cleared or all of them.
        let result =
            sqlx::query("UPDATE conversations SET active = 0 WHERE user_id = ? AND active = 1")
                .bind(user_id.to_string())
                .execute(&self.pool.writer)
                .await
                .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(result.rows_affected())
    }

    async fn count_active(&self, user_id: &Uuid) -> Result<u64, RepositoryError> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS cnt FROM conversations WHERE user_id = ? AND active = 1",
        )
        .bind(user_id.to_string())
        .fetch_one(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let count: i64 = row
            .try_get("cnt")
            .map_err(|e| RepositoryError::Query(e.to_string()))?;
        Ok(count as u64)
    }

    async fn count_messages(&self, user_id: &Uuid) -> Result<u64, RepositoryError> {
        let row = sqlx::query(
            r#"SELECT COUNT(*) AS cnt
               FROM messages m
               JOIN conversations c ON c.id = m.conversation_id
               WHERE c.user_id = ? AND c.active = 1"#,
        )
        .bind(user_id.to_string())
        .fetch_one(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let count: i64 = row
            .try_get("cnt")
            .map_err(|e| RepositoryError::Query(e.to_string()))?;
        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::pool::DatabasePool;

    async fn test_pool() -> DatabasePool {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let url = format!("sqlite://{}?mode=rwc", db_path.display());
        // Leak tempdir so it lives for the test
        std::mem::forget(dir);
        DatabasePool::new(&url).await.unwrap()
    }

    #[tokio::test]
    async fn test_create_and_get_conversation() {
        let repo = SqliteConversationRepository::new(test_pool().await);
        let user = Uuid::now_v7();

        let created = repo.create(&user).await.unwrap();
        assert_eq!(created.title, PLACEHOLDER_TITLE);
        assert!(created.active);

        let found = repo.get(&user, &created.id).await.unwrap();
        assert_eq!(found.id, created.id);
        assert_eq!(found.user_id, user);
    }

    #[tokio::test]
    async fn test_foreign_conversation_is_not_found() {
        let repo = SqliteConversationRepository::new(test_pool().await);
        let alice = Uuid::now_v7();
        let bob = Uuid::now_v7();

        let conversation = repo.create(&alice).await.unwrap();

        let err = repo.get(&bob, &conversation.id).await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));

        let err = repo.soft_delete(&bob, &conversation.id).await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));

        // Alice still sees it untouched.
        assert!(repo.get(&alice, &conversation.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_append_derives_title_once() {
        let repo = SqliteConversationRepository::new(test_pool().await);
        let user = Uuid::now_v7();
        let conversation = repo.create(&user).await.unwrap();

        repo.append(&Message::user(
            conversation.id,
            "I've been having headaches lately and they get worse".to_string(),
        ))
        .await
        .unwrap();

        let after_first = repo.get(&user, &conversation.id).await.unwrap();
        assert_eq!(after_first.title, "I've been having headaches lately");

        repo.append(&Message::user(
            conversation.id,
            "completely different second message".to_string(),
        ))
        .await
        .unwrap();

        let after_second = repo.get(&user, &conversation.id).await.unwrap();
        assert_eq!(after_second.title, after_first.title);
    }

    #[tokio::test]
    async fn test_append_bumps_updated_at_and_orders_messages() {
        let repo = SqliteConversationRepository::new(test_pool().await);
        let user = Uuid::now_v7();
        let conversation = repo.create(&user).await.unwrap();

        repo.append(&Message::user(conversation.id, "first".to_string()))
            .await
            .unwrap();
        let assistant = repo
            .append(&Message::assistant(
                conversation.id,
                "second".to_string(),
                "gemini-2.0-flash".to_string(),
                900,
                55,
            ))
            .await
            .unwrap();

        let updated = repo.get(&user, &conversation.id).await.unwrap();
        assert_eq!(updated.updated_at, assistant.timestamp);
        assert!(updated.updated_at >= conversation.updated_at);

        let messages = repo.messages(&conversation.id).await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content, "first");
        assert_eq!(messages[1].content, "second");
        assert_eq!(messages[1].model_name.as_deref(), Some("gemini-2.0-flash"));
        assert_eq!(messages[1].response_time_ms, Some(900));
        assert_eq!(messages[1].tokens_used, Some(55));
    }

    #[tokio::test]
    async fn test_append_clamps_backwards_timestamps() {
        let repo = SqliteConversationRepository::new(test_pool().await);
        let user = Uuid::now_v7();
        let conversation = repo.create(&user).await.unwrap();

        repo.append(&Message::user(conversation.id, "now".to_string()))
            .await
            .unwrap();

        let mut stale = Message::user(conversation.id, "from the past".to_string());
        stale.timestamp = conversation.created_at - chrono::Duration::seconds(120);
        let stored = repo.append(&stale).await.unwrap();

        let messages = repo.messages(&conversation.id).await.unwrap();
        assert!(stored.timestamp >= messages[0].timestamp);
        assert_eq!(messages[1].content, "from the past");
    }

    #[tokio::test]
    async fn test_list_orders_by_recent_activity_and_counts_messages() {
        let repo = SqliteConversationRepository::new(test_pool().await);
        let user = Uuid::now_v7();

        let older = repo.create(&user).await.unwrap();
        let newer = repo.create(&user).await.unwrap();

        repo.append(&Message::user(older.id, "a".to_string()))
            .await
            .unwrap();
        repo.append(&Message::user(newer.id, "b".to_string()))
            .await
            .unwrap();
        repo.append(&Message::user(newer.id, "c".to_string()))
            .await
            .unwrap();

        // Touch the older one last so it sorts first.
        repo.append(&Message::user(older.id, "d".to_string()))
            .await
            .unwrap();

        let listed = repo.list(&user, 50, 0).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, older.id);
        assert_eq!(listed[0].message_count, 2);
        assert_eq!(listed[1].id, newer.id);
        assert_eq!(listed[1].message_count, 2);
    }

    #[tokio::test]
    async fn test_list_pagination() {
        let repo = SqliteConversationRepository::new(test_pool().await);
        let user = Uuid::now_v7();

        for _ in 0..3 {
            repo.create(&user).await.unwrap();
        }

        let first_page = repo.list(&user, 2, 0).await.unwrap();
        assert_eq!(first_page.len(), 2);
        let second_page = repo.list(&user, 2, 2).await.unwrap();
        assert_eq!(second_page.len(), 1);
    }

    #[tokio::test]
    async fn test_soft_delete_hides_and_fails_when_repeated() {
        let repo = SqliteConversationRepository::new(test_pool().await);
        let user = Uuid::now_v7();
        let conversation = repo.create(&user).await.unwrap();

        repo.soft_delete(&user, &conversation.id).await.unwrap();

        let err = repo.get(&user, &conversation.id).await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
        assert!(repo.list(&user, 50, 0).await.unwrap().is_empty());

        // Deleting an already-inactive conversation fails NotFound.
        let err = repo.soft_delete(&user, &conversation.id).await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
    }

    #[tokio::test]
    async fn test_clear_all_deactivates_exactly_owned_conversations() {
        let repo = SqliteConversationRepository::new(test_pool().await);
        let alice = Uuid::now_v7();
        let bob = Uuid::now_v7();

        for _ in 0..3 {
            repo.create(&alice).await.unwrap();
        }
        repo.create(&bob).await.unwrap();

        let cleared = repo.clear_all(&alice).await.unwrap();
        assert_eq!(cleared, 3);
        assert!(repo.list(&alice, 50, 0).await.unwrap().is_empty());
        assert_eq!(repo.list(&bob, 50, 0).await.unwrap().len(), 1);

        // Nothing left to clear.
        assert_eq!(repo.clear_all(&alice).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_counts_track_active_rows_only() {
        let repo = SqliteConversationRepository::new(test_pool().await);
        let user = Uuid::now_v7();

        let kept = repo.create(&user).await.unwrap();
        let dropped = repo.create(&user).await.unwrap();
        repo.append(&Message::user(kept.id, "hello".to_string()))
            .await
            .unwrap();
        repo.append(&Message::user(dropped.id, "bye".to_string()))
            .await
            .unwrap();

        repo.soft_delete(&user, &dropped.id).await.unwrap();

        assert_eq!(repo.count_active(&user).await.unwrap(), 1);
        assert_eq!(repo.count_messages(&user).await.unwrap(), 1);
    }
}
