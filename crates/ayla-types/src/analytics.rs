//! Per-conversation usage analytics.
//!
//! One [`ConversationAnalytics`] row exists per conversation. It is
//! maintained incrementally on every appended message, and is always equal
//! to a full recompute over the conversation's message list (the updater
//! and the recompute function live in `ayla-core::analytics`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Running usage aggregates for a single conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationAnalytics {
    pub conversation_id: Uuid,
    pub total_messages: u32,
    pub total_user_messages: u32,
    pub total_bot_messages: u32,
    /// Sum of `tokens_used` over assistant messages.
    pub total_tokens_used: u64,
    /// Incremental mean of `response_time_ms` over assistant messages;
    /// `None` until the first assistant message arrives.
    pub average_response_time_ms: Option<f64>,
    /// Deduplicated health-topic keywords found in message content.
    /// Kept sorted so equality is insertion-order independent.
    pub health_topics: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ConversationAnalytics {
    /// Fresh, empty aggregate for a conversation.
    pub fn new(conversation_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            conversation_id,
            total_messages: 0,
            total_user_messages: 0,
            total_bot_messages: 0,
            total_tokens_used: 0,
            average_response_time_ms: None,
            health_topics: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Insert a topic keyword, keeping the set deduplicated and sorted.
    pub fn add_topic(&mut self, topic: &str) {
        if let Err(pos) = self.health_topics.binary_search_by(|t| t.as_str().cmp(topic)) {
            self.health_topics.insert(pos, topic.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_analytics_is_empty() {
        let analytics = ConversationAnalytics::new(Uuid::now_v7());
        assert_eq!(analytics.total_messages, 0);
        assert_eq!(analytics.total_tokens_used, 0);
        assert!(analytics.average_response_time_ms.is_none());
        assert!(analytics.health_topics.is_empty());
    }

    #[test]
    fn test_add_topic_dedupes() {
        let mut analytics = ConversationAnalytics::new(Uuid::now_v7());
        analytics.add_topic("headache");
        analytics.add_topic("sleep");
        analytics.add_topic("headache");
        assert_eq!(analytics.health_topics, vec!["headache", "sleep"]);
    }

    #[test]
    fn test_topic_order_is_insertion_independent() {
        let mut a = ConversationAnalytics::new(Uuid::now_v7());
        a.add_topic("stress");
        a.add_topic("diet");

        let mut b = ConversationAnalytics::new(a.conversation_id);
        b.add_topic("diet");
        b.add_topic("stress");

        assert_eq!(a.health_topics, b.health_topics);
    }
}
