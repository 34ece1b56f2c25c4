//! Incremental analytics aggregation.
//!
//! `AnalyticsAggregator::apply` folds one appended message into a
//! conversation's running aggregate; `recompute` replays a full message
//! list through the same fold from a fresh aggregate. The two must agree
//! at every point -- the recompute path exists precisely to validate the
//! incremental one in tests.
//!
//! The latency average uses the incremental-mean update
//! `avg += (x - avg) / n` so no history re-scan is needed.

use ayla_types::analytics::ConversationAnalytics;
use ayla_types::conversation::{Message, Sender};
use uuid::Uuid;

/// Health-topic keywords scanned for in message content.
///
/// The vocabulary is a tunable parameter; this default mirrors the topics
/// the product tracks for wellness insights. Multi-word entries match as
/// plain substrings of the lowercased text.
pub const DEFAULT_TOPIC_VOCABULARY: &[&str] = &[
    "fatigue",
    "tired",
    "headache",
    "pain",
    "fever",
    "cough",
    "sleep",
    "stress",
    "anxiety",
    "depression",
    "diet",
    "nutrition",
    "exercise",
    "weight",
    "blood pressure",
    "diabetes",
    "heart",
    "medicine",
];

/// Folds appended messages into per-conversation aggregates.
#[derive(Debug, Clone)]
pub struct AnalyticsAggregator {
    vocabulary: Vec<String>,
}

impl AnalyticsAggregator {
    /// Aggregator with the default topic vocabulary.
    pub fn new() -> Self {
        Self {
            vocabulary: DEFAULT_TOPIC_VOCABULARY
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
        }
    }

    /// Aggregator with a custom topic vocabulary.
    pub fn with_vocabulary(vocabulary: Vec<String>) -> Self {
        Self { vocabulary }
    }

    /// Fold one appended message into the aggregate.
    pub fn apply(&self, analytics: &mut ConversationAnalytics, message: &Message) {
        analytics.total_messages += 1;

        match message.sender {
            Sender::User => analytics.total_user_messages += 1,
            Sender::Assistant => {
                analytics.total_bot_messages += 1;

                if let Some(tokens) = message.tokens_used {
                    analytics.total_tokens_used += u64::from(tokens);
                }

                if let Some(latency) = message.response_time_ms {
                    let n = f64::from(analytics.total_bot_messages);
                    let avg = analytics.average_response_time_ms.unwrap_or(0.0);
                    analytics.average_response_time_ms =
                        Some(avg + (latency as f64 - avg) / n);
                }
            }
        }

        for topic in self.extract_topics(&message.content) {
            analytics.add_topic(&topic);
        }

        analytics.updated_at = message.timestamp;
    }

    /// Rebuild the aggregate from scratch by replaying the full message
    /// list through [`apply`](Self::apply). Pure: no storage access.
    pub fn recompute(
        &self,
        conversation_id: Uuid,
        messages: &[Message],
    ) -> ConversationAnalytics {
        let mut analytics = ConversationAnalytics::new(conversation_id);
        for message in messages {
            self.apply(&mut analytics, message);
        }
        analytics
    }

    /// Vocabulary keywords present in the text, deduplicated.
    pub fn extract_topics(&self, content: &str) -> Vec<String> {
        let lowered = content.to_lowercase();
        self.vocabulary
            .iter()
            .filter(|keyword| lowered.contains(keyword.as_str()))
            .cloned()
            .collect()
    }
}

impl Default for AnalyticsAggregator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ayla_types::conversation::Message;

    fn user_msg(conversation_id: Uuid, content: &str) -> Message {
        Message::user(conversation_id, content.to_string())
    }

    fn bot_msg(conversation_id: Uuid, content: &str, latency: u64, tokens: u32) -> Message {
        Message::assistant(
            conversation_id,
            content.to_string(),
            "gemini-2.0-flash".to_string(),
            latency,
            tokens,
        )
    }

    #[test]
    fn test_counts_by_sender() {
        let aggregator = AnalyticsAggregator::new();
        let conv = Uuid::now_v7();
        let mut analytics = ConversationAnalytics::new(conv);

        aggregator.apply(&mut analytics, &user_msg(conv, "hello"));
        aggregator.apply(&mut analytics, &bot_msg(conv, "hi!", 500, 20));
        aggregator.apply(&mut analytics, &user_msg(conv, "thanks"));

        assert_eq!(analytics.total_messages, 3);
        assert_eq!(analytics.total_user_messages, 2);
        assert_eq!(analytics.total_bot_messages, 1);
        assert_eq!(analytics.total_tokens_used, 20);
    }

    #[test]
    fn test_incremental_mean_over_bot_messages() {
        let aggregator = AnalyticsAggregator::new();
        let conv = Uuid::now_v7();
        let mut analytics = ConversationAnalytics::new(conv);

        aggregator.apply(&mut analytics, &bot_msg(conv, "a", 100, 1));
        aggregator.apply(&mut analytics, &bot_msg(conv, "b", 300, 1));
        aggregator.apply(&mut analytics, &bot_msg(conv, "c", 200, 1));

        let avg = analytics.average_response_time_ms.unwrap();
        assert!((avg - 200.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_user_messages_do_not_touch_latency() {
        let aggregator = AnalyticsAggregator::new();
        let conv = Uuid::now_v7();
        let mut analytics = ConversationAnalytics::new(conv);

        aggregator.apply(&mut analytics, &user_msg(conv, "hi"));
        assert!(analytics.average_response_time_ms.is_none());
    }

    #[test]
    fn test_topic_extraction_from_both_sides() {
        let aggregator = AnalyticsAggregator::new();
        let conv = Uuid::now_v7();
        let mut analytics = ConversationAnalytics::new(conv);

        aggregator.apply(&mut analytics, &user_msg(conv, "I have a headache"));
        aggregator.apply(
            &mut analytics,
            &bot_msg(conv, "Poor sleep and stress are common causes.", 400, 30),
        );

        assert!(analytics.health_topics.contains(&"headache".to_string()));
        assert!(analytics.health_topics.contains(&"sleep".to_string()));
        assert!(analytics.health_topics.contains(&"stress".to_string()));
    }

    #[test]
    fn test_topics_are_deduplicated() {
        let aggregator = AnalyticsAggregator::new();
        let conv = Uuid::now_v7();
        let mut analytics = ConversationAnalytics::new(conv);

        aggregator.apply(&mut analytics, &user_msg(conv, "headache again, headache"));
        aggregator.apply(&mut analytics, &user_msg(conv, "the headache is back"));

        let count = analytics
            .health_topics
            .iter()
            .filter(|t| t.as_str() == "headache")
            .count();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_multiword_keyword_matches() {
        let aggregator = AnalyticsAggregator::new();
        let topics = aggregator.extract_topics("my blood pressure was high today");
        assert!(topics.contains(&"blood pressure".to_string()));
    }

    #[test]
    fn test_recompute_equals_incremental() {
        let aggregator = AnalyticsAggregator::new();
        let conv = Uuid::now_v7();

        let messages = vec![
            user_msg(conv, "I can't sleep and I'm tired all day"),
            bot_msg(conv, "Fatigue often follows poor sleep.", 820, 145),
            user_msg(conv, "could stress be causing it?"),
            bot_msg(conv, "Yes, stress and diet both matter.", 640, 98),
            user_msg(conv, "I'll try more exercise"),
        ];

        let mut incremental = ConversationAnalytics::new(conv);
        for message in &messages {
            aggregator.apply(&mut incremental, message);
        }
        let recomputed = aggregator.recompute(conv, &messages);

        assert_eq!(incremental.total_messages, recomputed.total_messages);
        assert_eq!(
            incremental.total_user_messages,
            recomputed.total_user_messages
        );
        assert_eq!(incremental.total_bot_messages, recomputed.total_bot_messages);
        assert_eq!(incremental.total_tokens_used, recomputed.total_tokens_used);
        assert_eq!(
            incremental.average_response_time_ms,
            recomputed.average_response_time_ms
        );
        assert_eq!(incremental.health_topics, recomputed.health_topics);
    }

    #[test]
    fn test_recompute_of_empty_history_is_empty() {
        let aggregator = AnalyticsAggregator::new();
        let conv = Uuid::now_v7();
        let analytics = aggregator.recompute(conv, &[]);
        assert_eq!(analytics.total_messages, 0);
        assert!(analytics.health_topics.is_empty());
    }

    #[test]
    fn test_custom_vocabulary() {
        let aggregator =
            AnalyticsAggregator::with_vocabulary(vec!["migraine".to_string()]);
        let topics = aggregator.extract_topics("my migraine is worse than a headache");
        assert_eq!(topics, vec!["migraine".to_string()]);
    }
}
