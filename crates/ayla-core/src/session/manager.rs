//! Session manager: orchestrates one conversation turn.
//!
//! Side effects are strictly ordered: quota consumption first (cheapest,
//! bounds abuse), outbound safety filtering second (avoids wasting a model
//! call on unsafe input), the model call third (expensive), persistence and
//! analytics last. Quota consumed by a turn that later fails is never
//! refunded; forcing failures therefore cannot bypass the limiter.
//!
//! Terminal states and what they persist:
//! - quota or outbound-safety rejection, or cancellation before/during the
//!   model call: nothing (the conversation is not touched);
//! - model failure after the conversation was resolved: the user message
//!   only;
//! - success: user and assistant messages plus the analytics update.
//!
//! Appends are serialized per conversation through a keyed async mutex, so
//! overlapping requests against the same conversation id cannot interleave
//! their histories. Persistence runs in a spawned task: a caller that
//! disconnects after the model has answered cannot abort the write.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

use ayla_types::analytics::ConversationAnalytics;
use ayla_types::config::AssistantConfig;
use ayla_types::conversation::{Conversation, Message, TurnReply};
use ayla_types::error::{ChatError, RepositoryError};
use ayla_types::llm::GatewayError;
use ayla_types::quota::QuotaUsage;

use crate::analytics::AnalyticsAggregator;
use crate::conversation::repository::{AnalyticsRepository, ConversationRepository};
use crate::llm::provider::ModelGateway;
use crate::llm::to_chat_turns;
use crate::quota::QuotaStore;
use crate::safety::{Direction, SafetyFilter};
use crate::session::stats::{GatewaySnapshot, GatewayStats};

/// Orchestrates the turn pipeline over the repositories and the model
/// gateway.
///
/// Generic over the repository and gateway traits to maintain clean
/// architecture (ayla-core never depends on ayla-infra).
pub struct SessionManager<C, A, G> {
    conversations: Arc<C>,
    analytics: Arc<A>,
    gateway: G,
    quota: QuotaStore,
    safety: SafetyFilter,
    stats: GatewayStats,
    aggregator: Arc<AnalyticsAggregator>,
    /// Per-conversation append locks. Entries are created lazily and kept
    /// for the process lifetime.
    locks: Arc<DashMap<Uuid, Arc<Mutex<()>>>>,
    config: AssistantConfig,
}

impl<C, A, G> SessionManager<C, A, G>
where
    C: ConversationRepository + 'static,
    A: AnalyticsRepository + 'static,
    G: ModelGateway,
{
    /// Create a manager with the standard safety policy and a fresh quota
    /// store sized from the config.
    pub fn new(conversations: C, analytics: A, gateway: G, config: AssistantConfig) -> Self {
        Self {
            conversations: Arc::new(conversations),
            analytics: Arc::new(analytics),
            gateway,
            quota: QuotaStore::new(config.quota_window_secs),
            safety: SafetyFilter::default(),
            stats: GatewayStats::new(),
            aggregator: Arc::new(AnalyticsAggregator::new()),
            locks: Arc::new(DashMap::new()),
            config,
        }
    }

    /// Replace the safety filter (e.g. with a custom policy version).
    pub fn with_safety_filter(mut self, safety: SafetyFilter) -> Self {
        self.safety = safety;
        self
    }

    /// Process one turn: validate, consume quota, filter, call the model,
    /// persist, and update analytics.
    pub async fn send_message(
        &self,
        user_id: Uuid,
        conversation_id: Option<Uuid>,
        content: &str,
        cancel: CancellationToken,
    ) -> Result<TurnReply, ChatError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(ChatError::InvalidRequest(
                "message must not be empty".to_string(),
            ));
        }

        // Quota first: consumed even when the rest of the turn fails.
        let decision = self
            .quota
            .check_and_consume(user_id, self.config.hourly_limit);
        if !decision.allowed {
            warn!(%user_id, retry_after = decision.retry_after_secs, "turn rejected by rate limiter");
            return Err(ChatError::RateLimited {
                retry_after_secs: decision.retry_after_secs,
            });
        }

        let inspection = self.safety.inspect(content, Direction::Outbound);
        if !inspection.pass {
            return Err(ChatError::InputRejected {
                reason: inspection
                    .reason
                    .unwrap_or_else(|| "disallowed content".to_string()),
            });
        }

        if cancel.is_cancelled() {
            return Err(ChatError::Cancelled);
        }

        let conversation = self.resolve_conversation(&user_id, conversation_id).await?;
        let history = self.conversations.messages(&conversation.id).await?;
        let turns = to_chat_turns(&history);

        let deadline = Duration::from_secs(self.config.model_timeout_secs);
        let generated = tokio::select! {
            _ = cancel.cancelled() => {
                info!(%user_id, conversation_id = %conversation.id, "caller cancelled during model call");
                return Err(ChatError::Cancelled);
            }
            result = tokio::time::timeout(deadline, self.gateway.generate(&turns, content)) => {
                match result {
                    Err(_) => Err(GatewayError::Timeout(self.config.model_timeout_secs)),
                    Ok(inner) => inner,
                }
            }
        };

        // From here on the cost is incurred; cancellation is no longer
        // honored and persistence runs detached from the caller's future.
        match generated {
            Err(gateway_err) => {
                self.stats.record_failure(&gateway_err.to_string());
                error!(
                    %user_id,
                    conversation_id = %conversation.id,
                    error = %gateway_err,
                    "model call failed; persisting user message only"
                );
                self.persist_failed_turn(conversation.id, content.to_string())
                    .await?;
                Err(match gateway_err {
                    GatewayError::Unavailable(m) => ChatError::ModelUnavailable(m),
                    GatewayError::InvalidRequest(m) => ChatError::InvalidRequest(m),
                    GatewayError::Timeout(s) => ChatError::ModelTimeout(s),
                })
            }
            Ok(reply) => {
                self.stats.record_success();

                let inbound = self.safety.inspect(&reply.text, Direction::Inbound);
                let redacted = !inbound.pass;
                let stored_text = if redacted {
                    self.config.safety_fallback_text.clone()
                } else {
                    reply.text
                };

                let (_, assistant_msg) = self
                    .persist_turn(
                        conversation.id,
                        content.to_string(),
                        stored_text,
                        reply.latency_ms,
                        reply.tokens_used,
                    )
                    .await?;

                info!(
                    %user_id,
                    conversation_id = %conversation.id,
                    tokens = reply.tokens_used,
                    latency_ms = reply.latency_ms,
                    redacted,
                    "turn completed"
                );

                Ok(TurnReply {
                    conversation_id: conversation.id,
                    message_id: assistant_msg.id,
                    response: assistant_msg.content,
                    model_name: self.gateway.model_name().to_string(),
                    tokens_used: reply.tokens_used,
                    response_time_ms: reply.latency_ms,
                    redacted,
                    timestamp: assistant_msg.timestamp,
                })
            }
        }
    }

    /// Current-window quota usage for status reporting.
    pub fn quota_usage(&self, user_id: Uuid) -> QuotaUsage {
        self.quota.usage(user_id, self.config.hourly_limit)
    }

    /// Recent gateway success/failure counts.
    pub fn gateway_snapshot(&self) -> GatewaySnapshot {
        self.stats.snapshot()
    }

    /// The model identifier the gateway reports.
    pub fn model_name(&self) -> &str {
        self.gateway.model_name()
    }

    async fn resolve_conversation(
        &self,
        user_id: &Uuid,
        conversation_id: Option<Uuid>,
    ) -> Result<Conversation, ChatError> {
        match conversation_id {
            Some(id) => Ok(self.conversations.get(user_id, &id).await?),
            None => Ok(self.conversations.create(user_id).await?),
        }
    }

    fn conversation_lock(&self, conversation_id: Uuid) -> Arc<Mutex<()>> {
        self.locks
            .entry(conversation_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Persist user + assistant messages and fold both into the analytics
    /// aggregate, serialized per conversation and detached from the
    /// caller's future.
    async fn persist_turn(
        &self,
        conversation_id: Uuid,
        user_content: String,
        assistant_content: String,
        latency_ms: u64,
        tokens_used: u32,
    ) -> Result<(Message, Message), ChatError> {
        let conversations = Arc::clone(&self.conversations);
        let analytics_repo = Arc::clone(&self.analytics);
        let aggregator = Arc::clone(&self.aggregator);
        let lock = self.conversation_lock(conversation_id);
        let model_name = self.gateway.model_name().to_string();

        let handle = tokio::spawn(async move {
            let _guard = lock.lock().await;

            let user_msg = conversations
                .append(&Message::user(conversation_id, user_content))
                .await?;
            let assistant_msg = conversations
                .append(&Message::assistant(
                    conversation_id,
                    assistant_content,
                    model_name,
                    latency_ms,
                    tokens_used,
                ))
                .await?;

            let mut aggregate = analytics_repo
                .get(&conversation_id)
                .await?
                .unwrap_or_else(|| ConversationAnalytics::new(conversation_id));
            aggregator.apply(&mut aggregate, &user_msg);
            aggregator.apply(&mut aggregate, &assistant_msg);
            analytics_repo.upsert(&aggregate).await?;

            Ok::<_, RepositoryError>((user_msg, assistant_msg))
        });

        let persisted = handle
            .await
            .map_err(|e| ChatError::Storage(format!("persistence task failed: {e}")))??;
        Ok(persisted)
    }

    /// Persist only the user message of a turn whose model call failed.
    async fn persist_failed_turn(
        &self,
        conversation_id: Uuid,
        user_content: String,
    ) -> Result<(), ChatError> {
        let conversations = Arc::clone(&self.conversations);
        let analytics_repo = Arc::clone(&self.analytics);
        let aggregator = Arc::clone(&self.aggregator);
        let lock = self.conversation_lock(conversation_id);

        let handle = tokio::spawn(async move {
            let _guard = lock.lock().await;

            let user_msg = conversations
                .append(&Message::user(conversation_id, user_content))
                .await?;

            let mut aggregate = analytics_repo
                .get(&conversation_id)
                .await?
                .unwrap_or_else(|| ConversationAnalytics::new(conversation_id));
            aggregator.apply(&mut aggregate, &user_msg);
            analytics_repo.upsert(&aggregate).await?;

            Ok::<_, RepositoryError>(())
        });

        handle
            .await
            .map_err(|e| ChatError::Storage(format!("persistence task failed: {e}")))??;
        Ok(())
    }
}
