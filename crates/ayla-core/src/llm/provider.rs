//! ModelGateway trait definition.
//!
//! This is the narrow seam between the session manager and the external
//! generative model: prior turns plus the new message in, text and usage
//! metadata out, or a typed [`GatewayError`]. Uses native async fn in
//! traits (RPITIT, Rust 2024 edition).
//!
//! Implementations live in ayla-infra (e.g. `GeminiGateway`). The adapter
//! is responsible for bounding the history it forwards to the model's
//! context limit; the session manager passes the full conversation.

use ayla_types::llm::{ChatTurn, GatewayError, ModelReply};

/// Adapter for the external generative model endpoint.
pub trait ModelGateway: Send + Sync {
    /// Model identifier recorded on assistant messages (e.g.
    /// "gemini-2.0-flash").
    fn model_name(&self) -> &str;

    /// Generate a reply to `new_message` given prior conversation turns.
    ///
    /// Must not retry internally: transient failures are surfaced as
    /// retryable [`GatewayError`] variants and retry policy belongs to the
    /// caller.
    fn generate(
        &self,
        history: &[ChatTurn],
        new_message: &str,
    ) -> impl std::future::Future<Output = Result<ModelReply, GatewayError>> + Send;
}
