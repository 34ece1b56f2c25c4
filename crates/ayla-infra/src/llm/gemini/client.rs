//! GeminiGateway -- concrete [`ModelGateway`] implementation for Google
//! Gemini through its OpenAI-compatible endpoint.
//!
//! Sends chat-completion requests with Bearer authentication, bounds the
//! forwarded history to the most recent N turns, and maps transport/status
//! failures onto the typed [`GatewayError`] kinds. No retries happen here;
//! transient failures are surfaced as retryable and left to the caller.
//!
//! The API key is wrapped in [`secrecy::SecretString`] and is never logged
//! or included in `Debug` output.

use std::time::{Duration, Instant};

use secrecy::{ExposeSecret, SecretString};

use ayla_core::llm::provider::ModelGateway;
use ayla_types::config::AssistantConfig;
use ayla_types::conversation::Sender;
use ayla_types::llm::{ChatTurn, GatewayError, ModelReply};

use super::types::{
    ChatCompletionMessage, ChatCompletionRequest, ChatCompletionResponse, ErrorResponse,
};

/// System prompt framing every generation as health-assistant guidance.
const SYSTEM_PROMPT: &str = "\
You are Ayla, a knowledgeable and empathetic AI health assistant.

Your role is to:
- Provide helpful health information and general wellness advice
- Listen empathetically to health concerns
- Suggest when users should consult healthcare professionals
- Offer lifestyle and wellness recommendations
- Answer health-related questions with accurate information

Important guidelines:
- Always emphasize that you cannot replace professional medical diagnosis or treatment
- Suggest consulting healthcare providers for serious symptoms or concerns
- Be supportive and understanding
- Provide evidence-based information when possible
- Respect privacy and confidentiality
- Do not provide specific medication dosages or prescriptions

Remember: You are a supportive health companion, not a replacement for professional medical care.";

/// Gemini gateway over the OpenAI-compatible chat-completions API.
pub struct GeminiGateway {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
    model: String,
    context_messages: usize,
    max_tokens: u32,
    temperature: f64,
    top_p: f64,
    timeout_secs: u64,
}

// GeminiGateway intentionally does NOT derive Debug: the SecretString field
// keeps the key out of accidental output, and omitting Debug entirely keeps
// the rest of the client state out too.

impl GeminiGateway {
    /// Create a gateway from an API key and the assistant configuration.
    pub fn new(api_key: SecretString, config: &AssistantConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.model_timeout_secs))
            .build()
            .expect("failed to create reqwest client");

        Self {
            client,
            api_key,
            base_url: config.model_base_url.clone(),
            model: config.model_name.clone(),
            context_messages: config.context_messages,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            top_p: config.top_p,
            timeout_secs: config.model_timeout_secs,
        }
    }

    /// Override the base URL (useful for tests or proxies).
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    /// Assemble the messages array: system prompt, the most recent slice of
    /// history, then the new user message.
    fn build_messages(
        &self,
        history: &[ChatTurn],
        new_message: &str,
    ) -> Vec<ChatCompletionMessage> {
        let mut messages = Vec::with_capacity(history.len().min(self.context_messages) + 2);
        messages.push(ChatCompletionMessage {
            role: "system",
            content: SYSTEM_PROMPT.to_string(),
        });

        let start = history.len().saturating_sub(self.context_messages);
        for turn in &history[start..] {
            messages.push(ChatCompletionMessage {
                role: match turn.sender {
                    Sender::User => "user",
                    Sender::Assistant => "assistant",
                },
                content: turn.content.clone(),
            });
        }

        messages.push(ChatCompletionMessage {
            role: "user",
            content: new_message.to_string(),
        });

        messages
    }

    /// Map a non-success HTTP status and error body to a gateway error.
    fn map_status(status: reqwest::StatusCode, body: &str) -> GatewayError {
        let detail = serde_json::from_str::<ErrorResponse>(body)
            .map(|e| e.error.message)
            .unwrap_or_else(|_| format!("HTTP {status}"));

        if status.as_u16() == 429 || status.is_server_error() {
            GatewayError::Unavailable(detail)
        } else {
            GatewayError::InvalidRequest(detail)
        }
    }
}

impl ModelGateway for GeminiGateway {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(
        &self,
        history: &[ChatTurn],
        new_message: &str,
    ) -> Result<ModelReply, GatewayError> {
        let body = ChatCompletionRequest {
            model: self.model.clone(),
            messages: self.build_messages(history, new_message),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            top_p: self.top_p,
        };

        let url = format!("{}/chat/completions", self.base_url);
        let started = Instant::now();

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GatewayError::Timeout(self.timeout_secs)
                } else {
                    GatewayError::Unavailable(format!("request failed: {e}"))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            let err = Self::map_status(status, &error_body);
            tracing::warn!(status = status.as_u16(), error = %err, "model endpoint returned error");
            return Err(err);
        }

        let latency_ms = started.elapsed().as_millis() as u64;

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Unavailable(format!("failed to parse response: {e}")))?;

        let text = completion
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| GatewayError::Unavailable("model returned no content".to_string()))?;

        let tokens_used = completion.usage.map(|u| u.total_tokens).unwrap_or(0);
        tracing::debug!(model = %self.model, tokens_used, latency_ms, "generation complete");

        Ok(ModelReply {
            text,
            tokens_used,
            latency_ms,
        })
    }
}
