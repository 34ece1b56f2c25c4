//! Assistant configuration.
//!
//! `AssistantConfig` gathers the tunable parameters of the conversation
//! pipeline: quota limits, context window, title derivation bounds, and
//! model-gateway settings. All fields have serde defaults so a partial
//! JSON config deserializes cleanly.

use serde::{Deserialize, Serialize};

/// Tunable parameters for the conversation pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    /// Requests a user may make per quota window.
    #[serde(default = "default_hourly_limit")]
    pub hourly_limit: u32,

    /// Quota window length in seconds.
    #[serde(default = "default_window_secs")]
    pub quota_window_secs: u64,

    /// Most recent messages handed to the model as context.
    #[serde(default = "default_context_messages")]
    pub context_messages: usize,

    /// Words taken from the first user message when deriving a title.
    #[serde(default = "default_title_words")]
    pub title_max_words: usize,

    /// Hard character bound on derived titles.
    #[serde(default = "default_title_chars")]
    pub title_max_chars: usize,

    /// Deadline for a single model-gateway call, in seconds.
    #[serde(default = "default_model_timeout_secs")]
    pub model_timeout_secs: u64,

    /// Base URL of the OpenAI-compatible model endpoint.
    #[serde(default = "default_base_url")]
    pub model_base_url: String,

    /// Model identifier sent to the endpoint.
    #[serde(default = "default_model_name")]
    pub model_name: String,

    /// Maximum tokens requested per generation.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f64,

    #[serde(default = "default_top_p")]
    pub top_p: f64,

    /// Replacement text stored when the model's reply fails the inbound
    /// safety filter.
    #[serde(default = "default_safety_fallback")]
    pub safety_fallback_text: String,
}

fn default_hourly_limit() -> u32 {
    60
}

fn default_window_secs() -> u64 {
    3600
}

fn default_context_messages() -> usize {
    10
}

fn default_title_words() -> usize {
    5
}

fn default_title_chars() -> usize {
    80
}

fn default_model_timeout_secs() -> u64 {
    30
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta/openai".to_string()
}

fn default_model_name() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_max_tokens() -> u32 {
    2048
}

fn default_temperature() -> f64 {
    0.7
}

fn default_top_p() -> f64 {
    0.8
}

fn default_safety_fallback() -> String {
    "I can't help with that. For questions about medication dosing or if \
     you're in crisis, please reach out to a healthcare professional."
        .to_string()
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            hourly_limit: default_hourly_limit(),
            quota_window_secs: default_window_secs(),
            context_messages: default_context_messages(),
            title_max_words: default_title_words(),
            title_max_chars: default_title_chars(),
            model_timeout_secs: default_model_timeout_secs(),
            model_base_url: default_base_url(),
            model_name: default_model_name(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            safety_fallback_text: default_safety_fallback(),
        }
    }
}
