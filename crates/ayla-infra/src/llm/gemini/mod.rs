//! Gemini model gateway via the OpenAI-compatible endpoint.

mod client;
mod types;

pub use client::GeminiGateway;
