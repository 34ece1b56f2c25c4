//! Shared domain types for Ayla.
//!
//! This crate contains the core domain types used across the Ayla
//! health-assistant backend: conversations, messages, quota records,
//! analytics aggregates, model-gateway types, and their error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod analytics;
pub mod config;
pub mod conversation;
pub mod error;
pub mod llm;
pub mod quota;
