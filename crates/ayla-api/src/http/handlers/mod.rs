//! HTTP request handlers for the REST API.

pub mod analytics;
pub mod chat;
pub mod conversation;
pub mod status;
