//! Conversation lifecycle: repository trait, service, and title derivation.

pub mod repository;
pub mod service;
pub mod title;
