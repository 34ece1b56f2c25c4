//! Business logic and repository trait definitions for Ayla.
//!
//! This crate defines the "ports" (repository and gateway traits) that the
//! infrastructure layer implements, plus the pure components of the
//! conversation pipeline: the quota store, the safety filter, the analytics
//! aggregator, and the session manager that orchestrates one turn. It
//! depends only on `ayla-types` -- never on `ayla-infra` or any
//! database/HTTP crate.

pub mod analytics;
pub mod conversation;
pub mod llm;
pub mod quota;
pub mod safety;
pub mod session;
