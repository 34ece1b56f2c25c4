//! SQLite persistence: connection pool and repository implementations.

pub mod analytics;
pub mod conversation;
pub mod pool;
