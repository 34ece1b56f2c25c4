//! Observability setup for Ayla.

pub mod tracing_setup;
