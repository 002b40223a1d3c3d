pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod types;

// Use cases and the adapters they write through
pub mod app;
pub mod infra;
