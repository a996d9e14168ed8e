//! # Connector Layer
//!
//! External integrations implementing application interfaces:
//! - Completion provider (OpenAI-compatible chat completions, plus an offline mock)
//! - Per-client rate limiting (in-memory keyed windows)
//! - HTTP API (axum router, controllers, dependency container)

pub mod adapter;
pub mod api;

pub use adapter::*;
pub use api::*;
