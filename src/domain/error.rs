use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

/// Why an LLM payload failed validation.
///
/// Each variant's display text is the stable reason string reported in logs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedResponse {
    #[error("not valid structured data")]
    NotStructured,

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("field not in dataset: {0}")]
    FieldNotInDataset(String),
}

impl MalformedResponse {
    pub fn reason(&self) -> &'static str {
        match self {
            Self::NotStructured => "not valid structured data",
            Self::MissingField(_) => "missing required field",
            Self::FieldNotInDataset(_) => "field not in dataset",
        }
    }
}

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// Local admission control rejected the caller.
    #[error("Rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    /// The completion provider answered with a non-success status.
    #[error("Provider error ({status}): {details}")]
    Provider { status: u16, details: Value },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Malformed response: {0}")]
    Malformed(#[from] MalformedResponse),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn provider(status: u16, details: impl Into<Value>) -> Self {
        Self::Provider {
            status,
            details: details.into(),
        }
    }

    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// True when the provider signaled overload (HTTP 429).
    pub fn is_provider_overloaded(&self) -> bool {
        matches!(self, Self::Provider { status: 429, .. })
    }
}
