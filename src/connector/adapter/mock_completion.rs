use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::Value;

use crate::application::CompletionClient;
use crate::domain::{CompletionResult, DomainError};

/// Canned answer used when no provider is wired in; it binds no dataset
/// column so it validates against any field set.
pub const DEFAULT_MOCK_RESPONSE: &str = r#"{"chartSpec":{"mark":"bar","encoding":{"y":{"aggregate":"count","type":"quantitative"}}},"description":"Mock provider: number of records in the dataset."}"#;

enum MockOutcome {
    Text(String),
    Failure { status: u16, details: Value },
}

/// Offline [`CompletionClient`] that returns a fixed outcome and counts calls.
pub struct MockCompletion {
    outcome: MockOutcome,
    calls: AtomicUsize,
}

impl MockCompletion {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            outcome: MockOutcome::Text(response.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(status: u16, details: Value) -> Self {
        Self {
            outcome: MockOutcome::Failure { status, details },
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockCompletion {
    fn default() -> Self {
        Self::new(DEFAULT_MOCK_RESPONSE)
    }
}

#[async_trait]
impl CompletionClient for MockCompletion {
    async fn complete(&self, _prompt: &str) -> Result<CompletionResult, DomainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.outcome {
            MockOutcome::Text(text) => Ok(CompletionResult::new(text.clone())),
            MockOutcome::Failure { status, details } => {
                Err(DomainError::provider(*status, details.clone()))
            }
        }
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}
