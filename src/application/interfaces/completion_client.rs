use async_trait::async_trait;

use crate::domain::{CompletionResult, DomainError};

/// Sends a prompt to an LLM completion provider and returns its raw text.
///
/// Implementors own transport and any retry policy for provider overload.
/// An exhausted or non-retryable failure surfaces as
/// [`DomainError::Provider`] carrying the upstream status and body.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<CompletionResult, DomainError>;

    /// Model identifier, for logging.
    fn model_name(&self) -> &str;
}
