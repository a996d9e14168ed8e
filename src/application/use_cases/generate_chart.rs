use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, info, warn};

use crate::application::CompletionClient;
use crate::domain::{AllowedFieldSet, ChartReply, DomainError, PromptRequest, ResponseValidator};

/// Drives one generate-chart request: completion call, then validation.
///
/// Model output that fails validation is not an error. It becomes a reply
/// with no chart and an apology so the chat can render an assistant message.
pub struct GenerateChartUseCase {
    completion_client: Option<Arc<dyn CompletionClient>>,
    default_fields: Arc<AllowedFieldSet>,
}

impl GenerateChartUseCase {
    pub fn new(
        completion_client: Option<Arc<dyn CompletionClient>>,
        default_fields: Arc<AllowedFieldSet>,
    ) -> Self {
        Self {
            completion_client,
            default_fields,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.completion_client.is_some()
    }

    pub async fn execute(&self, request: PromptRequest) -> Result<ChartReply, DomainError> {
        let client = self.completion_client.as_ref().ok_or_else(|| {
            error!("OPENAI_API_KEY is not set; cannot reach the completion provider");
            DomainError::config("OpenAI API key is missing.")
        })?;

        if request.is_blank() {
            return Err(DomainError::invalid_input("Prompt must not be empty."));
        }

        info!(
            "Generating chart with {} (prompt {} chars, dataset fields: {})",
            client.model_name(),
            request.prompt().len(),
            request.fields().map_or(0, |f| f.len()),
        );
        debug!(prompt = request.prompt(), "Received prompt");

        let start_time = Instant::now();
        let completion = client.complete(request.prompt()).await?;
        debug!(
            raw = completion.raw_text(),
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "Completion received"
        );

        let dataset_fields = request.dataset_fields();
        let allowed = dataset_fields.as_ref().unwrap_or(self.default_fields.as_ref());

        match ResponseValidator::validate(completion.raw_text(), allowed) {
            Ok(answer) => {
                info!("Chart generated in {:?}", start_time.elapsed());
                Ok(answer.into())
            }
            Err(reason) => {
                warn!(reason = reason.reason(), "Rejected model output: {}", reason);
                Ok(ChartReply::fallback())
            }
        }
    }
}
