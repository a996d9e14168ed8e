use serde::Deserialize;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::domain::{ChartReply, DomainError, PromptRequest};

use super::super::Container;

/// Body of `POST /api/generate-chart`.
#[derive(Debug, Deserialize)]
pub struct GenerateChartBody {
    pub prompt: String,
    /// Column names of the dataset the user uploaded.
    #[serde(default)]
    pub fields: Option<Vec<String>>,
}

impl From<GenerateChartBody> for PromptRequest {
    fn from(body: GenerateChartBody) -> Self {
        let request = PromptRequest::new(body.prompt);
        match body.fields {
            Some(fields) => request.with_fields(fields),
            None => request,
        }
    }
}

pub struct GenerateChartController<'a> {
    container: &'a Container,
}

impl<'a> GenerateChartController<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self { container }
    }

    pub async fn generate(
        &self,
        body: GenerateChartBody,
        client_id: &str,
    ) -> Result<ChartReply, DomainError> {
        let request_id = Uuid::new_v4();
        let span = info_span!("generate_chart", %request_id, client = %client_id);

        async move {
            info!("Incoming chart request");
            let result = self
                .container
                .generate_chart_use_case()
                .execute(body.into())
                .await;

            if let Err(err) = &result {
                if err.is_config() {
                    error!("Chart request failed on server configuration: {err}");
                } else if err.is_provider_overloaded() {
                    warn!("Provider still overloaded after retries");
                } else {
                    warn!("Chart request failed: {err}");
                }
            }
            result
        }
        .instrument(span)
        .await
    }
}
