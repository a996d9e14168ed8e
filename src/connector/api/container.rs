use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::http::HeaderValue;
use tracing::{debug, warn};

use crate::application::{CompletionClient, GenerateChartUseCase, RateLimiter};
use crate::connector::adapter::{
    InMemoryRateLimiter, MockCompletion, OpenAiCompletionClient, OpenAiConfig, DEFAULT_BASE_URL,
    DEFAULT_MAX_TOKENS, DEFAULT_MODEL, DEFAULT_REQUEST_TIMEOUT, DEFAULT_TEMPERATURE,
};
use crate::domain::{AllowedFieldSet, RateLimitPolicy, RetryPolicy};

pub const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:3000";

/// Browser origins allowed to call the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowedOrigin {
    Any,
    Exact(HeaderValue),
}

pub struct ContainerConfig {
    /// Provider credential. Without it every generate-chart call fails with a
    /// configuration error.
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub request_timeout: Duration,
    pub retry: RetryPolicy,
    pub rate_limit: RateLimitPolicy,
    /// Field set used when a request does not name its dataset's columns.
    pub allowed_fields: AllowedFieldSet,
    /// `*` allows any origin.
    pub allowed_origin: String,
    /// Answer from a canned offline provider instead of calling out.
    pub mock_provider: bool,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            openai_base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            retry: RetryPolicy::default(),
            rate_limit: RateLimitPolicy::default(),
            allowed_fields: AllowedFieldSet::default(),
            allowed_origin: DEFAULT_ALLOWED_ORIGIN.to_string(),
            mock_provider: false,
        }
    }
}

/// Wires adapters and use cases once at startup; shared by all requests.
pub struct Container {
    generate_chart_use_case: GenerateChartUseCase,
    rate_limiter: Arc<dyn RateLimiter>,
    allowed_origin: AllowedOrigin,
    model: Option<String>,
}

impl Container {
    pub fn new(config: ContainerConfig) -> Result<Self> {
        let completion_client: Option<Arc<dyn CompletionClient>> = if config.mock_provider {
            debug!("Using mock completion provider");
            Some(Arc::new(MockCompletion::default()))
        } else if let Some(api_key) = config.openai_api_key.clone() {
            debug!(
                "Using completion provider at {} with model {}",
                config.openai_base_url, config.model
            );
            let openai = OpenAiConfig {
                api_key,
                base_url: config.openai_base_url.clone(),
                model: config.model.clone(),
                max_tokens: config.max_tokens,
                temperature: config.temperature,
                timeout: config.request_timeout,
                retry: config.retry,
            };
            Some(Arc::new(OpenAiCompletionClient::new(openai)?))
        } else {
            warn!("No OpenAI API key configured; chart requests will fail");
            None
        };

        Self::with_completion_client(config, completion_client)
    }

    /// Build a container around an already-constructed completion client.
    pub fn with_completion_client(
        config: ContainerConfig,
        completion_client: Option<Arc<dyn CompletionClient>>,
    ) -> Result<Self> {
        let allowed_origin = parse_origin(&config.allowed_origin)?;
        let model = completion_client
            .as_ref()
            .map(|client| client.model_name().to_string());

        debug!(
            "Rate limit: {} requests per {:?}; {} default dataset fields",
            config.rate_limit.max_requests,
            config.rate_limit.window,
            config.allowed_fields.len()
        );

        Ok(Self {
            generate_chart_use_case: GenerateChartUseCase::new(
                completion_client,
                Arc::new(config.allowed_fields),
            ),
            rate_limiter: Arc::new(InMemoryRateLimiter::new(config.rate_limit)),
            allowed_origin,
            model,
        })
    }

    pub fn generate_chart_use_case(&self) -> &GenerateChartUseCase {
        &self.generate_chart_use_case
    }

    pub fn rate_limiter(&self) -> Arc<dyn RateLimiter> {
        Arc::clone(&self.rate_limiter)
    }

    pub fn allowed_origin(&self) -> &AllowedOrigin {
        &self.allowed_origin
    }

    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }
}

fn parse_origin(origin: &str) -> Result<AllowedOrigin> {
    let origin = origin.trim();
    if origin == "*" {
        return Ok(AllowedOrigin::Any);
    }
    let value = origin
        .trim_end_matches('/')
        .parse::<HeaderValue>()
        .with_context(|| format!("invalid allowed origin: {origin:?}"))?;
    Ok(AllowedOrigin::Exact(value))
}
