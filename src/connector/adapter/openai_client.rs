use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::RETRY_AFTER;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::application::CompletionClient;
use crate::domain::{CompletionResult, DomainError, RetryPolicy, RetryState};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const COMPLETIONS_PATH: &str = "/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_MAX_TOKENS: u32 = 300;
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    messages: Vec<ApiMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ApiMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// The part of a chat-completions response we read.
#[derive(Deserialize)]
struct ApiResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Connection and generation settings for [`OpenAiCompletionClient`].
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Bound on a single provider call, body included.
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl OpenAiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            timeout: DEFAULT_REQUEST_TIMEOUT,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Outcome of one HTTP exchange, before the retry decision.
enum AttemptError {
    /// HTTP 429. Only this case is retried.
    Overloaded {
        retry_after: Option<Duration>,
        details: Value,
    },
    Fatal(DomainError),
}

/// Client for OpenAI-compatible chat-completions endpoints.
///
/// Sends the prompt as a single user message with fixed generation settings
/// and bearer authorization. When the provider answers 429 the call is
/// repeated after the `Retry-After` hint (or the policy's default delay),
/// up to [`RetryPolicy::max_retries`] extra times. Every other failure is
/// returned at once:
///
/// | Upstream outcome        | Error                                   |
/// |-------------------------|-----------------------------------------|
/// | 429, retries exhausted  | `Provider { status: 429, details }`     |
/// | other non-2xx           | `Provider { status, details }`          |
/// | timeout                 | `Provider { status: 504, .. }`          |
/// | connection failure      | `Network`                               |
/// | 2xx without choices     | `Internal`                              |
pub struct OpenAiCompletionClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
    timeout: Duration,
    retry: RetryPolicy,
    /// Full endpoint URL (base + COMPLETIONS_PATH).
    url: String,
}

impl OpenAiCompletionClient {
    pub fn new(config: OpenAiConfig) -> Result<Self, DomainError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| DomainError::config(format!("failed to build HTTP client: {e}")))?;
        let url = format!(
            "{}{}",
            config.base_url.trim_end_matches('/'),
            COMPLETIONS_PATH
        );

        Ok(Self {
            client,
            api_key: config.api_key,
            model: config.model,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            timeout: config.timeout,
            retry: config.retry,
            url,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn send_once(&self, prompt: &str) -> Result<String, AttemptError> {
        let request = ApiRequest {
            model: &self.model,
            messages: vec![ApiMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AttemptError::Fatal(self.transport_error(e)))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(parse_retry_after);
            let body = match response.text().await {
                Ok(body) => body,
                Err(e) if e.is_timeout() => {
                    return Err(AttemptError::Fatal(self.transport_error(e)));
                }
                Err(e) => {
                    debug!("Failed to read error body from provider: {e}");
                    String::new()
                }
            };
            let details = serde_json::from_str::<Value>(&body).unwrap_or(Value::String(body));

            if status == StatusCode::TOO_MANY_REQUESTS {
                return Err(AttemptError::Overloaded {
                    retry_after,
                    details,
                });
            }
            warn!("OpenAiCompletionClient: API returned {status}: {details}");
            return Err(AttemptError::Fatal(DomainError::provider(
                status.as_u16(),
                details,
            )));
        }

        let api_response: ApiResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                AttemptError::Fatal(self.transport_error(e))
            } else {
                AttemptError::Fatal(DomainError::internal(format!(
                    "failed to parse completion response: {e}"
                )))
            }
        })?;

        api_response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.unwrap_or_default())
            .ok_or_else(|| {
                AttemptError::Fatal(DomainError::internal(
                    "completion response contained no choices",
                ))
            })
    }

    fn transport_error(&self, e: reqwest::Error) -> DomainError {
        if e.is_timeout() {
            DomainError::provider(
                StatusCode::GATEWAY_TIMEOUT.as_u16(),
                format!(
                    "upstream request timed out after {}s",
                    self.timeout.as_secs_f32()
                ),
            )
        } else {
            DomainError::network(format!("request to {} failed: {e}", self.url))
        }
    }
}

#[async_trait]
impl CompletionClient for OpenAiCompletionClient {
    async fn complete(&self, prompt: &str) -> Result<CompletionResult, DomainError> {
        let mut retry = RetryState::new(&self.retry);
        let mut attempt: u32 = 1;
        let max_calls = self.retry.max_calls();

        loop {
            debug!(
                attempt,
                max_calls,
                retries_left = retry.attempts_remaining(),
                "Calling completion provider"
            );

            match self.send_once(prompt).await {
                Ok(text) => {
                    info!(attempt, "Completion provider call succeeded");
                    return Ok(CompletionResult::new(text));
                }
                Err(AttemptError::Overloaded {
                    retry_after,
                    details,
                }) => match retry.next_delay(retry_after) {
                    Some(delay) => {
                        warn!(
                            attempt,
                            delay_ms = delay.as_millis() as u64,
                            retries_left = retry.attempts_remaining(),
                            "Provider rate limit exceeded, retrying"
                        );
                        tokio::time::sleep(delay).await;
                    }
                    None => {
                        warn!(
                            attempt,
                            max_calls,
                            "Provider rate limit exceeded, retries exhausted"
                        );
                        return Err(DomainError::provider(
                            StatusCode::TOO_MANY_REQUESTS.as_u16(),
                            details,
                        ));
                    }
                },
                Err(AttemptError::Fatal(err)) => {
                    warn!(attempt, "Completion provider call failed: {err}");
                    return Err(err);
                }
            }

            attempt += 1;
        }
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Parse a `Retry-After` value given in (possibly fractional) seconds.
///
/// HTTP-date values are not supported and yield `None`, as do negative or
/// out-of-range numbers.
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    let value = value.trim();
    if let Ok(secs) = value.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }
    value
        .parse::<f64>()
        .ok()
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
}
