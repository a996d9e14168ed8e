use std::time::Duration;

use clap::{Parser, Subcommand};

use crate::connector::{
    ContainerConfig, DEFAULT_ALLOWED_ORIGIN, DEFAULT_BASE_URL, DEFAULT_MAX_TOKENS, DEFAULT_MODEL,
    DEFAULT_TEMPERATURE,
};
use crate::domain::{AllowedFieldSet, RateLimitPolicy, RetryPolicy};

#[derive(Parser)]
#[command(name = "chartbridge")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Credential for the completion provider
    #[arg(long, global = true, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    /// Base URL of an OpenAI-compatible API
    #[arg(long, global = true, env = "OPENAI_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub openai_base_url: String,

    #[arg(long, global = true, env = "OPENAI_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    #[arg(long, global = true, default_value_t = DEFAULT_MAX_TOKENS)]
    pub max_tokens: u32,

    #[arg(long, global = true, default_value_t = DEFAULT_TEMPERATURE)]
    pub temperature: f32,

    /// Timeout for one provider call, in seconds
    #[arg(long, global = true, default_value_t = 30)]
    pub request_timeout_secs: u64,

    /// Retries after the provider answers 429
    #[arg(long, global = true, default_value_t = 3)]
    pub max_retries: u32,

    /// Delay before a retry when the provider sends no Retry-After
    #[arg(long, global = true, default_value_t = 1000)]
    pub retry_delay_ms: u64,

    /// Upper bound on a provider-supplied Retry-After
    #[arg(long, global = true, default_value_t = 60)]
    pub max_retry_delay_secs: u64,

    /// Dataset columns charts may reference when a request names none
    #[arg(long, global = true, value_delimiter = ',')]
    pub allowed_fields: Option<Vec<String>>,

    /// Answer from a canned offline provider
    #[arg(long, global = true)]
    pub mock_provider: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP API
    Serve {
        #[arg(short, long, env = "PORT", default_value_t = 5001)]
        port: u16,

        /// Bind to 0.0.0.0 instead of 127.0.0.1, exposing the server on all network interfaces
        #[arg(long)]
        public: bool,

        /// Browser origin allowed by CORS (`*` for any)
        #[arg(long, env = "ALLOWED_ORIGIN", default_value = DEFAULT_ALLOWED_ORIGIN)]
        allowed_origin: String,

        #[arg(long, default_value_t = 60)]
        rate_limit_window_secs: u64,

        /// Requests admitted per client within one window
        #[arg(long, default_value_t = 100)]
        rate_limit_max: u32,
    },

    /// Run one prompt through the provider and print the validated reply
    Ask {
        prompt: String,

        /// Columns of the dataset the prompt is about
        #[arg(long, value_delimiter = ',')]
        fields: Option<Vec<String>>,
    },
}

impl Cli {
    /// Provider, retry and validation settings shared by every subcommand.
    pub fn container_config(&self) -> ContainerConfig {
        let allowed_fields = match &self.allowed_fields {
            Some(fields) => AllowedFieldSet::new(fields.iter().cloned()),
            None => AllowedFieldSet::default(),
        };

        ContainerConfig {
            openai_api_key: self.openai_api_key.clone().filter(|k| !k.trim().is_empty()),
            openai_base_url: self.openai_base_url.clone(),
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            retry: RetryPolicy::default()
                .with_max_retries(self.max_retries)
                .with_default_delay(Duration::from_millis(self.retry_delay_ms))
                .with_max_delay(Duration::from_secs(self.max_retry_delay_secs)),
            rate_limit: RateLimitPolicy::default(),
            allowed_fields,
            mock_provider: self.mock_provider,
            ..ContainerConfig::default()
        }
    }
}
