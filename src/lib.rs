pub mod application;
pub mod cli;
pub mod connector;
pub mod domain;

pub use application::{CompletionClient, GenerateChartUseCase, RateLimiter};

pub use cli::{Cli, Commands};

pub use connector::{
    ApiError, Container, ContainerConfig, InMemoryRateLimiter, MockCompletion,
    OpenAiCompletionClient, OpenAiConfig, Router,
};

pub use domain::{
    Admission, AllowedFieldSet, ChartAnswer, ChartReply, CompletionResult, DomainError,
    MalformedResponse, PromptRequest, RateLimitPolicy, ResponseValidator, RetryPolicy, RetryState,
};
