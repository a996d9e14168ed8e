mod in_memory_rate_limiter;
mod mock_completion;
mod openai_client;

pub use in_memory_rate_limiter::*;
pub use mock_completion::*;
pub use openai_client::*;
