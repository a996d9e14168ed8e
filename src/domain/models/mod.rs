mod allowed_fields;
mod chart_answer;
mod prompt_request;
mod rate_limit;
mod retry;

pub use allowed_fields::*;
pub use chart_answer::*;
pub use prompt_request::*;
pub use rate_limit::*;
pub use retry::*;
