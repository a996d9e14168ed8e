mod completion_client;
mod rate_limiter;

pub use completion_client::*;
pub use rate_limiter::*;
