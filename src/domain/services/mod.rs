//! Domain services containing the core validation logic.

mod response_validator;

pub use response_validator::*;
