//! # Domain Layer
//!
//! Core models, errors, and the validation rules applied to model output.
//! This layer is independent of HTTP and provider details.

mod error;
pub mod models;
pub mod services;

pub use error::*;
pub use models::*;
pub use services::*;
