pub mod container;
pub mod controller;
pub mod error;
pub mod rate_limit;
pub mod router;

pub use container::{AllowedOrigin, Container, ContainerConfig, DEFAULT_ALLOWED_ORIGIN};
pub use error::ApiError;
pub use router::Router;
