//! # Application Layer
//!
//! Interfaces to external collaborators and the use case orchestrating them.

pub mod interfaces;
pub mod use_cases;

pub use interfaces::*;
pub use use_cases::*;
