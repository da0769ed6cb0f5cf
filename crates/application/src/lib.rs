//! Application layer - Use cases and orchestration
//!
//! Contains the resolution, fallback, scoring and batch search services and
//! the port definitions their adapters implement.

pub mod error;
pub mod ports;
pub mod services;

pub use error::ApplicationError;
pub use ports::*;
pub use services::*;
