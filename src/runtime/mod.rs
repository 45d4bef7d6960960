//! Runtime orchestration and lifecycle management.
//!
//! - [`ApiSystem`] - starts the mock API (store actor + HTTP server) and shuts it down
//! - [`setup_tracing`] - initializes the tracing/logging infrastructure

pub mod api_system;
pub mod tracing;

pub use self::api_system::{ApiSystem, RuntimeError};
pub use self::tracing::setup_tracing;
