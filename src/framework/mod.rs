//! Generic REST resource framework.
//!
//! This module provides the building blocks for typed CRUD access to REST
//! collections.
//!
//! # Main Components
//!
//! - [`RestEntity`] - Trait that record types implement to be served by an engine
//! - [`Engine`] - Generic HTTP client bound to one collection endpoint
//! - [`Resource`] - Async seam trait consumed by the query layer
//! - [`EngineError`] - Failures, tagged by HTTP status category
//!
//! # Testing
//!
//! See [`mock`] module for a [`Resource`] implementation that answers from expectations.

pub mod engine;
pub mod entity;
pub mod error;
pub mod mock;
pub mod resource;

// Re-export core types for convenience
pub use engine::{DeleteReceipt, Engine, QueryParams, API_PREFIX};
pub use entity::RestEntity;
pub use error::EngineError;
pub use resource::{Resource, SharedResource};
