//! # Resource Trait
//!
//! The seam between the query layer and whatever performs the requests. The HTTP
//! [`Engine`](crate::framework::Engine) implements it for production; the
//! [`MockResource`](crate::framework::mock::MockResource) implements it for tests.
use crate::framework::engine::{DeleteReceipt, QueryParams};
use crate::framework::entity::RestEntity;
use crate::framework::error::EngineError;
use async_trait::async_trait;
use std::sync::Arc;

/// CRUD access to one collection of `T`.
#[async_trait]
pub trait Resource<T: RestEntity>: Send + Sync {
    /// Collection name, used for cache keys and logs.
    fn name(&self) -> &str;

    async fn list(&self, params: &QueryParams) -> Result<Vec<T>, EngineError>;

    async fn fetch(&self, id: &str) -> Result<T, EngineError>;

    async fn create(&self, data: T::Create) -> Result<T, EngineError>;

    async fn update(&self, id: &str, data: T::Update) -> Result<T, EngineError>;

    async fn delete(&self, id: &str) -> Result<DeleteReceipt, EngineError>;
}

/// Shared handle passed explicitly to every consumer.
pub type SharedResource<T> = Arc<dyn Resource<T>>;
