//! # Generic REST Engine
//!
//! `Engine<T>` issues list/fetch/create/update/delete requests against one REST
//! collection. Every URL is composed from the configured base, the fixed `api`
//! prefix, the endpoint bound at construction and, for single-record operations,
//! the record identifier:
//!
//! ```text
//! GET    {base}/api/{endpoint}?{params}
//! GET    {base}/api/{endpoint}/{id}?{params}
//! POST   {base}/api/{endpoint}
//! PATCH  {base}/api/{endpoint}/{id}
//! DELETE {base}/api/{endpoint}/{id}
//! ```
//!
//! Each call performs exactly one round trip. Nothing is retried and no call
//! waits on or cancels another.

use crate::framework::entity::RestEntity;
use crate::framework::error::EngineError;
use crate::framework::resource::Resource;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::marker::PhantomData;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Path segment every collection lives under.
pub const API_PREFIX: &str = "api";

const JSON: &str = "application/json";

/// Query string parameters. Appended only when non-empty.
pub type QueryParams = BTreeMap<String, String>;

/// Result of a successful `DELETE`: the transport status description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteReceipt {
    pub status: String,
}

/// A typed client for one REST collection.
///
/// The endpoint string is owned by the instance; engines share no mutable state,
/// so cloning one is cheap and clones are independent.
#[derive(Debug, Clone)]
pub struct Engine<T> {
    http: Client,
    base_url: Url,
    endpoint: String,
    _entity: PhantomData<fn() -> T>,
}

impl<T: RestEntity> Engine<T> {
    pub fn new(base_url: Url, endpoint: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url, endpoint)
    }

    /// Builds an engine on top of an existing HTTP client (shared connection pool).
    pub fn with_client(http: Client, base_url: Url, endpoint: impl Into<String>) -> Self {
        Self {
            http,
            base_url,
            endpoint: endpoint.into(),
            _entity: PhantomData,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn collection_url(&self) -> Url {
        self.url_for(None)
    }

    /// URL of one record. `id` is escaped as a single path segment, except for
    /// `.` and `..`, which the CRUD methods reject up front.
    pub fn record_url(&self, id: &str) -> Url {
        self.url_for(Some(id))
    }

    fn url_for(&self, id: Option<&str>) -> Url {
        let mut url = self.base_url.clone();
        // http(s) bases always have path segments
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(API_PREFIX).push(&self.endpoint);
            if let Some(id) = id {
                segments.push(id);
            }
        }
        url
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.http.request(method, url).header(CONTENT_TYPE, JSON)
    }

    async fn send(request: RequestBuilder, resource: String) -> Result<Response, EngineError> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!(%resource, status = status.as_u16(), "Request failed");
            return Err(EngineError::from_status(status, resource));
        }
        Ok(response)
    }

    fn resource_path(&self, id: &str) -> String {
        format!("{}/{}", self.endpoint, id)
    }

    /// Lists the collection.
    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    pub async fn list(&self, params: &QueryParams) -> Result<Vec<T>, EngineError> {
        let mut request = self.request(Method::GET, self.collection_url());
        if !params.is_empty() {
            request = request.query(params);
        }
        let response = Self::send(request, self.endpoint.clone()).await?;
        let items = response.json::<Vec<T>>().await?;
        debug!(count = items.len(), "Listed");
        Ok(items)
    }

    /// Fetches one record.
    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    pub async fn fetch(&self, id: &str, params: &QueryParams) -> Result<T, EngineError> {
        check_id(id)?;
        let mut request = self.request(Method::GET, self.record_url(id));
        if !params.is_empty() {
            request = request.query(params);
        }
        let response = Self::send(request, self.resource_path(id)).await?;
        Ok(response.json::<T>().await?)
    }

    /// Creates a record. The returned value is the server's echo, including the
    /// identifier and timestamps it assigned.
    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    pub async fn create(&self, data: &T::Create) -> Result<T, EngineError> {
        let request = self
            .request(Method::POST, self.collection_url())
            .json(data);
        let response = Self::send(request, self.endpoint.clone()).await?;
        let created = response.json::<T>().await?;
        info!(id = created.id(), "Created");
        Ok(created)
    }

    /// Applies a partial update. The echoed record is authoritative; nothing is
    /// stamped client-side.
    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    pub async fn update(&self, id: &str, data: &T::Update) -> Result<T, EngineError> {
        check_id(id)?;
        let request = self.request(Method::PATCH, self.record_url(id)).json(data);
        let response = Self::send(request, self.resource_path(id)).await?;
        let updated = response.json::<T>().await?;
        info!(id, "Updated");
        Ok(updated)
    }

    /// Deletes a record, returning the transport status text.
    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    pub async fn delete(&self, id: &str) -> Result<DeleteReceipt, EngineError> {
        check_id(id)?;
        let request = self.request(Method::DELETE, self.record_url(id));
        let response = Self::send(request, self.resource_path(id)).await?;
        let status = response
            .status()
            .canonical_reason()
            .unwrap_or_default()
            .to_string();
        info!(id, %status, "Deleted");
        Ok(DeleteReceipt { status })
    }
}

/// Ids that cannot name a single path segment: empty, or dot segments that URL
/// normalization would fold into the collection path.
fn check_id(id: &str) -> Result<(), EngineError> {
    match id {
        "" | "." | ".." => Err(EngineError::InvalidId),
        _ => Ok(()),
    }
}

#[async_trait]
impl<T: RestEntity> Resource<T> for Engine<T> {
    fn name(&self) -> &str {
        &self.endpoint
    }

    async fn list(&self, params: &QueryParams) -> Result<Vec<T>, EngineError> {
        Engine::list(self, params).await
    }

    async fn fetch(&self, id: &str) -> Result<T, EngineError> {
        Engine::fetch(self, id, &QueryParams::new()).await
    }

    async fn create(&self, data: T::Create) -> Result<T, EngineError> {
        Engine::create(self, &data).await
    }

    async fn update(&self, id: &str, data: T::Update) -> Result<T, EngineError> {
        Engine::update(self, id, &data).await
    }

    async fn delete(&self, id: &str) -> Result<DeleteReceipt, EngineError> {
        Engine::delete(self, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{User, UserUpdate};

    fn engine(base: &str) -> Engine<User> {
        Engine::new(Url::parse(base).unwrap(), "users")
    }

    #[test]
    fn test_urls_compose_base_prefix_endpoint_and_id() {
        let engine = engine("http://localhost:3000");
        assert_eq!(
            engine.collection_url().as_str(),
            "http://localhost:3000/api/users"
        );
        assert_eq!(
            engine.record_url("abc-123").as_str(),
            "http://localhost:3000/api/users/abc-123"
        );
    }

    #[test]
    fn test_urls_keep_base_path_and_escape_ids() {
        let engine = engine("http://localhost:3000/v1/");
        assert_eq!(
            engine.record_url("a/b").as_str(),
            "http://localhost:3000/v1/api/users/a%2Fb"
        );
    }

    #[tokio::test]
    async fn test_empty_id_is_rejected_before_any_request() {
        // Nothing listens on this port; an attempted request would be a Network error.
        let engine = engine("http://127.0.0.1:9");
        let result = engine.fetch("", &QueryParams::new()).await;
        assert_eq!(result.unwrap_err(), EngineError::InvalidId);
        assert_eq!(engine.delete("").await.unwrap_err(), EngineError::InvalidId);
    }

    #[tokio::test]
    async fn test_dot_segment_ids_never_reach_the_collection_url() {
        let engine = engine("http://127.0.0.1:9");
        for id in [".", ".."] {
            let fetched = engine.fetch(id, &QueryParams::new()).await;
            assert_eq!(fetched.unwrap_err(), EngineError::InvalidId, "fetch {id:?}");
            let updated = engine.update(id, &UserUpdate::default()).await;
            assert_eq!(updated.unwrap_err(), EngineError::InvalidId, "update {id:?}");
            let deleted = engine.delete(id).await;
            assert_eq!(deleted.unwrap_err(), EngineError::InvalidId, "delete {id:?}");
        }
        // Dots inside an id are ordinary characters.
        assert_eq!(
            engine.record_url("a..b").as_str(),
            "http://127.0.0.1:9/api/users/a..b"
        );
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_a_network_error() {
        let engine = engine("http://127.0.0.1:9");
        let result = engine.list(&QueryParams::new()).await;
        assert!(matches!(result, Err(EngineError::Network(_))));
    }
}
