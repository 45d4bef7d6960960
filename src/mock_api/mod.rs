//! Mock REST backend.
//!
//! Serves every collection in a JSON database file over HTTP:
//!
//! ```text
//! GET    /api/:resource            list (supports _sort / _order)
//! POST   /api/:resource            create, 201 with the stored record
//! GET    /api/:resource/:id        fetch
//! PATCH  /api/:resource/:id        merge fields
//! DELETE /api/:resource/:id        remove, 200 with the removed record
//! GET    /healthz
//! ```
//!
//! Failures are answered with `{ "code": ..., "message": ... }`.

pub mod actor;
pub mod client;
pub mod db;
pub mod error;
pub mod message;

pub use actor::StoreActor;
pub use client::StoreClient;
pub use db::{Database, Record, SortSpec};
pub use error::StoreError;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    NotFound,
    Validation,
    Internal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

type ApiResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

fn reject(e: StoreError) -> (StatusCode, Json<ApiError>) {
    let (status, code) = match &e {
        StoreError::NotFound { .. } | StoreError::UnknownCollection(_) => {
            (StatusCode::NOT_FOUND, ErrorCode::NotFound)
        }
        StoreError::InvalidBody(_) => (StatusCode::BAD_REQUEST, ErrorCode::Validation),
        StoreError::ActorClosed
        | StoreError::ActorDropped
        | StoreError::Persist { .. }
        | StoreError::Load { .. } => (StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::Internal),
    };
    (status, Json(ApiError::new(code, e.to_string())))
}

fn object_body(body: Result<Json<Value>, JsonRejection>) -> Result<Record, StoreError> {
    match body {
        Ok(Json(Value::Object(record))) => Ok(record),
        Ok(Json(_)) => Err(StoreError::InvalidBody("expected a JSON object".to_string())),
        Err(e) => Err(StoreError::InvalidBody(e.body_text())),
    }
}

pub fn build_router(store: StoreClient) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/:resource", get(list_records).post(create_record))
        .route(
            "/api/:resource/:id",
            get(get_record).patch(update_record).delete(delete_record),
        )
        .with_state(store)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn list_records(
    State(store): State<StoreClient>,
    Path(resource): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Json<Vec<Record>>> {
    let sort = SortSpec::from_params(&params);
    store.list(&resource, sort).await.map(Json).map_err(reject)
}

async fn get_record(
    State(store): State<StoreClient>,
    Path((resource, id)): Path<(String, String)>,
) -> ApiResult<Json<Record>> {
    store.get(&resource, &id).await.map(Json).map_err(reject)
}

async fn create_record(
    State(store): State<StoreClient>,
    Path(resource): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Record>)> {
    let record = object_body(body).map_err(reject)?;
    let created = store.create(&resource, record).await.map_err(reject)?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_record(
    State(store): State<StoreClient>,
    Path((resource, id)): Path<(String, String)>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<Record>> {
    let patch = object_body(body).map_err(reject)?;
    store.update(&resource, &id, patch).await.map(Json).map_err(reject)
}

async fn delete_record(
    State(store): State<StoreClient>,
    Path((resource, id)): Path<(String, String)>,
) -> ApiResult<Json<Record>> {
    store.delete(&resource, &id).await.map(Json).map_err(reject)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_errors_map_to_status() {
        let (status, body) = reject(StoreError::NotFound {
            collection: "users".into(),
            id: "1".into(),
        });
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.0.code, ErrorCode::NotFound);

        let (status, _) = reject(StoreError::InvalidBody("nope".into()));
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = reject(StoreError::ActorClosed);
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_non_object_body_is_invalid() {
        let result = object_body(Ok(Json(serde_json::json!([1, 2]))));
        assert!(matches!(result, Err(StoreError::InvalidBody(_))));
    }
}
