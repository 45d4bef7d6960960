//! # Store Actor
//!
//! Owns the [`Database`] and processes [`StoreRequest`]s one at a time from an
//! mpsc channel, so the database needs no lock. HTTP handlers talk to it through
//! a cloned [`StoreClient`].
//!
//! The actor is the authority for identity: on create it assigns the `id` and
//! both timestamps, discarding whatever the caller sent; on update it keeps
//! `id` and `createdAt` and refreshes `updatedAt`.

use crate::mock_api::client::StoreClient;
use crate::mock_api::db::{record_id, Database, Record, SortSpec, CREATED_AT};
use crate::mock_api::error::StoreError;
use crate::mock_api::message::StoreRequest;
use chrono::{SecondsFormat, Utc};
use serde_json::Value;
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

pub const ID: &str = "id";
pub const UPDATED_AT: &str = "updatedAt";

pub struct StoreActor {
    receiver: mpsc::Receiver<StoreRequest>,
    db: Database,
    persist_to: Option<PathBuf>,
    next_id_fn: Box<dyn Fn() -> String + Send + Sync>,
}

impl StoreActor {
    pub fn new(
        buffer_size: usize,
        db: Database,
        next_id_fn: impl Fn() -> String + Send + Sync + 'static,
    ) -> (Self, StoreClient) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let actor = Self {
            receiver,
            db,
            persist_to: None,
            next_id_fn: Box::new(next_id_fn),
        };
        (actor, StoreClient::new(sender))
    }

    /// Writes the database to `path` after every successful change.
    pub fn persist_to(mut self, path: impl Into<PathBuf>) -> Self {
        self.persist_to = Some(path.into());
        self
    }

    /// Runs the event loop until every client is dropped.
    pub async fn run(mut self) {
        let collections: Vec<_> = self.db.collection_names().map(str::to_string).collect();
        info!(?collections, "Store started");

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                StoreRequest::List {
                    collection,
                    sort,
                    respond_to,
                } => {
                    let result = self.list(&collection, &sort);
                    if let Ok(items) = &result {
                        debug!(%collection, count = items.len(), "List");
                    }
                    let _ = respond_to.send(result);
                }
                StoreRequest::Get {
                    collection,
                    id,
                    respond_to,
                } => {
                    let result = self.find(&collection, &id).cloned();
                    debug!(%collection, %id, found = result.is_ok(), "Get");
                    let _ = respond_to.send(result);
                }
                StoreRequest::Create {
                    collection,
                    record,
                    respond_to,
                } => {
                    let result = self.create(&collection, record);
                    self.after_write(&collection, "Created", &result);
                    let _ = respond_to.send(result);
                }
                StoreRequest::Update {
                    collection,
                    id,
                    patch,
                    respond_to,
                } => {
                    let result = self.update(&collection, &id, patch);
                    self.after_write(&collection, "Updated", &result);
                    let _ = respond_to.send(result);
                }
                StoreRequest::Delete {
                    collection,
                    id,
                    respond_to,
                } => {
                    let result = self.delete(&collection, &id);
                    self.after_write(&collection, "Deleted", &result);
                    let _ = respond_to.send(result);
                }
            }
        }

        info!("Store shutdown");
    }

    fn records(&self, collection: &str) -> Result<&Vec<Record>, StoreError> {
        self.db
            .collection(collection)
            .ok_or_else(|| StoreError::UnknownCollection(collection.to_string()))
    }

    fn records_mut(&mut self, collection: &str) -> Result<&mut Vec<Record>, StoreError> {
        self.db
            .collection_mut(collection)
            .ok_or_else(|| StoreError::UnknownCollection(collection.to_string()))
    }

    fn list(&self, collection: &str, sort: &SortSpec) -> Result<Vec<Record>, StoreError> {
        let mut items = self.records(collection)?.clone();
        sort.apply(&mut items);
        Ok(items)
    }

    fn find(&self, collection: &str, id: &str) -> Result<&Record, StoreError> {
        self.records(collection)?
            .iter()
            .find(|r| record_id(r).as_deref() == Some(id))
            .ok_or_else(|| not_found(collection, id))
    }

    fn create(&mut self, collection: &str, mut record: Record) -> Result<Record, StoreError> {
        let id = (self.next_id_fn)();
        let now = timestamp();
        record.insert(ID.to_string(), Value::String(id));
        record.insert(CREATED_AT.to_string(), Value::String(now.clone()));
        record.insert(UPDATED_AT.to_string(), Value::String(now));
        self.records_mut(collection)?.push(record.clone());
        Ok(record)
    }

    fn update(&mut self, collection: &str, id: &str, patch: Record) -> Result<Record, StoreError> {
        let record = self
            .records_mut(collection)?
            .iter_mut()
            .find(|r| record_id(r).as_deref() == Some(id))
            .ok_or_else(|| not_found(collection, id))?;
        for (key, value) in patch {
            if key != ID && key != CREATED_AT {
                record.insert(key, value);
            }
        }
        record.insert(UPDATED_AT.to_string(), Value::String(timestamp()));
        Ok(record.clone())
    }

    fn delete(&mut self, collection: &str, id: &str) -> Result<Record, StoreError> {
        let records = self.records_mut(collection)?;
        let index = records
            .iter()
            .position(|r| record_id(r).as_deref() == Some(id))
            .ok_or_else(|| not_found(collection, id))?;
        Ok(records.remove(index))
    }

    fn after_write(&self, collection: &str, action: &str, result: &Result<Record, StoreError>) {
        match result {
            Ok(record) => {
                let id = record_id(record).unwrap_or_default();
                let size = self.db.collection(collection).map_or(0, Vec::len);
                info!(%collection, %id, size, "{action}");
                if let Some(path) = &self.persist_to {
                    if let Err(e) = self.db.save(path) {
                        warn!(error = %e, "Persist failed");
                    }
                }
            }
            Err(e) => warn!(%collection, error = %e, "{action} failed"),
        }
    }
}

fn not_found(collection: &str, id: &str) -> StoreError {
    StoreError::NotFound {
        collection: collection.to_string(),
        id: id.to_string(),
    }
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    fn start(db: Database) -> StoreClient {
        let counter = Arc::new(AtomicU64::new(1));
        let next_id = move || format!("user_{}", counter.fetch_add(1, Ordering::SeqCst));
        let (actor, client) = StoreActor::new(10, db, next_id);
        tokio::spawn(actor.run());
        client
    }

    fn body(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_store_assigns_identity_and_merges_updates() {
        let client = start(Database::with_collections(["users"]));

        // Client-supplied identity is ignored.
        let created = client
            .create(
                "users",
                body(json!({ "id": "mine", "firstName": "Alice", "createdAt": "1999" })),
            )
            .await
            .unwrap();
        assert_eq!(created["id"], "user_1");
        assert_ne!(created["createdAt"], "1999");
        assert_eq!(created["createdAt"], created["updatedAt"]);

        let updated = client
            .update(
                "users",
                "user_1",
                body(json!({ "firstName": "Alicia", "id": "other", "createdAt": "x" })),
            )
            .await
            .unwrap();
        assert_eq!(updated["id"], "user_1");
        assert_eq!(updated["firstName"], "Alicia");
        assert_eq!(updated["createdAt"], created["createdAt"]);

        let fetched = client.get("users", "user_1").await.unwrap();
        assert_eq!(fetched, updated);
    }

    #[tokio::test]
    async fn test_delete_twice_is_not_found() {
        let client = start(Database::with_collections(["users"]));
        client.create("users", Record::new()).await.unwrap();

        client.delete("users", "user_1").await.unwrap();
        let again = client.delete("users", "user_1").await;
        assert!(matches!(again, Err(StoreError::NotFound { .. })));
        assert!(client.list("users", SortSpec::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_collection() {
        let client = start(Database::with_collections(["users"]));
        let result = client.list("orders", SortSpec::default()).await;
        assert!(matches!(result, Err(StoreError::UnknownCollection(c)) if c == "orders"));
    }

    #[tokio::test]
    async fn test_changes_are_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.json");
        let counter = AtomicU64::new(1);
        let (actor, client) = StoreActor::new(10, Database::with_collections(["users"]), move || {
            counter.fetch_add(1, Ordering::SeqCst).to_string()
        });
        let handle = tokio::spawn(actor.persist_to(&path).run());

        client
            .create("users", body(json!({ "firstName": "Persisted" })))
            .await
            .unwrap();
        drop(client);
        handle.await.unwrap();

        let db = Database::load(&path).unwrap();
        let users = db.collection("users").unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0]["firstName"], "Persisted");
    }
}
