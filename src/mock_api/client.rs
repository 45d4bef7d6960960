use crate::mock_api::db::{Record, SortSpec};
use crate::mock_api::error::StoreError;
use crate::mock_api::message::StoreRequest;
use tokio::sync::{mpsc, oneshot};

/// Handle for talking to a running [`StoreActor`](crate::mock_api::StoreActor).
/// Dropping every clone stops the actor.
#[derive(Clone)]
pub struct StoreClient {
    sender: mpsc::Sender<StoreRequest>,
}

impl StoreClient {
    pub fn new(sender: mpsc::Sender<StoreRequest>) -> Self {
        Self { sender }
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<Result<T, StoreError>>) -> StoreRequest,
    ) -> Result<T, StoreError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(build(respond_to))
            .await
            .map_err(|_| StoreError::ActorClosed)?;
        response.await.map_err(|_| StoreError::ActorDropped)?
    }

    pub async fn list(&self, collection: &str, sort: SortSpec) -> Result<Vec<Record>, StoreError> {
        let collection = collection.to_string();
        self.request(|respond_to| StoreRequest::List {
            collection,
            sort,
            respond_to,
        })
        .await
    }

    pub async fn get(&self, collection: &str, id: &str) -> Result<Record, StoreError> {
        let (collection, id) = (collection.to_string(), id.to_string());
        self.request(|respond_to| StoreRequest::Get {
            collection,
            id,
            respond_to,
        })
        .await
    }

    pub async fn create(&self, collection: &str, record: Record) -> Result<Record, StoreError> {
        let collection = collection.to_string();
        self.request(|respond_to| StoreRequest::Create {
            collection,
            record,
            respond_to,
        })
        .await
    }

    pub async fn update(
        &self,
        collection: &str,
        id: &str,
        patch: Record,
    ) -> Result<Record, StoreError> {
        let (collection, id) = (collection.to_string(), id.to_string());
        self.request(|respond_to| StoreRequest::Update {
            collection,
            id,
            patch,
            respond_to,
        })
        .await
    }

    pub async fn delete(&self, collection: &str, id: &str) -> Result<Record, StoreError> {
        let (collection, id) = (collection.to_string(), id.to_string());
        self.request(|respond_to| StoreRequest::Delete {
            collection,
            id,
            respond_to,
        })
        .await
    }
}
