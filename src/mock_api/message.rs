use crate::mock_api::db::{Record, SortSpec};
use crate::mock_api::error::StoreError;
use tokio::sync::oneshot;

/// One-shot reply channel used by the store actor.
pub type Response<T> = oneshot::Sender<Result<T, StoreError>>;

/// Requests processed by the [`StoreActor`](crate::mock_api::StoreActor),
/// one per REST operation.
#[derive(Debug)]
pub enum StoreRequest {
    List {
        collection: String,
        sort: SortSpec,
        respond_to: Response<Vec<Record>>,
    },
    Get {
        collection: String,
        id: String,
        respond_to: Response<Record>,
    },
    Create {
        collection: String,
        record: Record,
        respond_to: Response<Record>,
    },
    Update {
        collection: String,
        id: String,
        patch: Record,
        respond_to: Response<Record>,
    },
    Delete {
        collection: String,
        id: String,
        respond_to: Response<Record>,
    },
}
