use std::path::PathBuf;

/// Errors raised by the store actor and its database file.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Store actor closed")]
    ActorClosed,
    #[error("Store actor dropped response channel")]
    ActorDropped,
    #[error("Record not found: {collection}/{id}")]
    NotFound { collection: String, id: String },
    #[error("Unknown collection: {0}")]
    UnknownCollection(String),
    #[error("Invalid body: {0}")]
    InvalidBody(String),
    #[error("Failed to write {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to load {path}: {message}")]
    Load { path: PathBuf, message: String },
}
