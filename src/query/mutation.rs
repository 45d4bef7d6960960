//! # Mutations
//!
//! A [`Mutation`] wraps one create, update or delete and moves it through
//! `Idle -> Pending -> (Success | Error) -> Settled`. Settling always refetches
//! the list it is bound to, once; the cached list is never patched locally.

use crate::framework::{EngineError, RestEntity};
use crate::query::client::ListQuery;
use crate::query::state::{MutationKind, MutationState};
use std::future::Future;
use tokio::sync::watch;
use tracing::{info, warn};

/// A create/update/delete bound to the list it invalidates.
///
/// Every run ends by refetching the list exactly once, whatever the outcome.
/// The cached list is never patched locally.
pub struct Mutation<T: RestEntity> {
    kind: MutationKind,
    list: ListQuery<T>,
    state: watch::Sender<MutationState>,
}

impl<T: RestEntity> Mutation<T> {
    pub fn new(kind: MutationKind, list: ListQuery<T>) -> Self {
        let (state, _) = watch::channel(MutationState::idle(kind));
        Self { kind, list, state }
    }

    pub fn kind(&self) -> MutationKind {
        self.kind
    }

    pub fn state(&self) -> MutationState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<MutationState> {
        self.state.subscribe()
    }

    /// Runs `op`, then `on_outcome` with its result, then the list refetch.
    ///
    /// The refetch starts only after `on_outcome` returns. A failed refetch is
    /// recorded on the list entry and does not change the returned result.
    pub async fn mutate<V, Fut, F>(&self, op: Fut, on_outcome: F) -> Result<V, EngineError>
    where
        Fut: Future<Output = Result<V, EngineError>>,
        F: FnOnce(&Result<V, EngineError>),
    {
        self.state.send_modify(MutationState::start);
        info!(kind = %self.kind, key = %self.list.key(), "Mutation pending");

        let result = op.await;
        self.state.send_modify(|state| state.resolve(&result));
        match &result {
            Ok(_) => info!(kind = %self.kind, "Mutation succeeded"),
            Err(e) => warn!(kind = %self.kind, error = %e, "Mutation failed"),
        }
        on_outcome(&result);

        if let Err(e) = self.list.refetch().await {
            warn!(kind = %self.kind, error = %e, "Refetch after mutation failed");
        }
        self.state.send_modify(MutationState::settle);
        result
    }
}
