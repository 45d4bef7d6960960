//! # Query Client
//!
//! `QueryClient<T>` owns the cache entries for one collection. It is created
//! explicitly and handed to whoever needs it; there is no global instance, so
//! every test gets an isolated cache.
//!
//! ## Latest refetch wins
//!
//! Each refetch of a [`ListQuery`] draws a ticket from a monotonically
//! increasing counter. When the response arrives it is applied only if no newer
//! ticket is still in flight and nothing newer has already been applied;
//! otherwise it is discarded and the caller gets [`FetchOutcome::Superseded`].
//! A slow, older response never overwrites a fresher list.
//!
//! A refetch future that is dropped before it settles withdraws its ticket, so
//! an older request still in flight can apply in its place. If nothing is left
//! in flight, the entry falls back from `Loading`/`Refetching` to its last
//! settled status.

use crate::framework::{EngineError, QueryParams, RestEntity, SharedResource};
use crate::query::key::QueryKey;
use crate::query::state::QueryState;
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tracing::{debug, instrument, warn};

/// What a refetch produced.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome<D> {
    /// The response was applied to the cache.
    Fresh(D),
    /// A newer refetch took precedence; this result was dropped.
    Superseded,
}

impl<D> FetchOutcome<D> {
    pub fn fresh(self) -> Option<D> {
        match self {
            FetchOutcome::Fresh(d) => Some(d),
            FetchOutcome::Superseded => None,
        }
    }
}

/// Cache of list queries over one resource.
pub struct QueryClient<T: RestEntity> {
    resource: SharedResource<T>,
    lists: Mutex<HashMap<QueryKey, ListQuery<T>>>,
}

impl<T: RestEntity> QueryClient<T> {
    pub fn new(resource: SharedResource<T>) -> Self {
        Self {
            resource,
            lists: Mutex::new(HashMap::new()),
        }
    }

    pub fn resource(&self) -> &SharedResource<T> {
        &self.resource
    }

    /// Returns the list query for `key`, creating it on first use. Parameters
    /// are fixed when the entry is created.
    pub fn list_query(&self, key: QueryKey, params: QueryParams) -> ListQuery<T> {
        let mut lists = self.lists.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = lists.get(&key) {
            if existing.params() != &params {
                warn!(
                    %key,
                    cached = ?existing.params(),
                    requested = ?params,
                    "List query already cached with other params; keeping the cached ones"
                );
            }
            return existing.clone();
        }
        let query = ListQuery::new(key.clone(), params, self.resource.clone());
        lists.insert(key, query.clone());
        query
    }

    /// Fetches one record fresh. Nothing is cached; every call is a round trip.
    #[instrument(skip(self), fields(key = %key))]
    pub async fn fetch_query(&self, key: &QueryKey, id: &str) -> Result<T, EngineError> {
        let result = self.resource.fetch(id).await;
        match &result {
            Ok(_) => debug!("Fetched"),
            Err(e) => warn!(error = %e, "Fetch failed"),
        }
        result
    }

    pub fn cached_keys(&self) -> Vec<QueryKey> {
        let lists = self.lists.lock().unwrap_or_else(PoisonError::into_inner);
        let mut keys: Vec<_> = lists.keys().cloned().collect();
        keys.sort();
        keys
    }
}

struct ListEntry<T: RestEntity> {
    key: QueryKey,
    params: QueryParams,
    resource: SharedResource<T>,
    state: watch::Sender<QueryState<Vec<T>>>,
    tickets: Mutex<Tickets>,
}

impl<T: RestEntity> ListEntry<T> {
    fn tickets(&self) -> MutexGuard<'_, Tickets> {
        self.tickets.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Refetch bookkeeping for one entry.
#[derive(Debug, Default)]
struct Tickets {
    issued: u64,
    applied: u64,
    in_flight: BTreeSet<u64>,
}

/// Withdraws a ticket whose refetch was dropped before it settled.
struct InFlight<'a, T: RestEntity> {
    entry: &'a ListEntry<T>,
    ticket: u64,
}

impl<T: RestEntity> Drop for InFlight<'_, T> {
    fn drop(&mut self) {
        let mut tickets = self.entry.tickets();
        if !tickets.in_flight.remove(&self.ticket) {
            return;
        }
        debug!(ticket = self.ticket, "Abandoned");
        if tickets.in_flight.is_empty() {
            self.entry.state.send_modify(QueryState::abandon_fetch);
        }
    }
}

/// Handle to one cached list. Clones share the same entry.
pub struct ListQuery<T: RestEntity> {
    inner: Arc<ListEntry<T>>,
}

impl<T: RestEntity> Clone for ListQuery<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: RestEntity> ListQuery<T> {
    fn new(key: QueryKey, params: QueryParams, resource: SharedResource<T>) -> Self {
        let (state, _) = watch::channel(QueryState::default());
        Self {
            inner: Arc::new(ListEntry {
                key,
                params,
                resource,
                state,
                tickets: Mutex::new(Tickets::default()),
            }),
        }
    }

    pub fn key(&self) -> &QueryKey {
        &self.inner.key
    }

    pub fn params(&self) -> &QueryParams {
        &self.inner.params
    }

    /// Watch the entry; the receiver sees every applied transition.
    pub fn subscribe(&self) -> watch::Receiver<QueryState<Vec<T>>> {
        self.inner.state.subscribe()
    }

    pub fn snapshot(&self) -> QueryState<Vec<T>> {
        self.inner.state.borrow().clone()
    }

    /// Marks the data stale and refetches.
    pub async fn invalidate(&self) -> Result<FetchOutcome<Vec<T>>, EngineError> {
        self.inner.state.send_modify(|state| state.is_stale = true);
        self.refetch().await
    }

    /// Issues a list request and applies its result unless a newer refetch
    /// is still in flight or has already been applied.
    #[instrument(skip(self), fields(key = %self.inner.key))]
    pub async fn refetch(&self) -> Result<FetchOutcome<Vec<T>>, EngineError> {
        let ticket = {
            let mut tickets = self.inner.tickets();
            tickets.issued += 1;
            let ticket = tickets.issued;
            tickets.in_flight.insert(ticket);
            self.inner.state.send_modify(QueryState::begin_fetch);
            ticket
        };
        let _in_flight = InFlight {
            entry: &self.inner,
            ticket,
        };
        debug!(ticket, "Fetching");

        let result = self.inner.resource.list(&self.inner.params).await;

        let applied = {
            let mut tickets = self.inner.tickets();
            tickets.in_flight.remove(&ticket);
            let newest = ticket > tickets.applied
                && tickets.in_flight.last().map_or(true, |&newer| newer < ticket);
            if newest {
                tickets.applied = ticket;
                self.inner.state.send_modify(|state| match &result {
                    Ok(items) => state.succeed(items.clone()),
                    Err(e) => state.fail(e.clone()),
                });
            } else if tickets.in_flight.is_empty() {
                self.inner.state.send_modify(QueryState::abandon_fetch);
            }
            newest
        };

        if !applied {
            debug!(ticket, "Superseded");
            return Ok(FetchOutcome::Superseded);
        }
        match result {
            Ok(items) => {
                debug!(ticket, count = items.len(), "Applied");
                Ok(FetchOutcome::Fresh(items))
            }
            Err(e) => {
                warn!(ticket, error = %e, "List failed");
                Err(e)
            }
        }
    }
}
