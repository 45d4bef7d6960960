//! Lifecycle state for queries and mutations.

use crate::framework::EngineError;
use std::fmt::{self, Display};

/// Observable phase of a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    /// Never fetched.
    Idle,
    /// First request in flight, no data yet.
    Loading,
    Success,
    /// Last attempt failed and there is no usable data.
    Error,
    /// Data present, a background refresh is in flight.
    Refetching,
}

/// A cache entry: last value, phase, last error and staleness.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryState<D> {
    pub status: QueryStatus,
    pub data: Option<D>,
    pub error: Option<EngineError>,
    pub is_stale: bool,
}

impl<D> Default for QueryState<D> {
    fn default() -> Self {
        Self {
            status: QueryStatus::Idle,
            data: None,
            error: None,
            is_stale: false,
        }
    }
}

impl<D> QueryState<D> {
    pub fn begin_fetch(&mut self) {
        self.status = if self.data.is_some() {
            QueryStatus::Refetching
        } else {
            QueryStatus::Loading
        };
    }

    pub fn succeed(&mut self, data: D) {
        self.status = QueryStatus::Success;
        self.data = Some(data);
        self.error = None;
        self.is_stale = false;
    }

    /// Records a failure. Existing data is kept (and marked stale) so the view
    /// does not drop back to an error screen after a failed refresh.
    pub fn fail(&mut self, error: EngineError) {
        self.error = Some(error);
        if self.data.is_some() {
            self.status = QueryStatus::Success;
            self.is_stale = true;
        } else {
            self.status = QueryStatus::Error;
        }
    }

    /// Undoes `begin_fetch` when no request is left in flight to settle it.
    pub fn abandon_fetch(&mut self) {
        if !self.is_fetching() {
            return;
        }
        self.status = if self.data.is_some() {
            QueryStatus::Success
        } else if self.error.is_some() {
            QueryStatus::Error
        } else {
            QueryStatus::Idle
        };
    }

    pub fn is_fetching(&self) -> bool {
        matches!(self.status, QueryStatus::Loading | QueryStatus::Refetching)
    }
}

/// Which write a mutation performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Create,
    Update,
    Delete,
}

impl Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MutationKind::Create => "create",
            MutationKind::Update => "update",
            MutationKind::Delete => "delete",
        };
        f.write_str(s)
    }
}

/// `Idle -> Pending -> (Success | Error) -> Settled`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationStatus {
    Idle,
    Pending,
    Success,
    Error,
    Settled,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MutationState {
    pub kind: MutationKind,
    pub status: MutationStatus,
    pub error: Option<EngineError>,
}

impl MutationState {
    pub fn idle(kind: MutationKind) -> Self {
        Self {
            kind,
            status: MutationStatus::Idle,
            error: None,
        }
    }

    pub fn start(&mut self) {
        self.status = MutationStatus::Pending;
        self.error = None;
    }

    pub fn resolve<V>(&mut self, result: &Result<V, EngineError>) {
        match result {
            Ok(_) => self.status = MutationStatus::Success,
            Err(e) => {
                self.status = MutationStatus::Error;
                self.error = Some(e.clone());
            }
        }
    }

    pub fn settle(&mut self) {
        self.status = MutationStatus::Settled;
    }

    pub fn is_pending(&self) -> bool {
        self.status == MutationStatus::Pending
    }
}
