//! Query/mutation orchestration.
//!
//! Tracks the lifecycle of list queries and mutations over a [`Resource`](crate::framework::Resource)
//! and refetches the list after every mutation settles.

pub mod client;
pub mod key;
pub mod mutation;
pub mod state;

pub use client::{FetchOutcome, ListQuery, QueryClient};
pub use key::QueryKey;
pub use mutation::Mutation;
pub use state::{MutationKind, MutationState, MutationStatus, QueryState, QueryStatus};
