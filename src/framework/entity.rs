//! # RestEntity Trait
//!
//! The `RestEntity` trait defines the contract every record type must satisfy to be
//! served through the generic [`Engine`](crate::framework::Engine). It names the
//! create and update payloads as associated types so a `User` engine only accepts
//! `UserCreate`/`UserUpdate` bodies; the compiler rejects anything else.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;

/// Trait that any record type must implement to be accessed through an `Engine`.
///
/// The record itself is what the server echoes back. Identifiers and timestamps
/// are part of the record but never part of [`RestEntity::Create`]: the backing
/// store assigns them.
pub trait RestEntity: Clone + Debug + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Body sent on `POST`.
    type Create: Serialize + Debug + Send + Sync;

    /// Body sent on `PATCH`. Fields left out are not transmitted.
    type Update: Serialize + Debug + Send + Sync;

    /// The server-assigned identifier.
    fn id(&self) -> &str;
}
