//! Pure data structures (DTOs) implementing the [`RestEntity`](crate::framework::RestEntity) trait.

pub mod user;

pub use user::*;
