//! # Observability & Tracing
//!
//! [`setup_tracing`] installs a compact `tracing-subscriber` formatter filtered
//! by `RUST_LOG`. Module paths are hidden (`with_target(false)`); the
//! structured fields (`endpoint`, `collection`, `id`, `key`, `ticket`) carry
//! the context instead.
//!
//! ```bash
//! # Requests, mutations and store writes
//! RUST_LOG=info user-crud serve
//!
//! # Every fetch, refetch ticket and superseded response
//! RUST_LOG=debug user-crud list
//!
//! # Only the query layer
//! RUST_LOG=user_crud::query=debug user-crud list
//! ```
//!
//! With `RUST_LOG=debug` a superseded refetch looks like this:
//!
//! ```text
//! DEBUG refetch{key=users}: Fetching ticket=1
//! DEBUG refetch{key=users}: Fetching ticket=2
//! DEBUG refetch{key=users}: Applied ticket=2 count=12
//! DEBUG refetch{key=users}: Superseded ticket=1
//! ```
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}
