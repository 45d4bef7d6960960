#![doc(html_logo_url = "https://www.rust-lang.org/logos/rust-logo-128x128.png")]
#![doc(html_favicon_url = "https://www.rust-lang.org/favicon.ico")]
//! # User CRUD
//!
//! > **A typed REST client and refetch-on-settle query layer for User records.**
//!
//! This crate pairs a generic CRUD client with the request lifecycle that drives a
//! list/create/update/delete screen, plus the mock backend and fixture seeder it
//! runs against.
//!
//! ## 🏗️ Design Philosophy
//!
//! ### The server owns the truth
//! The client never patches its cached list. Every create, update or delete ends by
//! refetching the list, so what is shown is always what the backend last returned.
//! The backend, not the client, assigns identifiers and timestamps.
//!
//! ### Latest refetch wins
//! Refetches may overlap. Each one draws a ticket, and a response whose ticket is no
//! longer the newest is discarded instead of overwriting fresher data.
//!
//! ### Injected, not global
//! The query cache is an ordinary value ([`QueryClient`](query::QueryClient)) built
//! around an `Arc<dyn Resource<T>>`. Production passes the HTTP
//! [`Engine`](framework::Engine); tests pass a
//! [`MockResource`](framework::mock::MockResource).
//!
//! ## 🗺️ Module Tour
//!
//! ### 1. The Engine ([`framework`])
//! - **Role**: Generic HTTP client for one REST collection, and the error type that
//!   keeps the status category.
//! - **Key items**: [`Engine`](framework::Engine), [`Resource`](framework::Resource),
//!   [`EngineError`](framework::EngineError).
//!
//! ### 2. The Orchestrator ([`query`])
//! - **Role**: List query state (loading, success, error, refetching) and the
//!   mutation lifecycle (idle, pending, success or error, settled).
//! - **Key items**: [`ListQuery`](query::ListQuery), [`Mutation`](query::Mutation).
//!
//! ### 3. Validation ([`validation`])
//! - **Role**: Field rules for a user draft and the touched-field form policy.
//!
//! ### 4. The Screen ([`screen`])
//! - **Role**: Headless list-page view model: modal, form, delete confirmation, toasts.
//!
//! ### 5. The Backend ([`mock_api`], [`runtime`], [`seed`])
//! - **Role**: Actor-owned JSON database served over HTTP, its lifecycle, and the
//!   fixture generator.
//!
//! ## 🚀 Quick Start
//!
//! ```bash
//! # Generate 200 users, serve them, then list through the client
//! user-crud seed 200
//! RUST_LOG=info user-crud serve &
//! user-crud list
//! ```

pub mod config;
pub mod domain;
pub mod framework;
pub mod mock_api;
pub mod query;
pub mod runtime;
pub mod screen;
pub mod seed;
pub mod validation;
