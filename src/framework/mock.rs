//! # Mock Resource & Testing Guide
//!
//! `MockResource<T>` implements the same [`Resource<T>`] seam as the HTTP
//! [`Engine`](crate::framework::Engine) but answers from a queue of expectations.
//! It lets you test the query layer and the list screen without a server.
//!
//! ## When to use Mocks vs a Real Server
//!
//! | Feature | MockResource | Engine + mock API |
//! |---------|--------------|-------------------|
//! | **Speed** | Instant (in-memory) | Fast (binds a local port) |
//! | **Determinism** | Full, including response order | Subject to the scheduler |
//! | **State** | None (expectations) | Real collection state |
//! | **Error Injection** | Easy (`return_err`) | Hard |
//!
//! ## Controlling completion order
//!
//! An expectation can be held until the test releases it. This is how the
//! "latest refetch wins" property is exercised deterministically:
//!
//! ```rust
//! use tokio::sync::oneshot;
//! use user_crud::domain::User;
//! use user_crud::framework::mock::MockResource;
//! use user_crud::framework::{QueryParams, Resource};
//!
//! #[tokio::main]
//! async fn main() {
//!     let mock = MockResource::<User>::new("users");
//!     let (release, held) = oneshot::channel();
//!     mock.expect_list().until(held).return_ok(vec![]);
//!
//!     let pending = tokio::spawn({
//!         let mock = mock.clone();
//!         async move { mock.list(&QueryParams::new()).await }
//!     });
//!     release.send(()).unwrap();
//!     assert!(pending.await.unwrap().unwrap().is_empty());
//!     mock.verify();
//! }
//! ```

use crate::framework::engine::{DeleteReceipt, QueryParams};
use crate::framework::entity::RestEntity;
use crate::framework::error::EngineError;
use crate::framework::resource::Resource;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

/// A request observed by the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    List(QueryParams),
    Fetch(String),
    Create,
    Update(String),
    Delete(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Expected {
    List,
    Fetch(String),
    Create,
    Update(String),
    Delete(String),
}

impl Expected {
    fn matches(&self, call: &Call) -> bool {
        match (self, call) {
            (Expected::List, Call::List(_)) | (Expected::Create, Call::Create) => true,
            (Expected::Fetch(a), Call::Fetch(b))
            | (Expected::Update(a), Call::Update(b))
            | (Expected::Delete(a), Call::Delete(b)) => a == b,
            _ => false,
        }
    }
}

enum Reply<T> {
    Many(Result<Vec<T>, EngineError>),
    One(Result<T, EngineError>),
    Deleted(Result<DeleteReceipt, EngineError>),
}

struct Expectation<T> {
    expected: Expected,
    reply: Reply<T>,
    hold: Option<oneshot::Receiver<()>>,
}

type Queue<T> = Arc<Mutex<VecDeque<Expectation<T>>>>;

/// A mock collection with expectation tracking for fluent testing.
///
/// # Example
/// ```ignore
/// let mock = MockResource::<User>::new("users");
/// mock.expect_list().return_ok(vec![alice]);
/// mock.expect_create().return_err(EngineError::Network("down".into()));
///
/// let resource: SharedResource<User> = Arc::new(mock.clone());
/// // Use resource in tests...
/// mock.verify(); // Ensures all expectations were met
/// ```
#[derive(Clone)]
pub struct MockResource<T: RestEntity> {
    name: String,
    expectations: Queue<T>,
    calls: Arc<Mutex<Vec<Call>>>,
}

impl<T: RestEntity> MockResource<T> {
    /// Creates a new mock with no expectations.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            expectations: Arc::new(Mutex::new(VecDeque::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Expects a `list` call (any parameters).
    pub fn expect_list(&self) -> ExpectationBuilder<T, Vec<T>> {
        self.builder(Expected::List, Reply::Many)
    }

    /// Expects a `fetch` of `id`.
    pub fn expect_fetch(&self, id: impl Into<String>) -> ExpectationBuilder<T, T> {
        self.builder(Expected::Fetch(id.into()), Reply::One)
    }

    /// Expects a `create` call.
    pub fn expect_create(&self) -> ExpectationBuilder<T, T> {
        self.builder(Expected::Create, Reply::One)
    }

    /// Expects an `update` of `id`.
    pub fn expect_update(&self, id: impl Into<String>) -> ExpectationBuilder<T, T> {
        self.builder(Expected::Update(id.into()), Reply::One)
    }

    /// Expects a `delete` of `id`.
    pub fn expect_delete(&self, id: impl Into<String>) -> ExpectationBuilder<T, DeleteReceipt> {
        self.builder(Expected::Delete(id.into()), Reply::Deleted)
    }

    fn builder<V>(
        &self,
        expected: Expected,
        wrap: fn(Result<V, EngineError>) -> Reply<T>,
    ) -> ExpectationBuilder<T, V> {
        ExpectationBuilder {
            expected,
            hold: None,
            wrap,
            expectations: self.expectations.clone(),
        }
    }

    /// Every request received so far, in arrival order.
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of requests received so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Verifies that all expectations were met.
    pub fn verify(&self) {
        let exps = self.expectations.lock().unwrap();
        if !exps.is_empty() {
            panic!("Not all expectations were met. {} remaining", exps.len());
        }
    }

    fn next(&self, call: Call) -> (Reply<T>, Option<oneshot::Receiver<()>>) {
        self.calls.lock().unwrap().push(call.clone());
        let expectation = self.expectations.lock().unwrap().pop_front();
        match expectation {
            Some(exp) if exp.expected.matches(&call) => (exp.reply, exp.hold),
            Some(exp) => panic!(
                "Unexpected request {:?}; expected {:?}",
                call, exp.expected
            ),
            None => panic!("Unexpected request {:?}; no expectations left", call),
        }
    }

    async fn answer(&self, call: Call) -> Reply<T> {
        let (reply, hold) = self.next(call);
        if let Some(hold) = hold {
            // A dropped sender releases the reply as well.
            let _ = hold.await;
        }
        reply
    }
}

/// Builder for a single expectation.
pub struct ExpectationBuilder<T: RestEntity, V> {
    expected: Expected,
    hold: Option<oneshot::Receiver<()>>,
    wrap: fn(Result<V, EngineError>) -> Reply<T>,
    expectations: Queue<T>,
}

impl<T: RestEntity, V> ExpectationBuilder<T, V> {
    /// Delays the reply until `release` fires (or its sender is dropped).
    pub fn until(mut self, release: oneshot::Receiver<()>) -> Self {
        self.hold = Some(release);
        self
    }

    /// Sets the expectation to return a successful result.
    pub fn return_ok(self, value: V) {
        self.push(Ok(value));
    }

    /// Sets the expectation to return an error.
    pub fn return_err(self, error: EngineError) {
        self.push(Err(error));
    }

    fn push(self, result: Result<V, EngineError>) {
        let mut exps = self.expectations.lock().unwrap();
        exps.push_back(Expectation {
            expected: self.expected,
            reply: (self.wrap)(result),
            hold: self.hold,
        });
    }
}

#[async_trait]
impl<T: RestEntity> Resource<T> for MockResource<T> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn list(&self, params: &QueryParams) -> Result<Vec<T>, EngineError> {
        match self.answer(Call::List(params.clone())).await {
            Reply::Many(result) => result,
            _ => panic!("list expectation carried a non-list reply"),
        }
    }

    async fn fetch(&self, id: &str) -> Result<T, EngineError> {
        match self.answer(Call::Fetch(id.to_string())).await {
            Reply::One(result) => result,
            _ => panic!("fetch expectation carried a non-record reply"),
        }
    }

    async fn create(&self, _data: T::Create) -> Result<T, EngineError> {
        match self.answer(Call::Create).await {
            Reply::One(result) => result,
            _ => panic!("create expectation carried a non-record reply"),
        }
    }

    async fn update(&self, id: &str, _data: T::Update) -> Result<T, EngineError> {
        match self.answer(Call::Update(id.to_string())).await {
            Reply::One(result) => result,
            _ => panic!("update expectation carried a non-record reply"),
        }
    }

    async fn delete(&self, id: &str) -> Result<DeleteReceipt, EngineError> {
        match self.answer(Call::Delete(id.to_string())).await {
            Reply::Deleted(result) => result,
            _ => panic!("delete expectation carried a non-delete reply"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Gender, User, UserCreate};

    fn user(id: &str) -> User {
        User {
            id: id.into(),
            first_name: "Grace".into(),
            last_name: "Hopper".into(),
            gender: Gender::Female,
            age: 85,
            email: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_mock_resource_with_expectations() {
        let mock = MockResource::<User>::new("users");
        mock.expect_create().return_ok(user("u-1"));
        mock.expect_fetch("u-1").return_ok(user("u-1"));

        let created = mock
            .create(UserCreate {
                first_name: "Grace".into(),
                last_name: "Hopper".into(),
                gender: Gender::Female,
                age: 85,
                email: None,
            })
            .await
            .unwrap();
        assert_eq!(created.id, "u-1");

        let fetched = mock.fetch("u-1").await.unwrap();
        assert_eq!(fetched.last_name, "Hopper");

        assert_eq!(mock.calls(), vec![Call::Create, Call::Fetch("u-1".into())]);
        mock.verify();
    }

    #[tokio::test]
    async fn test_mock_resource_injects_errors() {
        let mock = MockResource::<User>::new("users");
        mock.expect_delete("gone")
            .return_err(EngineError::NotFound {
                resource: "users/gone".into(),
            });

        let result = mock.delete("gone").await;
        assert!(matches!(result, Err(EngineError::NotFound { .. })));
    }

    #[tokio::test]
    #[should_panic(expected = "Unexpected request")]
    async fn test_mock_resource_rejects_mismatched_id() {
        let mock = MockResource::<User>::new("users");
        mock.expect_fetch("a").return_ok(user("a"));
        let _ = mock.fetch("b").await;
    }
}
