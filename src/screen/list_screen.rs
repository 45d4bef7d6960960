//! # User List Screen
//!
//! Headless view model for the users page: the cached list, the create/update
//! form modal, the delete confirmation and the toasts. Rendering is left to
//! the caller; [`UserListScreen::view`] says what to draw.
//!
//! Every write goes through a [`Mutation`], so each one closes the modal,
//! raises a toast and then refetches the list exactly once.

use crate::domain::{User, UserUpdate};
use crate::framework::{DeleteReceipt, EngineError, QueryParams};
use crate::query::{ListQuery, Mutation, MutationKind, QueryClient, QueryKey, QueryStatus};
use crate::screen::notification::Toasts;
use crate::validation::{FieldErrors, FormState};
use std::sync::Arc;
use tracing::debug;

pub const ENDPOINT: &str = "users";
pub const ORDER_PARAM: &str = "_order";

pub const CREATED: &str = "User successfully created";
pub const UPDATED: &str = "User successfully updated";
pub const DELETED: &str = "User successfully deleted";
pub const CREATE_FAILED: &str = "User could not be created";
pub const UPDATE_FAILED: &str = "User could not be updated";
pub const DELETE_FAILED: &str = "User could not be deleted";
pub const UNKNOWN_ERROR: &str = "An unknown error occurred";

#[derive(Debug, Clone, PartialEq)]
pub enum FormMode {
    Create,
    /// Editing the record as fetched when the form opened.
    Update(User),
}

impl FormMode {
    pub fn title(&self) -> &'static str {
        match self {
            FormMode::Create => "Create user",
            FormMode::Update(_) => "Update user",
        }
    }
}

#[derive(Debug, Clone)]
pub enum Modal {
    Closed,
    Form { mode: FormMode, form: FormState },
    ConfirmDelete { user: User },
}

/// One table row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRow {
    pub id: String,
    pub gender: String,
    pub first_name: String,
    pub last_name: String,
    pub age: u32,
}

impl From<&User> for UserRow {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            gender: user.gender.label().to_string(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            age: user.age,
        }
    }
}

/// What the page body shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListView {
    Loading,
    Error,
    Empty,
    Table(Vec<UserRow>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// No form is open.
    NoForm,
    /// Validation failed; nothing was sent.
    Blocked(FieldErrors),
    Saved(User),
    Failed(EngineError),
}

pub struct UserListScreen {
    client: Arc<QueryClient<User>>,
    list: ListQuery<User>,
    create: Mutation<User>,
    update: Mutation<User>,
    delete: Mutation<User>,
    modal: Modal,
    toasts: Toasts,
}

impl UserListScreen {
    /// `order` is sent as `_order` on every list request.
    pub fn new(client: Arc<QueryClient<User>>, order: &str) -> Self {
        let params = QueryParams::from([(ORDER_PARAM.to_string(), order.to_string())]);
        let list = client.list_query(QueryKey::new([ENDPOINT]), params);
        Self {
            create: Mutation::new(MutationKind::Create, list.clone()),
            update: Mutation::new(MutationKind::Update, list.clone()),
            delete: Mutation::new(MutationKind::Delete, list.clone()),
            client,
            list,
            modal: Modal::Closed,
            toasts: Toasts::default(),
        }
    }

    pub fn list(&self) -> &ListQuery<User> {
        &self.list
    }

    /// Initial load. A failure shows up as [`ListView::Error`].
    pub async fn mount(&self) -> Result<(), EngineError> {
        self.list.refetch().await.map(|_| ())
    }

    pub fn view(&self) -> ListView {
        let state = self.list.snapshot();
        match (state.data, state.status) {
            (Some(users), _) if users.is_empty() => ListView::Empty,
            (Some(users), _) => ListView::Table(users.iter().map(UserRow::from).collect()),
            (None, QueryStatus::Error) => ListView::Error,
            (None, _) => ListView::Loading,
        }
    }

    /// True while stale rows are shown during a background refresh.
    pub fn is_refetching(&self) -> bool {
        self.list.snapshot().status == QueryStatus::Refetching
    }

    pub fn modal(&self) -> &Modal {
        &self.modal
    }

    pub fn toasts(&self) -> &Toasts {
        &self.toasts
    }

    pub fn dismiss_toast(&mut self, id: u64) -> bool {
        self.toasts.dismiss(id)
    }

    pub fn open_create(&mut self) {
        self.modal = Modal::Form {
            mode: FormMode::Create,
            form: FormState::new(),
        };
    }

    /// Fetches the record fresh and opens the edit form on it.
    pub async fn open_update(&mut self, id: &str) -> Result<(), EngineError> {
        let key = self.list.key().child(id);
        match self.client.fetch_query(&key, id).await {
            Ok(user) => {
                self.modal = Modal::Form {
                    form: FormState::from_user(&user),
                    mode: FormMode::Update(user),
                };
                Ok(())
            }
            Err(e) => {
                self.toasts.push_error(UNKNOWN_ERROR);
                Err(e)
            }
        }
    }

    pub fn form_mut(&mut self) -> Option<&mut FormState> {
        match &mut self.modal {
            Modal::Form { form, .. } => Some(form),
            _ => None,
        }
    }

    /// Validates the open form and, if it passes, saves it.
    pub async fn submit(&mut self) -> SubmitOutcome {
        let (mode, data) = match &mut self.modal {
            Modal::Form { mode, form } => match form.submit() {
                Ok(data) => (mode.clone(), data),
                Err(errors) => {
                    debug!(invalid = errors.len(), "Submit blocked");
                    return SubmitOutcome::Blocked(errors);
                }
            },
            _ => return SubmitOutcome::NoForm,
        };

        let resource = self.client.resource().clone();
        let modal = &mut self.modal;
        let toasts = &mut self.toasts;
        let result = match mode {
            FormMode::Create => {
                self.create
                    .mutate(resource.create(data), |r| {
                        *modal = Modal::Closed;
                        match r {
                            Ok(_) => toasts.push_success(CREATED),
                            Err(_) => toasts.push_error(CREATE_FAILED),
                        };
                    })
                    .await
            }
            FormMode::Update(current) => {
                let changes = UserUpdate::from_changes(&current, &data);
                self.update
                    .mutate(resource.update(&current.id, changes), |r| {
                        *modal = Modal::Closed;
                        match r {
                            Ok(_) => toasts.push_success(UPDATED),
                            Err(_) => toasts.push_error(UPDATE_FAILED),
                        };
                    })
                    .await
            }
        };

        match result {
            Ok(user) => SubmitOutcome::Saved(user),
            Err(e) => SubmitOutcome::Failed(e),
        }
    }

    /// Asks for confirmation before deleting a listed user. Returns false if
    /// the id is not in the current list.
    pub fn open_delete_confirm(&mut self, id: &str) -> bool {
        let user = self
            .list
            .snapshot()
            .data
            .and_then(|users| users.into_iter().find(|u| u.id == id));
        match user {
            Some(user) => {
                self.modal = Modal::ConfirmDelete { user };
                true
            }
            None => false,
        }
    }

    /// Deletes the user awaiting confirmation. `None` if nothing was pending.
    pub async fn confirm_delete(&mut self) -> Option<Result<DeleteReceipt, EngineError>> {
        let id = match &self.modal {
            Modal::ConfirmDelete { user } => user.id.clone(),
            _ => return None,
        };

        let resource = self.client.resource().clone();
        let modal = &mut self.modal;
        let toasts = &mut self.toasts;
        let result = self
            .delete
            .mutate(resource.delete(&id), |r| {
                *modal = Modal::Closed;
                match r {
                    Ok(_) => toasts.push_success(DELETED),
                    Err(_) => toasts.push_error(DELETE_FAILED),
                };
            })
            .await;
        Some(result)
    }

    /// Closes whatever modal is open without sending anything.
    pub fn cancel(&mut self) {
        self.modal = Modal::Closed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Gender;
    use crate::framework::mock::{Call, MockResource};
    use crate::validation::Field;

    fn ada() -> User {
        User {
            id: "ada".into(),
            first_name: "Augusta".into(),
            last_name: "Lovelace".into(),
            gender: Gender::Female,
            age: 36,
            email: None,
            created_at: None,
            updated_at: None,
        }
    }

    fn screen(mock: &MockResource<User>) -> UserListScreen {
        let client = Arc::new(QueryClient::new(Arc::new(mock.clone())));
        UserListScreen::new(client, "desc")
    }

    #[tokio::test]
    async fn test_view_progresses_from_loading_to_table() {
        let mock = MockResource::<User>::new(ENDPOINT);
        let screen = screen(&mock);
        assert_eq!(screen.view(), ListView::Loading);

        mock.expect_list().return_ok(vec![ada()]);
        screen.mount().await.unwrap();

        match screen.view() {
            ListView::Table(rows) => {
                assert_eq!(rows.len(), 1);
                assert_eq!(rows[0].gender, "Female");
            }
            other => panic!("expected table, got {:?}", other),
        }
        assert_eq!(
            mock.calls(),
            vec![Call::List(QueryParams::from([(
                "_order".to_string(),
                "desc".to_string()
            )]))]
        );
    }

    #[tokio::test]
    async fn test_failed_first_load_shows_error_view() {
        let mock = MockResource::<User>::new(ENDPOINT);
        let screen = screen(&mock);
        mock.expect_list()
            .return_err(EngineError::ServerError { status: 500 });
        assert!(screen.mount().await.is_err());
        assert_eq!(screen.view(), ListView::Error);
    }

    #[tokio::test]
    async fn test_update_sends_only_changed_fields() {
        let mock = MockResource::<User>::new(ENDPOINT);
        let mut screen = screen(&mock);
        mock.expect_fetch("ada").return_ok(ada());
        screen.open_update("ada").await.unwrap();
        match screen.modal() {
            Modal::Form { mode, .. } => assert_eq!(mode.title(), "Update user"),
            other => panic!("expected form, got {:?}", other),
        }

        screen.form_mut().unwrap().set(Field::Age, "37");
        let mut updated = ada();
        updated.age = 37;
        mock.expect_update("ada").return_ok(updated);
        mock.expect_list().return_ok(vec![]);

        let outcome = screen.submit().await;
        assert!(matches!(outcome, SubmitOutcome::Saved(ref u) if u.age == 37));
        assert!(matches!(screen.modal(), Modal::Closed));
        assert_eq!(screen.toasts().last().unwrap().message, UPDATED);
        mock.verify();
    }

    #[tokio::test]
    async fn test_failed_edit_fetch_raises_unknown_error_toast() {
        let mock = MockResource::<User>::new(ENDPOINT);
        let mut screen = screen(&mock);
        mock.expect_fetch("ghost").return_err(EngineError::NotFound {
            resource: "users/ghost".into(),
        });
        assert!(screen.open_update("ghost").await.is_err());
        assert!(matches!(screen.modal(), Modal::Closed));
        assert_eq!(screen.toasts().last().unwrap().message, UNKNOWN_ERROR);
    }

    #[tokio::test]
    async fn test_delete_requires_listed_user() {
        let mock = MockResource::<User>::new(ENDPOINT);
        let mut screen = screen(&mock);
        mock.expect_list().return_ok(vec![ada()]);
        screen.mount().await.unwrap();

        assert!(!screen.open_delete_confirm("nobody"));
        assert!(screen.open_delete_confirm("ada"));
        screen.cancel();
        assert!(screen.confirm_delete().await.is_none());
        assert_eq!(mock.call_count(), 1);
    }
}
