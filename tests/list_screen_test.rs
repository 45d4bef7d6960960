use std::sync::Arc;
use tokio::sync::oneshot;
use user_crud::domain::{Gender, User};
use user_crud::framework::mock::{Call, MockResource};
use user_crud::framework::{DeleteReceipt, EngineError};
use user_crud::query::{FetchOutcome, QueryClient, QueryStatus};
use user_crud::screen::{ListView, Modal, SubmitOutcome, ToastLevel, UserListScreen};
use user_crud::validation::Field;

fn user(id: &str, first: &str, last: &str) -> User {
    User {
        id: id.into(),
        first_name: first.into(),
        last_name: last.into(),
        gender: Gender::Male,
        age: 41,
        email: None,
        created_at: None,
        updated_at: None,
    }
}

fn screen_with(mock: &MockResource<User>) -> UserListScreen {
    let client = Arc::new(QueryClient::new(Arc::new(mock.clone())));
    UserListScreen::new(client, "desc")
}

fn fill_valid(screen: &mut UserListScreen) {
    let form = screen.form_mut().expect("form should be open");
    form.set(Field::FirstName, "Edsger");
    form.set(Field::LastName, "Dijkstra");
    form.set(Field::Gender, "MALE");
    form.set(Field::Age, "72");
}

fn list_calls(mock: &MockResource<User>) -> usize {
    mock.calls()
        .iter()
        .filter(|c| matches!(c, Call::List(_)))
        .count()
}

#[tokio::test]
async fn test_empty_submit_shows_four_errors_and_sends_nothing() {
    let mock = MockResource::<User>::new("users");
    let mut screen = screen_with(&mock);

    screen.open_create();
    let outcome = screen.submit().await;

    let errors = match outcome {
        SubmitOutcome::Blocked(errors) => errors,
        other => panic!("expected blocked submit, got {:?}", other),
    };
    assert_eq!(errors.len(), 4);
    for field in Field::ALL {
        assert!(errors.contains_key(&field), "missing error for {field}");
    }
    assert_eq!(mock.call_count(), 0);
    // The form stays open for correction.
    assert!(matches!(screen.modal(), Modal::Form { .. }));
}

#[tokio::test]
async fn test_failed_create_closes_form_and_keeps_list() {
    let mock = MockResource::<User>::new("users");
    let mut screen = screen_with(&mock);
    let existing = vec![user("1", "Barbara", "Liskov")];

    mock.expect_list().return_ok(existing.clone());
    screen.mount().await.unwrap();

    screen.open_create();
    fill_valid(&mut screen);
    mock.expect_create()
        .return_err(EngineError::Network("connection refused".into()));
    mock.expect_list().return_ok(existing.clone());

    let outcome = screen.submit().await;
    assert!(matches!(outcome, SubmitOutcome::Failed(EngineError::Network(_))));
    assert!(matches!(screen.modal(), Modal::Closed));

    let toast = screen.toasts().last().unwrap();
    assert_eq!(toast.level, ToastLevel::Error);
    assert_eq!(toast.message, "User could not be created");

    match screen.view() {
        ListView::Table(rows) => {
            assert_eq!(rows.len(), 1);
            assert_eq!(rows[0].id, "1");
        }
        other => panic!("expected table, got {:?}", other),
    }
    mock.verify();
}

#[tokio::test]
async fn test_every_mutation_refetches_exactly_once() {
    let mock = MockResource::<User>::new("users");
    let mut screen = screen_with(&mock);
    let edsger = user("e", "Edsger", "Dijkstra");

    mock.expect_list().return_ok(vec![]);
    screen.mount().await.unwrap();
    assert_eq!(list_calls(&mock), 1);

    // create
    screen.open_create();
    fill_valid(&mut screen);
    mock.expect_create().return_ok(edsger.clone());
    mock.expect_list().return_ok(vec![edsger.clone()]);
    assert!(matches!(screen.submit().await, SubmitOutcome::Saved(_)));
    assert_eq!(list_calls(&mock), 2);
    assert_eq!(screen.toasts().last().unwrap().message, "User successfully created");

    // update
    mock.expect_fetch("e").return_ok(edsger.clone());
    screen.open_update("e").await.unwrap();
    screen.form_mut().unwrap().set(Field::LastName, "Dijkstra-W");
    let mut renamed = edsger.clone();
    renamed.last_name = "Dijkstra-W".into();
    mock.expect_update("e").return_ok(renamed.clone());
    mock.expect_list().return_ok(vec![renamed]);
    assert!(matches!(screen.submit().await, SubmitOutcome::Saved(_)));
    assert_eq!(list_calls(&mock), 3);

    // delete
    assert!(screen.open_delete_confirm("e"));
    mock.expect_delete("e").return_ok(DeleteReceipt {
        status: "OK".into(),
    });
    mock.expect_list().return_ok(vec![]);
    screen.confirm_delete().await.unwrap().unwrap();
    assert_eq!(list_calls(&mock), 4);
    assert_eq!(screen.toasts().last().unwrap().message, "User successfully deleted");
    assert_eq!(screen.view(), ListView::Empty);

    mock.verify();
}

#[tokio::test]
async fn test_superseded_refetch_does_not_revert_list() {
    let mock = MockResource::<User>::new("users");
    let screen = screen_with(&mock);

    let (release, held) = oneshot::channel();
    mock.expect_list()
        .until(held)
        .return_ok(vec![user("stale", "Stale", "Record")]);
    mock.expect_list()
        .return_ok(vec![user("fresh", "Fresh", "Record")]);

    let first = screen.mount();
    let second = async {
        let outcome = screen.list().refetch().await;
        release.send(()).unwrap();
        outcome
    };
    let (first, second) = tokio::join!(first, second);
    first.unwrap();
    assert!(matches!(second.unwrap(), FetchOutcome::Fresh(_)));

    match screen.view() {
        ListView::Table(rows) => assert_eq!(rows[0].id, "fresh"),
        other => panic!("expected table, got {:?}", other),
    }
}

#[tokio::test]
async fn test_rows_stay_visible_while_refetching() {
    let mock = MockResource::<User>::new("users");
    let screen = screen_with(&mock);

    mock.expect_list().return_ok(vec![user("1", "Alan", "Turing")]);
    screen.mount().await.unwrap();

    let (release, held) = oneshot::channel();
    mock.expect_list()
        .until(held)
        .return_ok(vec![user("1", "Alan", "Turing"), user("2", "Alonzo", "Church")]);

    let refresh = screen.list().refetch();
    let observe = async {
        tokio::task::yield_now().await;
        assert!(screen.is_refetching());
        match screen.view() {
            ListView::Table(rows) => assert_eq!(rows.len(), 1),
            other => panic!("expected table during refetch, got {:?}", other),
        }
        release.send(()).unwrap();
    };
    let (refreshed, ()) = tokio::join!(refresh, observe);
    refreshed.unwrap();

    assert!(!screen.is_refetching());
    assert!(matches!(screen.view(), ListView::Table(rows) if rows.len() == 2));
    mock.verify();
}

#[tokio::test]
async fn test_failed_refresh_keeps_last_good_rows() {
    let mock = MockResource::<User>::new("users");
    let mut screen = screen_with(&mock);

    mock.expect_list().return_ok(vec![user("1", "Donald", "Knuth")]);
    screen.mount().await.unwrap();

    assert!(screen.open_delete_confirm("1"));
    mock.expect_delete("1")
        .return_err(EngineError::ServerError { status: 503 });
    mock.expect_list()
        .return_err(EngineError::ServerError { status: 503 });
    let result = screen.confirm_delete().await.unwrap();
    assert_eq!(result.unwrap_err(), EngineError::ServerError { status: 503 });

    assert_eq!(screen.toasts().last().unwrap().message, "User could not be deleted");
    let state = screen.list().snapshot();
    assert_eq!(state.status, QueryStatus::Success);
    assert!(state.is_stale);
    assert!(matches!(screen.view(), ListView::Table(rows) if rows.len() == 1));
}
