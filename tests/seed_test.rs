use url::Url;
use user_crud::config::Settings;
use user_crud::domain::User;
use user_crud::framework::{Engine, QueryParams};
use user_crud::runtime::ApiSystem;
use user_crud::seed::{run_seed, SeedError};
use user_crud::validation::{validate, UserDraft};

#[test]
fn test_out_of_range_counts_write_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("db.json");

    for count in ["0", "20000", "abc"] {
        let err = run_seed(count, &output).unwrap_err();
        assert!(matches!(err, SeedError::InvalidCount(_)));
        assert_eq!(
            err.to_string(),
            "Provide a valid positive number between 1 and 15,000"
        );
        assert!(!output.exists(), "count {count} wrote a file");
    }
}

#[test]
fn test_seed_file_holds_schema_valid_users() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("mock-api").join("db.json");

    assert_eq!(run_seed("25", &output).unwrap(), 25);

    let text = std::fs::read_to_string(&output).unwrap();
    assert!(text.starts_with("{\n    \"users\": ["));
    let doc: serde_json::Value = serde_json::from_str(&text).unwrap();
    let users: Vec<User> = serde_json::from_value(doc["users"].clone()).unwrap();
    assert_eq!(users.len(), 25);
    for user in &users {
        assert!(validate(&UserDraft::from_user(user)).is_ok());
        assert!(user.created_at.is_some());
        assert!(user.email.is_some());
    }
}

#[tokio::test]
async fn test_seeded_database_is_served() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("db.json");
    run_seed("12", &db_path).unwrap();

    let settings = Settings {
        bind_addr: "127.0.0.1:0".to_string(),
        db_path,
        ..Settings::default()
    };
    let system = ApiSystem::start(&settings).await.unwrap();
    let engine: Engine<User> = Engine::new(Url::parse(&system.base_url()).unwrap(), "users");

    let users = engine.list(&QueryParams::new()).await.unwrap();
    assert_eq!(users.len(), 12);

    system.shutdown().await.unwrap();
}
