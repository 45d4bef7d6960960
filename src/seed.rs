//! Fixture generation for the mock API database.
//!
//! Produces `{ "users": [...] }` with randomized records that all pass the
//! user schema. An invalid count is rejected before anything is generated or
//! written.

use crate::domain::{Gender, User};
use crate::mock_api::db::{write_json_pretty, DEFAULT_COLLECTION};
use chrono::Utc;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;
use uuid::Uuid;

pub const MAX_SEED_COUNT: usize = 14_999;

const MALE_NAMES: &[&str] = &[
    "James", "Robert", "Michael", "William", "David", "Richard", "Joseph", "Thomas",
    "Charles", "Christopher", "Daniel", "Matthew", "Anthony", "Donald", "Steven", "Andrew",
    "Joshua", "Kenneth", "Kevin", "Brian", "George", "Timothy", "Ronald", "Edward",
];

const FEMALE_NAMES: &[&str] = &[
    "Maria", "Patricia", "Jennifer", "Linda", "Elizabeth", "Barbara", "Susan", "Jessica",
    "Sarah", "Karen", "Nancy", "Margaret", "Sandra", "Ashley", "Kimberly", "Emily",
    "Donna", "Michelle", "Carol", "Amanda", "Melissa", "Deborah", "Stephanie", "Rebecca",
];

const LAST_NAMES: &[&str] = &[
    "Smith", "Johnson", "Williams", "Brown", "Jones", "Garcia", "Miller", "Davis",
    "Rodriguez", "Martinez", "Hernandez", "Lopez", "Gonzalez", "Wilson", "Anderson",
    "Thomas", "Taylor", "Moore", "Jackson", "Martin", "Thompson", "White", "Harris",
    "Sanchez", "Clark", "Ramirez", "Lewis", "Robinson", "Walker", "Young",
];

const EMAIL_DOMAINS: &[&str] = &["example.com", "example.org", "example.net"];

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("Provide a valid positive number between 1 and 15,000")]
    InvalidCount(String),
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to encode users: {0}")]
    Json(#[from] serde_json::Error),
}

/// Accepts whole numbers in `1..=MAX_SEED_COUNT`.
pub fn parse_count(raw: &str) -> Result<usize, SeedError> {
    raw.trim()
        .parse::<usize>()
        .ok()
        .filter(|n| (1..=MAX_SEED_COUNT).contains(n))
        .ok_or_else(|| SeedError::InvalidCount(raw.to_string()))
}

pub fn generate_user<R: Rng + ?Sized>(rng: &mut R) -> User {
    let gender = *Gender::ALL.choose(rng).unwrap_or(&Gender::Female);
    let first_names = match gender {
        Gender::Male => MALE_NAMES,
        Gender::Female => FEMALE_NAMES,
    };
    let first_name = first_names.choose(rng).copied().unwrap_or("Alexis");
    let last_name = LAST_NAMES.choose(rng).copied().unwrap_or("Morgan");
    let domain = EMAIL_DOMAINS.choose(rng).copied().unwrap_or("example.com");
    let now = Utc::now();

    User {
        id: Uuid::new_v4().to_string(),
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        gender,
        age: rng.gen_range(gender.age_range()),
        email: Some(User::derive_email(first_name, last_name, domain)),
        created_at: Some(now),
        updated_at: Some(now),
    }
}

pub fn generate_users<R: Rng + ?Sized>(count: usize, rng: &mut R) -> Vec<User> {
    (0..count).map(|_| generate_user(&mut *rng)).collect()
}

pub fn write_seed_file(path: &Path, users: &[User]) -> Result<(), SeedError> {
    let document = BTreeMap::from([(DEFAULT_COLLECTION, serde_json::to_value(users)?)]);
    write_json_pretty(path, &document).map_err(|source| SeedError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Validates `raw_count`, generates that many users and writes them to `output`.
pub fn run_seed(raw_count: &str, output: &Path) -> Result<usize, SeedError> {
    let count = parse_count(raw_count)?;
    info!(count, "Generating users");
    let users = generate_users(count, &mut rand::thread_rng());
    write_seed_file(output, &users)?;
    info!(count, path = %output.display(), "Seed file written");
    Ok(count)
}
