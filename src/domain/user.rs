use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::ops::RangeInclusive;
use std::str::FromStr;

use crate::framework::RestEntity;

/// Youngest age accepted for any gender.
pub const MIN_AGE: u32 = 18;

/// Oldest age accepted when the gender is not yet known.
pub const MAX_AGE: u32 = 117;

/// Represents a user record as served by the `users` collection.
///
/// # Server-assigned fields
/// `id`, `created_at` and `updated_at` are stamped by the backing store.
/// The client never originates them; it treats the echoed record as the
/// source of truth.
///
/// See [`impl RestEntity for User`](#impl-RestEntity-for-User) for the
/// create ([`UserCreate`]) and update ([`UserUpdate`]) payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub gender: Gender,
    pub age: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl User {
    /// Derives the contact address used for generated records.
    ///
    /// Non-alphanumeric characters are dropped and the result is lowercased,
    /// e.g. `("Anne-Marie", "Quinn", "example.com")` becomes
    /// `annemarie.quinn@example.com`.
    pub fn derive_email(first_name: &str, last_name: &str, domain: &str) -> String {
        let clean = |s: &str| -> String {
            s.chars()
                .filter(|c| c.is_ascii_alphanumeric())
                .collect::<String>()
                .to_lowercase()
        };
        format!("{}.{}@{}", clean(first_name), clean(last_name), domain)
    }
}

/// The two enumerated genders a record may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub const ALL: [Gender; 2] = [Gender::Male, Gender::Female];

    /// Wire value, e.g. `MALE`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "MALE",
            Gender::Female => "FEMALE",
        }
    }

    /// Display label used in tables, e.g. `Male`.
    pub fn label(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
        }
    }

    /// Inclusive age bound conditioned on this gender.
    pub fn age_range(&self) -> RangeInclusive<u32> {
        match self {
            Gender::Male => MIN_AGE..=112,
            Gender::Female => MIN_AGE..=117,
        }
    }
}

impl Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string is not one of the enumerated genders.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("unknown gender: {0}")]
pub struct UnknownGender(pub String);

impl FromStr for Gender {
    type Err = UnknownGender;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MALE" => Ok(Gender::Male),
            "FEMALE" => Ok(Gender::Female),
            other => Err(UnknownGender(other.to_string())),
        }
    }
}

/// Payload for creating a new user.
///
/// Carries no identifier or timestamps; the server assigns them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCreate {
    pub first_name: String,
    pub last_name: String,
    pub gender: Gender,
    pub age: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Partial update payload. Only `Some` fields are transmitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl UserUpdate {
    /// Builds an update holding only the fields of `edited` that differ from `current`.
    pub fn from_changes(current: &User, edited: &UserCreate) -> Self {
        let changed = |old: &String, new: &String| (old != new).then(|| new.clone());
        Self {
            first_name: changed(&current.first_name, &edited.first_name),
            last_name: changed(&current.last_name, &edited.last_name),
            gender: (current.gender != edited.gender).then_some(edited.gender),
            age: (current.age != edited.age).then_some(edited.age),
            email: match (&current.email, &edited.email) {
                (old, Some(new)) if old.as_ref() != Some(new) => Some(new.clone()),
                _ => None,
            },
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl RestEntity for User {
    type Create = UserCreate;
    type Update = UserUpdate;

    fn id(&self) -> &str {
        &self.id
    }
}
