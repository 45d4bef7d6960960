//! # User Schema
//!
//! Field rules for a user draft. Raw input is kept as text so that "missing",
//! "not a number" and "out of range" can be told apart.
//!
//! | Field | Rules (checked in order) |
//! |-------|--------------------------|
//! | `firstName`, `lastName` | required, at least 5 and at most 20 characters |
//! | `gender` | required, one of `MALE`, `FEMALE` |
//! | `age` | required, whole number, positive, then the bound for the chosen gender (or 18..=117 while gender is unknown) |
//!
//! Only `age` looks at another field.

use crate::domain::{Gender, User, UserCreate, MAX_AGE, MIN_AGE};
use std::collections::BTreeMap;
use std::fmt::{self, Display};

pub const NAME_MIN_LEN: usize = 5;
pub const NAME_MAX_LEN: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    FirstName,
    LastName,
    Gender,
    Age,
}

impl Field {
    pub const ALL: [Field; 4] = [Field::FirstName, Field::LastName, Field::Gender, Field::Age];

    /// Wire name of the field.
    pub fn name(&self) -> &'static str {
        match self {
            Field::FirstName => "firstName",
            Field::LastName => "lastName",
            Field::Gender => "gender",
            Field::Age => "age",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Field::FirstName => "First name",
            Field::LastName => "Last name",
            Field::Gender => "Gender",
            Field::Age => "Age",
        }
    }
}

impl Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Raw form input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserDraft {
    pub first_name: String,
    pub last_name: String,
    pub gender: String,
    pub age: String,
}

impl UserDraft {
    pub fn from_user(user: &User) -> Self {
        Self {
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            gender: user.gender.as_str().to_string(),
            age: user.age.to_string(),
        }
    }

    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::FirstName => &self.first_name,
            Field::LastName => &self.last_name,
            Field::Gender => &self.gender,
            Field::Age => &self.age,
        }
    }

    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        let value = value.into();
        match field {
            Field::FirstName => self.first_name = value,
            Field::LastName => self.last_name = value,
            Field::Gender => self.gender = value,
            Field::Age => self.age = value,
        }
    }
}

/// A single field failure. Never leaves the form boundary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ValidationError {
    pub field: Field,
    pub message: String,
}

impl ValidationError {
    fn new(field: Field, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// One error per invalid field.
pub type FieldErrors = BTreeMap<Field, ValidationError>;

pub fn validate_field(draft: &UserDraft, field: Field) -> Result<(), ValidationError> {
    match field {
        Field::FirstName | Field::LastName => check_name(field, draft.get(field)).map(|_| ()),
        Field::Gender => check_gender(&draft.gender).map(|_| ()),
        Field::Age => check_age(&draft.age, draft.gender.parse().ok()).map(|_| ()),
    }
}

/// Validates every field and, if all pass, builds the create payload.
pub fn validate(draft: &UserDraft) -> Result<UserCreate, FieldErrors> {
    let first_name = check_name(Field::FirstName, &draft.first_name);
    let last_name = check_name(Field::LastName, &draft.last_name);
    let gender = check_gender(&draft.gender);
    let age = check_age(&draft.age, gender.as_ref().ok().copied());

    match (first_name, last_name, gender, age) {
        (Ok(first_name), Ok(last_name), Ok(gender), Ok(age)) => Ok(UserCreate {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            gender,
            age,
            email: None,
        }),
        (first_name, last_name, gender, age) => Err([
            first_name.err(),
            last_name.err(),
            gender.err(),
            age.err(),
        ]
        .into_iter()
        .flatten()
        .map(|e| (e.field, e))
        .collect()),
    }
}

fn check_name(field: Field, value: &str) -> Result<&str, ValidationError> {
    let label = field.label();
    let len = value.chars().count();
    if len == 0 {
        return Err(ValidationError::new(field, format!("{label} is required")));
    }
    if len < NAME_MIN_LEN {
        return Err(ValidationError::new(
            field,
            format!("{label} must be at least {NAME_MIN_LEN} characters"),
        ));
    }
    if len > NAME_MAX_LEN {
        return Err(ValidationError::new(
            field,
            format!("{label} must be at most {NAME_MAX_LEN} characters"),
        ));
    }
    Ok(value)
}

fn check_gender(value: &str) -> Result<Gender, ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::new(Field::Gender, "Gender is required"));
    }
    value.parse().map_err(|_| {
        let allowed: Vec<_> = Gender::ALL.iter().map(Gender::as_str).collect();
        ValidationError::new(
            Field::Gender,
            format!("Gender must be one of {}", allowed.join(", ")),
        )
    })
}

fn check_age(value: &str, gender: Option<Gender>) -> Result<u32, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::new(Field::Age, "An age is required"));
    }
    let age: i64 = value
        .parse()
        .map_err(|_| ValidationError::new(Field::Age, "Age must be a whole number"))?;
    if age <= 0 {
        return Err(ValidationError::new(Field::Age, "Age must be a positive number"));
    }
    match gender {
        Some(gender) => {
            let range = gender.age_range();
            if age < i64::from(*range.start()) {
                return Err(ValidationError::new(
                    Field::Age,
                    format!("Age must be a minimum of {}", range.start()),
                ));
            }
            if age > i64::from(*range.end()) {
                return Err(ValidationError::new(
                    Field::Age,
                    format!("Max age for {} is {}", gender, range.end()),
                ));
            }
        }
        None => {
            if age < i64::from(MIN_AGE) {
                return Err(ValidationError::new(Field::Age, "A valid age must be provided"));
            }
            if age > i64::from(MAX_AGE) {
                return Err(ValidationError::new(
                    Field::Age,
                    format!("Age must be at most {MAX_AGE}"),
                ));
            }
        }
    }
    u32::try_from(age).map_err(|_| ValidationError::new(Field::Age, "Age must be a whole number"))
}
