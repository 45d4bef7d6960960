use crate::domain::{User, UserCreate};
use crate::validation::schema::{validate, validate_field, Field, FieldErrors, UserDraft};
use std::collections::BTreeSet;

/// Form input plus which fields have been touched and their current errors.
///
/// Errors show for a field only once it has lost focus, or after a submit
/// attempt touches everything. After that it is re-checked on every change.
#[derive(Debug, Clone, Default)]
pub struct FormState {
    values: UserDraft,
    touched: BTreeSet<Field>,
    errors: FieldErrors,
    submit_count: u32,
}

impl FormState {
    pub fn new() -> Self {
        Self::default()
    }

    /// A form pre-filled from an existing record.
    pub fn from_user(user: &User) -> Self {
        Self {
            values: UserDraft::from_user(user),
            ..Self::default()
        }
    }

    pub fn values(&self) -> &UserDraft {
        &self.values
    }

    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        self.values.set(field, value);
        if self.touched.contains(&field) {
            self.recheck(field);
        }
        // age bounds depend on gender
        if field == Field::Gender && self.touched.contains(&Field::Age) {
            self.recheck(Field::Age);
        }
    }

    pub fn blur(&mut self, field: Field) {
        self.touched.insert(field);
        self.recheck(field);
    }

    /// Touches every field and validates the whole draft.
    pub fn submit(&mut self) -> Result<UserCreate, FieldErrors> {
        self.submit_count += 1;
        self.touched.extend(Field::ALL);
        let result = validate(&self.values);
        self.errors = match &result {
            Ok(_) => FieldErrors::new(),
            Err(errors) => errors.clone(),
        };
        result
    }

    pub fn error(&self, field: Field) -> Option<&str> {
        self.errors.get(&field).map(|e| e.message.as_str())
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn is_touched(&self, field: Field) -> bool {
        self.touched.contains(&field)
    }

    pub fn submit_count(&self) -> u32 {
        self.submit_count
    }

    fn recheck(&mut self, field: Field) {
        match validate_field(&self.values, field) {
            Ok(()) => {
                self.errors.remove(&field);
            }
            Err(e) => {
                self.errors.insert(field, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_untouched_field_shows_no_error() {
        let mut form = FormState::new();
        form.set(Field::FirstName, "Al");
        assert_eq!(form.error(Field::FirstName), None);

        form.blur(Field::FirstName);
        assert_eq!(
            form.error(Field::FirstName),
            Some("First name must be at least 5 characters")
        );
    }

    #[test]
    fn test_touched_field_rechecks_live() {
        let mut form = FormState::new();
        form.blur(Field::LastName);
        assert_eq!(form.error(Field::LastName), Some("Last name is required"));
        form.set(Field::LastName, "Babbage");
        assert_eq!(form.error(Field::LastName), None);
    }

    #[test]
    fn test_gender_change_rechecks_touched_age() {
        let mut form = FormState::new();
        form.set(Field::Gender, "FEMALE");
        form.set(Field::Age, "115");
        form.blur(Field::Age);
        assert_eq!(form.error(Field::Age), None);

        form.set(Field::Gender, "MALE");
        assert_eq!(form.error(Field::Age), Some("Max age for MALE is 112"));
    }

    #[test]
    fn test_submit_touches_everything() {
        let mut form = FormState::new();
        let errors = form.submit().unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(Field::ALL.iter().all(|f| form.is_touched(*f)));
        assert_eq!(form.submit_count(), 1);
    }
}
