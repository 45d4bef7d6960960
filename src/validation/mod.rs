//! Form validation: declarative field rules and the touched-field form state.

pub mod form;
pub mod schema;

pub use form::FormState;
pub use schema::{validate, validate_field, Field, FieldErrors, UserDraft, ValidationError};
