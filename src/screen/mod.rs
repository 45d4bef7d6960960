//! Headless screens driven by the query layer.

pub mod list_screen;
pub mod notification;

pub use list_screen::{FormMode, ListView, Modal, SubmitOutcome, UserListScreen, UserRow};
pub use notification::{Toast, ToastLevel, Toasts};
