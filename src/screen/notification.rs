/// Severity of a transient notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub id: u64,
    pub level: ToastLevel,
    pub message: String,
}

/// Dismissable notifications, oldest first.
#[derive(Debug, Default)]
pub struct Toasts {
    next_id: u64,
    items: Vec<Toast>,
}

impl Toasts {
    pub fn push_success(&mut self, message: impl Into<String>) -> u64 {
        self.push(ToastLevel::Success, message.into())
    }

    pub fn push_error(&mut self, message: impl Into<String>) -> u64 {
        self.push(ToastLevel::Error, message.into())
    }

    fn push(&mut self, level: ToastLevel, message: String) -> u64 {
        self.next_id += 1;
        self.items.push(Toast {
            id: self.next_id,
            level,
            message,
        });
        self.next_id
    }

    /// Returns false if no toast has that id.
    pub fn dismiss(&mut self, id: u64) -> bool {
        let before = self.items.len();
        self.items.retain(|t| t.id != id);
        self.items.len() != before
    }

    pub fn iter(&self) -> impl Iterator<Item = &Toast> {
        self.items.iter()
    }

    pub fn last(&self) -> Option<&Toast> {
        self.items.last()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dismiss_removes_only_that_toast() {
        let mut toasts = Toasts::default();
        let a = toasts.push_success("saved");
        let b = toasts.push_error("failed");
        assert!(toasts.dismiss(a));
        assert!(!toasts.dismiss(a));
        assert_eq!(toasts.len(), 1);
        assert_eq!(toasts.last().map(|t| t.id), Some(b));
    }
}
