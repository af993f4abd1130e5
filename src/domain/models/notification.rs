//! Notification records handed to the card synchronizer.

use serde::{Deserialize, Serialize};

/// One admissible event, reduced to what a task card displays.
///
/// Built per request by the relay service and never persisted. The title
/// and status are already resolved for display.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NotificationRecord {
    /// External task identifier. Without one the card cannot be correlated.
    pub task_id: Option<String>,
    /// Display title, fallback chain already applied.
    pub title: String,
    /// Display status, already translated.
    pub status: String,
    /// Designer or comment author.
    pub designer_or_author: Option<String>,
    /// Free-text body.
    pub message: Option<String>,
}

impl NotificationRecord {
    /// Create a record for a task.
    pub fn new(task_id: Option<String>, title: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            task_id,
            title: title.into(),
            status: status.into(),
            designer_or_author: None,
            message: None,
        }
    }

    /// Set the designer or author.
    #[must_use]
    pub fn with_author(mut self, author: Option<String>) -> Self {
        self.designer_or_author = author;
        self
    }

    /// Set the message body.
    #[must_use]
    pub fn with_message(mut self, message: Option<String>) -> Self {
        self.message = message;
        self
    }

    /// Task identifier, treating blank identifiers as absent.
    pub fn correlation_id(&self) -> Option<&str> {
        self.task_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}
