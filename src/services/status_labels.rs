//! Translation of Deskfy status codes into display labels.

use std::collections::{BTreeMap, HashMap};

/// Label used when an event carries no status.
pub const NO_STATUS: &str = "No status";

const BUILTIN_LABELS: &[(&str, &str)] = &[
    ("INBOX", "Inbox"),
    ("PROGRESS", "In production"),
    ("IN_PROGRESS", "In production"),
    ("REVIEW", "In review"),
    ("APPROVED", "Approved"),
    ("DONE", "Done"),
    ("FINISHED", "Finished"),
    ("DELIVERED", "Delivered"),
    ("ARCHIVED", "Archived"),
    ("CANCELED", "Canceled"),
    ("STANDBY", "On standby"),
    ("ON_HOLD", "Paused"),
    ("WAITING_USER_ADJUST", "Awaiting adjustments"),
    ("WAITING_APPROVAL", "Awaiting approval"),
    ("AWAITING_USER_APPROVAL", "Awaiting client approval"),
    ("AWAITING_USER_FEEDBACK", "Awaiting client feedback"),
    ("DESIGNING", "Design in progress"),
    ("REVISION_DESIGN", "Internal review"),
    ("SENT_TO_REVIEW", "Sent for review"),
    ("PENDING_INFORMATION", "Awaiting information"),
    ("EDITING", "Adjusting artwork"),
    ("REJECTED", "Rejected"),
    ("RETURNED", "Returned to designer"),
    ("NEEDS_APPROVAL", "Needs approval"),
    ("QUALITY_CHECK", "Quality check"),
];

/// Status code to label table.
///
/// Starts from the built-in table; configured overrides replace or extend
/// individual entries. Unknown codes are shown as-is.
#[derive(Debug, Clone)]
pub struct StatusLabels {
    labels: HashMap<String, String>,
}

impl StatusLabels {
    /// Built-in table with `overrides` applied on top.
    pub fn new(overrides: &BTreeMap<String, String>) -> Self {
        let mut labels: HashMap<String, String> = BUILTIN_LABELS
            .iter()
            .map(|(code, label)| ((*code).to_string(), (*label).to_string()))
            .collect();
        for (code, label) in overrides {
            labels.insert(code.trim().to_uppercase(), label.clone());
        }
        Self { labels }
    }

    /// Display label for a raw status code.
    pub fn translate(&self, status: Option<&str>) -> String {
        let Some(code) = status.map(str::trim).filter(|s| !s.is_empty()) else {
            return NO_STATUS.to_string();
        };
        self.labels
            .get(code)
            .or_else(|| self.labels.get(&code.to_uppercase()))
            .cloned()
            .unwrap_or_else(|| code.to_string())
    }
}

impl Default for StatusLabels {
    fn default() -> Self {
        Self::new(&BTreeMap::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_and_passthrough() {
        let labels = StatusLabels::default();
        assert_eq!(labels.translate(Some("WAITING_USER_ADJUST")), "Awaiting adjustments");
        assert_eq!(labels.translate(Some("approved")), "Approved");
        assert_eq!(labels.translate(Some("SOMETHING_NEW")), "SOMETHING_NEW");
        assert_eq!(labels.translate(None), NO_STATUS);
        assert_eq!(labels.translate(Some("  ")), NO_STATUS);
    }

    #[test]
    fn test_overrides_win() {
        let overrides = BTreeMap::from([
            ("progress".to_string(), "Em produção".to_string()),
            ("CUSTOM".to_string(), "Custom label".to_string()),
        ]);
        let labels = StatusLabels::new(&overrides);
        assert_eq!(labels.translate(Some("PROGRESS")), "Em produção");
        assert_eq!(labels.translate(Some("CUSTOM")), "Custom label");
        assert_eq!(labels.translate(Some("DONE")), "Done");
    }
}
