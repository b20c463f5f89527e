use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::label::Label;

/// One to-do record. `label` is stored HTML-escaped.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Task {
    pub uuid: Uuid,

    pub label: String,

    #[serde(default)]
    pub completed: bool,

    pub entry: DateTime<Utc>,

    pub modified: DateTime<Utc>,
}

impl Task {
    pub fn new(label: Label, now: DateTime<Utc>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            label: label.into_inner(),
            completed: false,
            entry: now,
            modified: now,
        }
    }

    /// Label text as the editor should show it.
    pub fn editable_label(&self) -> String {
        crate::label::unescape_html(&self.label)
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.modified = now;
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::Task;
    use crate::label::Label;

    #[test]
    fn new_task_starts_pending_with_escaped_label() {
        let now = Utc.with_ymd_and_hms(2026, 2, 16, 5, 0, 0).unwrap();
        let task = Task::new(Label::parse("  fish & chips ").unwrap(), now);

        assert!(!task.completed);
        assert_eq!(task.label, "fish &amp; chips");
        assert_eq!(task.editable_label(), "fish & chips");
        assert_eq!(task.entry, now);
        assert_eq!(task.modified, now);
    }

    #[test]
    fn deserializes_without_completed_flag() {
        let raw = r#"{"uuid":"5f0c8e53-2b47-4c5c-9d53-6c1f3f0d9b41","label":"x","entry":"2026-02-16T05:00:00Z","modified":"2026-02-16T05:00:00Z"}"#;
        let task: Task = serde_json::from_str(raw).unwrap();
        assert!(!task.completed);
        assert_eq!(task.label, "x");
    }
}
