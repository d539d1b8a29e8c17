use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Stable identifier of a task, assigned once at creation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// Task struct, stored as `{id, name, completed, dueDate, category, priority}`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(default)]
    pub id: TaskId,
    pub name: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub due_date: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub category: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub priority: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl Task {
    pub fn from_draft(id: TaskId, draft: &Draft) -> Task {
        Task {
            id,
            name: draft.name.clone(),
            completed: false,
            due_date: draft.due_date.clone(),
            category: draft.category.clone(),
            priority: draft.priority.clone(),
        }
    }

    /// Overwrites the editable fields, leaving `id` and `completed` alone.
    pub fn apply(&mut self, draft: &Draft) {
        self.name = draft.name.clone();
        self.due_date = draft.due_date.clone();
        self.category = draft.category.clone();
        self.priority = draft.priority.clone();
    }

    pub fn to_draft(&self) -> Draft {
        Draft {
            name: self.name.clone(),
            due_date: self.due_date.clone(),
            category: self.category.clone(),
            priority: self.priority.clone(),
        }
    }
}

// The add/edit form contents
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Draft {
    pub name: String,
    pub due_date: String,
    pub category: String,
    pub priority: String,
}

impl Draft {
    pub fn named(name: &str) -> Draft {
        Draft {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn clear(&mut self) {
        self.name.clear();
        self.due_date.clear();
        self.category.clear();
        self.priority.clear();
    }
}

/// Whether the next submit appends a task or rewrites an existing one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EditMode {
    #[default]
    Adding,
    Editing(TaskId),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::High, Priority::Medium, Priority::Low];

    pub fn parse(value: &str) -> Option<Priority> {
        match value.trim().to_ascii_lowercase().as_str() {
            "high" | "h" => Some(Priority::High),
            "medium" | "m" => Some(Priority::Medium),
            "low" | "l" => Some(Priority::Low),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_serializes_with_camel_case_keys() {
        let task = Task {
            id: TaskId(3),
            name: "Pay rent".to_string(),
            completed: false,
            due_date: "2026-11-01".to_string(),
            category: "Personal".to_string(),
            priority: "High".to_string(),
        };
        let value = serde_json::to_value(&task).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "id": 3,
                "name": "Pay rent",
                "completed": false,
                "dueDate": "2026-11-01",
                "category": "Personal",
                "priority": "High"
            })
        );
    }

    #[test]
    fn test_task_without_id_or_optional_fields_deserializes() {
        let task: Task = serde_json::from_str(r#"{"name":"Call mom"}"#).unwrap();
        assert_eq!(task.id, TaskId(0));
        assert_eq!(task.name, "Call mom");
        assert!(!task.completed);
        assert_eq!(task.due_date, "");
        assert_eq!(task.category, "");
        assert_eq!(task.priority, "");
    }

    #[test]
    fn test_null_optional_fields_deserialize_as_empty() {
        let task: Task =
            serde_json::from_str(r#"{"name":"x","dueDate":null,"category":null,"priority":"Low"}"#)
                .unwrap();
        assert_eq!(task.due_date, "");
        assert_eq!(task.category, "");
        assert_eq!(task.priority, "Low");
    }

    #[test]
    fn test_apply_preserves_completion_and_id() {
        let mut task = Task::from_draft(TaskId(7), &Draft::named("Old"));
        task.completed = true;
        let draft = Draft {
            name: "New".to_string(),
            due_date: "2026-01-01".to_string(),
            category: "Work".to_string(),
            priority: "Low".to_string(),
        };
        task.apply(&draft);
        assert_eq!(task.id, TaskId(7));
        assert!(task.completed);
        assert_eq!(task.to_draft(), draft);
    }

    #[test]
    fn test_priority_parse() {
        assert_eq!(Priority::parse("HIGH"), Some(Priority::High));
        assert_eq!(Priority::parse(" m "), Some(Priority::Medium));
        assert_eq!(Priority::parse("low"), Some(Priority::Low));
        assert_eq!(Priority::parse("urgent"), None);
        assert_eq!(Priority::parse(""), None);
    }

    #[test]
    fn test_draft_clear() {
        let mut draft = Draft {
            name: "a".to_string(),
            due_date: "b".to_string(),
            category: "c".to_string(),
            priority: "d".to_string(),
        };
        draft.clear();
        assert_eq!(draft, Draft::default());
    }
}
