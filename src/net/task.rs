//! Task records exchanged over the intercom.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Unique identifier for a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(pub Uuid);

impl TaskId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Task urgency. Proposals arriving with any other label are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::High => write!(f, "high"),
            Priority::Medium => write!(f, "medium"),
            Priority::Low => write!(f, "low"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown priority: {0}")]
pub struct ParsePriorityError(String);

impl FromStr for Priority {
    type Err = ParsePriorityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            other => Err(ParsePriorityError(other.to_string())),
        }
    }
}

/// A unit of work assigned to a node, usually derived from a project plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub description: String,
    pub due_date: NaiveDateTime,
    pub assigned_to: String,
    pub priority: Priority,
    pub project_id: String,
    pub completed: bool,
}

impl Task {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        due_date: NaiveDateTime,
        assigned_to: impl Into<String>,
        priority: Priority,
        project_id: impl Into<String>,
    ) -> Self {
        Self {
            id: TaskId::new(),
            title: title.into(),
            description: description.into(),
            due_date,
            assigned_to: assigned_to.into(),
            priority,
            project_id: project_id.into(),
            completed: false,
        }
    }

    /// Text pushed to the assignee when the task lands on the bus.
    pub fn notification_line(&self) -> String {
        format!(
            "New task assigned: {}. Due: {}. Priority: {}.",
            self.title,
            self.due_date.format("%Y-%m-%d"),
            self.priority
        )
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (Due: {}) [Priority: {}] -> {}",
            self.title,
            self.due_date.format("%Y-%m-%d"),
            self.priority,
            self.assigned_to
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn due(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    #[test]
    fn notification_includes_title_due_date_and_priority() {
        let task = Task::new(
            "Draft launch brief",
            "Write the one-pager",
            due(2026, 9, 15),
            "marketing",
            Priority::High,
            "launch",
        );
        assert_eq!(
            task.notification_line(),
            "New task assigned: Draft launch brief. Due: 2026-09-15. Priority: high."
        );
    }

    #[test]
    fn priority_parses_case_insensitively() {
        assert_eq!("HIGH".parse::<Priority>().unwrap(), Priority::High);
        assert_eq!(" medium ".parse::<Priority>().unwrap(), Priority::Medium);
        assert!("urgent".parse::<Priority>().is_err());
    }

    #[test]
    fn new_tasks_start_incomplete() {
        let task = Task::new(
            "Review mockups",
            "",
            due(2026, 9, 1),
            "design",
            Priority::Low,
            "site-refresh",
        );
        assert!(!task.completed);
        assert_eq!(task.project_id, "site-refresh");
    }
}
