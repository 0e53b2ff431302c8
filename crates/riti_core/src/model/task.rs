use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use time::OffsetDateTime;

use crate::error::AppError;

/// Category granularity of a task; also the unit a recurring task advances by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recurrence {
    Daily,
    Weekly,
    Monthly,
}

impl Recurrence {
    pub const ALL: [Recurrence; 3] = [Recurrence::Daily, Recurrence::Weekly, Recurrence::Monthly];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }
}

impl fmt::Display for Recurrence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Recurrence {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "daily" | "day" => Ok(Self::Daily),
            "weekly" | "week" => Ok(Self::Weekly),
            "monthly" | "month" => Ok(Self::Monthly),
            other => Err(AppError::invalid_input(format!(
                "recurrence must be daily, weekly or monthly (got '{other}')"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: String,
    pub recurrence: Recurrence,
    #[serde(with = "time::serde::rfc3339")]
    pub due_date: OffsetDateTime,
    pub reward: u32,
    pub completed: bool,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub completed_at: Option<OffsetDateTime>,
    #[serde(default)]
    pub proof_image: Option<String>,
    #[serde(default)]
    pub is_recurring: bool,
    #[serde(default)]
    pub recurring_interval: Option<u32>,
}

impl Task {
    /// Builds a pending task from a draft under the given id.
    pub fn from_draft(id: String, draft: TaskDraft) -> Self {
        Self {
            id,
            title: draft.title,
            description: draft.description,
            recurrence: draft.recurrence,
            due_date: draft.due_date,
            reward: draft.reward,
            completed: false,
            completed_at: None,
            proof_image: None,
            is_recurring: draft.is_recurring,
            recurring_interval: draft.recurring_interval,
        }
    }

    /// The interval a successor is spawned with, if this task spawns one at all.
    pub fn successor_interval(&self) -> Option<u32> {
        if !self.is_recurring {
            return None;
        }
        self.recurring_interval.filter(|interval| *interval > 0)
    }

    /// `completed` agrees with the presence of both completion fields.
    pub fn completion_consistent(&self) -> bool {
        let has_fields = self.completed_at.is_some() && self.proof_image.is_some();
        let has_none = self.completed_at.is_none() && self.proof_image.is_none();
        if self.completed { has_fields } else { has_none }
    }
}

/// Everything a caller supplies when creating a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub recurrence: Recurrence,
    pub due_date: OffsetDateTime,
    pub reward: u32,
    pub is_recurring: bool,
    pub recurring_interval: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::{Recurrence, Task, TaskDraft};
    use time::macros::datetime;

    fn draft() -> TaskDraft {
        TaskDraft {
            title: "Gym".to_string(),
            description: "Leg day".to_string(),
            recurrence: Recurrence::Weekly,
            due_date: datetime!(2024-03-04 18:30 +01:00),
            reward: 15,
            is_recurring: true,
            recurring_interval: Some(2),
        }
    }

    #[test]
    fn from_draft_starts_pending() {
        let task = Task::from_draft("task-1".to_string(), draft());

        assert_eq!(task.id, "task-1");
        assert!(!task.completed);
        assert_eq!(task.completed_at, None);
        assert_eq!(task.proof_image, None);
        assert_eq!(task.reward, 15);
        assert!(task.completion_consistent());
    }

    #[test]
    fn successor_interval_requires_flag_and_positive_interval() {
        let mut task = Task::from_draft("task-1".to_string(), draft());
        assert_eq!(task.successor_interval(), Some(2));

        task.recurring_interval = Some(0);
        assert_eq!(task.successor_interval(), None);

        task.recurring_interval = Some(3);
        task.is_recurring = false;
        assert_eq!(task.successor_interval(), None);
    }

    #[test]
    fn completion_consistent_detects_half_completed_tasks() {
        let mut task = Task::from_draft("task-1".to_string(), draft());
        task.completed = true;
        assert!(!task.completion_consistent());

        task.completed_at = Some(datetime!(2024-03-04 19:00 UTC));
        task.proof_image = Some("data:image/png;base64,AAAA".to_string());
        assert!(task.completion_consistent());

        task.completed = false;
        assert!(!task.completion_consistent());
    }

    #[test]
    fn recurrence_parses_case_insensitively() {
        assert_eq!("Daily".parse::<Recurrence>().unwrap(), Recurrence::Daily);
        assert_eq!(" week ".parse::<Recurrence>().unwrap(), Recurrence::Weekly);
        assert_eq!("MONTHLY".parse::<Recurrence>().unwrap(), Recurrence::Monthly);

        let err = "yearly".parse::<Recurrence>().unwrap_err();
        assert_eq!(err.code(), "invalid_input");
    }

    #[test]
    fn task_json_uses_rfc3339_dates() {
        let task = Task::from_draft("task-1".to_string(), draft());
        let value = serde_json::to_value(&task).unwrap();

        assert_eq!(value["due_date"], "2024-03-04T18:30:00+01:00");
        assert_eq!(value["recurrence"], "weekly");
        assert!(value["completed_at"].is_null());
    }
}
