use std::fmt;

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub id: String,
    pub title: String,
    pub description: String,
    pub progress: u8,
    pub created_at: DateTime<Utc>,
    pub tasks: Vec<Task>,
}

impl Goal {
    pub fn new(title: &str, description: &str) -> Self {
        Goal {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            description: description.to_string(),
            progress: 0,
            created_at: Utc::now(),
            tasks: Vec::new(),
        }
    }

    pub fn completed_count(&self) -> usize {
        self.tasks.iter().filter(|t| t.status.is_completed()).count()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub due_date: DateTime<Utc>,
    pub priority: Priority,
    pub status: TaskStatus,
}

impl Task {
    pub fn new(title: &str, due_date: DateTime<Utc>, priority: Priority) -> Self {
        Task {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            due_date,
            priority,
            status: TaskStatus::Pending,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl ToSql for Priority {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for Priority {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(FromSqlError::Other(
                format!("unknown priority '{other}'").into(),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Completed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Completed => "completed",
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, TaskStatus::Completed)
    }

    /// The status a toggle moves this one to.
    pub fn toggled(&self) -> Self {
        match self {
            TaskStatus::Pending => TaskStatus::Completed,
            TaskStatus::Completed => TaskStatus::Pending,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl ToSql for TaskStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for TaskStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "pending" => Ok(TaskStatus::Pending),
            "completed" => Ok(TaskStatus::Completed),
            other => Err(FromSqlError::Other(
                format!("unknown task status '{other}'").into(),
            )),
        }
    }
}

/// Completed fraction of `tasks` scaled to 0-100, rounded to the nearest
/// whole percent. A goal with no tasks sits at 0.
pub fn percent_complete(tasks: &[Task]) -> u8 {
    if tasks.is_empty() {
        return 0;
    }
    let completed = tasks.iter().filter(|t| t.status.is_completed()).count();
    ((completed as f64 / tasks.len() as f64) * 100.0).round() as u8
}

#[derive(Debug, Clone, PartialEq)]
pub enum PopupMode {
    None,
    NewGoal,
    NewTask,
    ConfirmDeleteGoal,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task_with(status: TaskStatus) -> Task {
        let mut task = Task::new("t", Utc::now(), Priority::Medium);
        task.status = status;
        task
    }

    #[test]
    fn new_task_starts_pending() {
        let task = Task::new("read chapter", Utc::now(), Priority::High);
        assert_eq!(task.status, TaskStatus::Pending);
        assert!(!task.status.is_completed());
    }

    #[test]
    fn toggled_twice_is_identity() {
        assert_eq!(TaskStatus::Pending.toggled(), TaskStatus::Completed);
        assert_eq!(TaskStatus::Completed.toggled(), TaskStatus::Pending);
        assert_eq!(TaskStatus::Pending.toggled().toggled(), TaskStatus::Pending);
    }

    #[test]
    fn percent_of_no_tasks_is_zero() {
        assert_eq!(percent_complete(&[]), 0);
    }

    #[test]
    fn percent_of_half_done_is_fifty() {
        let tasks = vec![
            task_with(TaskStatus::Completed),
            task_with(TaskStatus::Pending),
        ];
        assert_eq!(percent_complete(&tasks), 50);
    }

    #[test]
    fn percent_rounds_to_nearest() {
        let one_of_three = vec![
            task_with(TaskStatus::Completed),
            task_with(TaskStatus::Pending),
            task_with(TaskStatus::Pending),
        ];
        assert_eq!(percent_complete(&one_of_three), 33);

        let two_of_three = vec![
            task_with(TaskStatus::Completed),
            task_with(TaskStatus::Completed),
            task_with(TaskStatus::Pending),
        ];
        assert_eq!(percent_complete(&two_of_three), 67);
    }

    #[test]
    fn percent_rounds_half_up() {
        let mut tasks = vec![task_with(TaskStatus::Completed)];
        tasks.extend((0..7).map(|_| task_with(TaskStatus::Pending)));
        assert_eq!(percent_complete(&tasks), 13);
    }

    #[test]
    fn goal_counts_completed_tasks() {
        let mut goal = Goal::new("learn rust", "");
        goal.tasks = vec![
            task_with(TaskStatus::Completed),
            task_with(TaskStatus::Pending),
            task_with(TaskStatus::Completed),
        ];
        assert_eq!(goal.completed_count(), 2);
    }

    #[test]
    fn status_survives_sql_text() {
        assert_eq!(TaskStatus::Pending.as_str(), "pending");
        assert_eq!(TaskStatus::Completed.as_str(), "completed");
        assert_eq!(Priority::High.as_str(), "high");
    }
}
