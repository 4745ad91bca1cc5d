//! Task data model.
//!
//! A task lives under a parent (another task or the [`ROOT_TASK_ID`] sentinel) and
//! inside a `(parent_id, status)` bucket whose `order` values define render sequence.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Parent id of top-level life areas.
pub const ROOT_TASK_ID: &str = "root";

/// Maximum title length in characters, after trimming.
pub const TITLE_MAX_LEN: usize = 200;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    NotStarted,
    InProgress,
    OnHold,
    Completed,
}

impl TaskStatus {
    /// Board column order.
    pub const ALL: [TaskStatus; 4] = [
        TaskStatus::NotStarted,
        TaskStatus::InProgress,
        TaskStatus::OnHold,
        TaskStatus::Completed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::NotStarted => "NOT_STARTED",
            TaskStatus::InProgress => "IN_PROGRESS",
            TaskStatus::OnHold => "ON_HOLD",
            TaskStatus::Completed => "COMPLETED",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TaskStatus::NotStarted => "Not Started",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::OnHold => "On Hold",
            TaskStatus::Completed => "Completed",
        }
    }

    /// Position of the status in [`TaskStatus::ALL`].
    pub fn column_index(self) -> usize {
        match self {
            TaskStatus::NotStarted => 0,
            TaskStatus::InProgress => 1,
            TaskStatus::OnHold => 2,
            TaskStatus::Completed => 3,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match normalize_token(s).as_str() {
            "not_started" | "todo" | "open" => Ok(TaskStatus::NotStarted),
            "in_progress" | "doing" => Ok(TaskStatus::InProgress),
            "on_hold" | "hold" | "blocked" => Ok(TaskStatus::OnHold),
            "completed" | "done" => Ok(TaskStatus::Completed),
            _ => Err(Error::InvalidArgument(format!(
                "invalid status '{}': must be not_started, in_progress, on_hold, or completed",
                s
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
}

impl TaskPriority {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskPriority::Low => "LOW",
            TaskPriority::Medium => "MEDIUM",
            TaskPriority::High => "HIGH",
        }
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskPriority {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match normalize_token(s).as_str() {
            "low" => Ok(TaskPriority::Low),
            "medium" | "med" => Ok(TaskPriority::Medium),
            "high" => Ok(TaskPriority::High),
            _ => Err(Error::InvalidArgument(format!(
                "invalid priority '{}': must be low, medium, or high",
                s
            ))),
        }
    }
}

fn normalize_token(value: &str) -> String {
    value.trim().to_ascii_lowercase().replace(['-', ' '], "_")
}

/// The sole persisted entity.
///
/// Field aliases accept the camelCase layout used by browser exports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    #[serde(alias = "parentId")]
    pub parent_id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<TaskPriority>,
    pub order: i64,
    #[serde(alias = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(alias = "updatedAt")]
    pub updated_at: DateTime<Utc>,
    #[serde(default, alias = "completedAt", skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, alias = "dueDate", skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default, alias = "scheduledDate", skip_serializing_if = "Option::is_none")]
    pub scheduled_date: Option<DateTime<Utc>>,
    #[serde(default, alias = "calendarOnly", skip_serializing_if = "std::ops::Not::not")]
    pub calendar_only: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl Task {
    /// Build a fresh record from creation input.
    pub fn from_new(input: NewTask, id: String, now: DateTime<Utc>) -> Self {
        let completed_at = (input.status == TaskStatus::Completed).then_some(now);
        Self {
            id,
            parent_id: input.parent_id,
            title: input.title.trim().to_string(),
            description: input.description,
            status: input.status,
            priority: input.priority,
            order: input.order,
            created_at: now,
            updated_at: now,
            completed_at,
            due_date: input.due_date,
            scheduled_date: input.scheduled_date,
            calendar_only: input.calendar_only,
            tags: input.tags,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }

    pub fn is_area(&self) -> bool {
        self.parent_id == ROOT_TASK_ID
    }

    /// Merge a patch onto this record.
    ///
    /// Always refreshes `updated_at`. `completed_at` is stamped on a transition into
    /// `COMPLETED`, cleared on a transition out, and untouched otherwise.
    pub fn apply_patch(&mut self, patch: &TaskPatch, now: DateTime<Utc>) {
        let was_completed = self.is_completed();

        if let Some(parent_id) = &patch.parent_id {
            self.parent_id = parent_id.clone();
        }
        if let Some(title) = &patch.title {
            self.title = title.trim().to_string();
        }
        if let Some(description) = &patch.description {
            self.description = description.clone();
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(order) = patch.order {
            self.order = order;
        }
        if let Some(due_date) = patch.due_date {
            self.due_date = due_date;
        }
        if let Some(scheduled_date) = patch.scheduled_date {
            self.scheduled_date = scheduled_date;
        }
        if let Some(calendar_only) = patch.calendar_only {
            self.calendar_only = calendar_only;
        }
        if let Some(tags) = &patch.tags {
            self.tags = tags.clone();
        }

        let is_completed = self.is_completed();
        if !was_completed && is_completed {
            self.completed_at = Some(now);
        } else if was_completed && !is_completed {
            self.completed_at = None;
        }
        self.updated_at = now;
    }
}

/// Creation input: everything except the engine-managed fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub parent_id: String,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: Option<TaskPriority>,
    /// Overwritten by the engine with the next order of the target bucket.
    pub order: i64,
    pub due_date: Option<DateTime<Utc>>,
    pub scheduled_date: Option<DateTime<Utc>>,
    pub calendar_only: bool,
    pub tags: Vec<String>,
}

impl NewTask {
    pub fn new(parent_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            parent_id: parent_id.into(),
            title: title.into(),
            description: None,
            status: TaskStatus::NotStarted,
            priority: Some(TaskPriority::Medium),
            order: 0,
            due_date: None,
            scheduled_date: None,
            calendar_only: false,
            tags: Vec::new(),
        }
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_due_date(mut self, due: DateTime<Utc>) -> Self {
        self.due_date = Some(due);
        self
    }

    pub fn with_scheduled_date(mut self, scheduled: DateTime<Utc>) -> Self {
        self.scheduled_date = Some(scheduled);
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn calendar_only(mut self) -> Self {
        self.calendar_only = true;
        self
    }
}

/// Partial update. `None` leaves a field alone; for clearable fields `Some(None)` clears it.
///
/// `id`, `created_at` and `completed_at` are deliberately absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub parent_id: Option<String>,
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub status: Option<TaskStatus>,
    pub priority: Option<Option<TaskPriority>>,
    pub order: Option<i64>,
    pub due_date: Option<Option<DateTime<Utc>>>,
    pub scheduled_date: Option<Option<DateTime<Utc>>>,
    pub calendar_only: Option<bool>,
    pub tags: Option<Vec<String>>,
}

impl TaskPatch {
    pub fn status(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn order(order: i64) -> Self {
        Self {
            order: Some(order),
            ..Self::default()
        }
    }

    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
