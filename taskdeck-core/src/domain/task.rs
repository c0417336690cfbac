//! Task domain model

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::result::{Error, Result};
use super::wire::{deserialize_due_date, deserialize_id, deserialize_timestamp, serialize_due_date};

/// Maximum task title length accepted by the client
pub const TITLE_MAX_LEN: usize = 100;

/// Maximum task description length accepted by the client
pub const DESCRIPTION_MAX_LEN: usize = 500;

/// Task lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 4] = [
        TaskStatus::Pending,
        TaskStatus::InProgress,
        TaskStatus::Completed,
        TaskStatus::Cancelled,
    ];

    /// Wire representation, also used in `/api/tasks/status/{status}`
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "PENDING",
            TaskStatus::InProgress => "IN_PROGRESS",
            TaskStatus::Completed => "COMPLETED",
            TaskStatus::Cancelled => "CANCELLED",
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
        let normalized = s.trim().to_uppercase().replace(['-', ' '], "_");
        TaskStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| Error::field("status", format!("Unknown status: {}", s)))
    }
}

/// Task priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl TaskPriority {
    pub const ALL: [TaskPriority; 4] = [
        TaskPriority::Low,
        TaskPriority::Medium,
        TaskPriority::High,
        TaskPriority::Urgent,
    ];

    /// Wire representation, also used in `/api/tasks/priority/{priority}`
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "LOW",
            TaskPriority::Medium => "MEDIUM",
            TaskPriority::High => "HIGH",
            TaskPriority::Urgent => "URGENT",
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
        let normalized = s.trim().to_uppercase();
        TaskPriority::ALL
            .into_iter()
            .find(|priority| priority.as_str() == normalized)
            .ok_or_else(|| Error::field("priority", format!("Unknown priority: {}", s)))
    }
}

/// A task as returned by the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    #[serde(default, deserialize_with = "deserialize_due_date")]
    pub due_date: Option<NaiveDateTime>,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub updated_at: DateTime<Utc>,
    /// Owning user (`userId` on the wire)
    #[serde(rename = "userId", deserialize_with = "deserialize_id")]
    pub owner_id: String,
}

impl Task {
    /// Calendar day the task is due, if any
    pub fn due_day(&self) -> Option<NaiveDate> {
        self.due_date.map(|dt| dt.date())
    }

    /// Due strictly before `today` and not completed
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.status != TaskStatus::Completed
            && self.due_day().is_some_and(|due| due < today)
    }
}

/// Task counters from `/api/tasks/statistics`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStats {
    pub total: u64,
    pub completed: u64,
    pub in_progress: u64,
    pub overdue: u64,
}

impl TaskStats {
    /// Completed share of all tasks, in whole percent (0 when there are none)
    pub fn completion_rate(&self) -> u64 {
        if self.total == 0 {
            return 0;
        }
        (self.completed.min(self.total) * 100 + self.total / 2) / self.total
    }
}

/// Draft for a task to be created
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub priority: TaskPriority,
    #[serde(serialize_with = "serialize_due_date")]
    pub due_date: Option<NaiveDate>,
}

impl NewTask {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            priority: TaskPriority::default(),
            due_date: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_due_date(mut self, due: NaiveDate) -> Self {
        self.due_date = Some(due);
        self
    }

    /// Trim fields and check them, producing the payload that is sent
    pub fn normalized(self) -> Result<Self> {
        let title = normalize_title(&self.title)?;
        let description = normalize_description(self.description.as_deref())?;
        Ok(Self {
            title,
            description,
            priority: self.priority,
            due_date: self.due_date,
        })
    }
}

/// Partial update for an existing task
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<TaskPriority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_due_date"
    )]
    pub due_date: Option<NaiveDate>,
}

impl TaskUpdate {
    pub fn is_empty(&self) -> bool {
        self == &TaskUpdate::default()
    }

    pub fn normalized(self) -> Result<Self> {
        let title = match self.title.as_deref() {
            Some(title) => Some(normalize_title(title)?),
            None => None,
        };
        let description = normalize_description(self.description.as_deref())?;
        Ok(Self {
            title,
            description,
            ..self
        })
    }
}

fn normalize_title(raw: &str) -> Result<String> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(Error::field("title", "Title is required"));
    }
    if title.chars().count() > TITLE_MAX_LEN {
        return Err(Error::field(
            "title",
            format!("Title must be at most {} characters", TITLE_MAX_LEN),
        ));
    }
    Ok(title.to_string())
}

fn normalize_description(raw: Option<&str>) -> Result<Option<String>> {
    let Some(description) = raw.map(str::trim).filter(|d| !d.is_empty()) else {
        return Ok(None);
    };
    if description.chars().count() > DESCRIPTION_MAX_LEN {
        return Err(Error::field(
            "description",
            format!("Description must be at most {} characters", DESCRIPTION_MAX_LEN),
        ));
    }
    Ok(Some(description.to_string()))
}

fn due_date_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid due date regex"))
}

/// Parse a due date typed by the user (`YYYY-MM-DD`)
pub fn parse_due_date(input: &str) -> Result<NaiveDate> {
    let input = input.trim();
    if !due_date_pattern().is_match(input) {
        return Err(Error::field(
            "dueDate",
            format!("Invalid date format: {}. Expected YYYY-MM-DD", input),
        ));
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .map_err(|_| Error::field("dueDate", format!("Invalid date: {}", input)))
}
