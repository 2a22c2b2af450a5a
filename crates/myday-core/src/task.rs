use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::datetime::due_date_serde;
use crate::error::TaskError;

pub const MAX_TAGS: usize = 6;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = TaskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(TaskError::Validation(format!("unknown priority: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    #[default]
    ToDo,
    InProgress,
    Done,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::ToDo => "to-do",
            Status::InProgress => "in-progress",
            Status::Done => "done",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = TaskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "to-do" | "todo" => Ok(Status::ToDo),
            "in-progress" | "doing" => Ok(Status::InProgress),
            "done" => Ok(Status::Done),
            other => Err(TaskError::Validation(format!("unknown status: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: u64,

    pub title: String,

    #[serde(default)]
    pub description: String,

    #[serde(default, with = "due_date_serde")]
    pub due_date: Option<NaiveDate>,

    #[serde(default)]
    pub priority: Priority,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub completed: bool,

    #[serde(default)]
    pub is_important: bool,

    #[serde(default)]
    pub status: Status,
}

impl Task {
    pub fn new(id: u64, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            description: String::new(),
            due_date: None,
            priority: Priority::Medium,
            tags: vec![],
            completed: false,
            is_important: false,
            status: Status::ToDo,
        }
    }

    pub fn is_due_on(&self, date: NaiveDate) -> bool {
        self.due_date == Some(date)
    }

    /// Checks the invariants every stored task must hold.
    pub fn validate(&self) -> Result<(), TaskError> {
        if self.title.trim().is_empty() {
            return Err(TaskError::Validation(format!(
                "task {} has an empty title",
                self.id
            )));
        }
        if self.tags.len() > MAX_TAGS {
            return Err(TaskError::Validation(format!(
                "task {} has {} tags (max {MAX_TAGS})",
                self.id,
                self.tags.len()
            )));
        }
        Ok(())
    }
}
