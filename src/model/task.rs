use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{normalize_label, require};
use crate::error::{CrmError, Result};

/// Board column of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TaskStatus {
    #[default]
    #[serde(rename = "To Do")]
    ToDo,
    #[serde(rename = "In Progress")]
    InProgress,
    Done,
}

impl TaskStatus {
    /// Columns in board order.
    pub const ALL: [TaskStatus; 3] = [TaskStatus::ToDo, TaskStatus::InProgress, TaskStatus::Done];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::ToDo => "To Do",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Done => "Done",
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, TaskStatus::Done)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = CrmError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = normalize_label(s);
        TaskStatus::ALL
            .into_iter()
            .find(|status| normalize_label(status.as_str()) == wanted)
            .ok_or_else(|| {
                CrmError::validation("status", format!("unknown task status '{s}' (To Do, In Progress, Done)"))
            })
    }
}

/// A follow-up item tied to a contact, optionally gated on other tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub description: String,
    #[serde(rename = "dueDate")]
    pub due_date: DateTime<Utc>,
    pub status: TaskStatus,
    #[serde(rename = "contactId")]
    pub contact_id: String,
    /// Prerequisite task ids, in the order they were chosen.
    #[serde(rename = "dependencyIds", default, deserialize_with = "super::null_as_default")]
    pub dependency_ids: Vec<String>,
}

impl Task {
    pub fn validate(&self) -> Result<()> {
        validate_fields(&self.title, &self.contact_id)
    }

    pub fn has_dependencies(&self) -> bool {
        !self.dependency_ids.is_empty()
    }
}

/// Task draft; the id is assigned on add.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTask {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "dueDate")]
    pub due_date: DateTime<Utc>,
    pub status: TaskStatus,
    #[serde(rename = "contactId")]
    pub contact_id: String,
    #[serde(rename = "dependencyIds", default)]
    pub dependency_ids: Vec<String>,
}

impl NewTask {
    pub fn validate(&self) -> Result<()> {
        validate_fields(&self.title, &self.contact_id)
    }

    pub fn into_task(self, id: String) -> Task {
        Task {
            id,
            title: self.title,
            description: self.description,
            due_date: self.due_date,
            status: self.status,
            contact_id: self.contact_id,
            dependency_ids: self.dependency_ids,
        }
    }
}

fn validate_fields(title: &str, contact_id: &str) -> Result<()> {
    require("title", title)?;
    require("contactId", contact_id)
}
