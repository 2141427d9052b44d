use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{CrmError, Result};
use crate::model::{Task, TaskStatus};
use crate::prefs::{PreferenceStore, TASK_FILTERS_KEY};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Persisted shape: every key is a string and `""` means unset.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct StoredFilters {
    status: String,
    #[serde(rename = "contactId")]
    contact_id: String,
    #[serde(rename = "startDate")]
    start_date: String,
    #[serde(rename = "endDate")]
    end_date: String,
}

/// Conjunctive task filters. `None` means no constraint.
///
/// Date bounds are whole days, both inclusive, and compare against the due
/// timestamp at midnight UTC of the given day.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilters {
    pub status: Option<TaskStatus>,
    pub contact_id: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

fn parse_date(field: &str, value: &str) -> Result<Option<NaiveDate>> {
    if value.trim().is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .map(Some)
        .map_err(|e| CrmError::validation(field, format!("'{value}' is not a YYYY-MM-DD date: {e}")))
}

fn midnight(day: NaiveDate) -> DateTime<Utc> {
    day.and_time(chrono::NaiveTime::MIN).and_utc()
}

impl TaskFilters {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Parse a date bound from user input; blank clears it.
    pub fn parse_date(field: &str, value: &str) -> Result<Option<NaiveDate>> {
        parse_date(field, value)
    }

    pub fn matches(&self, task: &Task) -> bool {
        let status_ok = self.status.is_none_or(|s| task.status == s);
        let contact_ok = self
            .contact_id
            .as_deref()
            .is_none_or(|id| task.contact_id == id);
        let start_ok = self.start_date.is_none_or(|d| task.due_date >= midnight(d));
        let end_ok = self.end_date.is_none_or(|d| task.due_date <= midnight(d));
        status_ok && contact_ok && start_ok && end_ok
    }

    /// Keep the tasks matching every set filter, in order.
    pub fn apply<'a>(&self, tasks: impl IntoIterator<Item = &'a Task>) -> Vec<&'a Task> {
        tasks.into_iter().filter(|t| self.matches(t)).collect()
    }

    /// JSON object with `status`, `contactId`, `startDate` and `endDate`.
    pub fn to_json(&self) -> Result<String> {
        let stored = StoredFilters {
            status: self.status.map(|s| s.as_str().to_string()).unwrap_or_default(),
            contact_id: self.contact_id.clone().unwrap_or_default(),
            start_date: self
                .start_date
                .map(|d| d.format(DATE_FORMAT).to_string())
                .unwrap_or_default(),
            end_date: self
                .end_date
                .map(|d| d.format(DATE_FORMAT).to_string())
                .unwrap_or_default(),
        };
        Ok(serde_json::to_string(&stored)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let stored: StoredFilters = serde_json::from_str(json)?;
        let status = match stored.status.trim() {
            "" => None,
            label => Some(label.parse::<TaskStatus>()?),
        };
        let contact_id = Some(stored.contact_id.trim().to_string()).filter(|s| !s.is_empty());
        Ok(Self {
            status,
            contact_id,
            start_date: parse_date("startDate", &stored.start_date)?,
            end_date: parse_date("endDate", &stored.end_date)?,
        })
    }

    /// Saved filters, or the empty default when none are saved or the saved
    /// value cannot be read.
    pub fn load(prefs: &dyn PreferenceStore) -> Self {
        let Some(json) = prefs.get(TASK_FILTERS_KEY) else {
            return Self::default();
        };
        Self::from_json(&json).unwrap_or_else(|e| {
            warn!("Ignoring saved task filters: {}", e);
            Self::default()
        })
    }

    pub fn save(&self, prefs: &dyn PreferenceStore) -> Result<()> {
        prefs.set(TASK_FILTERS_KEY, &self.to_json()?)
    }

    pub fn clear(prefs: &dyn PreferenceStore) -> Result<()> {
        prefs.remove(TASK_FILTERS_KEY)
    }
}
