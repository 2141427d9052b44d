use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::dependency::TaskIndex;
use crate::model::{App, Contact, Deal, Task};
use crate::store::Collections;

/// Days ahead within which an open task counts as due soon.
const DUE_SOON_DAYS: i64 = 3;

/// A contact with everything linked to it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContactDetail<'a> {
    pub contact: &'a Contact,
    pub deals: Vec<&'a Deal>,
    pub tasks: Vec<&'a Task>,
    pub apps: Vec<&'a App>,
}

pub fn contact_detail<'a>(contact_id: &str, data: &'a Collections) -> Option<ContactDetail<'a>> {
    let contact = data.contacts.iter().find(|c| c.id == contact_id)?;
    Some(ContactDetail {
        contact,
        deals: data.deals.iter().filter(|d| d.contact_id == contact_id).collect(),
        tasks: data.tasks.iter().filter(|t| t.contact_id == contact_id).collect(),
        apps: data.apps.iter().filter(|a| contact.in_app(&a.id)).collect(),
    })
}

/// Titles of a task's prerequisites that still exist.
pub fn dependency_titles<'a>(task: &Task, index: &TaskIndex<'a>) -> Vec<&'a str> {
    task.dependency_ids
        .iter()
        .filter_map(|id| index.get(id))
        .map(|dep| dep.title.as_str())
        .collect()
}

/// Tasks that may be picked as prerequisites: open tasks other than the one
/// being edited.
pub fn dependency_candidates<'a>(tasks: &'a [Task], editing: Option<&str>) -> Vec<&'a Task> {
    tasks
        .iter()
        .filter(|t| editing != Some(t.id.as_str()) && !t.status.is_done())
        .collect()
}

/// How close a due date is, compared by calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DueStatus {
    Overdue,
    /// Due today (0) or within the next few days.
    DueSoon(i64),
    OnTime,
}

impl DueStatus {
    pub fn label(&self) -> String {
        match self {
            DueStatus::Overdue => "Overdue".to_string(),
            DueStatus::DueSoon(days) => format!("Due in {days} day(s)"),
            DueStatus::OnTime => String::new(),
        }
    }
}

pub fn due_status(due: DateTime<Utc>, today: NaiveDate) -> DueStatus {
    let days = (due.date_naive() - today).num_days();
    if days < 0 {
        DueStatus::Overdue
    } else if days <= DUE_SOON_DAYS {
        DueStatus::DueSoon(days)
    } else {
        DueStatus::OnTime
    }
}

/// Number of contacts linked to each app, in registry order.
pub fn app_contact_counts<'a>(apps: &'a [App], contacts: &[Contact]) -> Vec<(&'a App, usize)> {
    apps.iter()
        .map(|app| (app, contacts.iter().filter(|c| c.in_app(&app.id)).count()))
        .collect()
}
