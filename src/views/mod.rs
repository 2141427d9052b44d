//! Collection views.
//!
//! Pure projections over the store's collections, recomputed on every read.
//! Nothing here holds state of its own except [`TaskFilters`], which is
//! persisted through the preference store.

mod board;
mod dashboard;
mod detail;
mod filters;
mod search;

pub use board::{group_deals_by_stage, group_tasks_by_status};
pub use dashboard::{dashboard_stats, monthly_revenue, pipeline_summary, DashboardStats, StageSummary};
pub use detail::{
    app_contact_counts, contact_detail, dependency_candidates, dependency_titles, due_status,
    ContactDetail, DueStatus,
};
pub use filters::TaskFilters;
pub use search::{is_search_active, search, SearchResults};

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use crate::error::CrmError;
use crate::model::{App, Contact, Deal, Task};

/// Which app the views are restricted to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Scope {
    #[default]
    All,
    App(String),
}

impl Scope {
    pub fn app_id(&self) -> Option<&str> {
        match self {
            Scope::All => None,
            Scope::App(id) => Some(id),
        }
    }

    pub fn includes_contact(&self, contact: &Contact) -> bool {
        self.app_id().is_none_or(|id| contact.in_app(id))
    }

    pub fn includes_deal(&self, deal: &Deal) -> bool {
        self.app_id().is_none_or(|id| deal.app_id == id)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::All => f.write_str("all"),
            Scope::App(id) => f.write_str(id),
        }
    }
}

impl FromStr for Scope {
    type Err = CrmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(CrmError::validation("app", "scope must be 'all' or an app id"));
        }
        if s.eq_ignore_ascii_case("all") {
            Ok(Scope::All)
        } else {
            Ok(Scope::App(s.to_string()))
        }
    }
}

/// Contacts linked to the scoped app.
pub fn scope_contacts<'a>(scope: &Scope, contacts: &'a [Contact]) -> Vec<&'a Contact> {
    contacts.iter().filter(|c| scope.includes_contact(c)).collect()
}

/// Deals whose app is the scoped app.
pub fn scope_deals<'a>(scope: &Scope, deals: &'a [Deal]) -> Vec<&'a Deal> {
    deals.iter().filter(|d| scope.includes_deal(d)).collect()
}

/// Tasks whose contact is in scope.
pub fn scope_tasks<'a>(scope: &Scope, contacts: &[Contact], tasks: &'a [Task]) -> Vec<&'a Task> {
    if matches!(scope, Scope::All) {
        return tasks.iter().collect();
    }
    let in_scope: HashSet<&str> = scope_contacts(scope, contacts)
        .into_iter()
        .map(|c| c.id.as_str())
        .collect();
    tasks
        .iter()
        .filter(|t| in_scope.contains(t.contact_id.as_str()))
        .collect()
}

/// Header label for the current scope.
pub fn selected_app_name<'a>(scope: &Scope, apps: &'a [App]) -> &'a str {
    match scope {
        Scope::All => "All Apps",
        Scope::App(id) => apps
            .iter()
            .find(|a| &a.id == id)
            .map_or("Unknown App", |a| a.name.as_str()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset;

    #[test]
    fn test_scope_parse() {
        assert_eq!("all".parse::<Scope>().unwrap(), Scope::All);
        assert_eq!("ALL".parse::<Scope>().unwrap(), Scope::All);
        assert_eq!("app_2".parse::<Scope>().unwrap(), Scope::App("app_2".into()));
        assert!("".parse::<Scope>().is_err());
    }

    #[test]
    fn test_scope_all_is_unfiltered() {
        let contacts = dataset::contacts();
        assert_eq!(scope_contacts(&Scope::All, &contacts).len(), contacts.len());
    }

    #[test]
    fn test_scope_contacts_idempotent() {
        let contacts = dataset::contacts();
        let scope = Scope::App("app_1".into());

        let once: Vec<Contact> = scope_contacts(&scope, &contacts).into_iter().cloned().collect();
        let twice: Vec<Contact> = scope_contacts(&scope, &once).into_iter().cloned().collect();

        assert_eq!(once, twice);
        let ids: Vec<_> = once.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["contact_1", "contact_3", "contact_5"]);
    }

    #[test]
    fn test_scope_deals_by_app() {
        let deals = dataset::deals();
        let ids: Vec<_> = scope_deals(&Scope::App("app_3".into()), &deals)
            .into_iter()
            .map(|d| d.id.as_str())
            .collect();
        assert_eq!(ids, vec!["deal_3", "deal_6", "deal_8"]);
    }

    #[test]
    fn test_scope_tasks_follow_contacts() {
        let contacts = dataset::contacts();
        let tasks = dataset::tasks();
        let ids: Vec<_> = scope_tasks(&Scope::App("app_2".into()), &contacts, &tasks)
            .into_iter()
            .map(|t| t.id.as_str())
            .collect();
        assert_eq!(ids, vec!["task_1", "task_4"]);
    }

    #[test]
    fn test_selected_app_name() {
        let apps = dataset::apps();
        assert_eq!(selected_app_name(&Scope::All, &apps), "All Apps");
        assert_eq!(selected_app_name(&Scope::App("app_2".into()), &apps), "LifeWayUSA");
        assert_eq!(selected_app_name(&Scope::App("app_9".into()), &apps), "Unknown App");
    }
}
