use serde::Serialize;

use crate::model::{Contact, Deal};

/// Contacts and deals matching a query, each in collection order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchResults<'a> {
    pub contacts: Vec<&'a Contact>,
    pub deals: Vec<&'a Deal>,
}

impl SearchResults<'_> {
    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty() && self.deals.is_empty()
    }
}

/// Search starts once the query is longer than one character.
pub fn is_search_active(query: &str) -> bool {
    query.chars().count() > 1
}

/// Case-insensitive substring search over contact name, email and company,
/// and deal title.
pub fn search<'a>(query: &str, contacts: &'a [Contact], deals: &'a [Deal]) -> SearchResults<'a> {
    if !is_search_active(query) {
        return SearchResults::default();
    }

    let needle = query.to_lowercase();
    let hit = |field: &str| field.to_lowercase().contains(&needle);

    SearchResults {
        contacts: contacts
            .iter()
            .filter(|c| hit(&c.name) || hit(&c.email) || hit(&c.company))
            .collect(),
        deals: deals.iter().filter(|d| hit(&d.title)).collect(),
    }
}
