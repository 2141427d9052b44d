use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{normalize_label, require};
use crate::error::{CrmError, Result};

/// Subscription tier of a registered app.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Plan {
    Enterprise,
    Pro,
    #[default]
    Free,
}

impl Plan {
    /// All tiers, highest first.
    pub const ALL: [Plan; 3] = [Plan::Enterprise, Plan::Pro, Plan::Free];

    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Enterprise => "Enterprise",
            Plan::Pro => "Pro",
            Plan::Free => "Free",
        }
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Plan {
    type Err = CrmError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = normalize_label(s);
        Plan::ALL
            .into_iter()
            .find(|p| normalize_label(p.as_str()) == wanted)
            .ok_or_else(|| {
                CrmError::validation("plan", format!("unknown plan '{s}' (Enterprise, Pro, Free)"))
            })
    }
}

/// A registered app that contacts and deals are scoped to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct App {
    pub id: String,
    pub name: String,
    pub plan: Plan,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl App {
    pub fn validate(&self) -> Result<()> {
        require("name", &self.name)
    }
}

/// App draft; the id and creation time are assigned on add.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewApp {
    pub name: String,
    pub plan: Plan,
}

impl NewApp {
    pub fn new(name: impl Into<String>, plan: Plan) -> Self {
        Self {
            name: name.into(),
            plan,
        }
    }

    pub fn validate(&self) -> Result<()> {
        require("name", &self.name)
    }

    /// Materialize the draft with a locally assigned id.
    pub fn into_app(self, id: String, created_at: DateTime<Utc>) -> App {
        App {
            id,
            name: self.name,
            plan: self.plan,
            created_at,
        }
    }
}
