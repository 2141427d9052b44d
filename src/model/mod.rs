//! Entity model: apps, contacts, deals and tasks.
//!
//! Every entity serializes with the exact column names of the remote tables
//! (`createdAt`, `closeDate`, `dueDate`, `nextStep`, `contactId`, `appId`,
//! `app_ids`, `dependencyIds`) so rows can be decoded without a mapping layer.
//!
//! Creation goes through the `New*` drafts, which carry everything except the
//! identifier and the server-style defaults. Drafts and full records share the
//! same input-boundary validation.

mod app;
mod contact;
mod deal;
mod task;

pub use app::{App, NewApp, Plan};
pub use contact::{avatar_url, Contact, NewContact};
pub use deal::{clamp_probability, Deal, DealStage, NewDeal};
pub use task::{NewTask, Task, TaskStatus};

use serde::{Deserialize, Deserializer};

use crate::error::{CrmError, Result};

/// Decode `null` as the type's default. Older rows may carry nulls in
/// columns that were added after they were written.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Parse a label or a compact alias (`"Lead In"`, `"lead-in"`, `"leadin"`).
///
/// Comparison ignores case, spaces, dashes and underscores.
pub(crate) fn normalize_label(s: &str) -> String {
    s.chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_'))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Reject blank strings for required fields.
pub(crate) fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(CrmError::validation(field, "is required"));
    }
    Ok(())
}
