use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::require;
use crate::error::{CrmError, Result};

/// Generated avatar reference for a new contact, seeded by the current time.
pub fn avatar_url(seed_millis: i64) -> String {
    format!("https://picsum.photos/seed/{seed_millis}/100/100")
}

/// A person tracked in the directory, linked to one or more apps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(rename = "avatarUrl", default, deserialize_with = "super::null_as_default")]
    pub avatar_url: String,
    pub company: String,
    /// References to [`super::App`] ids; not checked against the registry.
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub app_ids: Vec<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl Contact {
    /// Whether this contact belongs to the given app.
    pub fn in_app(&self, app_id: &str) -> bool {
        self.app_ids.iter().any(|id| id == app_id)
    }

    pub fn validate(&self) -> Result<()> {
        validate_fields(&self.name, &self.email, &self.company, &self.app_ids)
    }
}

/// Contact draft. The avatar reference is attached on add, before the record
/// is sent to the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewContact {
    pub name: String,
    pub email: String,
    pub company: String,
    #[serde(default)]
    pub app_ids: Vec<String>,
}

impl NewContact {
    pub fn validate(&self) -> Result<()> {
        validate_fields(&self.name, &self.email, &self.company, &self.app_ids)
    }
}

fn validate_fields(name: &str, email: &str, company: &str, app_ids: &[String]) -> Result<()> {
    require("name", name)?;
    require("email", email)?;
    require("company", company)?;
    if app_ids.iter().all(|id| id.trim().is_empty()) {
        return Err(CrmError::validation("app_ids", "at least one app is required"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> NewContact {
        NewContact {
            name: "Grace Hopper".into(),
            email: "grace@example.com".into(),
            company: "Navy".into(),
            app_ids: vec!["app_1".into()],
        }
    }

    #[test]
    fn test_new_contact_validation() {
        assert!(draft().validate().is_ok());

        let mut missing_email = draft();
        missing_email.email.clear();
        assert!(missing_email.validate().is_err());

        let mut no_apps = draft();
        no_apps.app_ids.clear();
        let err = no_apps.validate().unwrap_err();
        assert!(err.to_string().contains("app_ids"));
    }

    #[test]
    fn test_contact_decodes_without_avatar() {
        let json = r#"{"id":"c1","name":"A","email":"a@x","company":"X","app_ids":["app_2"],"createdAt":"2023-05-01T10:00:00Z"}"#;
        let contact: Contact = serde_json::from_str(json).unwrap();
        assert!(contact.avatar_url.is_empty());
        assert!(contact.in_app("app_2"));
        assert!(!contact.in_app("app_1"));
    }

    #[test]
    fn test_avatar_url_uses_seed() {
        assert_eq!(avatar_url(42), "https://picsum.photos/seed/42/100/100");
    }
}
