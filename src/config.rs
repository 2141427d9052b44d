//! Configuration management for crmdesk.
//!
//! Settings live in `<data-dir>/settings.json`. Every field is optional; a
//! missing file yields defaults, which leave the live backend unconfigured.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{CrmError, IntoCrmError, Result};

/// Environment variable overriding the data directory.
pub const HOME_ENV: &str = "CRMDESK_HOME";

/// Environment variable overriding the backend URL.
pub const BACKEND_URL_ENV: &str = "CRMDESK_BACKEND_URL";

/// Environment variable overriding the backend key.
pub const BACKEND_KEY_ENV: &str = "CRMDESK_BACKEND_KEY";

const SETTINGS_FILE: &str = "settings.json";

fn default_timeout_secs() -> u64 {
    15
}

/// Connection details for the hosted backend.
///
/// # Example settings.json
///
/// ```json
/// {
///   "backend": {
///     "url": "https://xyzcompany.supabase.co",
///     "anonKey": "public-anon-key",
///     "timeoutSecs": 15
///   }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default, rename = "anonKey")]
    pub anon_key: Option<String>,

    #[serde(default = "default_timeout_secs", rename = "timeoutSecs")]
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: None,
            anon_key: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl BackendConfig {
    /// Both the URL and the key are present and non-blank.
    pub fn is_configured(&self) -> bool {
        let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        present(&self.url) && present(&self.anon_key)
    }

    /// Replace the URL and key with any non-empty override.
    pub fn apply_overrides(&mut self, url: Option<String>, anon_key: Option<String>) {
        if let Some(url) = url.filter(|s| !s.trim().is_empty()) {
            self.url = Some(url);
        }
        if let Some(key) = anon_key.filter(|s| !s.trim().is_empty()) {
            self.anon_key = Some(key);
        }
    }

    /// Base URL with any trailing slash removed.
    pub fn base_url(&self) -> Option<&str> {
        self.url.as_deref().map(|u| u.trim_end_matches('/'))
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(url) = self.url.as_deref() {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(CrmError::InvalidConfig {
                    field: "backend.url".to_string(),
                    reason: format!("'{url}' is not an http(s) URL"),
                });
            }
        }
        if self.timeout_secs == 0 {
            return Err(CrmError::InvalidConfig {
                field: "backend.timeoutSecs".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

/// Top-level settings file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub backend: BackendConfig,
}

impl Settings {
    /// Load settings from a data directory.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let settings_path = Self::settings_path(data_dir);

        if !settings_path.exists() {
            debug!("No settings at {}, using defaults", settings_path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&settings_path).into_crm_config()?;
        let settings: Settings = serde_json::from_str(&content).map_err(|e| {
            CrmError::config_with_path(format!("failed to parse settings: {e}"), settings_path.clone())
        })?;
        settings.backend.validate()?;
        Ok(settings)
    }

    /// Get the settings.json path for a data directory
    pub fn settings_path(data_dir: &Path) -> PathBuf {
        data_dir.join(SETTINGS_FILE)
    }
}

/// Resolve the data directory: explicit flag, then `$CRMDESK_HOME`, then the
/// platform config directory.
pub fn resolve_data_dir(explicit: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(dir) = explicit {
        return Ok(dir);
    }
    if let Some(home) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(home));
    }
    dirs::config_dir()
        .map(|dir| dir.join("crmdesk"))
        .ok_or_else(|| CrmError::config("no config directory available; pass --data-dir"))
}
