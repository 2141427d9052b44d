//! Persisted local preferences.
//!
//! Two keys are stored: the preferred data source and the saved task
//! filters. Values are opaque strings; callers own their encoding.

mod file;

pub use file::FilePreferences;

use crate::error::Result;

/// Key holding `"mock"` or `"live"`.
pub const DATA_SOURCE_KEY: &str = "dataSource";

/// Key holding the JSON-encoded task filters.
pub const TASK_FILTERS_KEY: &str = "taskFilters";

/// A string key/value store that survives restarts.
pub trait PreferenceStore: Send + Sync {
    /// Current value for `key`, if one was ever set.
    fn get(&self, key: &str) -> Option<String>;

    /// Set `key` and persist immediately.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Forget `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}
