//! Test fixtures for creating reproducible test environments.
//!
//! Provides temporary data directories and pre-loaded stores.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

use super::mocks::{MemoryPreferences, MockRemoteStore};
use crate::config::Settings;
use crate::error::Result;
use crate::prefs::DATA_SOURCE_KEY;
use crate::store::{DataStore, LoadReport};

/// A temporary data directory.
///
/// Automatically cleans up when dropped.
pub struct DataDirFixture {
    temp_dir: TempDir,
}

impl DataDirFixture {
    /// Create an empty data directory.
    ///
    /// # Panics
    ///
    /// Panics if temporary directory creation fails.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            temp_dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Create a data directory whose settings point at a backend.
    ///
    /// # Panics
    ///
    /// Panics if the settings file cannot be written.
    #[must_use]
    pub fn with_backend(url: &str, key: &str) -> Self {
        let fixture = Self::empty();
        let settings = serde_json::json!({
            "backend": { "url": url, "anonKey": key, "timeoutSecs": 2 }
        });
        std::fs::write(fixture.settings_path(), settings.to_string())
            .expect("Failed to write settings.json");
        fixture
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn settings_path(&self) -> PathBuf {
        Settings::settings_path(self.path())
    }

    pub fn settings(&self) -> Result<Settings> {
        Settings::load(self.path())
    }
}

/// A mock-mode store with the dataset loaded.
pub async fn loaded_mock_store() -> DataStore {
    let mut store = DataStore::new(None, Arc::new(MemoryPreferences::new()));
    store.load().await;
    store
}

/// A live-mode store over `remote`, loaded.
pub async fn loaded_live_store(remote: MockRemoteStore) -> (DataStore, LoadReport) {
    let prefs = MemoryPreferences::new().with_value(DATA_SOURCE_KEY, "live");
    let mut store = DataStore::new(Some(Arc::new(remote)), Arc::new(prefs));
    let report = store.load().await;
    (store, report)
}

/// A live-mode store whose backend fails every call.
pub async fn failing_live_store() -> (DataStore, LoadReport) {
    loaded_live_store(MockRemoteStore::new().with_error("connection refused")).await
}
