//! JSON file backed preferences with atomic writes.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use fs2::FileExt;
use tracing::{debug, warn};

use super::PreferenceStore;
use crate::error::{CrmError, Result};

/// Preferences file name inside the data directory.
const PREFS_FILE: &str = "preferences.json";

/// Temporary file suffix for atomic writes.
const TMP_SUFFIX: &str = ".tmp";

/// Lock file suffix for concurrent access prevention.
const LOCK_SUFFIX: &str = ".lock";

/// Preferences stored as one JSON object in `<dir>/preferences.json`.
///
/// The file is read once on open; every change rewrites it through a
/// temporary file and a rename while holding an exclusive lock.
#[derive(Debug)]
pub struct FilePreferences {
    dir: PathBuf,
    values: Mutex<BTreeMap<String, String>>,
}

impl FilePreferences {
    /// Open the preferences in `dir`. A missing file yields empty
    /// preferences; a corrupted one is logged and treated as empty.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        let values = Self::read_values(&dir)?;
        Ok(Self {
            dir,
            values: Mutex::new(values),
        })
    }

    #[must_use]
    pub fn file_path(&self) -> PathBuf {
        self.dir.join(PREFS_FILE)
    }

    #[must_use]
    pub fn tmp_file_path(&self) -> PathBuf {
        self.dir.join(format!("{PREFS_FILE}{TMP_SUFFIX}"))
    }

    #[must_use]
    pub fn lock_file_path(&self) -> PathBuf {
        self.dir.join(format!("{PREFS_FILE}{LOCK_SUFFIX}"))
    }

    fn read_values(dir: &Path) -> Result<BTreeMap<String, String>> {
        let path = dir.join(PREFS_FILE);
        let mut file = match File::open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(e.into()),
        };

        let lock_path = dir.join(format!("{PREFS_FILE}{LOCK_SUFFIX}"));
        if lock_path.exists() {
            let lock_file = File::open(&lock_path)?;
            FileExt::lock_shared(&lock_file)
                .map_err(|e| CrmError::preferences(format!("Failed to acquire lock: {e}")))?;
        }

        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        match serde_json::from_str(&contents) {
            Ok(values) => Ok(values),
            Err(e) => {
                warn!(
                    "Corrupted preferences file at {}: {}. Starting with defaults.",
                    path.display(),
                    e
                );
                Ok(BTreeMap::new())
            }
        }
    }

    fn values(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.values.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn persist(&self, values: &BTreeMap<String, String>) -> Result<()> {
        fs::create_dir_all(&self.dir)?;

        let lock_file = File::create(self.lock_file_path())?;
        FileExt::lock_exclusive(&lock_file)
            .map_err(|e| CrmError::preferences(format!("Failed to acquire lock: {e}")))?;

        let tmp_path = self.tmp_file_path();
        let json = serde_json::to_string_pretty(values)?;

        let mut tmp_file = File::create(&tmp_path)?;
        tmp_file.write_all(json.as_bytes())?;
        tmp_file.sync_all()?;

        fs::rename(&tmp_path, self.file_path())?;
        debug!("Saved preferences to {}", self.file_path().display());

        Ok(())
    }
}

impl PreferenceStore for FilePreferences {
    fn get(&self, key: &str) -> Option<String> {
        self.values().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self.values();
        values.insert(key.to_string(), value.to_string());
        self.persist(&values)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut values = self.values();
        if values.remove(key).is_some() {
            self.persist(&values)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prefs::{DATA_SOURCE_KEY, TASK_FILTERS_KEY};
    use tempfile::TempDir;

    fn test_prefs() -> (FilePreferences, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let prefs = FilePreferences::open(temp_dir.path().join("crmdesk")).expect("open");
        (prefs, temp_dir)
    }

    #[test]
    fn test_missing_file_is_empty() {
        let (prefs, _temp_dir) = test_prefs();
        assert!(prefs.get(DATA_SOURCE_KEY).is_none());
        assert!(!prefs.file_path().exists());
    }

    #[test]
    fn test_set_creates_directory_and_file() {
        let (prefs, _temp_dir) = test_prefs();
        prefs.set(DATA_SOURCE_KEY, "live").expect("set");

        assert!(prefs.file_path().exists());
        assert!(!prefs.tmp_file_path().exists());
        assert_eq!(prefs.get(DATA_SOURCE_KEY).as_deref(), Some("live"));
    }

    #[test]
    fn test_values_survive_reopen() {
        let (prefs, _temp_dir) = test_prefs();
        prefs.set(DATA_SOURCE_KEY, "live").expect("set");
        prefs.set(TASK_FILTERS_KEY, r#"{"status":"Done"}"#).expect("set");

        let reopened = FilePreferences::open(&prefs.dir).expect("reopen");
        assert_eq!(reopened.get(DATA_SOURCE_KEY).as_deref(), Some("live"));
        assert_eq!(
            reopened.get(TASK_FILTERS_KEY).as_deref(),
            Some(r#"{"status":"Done"}"#)
        );
    }

    #[test]
    fn test_corrupted_file_treated_as_empty() {
        let (prefs, _temp_dir) = test_prefs();
        fs::create_dir_all(&prefs.dir).expect("create dir");
        fs::write(prefs.file_path(), "not valid json {{{").expect("write corrupted file");

        let reopened = FilePreferences::open(&prefs.dir).expect("open should not error");
        assert!(reopened.get(DATA_SOURCE_KEY).is_none());

        reopened.set(DATA_SOURCE_KEY, "mock").expect("set repairs the file");
        let repaired = FilePreferences::open(&prefs.dir).expect("open");
        assert_eq!(repaired.get(DATA_SOURCE_KEY).as_deref(), Some("mock"));
    }

    #[test]
    fn test_remove_key() {
        let (prefs, _temp_dir) = test_prefs();
        prefs.set(TASK_FILTERS_KEY, "{}").expect("set");
        prefs.remove(TASK_FILTERS_KEY).expect("remove");
        prefs.remove(TASK_FILTERS_KEY).expect("second remove is a no-op");

        let reopened = FilePreferences::open(&prefs.dir).expect("reopen");
        assert!(reopened.get(TASK_FILTERS_KEY).is_none());
    }

    #[test]
    fn test_lock_released_between_writes() {
        let (prefs, _temp_dir) = test_prefs();
        prefs.set(DATA_SOURCE_KEY, "mock").expect("first set");

        let lock_file = File::open(prefs.lock_file_path()).expect("open lock file");
        FileExt::lock_exclusive(&lock_file).expect("acquire lock");
        FileExt::unlock(&lock_file).expect("release lock");

        prefs.set(DATA_SOURCE_KEY, "live").expect("set after unlock");
    }
}
