//! Mock implementations of the storage seams.
//!
//! These mocks provide controllable test doubles for the remote backend and
//! the preference store, enabling deterministic tests of the data store.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::backend::{encode_row, Record, RemoteStore, Table};
use crate::dataset;
use crate::error::{CrmError, Result};
use crate::prefs::PreferenceStore;

fn guard<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// In-memory remote backend.
///
/// Tables hold JSON rows. Inserted rows without an id get a sequential one,
/// and apps or contacts without `createdAt` get the current time, the way a
/// hosted table fills column defaults.
///
/// # Example
///
/// ```rust,ignore
/// let remote = MockRemoteStore::new()
///     .with_dataset()
///     .with_failing_table(Table::Deals, "connection reset");
///
/// assert!(remote.select_ordered(Table::Deals, "closeDate", true).await.is_err());
/// ```
#[derive(Debug)]
pub struct MockRemoteStore {
    tables: Mutex<HashMap<Table, Vec<Value>>>,
    error: Option<String>,
    failing_tables: HashSet<Table>,
    failing_writes: AtomicBool,
    call_count: AtomicU32,
    next_id: AtomicU32,
}

impl Clone for MockRemoteStore {
    fn clone(&self) -> Self {
        Self {
            tables: Mutex::new(guard(&self.tables).clone()),
            error: self.error.clone(),
            failing_tables: self.failing_tables.clone(),
            failing_writes: AtomicBool::new(self.failing_writes.load(Ordering::SeqCst)),
            call_count: AtomicU32::new(self.call_count.load(Ordering::SeqCst)),
            next_id: AtomicU32::new(self.next_id.load(Ordering::SeqCst)),
        }
    }
}

impl Default for MockRemoteStore {
    fn default() -> Self {
        Self {
            tables: Mutex::new(HashMap::new()),
            error: None,
            failing_tables: HashSet::new(),
            failing_writes: AtomicBool::new(false),
            call_count: AtomicU32::new(0),
            next_id: AtomicU32::new(1),
        }
    }
}

impl MockRemoteStore {
    /// Create a new mock with empty tables.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate a table with typed records.
    #[must_use]
    pub fn with_records<T: Record>(self, records: &[T]) -> Self {
        let rows = records
            .iter()
            .filter_map(|r| encode_row(T::TABLE, r).ok())
            .collect();
        self.with_rows(T::TABLE, rows)
    }

    /// Pre-populate a table with raw rows.
    #[must_use]
    pub fn with_rows(self, table: Table, rows: Vec<Value>) -> Self {
        guard(&self.tables).insert(table, rows);
        self
    }

    /// Pre-populate every table from the static dataset.
    #[must_use]
    pub fn with_dataset(self) -> Self {
        self.with_records(&dataset::apps())
            .with_records(&dataset::contacts())
            .with_records(&dataset::deals())
            .with_records(&dataset::tasks())
    }

    /// Configure every call to fail with an error.
    #[must_use]
    pub fn with_error(mut self, error: &str) -> Self {
        self.error = Some(error.to_string());
        self
    }

    /// Configure calls against one table to fail.
    #[must_use]
    pub fn with_failing_table(mut self, table: Table, error: &str) -> Self {
        self.failing_tables.insert(table);
        self.error.get_or_insert_with(|| error.to_string());
        self
    }

    /// Configure inserts, updates and deletes to fail while selects succeed.
    #[must_use]
    pub fn with_failing_writes(self) -> Self {
        self.set_failing_writes(true);
        self
    }

    /// Toggle write failures on a mock already shared with a store.
    pub fn set_failing_writes(&self, failing: bool) {
        self.failing_writes.store(failing, Ordering::SeqCst);
    }

    /// Get the number of backend calls made.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Current rows of a table.
    pub fn rows(&self, table: Table) -> Vec<Value> {
        guard(&self.tables).get(&table).cloned().unwrap_or_default()
    }

    fn begin(&self, table: Table) -> Result<()> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        let fails = self.failing_tables.is_empty() || self.failing_tables.contains(&table);
        match &self.error {
            Some(error) if fails => Err(CrmError::backend(table.name(), error.clone())),
            _ => Ok(()),
        }
    }

    fn begin_write(&self, table: Table) -> Result<()> {
        self.begin(table)?;
        if self.failing_writes.load(Ordering::SeqCst) {
            return Err(CrmError::backend(table.name(), "write rejected"));
        }
        Ok(())
    }
}

fn row_id(row: &Value) -> Option<&str> {
    row.get("id").and_then(Value::as_str)
}

#[async_trait]
impl RemoteStore for MockRemoteStore {
    async fn select_ordered(&self, table: Table, column: &str, descending: bool) -> Result<Vec<Value>> {
        self.begin(table)?;
        let mut rows = self.rows(table);
        let key = |row: &Value| row.get(column).and_then(Value::as_str).map(str::to_string);
        rows.sort_by(|a, b| {
            let ordering = key(a).cmp(&key(b));
            if descending {
                ordering.reverse()
            } else {
                ordering
            }
        });
        Ok(rows)
    }

    async fn insert(&self, table: Table, mut row: Value) -> Result<Value> {
        self.begin_write(table)?;
        let Some(fields) = row.as_object_mut() else {
            return Err(CrmError::backend(table.name(), "row must be an object"));
        };
        if !fields.contains_key("id") {
            let n = self.next_id.fetch_add(1, Ordering::SeqCst);
            fields.insert("id".into(), Value::String(format!("{}-{n}", table.name())));
        }
        if matches!(table, Table::Apps | Table::Contacts) && !fields.contains_key("createdAt") {
            fields.insert("createdAt".into(), Value::String(Utc::now().to_rfc3339()));
        }

        guard(&self.tables).entry(table).or_default().push(row.clone());
        Ok(row)
    }

    async fn update(&self, table: Table, id: &str, row: Value) -> Result<Value> {
        self.begin_write(table)?;
        let mut tables = guard(&self.tables);
        let stored = tables
            .get_mut(&table)
            .and_then(|rows| rows.iter_mut().find(|r| row_id(r) == Some(id)))
            .ok_or_else(|| CrmError::backend(table.name(), format!("no row with id {id}")))?;

        if let (Some(target), Some(changes)) = (stored.as_object_mut(), row.as_object()) {
            for (key, value) in changes {
                target.insert(key.clone(), value.clone());
            }
        }
        Ok(stored.clone())
    }

    async fn delete(&self, table: Table, id: &str) -> Result<()> {
        self.begin_write(table)?;
        if let Some(rows) = guard(&self.tables).get_mut(&table) {
            rows.retain(|r| row_id(r) != Some(id));
        }
        Ok(())
    }
}

/// In-memory preference store.
#[derive(Debug, Default)]
pub struct MemoryPreferences {
    values: Mutex<HashMap<String, String>>,
    fail_writes: bool,
}

impl MemoryPreferences {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-set a value.
    #[must_use]
    pub fn with_value(self, key: &str, value: &str) -> Self {
        guard(&self.values).insert(key.to_string(), value.to_string());
        self
    }

    /// Make every write fail.
    #[must_use]
    pub fn with_failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }
}

impl PreferenceStore for MemoryPreferences {
    fn get(&self, key: &str) -> Option<String> {
        guard(&self.values).get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        if self.fail_writes {
            return Err(CrmError::preferences(format!("cannot write {key}")));
        }
        guard(&self.values).insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        if self.fail_writes {
            return Err(CrmError::preferences(format!("cannot remove {key}")));
        }
        guard(&self.values).remove(key);
        Ok(())
    }
}
