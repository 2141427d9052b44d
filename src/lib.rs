//! crmdesk - Multi-app CRM core
//!
//! Tracks apps, contacts, deals and tasks against either a built-in static
//! dataset or a hosted table backend, with a confirmation gate in front of
//! completing tasks whose prerequisites are still open.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`model`] - Entities, drafts and input validation
//! - [`dependency`] - Task prerequisite checks and the confirmation gate
//! - [`backend`] - Remote table storage and the HTTP implementation
//! - [`store`] - Data source adapter owning the four collections
//! - [`views`] - Scope, search, filters, grouping and dashboard projections
//! - [`prefs`] - Persisted local preferences
//! - [`config`] - Configuration loading and validation
//! - [`error`] - Custom error types and handling
//! - [`testing`] - Testing infrastructure (mocks, fixtures, assertions)
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use crmdesk::{DataStore, FilePreferences, TaskSave, SaveOutcome};
//!
//! let prefs = Arc::new(FilePreferences::open("/tmp/crmdesk")?);
//! let mut store = DataStore::new(None, prefs);
//! store.load().await;
//!
//! let mut task = store.tasks()[1].clone();
//! task.status = crmdesk::TaskStatus::Done;
//! if let SaveOutcome::NeedsConfirmation(pending) = store.save_task(TaskSave::Update(task)).await? {
//!     store.confirm_task_save(pending).await?;
//! }
//! ```

pub mod backend;
pub mod config;
pub mod dataset;
pub mod dependency;
pub mod error;
pub mod model;
pub mod prefs;
pub mod store;
pub mod testing;
pub mod views;

// Re-export commonly used types
pub use error::{CrmError, IntoCrmError, Result};

pub use config::{BackendConfig, Settings};

pub use model::{
    App, Contact, Deal, DealStage, NewApp, NewContact, NewDeal, NewTask, Plan, Task, TaskStatus,
};

pub use dependency::{check_dependencies, GateDecision, PendingSave, TaskGate, TaskIndex, TaskSave};

pub use backend::{RemoteStore, RestStore, Table};

pub use prefs::{FilePreferences, PreferenceStore};

pub use store::{Collections, DataSource, DataStore, LoadReport, SaveOutcome};

pub use views::{Scope, TaskFilters};

// Re-export testing types for convenience
pub use testing::{MemoryPreferences, MockRemoteStore};
