//! Testing infrastructure for crmdesk.
//!
//! This module provides mocks, fixtures, and assertions for testing the data
//! store and views without a real backend or preference file.
//!
//! # Architecture
//!
//! The testing infrastructure is organized into:
//! - **Mocks**: In-memory [`RemoteStore`](crate::backend::RemoteStore) and
//!   [`PreferenceStore`](crate::prefs::PreferenceStore) with injectable failures
//! - **Fixtures**: Temporary data directories and pre-loaded stores (test-only)
//! - **Assertions**: Custom assertions for domain-specific testing
//!
//! # Example
//!
//! ```rust,ignore
//! use crmdesk::testing::{MockRemoteStore, MemoryPreferences};
//!
//! let remote = MockRemoteStore::new()
//!     .with_dataset()
//!     .with_failing_table(Table::Tasks, "timeout");
//!
//! let prefs = MemoryPreferences::new().with_value("dataSource", "live");
//! ```

pub mod assertions;
#[cfg(test)]
pub mod fixtures;
pub mod mocks;

// Re-export commonly used types
pub use assertions::*;
#[cfg(test)]
pub use fixtures::*;
pub use mocks::*;
