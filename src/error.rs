//! Custom error types for crmdesk.
//!
//! Errors are grouped by where they originate so callers can decide how to
//! degrade: backend failures are logged and leave local state untouched,
//! validation failures are reported before anything is persisted.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for crmdesk operations
#[derive(Error, Debug)]
pub enum CrmError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Failed to load configuration
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        path: Option<PathBuf>,
    },

    /// Invalid configuration value
    #[error("Invalid configuration: {field} - {reason}")]
    InvalidConfig { field: String, reason: String },

    // =========================================================================
    // Input Errors
    // =========================================================================
    /// A required field is missing or out of range
    #[error("Invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    /// Record not present in the current collection
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    // =========================================================================
    // Backend Errors
    // =========================================================================
    /// Remote request failed before a response was produced
    #[error("Backend error on '{table}': {message}")]
    Backend { table: String, message: String },

    /// Remote backend answered with a non-success status
    #[error("Backend returned {status} for '{table}': {body}")]
    BackendStatus {
        table: String,
        status: u16,
        body: String,
    },

    /// A row from the backend did not match the expected shape
    #[error("Malformed row from '{table}': {message}")]
    Decode { table: String, message: String },

    // =========================================================================
    // Preference Errors
    // =========================================================================
    /// Preference storage failed
    #[error("Preference storage error: {message}")]
    Preferences { message: String },

    // =========================================================================
    // Wrapped Errors
    // =========================================================================
    /// IO error wrapper
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON error wrapper
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// HTTP transport error wrapper
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// Generic error wrapper
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CrmError {
    // =========================================================================
    // Constructor helpers
    // =========================================================================

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            path: None,
        }
    }

    /// Create a configuration error with path
    pub fn config_with_path(message: impl Into<String>, path: PathBuf) -> Self {
        Self::Config {
            message: message.into(),
            path: Some(path),
        }
    }

    /// Create a validation error for a field
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create a not-found error
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Create a backend error for a table
    pub fn backend(table: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Backend {
            table: table.into(),
            message: message.into(),
        }
    }

    /// Create a decode error for a table
    pub fn decode(table: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            table: table.into(),
            message: message.into(),
        }
    }

    /// Create a preference storage error
    pub fn preferences(message: impl Into<String>) -> Self {
        Self::Preferences {
            message: message.into(),
        }
    }

    // =========================================================================
    // Classification helpers
    // =========================================================================

    /// Check if this error came from the remote backend
    pub fn is_backend(&self) -> bool {
        matches!(
            self,
            Self::Backend { .. } | Self::BackendStatus { .. } | Self::Decode { .. } | Self::Http(_)
        )
    }

    /// Check if this error was raised at the input boundary
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. } | Self::NotFound { .. })
    }

    /// Get error code for exit status
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Validation { .. } => 2,
            Self::NotFound { .. } => 4,
            Self::Backend { .. } | Self::BackendStatus { .. } | Self::Decode { .. } | Self::Http(_) => 5,
            Self::Config { .. } | Self::InvalidConfig { .. } => 7,
            _ => 1,
        }
    }
}

/// Type alias for crmdesk results
pub type Result<T> = std::result::Result<T, CrmError>;

/// Extension trait for converting foreign errors into backend errors
pub trait IntoCrmError<T> {
    fn into_crm_backend(self, table: &str) -> Result<T>;
    fn into_crm_config(self) -> Result<T>;
}

impl<T, E: Into<anyhow::Error>> IntoCrmError<T> for std::result::Result<T, E> {
    fn into_crm_backend(self, table: &str) -> Result<T> {
        self.map_err(|e| CrmError::backend(table, e.into().to_string()))
    }

    fn into_crm_config(self) -> Result<T> {
        self.map_err(|e| CrmError::config(e.into().to_string()))
    }
}
