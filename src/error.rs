//! Error types for the automation hub.
//!
//! Provides structured error handling with:
//! - Machine-readable error codes (`ErrorCode`)
//! - Category-based exit codes (2=db, 3=not_found, 4=validation, etc.)
//! - Retryability flags for callers that re-prompt
//! - Context-aware recovery hints
//! - Structured JSON output for piped / non-TTY consumers

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for hub operations.
pub type Result<T> = std::result::Result<T, Error>;

// ── Error Code ────────────────────────────────────────────────

/// Machine-readable error codes grouped by category.
///
/// Each code maps to a SCREAMING_SNAKE string and a category-based
/// exit code. Scripts match on either.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Database (exit 2)
    NotInitialized,
    DatabaseError,

    // Not Found (exit 3)
    RecordNotFound,
    BackupNotFound,

    // Validation (exit 4)
    RequiredField,
    InvalidArgument,

    // State (exit 5)
    InvalidTransition,

    // Backup integrity (exit 6)
    CorruptBackup,

    // Config (exit 7)
    ConfigError,

    // I/O (exit 8)
    IoError,
    JsonError,

    // External process (exit 9)
    CommandFailed,

    // Internal (exit 1)
    InternalError,
}

impl ErrorCode {
    /// Machine-readable SCREAMING_SNAKE code string.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        match self {
            Self::NotInitialized => "NOT_INITIALIZED",
            Self::DatabaseError => "DATABASE_ERROR",
            Self::RecordNotFound => "RECORD_NOT_FOUND",
            Self::BackupNotFound => "BACKUP_NOT_FOUND",
            Self::RequiredField => "REQUIRED_FIELD",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::InvalidTransition => "INVALID_TRANSITION",
            Self::CorruptBackup => "CORRUPT_BACKUP",
            Self::ConfigError => "CONFIG_ERROR",
            Self::IoError => "IO_ERROR",
            Self::JsonError => "JSON_ERROR",
            Self::CommandFailed => "COMMAND_FAILED",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Category-based exit code (1-9).
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::InternalError => 1,
            Self::NotInitialized | Self::DatabaseError => 2,
            Self::RecordNotFound | Self::BackupNotFound => 3,
            Self::RequiredField | Self::InvalidArgument => 4,
            Self::InvalidTransition => 5,
            Self::CorruptBackup => 6,
            Self::ConfigError => 7,
            Self::IoError | Self::JsonError => 8,
            Self::CommandFailed => 9,
        }
    }

    /// Whether the caller can fix the input and try again.
    ///
    /// True for validation failures and not-found ids (re-list and pick
    /// again). False for storage, I/O and internal failures.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RequiredField
                | Self::InvalidArgument
                | Self::RecordNotFound
                | Self::InvalidTransition
        )
    }
}

// ── Error Enum ────────────────────────────────────────────────

/// Errors that can occur in hub operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Not initialized: run `hub init` first")]
    NotInitialized,

    #[error("{entity} requires a non-empty {field}")]
    RequiredField {
        entity: &'static str,
        field: &'static str,
    },

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: i64 },

    #[error("Backup not found: {}", path.display())]
    BackupNotFound { path: PathBuf },

    #[error("Backup {} failed validation: {reason}", path.display())]
    CorruptBackup { path: PathBuf, reason: String },

    #[error("Cannot move {entity} {id} from {from} to {to}")]
    InvalidTransition {
        entity: &'static str,
        id: i64,
        from: String,
        to: String,
    },

    #[error("Command exited with {status}: {stderr}")]
    CommandFailed { status: String, stderr: String },

    #[error("{op} failed: {source}")]
    Operation {
        op: &'static str,
        #[source]
        source: Box<Error>,
    },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Map this error to its structured `ErrorCode`.
    ///
    /// `Operation` wrappers report the code of the error they wrap.
    #[must_use]
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::NotInitialized => ErrorCode::NotInitialized,
            Self::Database(_) => ErrorCode::DatabaseError,
            Self::NotFound { .. } => ErrorCode::RecordNotFound,
            Self::BackupNotFound { .. } => ErrorCode::BackupNotFound,
            Self::RequiredField { .. } => ErrorCode::RequiredField,
            Self::InvalidArgument(_) => ErrorCode::InvalidArgument,
            Self::InvalidTransition { .. } => ErrorCode::InvalidTransition,
            Self::CorruptBackup { .. } => ErrorCode::CorruptBackup,
            Self::Config(_) => ErrorCode::ConfigError,
            Self::Io(_) => ErrorCode::IoError,
            Self::Json(_) => ErrorCode::JsonError,
            Self::CommandFailed { .. } => ErrorCode::CommandFailed,
            Self::Operation { source, .. } => source.error_code(),
            Self::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Category-based exit code, delegating to the `ErrorCode`.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        self.error_code().exit_code()
    }

    /// Context-aware recovery hint.
    ///
    /// Returns `None` if no actionable suggestion exists.
    #[must_use]
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::NotInitialized => Some("Run `hub init` to create the store".to_string()),

            Self::RequiredField { field, .. } => {
                Some(format!("Provide a value for `{field}` and try again."))
            }

            Self::NotFound { entity, id } => Some(format!(
                "No {entity} with ID {id}. List the {entity}s to see available IDs."
            )),

            Self::BackupNotFound { .. } => {
                Some("Use `hub backup list` to see available backups.".to_string())
            }

            Self::CorruptBackup { .. } => Some(
                "The live store was not touched. Pick another backup with `hub backup list`."
                    .to_string(),
            ),

            Self::InvalidTransition { from, .. } => Some(format!(
                "Check the current status ('{from}') before changing it."
            )),

            Self::Operation { source, .. } => source.hint(),

            Self::Database(_)
            | Self::Io(_)
            | Self::Json(_)
            | Self::InvalidArgument(_)
            | Self::CommandFailed { .. }
            | Self::Config(_)
            | Self::Other(_) => None,
        }
    }

    /// Structured JSON representation for machine consumption.
    ///
    /// Includes error code, message, retryability, exit code, and
    /// optional recovery hint.
    #[must_use]
    pub fn to_structured_json(&self) -> serde_json::Value {
        let code = self.error_code();
        let mut obj = serde_json::json!({
            "error": {
                "code": code.as_str(),
                "message": self.to_string(),
                "retryable": code.is_retryable(),
                "exit_code": code.exit_code(),
            }
        });

        if let Some(hint) = self.hint() {
            obj["error"]["hint"] = serde_json::Value::String(hint);
        }

        obj
    }
}

/// Wrap failures of a named operation so messages read `<op> failed: ...`.
pub trait OperationContext<T> {
    /// Tag the error with the operation name.
    ///
    /// # Errors
    ///
    /// Returns the original error wrapped in [`Error::Operation`].
    fn during(self, op: &'static str) -> Result<T>;
}

impl<T, E: Into<Error>> OperationContext<T> for std::result::Result<T, E> {
    fn during(self, op: &'static str) -> Result<T> {
        self.map_err(|e| Error::Operation {
            op,
            source: Box::new(e.into()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_wrapper_keeps_inner_code() {
        let err: Result<()> = Err(Error::NotFound { entity: "note", id: 7 });
        let wrapped = err.during("update note").unwrap_err();

        assert_eq!(wrapped.error_code(), ErrorCode::RecordNotFound);
        assert_eq!(wrapped.exit_code(), 3);
        assert_eq!(wrapped.to_string(), "update note failed: note not found: 7");
        let Error::Operation { op, source } = &wrapped else {
            panic!("expected an operation wrapper");
        };
        assert_eq!(*op, "update note");
        assert!(matches!(**source, Error::NotFound { id: 7, .. }));
    }

    #[test]
    fn test_structured_json_has_hint() {
        let err = Error::RequiredField {
            entity: "project",
            field: "name",
        };
        let json = err.to_structured_json();

        assert_eq!(json["error"]["code"], "REQUIRED_FIELD");
        assert_eq!(json["error"]["retryable"], true);
        assert_eq!(json["error"]["exit_code"], 4);
        assert!(json["error"]["hint"].as_str().unwrap().contains("name"));
    }

    #[test]
    fn test_storage_errors_not_retryable() {
        let err = Error::Io(std::io::Error::other("disk full"));
        assert!(!err.error_code().is_retryable());
        assert_eq!(err.exit_code(), 8);
        assert!(err.hint().is_none());
    }
}
