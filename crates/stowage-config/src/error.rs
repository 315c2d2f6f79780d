//! Error types for settings editing and submission.

use std::io;
use std::path::PathBuf;

use stowage_i18n::{translate, translate_with};
use thiserror::Error;

use crate::validate::FieldErrors;

/// Where an error should be shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSurface {
    /// Attached to individual form fields.
    Inline,
    /// Shown as a general, non-blocking alert.
    Alert,
}

/// Primary error type for settings operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// One or more draft fields violated a rule.
    #[error("draft failed validation")]
    FieldValidation(#[from] FieldErrors),
    /// Attempted to modify a field that is locked once set.
    #[error("immutable configuration field '{field}'")]
    ImmutableField {
        /// Name of the immutable field.
        field: &'static str,
    },
    /// Draft operation referenced a user slot that does not exist.
    #[error("no user at index {index}")]
    UserIndexOutOfRange {
        /// Offending index.
        index: usize,
    },
    /// Authentication would be left enabled with no users.
    #[error("at least one user must be configured or authentication must be disabled")]
    InvalidAuthState,
    /// Two users share a name.
    #[error("user name '{name}' is configured more than once")]
    DuplicateUserName {
        /// Colliding user name.
        name: String,
    },
    /// The hash service failed for a pending credential.
    #[error("failed to hash password for user '{user}'")]
    HashService {
        /// User whose password could not be hashed.
        user: String,
        /// Hash service failure.
        #[source]
        source: anyhow::Error,
    },
    /// The current configuration could not be fetched.
    #[error("failed to fetch configuration")]
    Fetch {
        /// Backend failure.
        #[source]
        source: anyhow::Error,
    },
    /// The set-configuration call failed.
    #[error("failed to commit configuration")]
    Commit {
        /// Backend failure.
        #[source]
        source: anyhow::Error,
    },
    /// File system operation failed.
    #[error("filesystem operation '{operation}' failed for {}", .path.display())]
    Io {
        /// Operation identifier.
        operation: &'static str,
        /// Path involved in the operation.
        path: PathBuf,
        /// Source IO error.
        source: io::Error,
    },
    /// A persisted document could not be parsed.
    #[error("configuration document {} is invalid", .path.display())]
    Parse {
        /// Path of the document.
        path: PathBuf,
        /// JSON parse failure.
        source: serde_json::Error,
    },
}

impl ConfigError {
    /// Where the UI should surface this error.
    #[must_use]
    pub const fn surface(&self) -> ErrorSurface {
        match self {
            Self::FieldValidation(_) => ErrorSurface::Inline,
            _ => ErrorSurface::Alert,
        }
    }

    /// Whether the error came from local checks and therefore never reached the network.
    #[must_use]
    pub const fn is_local(&self) -> bool {
        matches!(
            self,
            Self::FieldValidation(_)
                | Self::ImmutableField { .. }
                | Self::UserIndexOutOfRange { .. }
                | Self::InvalidAuthState
                | Self::DuplicateUserName { .. }
        )
    }

    /// Display message in the active locale.
    #[must_use]
    pub fn localized(&self) -> String {
        match self {
            Self::FieldValidation(errors) => errors
                .iter()
                .map(|error| format!("{}: {}", error.path, error.localized()))
                .collect::<Vec<_>>()
                .join("; "),
            Self::ImmutableField { .. } => translate("error.immutable_instance"),
            Self::InvalidAuthState => translate("error.invalid_auth_state"),
            Self::DuplicateUserName { name } => {
                translate_with("error.duplicate_user", &[("name", name.as_str())])
            }
            Self::HashService { user, source } => {
                let detail = format!("{source:#}");
                translate_with(
                    "error.hash_failed",
                    &[("name", user.as_str()), ("error", detail.as_str())],
                )
            }
            Self::Fetch { source } => {
                let detail = format!("{source:#}");
                translate_with("error.fetch_failed", &[("error", detail.as_str())])
            }
            Self::Commit { source } => {
                let detail = format!("{source:#}");
                translate_with("error.commit_failed", &[("error", detail.as_str())])
            }
            other => other.to_string(),
        }
    }
}

/// Convenience alias for settings results.
pub type ConfigResult<T> = Result<T, ConfigError>;
