//! Download error types.
//!
//! These errors are designed to be serializable and not depend on external
//! error types like `std::io::Error`. For I/O errors, we capture the kind
//! and message as strings.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::RepositoryId;

/// Error type for download operations.
///
/// Designed to be serializable across adapter boundaries without depending
/// on non-serializable types like `std::io::Error`.
#[derive(Clone, Debug, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum DownloadError {
    /// I/O error during file operations.
    #[error("I/O error ({kind}): {message}")]
    Io {
        /// The kind of I/O error (e.g., "not found", "permission denied").
        kind: String,
        /// Detailed error message.
        message: String,
    },

    /// The remote transfer itself failed.
    #[error("Transfer failed: {message}")]
    Transfer {
        /// Detailed error message as reported by the provider.
        message: String,
    },

    /// Download was cancelled by the user.
    #[error("Download cancelled")]
    Cancelled,

    /// No repository with this identifier is configured.
    ///
    /// This is a configuration defect, not a runtime condition: callers
    /// must not retry it.
    #[error("Unknown repository: {repository}")]
    UnknownRepository {
        /// The repository identifier that has no configuration entry.
        repository: String,
    },

    /// The local catalog rejected or failed to persist a downloaded product.
    #[error("Catalog error: {message}")]
    Catalog {
        /// Detailed error message.
        message: String,
    },

    /// General/uncategorized error.
    #[error("{message}")]
    Other {
        /// Error message.
        message: String,
    },
}

impl DownloadError {
    /// Create an I/O error from kind and message strings.
    pub fn io(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Io {
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// Create an I/O error from a `std::io::Error`.
    ///
    /// This captures the error kind name and message for serialization.
    #[must_use]
    pub fn from_io_error(err: &std::io::Error) -> Self {
        let kind = err.kind();
        Self::Io {
            kind: format!("{kind:?}"),
            message: err.to_string(),
        }
    }

    /// Create a transfer error.
    pub fn transfer(message: impl Into<String>) -> Self {
        Self::Transfer {
            message: message.into(),
        }
    }

    /// Create an unknown-repository error.
    #[must_use]
    pub fn unknown_repository(repository: &RepositoryId) -> Self {
        Self::UnknownRepository {
            repository: repository.to_string(),
        }
    }

    /// Create a catalog error.
    pub fn catalog(message: impl Into<String>) -> Self {
        Self::Catalog {
            message: message.into(),
        }
    }

    /// Create a generic error.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Check if this is a cancellation.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Check if this error means the product is archived off-line.
    ///
    /// Providers report long-term-archive products with a message containing
    /// "is not online" (matched case-insensitively); such a product gets the
    /// distinct `NotAvailable` terminal status instead of `Failed`.
    #[must_use]
    pub fn indicates_offline(&self) -> bool {
        self.to_string().to_lowercase().contains("is not online")
    }

    /// Convert to a user-friendly message.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Io { message, .. } => format!("File operation failed: {message}"),
            Self::Transfer { message } => format!("Download failed: {message}"),
            Self::Cancelled => "Download was cancelled.".to_string(),
            Self::UnknownRepository { repository } => {
                format!("No repository '{repository}' is configured.")
            }
            Self::Catalog { message } => {
                format!("The product was downloaded but could not be catalogued: {message}")
            }
            Self::Other { message } => message.clone(),
        }
    }
}

/// Convenience result type for download operations.
pub type DownloadResult<T> = Result<T, DownloadError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_from_std() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = DownloadError::from_io_error(&io_err);

        match err {
            DownloadError::Io { kind, message } => {
                assert_eq!(kind, "NotFound");
                assert!(message.contains("file not found"));
            }
            _ => panic!("Expected Io variant"),
        }
    }

    #[test]
    fn test_error_serialization() {
        let err = DownloadError::transfer("connection reset");
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("connection reset"));

        let parsed: DownloadError = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, err);
    }

    #[test]
    fn test_indicates_offline_case_insensitive() {
        let err = DownloadError::transfer("product S2A_X IS NOT ONLINE, retrieval scheduled");
        assert!(err.indicates_offline());

        let err = DownloadError::transfer("the requested product is not online");
        assert!(err.indicates_offline());

        let err = DownloadError::transfer("connection reset by peer");
        assert!(!err.indicates_offline());
    }

    #[test]
    fn test_is_cancelled() {
        assert!(DownloadError::Cancelled.is_cancelled());
        assert!(!DownloadError::transfer("boom").is_cancelled());
    }

    #[test]
    fn test_user_messages() {
        let err = DownloadError::unknown_repository(&RepositoryId::new("scihub"));
        assert!(err.user_message().contains("scihub"));
    }
}
