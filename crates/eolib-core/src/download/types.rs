//! Status and progress types for the download pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::domain::ProductId;
use crate::ports::SavedProductRecord;

/// Status of a download task.
///
/// The task state machine is
/// `Pending → Downloading → {Downloaded | Failed | NotAvailable | Stopped}`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloadStatus {
    /// Queued, transfer not started yet.
    Pending,
    /// Transfer in progress.
    Downloading,
    /// Cancelled by the user before or during the transfer.
    Stopped,
    /// Transferred and saved to the local catalog.
    Downloaded,
    /// Transfer or catalog save failed.
    Failed,
    /// The product is archived off-line at the provider and cannot be
    /// fetched right now. Terminal, but distinct from `Failed`.
    NotAvailable,
}

impl DownloadStatus {
    /// Convert to string representation for persistence and logs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Downloading => "downloading",
            Self::Stopped => "stopped",
            Self::Downloaded => "downloaded",
            Self::Failed => "failed",
            Self::NotAvailable => "not_available",
        }
    }

    /// Parse from string representation.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s {
            "downloading" => Self::Downloading,
            "stopped" => Self::Stopped,
            "downloaded" => Self::Downloaded,
            "failed" => Self::Failed,
            "not_available" => Self::NotAvailable,
            // "pending" or unknown values default to Pending
            _ => Self::Pending,
        }
    }

    /// Whether this is a terminal status.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending | Self::Downloading)
    }
}

/// Progress update sent through a task's watch channel.
///
/// The percent value is only meaningful while the task is `Downloading`
/// (or terminally `Downloaded`, where it is 100).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressUpdate {
    /// Percent of the transfer completed, 0-100, monotone per task.
    pub percent: u8,
    /// Monotonically increasing sequence number for change detection.
    pub seq: u64,
}

impl ProgressUpdate {
    /// Create a new progress update with a sequence number.
    #[must_use]
    pub const fn new(percent: u8, seq: u64) -> Self {
        Self { percent, seq }
    }
}

/// Terminal result of a single download task.
#[derive(Clone, Debug)]
pub struct DownloadOutcome {
    /// The product this task was downloading.
    pub product: ProductId,
    /// Terminal status reached by the task.
    pub status: DownloadStatus,
    /// Local path of the downloaded archive; set only on success.
    pub downloaded_path: Option<PathBuf>,
    /// Catalog record created for the product; set only on success.
    pub saved: Option<SavedProductRecord>,
    /// Human-readable error text for `Failed`/`NotAvailable` outcomes.
    pub error: Option<String>,
}

impl DownloadOutcome {
    /// Outcome for a task cancelled before or during the transfer.
    #[must_use]
    pub const fn stopped(product: ProductId) -> Self {
        Self {
            product,
            status: DownloadStatus::Stopped,
            downloaded_path: None,
            saved: None,
            error: None,
        }
    }

    /// Outcome for a failed task.
    pub fn failed(product: ProductId, error: impl Into<String>) -> Self {
        Self {
            product,
            status: DownloadStatus::Failed,
            downloaded_path: None,
            saved: None,
            error: Some(error.into()),
        }
    }

    /// Outcome for a product that is archived off-line at the provider.
    pub fn not_available(product: ProductId, error: impl Into<String>) -> Self {
        Self {
            product,
            status: DownloadStatus::NotAvailable,
            downloaded_path: None,
            saved: None,
            error: Some(error.into()),
        }
    }

    /// Outcome for a downloaded and catalogued product.
    #[must_use]
    pub const fn downloaded(
        product: ProductId,
        downloaded_path: PathBuf,
        saved: SavedProductRecord,
    ) -> Self {
        Self {
            product,
            status: DownloadStatus::Downloaded,
            downloaded_path: Some(downloaded_path),
            saved: Some(saved),
            error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for status in [
            DownloadStatus::Pending,
            DownloadStatus::Downloading,
            DownloadStatus::Stopped,
            DownloadStatus::Downloaded,
            DownloadStatus::Failed,
            DownloadStatus::NotAvailable,
        ] {
            assert_eq!(DownloadStatus::parse(status.as_str()), status);
        }
    }

    #[test]
    fn test_unknown_status_defaults_to_pending() {
        assert_eq!(DownloadStatus::parse("bogus"), DownloadStatus::Pending);
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!DownloadStatus::Pending.is_terminal());
        assert!(!DownloadStatus::Downloading.is_terminal());
        assert!(DownloadStatus::Stopped.is_terminal());
        assert!(DownloadStatus::Downloaded.is_terminal());
        assert!(DownloadStatus::Failed.is_terminal());
        assert!(DownloadStatus::NotAvailable.is_terminal());
    }

    #[test]
    fn test_progress_update_default_is_zero() {
        let update = ProgressUpdate::default();
        assert_eq!(update.percent, 0);
        assert_eq!(update.seq, 0);
    }
}
