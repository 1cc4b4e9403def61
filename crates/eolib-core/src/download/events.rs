//! Download events - discriminated union for all download state changes.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::summary::BatchRunSummary;
use super::types::DownloadStatus;

/// Single discriminated union for all download events.
///
/// Everything the UI may observe about the pipeline flows through this
/// type: workers never touch UI state directly, they hand events to the
/// emitter port which marshals them onto the UI thread.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DownloadEvent {
    /// A download task has started running.
    TaskStarted {
        /// Canonical product identity string.
        product: String,
    },

    /// Progress update for a running task.
    TaskProgress {
        /// Canonical product identity string.
        product: String,
        /// Percent of the transfer completed, 0-100.
        percent: u8,
    },

    /// A task reached a terminal status.
    TaskFinished {
        /// Canonical product identity string.
        product: String,
        /// Terminal status the task reached.
        status: DownloadStatus,
        /// Local path of the downloaded archive, on success.
        #[serde(skip_serializing_if = "Option::is_none")]
        downloaded_path: Option<PathBuf>,
        /// Error text for failed / not-available outcomes.
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },

    /// Aggregate progress of the current batch.
    BatchProgress {
        /// Number of queue entries already drained in this batch.
        downloaded: u32,
        /// Total entries pushed in this batch.
        total: u32,
        /// Progress-bar text ("Downloading products: X out of Y").
        text: String,
    },

    /// The batch drained: every task reached a terminal status.
    BatchFinished {
        /// Complete summary of the batch run.
        summary: BatchRunSummary,
    },

    /// A quick-look image became available for a product.
    QuickLookReady {
        /// Canonical product identity string.
        product: String,
    },

    /// A page of product-list results arrived.
    ListProgress {
        /// Number of products fetched so far in this search.
        fetched: usize,
    },

    /// The product-list search failed before any task started.
    ///
    /// Orchestrator-level failures surface as this single event; the UI
    /// shows one error dialog for it.
    ListFailed {
        /// User-facing error message.
        message: String,
    },
}

impl DownloadEvent {
    /// Create a task started event.
    pub fn task_started(product: impl Into<String>) -> Self {
        Self::TaskStarted {
            product: product.into(),
        }
    }

    /// Create a task progress event.
    pub fn task_progress(product: impl Into<String>, percent: u8) -> Self {
        Self::TaskProgress {
            product: product.into(),
            percent,
        }
    }

    /// Create a batch progress event with the standard progress-bar text.
    #[must_use]
    pub fn batch_progress(downloaded: u32, total: u32) -> Self {
        Self::BatchProgress {
            downloaded,
            total,
            text: Self::batch_progress_text(downloaded, total),
        }
    }

    /// Build the progress-bar text shown while a batch is running.
    #[must_use]
    pub fn batch_progress_text(downloaded: u32, total: u32) -> String {
        format!("Downloading products: {downloaded} out of {total}")
    }

    /// Get the product identity from any per-product event.
    #[must_use]
    pub fn product(&self) -> Option<&str> {
        match self {
            Self::TaskStarted { product }
            | Self::TaskProgress { product, .. }
            | Self::TaskFinished { product, .. }
            | Self::QuickLookReady { product } => Some(product),
            Self::BatchProgress { .. }
            | Self::BatchFinished { .. }
            | Self::ListProgress { .. }
            | Self::ListFailed { .. } => None,
        }
    }
}
