//! Batch run summaries.
//!
//! A batch run spans the idle→busy→idle lifetime of the download pool.
//! While the pool is busy the manager aggregates per-product outcomes;
//! when the last task finishes the aggregate is published as one summary
//! event so the UI can render a recap.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

use super::types::DownloadStatus;

/// Terminal outcome of one product within a batch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeDetail {
    /// Canonical product identity string (`repository/name`).
    pub product: String,
    /// Terminal status the task reached.
    pub status: DownloadStatus,
    /// Local path of the downloaded archive, if the task succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub downloaded_path: Option<PathBuf>,
    /// Error text for failed / not-available outcomes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Summary of one batch run (busy→idle span of the download pool).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BatchRunSummary {
    /// Unique identifier of this run.
    pub run_id: Uuid,
    /// Start time (milliseconds since epoch).
    pub started_at_ms: i64,
    /// Completion time (milliseconds since epoch).
    pub completed_at_ms: i64,
    /// Number of products downloaded and catalogued.
    pub downloaded: u32,
    /// Number of products that failed.
    pub failed: u32,
    /// Number of products stopped by the user.
    pub stopped: u32,
    /// Number of products archived off-line at the provider.
    pub not_available: u32,
    /// Per-product outcomes in enqueue order.
    pub items: Vec<OutcomeDetail>,
}

impl BatchRunSummary {
    /// Total number of products processed in this run.
    #[must_use]
    pub const fn total(&self) -> u32 {
        self.downloaded + self.failed + self.stopped + self.not_available
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_counts() {
        let summary = BatchRunSummary {
            run_id: Uuid::nil(),
            started_at_ms: 0,
            completed_at_ms: 10,
            downloaded: 3,
            failed: 1,
            stopped: 2,
            not_available: 1,
            items: vec![],
        };

        assert_eq!(summary.total(), 7);
    }

    #[test]
    fn test_summary_serialization() {
        let summary = BatchRunSummary {
            run_id: Uuid::nil(),
            started_at_ms: 0,
            completed_at_ms: 10,
            downloaded: 1,
            failed: 0,
            stopped: 0,
            not_available: 0,
            items: vec![OutcomeDetail {
                product: "scihub/scene-1".to_string(),
                status: DownloadStatus::Downloaded,
                downloaded_path: None,
                error: None,
            }],
        };

        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains("scihub/scene-1"));
        assert!(json.contains("downloaded"));
    }
}
