//! Batch run aggregation.

use chrono::Utc;
use indexmap::IndexMap;
use uuid::Uuid;

use eolib_core::domain::ProductId;
use eolib_core::download::{BatchRunSummary, DownloadOutcome, DownloadStatus, OutcomeDetail};

/// Aggregation of task outcomes for one busy→idle span of the pool.
pub(super) struct BatchRunState {
    run_id: Uuid,
    started_at_ms: i64,
    /// Keyed by product, insertion order preserved for the summary.
    outcomes: IndexMap<ProductId, OutcomeDetail>,
}

impl BatchRunState {
    /// Start a new batch run.
    pub(super) fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at_ms: Utc::now().timestamp_millis(),
            outcomes: IndexMap::new(),
        }
    }

    /// Record a terminal outcome.
    pub(super) fn record(&mut self, outcome: &DownloadOutcome) {
        self.outcomes.insert(
            outcome.product.clone(),
            OutcomeDetail {
                product: outcome.product.to_string(),
                status: outcome.status,
                downloaded_path: outcome.downloaded_path.clone(),
                error: outcome.error.clone(),
            },
        );
    }

    /// Close the run and produce its summary.
    pub(super) fn into_summary(self) -> BatchRunSummary {
        let mut downloaded = 0;
        let mut failed = 0;
        let mut stopped = 0;
        let mut not_available = 0;

        for detail in self.outcomes.values() {
            match detail.status {
                DownloadStatus::Downloaded => downloaded += 1,
                DownloadStatus::Stopped => stopped += 1,
                DownloadStatus::NotAvailable => not_available += 1,
                _ => failed += 1,
            }
        }

        BatchRunSummary {
            run_id: self.run_id,
            started_at_ms: self.started_at_ms,
            completed_at_ms: Utc::now().timestamp_millis(),
            downloaded,
            failed,
            stopped,
            not_available,
            items: self.outcomes.into_values().collect(),
        }
    }
}
