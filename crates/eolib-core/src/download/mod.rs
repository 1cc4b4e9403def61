//! Download-pipeline domain types: statuses, errors, events, batch summaries.

mod errors;
mod events;
mod summary;
mod types;

pub use errors::{DownloadError, DownloadResult};
pub use events::DownloadEvent;
pub use summary::{BatchRunSummary, OutcomeDetail};
pub use types::{DownloadOutcome, DownloadStatus, ProgressUpdate};
