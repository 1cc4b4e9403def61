//! Download pipeline for eolib.
//!
//! A bounded concurrent download pipeline: a batch bookkeeping queue, a
//! credential-scoped permit registry, a per-product worker and the
//! orchestrator that supervises them and republishes progress to the UI
//! through the event emitter port.

// Re-export core types for convenience
pub use eolib_core::download::{
    BatchRunSummary, DownloadError, DownloadEvent, DownloadOutcome, DownloadStatus,
};
pub use eolib_core::ports::{DownloadManagerConfig, DownloadRequest};

pub mod destination;
pub mod permits;
pub mod queue;
pub mod worker;

pub use destination::DownloadDestination;
pub use permits::{RepositoryPermit, RepositoryPermits};
pub use queue::{DownloadQueue, QueuedItem};
pub use worker::{DownloadJob, WorkerDeps};

// Public API - the orchestrator
mod manager;

pub use manager::{DownloadManager, DownloadManagerDeps, build_download_manager};
