//! Core domain types and port definitions for eolib.
//!
//! This crate holds the pure domain model of the product library
//! (products, repositories, credentials), the download-pipeline types
//! (statuses, errors, events) and the port traits that adapters and the
//! download manager implement. No I/O happens here.

pub mod domain;
pub mod download;
pub mod ports;

// Re-export commonly used types for convenience
pub use domain::{Credentials, ProductId, RemoteProduct, RepositoryId};
pub use download::{
    BatchRunSummary, DownloadError, DownloadEvent, DownloadOutcome, DownloadResult,
    DownloadStatus, OutcomeDetail, ProgressUpdate,
};
pub use ports::{
    ChannelEmitter, DownloadCommand, DownloadEventEmitterPort, DownloadManagerConfig,
    DownloadRequest, NoopDownloadEmitter, ProductCatalogPort, ProductQuery, QuickLookImage,
    RemoteRepositoryPort, RepositoryConfig, SavedProductRecord,
};
