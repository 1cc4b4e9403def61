//! Remote repository provider port.
//!
//! This port abstracts one remote product repository (a mission data hub,
//! an object store gateway, ...). Implementations handle protocol details;
//! the download pipeline only sees products, progress and paths.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use tokio::sync::{mpsc, watch};

use crate::domain::{Credentials, ProductId, RemoteProduct};
use crate::download::{DownloadError, ProgressUpdate};

/// Request to download one product.
///
/// This is a pure data structure pairing the product descriptor with the
/// account to download it under. The manager turns it into a running task.
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    /// The product to download.
    pub product: RemoteProduct,
    /// Account credentials for the product's repository.
    pub credentials: Credentials,
}

impl DownloadRequest {
    /// Create a new download request.
    #[must_use]
    pub const fn new(product: RemoteProduct, credentials: Credentials) -> Self {
        Self {
            product,
            credentials,
        }
    }
}

/// Everything a provider needs to execute one product transfer.
///
/// The progress sender is the only back-channel: providers report
/// percent values through it and must never touch UI state.
#[derive(Debug)]
pub struct DownloadCommand {
    /// The product to transfer.
    pub product: RemoteProduct,
    /// Account credentials for the transfer.
    pub credentials: Credentials,
    /// Directory the provider writes the product archive into.
    pub destination_folder: PathBuf,
    /// Percent progress channel (0-100, monotone).
    pub progress: watch::Sender<ProgressUpdate>,
}

impl DownloadCommand {
    /// Report a percent value on the progress channel.
    ///
    /// Bumps the sequence number so bridges can detect the change.
    pub fn report_percent(&self, percent: u8) {
        self.progress.send_modify(|state| {
            state.percent = percent;
            state.seq += 1;
        });
    }
}

/// Search query for a product-list download.
#[derive(Debug, Clone, Default)]
pub struct ProductQuery {
    /// Only products acquired at or after this instant.
    pub start_date: Option<DateTime<Utc>>,
    /// Only products acquired at or before this instant.
    pub end_date: Option<DateTime<Utc>>,
    /// Area of interest as WKT, if any.
    pub area_of_interest: Option<String>,
    /// Provider page size hint.
    pub page_size: u32,
}

/// A quick-look (browse) image for a product.
#[derive(Clone, PartialEq, Eq)]
pub struct QuickLookImage {
    /// The product this image previews.
    pub product: ProductId,
    /// Encoded image bytes as served by the provider.
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for QuickLookImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuickLookImage")
            .field("product", &self.product)
            .field("bytes", &format_args!("{} bytes", self.bytes.len()))
            .finish()
    }
}

/// Port for one remote product repository.
///
/// # Cancellation
///
/// Methods are cancel-safe in the sense that dropping the returned future
/// abandons the transfer; the pipeline wraps calls in `select!` with a
/// cancellation token. A transfer blocked deep inside the protocol stack
/// is only interrupted best-effort.
#[async_trait]
pub trait RemoteRepositoryPort: Send + Sync {
    /// Transfer one product into the destination folder.
    ///
    /// Returns the local path of the downloaded archive. Progress is
    /// reported through `command.progress` as monotone percent values.
    async fn download(&self, command: &DownloadCommand) -> Result<PathBuf, DownloadError>;

    /// Run a product-list search, sending each result page through `pages`.
    ///
    /// Returns the total number of products found. A failure here is an
    /// orchestrator-level failure: no task has started yet.
    async fn download_product_list(
        &self,
        credentials: &Credentials,
        mission: &str,
        query: &ProductQuery,
        pages: mpsc::Sender<Vec<RemoteProduct>>,
    ) -> Result<usize, DownloadError>;

    /// Fetch the quick-look (browse) image for one product.
    async fn download_quick_look_image(
        &self,
        product: &ProductId,
        credentials: &Credentials,
    ) -> Result<QuickLookImage, DownloadError>;
}
