//! Local product catalog port.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::domain::{ProductId, RemoteProduct, RepositoryId};
use crate::download::DownloadError;

/// Metadata of a product persisted in the local catalog.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedProductRecord {
    /// Catalog-assigned record identifier.
    pub record_id: i64,
    /// The product that was saved.
    pub product: ProductId,
    /// Where the product archive lives on disk.
    pub local_path: PathBuf,
    /// The remote repository the product came from.
    pub repository: RepositoryId,
    /// When the record was created.
    pub saved_at: DateTime<Utc>,
}

/// Port for the local product catalog.
///
/// The download pipeline hands every successfully transferred product to
/// the catalog before reporting it as downloaded; a catalog failure turns
/// the task outcome into `Failed` even though the bytes are on disk.
#[async_trait]
pub trait ProductCatalogPort: Send + Sync {
    /// Persist a downloaded product and return its catalog record.
    async fn save_product(
        &self,
        product: &RemoteProduct,
        downloaded_path: &Path,
        repository: &RepositoryId,
        local_folder: &Path,
    ) -> Result<SavedProductRecord, DownloadError>;
}
