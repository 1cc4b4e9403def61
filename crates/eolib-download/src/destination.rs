//! Destination path planning for downloads.

use std::path::{Path, PathBuf};

use eolib_core::domain::RemoteProduct;
use eolib_core::download::DownloadError;

/// A planned download destination.
#[derive(Debug, Clone)]
pub struct DownloadDestination {
    product_dir: PathBuf,
}

impl DownloadDestination {
    /// Plan the folder a product is downloaded into.
    ///
    /// Product names may contain path separators; they are flattened into
    /// a single safe directory name under the local repository folder.
    #[must_use]
    pub fn plan(local_repository_folder: &Path, product: &RemoteProduct) -> Self {
        let dir_name = product.id.name().replace(['/', '\\'], "_");

        Self {
            product_dir: local_repository_folder.join(dir_name),
        }
    }

    /// Ensure the product directory exists, creating it if necessary.
    pub fn ensure_dir(&self) -> Result<(), DownloadError> {
        if !self.product_dir.exists() {
            std::fs::create_dir_all(&self.product_dir)
                .map_err(|e| DownloadError::io("create_dir", e.to_string()))?;
        }
        Ok(())
    }

    /// The directory the provider writes the product archive into.
    #[must_use]
    pub fn product_dir(&self) -> &Path {
        &self.product_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eolib_core::domain::ProductId;

    #[test]
    fn test_plan_joins_product_name() {
        let product = RemoteProduct::new(ProductId::new("scihub", "S2A_scene"), "Sentinel-2");
        let destination = DownloadDestination::plan(Path::new("/data/products"), &product);

        assert_eq!(
            destination.product_dir(),
            Path::new("/data/products/S2A_scene")
        );
    }

    #[test]
    fn test_plan_flattens_separators() {
        let product = RemoteProduct::new(ProductId::new("scihub", "tiles/31/U"), "Sentinel-2");
        let destination = DownloadDestination::plan(Path::new("/data/products"), &product);

        assert_eq!(
            destination.product_dir(),
            Path::new("/data/products/tiles_31_U")
        );
    }

    #[test]
    fn test_ensure_dir_creates_directory() {
        let base = tempfile::tempdir().unwrap();
        let product = RemoteProduct::new(ProductId::new("scihub", "scene-1"), "Sentinel-2");
        let destination = DownloadDestination::plan(base.path(), &product);

        destination.ensure_dir().unwrap();

        assert!(destination.product_dir().is_dir());
    }
}
