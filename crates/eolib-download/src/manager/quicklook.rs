//! Quick-look image sweep.
//!
//! Search results arrive without browse images; a sweep fetches them in
//! the background so the result list can fill in thumbnails as they
//! arrive. One sweep covers many products and is cancelled as a unit,
//! independently of product downloads.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use eolib_core::domain::{Credentials, RemoteProduct};
use eolib_core::download::DownloadEvent;
use eolib_core::ports::QuickLookImage;

use super::DownloadManager;

impl DownloadManager {
    /// Fetch quick-look images for the given products.
    ///
    /// Images are delivered through `images` as they arrive and a
    /// `QuickLookReady` event is emitted per product. A failed fetch is
    /// logged and skipped; the sweep continues with the remaining
    /// products. Returns the token that cancels this sweep;
    /// [`DownloadManager::stop_sweeps`] cancels all of them.
    pub fn fetch_quick_looks(
        self: &Arc<Self>,
        products: Vec<RemoteProduct>,
        credentials: Credentials,
        images: mpsc::Sender<QuickLookImage>,
    ) -> CancellationToken {
        let cancel = CancellationToken::new();
        self.register_sweep(cancel.clone());

        let manager = Arc::clone(self);
        let token = cancel.clone();
        tokio::spawn(async move {
            manager
                .run_quick_look_sweep(products, credentials, images, token)
                .await;
        });

        cancel
    }

    async fn run_quick_look_sweep(
        self: Arc<Self>,
        products: Vec<RemoteProduct>,
        credentials: Credentials,
        images: mpsc::Sender<QuickLookImage>,
        cancel: CancellationToken,
    ) {
        for product in products {
            if cancel.is_cancelled() {
                tracing::debug!("Stop downloading the quick-look images");
                break;
            }

            // Quick-look fetches compete for the same per-account permits
            // as product downloads.
            let permit = tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                acquired = self
                    .permits
                    .acquire(product.id.repository(), &credentials) => acquired,
            };
            let _permit = match permit {
                Ok(permit) => permit,
                Err(error) => {
                    tracing::error!(
                        product = %product.id,
                        error = %error,
                        "Permit acquisition failed for quick-look fetch"
                    );
                    break;
                }
            };

            let fetched = tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                result = self
                    .repository
                    .download_quick_look_image(&product.id, &credentials) => result,
            };

            match fetched {
                Ok(image) => {
                    self.event_emitter
                        .emit(DownloadEvent::QuickLookReady {
                            product: product.id.to_string(),
                        });
                    if images.send(image).await.is_err() {
                        // Receiver gone: nobody is rendering thumbnails.
                        break;
                    }
                }
                Err(error) => {
                    tracing::warn!(
                        product = %product.id,
                        error = %error,
                        "Failed to download the quick-look image"
                    );
                }
            }
        }

        // Mark the sweep finished so the registry can prune it.
        cancel.cancel();
    }
}
