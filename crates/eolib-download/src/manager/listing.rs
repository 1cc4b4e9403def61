//! Product-list search.
//!
//! Runs a provider search as a cancellable background sweep. Result
//! pages are forwarded to the caller as they arrive; a failure before
//! any task starts surfaces as a single `ListFailed` event so the UI
//! shows exactly one error dialog.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use eolib_core::domain::{Credentials, RemoteProduct};
use eolib_core::download::{DownloadError, DownloadEvent};
use eolib_core::ports::ProductQuery;

use super::DownloadManager;

impl DownloadManager {
    /// Run a product-list search against the repository provider.
    ///
    /// Pages are forwarded to `pages` as they arrive, with a
    /// `ListProgress` event per page. Returns the token that cancels this
    /// search; [`DownloadManager::stop_sweeps`] cancels all sweeps.
    pub fn search_products(
        self: &Arc<Self>,
        credentials: Credentials,
        mission: String,
        query: ProductQuery,
        pages: mpsc::Sender<Vec<RemoteProduct>>,
    ) -> CancellationToken {
        let cancel = CancellationToken::new();
        self.register_sweep(cancel.clone());

        let manager = Arc::clone(self);
        let token = cancel.clone();
        tokio::spawn(async move {
            manager
                .run_product_search(credentials, mission, query, pages, token)
                .await;
        });

        cancel
    }

    async fn run_product_search(
        self: Arc<Self>,
        credentials: Credentials,
        mission: String,
        query: ProductQuery,
        pages: mpsc::Sender<Vec<RemoteProduct>>,
        cancel: CancellationToken,
    ) {
        // Intercept provider pages so progress events can be emitted
        // while forwarding to the caller.
        let (page_tx, mut page_rx) = mpsc::channel::<Vec<RemoteProduct>>(4);

        let emitter = Arc::clone(&self.event_emitter);
        let forward_cancel = cancel.clone();
        let forwarder = tokio::spawn(async move {
            let mut fetched = 0usize;
            while let Some(page) = page_rx.recv().await {
                if forward_cancel.is_cancelled() {
                    break;
                }
                fetched += page.len();
                emitter.emit(DownloadEvent::ListProgress { fetched });
                if pages.send(page).await.is_err() {
                    break;
                }
            }
        });

        let result = tokio::select! {
            biased;

            () = cancel.cancelled() => Err(DownloadError::Cancelled),

            result = self
                .repository
                .download_product_list(&credentials, &mission, &query, page_tx) => result,
        };

        // The provider's sender is gone either way; drain the forwarder.
        let _ = forwarder.await;

        match result {
            Ok(total) => {
                tracing::info!(mission = %mission, total, "Product list downloaded");
            }
            Err(error) if error.is_cancelled() => {
                tracing::warn!(mission = %mission, "Stopped searching the product list");
            }
            Err(error) => {
                tracing::error!(
                    mission = %mission,
                    error = %error,
                    "Failed to download the product list"
                );
                self.event_emitter.emit(DownloadEvent::ListFailed {
                    message: error.user_message(),
                });
            }
        }

        // Mark the sweep finished so the registry can prune it.
        cancel.cancel();
    }
}
