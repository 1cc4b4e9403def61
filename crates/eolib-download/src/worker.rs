//! Download task execution.
//!
//! This module contains the core download logic for a single product,
//! isolated from the orchestration. The worker operates on a value-type
//! job and cloned Arc dependencies, with no access to the manager's locks.
//!
//! # Design Principles
//!
//! - Worker receives a `DownloadJob` (value type) and `WorkerDeps` (cloned Arcs)
//! - Worker only writes to the job's `watch::Sender` for progress; events
//!   are the manager's business
//! - Cancellation is checked before the permit acquire, while blocked on
//!   it, and around the transfer (`tokio::select!`); a transfer blocked
//!   deep in the protocol stack is interrupted best-effort only
//! - Failures are contained: every outcome is terminal for this task and
//!   never aborts sibling tasks

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use eolib_core::domain::ProductId;
use eolib_core::download::{DownloadOutcome, ProgressUpdate};
use eolib_core::ports::{
    DownloadCommand, DownloadRequest, ProductCatalogPort, RemoteRepositoryPort,
};

use crate::destination::DownloadDestination;
use crate::permits::RepositoryPermits;

/// Dependencies for the download worker.
///
/// These are cloned Arc references to ports, allowing the worker
/// to operate independently of the manager's state.
#[derive(Clone)]
pub struct WorkerDeps {
    /// The remote repository provider.
    pub repository: Arc<dyn RemoteRepositoryPort>,
    /// The local product catalog.
    pub catalog: Arc<dyn ProductCatalogPort>,
    /// Per-(repository, account) permit registry.
    pub permits: Arc<RepositoryPermits>,
    /// Local repository folder products are saved under.
    pub local_repository_folder: PathBuf,
}

/// A download job to be executed by the worker.
///
/// This is a value type containing all information needed to execute
/// a download, with no references back to the manager.
pub struct DownloadJob {
    /// The product and the account to download it under.
    pub request: DownloadRequest,
    /// Planned destination folder.
    pub destination: DownloadDestination,
    /// Cancellation token for this job.
    pub cancel: CancellationToken,
    /// Progress sender for this job.
    pub progress_tx: watch::Sender<ProgressUpdate>,
}

/// Run a download task to its terminal status.
///
/// State machine: `Pending → Downloading → {Downloaded | Failed |
/// NotAvailable | Stopped}`. The permit is released when the task ends,
/// whatever the outcome.
pub async fn run_task(job: DownloadJob, deps: &WorkerDeps) -> DownloadOutcome {
    let product: ProductId = job.request.product.id.clone();
    let repository = product.repository().clone();

    // Cancellation may land before the task ever ran.
    if job.cancel.is_cancelled() {
        return DownloadOutcome::stopped(product);
    }

    // Acquire the per-(repository, account) permit. This suspends until a
    // sibling task releases one; cancellation while blocked exits without
    // downloading.
    let acquire = deps.permits.acquire(&repository, &job.request.credentials);
    let _permit = tokio::select! {
        biased;

        () = job.cancel.cancelled() => {
            return DownloadOutcome::stopped(product);
        }

        acquired = acquire => match acquired {
            Ok(permit) => permit,
            Err(error) => {
                tracing::error!(
                    product = %product,
                    error = %error,
                    "Permit acquisition failed"
                );
                return DownloadOutcome::failed(product, error.user_message());
            }
        }
    };

    // The flag is re-checked after the blocking acquire.
    if job.cancel.is_cancelled() {
        return DownloadOutcome::stopped(product);
    }

    if let Err(error) = job.destination.ensure_dir() {
        tracing::error!(
            product = %product,
            error = %error,
            "Failed to prepare the destination folder"
        );
        return DownloadOutcome::failed(product, error.user_message());
    }

    let command = DownloadCommand {
        product: job.request.product.clone(),
        credentials: job.request.credentials.clone(),
        destination_folder: job.destination.product_dir().to_path_buf(),
        progress: job.progress_tx.clone(),
    };
    command.report_percent(0); // 0%

    let transfer = tokio::select! {
        biased;

        () = job.cancel.cancelled() => {
            return DownloadOutcome::stopped(product);
        }

        result = deps.repository.download(&command) => result,
    };

    match transfer {
        Ok(downloaded_path) => {
            // Successfully transferred; report 100% before cataloguing.
            command.report_percent(100);

            let saved = deps
                .catalog
                .save_product(
                    &job.request.product,
                    &downloaded_path,
                    &repository,
                    &deps.local_repository_folder,
                )
                .await;

            match saved {
                Ok(record) => DownloadOutcome::downloaded(product, downloaded_path, record),
                Err(error) => {
                    tracing::error!(
                        product = %product,
                        error = %error,
                        "Failed to save the downloaded product"
                    );
                    DownloadOutcome::failed(product, error.user_message())
                }
            }
        }
        Err(error) if error.is_cancelled() => DownloadOutcome::stopped(product),
        Err(error) if error.indicates_offline() => {
            tracing::warn!(
                product = %product,
                "The product to download is not online"
            );
            DownloadOutcome::not_available(product, error.user_message())
        }
        Err(error) => {
            tracing::error!(
                product = %product,
                error = %error,
                "Failed to download the remote product"
            );
            DownloadOutcome::failed(product, error.user_message())
        }
    }
    // `_permit` drops here: released unconditionally once the attempt ends.
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use eolib_core::domain::{Credentials, RemoteProduct, RepositoryId};
    use eolib_core::download::{DownloadError, DownloadStatus};
    use eolib_core::ports::{
        DownloadManagerConfig, ProductQuery, QuickLookImage, RepositoryConfig, SavedProductRecord,
    };
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::mpsc;

    /// Fake provider: succeeds or fails with a fixed error.
    struct FakeRepository {
        error: Option<DownloadError>,
        transfer_count: AtomicUsize,
    }

    impl FakeRepository {
        fn succeeding() -> Self {
            Self {
                error: None,
                transfer_count: AtomicUsize::new(0),
            }
        }

        fn failing(error: DownloadError) -> Self {
            Self {
                error: Some(error),
                transfer_count: AtomicUsize::new(0),
            }
        }

        fn transfers(&self) -> usize {
            self.transfer_count.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RemoteRepositoryPort for FakeRepository {
        async fn download(&self, command: &DownloadCommand) -> Result<PathBuf, DownloadError> {
            self.transfer_count.fetch_add(1, Ordering::SeqCst);
            command.report_percent(50);
            match &self.error {
                Some(error) => Err(error.clone()),
                None => Ok(command.destination_folder.join("product.zip")),
            }
        }

        async fn download_product_list(
            &self,
            _credentials: &Credentials,
            _mission: &str,
            _query: &ProductQuery,
            _pages: mpsc::Sender<Vec<RemoteProduct>>,
        ) -> Result<usize, DownloadError> {
            Ok(0)
        }

        async fn download_quick_look_image(
            &self,
            product: &ProductId,
            _credentials: &Credentials,
        ) -> Result<QuickLookImage, DownloadError> {
            Ok(QuickLookImage {
                product: product.clone(),
                bytes: vec![],
            })
        }
    }

    /// Fake catalog: records saves.
    #[derive(Default)]
    struct FakeCatalog {
        saves: AtomicUsize,
    }

    #[async_trait]
    impl ProductCatalogPort for FakeCatalog {
        async fn save_product(
            &self,
            product: &RemoteProduct,
            downloaded_path: &Path,
            repository: &RepositoryId,
            _local_folder: &Path,
        ) -> Result<SavedProductRecord, DownloadError> {
            self.saves.fetch_add(1, Ordering::SeqCst);
            Ok(SavedProductRecord {
                record_id: 1,
                product: product.id.clone(),
                local_path: downloaded_path.to_path_buf(),
                repository: repository.clone(),
                saved_at: chrono::Utc::now(),
            })
        }
    }

    fn request(dir: &Path) -> (DownloadRequest, DownloadDestination) {
        let product = RemoteProduct::new(ProductId::new("scihub", "scene-1"), "Sentinel-2");
        let destination = DownloadDestination::plan(dir, &product);
        (
            DownloadRequest::new(product, Credentials::new("alice", "secret")),
            destination,
        )
    }

    fn deps(repository: Arc<FakeRepository>, catalog: Arc<FakeCatalog>, dir: &Path) -> WorkerDeps {
        let config = DownloadManagerConfig::new(dir.to_path_buf())
            .with_repository("scihub", RepositoryConfig::new(2));
        WorkerDeps {
            repository,
            catalog,
            permits: Arc::new(RepositoryPermits::from_config(&config)),
            local_repository_folder: dir.to_path_buf(),
        }
    }

    fn job(request: DownloadRequest, destination: DownloadDestination) -> DownloadJob {
        let (progress_tx, _) = watch::channel(ProgressUpdate::default());
        DownloadJob {
            request,
            destination,
            cancel: CancellationToken::new(),
            progress_tx,
        }
    }

    #[tokio::test]
    async fn test_successful_task_saves_and_reports_100_percent() {
        let dir = tempfile::tempdir().unwrap();
        let repository = Arc::new(FakeRepository::succeeding());
        let catalog = Arc::new(FakeCatalog::default());
        let deps = deps(Arc::clone(&repository), Arc::clone(&catalog), dir.path());

        let (request, destination) = request(dir.path());
        let job = job(request, destination);
        let progress = job.progress_tx.subscribe();

        let outcome = run_task(job, &deps).await;

        assert_eq!(outcome.status, DownloadStatus::Downloaded);
        assert!(outcome.downloaded_path.is_some());
        assert!(outcome.saved.is_some());
        assert_eq!(catalog.saves.load(Ordering::SeqCst), 1);
        assert_eq!(progress.borrow().percent, 100);
    }

    #[tokio::test]
    async fn test_cancelled_before_start_never_invokes_transfer() {
        let dir = tempfile::tempdir().unwrap();
        let repository = Arc::new(FakeRepository::succeeding());
        let catalog = Arc::new(FakeCatalog::default());
        let deps = deps(Arc::clone(&repository), catalog, dir.path());

        let (request, destination) = request(dir.path());
        let job = job(request, destination);
        job.cancel.cancel();

        let outcome = run_task(job, &deps).await;

        assert_eq!(outcome.status, DownloadStatus::Stopped);
        assert_eq!(repository.transfers(), 0);
    }

    #[tokio::test]
    async fn test_not_online_error_maps_to_not_available() {
        let dir = tempfile::tempdir().unwrap();
        let repository = Arc::new(FakeRepository::failing(DownloadError::transfer(
            "Product 'scene-1' Is Not Online; retrieval has been scheduled",
        )));
        let catalog = Arc::new(FakeCatalog::default());
        let deps = deps(Arc::clone(&repository), Arc::clone(&catalog), dir.path());

        let (request, destination) = request(dir.path());
        let outcome = run_task(job(request, destination), &deps).await;

        assert_eq!(outcome.status, DownloadStatus::NotAvailable);
        assert_eq!(catalog.saves.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_transfer_error_maps_to_failed() {
        let dir = tempfile::tempdir().unwrap();
        let repository = Arc::new(FakeRepository::failing(DownloadError::transfer(
            "connection reset by peer",
        )));
        let catalog = Arc::new(FakeCatalog::default());
        let deps = deps(repository, catalog, dir.path());

        let (request, destination) = request(dir.path());
        let outcome = run_task(job(request, destination), &deps).await;

        assert_eq!(outcome.status, DownloadStatus::Failed);
        assert!(outcome.error.unwrap().contains("connection reset"));
    }

    #[tokio::test]
    async fn test_unknown_repository_is_terminal_failure() {
        let dir = tempfile::tempdir().unwrap();
        let repository = Arc::new(FakeRepository::succeeding());
        let catalog = Arc::new(FakeCatalog::default());
        // Registry configured without "scihub".
        let config = DownloadManagerConfig::new(dir.path().to_path_buf());
        let deps = WorkerDeps {
            repository: Arc::clone(&repository) as Arc<dyn RemoteRepositoryPort>,
            catalog,
            permits: Arc::new(RepositoryPermits::from_config(&config)),
            local_repository_folder: dir.path().to_path_buf(),
        };

        let (request, destination) = request(dir.path());
        let outcome = run_task(job(request, destination), &deps).await;

        assert_eq!(outcome.status, DownloadStatus::Failed);
        assert_eq!(repository.transfers(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_while_blocked_on_permit_stops_without_transfer() {
        let dir = tempfile::tempdir().unwrap();
        let repository = Arc::new(FakeRepository::succeeding());
        let catalog = Arc::new(FakeCatalog::default());
        let config = DownloadManagerConfig::new(dir.path().to_path_buf())
            .with_repository("scihub", RepositoryConfig::new(1));
        let permits = Arc::new(RepositoryPermits::from_config(&config));
        let deps = WorkerDeps {
            repository: Arc::clone(&repository) as Arc<dyn RemoteRepositoryPort>,
            catalog,
            permits: Arc::clone(&permits),
            local_repository_folder: dir.path().to_path_buf(),
        };

        // Hold the only permit so the task blocks on acquisition.
        let held = permits
            .acquire(
                &RepositoryId::new("scihub"),
                &Credentials::new("alice", "secret"),
            )
            .await
            .unwrap();

        let (request, destination) = request(dir.path());
        let task_job = job(request, destination);
        let cancel = task_job.cancel.clone();

        let handle = tokio::spawn(async move { run_task(task_job, &deps).await });

        // Let the task reach the blocking acquire, then cancel it.
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        cancel.cancel();

        let outcome = handle.await.unwrap();
        assert_eq!(outcome.status, DownloadStatus::Stopped);
        assert_eq!(repository.transfers(), 0);
        drop(held);
    }
}
