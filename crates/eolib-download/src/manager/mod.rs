//! Download orchestrator.
//!
//! The manager supervises a batch of concurrent download tasks: it keeps
//! the batch bookkeeping queue, spawns workers on a fixed-size pool,
//! aggregates progress into the "X out of Y" text and publishes every
//! UI-visible change through the event emitter port.
//!
//! # Concurrency Model
//!
//! - One spawned task per product, gated by a pool semaphore sized to
//!   `DownloadManagerConfig::effective_worker_threads`
//! - Per-(repository, account) permits additionally cap concurrency
//!   against each provider (acquired inside the worker)
//! - Lock order: queue → active (consistent everywhere)
//! - Workers never touch UI state; all effects go through the emitter,
//!   whose implementation marshals onto the host's event thread
//! - Busy→drained transitions delimit a batch run; on drain the batch
//!   summary is emitted and the run state is dropped, so the next batch
//!   starts fresh

mod batch;
mod listing;
mod quicklook;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, Semaphore, watch};
use tokio::time::interval;
use tokio_util::sync::CancellationToken;

use eolib_core::domain::ProductId;
use eolib_core::download::{DownloadEvent, DownloadOutcome, DownloadStatus, ProgressUpdate};
use eolib_core::ports::{
    DownloadEventEmitterPort, DownloadManagerConfig, DownloadRequest, ProductCatalogPort,
    RemoteRepositoryPort,
};

use crate::destination::DownloadDestination;
use crate::permits::RepositoryPermits;
use crate::queue::{DownloadQueue, QueuedItem};
use crate::worker::{self, DownloadJob, WorkerDeps};

use batch::BatchRunState;

/// Interval of the per-task progress bridge tick.
const PROGRESS_TICK: Duration = Duration::from_millis(250);

/// State for an active download task.
struct ActiveTask {
    /// Cancellation token.
    cancel: CancellationToken,
    /// Progress sender (bridges and subscribers read from this).
    progress_tx: watch::Sender<ProgressUpdate>,
}

/// Dependencies for creating a download manager.
///
/// This struct bundles all the ports and configuration needed
/// to construct a `DownloadManager`.
pub struct DownloadManagerDeps<R, C, E>
where
    R: RemoteRepositoryPort + 'static,
    C: ProductCatalogPort + 'static,
    E: DownloadEventEmitterPort + 'static,
{
    /// Port for the remote repository provider.
    pub repository: Arc<R>,
    /// Port for the local product catalog.
    pub catalog: Arc<C>,
    /// Port for emitting download events.
    pub event_emitter: Arc<E>,
    /// Configuration for the download manager.
    pub config: DownloadManagerConfig,
}

/// Build a download manager from its dependencies.
pub fn build_download_manager<R, C, E>(deps: DownloadManagerDeps<R, C, E>) -> Arc<DownloadManager>
where
    R: RemoteRepositoryPort + 'static,
    C: ProductCatalogPort + 'static,
    E: DownloadEventEmitterPort + 'static,
{
    Arc::new(DownloadManager::new(
        deps.repository,
        deps.catalog,
        deps.event_emitter,
        deps.config,
    ))
}

/// The download orchestrator.
pub struct DownloadManager {
    /// Remote repository provider.
    repository: Arc<dyn RemoteRepositoryPort>,
    /// Local product catalog.
    catalog: Arc<dyn ProductCatalogPort>,
    /// Event emitter for download events.
    event_emitter: Arc<dyn DownloadEventEmitterPort>,
    /// Per-(repository, account) permit registry.
    permits: Arc<RepositoryPermits>,
    /// Configuration.
    config: DownloadManagerConfig,
    /// Batch bookkeeping queue. Lock order: queue → active.
    queue: Mutex<DownloadQueue>,
    /// Active download tasks (keyed by product).
    active: Mutex<HashMap<ProductId, ActiveTask>>,
    /// Cancellation tokens of running sweeps (quick-looks, searches).
    sweeps: std::sync::Mutex<Vec<CancellationToken>>,
    /// Fixed-size worker pool.
    pool: Arc<Semaphore>,
    /// Current batch run state (None when drained).
    current_run: Mutex<Option<BatchRunState>>,
    /// Previous drain state for transition detection.
    prev_is_drained: Mutex<bool>,
}

impl DownloadManager {
    /// Create a new download manager.
    fn new<R, C, E>(
        repository: Arc<R>,
        catalog: Arc<C>,
        event_emitter: Arc<E>,
        config: DownloadManagerConfig,
    ) -> Self
    where
        R: RemoteRepositoryPort + 'static,
        C: ProductCatalogPort + 'static,
        E: DownloadEventEmitterPort + 'static,
    {
        let permits = Arc::new(RepositoryPermits::from_config(&config));
        let pool = Arc::new(Semaphore::new(config.effective_worker_threads()));

        Self {
            repository,
            catalog,
            event_emitter,
            permits,
            config,
            queue: Mutex::new(DownloadQueue::new()),
            active: Mutex::new(HashMap::new()),
            sweeps: std::sync::Mutex::new(Vec::new()),
            pool,
            current_run: Mutex::new(None),
            prev_is_drained: Mutex::new(true), // Start in drained state
        }
    }

    /// Queue a batch of download requests and start running them.
    ///
    /// Every request becomes one task on the worker pool; products that
    /// are already downloading are skipped. Returns once all bookkeeping
    /// is in place; the tasks themselves run in the background.
    pub async fn download_products(self: &Arc<Self>, requests: Vec<DownloadRequest>) {
        let mut spawned = Vec::new();

        for request in requests {
            let product = request.product.id.clone();

            {
                let active = self.active.lock().await;
                if active.contains_key(&product) {
                    tracing::debug!(product = %product, "Product already downloading, skipping");
                    continue;
                }
            }

            {
                let mut queue = self.queue.lock().await;
                queue.push(QueuedItem::new(product.clone()));
            }

            let cancel = CancellationToken::new();
            let (progress_tx, _) = watch::channel(ProgressUpdate::default());
            {
                let mut active = self.active.lock().await;
                active.insert(
                    product.clone(),
                    ActiveTask {
                        cancel: cancel.clone(),
                        progress_tx: progress_tx.clone(),
                    },
                );
            }

            tracing::info!(product = %product, "Download queued");
            spawned.push((request, cancel, progress_tx));
        }

        if spawned.is_empty() {
            return;
        }

        // All bookkeeping is in place before any task runs, so the batch
        // run starts exactly once per idle→busy transition.
        self.handle_drain_transitions().await;
        self.emit_batch_progress().await;

        for (request, cancel, progress_tx) in spawned {
            let manager = Arc::clone(self);
            tokio::spawn(async move {
                manager.run_one(request, cancel, progress_tx).await;
            });
        }
    }

    /// Cancel every currently tracked download task.
    ///
    /// Cancellation is cooperative: each task reports `Stopped` once it
    /// observes its token, and the batch drains normally.
    pub async fn stop_all(&self) {
        let active = self.active.lock().await;
        if active.is_empty() {
            return;
        }

        tracing::debug!(count = active.len(), "Stop downloading the products");
        for task in active.values() {
            task.cancel.cancel();
        }
    }

    /// Cancel one download task. Returns false if the product is not
    /// currently tracked.
    pub async fn stop_product(&self, product: &ProductId) -> bool {
        let active = self.active.lock().await;
        active.get(product).is_some_and(|task| {
            task.cancel.cancel();
            true
        })
    }

    /// Whether any download task is tracked right now.
    pub async fn is_running(&self) -> bool {
        !self.active.lock().await.is_empty()
    }

    /// Number of tracked download tasks.
    pub async fn active_count(&self) -> usize {
        self.active.lock().await.len()
    }

    /// Subscribe to progress updates for an active download.
    ///
    /// Returns `None` if the product is not currently tracked.
    pub async fn subscribe_progress(
        &self,
        product: &ProductId,
    ) -> Option<watch::Receiver<ProgressUpdate>> {
        let active = self.active.lock().await;
        active.get(product).map(|task| task.progress_tx.subscribe())
    }

    /// Run a single task: wait for a pool slot, execute, finalize.
    async fn run_one(
        self: Arc<Self>,
        request: DownloadRequest,
        cancel: CancellationToken,
        progress_tx: watch::Sender<ProgressUpdate>,
    ) {
        let product = request.product.id.clone();

        // Wait for a pool slot. Cancellation while waiting stops the task
        // without ever invoking the transfer.
        let _slot = tokio::select! {
            biased;

            () = cancel.cancelled() => {
                self.finalize_task(DownloadOutcome::stopped(product)).await;
                return;
            }

            slot = Arc::clone(&self.pool).acquire_owned() => match slot {
                Ok(slot) => slot,
                Err(_) => {
                    self.finalize_task(DownloadOutcome::failed(product, "worker pool closed"))
                        .await;
                    return;
                }
            }
        };

        self.event_emitter
            .emit(DownloadEvent::task_started(product.to_string()));
        self.emit_batch_progress().await;

        let bridge = self.spawn_progress_bridge(&product, progress_tx.subscribe(), cancel.clone());

        let deps = WorkerDeps {
            repository: Arc::clone(&self.repository),
            catalog: Arc::clone(&self.catalog),
            permits: Arc::clone(&self.permits),
            local_repository_folder: self.config.local_repository_folder.clone(),
        };
        let destination =
            DownloadDestination::plan(&self.config.local_repository_folder, &request.product);
        let job = DownloadJob {
            request,
            destination,
            cancel,
            progress_tx,
        };

        let outcome = worker::run_task(job, &deps).await;

        // The job's progress sender is gone; once finalize drops the
        // tracked sender the bridge emits its final value and exits.
        drop(bridge);

        self.finalize_task(outcome).await;
    }

    /// Finalize a task after it reached a terminal status.
    ///
    /// The outcome is recorded and published *before* the queue/active
    /// bookkeeping is released: the batch can only drain once every
    /// finished task has its outcome in the run state, so `BatchFinished`
    /// always carries the complete summary.
    async fn finalize_task(&self, outcome: DownloadOutcome) {
        match outcome.status {
            DownloadStatus::Downloaded => {
                tracing::info!(
                    product = %outcome.product,
                    path = ?outcome.downloaded_path,
                    "Product downloaded"
                );
            }
            DownloadStatus::Stopped => {
                tracing::warn!(product = %outcome.product, "Stopped downloading the product");
            }
            DownloadStatus::NotAvailable => {
                tracing::warn!(product = %outcome.product, "The product is not online");
            }
            _ => {
                tracing::error!(
                    product = %outcome.product,
                    error = ?outcome.error,
                    "Failed to download the product"
                );
            }
        }

        self.record_outcome(&outcome).await;

        self.event_emitter.emit(DownloadEvent::TaskFinished {
            product: outcome.product.to_string(),
            status: outcome.status,
            downloaded_path: outcome.downloaded_path.clone(),
            error: outcome.error.clone(),
        });

        {
            let mut queue = self.queue.lock().await;
            // Completion drains one entry. The compound peek+pop runs
            // under the queue lock; FIFO order decides which entry
            // leaves, not which task finished.
            if queue.peek().is_some() {
                queue.pop();
            }
        }
        {
            let mut active = self.active.lock().await;
            active.remove(&outcome.product);
        }

        self.emit_batch_progress().await;
        self.handle_drain_transitions().await;
    }

    /// Record a terminal outcome in the current batch run (if any).
    async fn record_outcome(&self, outcome: &DownloadOutcome) {
        if let Some(run) = self.current_run.lock().await.as_mut() {
            run.record(outcome);
        } else {
            tracing::warn!(
                product = %outcome.product,
                "Task finished but no batch run to record to"
            );
        }
    }

    /// Republish the aggregate "X out of Y" batch progress.
    async fn emit_batch_progress(&self) {
        let (downloaded, total) = {
            let queue = self.queue.lock().await;
            (queue.downloaded_count(), queue.total_pushed())
        };
        self.event_emitter
            .emit(DownloadEvent::batch_progress(downloaded, total));
    }

    /// Handle state transitions between drained and busy.
    ///
    /// Drained→busy starts a batch run; busy→drained finalizes it, emits
    /// the summary and drops the run state so the next batch is fresh.
    async fn handle_drain_transitions(&self) {
        let is_drained = {
            let queue = self.queue.lock().await;
            let active = self.active.lock().await;
            queue.is_empty() && active.is_empty()
        };

        let mut prev = self.prev_is_drained.lock().await;
        let was_drained = *prev;

        if was_drained && !is_drained {
            *self.current_run.lock().await = Some(BatchRunState::new());
            tracing::info!("Batch run started");
        } else if !was_drained && is_drained {
            let run = self.current_run.lock().await.take();
            match run {
                Some(run) => {
                    let summary = run.into_summary();
                    tracing::info!(
                        run_id = %summary.run_id,
                        total = summary.total(),
                        downloaded = summary.downloaded,
                        failed = summary.failed,
                        "Batch run completed"
                    );
                    self.event_emitter
                        .emit(DownloadEvent::BatchFinished { summary });
                }
                None => {
                    tracing::warn!("Batch drained but no run state found");
                }
            }
        }

        *prev = is_drained;
    }

    /// Spawn a progress bridge task that rate-limits event emission.
    fn spawn_progress_bridge(
        &self,
        product: &ProductId,
        mut rx: watch::Receiver<ProgressUpdate>,
        cancel: CancellationToken,
    ) -> tokio::task::JoinHandle<()> {
        let emitter = Arc::clone(&self.event_emitter);
        let product = product.to_string();

        tokio::spawn(async move {
            let mut tick = interval(PROGRESS_TICK);
            tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            let mut last_seq = 0u64;

            loop {
                tokio::select! {
                    biased;

                    () = cancel.cancelled() => {
                        // No progress on cancel - TaskFinished is the final word.
                        break;
                    }

                    changed = rx.changed() => {
                        if changed.is_err() {
                            // Senders dropped (task finished): emit the last
                            // value if it was never published, then exit.
                            let last = rx.borrow().clone();
                            if last.seq > last_seq {
                                emitter.emit(DownloadEvent::task_progress(
                                    product.as_str(),
                                    last.percent,
                                ));
                            }
                            break;
                        }
                        // Change noted; published on the next tick.
                    }

                    _ = tick.tick() => {
                        let current = rx.borrow().clone();
                        if current.seq > last_seq {
                            emitter.emit(DownloadEvent::task_progress(
                                product.as_str(),
                                current.percent,
                            ));
                            last_seq = current.seq;
                        }
                    }
                }
            }
        })
    }

    /// Track a sweep's cancellation token; completed sweeps are pruned.
    fn register_sweep(&self, cancel: CancellationToken) {
        let mut sweeps = self
            .sweeps
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        sweeps.retain(|token| !token.is_cancelled());
        sweeps.push(cancel);
    }

    /// Cancel every running sweep (quick-look fetches and searches).
    pub fn stop_sweeps(&self) {
        let sweeps = self
            .sweeps
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if !sweeps.is_empty() {
            tracing::debug!(count = sweeps.len(), "Stop running sweeps");
        }
        for token in sweeps.iter() {
            token.cancel();
        }
    }
}
