//! Download manager configuration.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::domain::RepositoryId;

/// Per-repository provider settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryConfig {
    /// Maximum concurrent connections per account on this repository.
    ///
    /// `0` means the provider imposes no cap and permit acquisition is a
    /// no-op.
    pub max_connections: u32,
}

impl RepositoryConfig {
    /// Create a repository configuration with a connection cap.
    #[must_use]
    pub const fn new(max_connections: u32) -> Self {
        Self { max_connections }
    }

    /// Configuration for a provider without a connection cap.
    #[must_use]
    pub const fn unlimited() -> Self {
        Self { max_connections: 0 }
    }
}

/// Configuration for creating a download manager.
#[derive(Clone, Debug)]
pub struct DownloadManagerConfig {
    /// Local repository folder downloaded products are stored under.
    pub local_repository_folder: PathBuf,
    /// Known repositories, keyed by repository name.
    ///
    /// Looking up a repository that is missing from this map is a
    /// configuration defect and fails fast.
    pub repositories: HashMap<String, RepositoryConfig>,
    /// Override for the worker pool size; `None` derives it from the
    /// host's available parallelism.
    pub worker_threads: Option<usize>,
}

impl DownloadManagerConfig {
    /// Create a new config with the local repository folder.
    #[must_use]
    pub fn new(local_repository_folder: PathBuf) -> Self {
        Self {
            local_repository_folder,
            repositories: HashMap::new(),
            worker_threads: None,
        }
    }

    /// Register a repository and its connection cap.
    #[must_use]
    pub fn with_repository(mut self, name: impl Into<String>, config: RepositoryConfig) -> Self {
        self.repositories.insert(name.into(), config);
        self
    }

    /// Set an explicit worker pool size.
    #[must_use]
    pub const fn with_worker_threads(mut self, worker_threads: usize) -> Self {
        self.worker_threads = Some(worker_threads);
        self
    }

    /// Look up the connection cap for a repository.
    ///
    /// Returns `None` for unknown repositories.
    #[must_use]
    pub fn repository_cap(&self, repository: &RepositoryId) -> Option<u32> {
        self.repositories
            .get(repository.as_str())
            .map(|config| config.max_connections)
    }

    /// Size of the fixed worker pool the manager runs tasks on.
    ///
    /// Defaults to available parallelism minus one (one core left for the
    /// UI event loop), clamped to a minimum of 1 so single-core hosts
    /// still get a working pool.
    #[must_use]
    pub fn effective_worker_threads(&self) -> usize {
        self.worker_threads
            .unwrap_or_else(|| {
                std::thread::available_parallelism()
                    .map(std::num::NonZeroUsize::get)
                    .unwrap_or(1)
                    .saturating_sub(1)
            })
            .max(1)
    }
}
