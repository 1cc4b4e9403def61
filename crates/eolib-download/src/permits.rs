//! Credential-scoped concurrency permits.
//!
//! Each remote provider caps how many concurrent connections one account
//! may open. This module enforces that cap with one counting semaphore per
//! `(repository, account)` pair, created lazily on first acquisition and
//! kept for the life of the process.
//!
//! The registry map is guarded by a single coarse lock; creation is rare
//! and acquisition synchronizes on the semaphore itself, so steady-state
//! throughput never contends on the registry lock.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use eolib_core::domain::{Credentials, RepositoryId};
use eolib_core::download::DownloadError;
use eolib_core::ports::DownloadManagerConfig;

/// Registry key: (repository name, account key).
type PermitKey = (String, String);

/// A held permit.
///
/// Dropping it returns the permit to the pool, so a permit is released
/// exactly once whatever the task outcome.
#[derive(Debug)]
pub struct RepositoryPermit {
    permit: Option<OwnedSemaphorePermit>,
}

impl RepositoryPermit {
    /// Permit for a provider without a connection cap.
    const fn unlimited() -> Self {
        Self { permit: None }
    }

    /// Whether this permit counts against a cap.
    #[must_use]
    pub const fn is_limited(&self) -> bool {
        self.permit.is_some()
    }
}

/// Per-(repository, account) permit registry.
pub struct RepositoryPermits {
    caps: HashMap<String, u32>,
    semaphores: Mutex<HashMap<PermitKey, Arc<Semaphore>>>,
}

impl RepositoryPermits {
    /// Build the registry from the manager configuration.
    #[must_use]
    pub fn from_config(config: &DownloadManagerConfig) -> Self {
        let caps = config
            .repositories
            .iter()
            .map(|(name, repository)| (name.clone(), repository.max_connections))
            .collect();

        Self {
            caps,
            semaphores: Mutex::new(HashMap::new()),
        }
    }

    /// Acquire a permit for `(repository, account)`.
    ///
    /// Suspends the calling task until a permit is free. A cap of 0 means
    /// the provider imposes no limit and acquisition is a no-op.
    ///
    /// # Errors
    ///
    /// `DownloadError::UnknownRepository` if the repository has no
    /// configuration entry. This is a configuration defect: terminal,
    /// never retried.
    pub async fn acquire(
        &self,
        repository: &RepositoryId,
        credentials: &Credentials,
    ) -> Result<RepositoryPermit, DownloadError> {
        let cap = self
            .caps
            .get(repository.as_str())
            .copied()
            .ok_or_else(|| DownloadError::unknown_repository(repository))?;

        if cap == 0 {
            return Ok(RepositoryPermit::unlimited());
        }

        let semaphore = {
            let mut semaphores = self
                .semaphores
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let key = (
                repository.as_str().to_string(),
                credentials.account_key().to_string(),
            );
            Arc::clone(
                semaphores
                    .entry(key)
                    .or_insert_with(|| Arc::new(Semaphore::new(cap as usize))),
            )
        };

        let permit = semaphore
            .acquire_owned()
            .await
            .map_err(|_| DownloadError::other("permit semaphore closed"))?;

        Ok(RepositoryPermit {
            permit: Some(permit),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eolib_core::ports::RepositoryConfig;
    use std::path::PathBuf;
    use std::time::Duration;

    fn registry(name: &str, cap: u32) -> RepositoryPermits {
        let config = DownloadManagerConfig::new(PathBuf::from("/data/products"))
            .with_repository(name, RepositoryConfig::new(cap));
        RepositoryPermits::from_config(&config)
    }

    fn credentials() -> Credentials {
        Credentials::new("alice", "secret")
    }

    #[tokio::test]
    async fn test_unknown_repository_fails_fast() {
        let permits = registry("scihub", 2);

        let result = permits
            .acquire(&RepositoryId::new("nope"), &credentials())
            .await;

        assert!(matches!(
            result,
            Err(DownloadError::UnknownRepository { .. })
        ));
    }

    #[tokio::test]
    async fn test_zero_cap_never_blocks() {
        let permits = registry("scihub", 0);
        let repository = RepositoryId::new("scihub");

        // Hold many "permits" at once; none of the acquisitions may block.
        let mut held = Vec::new();
        for _ in 0..16 {
            let permit = permits.acquire(&repository, &credentials()).await.unwrap();
            assert!(!permit.is_limited());
            held.push(permit);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_third_acquire_blocks_until_release() {
        let permits = registry("scihub", 2);
        let repository = RepositoryId::new("scihub");

        let first = permits.acquire(&repository, &credentials()).await.unwrap();
        let _second = permits.acquire(&repository, &credentials()).await.unwrap();

        // With both permits held the third acquire must not complete.
        let blocked = tokio::time::timeout(
            Duration::from_millis(50),
            permits.acquire(&repository, &credentials()),
        )
        .await;
        assert!(blocked.is_err(), "third acquire should block at cap 2");

        drop(first);

        let third = tokio::time::timeout(
            Duration::from_millis(50),
            permits.acquire(&repository, &credentials()),
        )
        .await;
        assert!(third.is_ok(), "release should unblock a waiting acquire");
    }

    #[tokio::test(start_paused = true)]
    async fn test_accounts_do_not_share_permits() {
        let permits = registry("scihub", 1);
        let repository = RepositoryId::new("scihub");

        let _alice = permits
            .acquire(&repository, &Credentials::new("alice", "x"))
            .await
            .unwrap();

        // A different account has its own permit pool.
        let bob = tokio::time::timeout(
            Duration::from_millis(50),
            permits.acquire(&repository, &Credentials::new("bob", "y")),
        )
        .await;
        assert!(bob.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_repositories_do_not_share_permits() {
        let config = DownloadManagerConfig::new(PathBuf::from("/data/products"))
            .with_repository("scihub", RepositoryConfig::new(1))
            .with_repository("usgs", RepositoryConfig::new(1));
        let permits = RepositoryPermits::from_config(&config);

        let _scihub = permits
            .acquire(&RepositoryId::new("scihub"), &credentials())
            .await
            .unwrap();

        let usgs = tokio::time::timeout(
            Duration::from_millis(50),
            permits.acquire(&RepositoryId::new("usgs"), &credentials()),
        )
        .await;
        assert!(usgs.is_ok());
    }
}
