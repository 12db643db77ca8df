//! # Offline Submission System
//!
//! Buffers storefront form submissions while the shopper is offline and
//! replays them once connectivity returns.
//!
//! ## Architecture
//!
//! - **Storage Backend**: pluggable persistence (`backend.rs`, `memory.rs`,
//!   [`crate::local_db`])
//! - **Submission Queue**: durable, type-partitioned records (`queue.rs`)
//! - **Retry Policy**: retry ceiling for failed deliveries (`retry.rs`)
//! - **Sync Manager**: the entry point wiring queue, orchestrator and
//!   connectivity together (this module)
//!
//! ## Usage
//!
//! ```rust,no_run
//! use pgclosets_offline::offline::OfflineSyncManager;
//! use pgclosets_offline::shared::{SubmissionType, SyncConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = OfflineSyncManager::builder(SyncConfig::from_env()?).build().await?;
//!
//! // Queue a quote request; delivery happens in the background when online
//! let id = manager
//!     .queue_form_submission(SubmissionType::Quotes, serde_json::json!({"name": "Jane Doe"}))
//!     .await?;
//!
//! // Host reports connectivity changes
//! manager.connectivity().set_online(false);
//! manager.connectivity().set_online(true);
//!
//! println!("{} still pending", manager.get_pending_submission_count().await?);
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod memory;
pub mod queue;
pub mod retry;

// Re-export main types
pub use backend::{PartitionScan, StorageBackend};
pub use memory::MemoryBackend;
pub use queue::SubmissionQueue;
pub use retry::{RetryDecision, RetryPolicy};

use crate::local_db::LocalDatabase;
use crate::shared::config::SyncConfig;
use crate::shared::error::{EnqueueError, Result, SyncError};
use crate::shared::submission::{PendingSubmission, SubmissionId, SubmissionType};
use crate::sync::delivery::{Delivery, HttpDelivery};
use crate::sync::network_monitor::ConnectivityWatcher;
use crate::sync::notifier::{Notifier, TracingNotifier};
use crate::sync::{SyncOrchestrator, SyncOutcome};
use serde_json::Value;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Entry point the storefront uses to queue and inspect offline submissions
#[derive(Debug)]
pub struct OfflineSyncManager {
    queue: SubmissionQueue,
    orchestrator: Arc<SyncOrchestrator>,
    connectivity: Arc<ConnectivityWatcher>,
    /// Reacts to connectivity transitions
    listener: JoinHandle<()>,
}

impl OfflineSyncManager {
    /// Start assembling a manager from `config`
    pub fn builder(config: SyncConfig) -> OfflineSyncManagerBuilder {
        OfflineSyncManagerBuilder::new(config)
    }

    /// Open the store again; safe to call any number of times
    pub async fn initialize(&self) -> Result<()> {
        self.queue.initialize().await
    }

    /// Persist a submission and start a background sync if online
    ///
    /// Returns as soon as the record is stored; delivery is not awaited. A
    /// storage failure hands the payload back inside the error.
    pub async fn enqueue(
        &self,
        kind: SubmissionType,
        payload: Value,
    ) -> std::result::Result<SubmissionId, EnqueueError> {
        let submission = PendingSubmission::new(kind, payload);
        if let Err(e) = self.queue.insert(&submission).await {
            tracing::error!(%kind, error = %e, "Failed to queue submission locally");
            return Err(EnqueueError::new(kind, e, submission.payload));
        }

        if self.connectivity.is_online() {
            self.orchestrator.spawn_sync();
        }

        Ok(submission.id)
    }

    /// Queue a storefront form submission for delivery
    pub async fn queue_form_submission(
        &self,
        kind: SubmissionType,
        payload: Value,
    ) -> std::result::Result<SubmissionId, EnqueueError> {
        self.enqueue(kind, payload).await
    }

    /// Whether anything is still waiting for delivery
    pub async fn has_pending_submissions(&self) -> Result<bool> {
        Ok(self.queue.count().await? > 0)
    }

    /// Number of submissions waiting for delivery, across all types
    pub async fn get_pending_submission_count(&self) -> Result<usize> {
        self.queue.count().await
    }

    /// Run a sync now and wait for it
    pub async fn sync_now(&self) -> SyncOutcome {
        self.orchestrator.sync_all().await
    }

    /// Submissions that exhausted their retries and need manual handling
    pub async fn stuck_submissions(&self) -> Result<Vec<PendingSubmission>> {
        self.queue
            .stuck(self.orchestrator.retry_policy().max_retries())
            .await
    }

    /// Drop every pending submission
    pub async fn clear_all_pending(&self) -> Result<()> {
        self.queue.clear_all().await
    }

    pub fn queue(&self) -> &SubmissionQueue {
        &self.queue
    }

    pub fn orchestrator(&self) -> &Arc<SyncOrchestrator> {
        &self.orchestrator
    }

    pub fn connectivity(&self) -> &Arc<ConnectivityWatcher> {
        &self.connectivity
    }
}

impl Drop for OfflineSyncManager {
    fn drop(&mut self) {
        self.listener.abort();
    }
}

/// Builder for OfflineSyncManager
///
/// Every collaborator defaults from the configuration: SQLite store at
/// `database_path`, HTTP delivery, log-only notifier, online connectivity.
#[derive(Debug)]
pub struct OfflineSyncManagerBuilder {
    config: SyncConfig,
    backend: Option<Arc<dyn StorageBackend>>,
    delivery: Option<Arc<dyn Delivery>>,
    notifier: Option<Arc<dyn Notifier>>,
    connectivity: Option<Arc<ConnectivityWatcher>>,
}

impl OfflineSyncManagerBuilder {
    fn new(config: SyncConfig) -> Self {
        Self {
            config,
            backend: None,
            delivery: None,
            notifier: None,
            connectivity: None,
        }
    }

    /// Use `backend` instead of the SQLite file
    pub fn backend(mut self, backend: Arc<dyn StorageBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Use `delivery` instead of HTTP
    pub fn delivery(mut self, delivery: Arc<dyn Delivery>) -> Self {
        self.delivery = Some(delivery);
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Share a connectivity watcher the host already reports into
    pub fn connectivity(mut self, connectivity: Arc<ConnectivityWatcher>) -> Self {
        self.connectivity = Some(connectivity);
        self
    }

    /// Open the store and start watching connectivity
    ///
    /// Must be called within a tokio runtime.
    pub async fn build(self) -> Result<OfflineSyncManager> {
        let backend = match self.backend {
            Some(backend) => backend,
            None => Arc::new(LocalDatabase::new(self.config.database_path())),
        };
        let delivery = match self.delivery {
            Some(delivery) => delivery,
            None => Arc::new(
                HttpDelivery::new(&self.config)
                    .map_err(|e| SyncError::DeliveryUnavailable { message: e.to_string() })?,
            ),
        };
        let notifier = self.notifier.unwrap_or_else(|| Arc::new(TracingNotifier));
        let connectivity = self
            .connectivity
            .unwrap_or_else(|| Arc::new(ConnectivityWatcher::default()));

        let queue = SubmissionQueue::new(backend);
        queue.initialize().await?;

        let orchestrator = Arc::new(SyncOrchestrator::new(
            queue.clone(),
            delivery,
            Arc::clone(&connectivity),
            notifier,
            RetryPolicy::new(self.config.max_retries()),
        ));
        let listener = connectivity.spawn_listener(Arc::clone(&orchestrator));

        Ok(OfflineSyncManager {
            queue,
            orchestrator,
            connectivity,
            listener,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::delivery::DeliveryError;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Debug, Default)]
    struct CountingDelivery {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Delivery for CountingDelivery {
        async fn deliver(&self, _kind: SubmissionType, _payload: &Value) -> std::result::Result<(), DeliveryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    async fn manager(online: bool, backend: Arc<dyn StorageBackend>) -> (OfflineSyncManager, Arc<CountingDelivery>) {
        let delivery = Arc::new(CountingDelivery::default());
        let manager = OfflineSyncManager::builder(SyncConfig::default())
            .backend(backend)
            .delivery(delivery.clone())
            .connectivity(Arc::new(ConnectivityWatcher::new(online)))
            .build()
            .await
            .unwrap();
        (manager, delivery)
    }

    async fn wait_until_empty(manager: &OfflineSyncManager) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while manager.has_pending_submissions().await.unwrap() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("queue did not drain");
    }

    #[tokio::test]
    async fn test_enqueue_offline_keeps_record() {
        let (manager, delivery) = manager(false, Arc::new(MemoryBackend::new())).await;

        manager
            .queue_form_submission(SubmissionType::Quotes, json!({"name": "Jane Doe"}))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(manager.get_pending_submission_count().await.unwrap(), 1);
        assert_eq!(delivery.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_enqueue_online_syncs_in_background() {
        let (manager, delivery) = manager(true, Arc::new(MemoryBackend::new())).await;

        manager
            .enqueue(SubmissionType::Contacts, json!({"email": "jane@example.com"}))
            .await
            .unwrap();

        wait_until_empty(&manager).await;
        assert_eq!(delivery.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_reconnect_triggers_sync() {
        let (manager, _delivery) = manager(false, Arc::new(MemoryBackend::new())).await;
        manager.enqueue(SubmissionType::Cart, json!({"sku": "BYPASS-48"})).await.unwrap();
        assert!(manager.has_pending_submissions().await.unwrap());

        manager.connectivity().set_online(true);
        wait_until_empty(&manager).await;
    }

    #[tokio::test]
    async fn test_write_failure_returns_payload() {
        let (manager, _delivery) = manager(false, Arc::new(MemoryBackend::with_quota(0))).await;
        let payload = json!({"name": "Jane Doe"});

        let error = manager
            .enqueue(SubmissionType::Quotes, payload.clone())
            .await
            .unwrap_err();
        assert!(matches!(error.source, SyncError::WriteFailed { .. }));
        assert_eq!(error.into_payload(), payload);
    }

    #[tokio::test]
    async fn test_enqueue_returns_stored_id() {
        let (manager, _delivery) = manager(false, Arc::new(MemoryBackend::new())).await;
        let payload = json!({"sku": "BIFOLD-30", "quantity": 2});

        let id = manager.enqueue(SubmissionType::Cart, payload.clone()).await.unwrap();

        let stored = manager.queue().get_all(SubmissionType::Cart).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, id);
        assert_eq!(stored[0].payload, payload);
    }

    #[tokio::test]
    async fn test_initialize_is_idempotent() {
        let (manager, _delivery) = manager(false, Arc::new(MemoryBackend::new())).await;
        manager.enqueue(SubmissionType::Favorites, json!({})).await.unwrap();

        manager.initialize().await.unwrap();
        manager.initialize().await.unwrap();
        assert_eq!(manager.get_pending_submission_count().await.unwrap(), 1);
    }
}
