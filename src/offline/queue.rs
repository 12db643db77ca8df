//! # Submission Queue
//!
//! Durable, type-partitioned store of pending submissions on top of a
//! [`StorageBackend`]. Builds records on `add`, treats a missing id on
//! `remove` as already done, and reports a missing id on `update`.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use pgclosets_offline::offline::memory::MemoryBackend;
//! use pgclosets_offline::offline::queue::SubmissionQueue;
//! use pgclosets_offline::shared::SubmissionType;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), pgclosets_offline::shared::SyncError> {
//! let queue = SubmissionQueue::new(Arc::new(MemoryBackend::new()));
//! queue.initialize().await?;
//!
//! let id = queue.add(SubmissionType::Quotes, serde_json::json!({"name": "Jane Doe"})).await?;
//! for record in queue.get_all(SubmissionType::Quotes).await? {
//!     // Deliver record...
//!     queue.remove(SubmissionType::Quotes, &record.id).await?;
//! }
//! # Ok(())
//! # }
//! ```

use crate::offline::backend::{PartitionScan, StorageBackend};
use crate::shared::error::{Result, SyncError};
use crate::shared::submission::{PendingSubmission, SubmissionId, SubmissionType};
use serde_json::Value;
use std::sync::Arc;

/// Durable queue of pending submissions
#[derive(Debug, Clone)]
pub struct SubmissionQueue {
    backend: Arc<dyn StorageBackend>,
}

impl SubmissionQueue {
    /// Create a queue over `backend`
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    /// Open the backend and create missing partitions
    pub async fn initialize(&self) -> Result<()> {
        self.backend.open().await
    }

    /// Persist a new submission and return its id
    pub async fn add(&self, kind: SubmissionType, payload: Value) -> Result<SubmissionId> {
        let submission = PendingSubmission::new(kind, payload);
        self.insert(&submission).await?;
        Ok(submission.id)
    }

    /// Persist a record built by the caller
    ///
    /// The record stays with the caller, so a rejected write loses nothing.
    pub async fn insert(&self, submission: &PendingSubmission) -> Result<()> {
        self.backend.add_record(submission).await?;
        tracing::info!(id = %submission.id, "Added pending submission");
        Ok(())
    }

    /// Every readable record in the partition for `kind`
    pub async fn get_all(&self, kind: SubmissionType) -> Result<Vec<PendingSubmission>> {
        Ok(self.scan(kind).await?.records)
    }

    /// Readable records of `kind` plus the number of rows that were skipped
    pub async fn scan(&self, kind: SubmissionType) -> Result<PartitionScan> {
        self.backend.get_all_records(kind).await
    }

    /// Delete a record; a missing id is not an error
    pub async fn remove(&self, kind: SubmissionType, id: &SubmissionId) -> Result<()> {
        if self.backend.delete_record(kind, id).await? {
            tracing::info!(%id, "Removed pending submission");
        } else {
            tracing::debug!(%id, "Pending submission already gone");
        }
        Ok(())
    }

    /// Overwrite a stored record, e.g. after a failed delivery
    pub async fn update(&self, record: &PendingSubmission) -> Result<()> {
        if self.backend.put_record(record).await? {
            Ok(())
        } else {
            Err(SyncError::not_found(record.kind, record.id.clone()))
        }
    }

    /// Total records across all partitions
    pub async fn count(&self) -> Result<usize> {
        let mut total = 0;
        for kind in SubmissionType::ALL {
            total += self.backend.count_records(kind).await?;
        }
        Ok(total)
    }

    /// Records that exhausted their automatic retries
    pub async fn stuck(&self, max_retries: u32) -> Result<Vec<PendingSubmission>> {
        let mut stuck = Vec::new();
        for kind in SubmissionType::ALL {
            stuck.extend(
                self.get_all(kind)
                    .await?
                    .into_iter()
                    .filter(|record| record.is_stuck(max_retries)),
            );
        }
        Ok(stuck)
    }

    /// Empty every partition
    pub async fn clear_all(&self) -> Result<()> {
        for kind in SubmissionType::ALL {
            self.backend.clear_partition(kind).await?;
        }
        tracing::warn!("Cleared all pending submissions");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::offline::memory::MemoryBackend;
    use serde_json::json;

    async fn open_queue() -> SubmissionQueue {
        let queue = SubmissionQueue::new(Arc::new(MemoryBackend::new()));
        queue.initialize().await.unwrap();
        queue
    }

    #[tokio::test]
    async fn test_add_and_get_all() {
        let queue = open_queue().await;
        let payload = json!({"name": "Jane Doe", "email": "jane@example.com"});

        let id = queue.add(SubmissionType::Quotes, payload.clone()).await.unwrap();

        let records = queue.get_all(SubmissionType::Quotes).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, id);
        assert_eq!(records[0].payload, payload);
        assert_eq!(records[0].retry_count, 0);
        assert_eq!(queue.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_remove_missing_is_noop() {
        let queue = open_queue().await;
        let result = queue
            .remove(SubmissionType::Contacts, &SubmissionId::from("CONTACTS_1_missing00"))
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let queue = open_queue().await;
        let record = PendingSubmission::new(SubmissionType::Cart, json!({}));
        assert!(matches!(
            queue.update(&record).await,
            Err(SyncError::RecordNotFound { kind: SubmissionType::Cart, .. })
        ));
    }

    #[tokio::test]
    async fn test_count_spans_partitions_and_clear_all() {
        let queue = open_queue().await;
        queue.add(SubmissionType::Quotes, json!({})).await.unwrap();
        queue.add(SubmissionType::Cart, json!({})).await.unwrap();
        queue.add(SubmissionType::Favorites, json!({})).await.unwrap();
        assert_eq!(queue.count().await.unwrap(), 3);

        queue.clear_all().await.unwrap();
        assert_eq!(queue.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_stuck_lists_exhausted_records() {
        let queue = open_queue().await;
        queue.add(SubmissionType::Quotes, json!({"n": 1})).await.unwrap();
        queue.add(SubmissionType::Contacts, json!({"n": 2})).await.unwrap();

        let mut record = queue.get_all(SubmissionType::Contacts).await.unwrap().remove(0);
        for _ in 0..3 {
            record.record_failure("HTTP 500: Internal Server Error");
        }
        queue.update(&record).await.unwrap();

        let stuck = queue.stuck(3).await.unwrap();
        assert_eq!(stuck.len(), 1);
        assert_eq!(stuck[0].id, record.id);
    }

    #[tokio::test]
    async fn test_add_surfaces_write_failure() {
        let queue = SubmissionQueue::new(Arc::new(MemoryBackend::with_quota(0)));
        queue.initialize().await.unwrap();
        assert!(matches!(
            queue.add(SubmissionType::Quotes, json!({})).await,
            Err(SyncError::WriteFailed { .. })
        ));
    }
}
