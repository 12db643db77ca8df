//! # Storage Backend
//!
//! The small persistence interface the queue is built on. A backend owns one
//! partition per [`SubmissionType`] and performs keyed CRUD on
//! [`PendingSubmission`] records. Implementations:
//!
//! - [`crate::local_db::LocalDatabase`] - SQLite file, survives restarts
//! - [`crate::offline::memory::MemoryBackend`] - in-process, optional quota
//!
//! Every method except `open` must fail with `SyncError::NotInitialized`
//! until `open` has succeeded.
//!
//! A stored row that cannot be decoded must not hide the rest of its
//! partition: reads skip it and report it in [`PartitionScan::unreadable`].

use crate::shared::error::Result;
use crate::shared::submission::{PendingSubmission, SubmissionId, SubmissionType};
use async_trait::async_trait;

/// Records read back from one partition
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartitionScan {
    /// Decoded records, in insertion order
    pub records: Vec<PendingSubmission>,
    /// Stored rows that could not be decoded and were skipped
    pub unreadable: usize,
}

#[async_trait]
pub trait StorageBackend: Send + Sync + std::fmt::Debug {
    /// Open the store and create any missing partitions. Idempotent.
    async fn open(&self) -> Result<()>;

    /// Insert a new record; fails if the id already exists.
    async fn add_record(&self, record: &PendingSubmission) -> Result<()>;

    /// All decodable records of a partition, in insertion order.
    async fn get_all_records(&self, kind: SubmissionType) -> Result<PartitionScan>;

    /// Number of stored rows in a partition, decodable or not.
    async fn count_records(&self, kind: SubmissionType) -> Result<usize>;

    /// Delete by id. Returns whether a record was removed.
    async fn delete_record(&self, kind: SubmissionType, id: &SubmissionId) -> Result<bool>;

    /// Overwrite an existing record. Returns whether a record matched.
    async fn put_record(&self, record: &PendingSubmission) -> Result<bool>;

    /// Remove every record of a partition.
    async fn clear_partition(&self, kind: SubmissionType) -> Result<()>;
}
