//! # In-Memory Backend
//!
//! Keeps partitions in process memory. Records do not survive a restart, so
//! this backend suits tests and hosts with no writable filesystem. An optional
//! quota caps the total number of stored records; writes past it fail the
//! same way a full browser store does.

use crate::offline::backend::{PartitionScan, StorageBackend};
use crate::shared::error::{Result, SyncError};
use crate::shared::submission::{PendingSubmission, SubmissionId, SubmissionType};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Partitions {
    opened: bool,
    records: HashMap<SubmissionType, Vec<PendingSubmission>>,
}

impl Partitions {
    fn total(&self) -> usize {
        self.records.values().map(Vec::len).sum()
    }

    fn partition(&self, kind: SubmissionType) -> Result<&Vec<PendingSubmission>> {
        if !self.opened {
            return Err(SyncError::NotInitialized);
        }
        self.records.get(&kind).ok_or(SyncError::NotInitialized)
    }

    fn partition_mut(&mut self, kind: SubmissionType) -> Result<&mut Vec<PendingSubmission>> {
        if !self.opened {
            return Err(SyncError::NotInitialized);
        }
        self.records.get_mut(&kind).ok_or(SyncError::NotInitialized)
    }
}

/// Process-local storage backend
#[derive(Debug, Default)]
pub struct MemoryBackend {
    inner: RwLock<Partitions>,
    quota: Option<usize>,
}

impl MemoryBackend {
    /// Create an unbounded backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a backend that rejects writes once `quota` records are stored
    pub fn with_quota(quota: usize) -> Self {
        Self {
            inner: RwLock::new(Partitions::default()),
            quota: Some(quota),
        }
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn open(&self) -> Result<()> {
        let mut inner = self.inner.write().await;
        for kind in SubmissionType::ALL {
            inner.records.entry(kind).or_default();
        }
        inner.opened = true;
        Ok(())
    }

    async fn add_record(&self, record: &PendingSubmission) -> Result<()> {
        let mut inner = self.inner.write().await;
        if let Some(quota) = self.quota {
            if inner.opened && inner.total() >= quota {
                return Err(SyncError::write_failed(format!(
                    "quota exceeded ({} records)",
                    quota
                )));
            }
        }

        let partition = inner.partition_mut(record.kind)?;
        if partition.iter().any(|existing| existing.id == record.id) {
            return Err(SyncError::write_failed(format!(
                "duplicate id {} in {}",
                record.id,
                record.kind.partition()
            )));
        }
        partition.push(record.clone());
        Ok(())
    }

    async fn get_all_records(&self, kind: SubmissionType) -> Result<PartitionScan> {
        let inner = self.inner.read().await;
        Ok(PartitionScan {
            records: inner.partition(kind)?.clone(),
            unreadable: 0,
        })
    }

    async fn count_records(&self, kind: SubmissionType) -> Result<usize> {
        let inner = self.inner.read().await;
        Ok(inner.partition(kind)?.len())
    }

    async fn delete_record(&self, kind: SubmissionType, id: &SubmissionId) -> Result<bool> {
        let mut inner = self.inner.write().await;
        let partition = inner.partition_mut(kind)?;
        let before = partition.len();
        partition.retain(|record| &record.id != id);
        Ok(partition.len() != before)
    }

    async fn put_record(&self, record: &PendingSubmission) -> Result<bool> {
        let mut inner = self.inner.write().await;
        let partition = inner.partition_mut(record.kind)?;
        match partition.iter_mut().find(|existing| existing.id == record.id) {
            Some(existing) => {
                *existing = record.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn clear_partition(&self, kind: SubmissionType) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.partition_mut(kind)?.clear();
        Ok(())
    }
}
