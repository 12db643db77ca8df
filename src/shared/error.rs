//! Shared Error Types
//!
//! Error types returned by the durable queue and its callers.
//!
//! # Error Categories
//!
//! - `StorageUnavailable` - persistent storage cannot be opened at all
//! - `WriteFailed` - a single add/update was rejected (e.g. quota exceeded)
//! - `ReadFailed` - a partition could not be read back
//! - `RecordNotFound` - an update targeted an id that is no longer stored
//! - `NotInitialized` - the store was used before `initialize()`
//! - `DeliveryUnavailable` - the HTTP client could not be built
//! - `SerializationError` - a payload could not be encoded or decoded
//!
//! Delivery failures are not part of this enum: they never leave a sync run
//! and live in [`crate::sync::delivery::DeliveryError`].
//!
//! # Usage
//!
//! ```rust
//! use pgclosets_offline::shared::error::SyncError;
//!
//! let error = SyncError::write_failed("quota exceeded");
//! assert!(error.to_string().contains("quota exceeded"));
//! ```

use crate::shared::submission::{SubmissionId, SubmissionType};
use serde_json::Value;
use thiserror::Error;

/// Errors raised by queue storage operations
#[derive(Debug, Error)]
pub enum SyncError {
    /// The persistent store could not be opened
    #[error("Storage unavailable: {message}")]
    StorageUnavailable {
        /// Human-readable error message
        message: String,
    },

    /// A write to the store was rejected
    #[error("Write failed: {message}")]
    WriteFailed {
        /// Human-readable error message
        message: String,
    },

    /// A partition could not be read
    #[error("Read failed: {message}")]
    ReadFailed {
        /// Human-readable error message
        message: String,
    },

    /// No record with this id exists in the partition
    #[error("Record {id} not found in {kind}")]
    RecordNotFound {
        /// Partition that was searched
        kind: SubmissionType,
        /// Missing record id
        id: SubmissionId,
    },

    /// The HTTP delivery client could not be created
    #[error("Delivery client unavailable: {message}")]
    DeliveryUnavailable {
        /// Human-readable error message
        message: String,
    },

    /// The store was used before being opened
    #[error("Offline store not initialized")]
    NotInitialized,

    /// JSON encoding or decoding of a stored record failed
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl SyncError {
    /// Create a new storage-unavailable error
    pub fn storage_unavailable(message: impl Into<String>) -> Self {
        Self::StorageUnavailable {
            message: message.into(),
        }
    }

    /// Create a new write-failed error
    pub fn write_failed(message: impl Into<String>) -> Self {
        Self::WriteFailed {
            message: message.into(),
        }
    }

    /// Create a new read-failed error
    pub fn read_failed(message: impl Into<String>) -> Self {
        Self::ReadFailed {
            message: message.into(),
        }
    }

    /// Create a new record-not-found error
    pub fn not_found(kind: SubmissionType, id: SubmissionId) -> Self {
        Self::RecordNotFound { kind, id }
    }
}

/// Result type for queue storage operations
pub type Result<T> = std::result::Result<T, SyncError>;

/// A submission that could not even be queued locally
///
/// Carries the caller's payload back so the form state can be preserved
/// instead of being lost with the failed write.
#[derive(Debug, Error)]
#[error("Failed to queue {kind} submission: {source}")]
pub struct EnqueueError {
    /// Category the caller tried to queue
    pub kind: SubmissionType,
    /// Underlying storage failure
    #[source]
    pub source: SyncError,
    payload: Value,
}

impl EnqueueError {
    pub(crate) fn new(kind: SubmissionType, source: SyncError, payload: Value) -> Self {
        Self { kind, source, payload }
    }

    /// Borrow the payload that was not queued
    pub fn payload(&self) -> &Value {
        &self.payload
    }

    /// Take back the payload that was not queued
    pub fn into_payload(self) -> Value {
        self.payload
    }
}
