//! Shared Module
//!
//! Types used by every layer of the offline queue: submission records,
//! error types and configuration.

/// Submission categories and queued records
pub mod submission;

/// Shared error types
pub mod error;

/// Sync configuration
pub mod config;

/// Re-export commonly used types for convenience
pub use submission::{PendingSubmission, SubmissionId, SubmissionType};
pub use error::{EnqueueError, SyncError};
pub use config::{ConfigError, EndpointTable, NotificationConfig, SyncConfig, SyncConfigBuilder};
