//! PG Closets Offline Sync - Main Library
//!
//! Durable offline queue for storefront form submissions. Quote requests,
//! contact forms, cart updates and favorites are stored locally while the
//! shopper has no connectivity and replayed against the storefront API once
//! the connection returns.
//!
//! # Module Structure
//!
//! - **`shared`** - Types used across the crate
//!   - Submission types and queued records
//!   - Error types
//!   - Configuration (defaults, environment, TOML)
//!
//! - **`offline`** - The durable queue and its entry point
//!   - `StorageBackend` abstraction with an in-memory implementation
//!   - `SubmissionQueue` with type partitions
//!   - Retry ceiling
//!   - `OfflineSyncManager`, the caller API
//!
//! - **`local_db`** - SQLite storage backend that survives restarts
//!
//! - **`sync`** - Delivery of queued submissions
//!   - `SyncOrchestrator` with the single-run guard
//!   - HTTP delivery
//!   - Connectivity watcher
//!   - Success notifications
//!
//! # Usage
//!
//! ```rust,no_run
//! use pgclosets_offline::offline::OfflineSyncManager;
//! use pgclosets_offline::shared::{SubmissionType, SyncConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = OfflineSyncManager::builder(SyncConfig::default()).build().await?;
//! manager
//!     .queue_form_submission(
//!         SubmissionType::Quotes,
//!         serde_json::json!({"name": "Jane Doe", "email": "jane@example.com"}),
//!     )
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Thread Safety
//!
//! Every component is `Send + Sync` and shared through `Arc`. Sync runs are
//! spawned on the ambient tokio runtime; at most one run per orchestrator is
//! in flight at a time.

/// Shared types and data structures
pub mod shared;

/// Durable offline queue
pub mod offline;

/// SQLite storage backend
pub mod local_db;

/// Delivery of queued submissions
pub mod sync;
