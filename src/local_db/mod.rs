//! # Local Database Module
//!
//! SQLite-backed [`StorageBackend`] holding the offline submission queue.
//! Records survive process restarts: reopening the same file yields every
//! submission that was not yet delivered.
//!
//! ## Layout
//!
//! - One table per submission partition (`pending_quotes`, `pending_contacts`,
//!   `pending_cart_updates`, `pending_favorites`), see [`schema`]
//! - `schema_migrations` records the applied schema version
//! - WAL journal mode
//!
//! ## Usage
//!
//! ```rust,no_run
//! use pgclosets_offline::local_db::LocalDatabase;
//! use pgclosets_offline::offline::backend::StorageBackend;
//!
//! # async fn example() -> Result<(), pgclosets_offline::shared::SyncError> {
//! let db = LocalDatabase::new("/var/lib/pgclosets/offline.db");
//! db.open().await?;
//! # Ok(())
//! # }
//! ```

pub mod schema;

use crate::offline::backend::{PartitionScan, StorageBackend};
use crate::shared::error::{Result, SyncError};
use crate::shared::submission::{PendingSubmission, SubmissionId, SubmissionType};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqliteRow, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// Local database connection manager
///
/// The pool is created lazily by [`StorageBackend::open`]; every other
/// operation fails with [`SyncError::NotInitialized`] until then, and again
/// after [`LocalDatabase::close`] until the next `open`.
#[derive(Debug)]
pub struct LocalDatabase {
    path: PathBuf,
    pool: Mutex<Option<SqlitePool>>,
}

impl LocalDatabase {
    /// Create a handle on the database file at `path` without opening it
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            pool: Mutex::new(None),
        }
    }

    /// Location of the database file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Handle on the open connection pool
    pub async fn pool(&self) -> Result<SqlitePool> {
        self.pool.lock().await.clone().ok_or(SyncError::NotInitialized)
    }

    /// Close the pool, flushing the WAL. A later `open` reconnects.
    pub async fn close(&self) {
        let pool = self.pool.lock().await.take();
        if let Some(pool) = pool {
            pool.close().await;
            tracing::debug!(path = %self.path.display(), "Offline database closed");
        }
    }

    async fn connect(&self) -> Result<SqlitePool> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    SyncError::storage_unavailable(format!(
                        "cannot create {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(&self.path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePool::connect_with(options).await.map_err(|e| {
            SyncError::storage_unavailable(format!("cannot open {}: {}", self.path.display(), e))
        })?;

        Self::init_schema(&pool).await?;
        tracing::info!(path = %self.path.display(), "Offline database initialized");
        Ok(pool)
    }

    /// Create partition tables and apply pending migrations
    async fn init_schema(pool: &SqlitePool) -> Result<()> {
        for kind in SubmissionType::ALL {
            for statement in schema::partition_ddl(kind) {
                sqlx::query(&statement)
                    .execute(pool)
                    .await
                    .map_err(|e| SyncError::storage_unavailable(e.to_string()))?;
            }
        }

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            )",
        )
        .execute(pool)
        .await
        .map_err(|e| SyncError::storage_unavailable(e.to_string()))?;

        let current_version: (i32,) =
            sqlx::query_as("SELECT COALESCE(MAX(version), 0) FROM schema_migrations")
                .fetch_one(pool)
                .await
                .map_err(|e| SyncError::storage_unavailable(e.to_string()))?;

        if !schema::needs_migration(current_version.0) {
            return Ok(());
        }

        for version in schema::get_pending_migrations(current_version.0) {
            sqlx::query("INSERT INTO schema_migrations (version, applied_at) VALUES (?, ?)")
                .bind(version)
                .bind(chrono::Utc::now().to_rfc3339())
                .execute(pool)
                .await
                .map_err(|e| SyncError::storage_unavailable(e.to_string()))?;
            tracing::debug!(version, "Applied offline schema migration");
        }

        Ok(())
    }

    fn record_from_row(kind: SubmissionType, row: &SqliteRow) -> Result<PendingSubmission> {
        let read = |e: sqlx::Error| SyncError::read_failed(e.to_string());

        let id: String = row.try_get("id").map_err(read)?;
        let payload: String = row.try_get("payload").map_err(read)?;
        let retry_count: i64 = row.try_get("retry_count").map_err(read)?;

        Ok(PendingSubmission {
            id: SubmissionId::from(id),
            kind,
            payload: serde_json::from_str(&payload)?,
            enqueued_at: row.try_get("enqueued_at").map_err(read)?,
            retry_count: u32::try_from(retry_count).unwrap_or(u32::MAX),
            last_error: row.try_get("last_error").map_err(read)?,
        })
    }
}

#[async_trait]
impl StorageBackend for LocalDatabase {
    async fn open(&self) -> Result<()> {
        let mut pool = self.pool.lock().await;
        if pool.is_none() {
            *pool = Some(self.connect().await?);
        }
        Ok(())
    }

    async fn add_record(&self, record: &PendingSubmission) -> Result<()> {
        let payload = serde_json::to_string(&record.payload)?;
        let sql = format!(
            "INSERT INTO {} (id, payload, enqueued_at, retry_count, last_error)
             VALUES (?, ?, ?, ?, ?)",
            record.kind.partition()
        );

        sqlx::query(&sql)
            .bind(record.id.as_str())
            .bind(payload)
            .bind(record.enqueued_at)
            .bind(i64::from(record.retry_count))
            .bind(record.last_error.as_deref())
            .execute(&self.pool().await?)
            .await
            .map_err(|e| SyncError::write_failed(e.to_string()))?;

        Ok(())
    }

    async fn get_all_records(&self, kind: SubmissionType) -> Result<PartitionScan> {
        let sql = format!(
            "SELECT id, payload, enqueued_at, retry_count, last_error
             FROM {}
             ORDER BY rowid ASC",
            kind.partition()
        );

        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool().await?)
            .await
            .map_err(|e| SyncError::read_failed(e.to_string()))?;

        let mut scan = PartitionScan::default();
        for row in &rows {
            match Self::record_from_row(kind, row) {
                Ok(record) => scan.records.push(record),
                Err(e) => {
                    let id: Option<String> = row.try_get("id").ok();
                    tracing::error!(%kind, id = id.as_deref().unwrap_or("?"), error = %e, "Skipping unreadable row");
                    scan.unreadable += 1;
                }
            }
        }
        Ok(scan)
    }

    async fn count_records(&self, kind: SubmissionType) -> Result<usize> {
        let sql = format!("SELECT COUNT(*) FROM {}", kind.partition());
        let (count,): (i64,) = sqlx::query_as(&sql)
            .fetch_one(&self.pool().await?)
            .await
            .map_err(|e| SyncError::read_failed(e.to_string()))?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    async fn delete_record(&self, kind: SubmissionType, id: &SubmissionId) -> Result<bool> {
        let sql = format!("DELETE FROM {} WHERE id = ?", kind.partition());
        let result = sqlx::query(&sql)
            .bind(id.as_str())
            .execute(&self.pool().await?)
            .await
            .map_err(|e| SyncError::write_failed(e.to_string()))?;
        Ok(result.rows_affected() > 0)
    }

    async fn put_record(&self, record: &PendingSubmission) -> Result<bool> {
        let payload = serde_json::to_string(&record.payload)?;
        let sql = format!(
            "UPDATE {} SET
                payload = ?,
                enqueued_at = ?,
                retry_count = ?,
                last_error = ?
             WHERE id = ?",
            record.kind.partition()
        );

        let result = sqlx::query(&sql)
            .bind(payload)
            .bind(record.enqueued_at)
            .bind(i64::from(record.retry_count))
            .bind(record.last_error.as_deref())
            .bind(record.id.as_str())
            .execute(&self.pool().await?)
            .await
            .map_err(|e| SyncError::write_failed(e.to_string()))?;
        Ok(result.rows_affected() > 0)
    }

    async fn clear_partition(&self, kind: SubmissionType) -> Result<()> {
        let sql = format!("DELETE FROM {}", kind.partition());
        sqlx::query(&sql)
            .execute(&self.pool().await?)
            .await
            .map_err(|e| SyncError::write_failed(e.to_string()))?;
        Ok(())
    }
}
