//! Database Schema Definitions
//!
//! One table per submission partition, named after the partition, with the
//! same secondary indexes the browser store used (`enqueued_at`,
//! `retry_count`).

use crate::shared::submission::SubmissionType;

/// Current database schema version
pub const CURRENT_SCHEMA_VERSION: i32 = 1;

/// Schema migration versions
pub const MIGRATION_VERSIONS: &[i32] = &[1];

/// Whether a store recorded at `current_version` is behind this build
pub fn needs_migration(current_version: i32) -> bool {
    current_version < CURRENT_SCHEMA_VERSION
}

/// Get pending migrations
pub fn get_pending_migrations(current_version: i32) -> Vec<i32> {
    MIGRATION_VERSIONS
        .iter()
        .filter(|&&v| v > current_version)
        .cloned()
        .collect()
}

/// Statements creating the table and indexes of one partition
///
/// Table names come from the closed [`SubmissionType`] set, never from input.
pub fn partition_ddl(kind: SubmissionType) -> [String; 3] {
    let table = kind.partition();
    [
        format!(
            "CREATE TABLE IF NOT EXISTS {table} (
                id TEXT PRIMARY KEY NOT NULL,
                payload TEXT NOT NULL,
                enqueued_at INTEGER NOT NULL,
                retry_count INTEGER NOT NULL DEFAULT 0,
                last_error TEXT
            )"
        ),
        format!("CREATE INDEX IF NOT EXISTS idx_{table}_enqueued_at ON {table} (enqueued_at)"),
        format!("CREATE INDEX IF NOT EXISTS idx_{table}_retry_count ON {table} (retry_count)"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_store_needs_every_migration() {
        assert!(needs_migration(0));
        assert_eq!(get_pending_migrations(0), MIGRATION_VERSIONS.to_vec());
        assert_eq!(MIGRATION_VERSIONS.last(), Some(&CURRENT_SCHEMA_VERSION));
    }

    #[test]
    fn test_current_store_is_left_alone() {
        assert!(!needs_migration(CURRENT_SCHEMA_VERSION));
        assert!(!needs_migration(CURRENT_SCHEMA_VERSION + 1));
    }

    #[test]
    fn test_pending_migrations() {
        assert_eq!(get_pending_migrations(0), vec![1]);
        assert_eq!(get_pending_migrations(1), Vec::<i32>::new());
    }

    #[test]
    fn test_partition_ddl_names() {
        let ddl = partition_ddl(SubmissionType::Cart);
        assert!(ddl[0].contains("CREATE TABLE IF NOT EXISTS pending_cart_updates"));
        assert!(ddl[1].contains("idx_pending_cart_updates_enqueued_at"));
        assert!(ddl[2].contains("idx_pending_cart_updates_retry_count"));
    }
}
