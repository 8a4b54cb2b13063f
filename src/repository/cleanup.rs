//! Hard purge of soft-deleted rows
//!
//! Rows soft-deleted longer ago than the retention grace window are removed
//! for real. Deletion order is child-first to respect foreign keys, and all
//! tables purge inside one transaction. Identity-sequence compaction is a
//! separate best-effort step after commit: a failed `setval` must not roll
//! back a successful purge.

use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};

use crate::error::AppResult;

/// Purge order. Children before parents.
const PURGE_TABLES: [&str; 5] = [
    "users",
    "equipment_sets",
    "activities",
    "bookings",
    "equipment_items",
];

#[derive(Clone)]
pub struct CleanupRepository {
    pool: Pool<Postgres>,
}

impl CleanupRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Hard-delete rows soft-deleted before `cutoff` across every table.
    /// Returns the total number of rows removed. Rolls back entirely if any
    /// table fails.
    pub async fn purge_deleted(&self, cutoff: DateTime<Utc>) -> AppResult<u64> {
        let mut tx = self.pool.begin().await?;
        let mut total = 0u64;

        for table in PURGE_TABLES {
            let result = sqlx::query(&format!(
                "DELETE FROM {} WHERE deleted_at IS NOT NULL AND deleted_at < $1",
                table
            ))
            .bind(cutoff)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() > 0 {
                tracing::debug!(table, rows = result.rows_affected(), "purged rows");
            }
            total += result.rows_affected();
        }

        tx.commit().await?;
        Ok(total)
    }

    /// Pull each table's identity sequence back down to the current maximum
    /// id. Best effort: failures are logged and skipped, never propagated.
    pub async fn compact_sequences(&self) {
        for table in PURGE_TABLES {
            let query = format!(
                "SELECT setval(pg_get_serial_sequence('{t}', 'id'), COALESCE((SELECT MAX(id) FROM {t}), 1))",
                t = table
            );
            if let Err(e) = sqlx::query(&query).execute(&self.pool).await {
                tracing::warn!(table, error = %e, "sequence compaction failed");
            }
        }
    }
}
