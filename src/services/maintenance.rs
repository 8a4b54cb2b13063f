//! Maintenance mode and retention sweeps
//!
//! While a sweep runs the whole API answers 503, so the purge never races
//! user traffic. The sweeps themselves are paged and cumulative: one bad
//! row does not abort the rest of the batch.

use std::sync::{Arc, RwLock};
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};

use crate::{
    config::RetentionConfig,
    error::{AppError, AppResult, CumulativeError},
    repository::Repository,
};

/// Tracks whether the server is in maintenance mode, and since when.
#[derive(Debug, Default)]
pub struct MaintenanceManager {
    since: RwLock<Option<DateTime<Utc>>>,
}

impl MaintenanceManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether maintenance mode is currently active.
    pub fn is(&self) -> bool {
        self.since
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }

    /// Enter maintenance mode. Refused when already entered, so two sweeps
    /// cannot interleave.
    pub fn enter(&self) -> AppResult<()> {
        let mut since = self.since.write().unwrap_or_else(|e| e.into_inner());
        if since.is_some() {
            return Err(AppError::Conflict(
                "maintenance already in progress".to_string(),
            ));
        }
        *since = Some(Utc::now());
        Ok(())
    }

    /// Leave maintenance mode. Idempotent.
    pub fn exit(&self) {
        let mut since = self.since.write().unwrap_or_else(|e| e.into_inner());
        *since = None;
    }
}

#[derive(Clone)]
pub struct MaintenanceService {
    repository: Repository,
    manager: Arc<MaintenanceManager>,
    retention: RetentionConfig,
}

/// Outcome of one full sweep, for the manual trigger endpoint.
#[derive(Debug, serde::Serialize, utoipa::ToSchema)]
pub struct SweepReport {
    /// Expired bookings removed
    pub bookings_cleaned: u64,
    /// Soft-deleted rows purged for good
    pub rows_purged: u64,
}

impl MaintenanceService {
    pub fn new(
        repository: Repository,
        manager: Arc<MaintenanceManager>,
        retention: RetentionConfig,
    ) -> Self {
        Self {
            repository,
            manager,
            retention,
        }
    }

    pub fn manager(&self) -> Arc<MaintenanceManager> {
        self.manager.clone()
    }

    /// Soft-delete every booking whose window has fully elapsed, a page at
    /// a time. Failures are collected rather than aborting the batch, then
    /// returned as one aggregate error at the end; a page that makes no
    /// progress ends the loop so a stuck row cannot spin it forever.
    pub async fn clean_bookings(&self) -> AppResult<u64> {
        let now = Utc::now();
        let mut errors = CumulativeError::new();
        let mut cleaned = 0u64;

        loop {
            let page = self
                .repository
                .bookings
                .expired_page(now, self.retention.page_size)
                .await?;
            if page.is_empty() {
                break;
            }

            let page_len = page.len();
            let mut progressed = 0usize;
            for booking in page {
                match self.repository.bookings.delete_cascade(booking.id).await {
                    Ok(()) => {
                        cleaned += 1;
                        progressed += 1;
                    }
                    Err(e) => errors.push(e),
                }
            }

            if progressed == 0 || page_len < self.retention.page_size as usize {
                break;
            }
        }

        finish_sweep(cleaned, errors)
    }

    /// Hard-purge rows soft-deleted longer ago than the grace window, then
    /// compact the identity sequences. Compaction runs after the purge has
    /// committed and never fails the sweep.
    pub async fn clean_deleted(&self) -> AppResult<u64> {
        let cutoff = Utc::now() - Duration::days(self.retention.grace_days);
        let purged = self.repository.cleanup.purge_deleted(cutoff).await?;

        self.repository.cleanup.compact_sequences().await;

        if purged > 0 {
            tracing::info!(purged, "purged soft-deleted rows");
        }
        Ok(purged)
    }

    /// Run both sweeps under maintenance mode. Mode is always exited, even
    /// when a sweep fails.
    pub async fn run_sweep(&self) -> AppResult<SweepReport> {
        self.manager.enter()?;

        let result = async {
            let bookings_cleaned = self.clean_bookings().await?;
            let rows_purged = self.clean_deleted().await?;
            Ok(SweepReport {
                bookings_cleaned,
                rows_purged,
            })
        }
        .await;

        self.manager.exit();
        result
    }
}

/// Fold a sweep's tally and collected failures into its result: the count
/// on a clean run, otherwise the aggregate error carrying every failure.
fn finish_sweep(cleaned: u64, errors: CumulativeError) -> AppResult<u64> {
    if !errors.is_empty() {
        tracing::warn!(failures = errors.len(), "expired booking sweep had failures:\n{}", errors);
    }
    errors.into_result().map(|()| cleaned)
}

/// Run the sweep on a fixed interval until the process exits. The first
/// tick fires immediately so a restart catches up on overdue cleanup.
pub fn spawn_sweeper(service: MaintenanceService) {
    let period = StdDuration::from_secs(service.retention.sweep_interval_minutes * 60);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            match service.run_sweep().await {
                Ok(report) => tracing::info!(
                    bookings = report.bookings_cleaned,
                    purged = report.rows_purged,
                    "maintenance sweep finished"
                ),
                Err(e) => tracing::error!(error = %e, "maintenance sweep failed"),
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enter_is_exclusive() {
        let m = MaintenanceManager::new();
        assert!(!m.is());

        m.enter().unwrap();
        assert!(m.is());
        assert!(m.enter().is_err());

        m.exit();
        assert!(!m.is());
        m.enter().unwrap();
    }

    #[test]
    fn exit_is_idempotent() {
        let m = MaintenanceManager::new();
        m.exit();
        assert!(!m.is());
    }

    #[test]
    fn clean_run_reports_its_tally() {
        assert_eq!(finish_sweep(3, CumulativeError::new()).unwrap(), 3);
    }

    #[test]
    fn collected_failures_surface_as_one_error() {
        let mut errors = CumulativeError::new();
        errors.push(AppError::NotFound("booking 7".to_string()));
        errors.push(AppError::Database(sqlx::Error::RowNotFound));

        let err = finish_sweep(5, errors).unwrap_err();
        assert!(err.to_string().contains("booking 7"));
    }
}
