//! Database maintenance operations.
//!
//! Periodic retention sweep for the publish queue plus incremental vacuum,
//! run from a background task started in `main`.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::database::DbPool;
use crate::database::repositories::PublishQueueRepository;

/// Configuration for the maintenance scheduler.
#[derive(Debug, Clone)]
pub struct MaintenanceConfig {
    /// Interval between maintenance passes (default: 1 hour).
    pub interval: Duration,
    /// Completed publish jobs older than this are purged (default: 7 days).
    pub queue_retention_days: i64,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60 * 60),
            queue_retention_days: 7,
        }
    }
}

/// Database maintenance scheduler.
pub struct MaintenanceScheduler {
    pool: DbPool,
    queue: Arc<dyn PublishQueueRepository>,
    config: MaintenanceConfig,
    running: Arc<AtomicBool>,
}

impl MaintenanceScheduler {
    pub fn new(
        pool: DbPool,
        queue: Arc<dyn PublishQueueRepository>,
        config: MaintenanceConfig,
    ) -> Self {
        Self {
            pool,
            queue,
            config,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Start the maintenance loop.
    pub fn start(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        let scheduler = self.clone();
        tokio::spawn(async move {
            scheduler.running.store(true, Ordering::SeqCst);
            scheduler.run_loop().await;
        })
    }

    /// Stop the maintenance loop after the current tick.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    async fn run_loop(&self) {
        let mut interval = tokio::time::interval(self.config.interval);
        // The first tick fires immediately; skip it so startup stays quiet.
        interval.tick().await;

        while self.running.load(Ordering::SeqCst) {
            interval.tick().await;

            if let Err(e) = self.run_maintenance().await {
                tracing::error!("Maintenance error: {}", e);
            }
        }
    }

    /// Run one maintenance pass.
    pub async fn run_maintenance(&self) -> Result<(), crate::Error> {
        tracing::info!("Starting database maintenance");

        let purged = self.queue.cleanup(self.config.queue_retention_days).await?;
        if purged > 0 {
            tracing::info!("Maintenance purged {} completed publish jobs", purged);
        }

        sqlx::query("PRAGMA incremental_vacuum")
            .execute(&self.pool)
            .await?;

        tracing::info!("Database maintenance completed");
        Ok(())
    }
}
