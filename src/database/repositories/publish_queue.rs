//! Publish queue repository.
//!
//! The queue is a durable table of publish jobs with row-level atomic
//! updates, so concurrent dispatchers cannot lose writes the way a
//! read-whole/write-whole file queue would.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;

use crate::database::models::{JobStatus, Platform, PublishJobDbModel};
use crate::database::time;
use crate::utils::SharedClock;
use crate::{Error, Result};

/// Upper bound on id-collision suffix probing. Two enqueues collide only
/// when they land in the same platform and wall-clock second.
const MAX_ID_ATTEMPTS: u32 = 1000;

/// Aggregated queue counts. Pure read, no side effects.
#[derive(Debug, Clone, Default, Serialize)]
pub struct QueueStatistics {
    pub total: i64,
    pub by_status: HashMap<String, i64>,
    pub by_platform: HashMap<String, HashMap<String, i64>>,
}

/// Field set for enqueueing a publish job.
#[derive(Debug, Clone)]
pub struct NewPublishJob {
    pub artifact_path: String,
    /// Opaque structured payload (title/description/tags).
    pub metadata: serde_json::Value,
    pub platform: Platform,
    /// Item this job publishes, when known.
    pub item_id: Option<String>,
    pub scheduled_at: Option<DateTime<Utc>>,
    /// 1-10, higher is more urgent.
    pub priority: i64,
}

/// Publish queue repository trait.
#[async_trait]
pub trait PublishQueueRepository: Send + Sync {
    /// Append a job and return its generated id.
    async fn enqueue(&self, job: NewPublishJob) -> Result<String>;
    async fn get_job(&self, id: &str) -> Result<PublishJobDbModel>;
    /// Jobs ready for dispatch: queued, scheduled time absent or arrived,
    /// optional platform filter. Total order: priority descending, then
    /// scheduled time ascending (unscheduled first), then insertion order.
    async fn ready_jobs(
        &self,
        limit: Option<i64>,
        platform: Option<Platform>,
    ) -> Result<Vec<PublishJobDbModel>>;
    /// Update a job's status. Unknown ids are a deliberate no-op so that
    /// duplicate dispatcher retries stay idempotent. An error message is
    /// recorded and counts as one more attempt regardless of the status.
    async fn update_status(
        &self,
        id: &str,
        status: JobStatus,
        error_message: Option<&str>,
    ) -> Result<()>;
    /// Store the platform-assigned id and URL after a successful upload.
    async fn record_result(
        &self,
        id: &str,
        platform_video_id: &str,
        platform_url: &str,
    ) -> Result<()>;
    /// Delete a job; no-op if absent.
    async fn remove(&self, id: &str) -> Result<()>;
    /// Purge completed jobs older than the retention horizon. Jobs without
    /// a completion timestamp are kept, as are queued/uploading/failed jobs
    /// of any age. Returns the number of purged rows.
    async fn cleanup(&self, retention_days: i64) -> Result<u64>;
    async fn statistics(&self) -> Result<QueueStatistics>;
    /// Completed uploads for a platform within `[start, end)`. Rate-limiter
    /// input.
    async fn count_completed_in_window(
        &self,
        platform: Platform,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<i64>;
}

/// SQLx implementation of PublishQueueRepository.
pub struct SqlxPublishQueueRepository {
    pool: SqlitePool,
    clock: SharedClock,
}

impl SqlxPublishQueueRepository {
    pub fn new(pool: SqlitePool, clock: SharedClock) -> Self {
        Self { pool, clock }
    }
}

#[async_trait]
impl PublishQueueRepository for SqlxPublishQueueRepository {
    async fn enqueue(&self, job: NewPublishJob) -> Result<String> {
        let now = self.clock.now();
        let now_db = time::to_db(now);
        let base_id = format!("{}_{}", job.platform.as_str(), now.format("%Y%m%d%H%M%S"));
        let metadata = serde_json::to_string(&job.metadata)?;
        let scheduled_at = job.scheduled_at.map(time::to_db);

        // The UNIQUE constraint arbitrates same-second collisions; probe
        // with a monotonic suffix until an insert lands.
        for attempt in 0..MAX_ID_ATTEMPTS {
            let id = if attempt == 0 {
                base_id.clone()
            } else {
                format!("{base_id}_{attempt}")
            };

            let inserted = sqlx::query(
                r#"
                INSERT INTO publish_jobs (
                    id, item_id, artifact_path, metadata, platform, scheduled_at,
                    priority, status, created_at, attempts
                )
                VALUES (?, ?, ?, ?, ?, ?, ?, 'queued', ?, 0)
                "#,
            )
            .bind(&id)
            .bind(&job.item_id)
            .bind(&job.artifact_path)
            .bind(&metadata)
            .bind(job.platform.as_str())
            .bind(&scheduled_at)
            .bind(job.priority)
            .bind(&now_db)
            .execute(&self.pool)
            .await;

            match inserted {
                Ok(_) => {
                    tracing::info!("Enqueued publish job {} (priority {})", id, job.priority);
                    return Ok(id);
                }
                Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => continue,
                Err(err) => return Err(err.into()),
            }
        }

        Err(Error::Database(format!(
            "could not generate a unique job id from {base_id}"
        )))
    }

    async fn get_job(&self, id: &str) -> Result<PublishJobDbModel> {
        sqlx::query_as::<_, PublishJobDbModel>("SELECT * FROM publish_jobs WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::not_found("PublishJob", id))
    }

    async fn ready_jobs(
        &self,
        limit: Option<i64>,
        platform: Option<Platform>,
    ) -> Result<Vec<PublishJobDbModel>> {
        let now = time::to_db(self.clock.now());
        let jobs = match platform {
            Some(platform) => {
                sqlx::query_as::<_, PublishJobDbModel>(
                    "SELECT * FROM publish_jobs \
                     WHERE status = 'queued' \
                       AND (scheduled_at IS NULL OR scheduled_at <= ?) \
                       AND platform = ? \
                     ORDER BY priority DESC, COALESCE(scheduled_at, '') ASC, rowid ASC \
                     LIMIT ?",
                )
                .bind(&now)
                .bind(platform.as_str())
                .bind(limit.unwrap_or(-1))
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, PublishJobDbModel>(
                    "SELECT * FROM publish_jobs \
                     WHERE status = 'queued' \
                       AND (scheduled_at IS NULL OR scheduled_at <= ?) \
                     ORDER BY priority DESC, COALESCE(scheduled_at, '') ASC, rowid ASC \
                     LIMIT ?",
                )
                .bind(&now)
                .bind(limit.unwrap_or(-1))
                .fetch_all(&self.pool)
                .await?
            }
        };
        Ok(jobs)
    }

    async fn update_status(
        &self,
        id: &str,
        status: JobStatus,
        error_message: Option<&str>,
    ) -> Result<()> {
        let now = time::to_db(self.clock.now());
        let result = sqlx::query(
            r#"
            UPDATE publish_jobs SET
                status = ?,
                started_at = CASE WHEN ? THEN ? ELSE started_at END,
                completed_at = CASE WHEN ? THEN ? ELSE completed_at END,
                last_error = COALESCE(?, last_error),
                attempts = attempts + ?
            WHERE id = ?
            "#,
        )
        .bind(status.as_str())
        .bind(status == JobStatus::Uploading)
        .bind(&now)
        .bind(status.is_terminal())
        .bind(&now)
        .bind(error_message)
        .bind(if error_message.is_some() { 1i64 } else { 0i64 })
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            // Idempotent by design: a duplicate report for a removed job is
            // not an error.
            tracing::debug!("update_status for unknown publish job {}, ignoring", id);
        } else {
            tracing::info!("Updated publish job {}: status={}", id, status.as_str());
        }
        Ok(())
    }

    async fn record_result(
        &self,
        id: &str,
        platform_video_id: &str,
        platform_url: &str,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE publish_jobs SET platform_video_id = ?, platform_url = ? WHERE id = ?",
        )
        .bind(platform_video_id)
        .bind(platform_url)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn remove(&self, id: &str) -> Result<()> {
        sqlx::query("DELETE FROM publish_jobs WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn cleanup(&self, retention_days: i64) -> Result<u64> {
        let cutoff = self.clock.now() - chrono::Duration::days(retention_days);
        let cutoff_db = time::to_db(cutoff);

        let result = sqlx::query(
            "DELETE FROM publish_jobs \
             WHERE status = 'completed' AND completed_at IS NOT NULL AND completed_at < ?",
        )
        .bind(&cutoff_db)
        .execute(&self.pool)
        .await?;

        let purged = result.rows_affected();
        if purged > 0 {
            tracing::info!("Cleaned up {} completed publish jobs", purged);
        }
        Ok(purged)
    }

    async fn statistics(&self) -> Result<QueueStatistics> {
        let rows: Vec<(String, String, i64)> = sqlx::query_as(
            "SELECT platform, status, COUNT(1) FROM publish_jobs GROUP BY platform, status",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut stats = QueueStatistics::default();
        for (platform, status, count) in rows {
            stats.total += count;
            *stats.by_status.entry(status.clone()).or_insert(0) += count;
            *stats
                .by_platform
                .entry(platform)
                .or_default()
                .entry(status)
                .or_insert(0) += count;
        }
        Ok(stats)
    }

    async fn count_completed_in_window(
        &self,
        platform: Platform,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<i64> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(1) FROM publish_jobs \
             WHERE platform = ? AND status = 'completed' \
               AND completed_at IS NOT NULL AND completed_at >= ? AND completed_at < ?",
        )
        .bind(platform.as_str())
        .bind(time::to_db(start))
        .bind(time::to_db(end))
        .fetch_one(&self.pool)
        .await?;
        Ok(count.0)
    }
}
