//! Upload scheduling policy.
//!
//! The optimal-hour heuristic is a pure function of the base time and the
//! configured hour table; the batch scheduler layers it over the queue.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Duration, Timelike, Utc};

use crate::database::models::{DEFAULT_PRIORITY, Platform};
use crate::database::repositories::{NewPublishJob, PublishQueueRepository};
use crate::utils::SharedClock;
use crate::{Error, Result};

/// Default optimal upload hours (UTC), shared across platforms.
pub const DEFAULT_OPTIMAL_HOURS: [u32; 4] = [9, 12, 18, 21];

/// Default spacing between batch-scheduled uploads.
pub const DEFAULT_BATCH_INTERVAL_HOURS: i64 = 4;

/// Scheduling configuration.
#[derive(Debug, Clone)]
pub struct ScheduleConfig {
    /// Hour table used when a platform has no override.
    pub default_optimal_hours: Vec<u32>,
    /// Per-platform hour table overrides.
    pub platform_optimal_hours: HashMap<Platform, Vec<u32>>,
    /// Hours between entries when batch scheduling.
    pub batch_interval_hours: i64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            default_optimal_hours: DEFAULT_OPTIMAL_HOURS.to_vec(),
            platform_optimal_hours: HashMap::new(),
            batch_interval_hours: DEFAULT_BATCH_INTERVAL_HOURS,
        }
    }
}

impl ScheduleConfig {
    fn hours_for(&self, platform: Platform) -> &[u32] {
        self.platform_optimal_hours
            .get(&platform)
            .map(Vec::as_slice)
            .unwrap_or(&self.default_optimal_hours)
    }
}

/// Next optimal upload time at or after `base`.
///
/// Picks the smallest listed hour strictly greater than `base`'s hour of
/// day (minute and second zeroed) on the same calendar day; when every
/// listed hour has passed, the first listed hour on the following day.
/// Pure and deterministic; `optimal_hours` must be sorted ascending and
/// within 0-23.
pub fn next_optimal_time(optimal_hours: &[u32], base: DateTime<Utc>) -> Result<DateTime<Utc>> {
    if optimal_hours.is_empty() {
        return Err(Error::config("optimal hours table is empty"));
    }
    if let Some(bad) = optimal_hours.iter().find(|h| **h > 23) {
        return Err(Error::config(format!("invalid optimal hour {bad}")));
    }

    let at_hour = |day: DateTime<Utc>, hour: u32| {
        day.with_hour(hour)
            .and_then(|t| t.with_minute(0))
            .and_then(|t| t.with_second(0))
            .and_then(|t| t.with_nanosecond(0))
            .ok_or_else(|| Error::config(format!("invalid optimal hour {hour}")))
    };

    match optimal_hours.iter().copied().find(|h| *h > base.hour()) {
        Some(hour) => at_hour(base, hour),
        None => at_hour(base + Duration::days(1), optimal_hours[0]),
    }
}

/// Batch scheduling over the publish queue.
pub struct UploadScheduler {
    queue: Arc<dyn PublishQueueRepository>,
    clock: SharedClock,
    config: ScheduleConfig,
}

impl UploadScheduler {
    pub fn new(
        queue: Arc<dyn PublishQueueRepository>,
        clock: SharedClock,
        config: ScheduleConfig,
    ) -> Self {
        Self {
            queue,
            clock,
            config,
        }
    }

    /// Next optimal upload time for `platform`, from `base` or now.
    pub fn next_upload_time(
        &self,
        platform: Platform,
        base: Option<DateTime<Utc>>,
    ) -> Result<DateTime<Utc>> {
        let base = base.unwrap_or_else(|| self.clock.now());
        let next = next_optimal_time(self.config.hours_for(platform), base)?;
        tracing::info!("Next optimal upload time for {}: {}", platform, next);
        Ok(next)
    }

    /// Enqueue one artifact for upload.
    pub async fn schedule_upload(
        &self,
        artifact: PathBuf,
        metadata: serde_json::Value,
        platform: Platform,
        item_id: Option<String>,
        scheduled_at: Option<DateTime<Utc>>,
        priority: i64,
    ) -> Result<String> {
        self.queue
            .enqueue(NewPublishJob {
                artifact_path: artifact.display().to_string(),
                metadata,
                platform,
                item_id,
                scheduled_at,
                priority,
            })
            .await
    }

    /// Schedule a batch of uploads spaced `interval_hours` apart, starting
    /// at `start_time` or at the next optimal hour. All entries use the
    /// default priority. Fails if artifact and metadata counts differ.
    pub async fn schedule_batch(
        &self,
        artifacts: Vec<PathBuf>,
        metadata_list: Vec<serde_json::Value>,
        platform: Platform,
        start_time: Option<DateTime<Utc>>,
        interval_hours: Option<i64>,
    ) -> Result<Vec<String>> {
        if artifacts.len() != metadata_list.len() {
            return Err(Error::validation(format!(
                "artifact and metadata counts must match ({} vs {})",
                artifacts.len(),
                metadata_list.len()
            )));
        }

        let interval = Duration::hours(interval_hours.unwrap_or(self.config.batch_interval_hours));
        let mut scheduled_at = match start_time {
            Some(start) => start,
            None => self.next_upload_time(platform, None)?,
        };

        let total = artifacts.len();
        let mut job_ids = Vec::with_capacity(total);
        for (i, (artifact, metadata)) in artifacts.into_iter().zip(metadata_list).enumerate() {
            let job_id = self
                .schedule_upload(
                    artifact,
                    metadata,
                    platform,
                    None,
                    Some(scheduled_at),
                    DEFAULT_PRIORITY,
                )
                .await?;
            tracing::info!(
                "Scheduled upload {}/{}: {} at {}",
                i + 1,
                total,
                job_id,
                scheduled_at
            );
            job_ids.push(job_id);
            scheduled_at += interval;
        }

        tracing::info!("Scheduled {} uploads", job_ids.len());
        Ok(job_ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn picks_next_hour_today() {
        let base = Utc.with_ymd_and_hms(2025, 6, 1, 10, 30, 45).unwrap();
        let next = next_optimal_time(&DEFAULT_OPTIMAL_HOURS, base).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap());
    }

    #[test]
    fn exact_optimal_hour_moves_to_the_next_slot() {
        // 12:00 is not strictly greater than hour 12.
        let base = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let next = next_optimal_time(&DEFAULT_OPTIMAL_HOURS, base).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2025, 6, 1, 18, 0, 0).unwrap());
    }

    #[test]
    fn rolls_over_to_first_hour_tomorrow() {
        let base = Utc.with_ymd_and_hms(2025, 6, 1, 22, 15, 0).unwrap();
        let next = next_optimal_time(&DEFAULT_OPTIMAL_HOURS, base).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2025, 6, 2, 9, 0, 0).unwrap());
    }

    #[test]
    fn empty_hour_table_is_a_config_error() {
        let base = Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap();
        assert!(next_optimal_time(&[], base).is_err());
    }

    #[test]
    fn out_of_range_hour_is_a_config_error() {
        let base = Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap();
        assert!(next_optimal_time(&[9, 25], base).is_err());
    }
}
