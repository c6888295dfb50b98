//! Per-platform daily upload quota.
//!
//! Advisory: the dispatcher consults the limiter before pulling ready
//! jobs; the queue itself never refuses an enqueue or an update because a
//! quota is exhausted.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::Result;
use crate::database::models::Platform;
use crate::database::repositories::PublishQueueRepository;
use crate::utils::SharedClock;

/// Default daily publish limit per platform.
pub const DEFAULT_DAILY_LIMIT: i64 = 3;

/// Quota configuration.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Limit applied when a platform has no override.
    pub default_daily_limit: i64,
    /// Per-platform overrides.
    pub platform_daily_limits: HashMap<Platform, i64>,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            default_daily_limit: DEFAULT_DAILY_LIMIT,
            platform_daily_limits: HashMap::new(),
        }
    }
}

impl RateLimitConfig {
    fn limit_for(&self, platform: Platform) -> i64 {
        self.platform_daily_limits
            .get(&platform)
            .copied()
            .unwrap_or(self.default_daily_limit)
    }
}

/// Result of a daily-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DailyLimitStatus {
    pub limit: i64,
    pub used: i64,
    pub remaining: i64,
    pub limit_reached: bool,
}

/// Computes daily quota usage from completed publish jobs.
pub struct RateLimiter {
    queue: Arc<dyn PublishQueueRepository>,
    clock: SharedClock,
    config: RateLimitConfig,
}

impl RateLimiter {
    pub fn new(
        queue: Arc<dyn PublishQueueRepository>,
        clock: SharedClock,
        config: RateLimitConfig,
    ) -> Self {
        Self {
            queue,
            clock,
            config,
        }
    }

    /// Check how much of `platform`'s quota is used on the UTC calendar day
    /// containing `date` (or today).
    pub async fn check_daily_limit(
        &self,
        platform: Platform,
        date: Option<DateTime<Utc>>,
    ) -> Result<DailyLimitStatus> {
        let date = date.unwrap_or_else(|| self.clock.now());
        // Day boundaries are UTC to stay unambiguous across deployments.
        let start_of_day = date
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .expect("midnight is always valid")
            .and_utc();
        let end_of_day = start_of_day + Duration::days(1);

        let limit = self.config.limit_for(platform);
        let used = self
            .queue
            .count_completed_in_window(platform, start_of_day, end_of_day)
            .await?;
        let remaining = (limit - used).max(0);

        tracing::info!(
            "Daily limit check for {}: {}/{} used, {} remaining",
            platform,
            used,
            limit,
            remaining
        );

        Ok(DailyLimitStatus {
            limit,
            used,
            remaining,
            limit_reached: remaining == 0,
        })
    }
}
