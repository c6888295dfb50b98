//! Pipeline configuration.
//!
//! One explicit value assembled in `main` (or in a test) and handed to the
//! components that need it. There is no process-wide config singleton;
//! every constructor receives exactly the section it consumes.

use std::time::Duration;

use crate::database::MaintenanceConfig;
use crate::discovery::FilterConfig;
use crate::publishing::{DispatchConfig, RateLimitConfig, ScheduleConfig};
use crate::{Error, Result};

/// Default database location.
pub const DEFAULT_DATABASE_URL: &str = "sqlite:clipflow.db?mode=rwc";

/// Top-level configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub database_url: String,
    pub filter: FilterConfig,
    pub schedule: ScheduleConfig,
    pub rate_limit: RateLimitConfig,
    pub maintenance: MaintenanceConfig,
    pub dispatch: DispatchConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            filter: FilterConfig::default(),
            schedule: ScheduleConfig::default(),
            rate_limit: RateLimitConfig::default(),
            maintenance: MaintenanceConfig::default(),
            dispatch: DispatchConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Load configuration from environment variables, with defaults for
    /// everything unset. `dotenvy` is expected to have run already.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("DATABASE_URL") {
            config.database_url = url;
        }

        if let Some(limit) = parse_env::<i64>("CLIPFLOW_DAILY_LIMIT")? {
            config.rate_limit.default_daily_limit = limit;
        }
        if let Ok(hours) = std::env::var("CLIPFLOW_OPTIMAL_HOURS") {
            config.schedule.default_optimal_hours = parse_hours(&hours)?;
        }
        if let Some(interval) = parse_env::<i64>("CLIPFLOW_BATCH_INTERVAL_HOURS")? {
            config.schedule.batch_interval_hours = interval;
        }
        if let Some(secs) = parse_env::<i64>("CLIPFLOW_MAX_DURATION_SECS")? {
            config.filter.max_duration_secs = secs;
        }
        if let Some(hours) = parse_env::<f64>("CLIPFLOW_MAX_AGE_HOURS")? {
            config.filter.max_age_hours = hours;
        }
        if let Some(vph) = parse_env::<f64>("CLIPFLOW_MIN_VPH")? {
            config.filter.min_views_per_hour = vph;
        }
        if let Some(days) = parse_env::<i64>("CLIPFLOW_QUEUE_RETENTION_DAYS")? {
            config.maintenance.queue_retention_days = days;
        }
        if let Some(secs) = parse_env::<u64>("CLIPFLOW_DISPATCH_INTERVAL_SECS")? {
            config.dispatch.interval = Duration::from_secs(secs);
        }

        Ok(config)
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Result<Option<T>> {
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|_| Error::config(format!("invalid value for {key}: {raw}"))),
        Err(_) => Ok(None),
    }
}

fn parse_hours(raw: &str) -> Result<Vec<u32>> {
    raw.split(',')
        .map(|part| {
            part.trim()
                .parse::<u32>()
                .map_err(|_| Error::config(format!("invalid optimal hour: {part}")))
        })
        .collect()
}
