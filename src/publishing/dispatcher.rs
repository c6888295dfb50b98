//! Upload dispatcher.
//!
//! Pulls ready jobs from the publish queue, within the daily quota, hands
//! them to the uploader, and mirrors the outcome back into the queue and
//! the item store. The dispatcher never retries a failed job on its own
//! and never times out an in-flight upload; both are operator decisions.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::database::models::{ItemStatus, JobStatus, Platform};
use crate::database::repositories::PublishQueueRepository;
use crate::pipeline::StatusMachine;
use crate::publishing::rate_limit::RateLimiter;
use crate::publishing::uploader::Uploader;
use crate::{Error, Result};

/// Dispatcher configuration.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Interval between dispatch passes.
    pub interval: Duration,
    /// Platforms served by this dispatcher.
    pub platforms: Vec<Platform>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5 * 60),
            platforms: vec![Platform::Youtube],
        }
    }
}

/// Outcome of one dispatch pass for one platform.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub attempted: usize,
    pub published: usize,
    pub failed: usize,
    pub limit_reached: bool,
}

/// Drives ready publish jobs through the uploader.
pub struct UploadDispatcher {
    queue: Arc<dyn PublishQueueRepository>,
    status_machine: Arc<StatusMachine>,
    rate_limiter: Arc<RateLimiter>,
    uploader: Arc<dyn Uploader>,
    config: DispatchConfig,
}

impl UploadDispatcher {
    pub fn new(
        queue: Arc<dyn PublishQueueRepository>,
        status_machine: Arc<StatusMachine>,
        rate_limiter: Arc<RateLimiter>,
        uploader: Arc<dyn Uploader>,
        config: DispatchConfig,
    ) -> Self {
        Self {
            queue,
            status_machine,
            rate_limiter,
            uploader,
            config,
        }
    }

    /// One dispatch pass for one platform: consult the quota, pull that
    /// many ready jobs, upload each, report the outcomes back.
    pub async fn dispatch_once(&self, platform: Platform) -> Result<DispatchReport> {
        let quota = self.rate_limiter.check_daily_limit(platform, None).await?;
        if quota.limit_reached {
            info!("Daily limit reached for {}, skipping dispatch", platform);
            return Ok(DispatchReport {
                limit_reached: true,
                ..Default::default()
            });
        }

        let ready = self
            .queue
            .ready_jobs(Some(quota.remaining), Some(platform))
            .await?;

        let mut report = DispatchReport::default();
        for job in ready {
            report.attempted += 1;
            self.queue
                .update_status(&job.id, JobStatus::Uploading, None)
                .await?;

            match self.uploader.upload(&job).await {
                Ok(outcome) => {
                    self.queue
                        .record_result(&job.id, &outcome.platform_video_id, &outcome.platform_url)
                        .await?;
                    self.queue
                        .update_status(&job.id, JobStatus::Completed, None)
                        .await?;
                    self.mark_item(&job.item_id, ItemStatus::Published, None)
                        .await;
                    info!(
                        "Published job {} as {} ({})",
                        job.id, outcome.platform_video_id, outcome.platform_url
                    );
                    report.published += 1;
                }
                Err(err) => {
                    let message = err.to_string();
                    self.queue
                        .update_status(&job.id, JobStatus::Failed, Some(&message))
                        .await?;
                    self.mark_item(&job.item_id, ItemStatus::Failed, Some(&message))
                        .await;
                    warn!("Upload failed for job {}: {}", job.id, message);
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }

    /// Mirror a job outcome into the item store. A job may have no item
    /// binding, and the item may have been purged; neither aborts the pass.
    async fn mark_item(&self, item_id: &Option<String>, status: ItemStatus, error: Option<&str>) {
        let Some(item_id) = item_id else {
            return;
        };
        match self
            .status_machine
            .transition_item(item_id, status.as_str(), error)
            .await
        {
            Ok(_) => {}
            Err(Error::NotFound { .. }) => {
                warn!("Job outcome for missing item {}, skipping", item_id);
            }
            Err(err) => {
                error!("Failed to update item {}: {}", item_id, err);
            }
        }
    }

    /// Dispatch loop: one pass per configured platform per tick, until the
    /// token is cancelled.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.config.interval);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Upload dispatcher stopping");
                    break;
                }
                _ = interval.tick() => {
                    for platform in &self.config.platforms {
                        match self.dispatch_once(*platform).await {
                            Ok(report) if report.attempted > 0 => {
                                info!(
                                    "Dispatch pass for {}: {} published, {} failed",
                                    platform, report.published, report.failed
                                );
                            }
                            Ok(_) => {}
                            Err(err) => error!("Dispatch pass for {} failed: {}", platform, err),
                        }
                    }
                }
            }
        }
    }
}
