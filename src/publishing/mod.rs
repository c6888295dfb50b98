//! Publishing: scheduling policy, quota, and dispatch.

pub mod dispatcher;
pub mod rate_limit;
pub mod schedule;
pub mod uploader;

pub use dispatcher::{DispatchConfig, DispatchReport, UploadDispatcher};
pub use rate_limit::{DailyLimitStatus, RateLimitConfig, RateLimiter};
pub use schedule::{ScheduleConfig, UploadScheduler, next_optimal_time};
pub use uploader::{UploadOutcome, Uploader};
