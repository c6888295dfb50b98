//! Publish job database model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Publish job database model.
/// One queued or in-flight request to publish an artifact to a platform.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct PublishJobDbModel {
    /// Generated identifier: `{platform}_{YYYYMMDDHHMMSS}` plus a `_N`
    /// suffix when two enqueues land in the same second.
    pub id: String,
    /// Item this job publishes, when known.
    pub item_id: Option<String>,
    /// Local path of the artifact to upload.
    pub artifact_path: String,
    /// Opaque JSON metadata payload (title/description/tags).
    pub metadata: String,
    pub platform: String,
    /// RFC 3339 scheduled time; `None` means "ready immediately".
    pub scheduled_at: Option<String>,
    /// 1-10, higher is more urgent.
    pub priority: i64,
    /// Status: queued, uploading, completed, failed
    pub status: String,
    pub created_at: String,
    pub started_at: Option<String>,
    pub completed_at: Option<String>,
    /// Incremented every time an error is reported for this job.
    pub attempts: i64,
    pub last_error: Option<String>,
    /// Platform-assigned id of the published video, once completed.
    pub platform_video_id: Option<String>,
    pub platform_url: Option<String>,
}

/// Default enqueue priority.
pub const DEFAULT_PRIORITY: i64 = 5;

/// Supported publishing platforms.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
    strum::EnumString,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Youtube,
    Tiktok,
    Instagram,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Youtube => "youtube",
            Self::Tiktok => "tiktok",
            Self::Instagram => "instagram",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "youtube" => Some(Self::Youtube),
            "tiktok" => Some(Self::Tiktok),
            "instagram" => Some(Self::Instagram),
            _ => None,
        }
    }
}

/// Publish job status values.
///
/// Lowercase on the wire and in the table, matching the queue format the
/// dispatcher tooling expects.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Waiting for its scheduled time (or for a dispatcher slot).
    Queued,
    /// Handed to the uploader; never auto-retried or timed out here.
    Uploading,
    /// Upload succeeded.
    Completed,
    /// Upload failed; re-queueing is an operator decision.
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Uploading => "uploading",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "queued" => Some(Self::Queued),
            "uploading" => Some(Self::Uploading),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_round_trip() {
        assert_eq!(Platform::parse("youtube"), Some(Platform::Youtube));
        assert_eq!(Platform::Tiktok.as_str(), "tiktok");
        assert_eq!(Platform::parse("YOUTUBE"), None);
    }

    #[test]
    fn job_status_parse() {
        assert_eq!(JobStatus::parse("queued"), Some(JobStatus::Queued));
        assert_eq!(JobStatus::parse("done"), None);
        assert!(JobStatus::Completed.is_terminal());
        assert!(!JobStatus::Uploading.is_terminal());
    }
}
