//! Content item database model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::database::time;
use crate::utils::Clock;

/// Content item database model.
/// One discovered content unit tracked through the production pipeline.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ItemDbModel {
    pub id: String,
    /// Stable external identifier (natural key, unique).
    pub video_ref: String,
    /// Source URL of the discovered content.
    pub url: String,
    pub title: Option<String>,
    /// Source-channel label.
    pub channel: Option<String>,
    pub views: Option<i64>,
    pub likes: Option<i64>,
    pub duration_secs: Option<i64>,
    /// RFC 3339 timestamp of the original publication, if known.
    pub published_at: Option<String>,
    /// Current lifecycle status (see [`ItemStatus`]).
    pub status: String,
    /// Opaque JSON blob produced by the analysis collaborator.
    pub analysis: Option<String>,
    pub error_message: Option<String>,
    /// Number of failed attempts, not total attempts.
    pub retry_count: i64,
    /// RFC 3339 timestamp when the item entered the store.
    pub discovered_at: String,
    /// Set once, on first entry into an in-progress status.
    pub started_at: Option<String>,
    pub updated_at: String,
}

/// Field set for creating a new item; everything else defaults.
#[derive(Debug, Clone, Default)]
pub struct NewItem {
    pub video_ref: String,
    pub url: String,
    pub title: Option<String>,
    pub channel: Option<String>,
    pub views: Option<i64>,
    pub likes: Option<i64>,
    pub duration_secs: Option<i64>,
    pub published_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl ItemDbModel {
    pub fn new(fields: NewItem, clock: &dyn Clock) -> Self {
        let now = time::to_db(clock.now());
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            video_ref: fields.video_ref,
            url: fields.url,
            title: fields.title,
            channel: fields.channel,
            views: fields.views,
            likes: fields.likes,
            duration_secs: fields.duration_secs,
            published_at: fields.published_at.map(time::to_db),
            status: ItemStatus::Pending.as_str().to_string(),
            analysis: None,
            error_message: None,
            retry_count: 0,
            discovered_at: now.clone(),
            started_at: None,
            updated_at: now,
        }
    }
}

/// Item lifecycle statuses.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemStatus {
    /// Discovered, waiting for analysis.
    Pending,
    /// AI analysis in progress.
    Analyzing,
    /// Analysis payload stored.
    Analyzed,
    /// Derived content generation in progress.
    Generating,
    /// Generation finished.
    Generated,
    /// Post-processing in progress.
    Processing,
    /// Post-processing finished.
    Processed,
    /// Eligible for publication; a publish job may be enqueued.
    Ready,
    /// Published to at least one platform.
    Published,
    /// A stage failed; retry may move the item back to an earlier status.
    Failed,
    /// Deliberately dropped from the pipeline.
    Skipped,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Analyzing => "ANALYZING",
            Self::Analyzed => "ANALYZED",
            Self::Generating => "GENERATING",
            Self::Generated => "GENERATED",
            Self::Processing => "PROCESSING",
            Self::Processed => "PROCESSED",
            Self::Ready => "READY",
            Self::Published => "PUBLISHED",
            Self::Failed => "FAILED",
            Self::Skipped => "SKIPPED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(Self::Pending),
            "ANALYZING" => Some(Self::Analyzing),
            "ANALYZED" => Some(Self::Analyzed),
            "GENERATING" => Some(Self::Generating),
            "GENERATED" => Some(Self::Generated),
            "PROCESSING" => Some(Self::Processing),
            "PROCESSED" => Some(Self::Processed),
            "READY" => Some(Self::Ready),
            "PUBLISHED" => Some(Self::Published),
            "FAILED" => Some(Self::Failed),
            "SKIPPED" => Some(Self::Skipped),
            _ => None,
        }
    }

    /// Statuses that mean "a stage is currently running on this item".
    /// Entering one sets the started timestamp if it is not already set.
    pub fn is_in_progress(&self) -> bool {
        matches!(self, Self::Analyzing | Self::Generating | Self::Processing)
    }

    /// Statuses that end the current attempt and stamp a completion time.
    /// `FAILED` is terminal for the attempt only; a retry may move the item
    /// back to an earlier status.
    pub fn is_attempt_terminal(&self) -> bool {
        matches!(self, Self::Published | Self::Failed | Self::Skipped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::SystemClock;

    #[test]
    fn new_item_defaults() {
        let item = ItemDbModel::new(
            NewItem {
                video_ref: "abc123".into(),
                url: "https://example.com/shorts/abc123".into(),
                ..Default::default()
            },
            &SystemClock,
        );
        assert_eq!(item.status, "PENDING");
        assert_eq!(item.retry_count, 0);
        assert!(item.started_at.is_none());
    }

    #[test]
    fn status_classes() {
        assert!(ItemStatus::Analyzing.is_in_progress());
        assert!(ItemStatus::Processing.is_in_progress());
        assert!(!ItemStatus::Ready.is_in_progress());

        assert!(ItemStatus::Published.is_attempt_terminal());
        assert!(ItemStatus::Failed.is_attempt_terminal());
        assert!(ItemStatus::Skipped.is_attempt_terminal());
        assert!(!ItemStatus::Pending.is_attempt_terminal());
    }

    #[test]
    fn status_parse_rejects_unknown() {
        assert_eq!(ItemStatus::parse("READY"), Some(ItemStatus::Ready));
        assert_eq!(ItemStatus::parse("ready"), None);
        assert_eq!(ItemStatus::parse("EXPLODED"), None);
    }
}
