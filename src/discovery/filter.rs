//! Viral-candidate filter.
//!
//! Pure function over raw discovery records: no I/O, time injected by the
//! caller. This gate decides what ever enters the pipeline, so its rules
//! mirror the discovery source exactly: no music, short-form duration,
//! fresh, and moving fast enough (views per hour).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::database::models::NewItem;

/// YouTube category id for Music, always excluded.
const MUSIC_CATEGORY_ID: &str = "10";

/// Filter thresholds.
#[derive(Debug, Clone)]
pub struct FilterConfig {
    /// Short-form ceiling in seconds; exactly the ceiling still counts.
    pub max_duration_secs: i64,
    /// Maximum age since publication, in hours.
    pub max_age_hours: f64,
    /// Minimum views-per-hour velocity.
    pub min_views_per_hour: f64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            max_duration_secs: 60,
            max_age_hours: 48.0,
            min_views_per_hour: 0.0,
        }
    }
}

/// One raw record from the discovery collaborator. Only the fields the
/// filter needs are typed; everything else stays with the collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawVideo {
    pub video_ref: String,
    pub url: String,
    pub title: String,
    pub channel: String,
    pub category_id: String,
    pub duration_secs: i64,
    pub published_at: DateTime<Utc>,
    pub views: i64,
    pub likes: i64,
}

/// A raw video that passed every gate, ranked by velocity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViralCandidate {
    pub video: RawVideo,
    /// Views per hour, truncated to an integer. The sole ranking key.
    pub views_per_hour: i64,
}

impl ViralCandidate {
    /// Convert into the field set for an Item Store insert.
    pub fn to_new_item(&self) -> NewItem {
        NewItem {
            video_ref: self.video.video_ref.clone(),
            url: self.video.url.clone(),
            title: Some(self.video.title.clone()),
            channel: Some(self.video.channel.clone()),
            views: Some(self.video.views),
            likes: Some(self.video.likes),
            duration_secs: Some(self.video.duration_secs),
            published_at: Some(self.video.published_at),
        }
    }
}

/// Per-run exclusion counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterStats {
    pub total: usize,
    pub music_excluded: usize,
    pub duration_excluded: usize,
    pub old_excluded: usize,
    pub low_vph_excluded: usize,
    pub kept: usize,
}

/// Apply the viral gates to a batch of raw records.
///
/// A candidate is kept iff it is not music, its duration is in
/// `(0, max_duration_secs]`, its age is strictly inside
/// `(0, max_age_hours)` (zero or negative ages are clock skew and
/// rejected), and its views-per-hour meets the floor. Output is sorted by
/// views-per-hour descending.
pub fn filter_candidates(
    videos: Vec<RawVideo>,
    config: &FilterConfig,
    now: DateTime<Utc>,
) -> (Vec<ViralCandidate>, FilterStats) {
    let mut stats = FilterStats {
        total: videos.len(),
        ..Default::default()
    };
    let mut kept = Vec::new();

    for video in videos {
        if video.category_id == MUSIC_CATEGORY_ID {
            stats.music_excluded += 1;
            continue;
        }

        if video.duration_secs <= 0 || video.duration_secs > config.max_duration_secs {
            stats.duration_excluded += 1;
            continue;
        }

        let hours_since_published =
            (now - video.published_at).num_seconds() as f64 / 3600.0;
        if hours_since_published <= 0.0 || hours_since_published >= config.max_age_hours {
            stats.old_excluded += 1;
            continue;
        }

        let vph = video.views as f64 / hours_since_published;
        if vph < config.min_views_per_hour {
            stats.low_vph_excluded += 1;
            continue;
        }

        kept.push(ViralCandidate {
            video,
            views_per_hour: vph as i64,
        });
        stats.kept += 1;
    }

    kept.sort_by(|a, b| b.views_per_hour.cmp(&a.views_per_hour));

    tracing::info!(
        total = stats.total,
        music_excluded = stats.music_excluded,
        duration_excluded = stats.duration_excluded,
        old_excluded = stats.old_excluded,
        low_vph_excluded = stats.low_vph_excluded,
        kept = stats.kept,
        "Viral filter pass finished"
    );

    (kept, stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn raw(video_ref: &str) -> RawVideo {
        RawVideo {
            video_ref: video_ref.to_string(),
            url: format!("https://example.com/shorts/{video_ref}"),
            title: "title".to_string(),
            channel: "channel".to_string(),
            category_id: "23".to_string(),
            duration_secs: 45,
            published_at: Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap(),
            views: 20_000,
            likes: 1_000,
        }
    }

    fn now() -> DateTime<Utc> {
        // Two hours after the default published_at.
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn fresh_short_with_velocity_passes() {
        let (kept, stats) = filter_candidates(vec![raw("a")], &FilterConfig::default(), now());
        assert_eq!(kept.len(), 1);
        assert_eq!(stats.kept, 1);
        // 20,000 views over 2 hours.
        assert_eq!(kept[0].views_per_hour, 10_000);
    }

    #[test]
    fn music_is_excluded() {
        let mut video = raw("a");
        video.category_id = "10".to_string();
        let (kept, stats) = filter_candidates(vec![video], &FilterConfig::default(), now());
        assert!(kept.is_empty());
        assert_eq!(stats.music_excluded, 1);
    }

    #[test]
    fn long_video_is_excluded_regardless_of_freshness() {
        let mut video = raw("a");
        video.duration_secs = 90;
        let (kept, stats) = filter_candidates(vec![video], &FilterConfig::default(), now());
        assert!(kept.is_empty());
        assert_eq!(stats.duration_excluded, 1);
    }

    #[test]
    fn exactly_at_the_ceiling_still_counts_as_short() {
        let mut video = raw("a");
        video.duration_secs = 60;
        let (kept, _) = filter_candidates(vec![video], &FilterConfig::default(), now());
        assert_eq!(kept.len(), 1);
    }

    #[test]
    fn zero_duration_is_excluded() {
        let mut video = raw("a");
        video.duration_secs = 0;
        let (kept, stats) = filter_candidates(vec![video], &FilterConfig::default(), now());
        assert!(kept.is_empty());
        assert_eq!(stats.duration_excluded, 1);
    }

    #[test]
    fn stale_video_is_excluded_regardless_of_views() {
        let mut video = raw("a");
        video.views = 50_000_000;
        let now = video.published_at + chrono::Duration::hours(50);
        let (kept, stats) = filter_candidates(vec![video], &FilterConfig::default(), now);
        assert!(kept.is_empty());
        assert_eq!(stats.old_excluded, 1);
    }

    #[test]
    fn future_publication_is_clock_skew_and_excluded() {
        let video = raw("a");
        let now = video.published_at - chrono::Duration::minutes(5);
        let (kept, stats) = filter_candidates(vec![video], &FilterConfig::default(), now);
        assert!(kept.is_empty());
        assert_eq!(stats.old_excluded, 1);
    }

    #[test]
    fn slow_video_is_excluded_by_vph_floor() {
        let mut video = raw("a");
        video.views = 100;
        let config = FilterConfig {
            min_views_per_hour: 1_000.0,
            ..Default::default()
        };
        let (kept, stats) = filter_candidates(vec![video], &config, now());
        assert!(kept.is_empty());
        assert_eq!(stats.low_vph_excluded, 1);
    }

    #[test]
    fn output_is_ranked_by_velocity() {
        let mut slow = raw("slow");
        slow.views = 2_000;
        let fast = raw("fast");
        let (kept, _) = filter_candidates(vec![slow, fast], &FilterConfig::default(), now());
        assert_eq!(kept[0].video.video_ref, "fast");
        assert_eq!(kept[1].video.video_ref, "slow");
    }
}
