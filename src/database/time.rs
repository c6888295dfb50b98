//! Timestamp helpers for the database layer.
//!
//! Timestamps are stored as RFC 3339 UTC strings (`TEXT` columns). With a
//! fixed `+00:00` offset the lexicographic order of the stored strings
//! matches chronological order, which the publish queue relies on for its
//! readiness comparison and its scheduled-time sort key.

use chrono::{DateTime, SecondsFormat, Utc};

/// Format a `DateTime<Utc>` for storage.
#[inline]
pub fn to_db(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a stored timestamp back into a `DateTime<Utc>`.
///
/// Returns `None` for malformed values instead of panicking; callers treat
/// an unparseable timestamp as absent.
#[inline]
pub fn from_db(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn round_trip() {
        let dt = Utc.with_ymd_and_hms(2025, 3, 14, 15, 9, 26).unwrap();
        assert_eq!(from_db(&to_db(dt)), Some(dt));
    }

    #[test]
    fn lexicographic_order_matches_chronological() {
        let earlier = Utc.with_ymd_and_hms(2025, 3, 14, 15, 9, 26).unwrap();
        let later = earlier + chrono::Duration::milliseconds(500);
        assert!(to_db(earlier) < to_db(later));
    }
}
