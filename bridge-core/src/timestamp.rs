//! Rebases feed timestamps into the local run's time frame (C2).
//!
//! The upstream feed may be a replay of historical traffic, but downstream
//! AIS consumers expect live-looking instants. `TimestampAdjuster` captures
//! a reference instant at construction and offsets every parsed timestamp by
//! the same amount, so relative deltas between messages are preserved.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

const SBS_TIMESTAMP_FORMAT: &str = "%Y/%m/%d %H:%M:%S%.f";

/// Parse an SBS `"YYYY/MM/DD HH:MM:SS.ffffff"` timestamp, treated as UTC.
pub fn parse_sbs_timestamp(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, SBS_TIMESTAMP_FORMAT).ok()
}

/// Offsets parsed feed timestamps by a fixed amount captured at construction.
pub struct TimestampAdjuster {
    start_time: DateTime<Utc>,
}

impl TimestampAdjuster {
    /// Captures `now()` as the reference instant for every future `adjust` call.
    pub fn new() -> Self {
        TimestampAdjuster {
            start_time: Utc::now(),
        }
    }

    /// Build an adjuster pinned to an explicit reference instant. Used by tests
    /// that need deterministic output.
    pub fn with_start_time(start_time: DateTime<Utc>) -> Self {
        TimestampAdjuster { start_time }
    }

    /// `adjust(s) = start_time + (parsed(s) - epoch)`. On parse failure,
    /// falls back to `start_time` and reports that the fallback was taken so
    /// the caller can log a diagnostic — this module does no I/O of its own.
    pub fn adjust(&self, s: &str) -> (DateTime<Utc>, bool) {
        match parse_sbs_timestamp(s) {
            Some(naive) => {
                let parsed = Utc.from_utc_datetime(&naive);
                let offset = parsed - DateTime::<Utc>::from_timestamp(0, 0).unwrap();
                (self.start_time + offset, false)
            }
            None => (self.start_time, true),
        }
    }
}

impl Default for TimestampAdjuster {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_parse_sbs_timestamp() {
        let parsed = parse_sbs_timestamp("2024/03/15 12:30:45.123456").unwrap();
        assert_eq!(parsed.format("%Y-%m-%d %H:%M:%S").to_string(), "2024-03-15 12:30:45");
    }

    #[test]
    fn test_parse_sbs_timestamp_rejects_malformed() {
        assert!(parse_sbs_timestamp("not a timestamp").is_none());
        assert!(parse_sbs_timestamp("2024-03-15 12:30:45").is_none());
    }

    #[test]
    fn test_adjust_preserves_relative_deltas() {
        let start = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let adjuster = TimestampAdjuster::with_start_time(start);

        let (t1, fallback1) = adjuster.adjust("2020/06/01 10:00:00.000000");
        let (t2, fallback2) = adjuster.adjust("2020/06/01 10:00:05.500000");

        assert!(!fallback1 && !fallback2);
        assert_eq!(t2 - t1, Duration::milliseconds(5500));
    }

    #[test]
    fn test_adjust_offset_matches_epoch_delta() {
        let start = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let adjuster = TimestampAdjuster::with_start_time(start);

        let (adjusted, fallback) = adjuster.adjust("1970/01/01 00:00:10.000000");
        assert!(!fallback);
        assert_eq!(adjusted, start + Duration::seconds(10));
    }

    #[test]
    fn test_adjust_falls_back_on_parse_failure() {
        let start = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let adjuster = TimestampAdjuster::with_start_time(start);

        let (adjusted, fallback) = adjuster.adjust("garbage");
        assert!(fallback);
        assert_eq!(adjusted, start);
    }
}
