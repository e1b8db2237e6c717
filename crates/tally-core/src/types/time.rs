//! Bucket arithmetic: frequencies, intervals, windows, and boundary checks.
//!
//! A bucket is identified by its end timestamp. Its window is the half-open
//! range `[end - interval, end)`. Every timestamp the engine stores is UTC
//! and aligned to the owning statistic's frequency boundary.

use std::fmt;

use chrono::{DateTime, Duration, NaiveTime, Offset, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

/// How often a statistic produces a bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Hour,
    Day,
}

impl Frequency {
    /// Distance between two consecutive bucket end times.
    pub fn step(self) -> Duration {
        match self {
            Self::Hour => Duration::hours(1),
            Self::Day => Duration::days(1),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hour => "hour",
            Self::Day => "day",
        }
    }

    /// Floor a timestamp to the top of its hour or to midnight UTC.
    pub fn floor(self, t: DateTime<Utc>) -> DateTime<Utc> {
        let midnight = t.date_naive().and_time(NaiveTime::MIN).and_utc();
        match self {
            Self::Day => midnight,
            Self::Hour => midnight + Duration::hours(i64::from(t.hour())),
        }
    }

    pub fn is_aligned(self, t: DateTime<Utc>) -> bool {
        self.floor(t) == t
    }

    /// End time of the bucket whose window contains `event_time`.
    ///
    /// An event exactly on a boundary belongs to the bucket that starts there.
    /// `None` when that end is past the last representable instant.
    pub fn bucket_end_for(self, event_time: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.next_boundary(self.floor(event_time))
    }

    /// The boundary one step after `t`, if representable.
    pub fn next_boundary(self, t: DateTime<Utc>) -> Option<DateTime<Utc>> {
        t.checked_add_signed(self.step())
    }

    /// The boundary one step before `t`, if representable.
    pub fn previous_boundary(self, t: DateTime<Utc>) -> Option<DateTime<Utc>> {
        t.checked_sub_signed(self.step())
    }

    /// Validate an externally supplied target time.
    ///
    /// The offset must be exactly zero, the instant must sit on this
    /// frequency's boundary, and the boundary after it must be
    /// representable. Returns the same instant typed as UTC.
    pub fn validate_target<Tz: TimeZone>(
        self,
        target: &DateTime<Tz>,
    ) -> Result<DateTime<Utc>, ConfigError> {
        let offset_secs = target.offset().fix().local_minus_utc();
        let utc = target.with_timezone(&Utc);
        if offset_secs != 0 {
            return Err(ConfigError::NonUtcTime {
                time: utc.to_rfc3339(),
                offset_secs,
            });
        }
        if !self.is_aligned(utc) {
            return Err(ConfigError::MisalignedTime {
                time: utc.to_rfc3339(),
                frequency: self,
            });
        }
        if self.next_boundary(utc).is_none() {
            return Err(ConfigError::TimeOutOfRange {
                time: utc.to_rfc3339(),
                frequency: self,
            });
        }
        Ok(utc)
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Span of time one bucket covers, measured back from its end time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interval {
    /// Fixed look-back span.
    Span(Duration),
    /// "All time": the window has no lower bound.
    Unbounded,
}

impl Interval {
    /// The default interval for a frequency: exactly one step.
    pub fn of(frequency: Frequency) -> Self {
        Self::Span(frequency.step())
    }

    pub fn days(days: i64) -> Self {
        Self::Span(Duration::days(days))
    }

    pub fn hours(hours: i64) -> Self {
        Self::Span(Duration::hours(hours))
    }

    /// Window of the bucket ending at `end`.
    pub fn window_ending(self, end: DateTime<Utc>) -> BucketWindow {
        let start = match self {
            Self::Span(span) => end.checked_sub_signed(span),
            Self::Unbounded => None,
        };
        BucketWindow { start, end }
    }

    pub fn is_positive(self) -> bool {
        match self {
            Self::Span(span) => span > Duration::zero(),
            Self::Unbounded => true,
        }
    }
}

/// Half-open time window `[start, end)`. `start = None` means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketWindow {
    pub start: Option<DateTime<Utc>>,
    pub end: DateTime<Utc>,
}

impl BucketWindow {
    /// Lower bound in UNIX seconds; `i64::MIN` when unbounded.
    pub fn start_secs(&self) -> i64 {
        self.start.map(|s| s.timestamp()).unwrap_or(i64::MIN)
    }

    pub fn end_secs(&self) -> i64 {
        self.end.timestamp()
    }

    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        t < self.end && self.start.map_or(true, |s| t >= s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn test_floor_hour_and_day() {
        let t = at(2024, 3, 9, 17, 42);
        assert_eq!(Frequency::Hour.floor(t), at(2024, 3, 9, 17, 0));
        assert_eq!(Frequency::Day.floor(t), at(2024, 3, 9, 0, 0));
    }

    #[test]
    fn test_floor_drops_subsecond_precision() {
        let t = at(2024, 3, 9, 17, 0) + Duration::milliseconds(250);
        assert!(!Frequency::Hour.is_aligned(t));
        assert_eq!(Frequency::Hour.floor(t), at(2024, 3, 9, 17, 0));
    }

    #[test]
    fn test_bucket_end_for_boundary_event() {
        let boundary = at(2024, 3, 9, 10, 0);
        assert_eq!(Frequency::Hour.bucket_end_for(boundary), Some(at(2024, 3, 9, 11, 0)));
        let mid = at(2024, 3, 9, 10, 59);
        assert_eq!(Frequency::Hour.bucket_end_for(mid), Some(at(2024, 3, 9, 11, 0)));
        assert_eq!(Frequency::Day.bucket_end_for(mid), Some(at(2024, 3, 10, 0, 0)));
    }

    #[test]
    fn test_bucket_end_for_last_instant_is_none() {
        assert_eq!(Frequency::Hour.bucket_end_for(DateTime::<Utc>::MAX_UTC), None);
        assert_eq!(Frequency::Day.bucket_end_for(DateTime::<Utc>::MAX_UTC), None);
        assert_eq!(Frequency::Day.previous_boundary(DateTime::<Utc>::MIN_UTC), None);
    }

    #[test]
    fn test_validate_target_rejects_last_bucket() {
        let last = Frequency::Day.floor(DateTime::<Utc>::MAX_UTC);
        let err = Frequency::Day.validate_target(&last).unwrap_err();
        assert!(matches!(err, ConfigError::TimeOutOfRange { .. }));
    }

    #[test]
    fn test_validate_target_rejects_misaligned() {
        let err = Frequency::Day.validate_target(&at(2024, 3, 9, 1, 0)).unwrap_err();
        assert!(matches!(err, ConfigError::MisalignedTime { .. }));
        assert!(Frequency::Hour.validate_target(&at(2024, 3, 9, 1, 0)).is_ok());
    }

    #[test]
    fn test_validate_target_rejects_non_utc_offset() {
        let tz = FixedOffset::east_opt(3600).unwrap();
        let t = tz.with_ymd_and_hms(2024, 3, 9, 1, 0, 0).unwrap();
        let err = Frequency::Hour.validate_target(&t).unwrap_err();
        assert!(matches!(err, ConfigError::NonUtcTime { offset_secs: 3600, .. }));
    }

    #[test]
    fn test_validate_target_accepts_zero_fixed_offset() {
        let tz = FixedOffset::east_opt(0).unwrap();
        let t = tz.with_ymd_and_hms(2024, 3, 9, 0, 0, 0).unwrap();
        assert_eq!(Frequency::Day.validate_target(&t).unwrap(), at(2024, 3, 9, 0, 0));
    }

    #[test]
    fn test_window_bounds() {
        let end = at(2024, 3, 9, 0, 0);
        let w = Interval::days(7).window_ending(end);
        assert_eq!(w.start, Some(at(2024, 3, 2, 0, 0)));
        assert!(w.contains(at(2024, 3, 2, 0, 0)));
        assert!(!w.contains(end));

        let all = Interval::Unbounded.window_ending(end);
        assert_eq!(all.start_secs(), i64::MIN);
        assert!(all.contains(at(1999, 1, 1, 0, 0)));
    }
}
