//! Service-day time handling for GTFS schedules.
//!
//! GTFS gives stop times as "HH:MM:SS" relative to the start of the service
//! day, and the hour is allowed to run past 23: a train leaving at
//! "25:10:00" leaves at ten past one on the civil day after its service
//! date. This module keeps those times as plain second counts so that
//! ordering never wraps, and provides `DayRange` for closed date intervals.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use std::fmt;

/// Seconds in one civil day.
pub const SECONDS_PER_DAY: u32 = 24 * 60 * 60;

/// Error returned when parsing or building an invalid time or date range.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid time: {reason}")]
pub struct TimeError {
    reason: &'static str,
}

impl TimeError {
    fn new(reason: &'static str) -> Self {
        Self { reason }
    }

    /// The reason the input was rejected.
    pub fn reason(&self) -> &'static str {
        self.reason
    }
}

/// A time of day relative to local midnight of a service date.
///
/// Unlike a wall-clock time this is not bounded to 24 hours. Comparisons are
/// integer comparisons of the second count.
///
/// # Examples
///
/// ```
/// use gtfs_schedule::domain::DayTime;
///
/// let early = DayTime::parse("00:05:00").unwrap();
/// let late = DayTime::parse("25:10:00").unwrap();
/// assert!(late > early);
/// assert_eq!(late.to_string(), "25:10:00");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct DayTime(u32);

impl DayTime {
    /// Midnight at the start of the service day.
    pub const MIDNIGHT: DayTime = DayTime(0);

    /// Create a time from seconds since midnight.
    pub fn from_secs(secs: u32) -> Self {
        Self(secs)
    }

    /// Create a time from hour, minute and second components.
    ///
    /// Minutes and seconds must be below 60; hours are unbounded.
    pub fn from_hms(hours: u32, minutes: u32, seconds: u32) -> Result<Self, TimeError> {
        if minutes >= 60 {
            return Err(TimeError::new("minute must be 0-59"));
        }
        if seconds >= 60 {
            return Err(TimeError::new("second must be 0-59"));
        }
        hours
            .checked_mul(3600)
            .and_then(|h| h.checked_add(minutes * 60 + seconds))
            .map(Self)
            .ok_or_else(|| TimeError::new("hour out of range"))
    }

    /// Parse an "HH:MM:SS" string.
    ///
    /// The hour may have any number of digits and any value. Single-digit
    /// fields ("5:3:0") are accepted, as some feeds emit them.
    ///
    /// # Examples
    ///
    /// ```
    /// use gtfs_schedule::domain::DayTime;
    ///
    /// assert_eq!(DayTime::parse("08:30:00").unwrap().as_secs(), 30_600);
    /// assert_eq!(DayTime::parse("5:30:00").unwrap().as_secs(), 19_800);
    /// assert!(DayTime::parse("48:00:00").is_ok());
    ///
    /// assert!(DayTime::parse("08:60:00").is_err());
    /// assert!(DayTime::parse("08:30").is_err());
    /// assert!(DayTime::parse("-1:00:00").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self, TimeError> {
        let mut parts = s.trim().split(':');
        let (Some(h), Some(m), Some(sec), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(TimeError::new("expected HH:MM:SS"));
        };
        let hours = parse_digits(h).ok_or_else(|| TimeError::new("invalid hour digits"))?;
        let minutes = parse_digits(m).ok_or_else(|| TimeError::new("invalid minute digits"))?;
        let seconds = parse_digits(sec).ok_or_else(|| TimeError::new("invalid second digits"))?;
        Self::from_hms(hours, minutes, seconds)
    }

    /// Seconds since midnight of the service day.
    pub fn as_secs(&self) -> u32 {
        self.0
    }

    /// Hours since midnight (may be 24 or more).
    pub fn hours(&self) -> u32 {
        self.0 / 3600
    }

    /// Minute within the hour (0-59).
    pub fn minutes(&self) -> u32 {
        (self.0 / 60) % 60
    }

    /// Second within the minute (0-59).
    pub fn seconds(&self) -> u32 {
        self.0 % 60
    }

    /// Whole civil days past the service date (0 for times before 24:00:00).
    pub fn day_offset(&self) -> u32 {
        self.0 / SECONDS_PER_DAY
    }

    /// The wall-clock time, wrapped into a single day.
    pub fn wall_clock(&self) -> NaiveTime {
        // from_num_seconds_from_midnight_opt only fails for values >= 86400
        NaiveTime::from_num_seconds_from_midnight_opt(self.0 % SECONDS_PER_DAY, 0)
            .unwrap_or(NaiveTime::MIN)
    }

    /// The civil date-time of this time on the given service date.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use gtfs_schedule::domain::DayTime;
    ///
    /// let service_date = NaiveDate::from_ymd_opt(2026, 1, 16).unwrap();
    /// let at = DayTime::parse("25:10:00").unwrap().on_date(service_date);
    /// assert_eq!(at.to_string(), "2026-01-17 01:10:00");
    /// ```
    pub fn on_date(&self, service_date: NaiveDate) -> NaiveDateTime {
        service_date.and_time(NaiveTime::MIN) + Duration::seconds(i64::from(self.0))
    }

    /// Add a number of seconds, returning `None` on overflow.
    pub fn checked_add_secs(&self, secs: u32) -> Option<Self> {
        self.0.checked_add(secs).map(Self)
    }

    /// Subtract a number of seconds, returning `None` if the result would be
    /// before midnight.
    pub fn checked_sub_secs(&self, secs: u32) -> Option<Self> {
        self.0.checked_sub(secs).map(Self)
    }

    /// Signed number of seconds from `earlier` to `self`.
    pub fn secs_since(&self, earlier: DayTime) -> i64 {
        i64::from(self.0) - i64::from(earlier.0)
    }
}

impl From<u32> for DayTime {
    fn from(secs: u32) -> Self {
        Self(secs)
    }
}

impl fmt::Debug for DayTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DayTime({self})")
    }
}

impl fmt::Display for DayTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}",
            self.hours(),
            self.minutes(),
            self.seconds()
        )
    }
}

/// Parse a non-empty run of ASCII digits into a u32.
fn parse_digits(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Parse a GTFS "YYYYMMDD" date.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use gtfs_schedule::domain::parse_gtfs_date;
///
/// assert_eq!(
///     parse_gtfs_date("20260103").unwrap(),
///     NaiveDate::from_ymd_opt(2026, 1, 3).unwrap()
/// );
/// assert!(parse_gtfs_date("2026-01-03").is_err());
/// assert!(parse_gtfs_date("20260230").is_err());
/// ```
pub fn parse_gtfs_date(s: &str) -> Result<NaiveDate, TimeError> {
    let s = s.trim();
    if s.len() != 8 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(TimeError::new("expected YYYYMMDD"));
    }
    NaiveDate::parse_from_str(s, "%Y%m%d").map_err(|_| TimeError::new("no such calendar date"))
}

/// A closed interval of civil dates.
///
/// Used for calendar validity windows and for query filters. Ordering is by
/// start date, then end date.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use gtfs_schedule::domain::DayRange;
///
/// let d = |day| NaiveDate::from_ymd_opt(2026, 1, day).unwrap();
/// let january = DayRange::new(d(1), d(31)).unwrap();
/// assert!(january.contains(d(17)));
/// assert_eq!(january.len(), 31);
///
/// let one_day = DayRange::single(d(3));
/// assert_eq!(one_day.len(), 1);
///
/// assert!(DayRange::new(d(31), d(1)).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DayRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DayRange {
    /// Create a range; `start` must not be after `end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, TimeError> {
        if start > end {
            return Err(TimeError::new("range start is after its end"));
        }
        Ok(Self { start, end })
    }

    /// A range covering exactly one date.
    pub fn single(date: NaiveDate) -> Self {
        Self {
            start: date,
            end: date,
        }
    }

    /// First date in the range.
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// Last date in the range (inclusive).
    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Whether the date lies within the range, both ends inclusive.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Number of dates in the range, counting both ends.
    pub fn len(&self) -> u64 {
        // start <= end is a construction invariant
        (self.end - self.start).num_days().unsigned_abs() + 1
    }

    /// Always false: a range holds at least one date.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Iterate over every date in the range, in order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + use<> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d <= end)
    }
}

impl fmt::Display for DayRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Formatting a parsed time and parsing it again gives the same seconds
        #[test]
        fn format_parse_roundtrip(h in 0u32..48, m in 0u32..60, s in 0u32..60) {
            let text = format!("{h:02}:{m:02}:{s:02}");
            let parsed = DayTime::parse(&text).unwrap();
            prop_assert_eq!(parsed.to_string(), text);
            let reparsed = DayTime::parse(&parsed.to_string()).unwrap();
            prop_assert_eq!(reparsed.as_secs(), parsed.as_secs());
        }

        /// Any second count formats to a string that parses back to itself
        #[test]
        fn secs_roundtrip(secs in 0u32..1_000_000) {
            let t = DayTime::from_secs(secs);
            prop_assert_eq!(DayTime::parse(&t.to_string()).unwrap(), t);
        }

        /// Ordering of DayTime matches ordering of seconds
        #[test]
        fn ordering_matches_secs(a in 0u32..200_000, b in 0u32..200_000) {
            let (ta, tb) = (DayTime::from_secs(a), DayTime::from_secs(b));
            prop_assert_eq!(ta.cmp(&tb), a.cmp(&b));
        }

        /// Minutes or seconds of 60 and above are always rejected
        #[test]
        fn out_of_range_minutes_rejected(h in 0u32..48, m in 60u32..100, s in 0u32..60) {
            let text = format!("{h:02}:{m:02}:{s:02}");
            prop_assert!(DayTime::parse(&text).is_err());
        }

        /// Range length equals the number of days it iterates over
        #[test]
        fn range_len_matches_days(offset in 0i64..400, span in 0i64..400) {
            let base = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
            let start = base + Duration::days(offset);
            let range = DayRange::new(start, start + Duration::days(span)).unwrap();
            prop_assert_eq!(range.len(), range.days().count() as u64);
            prop_assert_eq!(range.len(), span as u64 + 1);
        }
    }
}
