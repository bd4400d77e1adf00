//! Date range filtering for the history view.
//!
//! The user types wall-clock times in their own timezone. Event timestamps
//! are absolute UTC instants. [`DateRange::from_inputs_in`] resolves the
//! inputs to the instants the user meant, in whatever timezone applies,
//! and widens the end bound to the last instant of the entered minute (or
//! of the day, for a bare date) so the boundary minute is fully included.

use chrono::{
    DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeDelta, TimeZone,
    Timelike, Utc,
};

/// Inclusive time window. A missing bound is unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

/// How precisely a local time input was entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    Day,
    Minute,
    Second,
    /// Fractional seconds were given.
    Exact,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bound {
    Start,
    End,
}

/// Accepted input layouts, coarsest first. `%.f` also matches an absent
/// fraction, so it must come after the plain-seconds layout.
const INPUT_FORMATS: &[(&str, Granularity)] = &[
    ("%Y-%m-%dT%H:%M", Granularity::Minute),
    ("%Y-%m-%dT%H:%M:%S", Granularity::Second),
    ("%Y-%m-%dT%H:%M:%S%.f", Granularity::Exact),
    ("%Y-%m-%d %H:%M", Granularity::Minute),
    ("%Y-%m-%d %H:%M:%S", Granularity::Second),
    ("%Y-%m-%d %H:%M:%S%.f", Granularity::Exact),
];

impl DateRange {
    /// No bounds at all.
    pub const UNBOUNDED: DateRange = DateRange {
        start: None,
        end: None,
    };

    pub fn new(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        Self { start, end }
    }

    /// Build a range from inputs in the viewer's local timezone.
    pub fn from_local_inputs(start: Option<&str>, end: Option<&str>) -> Self {
        Self::from_inputs_in(&Local, start, end)
    }

    /// Build a range from wall-clock inputs in `tz`.
    ///
    /// Absent, blank or unparsable inputs leave that side unbounded, and so
    /// does an end that cannot be represented as a UTC instant. A start
    /// after the end is accepted and simply matches nothing.
    pub fn from_inputs_in<Tz: TimeZone>(tz: &Tz, start: Option<&str>, end: Option<&str>) -> Self {
        let start = start
            .and_then(parse_local_input)
            .and_then(|(naive, _)| resolve_local(tz, naive, Bound::Start));

        let end = end
            .and_then(parse_local_input)
            .and_then(|(naive, granularity)| end_of(naive, granularity))
            .and_then(|naive| resolve_local(tz, naive, Bound::End));

        Self { start, end }
    }

    /// Whether `t` falls inside the window, bounds included.
    pub fn contains(&self, t: &DateTime<Utc>) -> bool {
        self.start.map_or(true, |s| *t >= s) && self.end.map_or(true, |e| *t <= e)
    }

    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }
}

/// Parse a wall-clock input like `2024-01-01T10:05` or `2024-01-01 10:05:30`.
///
/// A bare date (`2024-01-01`) is accepted with day granularity.
pub fn parse_local_input(input: &str) -> Option<(NaiveDateTime, Granularity)> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    for (fmt, granularity) in INPUT_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, fmt) {
            return Some((naive, *granularity));
        }
    }

    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .map(|date| (date.and_time(NaiveTime::MIN), Granularity::Day))
}

/// Last instant of the minute an end input falls in, or of the day for a
/// bare date. Seconds and fractions the user typed are widened too.
fn end_of(naive: NaiveDateTime, granularity: Granularity) -> Option<NaiveDateTime> {
    let date = naive.date();
    match granularity {
        Granularity::Day => date.and_hms_nano_opt(23, 59, 59, 999_999_999),
        Granularity::Minute | Granularity::Second | Granularity::Exact => {
            date.and_hms_nano_opt(naive.hour(), naive.minute(), 59, 999_999_999)
        }
    }
}

/// Resolve a wall-clock time in `tz` to a UTC instant.
///
/// When a DST fall-back makes the time ambiguous, the start bound takes the
/// earlier instant and the end bound the later one, so the window covers
/// both readings. When a DST spring-forward skips the time, it is read with
/// the offset in force before the jump (02:30 in a skipped hour becomes
/// 03:30 after it).
fn resolve_local<Tz: TimeZone>(
    tz: &Tz,
    naive: NaiveDateTime,
    bound: Bound,
) -> Option<DateTime<Utc>> {
    let offsets = tz.offset_from_local_datetime(&naive);
    let picked = match bound {
        Bound::Start => offsets.earliest(),
        Bound::End => offsets.latest(),
    };

    let offset = match picked {
        Some(offset) => offset.fix(),
        None => {
            let before_gap = naive.checked_sub_signed(TimeDelta::days(1))?;
            tz.offset_from_local_datetime(&before_gap).earliest()?.fix()
        }
    };
    to_utc(naive, offset)
}

/// Apply `offset` to a wall-clock time. `None` past the calendar's range.
fn to_utc(naive: NaiveDateTime, offset: FixedOffset) -> Option<DateTime<Utc>> {
    let utc = naive.checked_sub_signed(TimeDelta::seconds(i64::from(offset.local_minus_utc())))?;
    Some(Utc.from_utc_datetime(&utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn test_parse_local_input_granularity() {
        assert_eq!(parse_local_input("2024-01-01T10:05").unwrap().1, Granularity::Minute);
        assert_eq!(parse_local_input("2024-01-01T10:05:30").unwrap().1, Granularity::Second);
        assert_eq!(parse_local_input("2024-01-01 10:05:30.250").unwrap().1, Granularity::Exact);
        assert_eq!(parse_local_input("2024-01-01").unwrap().1, Granularity::Day);
        assert!(parse_local_input("").is_none());
        assert!(parse_local_input("10:05").is_none());
        assert!(parse_local_input("2024-02-30T10:05").is_none());
    }

    #[test]
    fn test_start_converts_without_truncation() {
        let tz = FixedOffset::east_opt(2 * 3600).unwrap();
        let range = DateRange::from_inputs_in(&tz, Some("2024-01-01T10:05:30"), None);
        assert_eq!(range.start, Some(utc(2024, 1, 1, 8, 5, 30)));
        assert!(range.end.is_none());
    }

    #[test]
    fn test_end_minute_is_fully_included() {
        let tz = FixedOffset::east_opt(0).unwrap();
        let range = DateRange::from_inputs_in(&tz, None, Some("2024-01-01T10:05"));

        let last_ms = utc(2024, 1, 1, 10, 5, 59) + TimeDelta::milliseconds(999);
        assert!(range.contains(&last_ms));
        assert!(!range.contains(&utc(2024, 1, 1, 10, 6, 0)));
    }

    #[test]
    fn test_end_with_seconds_covers_the_rest_of_the_minute() {
        let tz = FixedOffset::east_opt(0).unwrap();
        let last_ms = utc(2024, 1, 1, 10, 5, 59) + TimeDelta::milliseconds(999);

        for input in ["2024-01-01T10:05:30", "2024-01-01 10:05:30.250"] {
            let range = DateRange::from_inputs_in(&tz, None, Some(input));
            assert!(range.contains(&utc(2024, 1, 1, 10, 5, 45)), "{}", input);
            assert!(range.contains(&last_ms), "{}", input);
            assert!(!range.contains(&utc(2024, 1, 1, 10, 6, 0)), "{}", input);
        }
    }

    #[test]
    fn test_end_at_the_calendar_limit_does_not_overflow() {
        let utc_tz = FixedOffset::east_opt(0).unwrap();
        let range = DateRange::from_inputs_in(&utc_tz, None, Some("+262142-12-31"));
        assert_eq!(range.end, Some(DateTime::<Utc>::MAX_UTC));
        assert!(range.contains(&utc(2024, 1, 1, 0, 0, 0)));

        let range = DateRange::from_inputs_in(&utc_tz, None, Some("+262142-12-31T23:59:30"));
        assert_eq!(range.end, Some(DateTime::<Utc>::MAX_UTC));

        // West of UTC the widened end lies past the last representable instant.
        let west = FixedOffset::west_opt(5 * 3600).unwrap();
        let range = DateRange::from_inputs_in(&west, None, Some("+262142-12-31T23:59"));
        assert!(range.end.is_none());
    }

    #[test]
    fn test_end_day_granularity_covers_whole_day() {
        let tz = FixedOffset::east_opt(0).unwrap();
        let range = DateRange::from_inputs_in(&tz, Some("2024-01-01"), Some("2024-01-01"));

        assert!(range.contains(&utc(2024, 1, 1, 0, 0, 0)));
        assert!(range.contains(&utc(2024, 1, 1, 23, 59, 59)));
        assert!(!range.contains(&utc(2024, 1, 2, 0, 0, 0)));
    }

    #[test]
    fn test_non_whole_hour_offset() {
        // UTC+05:45
        let tz = FixedOffset::east_opt(5 * 3600 + 45 * 60).unwrap();
        let range = DateRange::from_inputs_in(&tz, Some("2024-06-01T06:00"), Some("2024-06-01T06:00"));

        assert_eq!(range.start, Some(utc(2024, 6, 1, 0, 15, 0)));
        assert!(range.contains(&(utc(2024, 6, 1, 0, 15, 59))));
        assert!(!range.contains(&utc(2024, 6, 1, 0, 16, 0)));
    }

    #[test]
    fn test_invalid_inputs_are_unbounded() {
        let tz = FixedOffset::east_opt(0).unwrap();
        let range = DateRange::from_inputs_in(&tz, Some("not a date"), Some(""));
        assert!(range.is_unbounded());
        assert!(range.contains(&utc(1999, 1, 1, 0, 0, 0)));
    }

    #[test]
    fn test_start_after_end_matches_nothing() {
        let tz = FixedOffset::east_opt(0).unwrap();
        let range =
            DateRange::from_inputs_in(&tz, Some("2024-01-02T00:00"), Some("2024-01-01T00:00"));
        assert!(range.start.is_some() && range.end.is_some());
        assert!(!range.contains(&utc(2024, 1, 1, 0, 0, 30)));
        assert!(!range.contains(&utc(2024, 1, 2, 0, 0, 0)));
    }

    /// A toy zone with a one-hour spring-forward at 2024-03-10 02:00 local
    /// (UTC-5 before, UTC-4 after), like US Eastern.
    #[derive(Debug, Clone, Copy)]
    struct ToyEastern;

    impl ToyEastern {
        fn switch_utc() -> NaiveDateTime {
            NaiveDate::from_ymd_opt(2024, 3, 10).unwrap().and_hms_opt(7, 0, 0).unwrap()
        }
        fn fall_back_utc() -> NaiveDateTime {
            NaiveDate::from_ymd_opt(2024, 11, 3).unwrap().and_hms_opt(6, 0, 0).unwrap()
        }
        fn est() -> FixedOffset {
            FixedOffset::west_opt(5 * 3600).unwrap()
        }
        fn edt() -> FixedOffset {
            FixedOffset::west_opt(4 * 3600).unwrap()
        }
    }

    impl TimeZone for ToyEastern {
        type Offset = FixedOffset;

        fn from_offset(_offset: &FixedOffset) -> Self {
            ToyEastern
        }

        fn offset_from_local_date(&self, local: &NaiveDate) -> chrono::LocalResult<FixedOffset> {
            self.offset_from_local_datetime(&local.and_time(NaiveTime::MIN))
        }

        fn offset_from_local_datetime(
            &self,
            local: &NaiveDateTime,
        ) -> chrono::LocalResult<FixedOffset> {
            let as_est = *local - TimeDelta::seconds(i64::from(Self::est().local_minus_utc()));
            let as_edt = *local - TimeDelta::seconds(i64::from(Self::edt().local_minus_utc()));
            let est_ok = as_est < Self::switch_utc() || as_est >= Self::fall_back_utc();
            let edt_ok = as_edt >= Self::switch_utc() && as_edt < Self::fall_back_utc();
            match (est_ok, edt_ok) {
                (true, true) => chrono::LocalResult::Ambiguous(Self::edt(), Self::est()),
                (true, false) => chrono::LocalResult::Single(Self::est()),
                (false, true) => chrono::LocalResult::Single(Self::edt()),
                (false, false) => chrono::LocalResult::None,
            }
        }

        fn offset_from_utc_date(&self, utc: &NaiveDate) -> FixedOffset {
            self.offset_from_utc_datetime(&utc.and_time(NaiveTime::MIN))
        }

        fn offset_from_utc_datetime(&self, utc: &NaiveDateTime) -> FixedOffset {
            if *utc >= Self::switch_utc() && *utc < Self::fall_back_utc() {
                Self::edt()
            } else {
                Self::est()
            }
        }
    }

    #[test]
    fn test_dst_offsets_follow_the_date() {
        let winter = DateRange::from_inputs_in(&ToyEastern, Some("2024-01-15T09:00"), None);
        assert_eq!(winter.start, Some(utc(2024, 1, 15, 14, 0, 0)));

        let summer = DateRange::from_inputs_in(&ToyEastern, Some("2024-07-15T09:00"), None);
        assert_eq!(summer.start, Some(utc(2024, 7, 15, 13, 0, 0)));
    }

    #[test]
    fn test_spring_forward_gap_moves_past_the_jump() {
        let range = DateRange::from_inputs_in(&ToyEastern, Some("2024-03-10T02:30"), None);
        // 02:30 read at UTC-5 is 07:30Z, i.e. 03:30 EDT.
        assert_eq!(range.start, Some(utc(2024, 3, 10, 7, 30, 0)));
    }

    #[test]
    fn test_fall_back_ambiguity_widens_the_window() {
        let range = DateRange::from_inputs_in(
            &ToyEastern,
            Some("2024-11-03T01:30"),
            Some("2024-11-03T01:30"),
        );
        // First 01:30 is EDT (05:30Z); the second is EST (06:30Z).
        assert_eq!(range.start, Some(utc(2024, 11, 3, 5, 30, 0)));
        assert!(range.contains(&utc(2024, 11, 3, 6, 30, 59)));
        assert!(!range.contains(&utc(2024, 11, 3, 6, 31, 0)));
    }
}
