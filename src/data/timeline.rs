//! Timeline construction for the history view.
//!
//! Pure functions from the cached [`HistorySnapshot`] plus the current
//! filters to what gets drawn. Nothing here touches the terminal, so the
//! same output feeds both the TUI and the JSON export.
//!
//! ```text
//! HistorySnapshot ──▶ host filters (ip, hostname) ──▶ sort by IP
//!                                                        │
//!       HostHistory + DateRange ──▶ build_timeline ◀─────┘
//!                                        │
//!                                        ▼
//!                           Segments(..) | Empty (placeholder)
//! ```

use chrono::{DateTime, Local, TimeZone, Utc};
use serde::Serialize;

use super::history::{HistorySnapshot, HostHistory};
use super::hosts::compare_host_ids;
use super::range::DateRange;

/// Shown in place of a timeline with no events in range.
pub const NO_EVENTS_PLACEHOLDER: &str = "No events in selected range.";

/// Shown when no host passes the ip/hostname filters.
pub const NO_MATCHING_HOSTS_PLACEHOLDER: &str = "No hosts match current filters.";

/// One status event's marker on a timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Segment {
    pub online: bool,
    pub timestamp: DateTime<Utc>,
    /// "Online at ..." with the time in the viewer's timezone.
    pub tooltip: String,
}

/// What to draw for one host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "segments", rename_all = "lowercase")]
pub enum Timeline {
    /// Events in range, ascending by time.
    Segments(Vec<Segment>),
    /// No event fell in range.
    Empty,
}

impl Timeline {
    pub fn segments(&self) -> &[Segment] {
        match self {
            Timeline::Segments(s) => s,
            Timeline::Empty => &[],
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Timeline::Empty)
    }

    /// Text to show instead of segments, if any.
    pub fn placeholder(&self) -> Option<&'static str> {
        match self {
            Timeline::Segments(_) => None,
            Timeline::Empty => Some(NO_EVENTS_PLACEHOLDER),
        }
    }
}

/// Build the timeline for `history` within `range`, tooltips in local time.
pub fn build_timeline(history: &HostHistory, range: &DateRange) -> Timeline {
    build_timeline_in(&Local, history, range)
}

/// Build the timeline for `history` within `range`, tooltips in `tz`.
///
/// Events without a usable timestamp are dropped whatever the range.
/// Events sharing a timestamp keep their original relative order.
pub fn build_timeline_in<Tz>(tz: &Tz, history: &HostHistory, range: &DateRange) -> Timeline
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let mut events: Vec<_> = history
        .events
        .iter()
        .filter_map(|e| e.timestamp.map(|t| (t, e.status)))
        .filter(|(t, _)| range.contains(t))
        .collect();

    if events.is_empty() {
        return Timeline::Empty;
    }

    // sort_by_key is stable
    events.sort_by_key(|(t, _)| *t);

    let segments = events
        .into_iter()
        .map(|(timestamp, status)| Segment {
            online: status == super::HostStatus::Online,
            timestamp,
            tooltip: format!(
                "{} at {}",
                status.label(),
                timestamp.with_timezone(tz).format("%x %X")
            ),
        })
        .collect();

    Timeline::Segments(segments)
}

/// Everything the user can type into the history view's filter bar.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryFilters {
    pub ip: String,
    pub hostname: String,
    /// Local wall-clock start, e.g. `2024-01-01T10:00`.
    pub start: String,
    /// Local wall-clock end; its last minute is included.
    pub end: String,
}

impl HistoryFilters {
    /// Resolve the date inputs in the viewer's timezone.
    pub fn date_range(&self) -> DateRange {
        DateRange::from_local_inputs(Some(&self.start), Some(&self.end))
    }

    /// Case-insensitive substring match on id and hostname.
    ///
    /// A host with no hostname never matches a non-empty hostname filter.
    pub fn matches_host(&self, ip: &str, history: &HostHistory) -> bool {
        let ip_filter = self.ip.trim().to_lowercase();
        let name_filter = self.hostname.trim().to_lowercase();

        let ip_ok = ip_filter.is_empty() || ip.to_lowercase().contains(&ip_filter);
        let name_ok = name_filter.is_empty()
            || (!history.display_name.is_empty()
                && history.display_name.to_lowercase().contains(&name_filter));
        ip_ok && name_ok
    }
}

/// A host's row in the history view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelineRow {
    pub ip: String,
    pub hostname: String,
    pub timeline: Timeline,
}

/// Rows for every host passing `filters`, in IP order.
pub fn timeline_rows(snapshot: &HistorySnapshot, filters: &HistoryFilters) -> Vec<TimelineRow> {
    timeline_rows_in(&Local, snapshot, filters, &filters.date_range())
}

/// Like [`timeline_rows`] with an explicit timezone and pre-resolved range.
pub fn timeline_rows_in<Tz>(
    tz: &Tz,
    snapshot: &HistorySnapshot,
    filters: &HistoryFilters,
    range: &DateRange,
) -> Vec<TimelineRow>
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let mut hosts: Vec<_> = snapshot
        .iter()
        .filter(|(ip, history)| filters.matches_host(ip, history))
        .collect();
    hosts.sort_by(|(a, _), (b, _)| compare_host_ids(a, b));

    hosts
        .into_iter()
        .map(|(ip, history)| TimelineRow {
            ip: ip.clone(),
            hostname: history.display_name.clone(),
            timeline: build_timeline_in(tz, history, range),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{HostStatus, StatusEvent};
    use chrono::{FixedOffset, TimeDelta};

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, h, m, s).unwrap()
    }

    fn ev(t: Option<DateTime<Utc>>, status: HostStatus) -> StatusEvent {
        StatusEvent::new(t, status)
    }

    fn utc_tz() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    #[test]
    fn test_unbounded_includes_all_parsable_ascending() {
        let history = HostHistory::new(
            "nas",
            vec![
                ev(Some(at(12, 0, 0)), HostStatus::Offline),
                ev(None, HostStatus::Online),
                ev(Some(at(10, 0, 0)), HostStatus::Online),
                ev(Some(at(11, 0, 0)), HostStatus::Online),
            ],
        );

        let timeline = build_timeline_in(&utc_tz(), &history, &DateRange::UNBOUNDED);
        let times: Vec<_> = timeline.segments().iter().map(|s| s.timestamp).collect();
        assert_eq!(times, vec![at(10, 0, 0), at(11, 0, 0), at(12, 0, 0)]);
        assert!(!timeline.segments()[2].online);
    }

    #[test]
    fn test_inclusive_end_of_minute() {
        let tz = utc_tz();
        let range = DateRange::from_inputs_in(&tz, None, Some("2024-01-01T10:05"));
        let last = at(10, 5, 59) + TimeDelta::milliseconds(999);
        let history = HostHistory::new(
            "",
            vec![
                ev(Some(last), HostStatus::Online),
                ev(Some(at(10, 6, 0)), HostStatus::Online),
            ],
        );

        let timeline = build_timeline_in(&tz, &history, &range);
        assert_eq!(timeline.segments().len(), 1);
        assert_eq!(timeline.segments()[0].timestamp, last);
    }

    #[test]
    fn test_empty_range_yields_placeholder() {
        let tz = utc_tz();
        let range = DateRange::from_inputs_in(&tz, Some("2030-01-01T00:00"), None);
        let history = HostHistory::new("", vec![ev(Some(at(10, 0, 0)), HostStatus::Online)]);

        let timeline = build_timeline_in(&tz, &history, &range);
        assert_eq!(timeline, Timeline::Empty);
        assert_eq!(timeline.placeholder(), Some(NO_EVENTS_PLACEHOLDER));
    }

    #[test]
    fn test_only_unparsable_events_yield_placeholder() {
        let history = HostHistory::new("", vec![ev(None, HostStatus::Online)]);
        assert!(build_timeline(&history, &DateRange::UNBOUNDED).is_empty());
    }

    #[test]
    fn test_ties_keep_original_order() {
        let history = HostHistory::new(
            "",
            vec![
                ev(Some(at(10, 0, 0)), HostStatus::Offline),
                ev(Some(at(9, 0, 0)), HostStatus::Online),
                ev(Some(at(10, 0, 0)), HostStatus::Online),
            ],
        );

        let timeline = build_timeline_in(&utc_tz(), &history, &DateRange::UNBOUNDED);
        let online: Vec<_> = timeline.segments().iter().map(|s| s.online).collect();
        assert_eq!(online, vec![true, false, true]);
    }

    #[test]
    fn test_filtering_is_idempotent() {
        let tz = utc_tz();
        let range = DateRange::from_inputs_in(&tz, Some("2024-01-01T09:30"), None);
        let history = HostHistory::new(
            "",
            vec![
                ev(Some(at(9, 0, 0)), HostStatus::Online),
                ev(Some(at(10, 0, 0)), HostStatus::Offline),
            ],
        );
        let before = history.clone();

        let first = build_timeline_in(&tz, &history, &range);
        let second = build_timeline_in(&tz, &history, &range);
        assert_eq!(first, second);
        assert_eq!(history, before);
    }

    #[test]
    fn test_tooltip_uses_viewer_timezone() {
        let tz = FixedOffset::east_opt(2 * 3600).unwrap();
        let history = HostHistory::new("", vec![ev(Some(at(10, 0, 0)), HostStatus::Online)]);

        let timeline = build_timeline_in(&tz, &history, &DateRange::UNBOUNDED);
        let tooltip = &timeline.segments()[0].tooltip;
        assert!(tooltip.starts_with("Online at "));
        assert!(tooltip.contains("12:00:00"));
    }

    #[test]
    fn test_rows_filter_and_sort() {
        let mut snapshot = HistorySnapshot::new();
        snapshot.insert("10.0.0.10", HostHistory::new("printer", Vec::new()));
        snapshot.insert("10.0.0.2", HostHistory::new("nas", Vec::new()));
        snapshot.insert("10.0.0.3", HostHistory::new("", Vec::new()));

        let rows = timeline_rows(&snapshot, &HistoryFilters::default());
        let ips: Vec<_> = rows.iter().map(|r| r.ip.as_str()).collect();
        assert_eq!(ips, vec!["10.0.0.2", "10.0.0.3", "10.0.0.10"]);

        let filters = HistoryFilters {
            hostname: "N".into(),
            ..Default::default()
        };
        let rows = timeline_rows(&snapshot, &filters);
        let ips: Vec<_> = rows.iter().map(|r| r.ip.as_str()).collect();
        assert_eq!(ips, vec!["10.0.0.2", "10.0.0.10"]);

        let filters = HistoryFilters {
            ip: "0.0.1".into(),
            ..Default::default()
        };
        assert_eq!(timeline_rows(&snapshot, &filters).len(), 1);
    }
}
