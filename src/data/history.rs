//! Client-side cache of host status history.
//!
//! The snapshot is always the complete, unfiltered dataset from the last
//! successful fetch. Filtering for display happens in [`super::timeline`]
//! and never mutates it.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::source::{EventPayload, HistoryPayload};

/// Online/offline state reported by a status event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostStatus {
    Online,
    Offline,
}

impl HostStatus {
    /// Returns the display label.
    pub fn label(&self) -> &'static str {
        match self {
            HostStatus::Online => "Online",
            HostStatus::Offline => "Offline",
        }
    }

    /// Map the wire flag (`1` is online, anything else offline).
    pub fn from_flag(flag: u8) -> Self {
        if flag == 1 {
            HostStatus::Online
        } else {
            HostStatus::Offline
        }
    }
}

/// A timestamped online/offline observation.
///
/// `timestamp` is `None` when the server sent a missing, empty or
/// unparsable time. Such events stay in the snapshot but are never shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEvent {
    pub timestamp: Option<DateTime<Utc>>,
    pub status: HostStatus,
}

impl StatusEvent {
    pub fn new(timestamp: Option<DateTime<Utc>>, status: HostStatus) -> Self {
        Self { timestamp, status }
    }

    pub fn from_payload(payload: &EventPayload) -> Self {
        Self {
            timestamp: payload.event_time.as_deref().and_then(parse_event_time),
            status: HostStatus::from_flag(payload.status),
        }
    }

    pub fn is_online(&self) -> bool {
        self.status == HostStatus::Online
    }
}

/// Parse an event time sent by the server.
///
/// Accepts RFC 3339 (`2024-01-01T10:00:00Z`, `...+00:00`). A timestamp
/// without an offset is taken as UTC, since the backend stores UTC.
pub fn parse_event_time(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Everything known about one host's history.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostHistory {
    /// Hostname at the time of the fetch; may be empty.
    pub display_name: String,
    /// Events in arrival order. Sorted only when building a timeline.
    pub events: Vec<StatusEvent>,
}

impl HostHistory {
    pub fn new(display_name: impl Into<String>, events: Vec<StatusEvent>) -> Self {
        Self {
            display_name: display_name.into(),
            events,
        }
    }
}

/// Host id to history, as of the last successful fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistorySnapshot {
    hosts: BTreeMap<String, HostHistory>,
}

impl HistorySnapshot {
    /// Create an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Convert the `GET /api/history` body.
    pub fn from_payload(payload: HistoryPayload) -> Self {
        let hosts = payload
            .into_iter()
            .map(|(ip, host)| {
                let events = host.events.iter().map(StatusEvent::from_payload).collect();
                (ip, HostHistory::new(host.hostname, events))
            })
            .collect();
        Self { hosts }
    }

    /// Replace everything with `other`. Hosts missing from `other` are gone.
    pub fn replace(&mut self, other: HistorySnapshot) {
        self.hosts = other.hosts;
    }

    /// Drop one host. Returns whether it was present.
    pub fn remove(&mut self, ip: &str) -> bool {
        self.hosts.remove(ip).is_some()
    }

    pub fn clear(&mut self) {
        self.hosts.clear();
    }

    pub fn insert(&mut self, ip: impl Into<String>, history: HostHistory) {
        self.hosts.insert(ip.into(), history);
    }

    pub fn get(&self, ip: &str) -> Option<&HostHistory> {
        self.hosts.get(ip)
    }

    pub fn contains(&self, ip: &str) -> bool {
        self.hosts.contains_key(ip)
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &HostHistory)> {
        self.hosts.iter()
    }
}
