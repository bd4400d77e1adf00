//! Wire types for the scanner backend's JSON API.
//!
//! These match what the backend serializes. Nullable columns come back as
//! `null` or `""` depending on the endpoint, so string fields deserialize
//! `null` as an empty string.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

/// Body of `GET /api/history`: host id to that host's history.
pub type HistoryPayload = BTreeMap<String, HostHistoryPayload>;

/// One host's entry in the history payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HostHistoryPayload {
    /// Current hostname of the host; may be empty.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub hostname: String,

    /// Status events in whatever order the server produced them.
    #[serde(default, deserialize_with = "null_as_default")]
    pub events: Vec<EventPayload>,
}

/// A single online/offline observation as sent by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventPayload {
    /// ISO-8601 UTC timestamp. May be missing, `null`, empty or garbage.
    #[serde(default)]
    pub event_time: Option<String>,

    /// `1` for online; anything else is offline.
    #[serde(default, deserialize_with = "status_flag")]
    pub status: u8,
}

/// A row of `GET /api/hosts`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HostRecord {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub ip_address: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub mac_address: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub vendor: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub hostname: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub ports: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub note: String,
    /// `ONLINE` or `OFFLINE` as reported by the last scan.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub status: String,
    /// `1` when the operator marked the host as known.
    #[serde(default, deserialize_with = "status_flag")]
    pub known_host: u8,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub first_seen: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub last_seen_online: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub last_updated: String,
}

/// Body of `POST /api/hosts/{id}/update`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateFieldBody {
    pub field: String,
    pub value: String,
}

/// Body of `POST /api/hosts/{id}/known`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KnownBody {
    pub known: u8,
}

/// Response of the mutating endpoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => String::new(),
        Some(serde_json::Value::String(s)) => s,
        Some(other) => other.to_string(),
    })
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accepts `0`/`1`, booleans, and numeric strings; anything else is `0`.
fn status_flag<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) if n.as_i64() == Some(1) => 1,
        Some(serde_json::Value::Bool(true)) => 1,
        Some(serde_json::Value::String(s)) if s.trim() == "1" => 1,
        _ => 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_history_payload() {
        let json = r#"{
            "192.168.1.10": {
                "hostname": "nas",
                "events": [
                    { "event_time": "2024-01-01T10:00:00Z", "status": 1 },
                    { "event_time": null, "status": 0 },
                    { "status": 1 }
                ]
            },
            "192.168.1.11": { "hostname": null, "events": null }
        }"#;

        let payload: HistoryPayload = serde_json::from_str(json).unwrap();
        assert_eq!(payload.len(), 2);

        let nas = payload.get("192.168.1.10").unwrap();
        assert_eq!(nas.hostname, "nas");
        assert_eq!(nas.events.len(), 3);
        assert_eq!(nas.events[0].event_time.as_deref(), Some("2024-01-01T10:00:00Z"));
        assert_eq!(nas.events[0].status, 1);
        assert!(nas.events[1].event_time.is_none());
        assert!(nas.events[2].event_time.is_none());

        let bare = payload.get("192.168.1.11").unwrap();
        assert_eq!(bare.hostname, "");
        assert!(bare.events.is_empty());
    }

    #[test]
    fn test_deserialize_host_record_with_nulls() {
        let json = r#"{
            "ip_address": "10.0.0.5",
            "mac_address": "aa:bb:cc:dd:ee:ff",
            "vendor": null,
            "hostname": "",
            "status": "ONLINE",
            "known_host": 1,
            "ports": "22,80",
            "extra_column": 42
        }"#;

        let host: HostRecord = serde_json::from_str(json).unwrap();
        assert_eq!(host.ip_address, "10.0.0.5");
        assert_eq!(host.vendor, "");
        assert_eq!(host.known_host, 1);
        assert_eq!(host.ports, "22,80");
        assert_eq!(host.note, "");
    }

    #[test]
    fn test_status_flag_variants() {
        let events: Vec<EventPayload> = serde_json::from_str(
            r#"[{"status": 1}, {"status": "1"}, {"status": true}, {"status": 2}, {"status": "x"}, {}]"#,
        )
        .unwrap();
        let flags: Vec<u8> = events.iter().map(|e| e.status).collect();
        assert_eq!(flags, vec![1, 1, 1, 0, 0, 0]);
    }

    #[test]
    fn test_action_response_defaults() {
        let resp: ActionResponse = serde_json::from_str(r#"{"message": "History cleared."}"#).unwrap();
        assert!(!resp.success);
        assert_eq!(resp.message.as_deref(), Some("History cleared."));
        assert!(resp.error.is_none());
    }
}
