//! Data models and pure transforms for hosts and host history.
//!
//! Nothing in here performs I/O. The [`App`](crate::App) feeds server
//! payloads in and asks for display-ready rows back.
//!
//! ## Submodules
//!
//! - [`duration`]: Parsing and formatting of duration strings (e.g., "10s", "500ms")
//! - [`history`]: The cached history snapshot ([`HistorySnapshot`], [`StatusEvent`])
//! - [`hosts`]: Host table columns, filters and layout ([`HostColumn`], [`ColumnLayout`])
//! - [`range`]: Local wall-clock inputs to UTC bounds ([`DateRange`])
//! - [`timeline`]: Filtered, sorted timelines per host ([`build_timeline`])
//!
//! ## Data Flow
//!
//! ```text
//! GET /api/history (JSON)
//!        │
//!        ▼
//! HistorySnapshot::from_payload()      start/end inputs
//!        │                                    │
//!        │                                    ▼
//!        │                      DateRange::from_local_inputs()
//!        │                                    │
//!        └────────────▶ timeline_rows() ◀─────┘
//!                             │
//!                             ▼
//!                  Vec<TimelineRow> (render / export)
//! ```

pub mod duration;
pub mod history;
pub mod hosts;
pub mod range;
pub mod timeline;

pub use history::{parse_event_time, HistorySnapshot, HostHistory, HostStatus, StatusEvent};
pub use hosts::{
    compare_host_ids, filter_hosts, ColumnLayout, EditableField, HostColumn, HostFilters,
    MIN_COL_WIDTH, NO_HOSTS_PLACEHOLDER,
};
pub use range::{DateRange, Granularity};
pub use timeline::{
    build_timeline, build_timeline_in, timeline_rows, timeline_rows_in, HistoryFilters, Segment,
    Timeline, TimelineRow, NO_EVENTS_PLACEHOLDER, NO_MATCHING_HOSTS_PLACEHOLDER,
};
