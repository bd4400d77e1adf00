//! # scanwatch
//!
//! A terminal dashboard for a local network scanner.
//!
//! The scanner backend keeps a table of discovered hosts and a log of when
//! each host went online or offline. This crate talks to its REST API and
//! shows both in an interactive terminal UI: a filterable, editable host
//! table and a per-host timeline of status changes.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Application                          │
//! │  ┌─────────┐    ┌──────────┐    ┌─────────┐    ┌─────────┐  │
//! │  │  app    │───▶│   data   │───▶│   ui    │───▶│ Terminal│  │
//! │  │ (state) │    │(filters, │    │(render) │    │         │  │
//! │  └──┬───┬──┘    │timelines)│    └─────────┘    └─────────┘  │
//! │     │   │       └──────────┘                                │
//! │     │   ▼                                                   │
//! │     │ ┌───────────┐  ┌───────┐                              │
//! │     │ │ scheduler │  │ prefs │◀── theme, columns, intervals │
//! │     │ └───────────┘  └───────┘                              │
//! │     ▼                                                       │
//! │  ┌─────────┐                                                │
//! │  │ source  │◀── HttpBackend | ChannelBackend                │
//! │  │ (API)   │                                                │
//! │  └─────────┘                                                │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`app`]**: Application state, view navigation and user actions
//! - **[`source`]**: The [`Backend`] trait, the reqwest-based [`ApiClient`]
//!   and [`HttpBackend`], and the scripted [`ChannelBackend`]
//! - **[`data`]**: Host filters and column layout, history snapshots, local
//!   date ranges and timeline building
//! - **[`scheduler`]**: Per-view auto-refresh timing with minimum intervals
//! - **[`prefs`]**: Expiring preference storage
//! - **[`config`]**: Layered settings (defaults, TOML file, environment, flags)
//! - **[`ui`]**: Terminal rendering using ratatui
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # Watch a scanner on another machine
//! scanwatch --url http://192.168.1.5:5000
//!
//! # Open on the history view, limited to one morning
//! scanwatch --view history --start 2024-03-10T08:00 --end 2024-03-10T12:00
//!
//! # Export that range to JSON without starting the UI
//! scanwatch --start 2024-03-10T08:00 --export morning.json
//! ```
//!
//! ### Building timelines
//!
//! ```
//! use scanwatch::{build_timeline, DateRange, HostHistory, HostStatus, StatusEvent};
//! use scanwatch::data::parse_event_time;
//!
//! let history = HostHistory::new(
//!     "nas",
//!     vec![
//!         StatusEvent::new(parse_event_time("2024-01-01T10:00:00Z"), HostStatus::Online),
//!         StatusEvent::new(parse_event_time("2024-01-01T11:00:00Z"), HostStatus::Offline),
//!     ],
//! );
//! let timeline = build_timeline(&history, &DateRange::UNBOUNDED);
//! assert_eq!(timeline.segments().len(), 2);
//! assert!(timeline.segments()[0].online);
//! ```
//!
//! ### Driving the app without a network
//!
//! ```
//! use scanwatch::{App, ChannelBackend, Preferences, Request, Response, ThemeName};
//!
//! let (mut handle, backend) = ChannelBackend::create("scripted");
//! let mut app = App::new(Box::new(backend), Preferences::in_memory(), ThemeName::Dark);
//! app.refresh_hosts();
//!
//! let (id, request) = handle.next_request().unwrap();
//! assert_eq!(request, Request::ListHosts);
//! handle.respond(id, request, Ok(Response::Hosts(Vec::new())));
//!
//! app.drain_completions();
//! assert!(!app.is_fetching());
//! ```

pub mod app;
pub mod config;
pub mod data;
pub mod error;
pub mod events;
pub mod prefs;
pub mod scheduler;
pub mod source;
pub mod ui;

// Re-export main types for convenience
pub use app::{App, View};
pub use config::Settings;
pub use data::{
    build_timeline, DateRange, HistorySnapshot, HostColumn, HostFilters, HostHistory, HostStatus,
    StatusEvent, Timeline,
};
pub use error::ApiError;
pub use prefs::{JsonFileStore, MemoryStore, PreferenceStore, Preferences, ThemeName};
pub use scheduler::{RefreshPolicy, RefreshScheduler};
pub use source::{
    ApiClient, Backend, ChannelBackend, ChannelHandle, Completion, HostRecord, HttpBackend,
    Request, Response,
};
