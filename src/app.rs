//! Application state and navigation logic.
//!
//! [`App`] owns everything the dashboard knows: both views' cached data,
//! their filters and refresh schedulers, pending actions and transient UI
//! state. Requests go out through a [`Backend`] and come back as
//! [`Completion`]s, applied in arrival order by [`App::drain_completions`].

use std::collections::HashSet;
use std::path::Path;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::data::{
    filter_hosts, timeline_rows, ColumnLayout, DateRange, EditableField, HistoryFilters,
    HistorySnapshot, HostColumn, HostFilters, TimelineRow,
};
use crate::error::ApiError;
use crate::prefs::{Preferences, ThemeName};
use crate::scheduler::{RefreshScheduler, HISTORY_REFRESH, HOSTS_REFRESH};
use crate::source::{Backend, Completion, HostRecord, Request, Response};
use crate::ui::Theme;

/// How long a status bar message stays up.
const STATUS_MESSAGE_TTL: Duration = Duration::from_secs(4);

/// The current view/tab in the TUI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// Table of discovered hosts.
    Hosts,
    /// Online/offline timeline per host.
    History,
}

impl View {
    /// Cycle to the next view.
    pub fn next(self) -> Self {
        match self {
            View::Hosts => View::History,
            View::History => View::Hosts,
        }
    }

    /// Cycle to the previous view.
    pub fn prev(self) -> Self {
        // Two views, so previous and next coincide.
        self.next()
    }

    /// Returns the display label for this view.
    pub fn label(&self) -> &'static str {
        match self {
            View::Hosts => "Hosts",
            View::History => "History",
        }
    }
}

/// Fields of the history filter bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryField {
    Ip,
    Hostname,
    Start,
    End,
}

impl HistoryField {
    pub const ALL: [HistoryField; 4] = [
        HistoryField::Ip,
        HistoryField::Hostname,
        HistoryField::Start,
        HistoryField::End,
    ];

    pub fn next(self) -> Self {
        match self {
            HistoryField::Ip => HistoryField::Hostname,
            HistoryField::Hostname => HistoryField::Start,
            HistoryField::Start => HistoryField::End,
            HistoryField::End => HistoryField::Ip,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            HistoryField::Ip => "IP",
            HistoryField::Hostname => "Hostname",
            HistoryField::Start => "From",
            HistoryField::End => "To",
        }
    }
}

/// What keystrokes currently go to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    /// Typing into the selected host column's filter.
    HostFilter,
    /// Typing into one of the history filters.
    HistoryFilter(HistoryField),
    /// Typing a refresh interval for the current view.
    Interval,
    /// Editing a host field inline.
    Edit,
}

/// A control that is disabled while its request is in flight.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Control {
    Field { ip: String, field: EditableField },
    Known { ip: String },
    DeleteHost { ip: String },
    DeleteHistory { ip: String },
    DeleteAllHistory,
}

impl Control {
    /// The control a request was issued from. Fetches have none.
    pub fn for_request(request: &Request) -> Option<Control> {
        match request {
            Request::ListHosts | Request::FetchHistory => None,
            Request::UpdateField { ip, field, .. } => Some(Control::Field {
                ip: ip.clone(),
                field: *field,
            }),
            Request::SetKnown { ip, .. } => Some(Control::Known { ip: ip.clone() }),
            Request::DeleteHost { ip } => Some(Control::DeleteHost { ip: ip.clone() }),
            Request::DeleteHistory { ip } => Some(Control::DeleteHistory { ip: ip.clone() }),
            Request::DeleteAllHistory => Some(Control::DeleteAllHistory),
        }
    }
}

/// A destructive action waiting for the user to say yes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confirm {
    DeleteHost { ip: String },
    DeleteHistory { ip: String },
    DeleteAllHistory,
}

impl Confirm {
    pub fn prompt(&self) -> String {
        match self {
            Confirm::DeleteHost { ip } => format!("Confirm delete host {}?", ip),
            Confirm::DeleteHistory { ip } => {
                format!("Delete ALL history for host {}? This cannot be undone.", ip)
            }
            Confirm::DeleteAllHistory => {
                "Delete ALL host history entries? This action CANNOT be undone!".to_string()
            }
        }
    }

    fn request(&self) -> Request {
        match self {
            Confirm::DeleteHost { ip } => Request::DeleteHost { ip: ip.clone() },
            Confirm::DeleteHistory { ip } => Request::DeleteHistory { ip: ip.clone() },
            Confirm::DeleteAllHistory => Request::DeleteAllHistory,
        }
    }
}

/// An inline edit in progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditState {
    pub ip: String,
    pub field: EditableField,
    pub original: String,
    pub buffer: String,
}

/// Where the data on screen last changed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// A fetch replaced the data.
    Server(DateTime<Local>),
    /// Only the local view changed (filters, a delete).
    Filter(DateTime<Local>),
}

impl Freshness {
    pub fn describe(&self) -> String {
        match self {
            Freshness::Server(t) => format!("Server data updated at {}", t.format("%X")),
            Freshness::Filter(t) => format!("Filter applied at {}", t.format("%X")),
        }
    }
}

/// State of the host table view.
#[derive(Debug)]
pub struct HostsPane {
    pub records: Vec<HostRecord>,
    /// Replaces the table when the last fetch failed.
    pub error: Option<String>,
    pub filters: HostFilters,
    pub selected: usize,
    /// Column targeted by filter, edit and resize keys.
    pub selected_column: HostColumn,
    pub layout: ColumnLayout,
    pub scheduler: RefreshScheduler,
    /// Interval as displayed (and typed) by the user.
    pub interval_input: String,
    pub freshness: Option<Freshness>,
    /// Column picker cursor, when the picker is open.
    pub column_menu: Option<usize>,
}

impl HostsPane {
    /// Records passing the current filters, in server order.
    pub fn visible(&self) -> Vec<&HostRecord> {
        filter_hosts(&self.records, &self.filters)
    }

    pub fn selected_record(&self) -> Option<&HostRecord> {
        self.visible().get(self.selected).copied()
    }

    fn record_mut(&mut self, ip: &str) -> Option<&mut HostRecord> {
        self.records.iter_mut().find(|h| h.ip_address == ip)
    }
}

/// State of the history view.
#[derive(Debug)]
pub struct HistoryPane {
    /// Full, unfiltered data from the last successful fetch.
    pub snapshot: HistorySnapshot,
    /// Replaces the timelines when the last fetch failed.
    pub error: Option<String>,
    pub filters: HistoryFilters,
    pub selected: usize,
    pub scheduler: RefreshScheduler,
    pub interval_input: String,
    pub freshness: Option<Freshness>,
}

impl HistoryPane {
    /// Rows for the current filters, in IP order.
    pub fn rows(&self) -> Vec<TimelineRow> {
        timeline_rows(&self.snapshot, &self.filters)
    }

    pub fn range(&self) -> DateRange {
        self.filters.date_range()
    }

    pub fn selected_ip(&self) -> Option<String> {
        self.rows().into_iter().nth(self.selected).map(|r| r.ip)
    }
}

/// Main application state.
pub struct App {
    pub running: bool,
    pub current_view: View,
    pub show_help: bool,

    backend: Box<dyn Backend>,
    prefs: Preferences,

    pub hosts: HostsPane,
    pub history: HistoryPane,

    pending: HashSet<Control>,
    fetches_in_flight: usize,

    pub input: InputMode,
    pub edit: Option<EditState>,
    pub confirm: Option<Confirm>,

    // UI
    pub theme_name: ThemeName,
    pub theme: Theme,

    // Status message (temporary feedback)
    pub status_message: Option<(String, Instant)>,
}

impl App {
    /// Create an app talking to `backend`, restoring settings from `prefs`.
    ///
    /// `default_theme` is used when no theme was saved.
    pub fn new(backend: Box<dyn Backend>, prefs: Preferences, default_theme: ThemeName) -> Self {
        let theme_name = prefs.theme().unwrap_or(default_theme);
        let hosts_interval = prefs.hosts_refresh_interval();
        let history_interval = prefs.history_refresh_interval();
        let layout = prefs.column_layout();

        Self {
            running: true,
            current_view: View::Hosts,
            show_help: false,
            backend,
            prefs,
            hosts: HostsPane {
                records: Vec::new(),
                error: None,
                filters: HostFilters::new(),
                selected: 0,
                selected_column: HostColumn::Ip,
                layout,
                scheduler: RefreshScheduler::new("hosts", HOSTS_REFRESH, hosts_interval),
                interval_input: hosts_interval.to_string(),
                freshness: None,
                column_menu: None,
            },
            history: HistoryPane {
                snapshot: HistorySnapshot::new(),
                error: None,
                filters: HistoryFilters::default(),
                selected: 0,
                scheduler: RefreshScheduler::new("history", HISTORY_REFRESH, history_interval),
                interval_input: history_interval.to_string(),
                freshness: None,
            },
            pending: HashSet::new(),
            fetches_in_flight: 0,
            input: InputMode::Normal,
            edit: None,
            confirm: None,
            theme_name,
            theme: Theme::from_name(theme_name),
            status_message: None,
        }
    }

    /// Returns a description of the backend.
    pub fn source_description(&self) -> &str {
        self.backend.description()
    }

    /// Set a temporary status message that will be shown for a few seconds.
    pub fn set_status_message(&mut self, message: String) {
        self.status_message = Some((message, Instant::now()));
    }

    /// Get the current status message if it hasn't expired.
    pub fn get_status_message(&self) -> Option<&str> {
        if let Some((msg, time)) = &self.status_message {
            if time.elapsed() < STATUS_MESSAGE_TTL {
                return Some(msg);
            }
        }
        None
    }

    // --- Requests and completions ---

    /// Initial load: fetch both views once.
    pub fn start(&mut self) {
        self.refresh_hosts();
        self.refresh_history();
    }

    pub fn refresh_hosts(&mut self) {
        debug!("Fetching hosts");
        self.fetches_in_flight += 1;
        self.backend.dispatch(Request::ListHosts);
    }

    pub fn refresh_history(&mut self) {
        debug!("Fetching history");
        self.fetches_in_flight += 1;
        self.backend.dispatch(Request::FetchHistory);
    }

    /// Fetch the data behind the current view.
    pub fn refresh(&mut self) {
        match self.current_view {
            View::Hosts => self.refresh_hosts(),
            View::History => self.refresh_history(),
        }
    }

    /// Whether any fetch is still outstanding.
    pub fn is_fetching(&self) -> bool {
        self.fetches_in_flight > 0
    }

    /// Whether `control` is waiting on its request.
    pub fn is_pending(&self, control: &Control) -> bool {
        self.pending.contains(control)
    }

    /// Send an action request unless its control is already busy.
    fn dispatch_action(&mut self, request: Request) -> bool {
        let Some(control) = Control::for_request(&request) else {
            return false;
        };
        if !self.pending.insert(control) {
            debug!("Ignoring {}: already in flight", request);
            return false;
        }
        info!("{}", request);
        self.backend.dispatch(request);
        true
    }

    /// Run one loop iteration: apply finished requests, then start any
    /// refresh that is due.
    pub fn tick(&mut self, now: Instant) {
        self.drain_completions();
        if self.hosts.scheduler.tick(now) {
            self.refresh_hosts();
        }
        if self.history.scheduler.tick(now) {
            self.refresh_history();
        }
    }

    /// Apply every completion the backend has ready, in arrival order.
    pub fn drain_completions(&mut self) -> usize {
        let mut applied = 0;
        while let Some(completion) = self.backend.poll() {
            self.apply_completion(completion);
            applied += 1;
        }
        applied
    }

    fn apply_completion(&mut self, completion: Completion) {
        let Completion { request, result, .. } = completion;
        if let Some(control) = Control::for_request(&request) {
            self.pending.remove(&control);
        }

        match request {
            Request::ListHosts => {
                self.fetches_in_flight = self.fetches_in_flight.saturating_sub(1);
                self.apply_hosts(result);
            }
            Request::FetchHistory => {
                self.fetches_in_flight = self.fetches_in_flight.saturating_sub(1);
                self.apply_history(result);
            }
            Request::UpdateField { ip, field, value } => match result {
                Ok(_) => {
                    info!("Updated {} for {}", field.as_str(), ip);
                    if let Some(host) = self.hosts.record_mut(&ip) {
                        host.set_field(field, value);
                    }
                }
                Err(e) => self.action_failed(format!("Save error: {}", e)),
            },
            Request::SetKnown { ip, known } => match result {
                Ok(_) => {
                    info!("Known flag for {} set to {}", ip, u8::from(known));
                    if let Some(host) = self.hosts.record_mut(&ip) {
                        host.known_host = u8::from(known);
                    }
                }
                Err(e) => self.action_failed(format!("DB Error: {}", e)),
            },
            Request::DeleteHost { ip } => match result {
                Ok(_) => {
                    info!("Host {} deleted", ip);
                    self.hosts.records.retain(|h| h.ip_address != ip);
                    self.clamp_host_selection();
                    self.hosts.freshness = Some(Freshness::Filter(Local::now()));
                }
                Err(e) => self.action_failed(format!("Deletion error: {}", e)),
            },
            Request::DeleteHistory { ip } => match result {
                Ok(_) => {
                    info!("History for {} deleted", ip);
                    self.history.snapshot.remove(&ip);
                    self.clamp_history_selection();
                    self.history.freshness = Some(Freshness::Filter(Local::now()));
                    self.set_status_message(format!("History for {} deleted", ip));
                }
                Err(e) => {
                    self.action_failed(format!("Error deleting history for {}: {}", ip, e))
                }
            },
            Request::DeleteAllHistory => match result {
                Ok(response) => {
                    info!("All history cleared");
                    self.history.snapshot.clear();
                    self.history.selected = 0;
                    self.history.freshness = Some(Freshness::Filter(Local::now()));
                    let message = match response {
                        Response::Action(a) => a.message.unwrap_or_else(|| "History cleared".into()),
                        _ => "History cleared".to_string(),
                    };
                    self.set_status_message(format!("Success: {}", message));
                }
                Err(e) => self.action_failed(format!("Error clearing history: {}", e)),
            },
        }
    }

    fn apply_hosts(&mut self, result: Result<Response, ApiError>) {
        match result {
            Ok(Response::Hosts(records)) => {
                info!("Fetched {} hosts", records.len());
                self.hosts.records = records;
                self.hosts.error = None;
                self.hosts.freshness = Some(Freshness::Server(Local::now()));
                self.clamp_host_selection();
            }
            Ok(_) => self.hosts_failed(ApiError::Malformed("expected a host list".into())),
            Err(e) => self.hosts_failed(e),
        }
    }

    fn hosts_failed(&mut self, err: ApiError) {
        warn!("Host fetch failed: {}", err);
        self.hosts.records.clear();
        self.hosts.selected = 0;
        self.hosts.error = Some(format!("Error loading data: {}", err));
    }

    fn apply_history(&mut self, result: Result<Response, ApiError>) {
        match result {
            Ok(Response::History(payload)) => {
                info!("Fetched history for {} hosts", payload.len());
                self.history.snapshot.replace(HistorySnapshot::from_payload(payload));
                self.history.error = None;
                self.history.freshness = Some(Freshness::Server(Local::now()));
                self.clamp_history_selection();
            }
            Ok(_) => self.history_failed(ApiError::Malformed("expected host histories".into())),
            Err(e) => self.history_failed(e),
        }
    }

    fn history_failed(&mut self, err: ApiError) {
        warn!("History fetch failed: {}", err);
        self.history.snapshot.clear();
        self.history.selected = 0;
        self.history.error = Some(format!("Error loading history: {}", err));
    }

    fn action_failed(&mut self, message: String) {
        warn!("{}", message);
        self.set_status_message(message);
    }

    // --- Auto-refresh ---

    fn scheduler_mut(&mut self) -> &mut RefreshScheduler {
        match self.current_view {
            View::Hosts => &mut self.hosts.scheduler,
            View::History => &mut self.history.scheduler,
        }
    }

    pub fn scheduler(&self) -> &RefreshScheduler {
        match self.current_view {
            View::Hosts => &self.hosts.scheduler,
            View::History => &self.history.scheduler,
        }
    }

    /// Turn the current view's auto-refresh on or off. Turning it on
    /// fetches right away.
    pub fn toggle_auto_refresh(&mut self, now: Instant) {
        let scheduler = self.scheduler_mut();
        if scheduler.is_running() {
            scheduler.disable();
            self.set_status_message("Auto-refresh off".to_string());
        } else {
            scheduler.enable(now);
            let secs = scheduler.interval_secs();
            self.set_status_message(format!("Auto-refresh every {}s", secs));
            self.tick(now);
        }
    }

    /// The interval field of the current view.
    pub fn interval_input(&self) -> &str {
        match self.current_view {
            View::Hosts => &self.hosts.interval_input,
            View::History => &self.history.interval_input,
        }
    }

    fn interval_input_mut(&mut self) -> &mut String {
        match self.current_view {
            View::Hosts => &mut self.hosts.interval_input,
            View::History => &mut self.history.interval_input,
        }
    }

    pub fn start_interval_input(&mut self) {
        self.interval_input_mut().clear();
        self.input = InputMode::Interval;
    }

    /// Leave interval input, showing the interval in effect again.
    pub fn cancel_interval_input(&mut self) {
        let secs = self.scheduler().interval_secs();
        *self.interval_input_mut() = secs.to_string();
        self.input = InputMode::Normal;
    }

    pub fn interval_push(&mut self, c: char) {
        if c.is_ascii_digit() {
            self.interval_input_mut().push(c);
        }
    }

    pub fn interval_pop(&mut self) {
        self.interval_input_mut().pop();
    }

    /// Apply the typed interval to the current view.
    ///
    /// Values under the view's minimum are raised to it, and the field is
    /// rewritten to show what took effect. Returns the effective interval.
    pub fn commit_interval_input(&mut self, now: Instant) -> u64 {
        self.input = InputMode::Normal;
        let typed = self.interval_input().to_string();
        let policy = self.scheduler().policy();
        let secs = policy.parse_input(&typed);

        let effective = self.scheduler_mut().set_interval(secs, now);
        *self.interval_input_mut() = effective.to_string();

        match self.current_view {
            View::Hosts => self.prefs.set_hosts_refresh_interval(effective),
            View::History => self.prefs.set_history_refresh_interval(effective),
        }

        if typed.trim() != effective.to_string() {
            self.set_status_message(format!(
                "Refresh interval set to {}s (allowed {}s to {}s)",
                effective, policy.min_secs, policy.max_secs
            ));
        }

        // A running schedule restarted and is due now.
        self.tick(now);
        effective
    }

    // --- Navigation ---

    /// Switch to the next view.
    pub fn next_view(&mut self) {
        self.current_view = self.current_view.next();
    }

    /// Switch to the previous view.
    pub fn prev_view(&mut self) {
        self.current_view = self.current_view.prev();
    }

    /// Switch to a specific view.
    pub fn set_view(&mut self, view: View) {
        self.current_view = view;
    }

    fn row_count(&self) -> usize {
        match self.current_view {
            View::Hosts => self.hosts.visible().len(),
            View::History => self.history.rows().len(),
        }
    }

    fn selected_mut(&mut self) -> &mut usize {
        match self.current_view {
            View::Hosts => &mut self.hosts.selected,
            View::History => &mut self.history.selected,
        }
    }

    /// Move selection down by one item.
    pub fn select_next(&mut self) {
        self.select_next_n(1);
    }

    /// Move selection up by one item.
    pub fn select_prev(&mut self) {
        self.select_prev_n(1);
    }

    /// Move selection down by n items.
    pub fn select_next_n(&mut self, n: usize) {
        let max = self.row_count().saturating_sub(1);
        let selected = self.selected_mut();
        *selected = (*selected + n).min(max);
    }

    /// Move selection up by n items.
    pub fn select_prev_n(&mut self, n: usize) {
        let selected = self.selected_mut();
        *selected = selected.saturating_sub(n);
    }

    /// Jump to the first item in the list.
    pub fn select_first(&mut self) {
        *self.selected_mut() = 0;
    }

    /// Jump to the last item in the list.
    pub fn select_last(&mut self) {
        let last = self.row_count().saturating_sub(1);
        *self.selected_mut() = last;
    }

    /// Select a row by its position on screen, if it exists.
    pub fn select_row(&mut self, row: usize) {
        if row < self.row_count() {
            *self.selected_mut() = row;
        }
    }

    fn clamp_host_selection(&mut self) {
        let max = self.hosts.visible().len().saturating_sub(1);
        self.hosts.selected = self.hosts.selected.min(max);
    }

    fn clamp_history_selection(&mut self) {
        let max = self.history.rows().len().saturating_sub(1);
        self.history.selected = self.history.selected.min(max);
    }

    /// Move the column cursor among visible columns.
    pub fn select_next_column(&mut self) {
        self.step_column(1);
    }

    pub fn select_prev_column(&mut self) {
        self.step_column(-1);
    }

    fn step_column(&mut self, step: isize) {
        let visible = self.hosts.layout.visible_columns();
        if visible.is_empty() {
            return;
        }
        let pos = visible
            .iter()
            .position(|c| *c == self.hosts.selected_column)
            .unwrap_or(0) as isize;
        let len = visible.len() as isize;
        let next = (pos + step).rem_euclid(len) as usize;
        self.hosts.selected_column = visible[next];
    }

    /// Toggle the help overlay.
    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    // --- Filters ---

    /// Enter filter input mode for the current view.
    pub fn start_filter(&mut self) {
        self.input = match self.current_view {
            View::Hosts => InputMode::HostFilter,
            View::History => InputMode::HistoryFilter(HistoryField::Ip),
        };
    }

    /// Move to the next history filter field.
    pub fn next_filter_field(&mut self) {
        if let InputMode::HistoryFilter(field) = self.input {
            self.input = InputMode::HistoryFilter(field.next());
        }
    }

    /// Exit filter input mode, keeping the text.
    pub fn cancel_filter(&mut self) {
        self.input = InputMode::Normal;
    }

    /// Clear every filter of the current view and exit filter mode.
    pub fn clear_filter(&mut self) {
        match self.current_view {
            View::Hosts => {
                self.hosts.filters.clear();
                self.clamp_host_selection();
            }
            View::History => {
                self.history.filters = HistoryFilters::default();
                self.filter_applied();
            }
        }
        self.input = InputMode::Normal;
    }

    fn active_filter_text(&mut self) -> Option<&mut String> {
        match self.input {
            InputMode::HostFilter => Some(self.hosts.filters.get_mut(self.hosts.selected_column)),
            InputMode::HistoryFilter(field) => Some(match field {
                HistoryField::Ip => &mut self.history.filters.ip,
                HistoryField::Hostname => &mut self.history.filters.hostname,
                HistoryField::Start => &mut self.history.filters.start,
                HistoryField::End => &mut self.history.filters.end,
            }),
            _ => None,
        }
    }

    /// Text of the filter being typed into.
    pub fn filter_text(&self) -> Option<&str> {
        match self.input {
            InputMode::HostFilter => Some(self.hosts.filters.get(self.hosts.selected_column)),
            InputMode::HistoryFilter(field) => Some(self.history_filter(field)),
            _ => None,
        }
    }

    pub fn history_filter(&self, field: HistoryField) -> &str {
        match field {
            HistoryField::Ip => &self.history.filters.ip,
            HistoryField::Hostname => &self.history.filters.hostname,
            HistoryField::Start => &self.history.filters.start,
            HistoryField::End => &self.history.filters.end,
        }
    }

    /// Append a character to the active filter.
    pub fn filter_push(&mut self, c: char) {
        if let Some(text) = self.active_filter_text() {
            text.push(c);
            self.filter_changed();
        }
    }

    /// Remove the last character from the active filter.
    pub fn filter_pop(&mut self) {
        if let Some(text) = self.active_filter_text() {
            text.pop();
            self.filter_changed();
        }
    }

    fn filter_changed(&mut self) {
        match self.current_view {
            View::Hosts => {
                self.clamp_host_selection();
                self.hosts.freshness = Some(Freshness::Filter(Local::now()));
            }
            View::History => self.filter_applied(),
        }
    }

    fn filter_applied(&mut self) {
        self.clamp_history_selection();
        self.history.freshness = Some(Freshness::Filter(Local::now()));
    }

    // --- Host actions ---

    /// Begin editing the selected cell, if it is editable.
    ///
    /// Only one edit can be open at a time, and not while the same field
    /// is still saving.
    pub fn start_edit(&mut self) -> bool {
        if self.edit.is_some() {
            return false;
        }
        let Some(field) = self.hosts.selected_column.editable_field() else {
            self.set_status_message("Only Hostname and Note can be edited".to_string());
            return false;
        };
        let Some(host) = self.hosts.selected_record() else {
            return false;
        };
        let control = Control::Field {
            ip: host.ip_address.clone(),
            field,
        };
        if self.is_pending(&control) {
            return false;
        }

        let original = host.field(field).to_string();
        self.edit = Some(EditState {
            ip: host.ip_address.clone(),
            field,
            buffer: original.clone(),
            original,
        });
        self.input = InputMode::Edit;
        true
    }

    pub fn edit_push(&mut self, c: char) {
        if let Some(edit) = self.edit.as_mut() {
            edit.buffer.push(c);
        }
    }

    pub fn edit_pop(&mut self) {
        if let Some(edit) = self.edit.as_mut() {
            edit.buffer.pop();
        }
    }

    pub fn cancel_edit(&mut self) {
        self.edit = None;
        self.input = InputMode::Normal;
    }

    /// Finish the open edit. Sends an update only if the trimmed value
    /// differs from what was there.
    pub fn commit_edit(&mut self) -> bool {
        self.input = InputMode::Normal;
        let Some(edit) = self.edit.take() else {
            return false;
        };
        let value = edit.buffer.trim().to_string();
        if value == edit.original {
            return false;
        }
        self.dispatch_action(Request::UpdateField {
            ip: edit.ip,
            field: edit.field,
            value,
        })
    }

    /// Flip the known flag of the selected host.
    pub fn toggle_known(&mut self) -> bool {
        let Some(host) = self.hosts.selected_record() else {
            return false;
        };
        let request = Request::SetKnown {
            ip: host.ip_address.clone(),
            known: !host.is_known(),
        };
        self.dispatch_action(request)
    }

    /// Ask before deleting the selected host.
    pub fn request_delete_host(&mut self) {
        if let Some(host) = self.hosts.selected_record() {
            let ip = host.ip_address.clone();
            if !self.is_pending(&Control::DeleteHost { ip: ip.clone() }) {
                self.confirm = Some(Confirm::DeleteHost { ip });
            }
        }
    }

    /// Ask before deleting the selected host's history.
    pub fn request_delete_history(&mut self) {
        if let Some(ip) = self.history.selected_ip() {
            if !self.is_pending(&Control::DeleteHistory { ip: ip.clone() }) {
                self.confirm = Some(Confirm::DeleteHistory { ip });
            }
        }
    }

    /// Ask before wiping all history.
    pub fn request_delete_all_history(&mut self) {
        if !self.is_pending(&Control::DeleteAllHistory) {
            self.confirm = Some(Confirm::DeleteAllHistory);
        }
    }

    /// Carry out the action waiting for confirmation.
    pub fn confirm_yes(&mut self) -> bool {
        match self.confirm.take() {
            Some(confirm) => self.dispatch_action(confirm.request()),
            None => false,
        }
    }

    pub fn confirm_no(&mut self) {
        self.confirm = None;
    }

    // --- Columns ---

    /// Widen or narrow the selected column and save the layout.
    pub fn resize_selected_column(&mut self, delta: i32) {
        let column = self.hosts.selected_column;
        let width = self.hosts.layout.resize(column, delta);
        debug!("Column {} resized to {}", column.title(), width);
        self.prefs.set_column_widths(self.hosts.layout.widths());
    }

    /// Show or hide a column and save the layout.
    pub fn toggle_column(&mut self, column: HostColumn) {
        if !self.hosts.layout.toggle(column) {
            self.set_status_message("At least one column must stay visible".to_string());
            return;
        }
        if !self.hosts.layout.is_visible(self.hosts.selected_column) {
            if let Some(first) = self.hosts.layout.visible_columns().first() {
                self.hosts.selected_column = *first;
            }
        }
        self.prefs.set_column_visibility(self.hosts.layout.visibility());
    }

    /// Restore default widths and visibility.
    pub fn reset_columns(&mut self) {
        self.hosts.layout = ColumnLayout::default();
        self.prefs.clear_column_layout();
        self.set_status_message("Column layout reset".to_string());
    }

    pub fn open_column_menu(&mut self) {
        self.hosts.column_menu = Some(self.hosts.selected_column.index());
    }

    pub fn close_column_menu(&mut self) {
        self.hosts.column_menu = None;
    }

    pub fn column_menu_step(&mut self, step: isize) {
        if let Some(cursor) = self.hosts.column_menu.as_mut() {
            let len = HostColumn::COUNT as isize;
            *cursor = (*cursor as isize + step).rem_euclid(len) as usize;
        }
    }

    pub fn column_menu_toggle(&mut self) {
        if let Some(column) = self.hosts.column_menu.and_then(HostColumn::from_index) {
            self.toggle_column(column);
        }
    }

    // --- Misc ---

    /// Switch between light and dark and remember the choice.
    pub fn toggle_theme(&mut self) {
        self.theme_name = self.theme_name.toggled();
        self.theme = Theme::from_name(self.theme_name);
        self.prefs.set_theme(self.theme_name);
    }

    /// Quit the application.
    pub fn quit(&mut self) {
        self.running = false;
    }

    /// Write the history view as currently filtered to a JSON file.
    pub fn export_history(&self, path: &Path) -> anyhow::Result<()> {
        let doc = HistoryExport::new(self.history.range(), self.history.rows());
        std::fs::write(path, serde_json::to_string_pretty(&doc)?)?;
        Ok(())
    }
}

/// JSON document written by history exports.
#[derive(Debug, Serialize)]
pub struct HistoryExport {
    pub generated_at: DateTime<Utc>,
    pub range_start: Option<DateTime<Utc>>,
    pub range_end: Option<DateTime<Utc>>,
    pub hosts: Vec<TimelineRow>,
}

impl HistoryExport {
    pub fn new(range: DateRange, hosts: Vec<TimelineRow>) -> Self {
        Self {
            generated_at: Utc::now(),
            range_start: range.start,
            range_end: range.end,
            hosts,
        }
    }
}
