//! Host table model: columns, filters, ordering and layout.

use std::cmp::Ordering;
use std::net::Ipv4Addr;

use crate::source::HostRecord;

/// Placeholder shown when no host survives the filters.
pub const NO_HOSTS_PLACEHOLDER: &str = "No hosts found or matching filters.";

/// Narrowest a column may be resized to, in cells.
pub const MIN_COL_WIDTH: u16 = 4;

/// Columns of the host table, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostColumn {
    Ip,
    Mac,
    Vendor,
    Hostname,
    Known,
    Status,
    Ports,
    Note,
    FirstSeen,
    LastSeenOnline,
    LastUpdated,
}

impl HostColumn {
    /// All columns in display order.
    pub const ALL: [HostColumn; 11] = [
        HostColumn::Ip,
        HostColumn::Mac,
        HostColumn::Vendor,
        HostColumn::Hostname,
        HostColumn::Known,
        HostColumn::Status,
        HostColumn::Ports,
        HostColumn::Note,
        HostColumn::FirstSeen,
        HostColumn::LastSeenOnline,
        HostColumn::LastUpdated,
    ];

    /// Number of columns.
    pub const COUNT: usize = Self::ALL.len();

    /// Position in [`HostColumn::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Returns the column header.
    pub fn title(&self) -> &'static str {
        match self {
            HostColumn::Ip => "IP",
            HostColumn::Mac => "MAC",
            HostColumn::Vendor => "Vendor",
            HostColumn::Hostname => "Hostname",
            HostColumn::Known => "Known",
            HostColumn::Status => "Status",
            HostColumn::Ports => "Ports",
            HostColumn::Note => "Note",
            HostColumn::FirstSeen => "First Seen",
            HostColumn::LastSeenOnline => "Last Seen Online",
            HostColumn::LastUpdated => "Last Updated",
        }
    }

    /// Width in cells before the user resizes anything.
    pub fn default_width(&self) -> u16 {
        match self {
            HostColumn::Ip => 15,
            HostColumn::Mac => 17,
            HostColumn::Vendor => 18,
            HostColumn::Hostname => 16,
            HostColumn::Known => 6,
            HostColumn::Status => 8,
            HostColumn::Ports => 14,
            HostColumn::Note => 18,
            HostColumn::FirstSeen | HostColumn::LastSeenOnline | HostColumn::LastUpdated => 19,
        }
    }

    /// The field this column edits inline, if any.
    pub fn editable_field(&self) -> Option<EditableField> {
        match self {
            HostColumn::Hostname => Some(EditableField::Hostname),
            HostColumn::Note => Some(EditableField::Note),
            _ => None,
        }
    }

    /// Text shown in the cell for `host`.
    ///
    /// Missing values show as `N/D`, except free-text columns which stay blank.
    pub fn value(&self, host: &HostRecord) -> String {
        match self {
            HostColumn::Ip => or_nd(&host.ip_address),
            HostColumn::Mac => or_nd(&host.mac_address),
            HostColumn::Vendor => or_nd(&host.vendor),
            HostColumn::Hostname => host.hostname.clone(),
            HostColumn::Known => (if host.is_known() { "Yes" } else { "No" }).to_string(),
            HostColumn::Status => or_nd(&host.status),
            HostColumn::Ports => host.ports.clone(),
            HostColumn::Note => host.note.clone(),
            HostColumn::FirstSeen => or_nd(&host.first_seen),
            HostColumn::LastSeenOnline => or_nd(&host.last_seen_online),
            HostColumn::LastUpdated => or_nd(&host.last_updated),
        }
    }

    /// Raw value the column's text filter matches against.
    fn raw<'a>(&self, host: &'a HostRecord) -> &'a str {
        match self {
            HostColumn::Ip => &host.ip_address,
            HostColumn::Mac => &host.mac_address,
            HostColumn::Vendor => &host.vendor,
            HostColumn::Hostname => &host.hostname,
            HostColumn::Known => "",
            HostColumn::Status => &host.status,
            HostColumn::Ports => &host.ports,
            HostColumn::Note => &host.note,
            HostColumn::FirstSeen => &host.first_seen,
            HostColumn::LastSeenOnline => &host.last_seen_online,
            HostColumn::LastUpdated => &host.last_updated,
        }
    }
}

fn or_nd(s: &str) -> String {
    if s.is_empty() {
        "N/D".to_string()
    } else {
        s.to_string()
    }
}

/// Host fields the operator may change from the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditableField {
    Hostname,
    Note,
}

impl EditableField {
    /// Name of the field on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            EditableField::Hostname => "hostname",
            EditableField::Note => "note",
        }
    }

    pub fn column(&self) -> HostColumn {
        match self {
            EditableField::Hostname => HostColumn::Hostname,
            EditableField::Note => HostColumn::Note,
        }
    }
}

impl HostRecord {
    pub fn is_known(&self) -> bool {
        self.known_host == 1
    }

    /// Whether the last scan saw the host.
    pub fn is_online(&self) -> bool {
        self.status == "ONLINE"
    }

    pub fn field(&self, field: EditableField) -> &str {
        match field {
            EditableField::Hostname => &self.hostname,
            EditableField::Note => &self.note,
        }
    }

    pub fn set_field(&mut self, field: EditableField, value: String) {
        match field {
            EditableField::Hostname => self.hostname = value,
            EditableField::Note => self.note = value,
        }
    }
}

/// One text filter per column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostFilters {
    values: [String; HostColumn::COUNT],
}

impl HostFilters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, column: HostColumn) -> &str {
        &self.values[column.index()]
    }

    pub fn get_mut(&mut self, column: HostColumn) -> &mut String {
        &mut self.values[column.index()]
    }

    pub fn set(&mut self, column: HostColumn, value: impl Into<String>) {
        self.values[column.index()] = value.into();
    }

    pub fn clear(&mut self) {
        self.values.iter_mut().for_each(String::clear);
    }

    /// True when every filter is blank.
    pub fn is_empty(&self) -> bool {
        self.values.iter().all(|v| v.trim().is_empty())
    }

    /// Whether `host` passes every non-blank filter.
    ///
    /// Text filters are case-insensitive substring matches on the raw
    /// value. The Known filter takes `yes`/`1` or `no`/`0`; any other
    /// text matches nothing.
    pub fn matches(&self, host: &HostRecord) -> bool {
        HostColumn::ALL.iter().all(|column| {
            let needle = self.get(*column).trim().to_lowercase();
            if needle.is_empty() {
                return true;
            }
            match column {
                HostColumn::Known => match needle.as_str() {
                    "yes" | "1" => host.is_known(),
                    "no" | "0" => host.known_host == 0,
                    _ => false,
                },
                _ => column.raw(host).to_lowercase().contains(&needle),
            }
        })
    }
}

/// Hosts passing `filters`, in their original order.
pub fn filter_hosts<'a>(hosts: &'a [HostRecord], filters: &HostFilters) -> Vec<&'a HostRecord> {
    hosts.iter().filter(|h| filters.matches(h)).collect()
}

/// Order host ids numerically when they are IPv4 addresses.
///
/// IPv4 ids come first in numeric order; anything else follows,
/// compared as plain strings.
pub fn compare_host_ids(a: &str, b: &str) -> Ordering {
    match (a.parse::<Ipv4Addr>(), b.parse::<Ipv4Addr>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

/// Widths and visibility of the host table columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnLayout {
    widths: Vec<u16>,
    visible: Vec<bool>,
}

impl Default for ColumnLayout {
    fn default() -> Self {
        Self {
            widths: Self::default_widths(),
            visible: vec![true; HostColumn::COUNT],
        }
    }
}

impl ColumnLayout {
    pub fn default_widths() -> Vec<u16> {
        HostColumn::ALL.iter().map(HostColumn::default_width).collect()
    }

    /// Build a layout from stored values, falling back per part when a
    /// stored value does not fit the table.
    pub fn from_parts(widths: Option<Vec<u16>>, visible: Option<Vec<bool>>) -> Self {
        let mut layout = Self::default();
        if let Some(w) = widths.filter(|w| valid_widths(w)) {
            layout.widths = w;
        }
        if let Some(v) = visible.filter(|v| valid_visibility(v)) {
            layout.visible = v;
        }
        layout
    }

    pub fn widths(&self) -> &[u16] {
        &self.widths
    }

    pub fn visibility(&self) -> &[bool] {
        &self.visible
    }

    pub fn width(&self, column: HostColumn) -> u16 {
        self.widths[column.index()]
    }

    pub fn is_visible(&self, column: HostColumn) -> bool {
        self.visible[column.index()]
    }

    /// Visible columns in display order.
    pub fn visible_columns(&self) -> Vec<HostColumn> {
        HostColumn::ALL
            .iter()
            .copied()
            .filter(|c| self.is_visible(*c))
            .collect()
    }

    /// Grow or shrink a column, never below [`MIN_COL_WIDTH`].
    pub fn resize(&mut self, column: HostColumn, delta: i32) -> u16 {
        let current = i32::from(self.widths[column.index()]);
        let next = (current + delta).clamp(i32::from(MIN_COL_WIDTH), i32::from(u16::MAX));
        let next = u16::try_from(next).unwrap_or(MIN_COL_WIDTH);
        self.widths[column.index()] = next;
        next
    }

    /// Flip a column's visibility. Returns `false` if that would hide the
    /// last visible column, leaving the layout unchanged.
    pub fn toggle(&mut self, column: HostColumn) -> bool {
        let idx = column.index();
        if self.visible[idx] && self.visible.iter().filter(|v| **v).count() == 1 {
            return false;
        }
        self.visible[idx] = !self.visible[idx];
        true
    }
}

/// Stored widths must cover every column and respect the minimum.
pub fn valid_widths(widths: &[u16]) -> bool {
    widths.len() == HostColumn::COUNT && widths.iter().all(|w| *w >= MIN_COL_WIDTH)
}

/// Stored visibility must cover every column and keep one visible.
pub fn valid_visibility(visible: &[bool]) -> bool {
    visible.len() == HostColumn::COUNT && visible.iter().any(|v| *v)
}
