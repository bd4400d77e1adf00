//! Persisted UI preferences.
//!
//! Preferences live in named slots, each with its own expiry. The storage
//! mechanism sits behind [`PreferenceStore`]; [`Preferences`] is the typed
//! layer the app talks to. Every read validates the stored value and falls
//! back to the slot's default when it is missing, expired or malformed.
//! Every write is best-effort: a failed save is logged and otherwise
//! ignored.

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, TimeDelta, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::data::hosts::{valid_visibility, valid_widths};
use crate::data::ColumnLayout;
use crate::scheduler::{RefreshPolicy, HISTORY_REFRESH, HOSTS_REFRESH};

pub const THEME_SLOT: &str = "theme";
pub const COLUMN_WIDTHS_SLOT: &str = "column_widths";
pub const COLUMN_VISIBILITY_SLOT: &str = "column_visibility";
pub const HOSTS_REFRESH_SLOT: &str = "refresh_interval_hosts";
pub const HISTORY_REFRESH_SLOT: &str = "refresh_interval_history";

const LONG_EXPIRY_DAYS: i64 = 365;
const WIDTHS_EXPIRY_DAYS: i64 = 30;

/// A stored value and when it stops counting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredValue {
    pub value: Value,
    pub expires_at: DateTime<Utc>,
}

impl StoredValue {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Key-value storage for preference slots.
pub trait PreferenceStore: Send + Debug {
    /// Raw entry for `slot`, expired or not.
    fn get(&self, slot: &str) -> Option<StoredValue>;

    /// Store `entry` under `slot`.
    fn put(&mut self, slot: &str, entry: StoredValue) -> Result<()>;

    /// Forget `slot`.
    fn remove(&mut self, slot: &str) -> Result<()>;
}

/// Preferences kept in memory only. Used when no file is configured, and
/// in tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, StoredValue>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryStore {
    fn get(&self, slot: &str) -> Option<StoredValue> {
        self.entries.get(slot).cloned()
    }

    fn put(&mut self, slot: &str, entry: StoredValue) -> Result<()> {
        self.entries.insert(slot.to_string(), entry);
        Ok(())
    }

    fn remove(&mut self, slot: &str) -> Result<()> {
        self.entries.remove(slot);
        Ok(())
    }
}

/// Preferences stored as one JSON document: `{slot: {value, expires_at}}`.
///
/// The file is read once on open. A missing, unreadable or corrupt file
/// behaves as empty. Each write rewrites the whole document.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: BTreeMap<String, StoredValue>,
}

impl JsonFileStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text).unwrap_or_else(|e| {
                warn!("Ignoring corrupt preferences file {}: {}", path.display(), e);
                BTreeMap::new()
            }),
            Err(e) => {
                debug!("No preferences loaded from {}: {}", path.display(), e);
                BTreeMap::new()
            }
        };
        Self { path, entries }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
        }
        let json = serde_json::to_string_pretty(&self.entries)?;
        fs::write(&self.path, json).with_context(|| format!("writing {}", self.path.display()))
    }
}

impl PreferenceStore for JsonFileStore {
    fn get(&self, slot: &str) -> Option<StoredValue> {
        self.entries.get(slot).cloned()
    }

    fn put(&mut self, slot: &str, entry: StoredValue) -> Result<()> {
        self.entries.insert(slot.to_string(), entry);
        self.flush()
    }

    fn remove(&mut self, slot: &str) -> Result<()> {
        if self.entries.remove(slot).is_some() {
            self.flush()?;
        }
        Ok(())
    }
}

/// Theme names that can be saved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeName {
    Light,
    Dark,
}

impl ThemeName {
    pub fn toggled(self) -> Self {
        match self {
            ThemeName::Light => ThemeName::Dark,
            ThemeName::Dark => ThemeName::Light,
        }
    }
}

/// Typed access to the preference slots.
#[derive(Debug)]
pub struct Preferences {
    store: Box<dyn PreferenceStore>,
}

impl Preferences {
    pub fn new(store: Box<dyn PreferenceStore>) -> Self {
        Self { store }
    }

    /// Preferences that are never written anywhere.
    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryStore::new()))
    }

    /// Saved theme, or `None` to follow the terminal.
    pub fn theme(&self) -> Option<ThemeName> {
        self.load(THEME_SLOT, |_: &ThemeName| true)
    }

    pub fn set_theme(&mut self, theme: ThemeName) {
        self.save(THEME_SLOT, &theme, LONG_EXPIRY_DAYS);
    }

    /// Saved host table layout, part by part falling back to defaults.
    pub fn column_layout(&self) -> ColumnLayout {
        let widths = self.load(COLUMN_WIDTHS_SLOT, |w: &Vec<u16>| valid_widths(w));
        let visible = self.load(COLUMN_VISIBILITY_SLOT, |v: &Vec<bool>| valid_visibility(v));
        ColumnLayout::from_parts(widths, visible)
    }

    pub fn set_column_widths(&mut self, widths: &[u16]) {
        if valid_widths(widths) {
            self.save(COLUMN_WIDTHS_SLOT, &widths, WIDTHS_EXPIRY_DAYS);
        } else {
            warn!("Not saving {} column widths: invalid", widths.len());
        }
    }

    pub fn set_column_visibility(&mut self, visible: &[bool]) {
        if valid_visibility(visible) {
            self.save(COLUMN_VISIBILITY_SLOT, &visible, LONG_EXPIRY_DAYS);
        } else {
            warn!("Not saving column visibility: invalid");
        }
    }

    /// Drop saved widths and visibility.
    pub fn clear_column_layout(&mut self) {
        for slot in [COLUMN_WIDTHS_SLOT, COLUMN_VISIBILITY_SLOT] {
            if let Err(e) = self.store.remove(slot) {
                warn!("Could not clear preference '{}': {:#}", slot, e);
            }
        }
    }

    /// Host table refresh interval in seconds.
    pub fn hosts_refresh_interval(&self) -> u64 {
        self.refresh_interval(HOSTS_REFRESH_SLOT, HOSTS_REFRESH)
    }

    pub fn set_hosts_refresh_interval(&mut self, secs: u64) {
        self.save(HOSTS_REFRESH_SLOT, &secs, LONG_EXPIRY_DAYS);
    }

    /// History view refresh interval in seconds.
    pub fn history_refresh_interval(&self) -> u64 {
        self.refresh_interval(HISTORY_REFRESH_SLOT, HISTORY_REFRESH)
    }

    pub fn set_history_refresh_interval(&mut self, secs: u64) {
        self.save(HISTORY_REFRESH_SLOT, &secs, LONG_EXPIRY_DAYS);
    }

    fn refresh_interval(&self, slot: &str, policy: RefreshPolicy) -> u64 {
        self.load(slot, |secs: &u64| policy.is_valid(*secs))
            .unwrap_or(policy.default_secs)
    }

    fn load<T, F>(&self, slot: &str, valid: F) -> Option<T>
    where
        T: DeserializeOwned,
        F: Fn(&T) -> bool,
    {
        self.load_at(slot, Utc::now(), valid)
    }

    fn load_at<T, F>(&self, slot: &str, now: DateTime<Utc>, valid: F) -> Option<T>
    where
        T: DeserializeOwned,
        F: Fn(&T) -> bool,
    {
        let entry = self.store.get(slot)?;
        if entry.is_expired(now) {
            debug!("Preference '{}' expired at {}", slot, entry.expires_at);
            return None;
        }
        match serde_json::from_value::<T>(entry.value) {
            Ok(value) if valid(&value) => Some(value),
            Ok(_) => {
                debug!("Preference '{}' out of range, using default", slot);
                None
            }
            Err(e) => {
                debug!("Preference '{}' malformed ({}), using default", slot, e);
                None
            }
        }
    }

    fn save<T: Serialize>(&mut self, slot: &str, value: &T, expiry_days: i64) {
        let value = match serde_json::to_value(value) {
            Ok(v) => v,
            Err(e) => {
                warn!("Could not encode preference '{}': {}", slot, e);
                return;
            }
        };
        let entry = StoredValue {
            value,
            expires_at: Utc::now() + TimeDelta::days(expiry_days),
        };
        if let Err(e) = self.store.put(slot, entry) {
            warn!("Could not save preference '{}': {:#}", slot, e);
        }
    }
}
