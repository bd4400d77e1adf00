//! Layered configuration.
//!
//! Settings are resolved from, lowest priority first:
//!
//! 1. built-in defaults
//! 2. an optional TOML file (`--config`)
//! 3. environment variables prefixed with `SCANWATCH_`
//! 4. command-line flags
//!
//! ```toml
//! api_url = "http://192.168.1.5:5000"
//! request_timeout = "15s"
//! prefs_path = "/home/me/.config/scanwatch/prefs.json"
//! log_file = "/tmp/scanwatch.log"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;

use crate::data::duration::parse_duration;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_REQUEST_TIMEOUT: &str = "10s";

/// Values given on the command line, which win over everything else.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub api_url: Option<String>,
    pub request_timeout: Option<String>,
    pub prefs_path: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
}

/// Resolved settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    /// Base URL of the scanner backend.
    pub api_url: String,
    /// Per-request timeout, e.g. `10s` or `1500ms`.
    pub request_timeout: String,
    /// Where preferences are saved. Defaults to the user config directory.
    #[serde(default)]
    pub prefs_path: Option<PathBuf>,
    /// Write logs here. No file means no logging.
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT.to_string(),
            prefs_path: None,
            log_file: None,
        }
    }
}

impl Settings {
    /// Resolve settings from defaults, `config_file`, the environment and
    /// `overrides`. A config file that was asked for must exist.
    pub fn load(config_file: Option<&Path>, overrides: &Overrides) -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("api_url", DEFAULT_API_URL)?
            .set_default("request_timeout", DEFAULT_REQUEST_TIMEOUT)?;

        if let Some(path) = config_file {
            builder = builder.add_source(
                File::new(&path.to_string_lossy(), FileFormat::Toml).required(true),
            );
        }

        let config = builder
            .add_source(Environment::with_prefix("SCANWATCH"))
            .set_override_option("api_url", overrides.api_url.clone())?
            .set_override_option("request_timeout", overrides.request_timeout.clone())?
            .set_override_option("prefs_path", path_value(&overrides.prefs_path))?
            .set_override_option("log_file", path_value(&overrides.log_file))?
            .build()
            .context("Failed to load configuration")?;

        let settings: Settings = config
            .try_deserialize()
            .context("Invalid configuration")?;
        settings.request_timeout()?;
        Ok(settings)
    }

    pub fn request_timeout(&self) -> Result<Duration> {
        parse_duration(&self.request_timeout)
            .with_context(|| format!("Invalid request_timeout '{}'", self.request_timeout))
    }

    /// Preference file to use, if any location is available.
    pub fn prefs_path(&self) -> Option<PathBuf> {
        self.prefs_path.clone().or_else(default_prefs_path)
    }
}

fn path_value(path: &Option<PathBuf>) -> Option<String> {
    path.as_ref().map(|p| p.to_string_lossy().into_owned())
}

/// `<config dir>/scanwatch/prefs.json`
pub fn default_prefs_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("scanwatch").join("prefs.json"))
}
