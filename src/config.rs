//! Configuration for Button Bridge
//!
//! The configuration is a YAML document describing which input device to
//! listen to, where the gateway lives, and how key presses map to gateway
//! paths.
//!
//! ## Config File Locations
//!
//! | Source | Path |
//! |--------|------|
//! | `--config` flag | any path |
//! | Working directory | `./config.yaml` |
//! | Linux fallback | `~/.config/button-bridge/config.yaml` |
//!
//! ## Example
//!
//! ```
//! use button_bridge::Config;
//!
//! let config = Config::from_yaml(r#"
//! zone: Kitchen
//! sonosGateway: "http://192.168.1.10:5005/"
//! deviceName: "BT Shutter"
//! bindings:
//!   115:
//!     - len: 8
//!       path: ["next"]
//!     - len: 0
//!       path: ["playpause"]
//! "#).unwrap();
//!
//! assert_eq!(config.action_url("next"), "http://192.168.1.10:5005/Kitchen/next");
//! ```

use crate::bindings::{alternatives, is_alternation};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// File name looked up in the working directory and the user config dir
pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Threshold sentinel marking a continuous (repeat-while-held) binding
pub const CONTINUOUS: i32 = -1;

/// Error type for configuration operations
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error reading the config file
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    /// Failed to parse the YAML document
    #[error("Parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    /// Document parsed but is not usable
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Ordered binding entries per key code
pub type Bindings = BTreeMap<u16, Vec<Press>>;

/// A binding for a keypress.
///
/// Entries for a key are evaluated top to bottom and the first one whose
/// `len` is satisfied wins, so longer holds must be listed first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Press {
    /// Held ticks required before the entry matches, or [`CONTINUOUS`]
    pub len: i32,
    /// Gateway paths fired in order
    pub path: Vec<String>,
}

impl Press {
    pub fn new(len: i32, path: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            len,
            path: path.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_continuous(&self) -> bool {
        self.len == CONTINUOUS
    }
}

/// Main application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Gateway zone (room) the actions are addressed to
    pub zone: String,
    /// Base URL of the gateway, including the trailing slash
    #[serde(rename = "sonosGateway")]
    pub gateway: String,
    /// Exact human-readable name of the input device
    pub device_name: String,
    /// Echo diagnostics to the log sink
    #[serde(default)]
    pub debug: bool,
    /// Key code to ordered binding entries
    #[serde(default)]
    pub bindings: Bindings,
    /// Paths fired once every time the device is (re)acquired
    #[serde(default)]
    pub connected: Vec<String>,
    /// Seconds between config reloads, 0 or less disables reloading
    #[serde(default)]
    pub refresh_config: i64,
    /// Pause between device scans when the device is absent
    #[serde(default = "default_scan_interval_ms")]
    pub scan_interval_ms: u64,
    /// Pause between consecutive connected-signal paths
    #[serde(default = "default_connected_delay_ms")]
    pub connected_delay_ms: u64,
    /// Timeout for a single gateway request
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_scan_interval_ms() -> u64 {
    1000
}

fn default_connected_delay_ms() -> u64 {
    250
}

fn default_request_timeout_secs() -> u64 {
    10
}

impl Config {
    /// Create a config with no bindings and default timings
    pub fn new(
        zone: impl Into<String>,
        gateway: impl Into<String>,
        device_name: impl Into<String>,
    ) -> Self {
        Self {
            zone: zone.into(),
            gateway: gateway.into(),
            device_name: device_name.into(),
            debug: false,
            bindings: Bindings::new(),
            connected: Vec::new(),
            refresh_config: 0,
            scan_interval_ms: default_scan_interval_ms(),
            connected_delay_ms: default_connected_delay_ms(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }

    /// Parse and validate a YAML document.
    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Reject documents the engine cannot act on.
    ///
    /// A config that fails here is never adopted, neither at startup nor on
    /// reload.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.device_name.trim().is_empty() {
            return Err(ConfigError::Invalid("deviceName must not be empty".into()));
        }

        for (code, presses) in &self.bindings {
            for press in presses {
                if press.path.is_empty() {
                    return Err(ConfigError::Invalid(format!(
                        "binding for key {} (len {}) has no path",
                        code, press.len
                    )));
                }
                for path in &press.path {
                    if is_alternation(path) && alternatives(path).next().is_none() {
                        return Err(ConfigError::Invalid(format!(
                            "alternation {:?} for key {} has no choices",
                            path, code
                        )));
                    }
                }
            }
        }

        for path in &self.connected {
            if is_alternation(path) && alternatives(path).next().is_none() {
                return Err(ConfigError::Invalid(format!(
                    "connected alternation {:?} has no choices",
                    path
                )));
            }
        }

        Ok(())
    }

    /// Full gateway URL for a resolved action path
    pub fn action_url(&self, path: &str) -> String {
        format!("{}{}/{}", self.gateway, self.zone, path)
    }

    /// Hot reload interval, `None` when reloading is disabled
    pub fn refresh_interval(&self) -> Option<Duration> {
        u64::try_from(self.refresh_config)
            .ok()
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    pub fn scan_interval(&self) -> Duration {
        Duration::from_millis(self.scan_interval_ms)
    }

    pub fn connected_delay(&self) -> Duration {
        Duration::from_millis(self.connected_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Max log level implied by the `debug` flag
    pub fn log_level(&self) -> log::LevelFilter {
        if self.debug {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Off
        }
    }
}

/// Pick the config file to load.
///
/// An explicit path always wins. Otherwise `./config.yaml` is used, falling
/// back to the user config directory when the local file does not exist.
pub fn resolve_config_path(explicit: Option<PathBuf>) -> PathBuf {
    if let Some(path) = explicit {
        return path;
    }

    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.exists() {
        return local;
    }

    dirs::config_dir()
        .map(|dir| dir.join("button-bridge").join(CONFIG_FILE_NAME))
        .filter(|path| path.exists())
        .unwrap_or(local)
}
