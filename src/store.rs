//! Shared configuration snapshot with hot reload
//!
//! Readers grab an `Arc<Config>` and keep using it for as long as they need a
//! consistent view. A reload builds a complete new `Config` off to the side
//! and only then swaps the pointer, so a reader sees either the old document
//! or the new one, never a mix.

use crate::config::{Config, ConfigError};
use arc_swap::ArcSwap;
use log::{debug, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Holds the current config snapshot and where it came from
#[derive(Debug)]
pub struct ConfigStore {
    path: PathBuf,
    current: ArcSwap<Config>,
}

impl ConfigStore {
    /// Load the initial snapshot. Failure here is fatal to the caller.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let config = Config::load_from(&path)?;
        Ok(Self::with_config(path, config))
    }

    /// Wrap an already loaded config
    pub fn with_config(path: impl Into<PathBuf>, config: Config) -> Self {
        Self {
            path: path.into(),
            current: ArcSwap::from_pointee(config),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current snapshot, taken without locking
    pub fn current(&self) -> Arc<Config> {
        self.current.load_full()
    }

    /// Re-read the file and publish it.
    ///
    /// On any error the previous snapshot stays in effect.
    pub fn reload(&self) -> Result<Arc<Config>, ConfigError> {
        let config = Arc::new(Config::load_from(&self.path)?);
        self.current.store(Arc::clone(&config));
        Ok(config)
    }

    /// Publish a snapshot directly
    pub fn replace(&self, config: Config) {
        self.current.store(Arc::new(config));
    }

    /// Start the periodic reload thread.
    ///
    /// The interval is taken from the snapshot current at call time; returns
    /// `None` when reloading is disabled.
    pub fn spawn_refresh(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        let interval = self.current().refresh_interval()?;
        let store = Arc::clone(self);

        let handle = thread::Builder::new()
            .name("config-refresh".into())
            .spawn(move || loop {
                thread::sleep(interval);
                store.refresh();
            });

        match handle {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!("CONFIG_ERR could not start refresh thread: {}", e);
                None
            }
        }
    }

    /// One refresh tick: reload, apply the log gate, report the outcome.
    pub fn refresh(&self) {
        match self.reload() {
            Ok(config) => {
                log::set_max_level(config.log_level());
                debug!("CONFIG_RELOADED {:?}", config);
            }
            Err(e) => warn!("CONFIG_ERR {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Press;
    use std::fs;
    use std::time::{Duration, Instant};
    use tempfile::NamedTempFile;

    const VALID: &str = r#"
zone: Kitchen
sonosGateway: "http://gw/"
deviceName: "Shutter"
bindings:
  5:
    - len: 2
      path: ["volUp"]
"#;

    const UPDATED: &str = r#"
zone: Bedroom
sonosGateway: "http://gw/"
deviceName: "Shutter"
refreshConfig: 5
bindings:
  5:
    - len: 0
      path: ["next"]
  6:
    - len: 0
      path: ["previous"]
"#;

    const DEBUG_ON: &str = r#"
zone: Bedroom
sonosGateway: "http://gw/"
deviceName: "Shutter"
debug: true
refreshConfig: 1
"#;

    fn store_with(contents: &str) -> (NamedTempFile, ConfigStore) {
        let file = NamedTempFile::new().expect("temp file");
        fs::write(file.path(), contents).expect("write config");
        let store = ConfigStore::open(file.path()).expect("open store");
        (file, store)
    }

    #[test]
    fn open_loads_initial_snapshot() {
        let (_file, store) = store_with(VALID);
        let config = store.current();

        assert_eq!(config.zone, "Kitchen");
        assert_eq!(config.bindings[&5], vec![Press::new(2, ["volUp"])]);
    }

    #[test]
    fn open_fails_on_invalid_document() {
        let file = NamedTempFile::new().expect("temp file");
        fs::write(file.path(), "zone: [").expect("write config");
        assert!(ConfigStore::open(file.path()).is_err());
    }

    #[test]
    fn reload_publishes_new_snapshot() {
        let (file, store) = store_with(VALID);
        fs::write(file.path(), UPDATED).expect("rewrite config");

        let reloaded = store.reload().expect("reload");
        assert_eq!(reloaded.zone, "Bedroom");
        assert_eq!(store.current().bindings.len(), 2);
    }

    #[test]
    fn invalid_reload_keeps_previous_snapshot() {
        let (file, store) = store_with(VALID);
        let before = store.current();

        // Valid YAML prefix followed by garbage: nothing of it may leak in.
        fs::write(file.path(), "zone: Bedroom\nbindings:\n  5: [[[\n").expect("rewrite config");
        assert!(store.reload().is_err());

        let after = store.current();
        assert!(Arc::ptr_eq(&before, &after));
        assert_eq!(after.zone, "Kitchen");
        assert_eq!(after.bindings[&5], vec![Press::new(2, ["volUp"])]);
    }

    #[test]
    fn missing_file_on_reload_keeps_previous_snapshot() {
        let (file, store) = store_with(VALID);
        let path = file.path().to_path_buf();
        drop(file);
        assert!(!path.exists());

        assert!(matches!(store.reload(), Err(ConfigError::Io(_))));
        assert_eq!(store.current().zone, "Kitchen");
    }

    #[test]
    fn held_snapshot_is_unaffected_by_reload() {
        let (file, store) = store_with(VALID);
        let held = store.current();

        fs::write(file.path(), UPDATED).expect("rewrite config");
        store.reload().expect("reload");

        assert_eq!(held.zone, "Kitchen");
        assert_eq!(store.current().zone, "Bedroom");
    }

    #[test]
    fn refresh_disabled_without_interval() {
        let (_file, store) = store_with(VALID);
        let store = Arc::new(store);
        assert!(store.spawn_refresh().is_none());
    }

    // The only test that touches the global log level, so nothing races it.
    #[test]
    fn refresh_applies_log_gate_only_on_success() {
        let (file, store) = store_with(VALID);
        let store = Arc::new(store);
        log::set_max_level(store.current().log_level());
        let before = store.current();

        fs::write(file.path(), "debug: true\nzone: [\n").expect("rewrite config");
        store.refresh();
        assert_eq!(log::max_level(), log::LevelFilter::Off);
        assert!(Arc::ptr_eq(&before, &store.current()));

        fs::write(file.path(), DEBUG_ON).expect("rewrite config");
        store.refresh();
        assert_eq!(log::max_level(), log::LevelFilter::Debug);
        assert!(store.current().debug);
        assert_eq!(store.current().zone, "Bedroom");

        // With an interval set the thread starts and keeps the snapshot fresh
        let handle = store.spawn_refresh().expect("refresh thread");
        assert_eq!(handle.thread().name(), Some("config-refresh"));

        fs::write(file.path(), DEBUG_ON.replace("Bedroom", "Office")).expect("rewrite config");
        let deadline = Instant::now() + Duration::from_secs(10);
        while store.current().zone != "Office" && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(50));
        }
        assert_eq!(store.current().zone, "Office");
    }

    #[test]
    fn replace_swaps_snapshot() {
        let store = ConfigStore::with_config("unused.yaml", Config::new("a", "http://gw/", "dev"));
        store.replace(Config::new("b", "http://gw/", "dev"));
        assert_eq!(store.current().zone, "b");
    }
}
