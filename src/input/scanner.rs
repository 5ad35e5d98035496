//! Device discovery and reconnect loop
//!
//! The scanner alternates between two states for the life of the process:
//! searching for the configured device by name, and running a session on it.
//! Every failure along the way sends it back to searching.

use super::{DeviceInfo, DeviceProvider, DeviceSession, SessionEnd};
use crate::bindings::pick_path;
use crate::config::Config;
use crate::dispatch::Dispatcher;
use crate::store::ConfigStore;
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io;
use std::mem;
use std::sync::Arc;
use std::thread;

/// Where the scanner currently is
#[derive(Debug)]
pub enum ScannerState<D> {
    /// Looking for the configured device
    Searching,
    /// Device acquired; the next step runs its session
    Running { info: DeviceInfo, device: D },
}

/// Outcome of one scanner step
#[derive(Debug)]
pub enum ScanStep {
    /// Enumerating devices failed
    ListFailed(io::Error),
    /// No device with the configured name is present
    NotFound,
    /// The device was found but could not be opened
    OpenFailed(io::Error),
    /// Device opened and connected signals fired
    Connected(DeviceInfo),
    /// A session ran and ended
    SessionEnded(SessionEnd),
}

/// Top-level control loop tying devices, config, and dispatch together
pub struct DeviceScanner<P: DeviceProvider, X: Dispatcher> {
    provider: P,
    dispatcher: X,
    store: Arc<ConfigStore>,
    rng: StdRng,
    state: ScannerState<P::Device>,
}

impl<P: DeviceProvider, X: Dispatcher> DeviceScanner<P, X> {
    /// Create a scanner with a generator seeded once from OS entropy
    pub fn new(provider: P, dispatcher: X, store: Arc<ConfigStore>) -> Self {
        Self::with_rng(provider, dispatcher, store, StdRng::from_entropy())
    }

    pub fn with_rng(provider: P, dispatcher: X, store: Arc<ConfigStore>, rng: StdRng) -> Self {
        Self {
            provider,
            dispatcher,
            store,
            rng,
            state: ScannerState::Searching,
        }
    }

    pub fn state(&self) -> &ScannerState<P::Device> {
        &self.state
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, ScannerState::Running { .. })
    }

    pub fn dispatcher(&self) -> &X {
        &self.dispatcher
    }

    /// Scan and serve sessions forever.
    pub fn run(&mut self) -> ! {
        loop {
            self.step();
        }
    }

    /// Advance the state machine by one transition.
    pub fn step(&mut self) -> ScanStep {
        match mem::replace(&mut self.state, ScannerState::Searching) {
            ScannerState::Searching => self.search(),
            ScannerState::Running { info, device } => {
                let mut session = DeviceSession::new(device);
                let end = session.run(&self.store, &self.dispatcher, &mut self.rng);
                info!("LOST_DEVICE {} ({})", info.name, end);
                ScanStep::SessionEnded(end)
            }
        }
    }

    fn search(&mut self) -> ScanStep {
        let config = self.store.current();
        debug!("SCANNING for device: {}", config.device_name);

        let devices = match self.provider.list() {
            Ok(devices) => devices,
            Err(e) => {
                warn!("LIST_ERR {}", e);
                thread::sleep(config.scan_interval());
                return ScanStep::ListFailed(e);
            }
        };

        let Some(info) = devices.into_iter().find(|d| d.name == config.device_name) else {
            thread::sleep(config.scan_interval());
            return ScanStep::NotFound;
        };
        info!("FOUND {}, {}", info.name, info.path.display());

        let device = match self.provider.open(&info) {
            Ok(device) => device,
            Err(e) => {
                warn!("OPEN_ERR {}: {}", info.path.display(), e);
                return ScanStep::OpenFailed(e);
            }
        };

        self.signal_connected(&config);
        self.state = ScannerState::Running {
            info: info.clone(),
            device,
        };
        ScanStep::Connected(info)
    }

    /// Fire the connected-signal paths in order, pausing after each.
    fn signal_connected(&mut self, config: &Config) {
        for path in &config.connected {
            let url = config.action_url(pick_path(path, &mut self.rng));
            debug!("CONN_API_EVENT {}", url);
            if let Err(e) = self.dispatcher.send(&url) {
                warn!("CONN_API_EVENT_ERR {}", e);
            }
            thread::sleep(config.connected_delay());
        }
    }
}
