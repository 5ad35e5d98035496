//! Linux evdev backend
//!
//! Devices are the `event*` nodes under `/dev/input`. Reads block until the
//! kernel has a batch of events; the batch is queued and handed out one
//! event at a time.

use super::{DeviceInfo, DeviceProvider, InputDevice, RawEvent};
use evdev::Device;
use log::debug;
use std::collections::VecDeque;
use std::fs;
use std::io;
use std::path::PathBuf;

const INPUT_DIR: &str = "/dev/input";

/// Enumerates and opens evdev nodes
#[derive(Debug, Clone)]
pub struct EvdevProvider {
    input_dir: PathBuf,
}

impl Default for EvdevProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl EvdevProvider {
    pub fn new() -> Self {
        Self::with_input_dir(INPUT_DIR)
    }

    /// Scan a different directory of device nodes
    pub fn with_input_dir(input_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
        }
    }
}

impl DeviceProvider for EvdevProvider {
    type Device = EvdevDevice;

    fn list(&mut self) -> io::Result<Vec<DeviceInfo>> {
        let mut devices = Vec::new();

        for entry in fs::read_dir(&self.input_dir)? {
            let path = entry?.path();
            let is_event_node = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("event"));
            if !is_event_node {
                continue;
            }

            // Nodes we cannot open (permissions, races with unplug) are skipped.
            match Device::open(&path) {
                Ok(device) => {
                    let name = device.name().unwrap_or_default().to_string();
                    devices.push(DeviceInfo::new(name, path));
                }
                Err(e) => debug!("skipping {}: {}", path.display(), e),
            }
        }

        devices.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(devices)
    }

    fn open(&mut self, info: &DeviceInfo) -> io::Result<EvdevDevice> {
        Device::open(&info.path).map(EvdevDevice::new)
    }
}

/// An open evdev node
pub struct EvdevDevice {
    device: Device,
    pending: VecDeque<RawEvent>,
}

impl EvdevDevice {
    pub fn new(device: Device) -> Self {
        Self {
            device,
            pending: VecDeque::new(),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.device.name()
    }
}

impl InputDevice for EvdevDevice {
    fn next_event(&mut self) -> io::Result<Option<RawEvent>> {
        while self.pending.is_empty() {
            let batch = self.device.fetch_events()?;
            self.pending
                .extend(batch.map(|ev| RawEvent::new(ev.event_type().0, ev.code(), ev.value())));
        }
        Ok(self.pending.pop_front())
    }

    fn grab(&mut self) -> io::Result<()> {
        self.device.grab()
    }

    fn ungrab(&mut self) -> io::Result<()> {
        self.device.ungrab()
    }
}

/// Human-readable summary of what the provider can see
pub fn evdev_status(provider: &mut EvdevProvider) -> String {
    match provider.list() {
        Ok(devices) if devices.is_empty() => "No input devices found".to_string(),
        Ok(devices) => format!("{} input device(s) found", devices.len()),
        Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
            "Permission denied - run with sudo or add user to 'input' group".to_string()
        }
        Err(e) => format!("Error: {}", e),
    }
}
