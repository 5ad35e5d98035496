//! Device abstraction used by the scanner and sessions

use std::io;
use std::path::PathBuf;

/// A raw input event as reported by the kernel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawEvent {
    pub event_type: u16,
    pub code: u16,
    pub value: i32,
}

impl RawEvent {
    pub fn new(event_type: u16, code: u16, value: i32) -> Self {
        Self {
            event_type,
            code,
            value,
        }
    }
}

/// An available input device found during a scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Human-readable device name
    pub name: String,
    /// Device node, e.g. `/dev/input/event3`
    pub path: PathBuf,
}

impl DeviceInfo {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

/// An open input device handle
pub trait InputDevice {
    /// Block until the next event arrives.
    ///
    /// `Ok(None)` means the stream has ended.
    fn next_event(&mut self) -> io::Result<Option<RawEvent>>;

    /// Claim exclusive access to the device's events
    fn grab(&mut self) -> io::Result<()>;

    /// Give up exclusive access
    fn ungrab(&mut self) -> io::Result<()>;
}

/// Source of input devices
pub trait DeviceProvider {
    type Device: InputDevice;

    /// Enumerate all currently available devices
    fn list(&mut self) -> io::Result<Vec<DeviceInfo>>;

    /// Open a device found by [`list`](Self::list)
    fn open(&mut self, info: &DeviceInfo) -> io::Result<Self::Device>;
}
