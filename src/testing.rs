//! In-memory stand-ins for devices and the gateway
//!
//! Used by the unit tests and `tests/integration.rs` to drive sessions and
//! the scanner without hardware or network.

use crate::dispatch::{DispatchError, Dispatcher};
use crate::input::{DeviceInfo, DeviceProvider, InputDevice, RawEvent, EV_KEY};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::io;
use std::rc::Rc;

/// Device that replays a fixed script of events, then reports end of stream
#[derive(Debug, Default)]
pub struct ScriptedDevice {
    script: VecDeque<io::Result<RawEvent>>,
    grabbed: bool,
    refuse_grab: bool,
    grab_count: u32,
    ungrab_count: u32,
    reads: u32,
}

impl ScriptedDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raw(mut self, event: RawEvent) -> Self {
        self.script.push_back(Ok(event));
        self
    }

    pub fn press(self, code: u16) -> Self {
        self.raw(RawEvent::new(EV_KEY, code, 1))
    }

    pub fn held(self, code: u16) -> Self {
        self.raw(RawEvent::new(EV_KEY, code, 2))
    }

    pub fn release(self, code: u16) -> Self {
        self.raw(RawEvent::new(EV_KEY, code, 0))
    }

    /// Full press of `code` with `ticks` held events before the release
    pub fn tap(mut self, code: u16, ticks: u32) -> Self {
        self = self.press(code);
        for _ in 0..ticks {
            self = self.held(code);
        }
        self.release(code)
    }

    /// Fail the next read with `kind`, as a disconnected device does
    pub fn error(mut self, kind: io::ErrorKind) -> Self {
        self.script.push_back(Err(io::Error::new(kind, "scripted read failure")));
        self
    }

    /// Make every grab attempt fail as if another process holds the device
    pub fn refuse_grab(mut self) -> Self {
        self.refuse_grab = true;
        self
    }

    pub fn is_grabbed(&self) -> bool {
        self.grabbed
    }

    pub fn grab_count(&self) -> u32 {
        self.grab_count
    }

    pub fn ungrab_count(&self) -> u32 {
        self.ungrab_count
    }

    /// Reads performed so far, including the final end-of-stream read
    pub fn reads(&self) -> u32 {
        self.reads
    }

    /// Scripted entries not yet read
    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl InputDevice for ScriptedDevice {
    fn next_event(&mut self) -> io::Result<Option<RawEvent>> {
        self.reads += 1;
        self.script.pop_front().transpose()
    }

    fn grab(&mut self) -> io::Result<()> {
        self.grab_count += 1;
        if self.refuse_grab || self.grabbed {
            // EBUSY, as the kernel reports for a device grabbed elsewhere
            return Err(io::Error::from_raw_os_error(16));
        }
        self.grabbed = true;
        Ok(())
    }

    fn ungrab(&mut self) -> io::Result<()> {
        self.ungrab_count += 1;
        self.grabbed = false;
        Ok(())
    }
}

/// Provider that plays back scripted scan and open results
#[derive(Debug, Default)]
pub struct ScriptedProvider {
    listings: VecDeque<io::Result<Vec<DeviceInfo>>>,
    opens: VecDeque<io::Result<ScriptedDevice>>,
    list_calls: Rc<Cell<u32>>,
    open_calls: Rc<Cell<u32>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the result of the next `list` call
    pub fn listing(mut self, devices: Vec<DeviceInfo>) -> Self {
        self.listings.push_back(Ok(devices));
        self
    }

    pub fn listing_error(mut self, kind: io::ErrorKind) -> Self {
        self.listings
            .push_back(Err(io::Error::new(kind, "scripted listing failure")));
        self
    }

    /// Queue a device handed out by the next `open` call
    pub fn opens(mut self, device: ScriptedDevice) -> Self {
        self.opens.push_back(Ok(device));
        self
    }

    pub fn open_error(mut self, kind: io::ErrorKind) -> Self {
        self.opens
            .push_back(Err(io::Error::new(kind, "scripted open failure")));
        self
    }

    /// Shared counter of `list` calls, readable after the provider moved
    pub fn list_calls(&self) -> Rc<Cell<u32>> {
        Rc::clone(&self.list_calls)
    }

    /// Shared counter of `open` calls, readable after the provider moved
    pub fn open_calls(&self) -> Rc<Cell<u32>> {
        Rc::clone(&self.open_calls)
    }
}

impl DeviceProvider for ScriptedProvider {
    type Device = ScriptedDevice;

    fn list(&mut self) -> io::Result<Vec<DeviceInfo>> {
        self.list_calls.set(self.list_calls.get() + 1);
        self.listings.pop_front().unwrap_or_else(|| Ok(Vec::new()))
    }

    fn open(&mut self, _info: &DeviceInfo) -> io::Result<ScriptedDevice> {
        self.open_calls.set(self.open_calls.get() + 1);
        self.opens
            .pop_front()
            .unwrap_or_else(|| Err(io::Error::new(io::ErrorKind::NotFound, "no such device")))
    }
}

/// Dispatcher that records delivered URLs and fails on request
#[derive(Debug, Default)]
pub struct RecordingDispatcher {
    sent: RefCell<Vec<String>>,
    fail_pattern: Option<String>,
    unreachable: bool,
    failures: Cell<u32>,
}

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every URL containing `pattern` with a 503
    pub fn failing_on(pattern: impl Into<String>) -> Self {
        Self {
            fail_pattern: Some(pattern.into()),
            ..Self::default()
        }
    }

    /// Refuse the connection for every URL containing `pattern`
    pub fn unreachable_on(pattern: impl Into<String>) -> Self {
        Self {
            fail_pattern: Some(pattern.into()),
            unreachable: true,
            ..Self::default()
        }
    }

    /// URLs delivered successfully, in issue order
    pub fn sent(&self) -> Vec<String> {
        self.sent.borrow().clone()
    }

    pub fn failures(&self) -> u32 {
        self.failures.get()
    }
}

impl Dispatcher for RecordingDispatcher {
    fn send(&self, url: &str) -> Result<(), DispatchError> {
        if let Some(pattern) = &self.fail_pattern {
            if url.contains(pattern.as_str()) {
                self.failures.set(self.failures.get() + 1);
                if self.unreachable {
                    return Err(DispatchError::Unreachable(url.to_string()));
                }
                return Err(DispatchError::Status {
                    status: 503,
                    url: url.to_string(),
                });
            }
        }
        self.sent.borrow_mut().push(url.to_string());
        Ok(())
    }
}
