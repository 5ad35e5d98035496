//! One connection to the bound device, from first event to loss
//!
//! A session reads events strictly in arrival order, keeps the press state,
//! and fires whatever the bindings resolve to. It ends on the first read
//! error, end of stream, failed grab, or continuous dispatch that never
//! reached the gateway; the scanner then goes back to searching.

use super::{Activation, InputDevice, KeyEvent, PressTracker};
use crate::bindings::pick_path;
use crate::config::Config;
use crate::dispatch::{DispatchError, Dispatcher};
use crate::store::ConfigStore;
use log::{debug, warn};
use rand::Rng;
use std::io;
use thiserror::Error;

/// Why a session stopped
#[derive(Debug, Error)]
pub enum SessionEnd {
    /// Reading from the device failed (typically the device went away)
    #[error("read failed: {0}")]
    Read(#[source] io::Error),
    /// The device closed its event stream
    #[error("event stream ended")]
    EndOfStream,
    /// Exclusive access could not be claimed
    #[error("grab failed: {0}")]
    Grab(#[source] io::Error),
    /// A continuous action could not reach the gateway
    #[error("continuous dispatch failed: {0}")]
    ContinuousDispatch(#[source] DispatchError),
}

/// Exclusive claim on a device, released when dropped
struct Grab<'d, D: InputDevice> {
    device: &'d mut D,
    held: bool,
}

impl<'d, D: InputDevice> Grab<'d, D> {
    fn new(device: &'d mut D) -> Self {
        Self {
            device,
            held: false,
        }
    }

    fn ensure(&mut self) -> io::Result<()> {
        if !self.held {
            self.device.grab()?;
            self.held = true;
        }
        Ok(())
    }
}

impl<D: InputDevice> Drop for Grab<'_, D> {
    fn drop(&mut self) {
        if self.held {
            if let Err(e) = self.device.ungrab() {
                debug!("UNGRAB_ERR {}", e);
            }
        }
    }
}

/// An open device plus its press state
pub struct DeviceSession<D: InputDevice> {
    device: D,
    tracker: PressTracker,
}

impl<D: InputDevice> DeviceSession<D> {
    pub fn new(device: D) -> Self {
        Self {
            device,
            tracker: PressTracker::new(),
        }
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn into_device(self) -> D {
        self.device
    }

    pub fn press_length(&self) -> u32 {
        self.tracker.press_length()
    }

    /// Read and act on events until the session ends.
    ///
    /// The device is grabbed on the first event and released on every exit
    /// path. Bindings and gateway are taken from the store's current
    /// snapshot per event, so reloads apply mid-session.
    pub fn run<X, R>(&mut self, store: &ConfigStore, dispatcher: &X, rng: &mut R) -> SessionEnd
    where
        X: Dispatcher + ?Sized,
        R: Rng + ?Sized,
    {
        let Self { device, tracker } = self;
        let mut grab = Grab::new(device);

        loop {
            let raw = match grab.device.next_event() {
                Ok(Some(raw)) => raw,
                Ok(None) => return SessionEnd::EndOfStream,
                Err(e) => {
                    debug!("KEY_EVENT_ERR {}", e);
                    return SessionEnd::Read(e);
                }
            };

            if let Err(e) = grab.ensure() {
                warn!("GRAB_ERR {}", e);
                return SessionEnd::Grab(e);
            }

            debug!("KEY_EVENT {:?}", raw);
            debug!("PRESS_LEN {}", tracker.press_length());

            let Some(event) = KeyEvent::from_raw(&raw) else {
                continue;
            };

            let config = store.current();
            match tracker.process_event(&event, &config.bindings) {
                Activation::Idle => {}
                Activation::Release(entry) => {
                    for path in &entry.path {
                        fire(&config, dispatcher, pick_path(path, rng));
                    }
                }
                Activation::Continuous(path) => {
                    let url = config.action_url(pick_path(path, rng));
                    debug!("CONT_API_EVENT {}", url);
                    match dispatcher.send(&url) {
                        Ok(()) => {}
                        Err(e) if e.is_transport() => {
                            warn!("CONT_API_EVENT_ERR {}", e);
                            return SessionEnd::ContinuousDispatch(e);
                        }
                        Err(e) => debug!("CONT_API_EVENT_ERR {}", e),
                    }
                }
            }
        }
    }
}

/// Fire one released-key action; failures are logged only.
fn fire<X: Dispatcher + ?Sized>(config: &Config, dispatcher: &X, path: &str) {
    let url = config.action_url(path);
    debug!("API_EVENT {}", url);
    if let Err(e) = dispatcher.send(&url) {
        warn!("API_EVENT_ERR {}", e);
    }
}
