//! Input device handling: discovery, sessions, and press tracking

mod device;
mod event;
mod press;
mod scanner;
mod session;

#[cfg(target_os = "linux")]
pub mod evdev_device;

pub use device::{DeviceInfo, DeviceProvider, InputDevice, RawEvent};
pub use event::{KeyEvent, KeyEventType, EV_KEY};
pub use press::{Activation, PressTracker};
pub use scanner::{DeviceScanner, ScannerState, ScanStep};
pub use session::{DeviceSession, SessionEnd};
