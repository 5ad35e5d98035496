//! Key event types

use super::RawEvent;

/// Kernel event type for keys and buttons
pub const EV_KEY: u16 = 0x01;

/// Type of key event, taken from the raw event value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEventType {
    /// Key went down (value 1)
    Press,
    /// Key is still down, auto-repeat tick (value 2)
    Held,
    /// Key went up (value 0)
    Release,
}

impl KeyEventType {
    pub fn from_value(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::Release),
            1 => Some(Self::Press),
            2 => Some(Self::Held),
            _ => None,
        }
    }
}

/// A key event from the bound device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    /// Kernel key code
    pub code: u16,
    /// Type of event (press/held/release)
    pub event_type: KeyEventType,
}

impl KeyEvent {
    pub fn new(code: u16, event_type: KeyEventType) -> Self {
        Self { code, event_type }
    }

    /// Interpret a raw event; anything that is not a key event is `None`.
    pub fn from_raw(raw: &RawEvent) -> Option<Self> {
        if raw.event_type != EV_KEY {
            return None;
        }
        KeyEventType::from_value(raw.value).map(|event_type| Self::new(raw.code, event_type))
    }
}
