//! Press-length tracking
//!
//! A button reports one press, a run of held ticks while it stays down, and
//! one release. The number of held ticks is the press length, and it is what
//! bindings are matched against when the button comes back up.

use super::{KeyEvent, KeyEventType};
use crate::bindings::{resolve_held, resolve_release};
use crate::config::{Bindings, Press};

/// What a single key event asks the session to fire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation<'a> {
    /// Nothing to dispatch
    Idle,
    /// Release matched a binding entry; fire all of its paths in order
    Release(&'a Press),
    /// Held tick on a continuous binding; fire the path once
    Continuous(&'a str),
}

/// Per-session press state
#[derive(Debug, Clone, Default)]
pub struct PressTracker {
    press_length: u32,
}

impl PressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Held ticks seen since the most recent press
    pub fn press_length(&self) -> u32 {
        self.press_length
    }

    /// Update state for an event and resolve it against `bindings`.
    pub fn process_event<'a>(
        &mut self,
        event: &KeyEvent,
        bindings: &'a Bindings,
    ) -> Activation<'a> {
        match event.event_type {
            KeyEventType::Press => {
                self.press_length = 0;
                Activation::Idle
            }
            KeyEventType::Held => {
                let activation = resolve_held(bindings, event.code)
                    .map_or(Activation::Idle, Activation::Continuous);
                self.press_length = self.press_length.saturating_add(1);
                activation
            }
            KeyEventType::Release => resolve_release(bindings, event.code, self.press_length)
                .map_or(Activation::Idle, Activation::Release),
        }
    }
}
