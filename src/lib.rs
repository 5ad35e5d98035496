//! Button Bridge - drive an HTTP speaker gateway from a Bluetooth button
//!
//! Watches a named input device, turns how long a key was held into an
//! intent, maps it through a configurable binding table, and fires the
//! resulting paths at the gateway. Device loss is expected and recovered
//! from indefinitely.

pub mod bindings;
pub mod config;
pub mod dispatch;
pub mod input;
pub mod store;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use config::{Bindings, Config, ConfigError, Press};
pub use dispatch::{DispatchError, Dispatcher, HttpDispatcher};
pub use store::ConfigStore;
