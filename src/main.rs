//! Button Bridge - Bluetooth button to speaker gateway controller
//!
//! Loads the config, starts the optional hot-reload thread, and hands control
//! to the device scanner for the rest of the process lifetime.

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::path::PathBuf;
use std::sync::Arc;

use button_bridge::{config::resolve_config_path, ConfigStore, HttpDispatcher};

#[cfg(target_os = "linux")]
use button_bridge::input::{
    evdev_device::{evdev_status, EvdevProvider},
    DeviceScanner,
};

#[derive(Debug, Parser)]
#[command(name = "button-bridge", version, about)]
struct Args {
    /// Path of YAML config file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let env = env_logger::Env::default().default_filter_or("button_bridge=debug");
    env_logger::Builder::from_env(env)
        .format_timestamp_millis()
        .init();

    let path = resolve_config_path(args.config);
    let store = Arc::new(
        ConfigStore::open(&path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
    );
    let config = store.current();
    log::set_max_level(config.log_level());

    info!("Started Bluetooth button controller ({})", path.display());

    ctrlc::set_handler(|| {
        info!("Interrupted, shutting down");
        std::process::exit(0);
    })
    .context("failed to install signal handler")?;

    let _refresh = store.spawn_refresh();
    let dispatcher =
        HttpDispatcher::from_config(&config).context("failed to build gateway client")?;

    run(store, dispatcher)
}

#[cfg(target_os = "linux")]
fn run(store: Arc<ConfigStore>, dispatcher: HttpDispatcher) -> Result<()> {
    let mut provider = EvdevProvider::new();
    info!("Evdev: {}", evdev_status(&mut provider));

    DeviceScanner::new(provider, dispatcher, store).run()
}

#[cfg(not(target_os = "linux"))]
fn run(_store: Arc<ConfigStore>, _dispatcher: HttpDispatcher) -> Result<()> {
    anyhow::bail!("input devices are only supported on Linux (evdev)")
}
