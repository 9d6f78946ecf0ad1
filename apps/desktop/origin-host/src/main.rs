use origin_host::error::HostError;
use origin_host::host::{DEFAULT_START_URL, OriginHost, build_context};
use origin_host::host_config::HostConfig;
use origin_host::logger::initialize as LoggerInitialize;
use origin_host::session::LoggingPort;

use origin_core::config::CoreConfig;
use origin_core::context::ContextCell;

use common::ErrorLocation;

use std::fs::create_dir_all;
use std::panic::Location;
use std::path::PathBuf;
use std::sync::Arc;

use log::{error, info};
use tokio::runtime::Handle;

const APP_DIR_NAME: &str = "origin-host";

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("{e}");
        eprintln!("{e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), HostError> {
    let config_dir = app_dir(dirs::config_dir())?;
    let log_dir = app_dir(dirs::data_local_dir())?.join("logs");

    create_dir_all(&log_dir).map_err(|e| HostError::Host {
        message: format!("Failed to create log directory: {e}"),
        location: ErrorLocation::from(Location::caller()),
    })?;

    // Initialize logger FIRST
    LoggerInitialize(&log_dir)?;

    info!("Origin host starting");
    info!("Config directory: {}", config_dir.display());
    info!("Log directory: {}", log_dir.display());

    let core_config = CoreConfig::load(&config_dir)?;
    let host_config = HostConfig::load(&config_dir)?;

    let context = ContextCell::global().get_or_init(|| build_context(core_config, &host_config));
    let host = OriginHost::new(context, Handle::current());

    let start_url = host.start(DEFAULT_START_URL).await?;
    info!("Open {start_url} in the embedded engine");

    // Bootstrap signal; queued until the page's content script connects.
    host.bridge()
        .send("document.dispatchEvent(new Event('deviceready'))", |_| {});
    host.bridge().on_channel_attached(Arc::new(LoggingPort::new()));

    tokio::signal::ctrl_c().await.map_err(|e| HostError::Host {
        message: format!("Failed to wait for shutdown signal: {e}"),
        location: ErrorLocation::from(Location::caller()),
    })?;

    info!("Shutdown requested");
    host.shutdown().await;
    Ok(())
}

#[track_caller]
fn app_dir(base: Option<PathBuf>) -> Result<PathBuf, HostError> {
    base.map(|dir| dir.join(APP_DIR_NAME))
        .ok_or_else(|| HostError::Host {
            message: "Failed to determine platform directory".to_string(),
            location: ErrorLocation::from(Location::caller()),
        })
}
