use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use log::{error, info};

use sensortag_bridge_lib::config::AppConfig;
use sensortag_bridge_lib::config::output_config::OutputFormat;
use sensortag_bridge_lib::core::bluetooth::{
    BluestTransport, JsonSink, LogSink, ReadingSink, SensorManager, event_channel,
};
use sensortag_bridge_lib::logging;

/// Grace period for unsubscribing and disconnecting after Ctrl-C
const SHUTDOWN_GRACE_MS: u64 = 1_500;

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = match std::env::args_os().nth(1) {
        Some(path) => PathBuf::from(path),
        None => AppConfig::default_path()?,
    };
    let config = AppConfig::load(&config_path)
        .await
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    if let Err(e) = logging::init(&config.output) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    match config.output.format {
        OutputFormat::Log => run(config, LogSink).await,
        OutputFormat::Json => run(config, JsonSink).await,
    }
}

async fn run<S: ReadingSink + 'static>(config: AppConfig, sink: S) -> Result<()> {
    let machine_config = config.machine_config().context("Invalid configuration")?;

    let (events_tx, events_rx) = event_channel();
    let transport = BluestTransport::new(events_tx.clone()).await?;
    let mut manager = SensorManager::new(machine_config, transport, sink, events_tx, events_rx);
    let handle = manager.handle();

    let reactor = tokio::spawn(async move {
        manager.run().await;
    });

    handle.connect()?;
    info!("Searching for {}...", config.device.name);

    tokio::signal::ctrl_c().await?;
    info!("Interrupted, disconnecting...");
    if let Err(e) = handle.disconnect() {
        error!("{}", e);
    }
    tokio::time::sleep(Duration::from_millis(SHUTDOWN_GRACE_MS)).await;

    handle.shutdown();
    reactor.await?;
    Ok(())
}
