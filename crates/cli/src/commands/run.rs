//! `run` command implementation.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use config_loader::ConfigLoader;
use contracts::{ConnectionString, DeliveryMode, DeviceBlueprint};
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::pipeline::{Pipeline, PipelineConfig};

/// Config file picked up from the working directory when `--config` is absent
const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Execute the `run` command
pub async fn run_simulator(args: &RunArgs) -> Result<()> {
    let blueprint = resolve_blueprint(args)?;

    info!(
        device_id = %blueprint.device.id,
        mode = %blueprint.device.mode,
        mock = args.mock,
        batch_size = blueprint.batch.size,
        "Configuration loaded"
    );

    // Dry run - just validate and exit
    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&blueprint, args.mock);
        return Ok(());
    }

    let pipeline_config = PipelineConfig {
        blueprint,
        mock: args.mock,
        max_samples: (args.max_samples != 0).then_some(args.max_samples),
        timeout: (args.timeout != 0).then(|| Duration::from_secs(args.timeout)),
    };

    info!("Starting simulator...");
    let stats = Pipeline::new(pipeline_config)
        .run(shutdown_signal())
        .await
        .context("Simulator failed")?;

    info!(
        samples = stats.session.total_samples,
        recoveries = stats.session.recoveries,
        stop_reason = %stats.stop_reason,
        duration_secs = stats.duration.as_secs_f64(),
        "Simulator stopped"
    );
    stats.print_summary();

    Ok(())
}

/// Load the configuration, apply CLI overrides and validate the result
///
/// Every failure here is a startup error: nothing has been generated yet.
pub(crate) fn resolve_blueprint(args: &RunArgs) -> Result<DeviceBlueprint> {
    let mut blueprint = match &args.config {
        Some(path) => load(path)?,
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => load(Path::new(DEFAULT_CONFIG_FILE))?,
        None => {
            info!("No configuration file, using defaults");
            DeviceBlueprint::default()
        }
    };

    // Apply CLI overrides
    if let Some(ref mode) = args.mode {
        let mode: DeliveryMode = mode.parse().context("Invalid --mode override")?;
        info!(mode = %mode, "Overriding delivery mode from CLI");
        blueprint.device.mode = mode;
    }
    if let Some(ref device_id) = args.device_id {
        info!(device_id = %device_id, "Overriding device id from CLI");
        blueprint.device.id = device_id.clone();
    }
    if let Some(ref connection_string) = args.connection_string {
        info!("Overriding connection string from CLI");
        blueprint.iothub.connection_string = Some(connection_string.clone());
    }

    ConfigLoader::validate(&blueprint).context("Configuration validation failed")?;

    match blueprint.iothub.connection_string.as_deref() {
        Some(raw) => {
            let connection = ConnectionString::parse(raw)?;
            if connection.device_id != blueprint.device.id {
                warn!(
                    connection_device = %connection.device_id,
                    payload_device = %blueprint.device.id,
                    "Payload device id differs from the authenticated device"
                );
            }
        }
        None if args.mock => {}
        None => anyhow::bail!(
            "No IoT hub connection string: set iothub.connection_string, \
             IOTHUB_CONNECTION_STRING or --connection-string (or use --mock)"
        ),
    }

    Ok(blueprint)
}

fn load(path: &Path) -> Result<DeviceBlueprint> {
    info!(config = %path.display(), "Loading configuration");

    if !path.exists() {
        anyhow::bail!("Configuration file not found: {}", path.display());
    }

    ConfigLoader::load_from_path(path)
        .with_context(|| format!("Failed to load config from {}", path.display()))
}

/// Resolve on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    warn!("Received shutdown signal, stopping simulator...");
}

/// Print configuration summary for dry-run mode
fn print_config_summary(blueprint: &DeviceBlueprint, mock: bool) {
    println!("\n=== Configuration Summary ===\n");
    println!("Device:");
    println!("  Id: {}", blueprint.device.id);
    println!("  Mode: {}", blueprint.device.mode);

    println!("\nIoT hub:");
    if mock {
        println!("  Endpoint: in-memory mock");
    } else if let Some(connection) = blueprint
        .iothub
        .connection_string
        .as_deref()
        .and_then(|raw| ConnectionString::parse(raw).ok())
    {
        println!("  Connection: {}", connection);
    }

    if blueprint.device.mode == DeliveryMode::Batch {
        println!("\nBatch:");
        println!("  File prefix: {}", blueprint.batch.file_prefix);
        println!("  Size: {}", blueprint.batch.size);
    }

    println!("\nTiming:");
    println!("  Send interval: {} ms", blueprint.timing.send_interval_ms);
    println!("  Recovery delay: {} ms", blueprint.timing.recovery_delay_ms);
    println!();
}
