//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::{ConnectionString, DeliveryMode, DeviceBlueprint};
use ingestion::{HUMIDITY_SPAN, TEMPERATURE_SPAN};
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    device: DeviceInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    iothub: Option<HubInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    batch: Option<BatchInfo>,
    generator: GeneratorInfo,
    timing: TimingInfo,
}

#[derive(Serialize)]
struct DeviceInfo {
    id: String,
    mode: String,
}

#[derive(Serialize)]
struct HubInfo {
    host_name: String,
    device_id: String,
    /// Connection string with the key redacted
    connection_string: String,
}

#[derive(Serialize)]
struct BatchInfo {
    file_prefix: String,
    size: u64,
}

#[derive(Serialize)]
struct GeneratorInfo {
    temperature_range: [f64; 2],
    humidity_range: [f64; 2],
    temperature_alert_threshold: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u64>,
}

#[derive(Serialize)]
struct TimingInfo {
    send_interval_ms: u64,
    recovery_delay_ms: u64,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    let info = build_config_info(&blueprint)?;
    if args.json {
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&info);
    }

    Ok(())
}

fn build_config_info(blueprint: &DeviceBlueprint) -> Result<ConfigInfo> {
    let iothub = blueprint
        .iothub
        .connection_string
        .as_deref()
        .map(ConnectionString::parse)
        .transpose()?
        .map(|connection| HubInfo {
            host_name: connection.host_name.clone(),
            device_id: connection.device_id.clone(),
            connection_string: connection.to_string(),
        });

    let batch = (blueprint.device.mode == DeliveryMode::Batch).then(|| BatchInfo {
        file_prefix: blueprint.batch.file_prefix.clone(),
        size: blueprint.batch.size,
    });

    let generator = &blueprint.generator;
    Ok(ConfigInfo {
        device: DeviceInfo {
            id: blueprint.device.id.clone(),
            mode: blueprint.device.mode.to_string(),
        },
        iothub,
        batch,
        generator: GeneratorInfo {
            temperature_range: [
                generator.min_temperature,
                generator.min_temperature + TEMPERATURE_SPAN,
            ],
            humidity_range: [generator.min_humidity, generator.min_humidity + HUMIDITY_SPAN],
            temperature_alert_threshold: generator.temperature_alert_threshold,
            seed: generator.seed,
        },
        timing: TimingInfo {
            send_interval_ms: blueprint.timing.send_interval_ms,
            recovery_delay_ms: blueprint.timing.recovery_delay_ms,
        },
    })
}

fn print_config_info(info: &ConfigInfo) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║               IoT Device Simulator Configuration             ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("Device");
    println!("   ├─ Id: {}", info.device.id);
    println!("   └─ Mode: {}", info.device.mode);

    println!("\nIoT Hub");
    match &info.iothub {
        Some(hub) => {
            println!("   ├─ Host: {}", hub.host_name);
            println!("   ├─ Device: {}", hub.device_id);
            println!("   └─ Connection: {}", hub.connection_string);
        }
        None => println!("   └─ Connection: (not set)"),
    }

    if let Some(batch) = &info.batch {
        println!("\nBatch");
        println!("   ├─ File prefix: {}", batch.file_prefix);
        println!("   └─ Size: {}", batch.size);
    }

    let generator = &info.generator;
    println!("\nGenerator");
    println!(
        "   ├─ Temperature: [{:.2}, {:.2})",
        generator.temperature_range[0], generator.temperature_range[1]
    );
    println!(
        "   ├─ Humidity: [{:.2}, {:.2})",
        generator.humidity_range[0], generator.humidity_range[1]
    );
    match generator.seed {
        Some(seed) => {
            println!("   ├─ Alert threshold: {}", generator.temperature_alert_threshold);
            println!("   └─ Seed: {}", seed);
        }
        None => println!("   └─ Alert threshold: {}", generator.temperature_alert_threshold),
    }

    println!("\nTiming");
    println!("   ├─ Send interval: {} ms", info.timing.send_interval_ms);
    println!("   └─ Recovery delay: {} ms", info.timing.recovery_delay_ms);

    println!();
}
