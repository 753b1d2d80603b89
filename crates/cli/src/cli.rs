//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// IoT Device Simulator - synthetic temperature/humidity telemetry for an IoT hub
#[derive(Parser, Debug)]
#[command(
    name = "iot-device-sim",
    author,
    version,
    about = "IoT device telemetry simulator",
    long_about = "Simulates a temperature/humidity sensor device.\n\n\
                  Generates one reading per tick and delivers it to an IoT hub, either \n\
                  immediately (realtime) or as JSON Lines blobs of N readings (batch). \n\
                  Runtime failures are logged and recovered; the loop never exits on its own."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "DEVICE_SIM_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "DEVICE_SIM_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the simulator
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display the effective configuration
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON); defaults apply when omitted
    #[arg(short, long, env = "DEVICE_SIM_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override delivery mode (realtime | batch)
    #[arg(long, env = "DEVICE_SIM_MODE")]
    pub mode: Option<String>,

    /// Override device id
    #[arg(long, env = "DEVICE_SIM_DEVICE_ID")]
    pub device_id: Option<String>,

    /// Override IoT hub device connection string
    #[arg(long, env = "IOTHUB_CONNECTION_STRING", hide_env_values = true)]
    pub connection_string: Option<String>,

    /// Use in-memory ingestion endpoint and blob store instead of a hub
    #[arg(long)]
    pub mock: bool,

    /// Maximum number of samples to generate (0 = unlimited)
    #[arg(long, default_value = "0", env = "DEVICE_SIM_MAX_SAMPLES")]
    pub max_samples: u64,

    /// Run timeout in seconds (0 = no timeout)
    #[arg(long, default_value = "0", env = "DEVICE_SIM_TIMEOUT")]
    pub timeout: u64,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "DEVICE_SIM_METRICS_PORT")]
    pub metrics_port: u16,

    /// Validate configuration and exit without running
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_overrides() {
        let cli = Cli::try_parse_from([
            "iot-device-sim",
            "run",
            "--mock",
            "--mode",
            "batch",
            "--max-samples",
            "6",
        ])
        .unwrap();

        let Commands::Run(args) = cli.command else {
            panic!("expected run command");
        };
        assert!(args.mock);
        assert_eq!(args.mode.as_deref(), Some("batch"));
        assert_eq!(args.max_samples, 6);
        assert_eq!(args.timeout, 0);
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        let result = Cli::try_parse_from(["iot-device-sim", "-q", "-v", "info"]);
        assert!(result.is_err());
    }
}
