//! DeviceBlueprint - Config Loader output
//!
//! Describes the simulated device: hub connection, delivery mode, batching,
//! generator baselines and loop timing.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use validator::Validate;

use crate::{ContractError, DEFAULT_TEMPERATURE_ALERT_THRESHOLD};

/// Delivery mode, fixed for the process lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMode {
    /// Send every sample immediately
    #[default]
    Realtime,
    /// Accumulate samples and upload them as one blob
    Batch,
}

impl FromStr for DeliveryMode {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "realtime" => Ok(Self::Realtime),
            "batch" => Ok(Self::Batch),
            other => Err(ContractError::UnknownMode {
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for DeliveryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Realtime => write!(f, "realtime"),
            Self::Batch => write!(f, "batch"),
        }
    }
}

/// Complete device configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct DeviceBlueprint {
    /// Ingestion endpoint settings
    #[serde(default)]
    #[validate(nested)]
    pub iothub: IotHubConfig,

    /// Device identity and mode
    #[serde(default)]
    #[validate(nested)]
    pub device: DeviceConfig,

    /// Batch mode settings
    #[serde(default)]
    #[validate(nested)]
    pub batch: BatchConfig,

    /// Reading generator settings
    #[serde(default)]
    #[validate(nested)]
    pub generator: GeneratorConfig,

    /// Loop pacing
    #[serde(default)]
    #[validate(nested)]
    pub timing: TimingConfig,
}

/// Ingestion endpoint configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct IotHubConfig {
    /// Device connection string (`HostName=..;DeviceId=..;SharedAccessKey=..`)
    #[serde(default, alias = "ConnectionString")]
    pub connection_string: Option<String>,
}

/// Device identity
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DeviceConfig {
    /// Device identifier written into every sample
    #[serde(default = "default_device_id")]
    #[validate(length(min = 1, message = "device id cannot be empty"))]
    pub id: String,

    /// Delivery mode
    #[serde(default)]
    pub mode: DeliveryMode,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            id: default_device_id(),
            mode: DeliveryMode::default(),
        }
    }
}

fn default_device_id() -> String {
    "myFirstDevice4Rust".to_string()
}

/// Batch mode configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BatchConfig {
    /// File name prefix for uploaded blobs
    #[serde(default = "default_file_prefix")]
    #[validate(length(min = 1, message = "file prefix cannot be empty"))]
    pub file_prefix: String,

    /// Samples per uploaded blob
    #[serde(default = "default_batch_size")]
    #[validate(range(min = 1, message = "batch size must be >= 1"))]
    pub size: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            file_prefix: default_file_prefix(),
            size: default_batch_size(),
        }
    }
}

fn default_file_prefix() -> String {
    "telemetry-".to_string()
}

fn default_batch_size() -> u64 {
    10
}

/// Reading generator configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct GeneratorConfig {
    /// Temperature baseline (°C)
    #[serde(default = "default_min_temperature")]
    pub min_temperature: f64,

    /// Humidity baseline (%)
    #[serde(default = "default_min_humidity")]
    pub min_humidity: f64,

    /// Readings above this temperature are tagged `temperatureAlert=true`
    #[serde(default = "default_alert_threshold")]
    pub temperature_alert_threshold: f64,

    /// Random seed (None = seeded from OS entropy)
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            min_temperature: default_min_temperature(),
            min_humidity: default_min_humidity(),
            temperature_alert_threshold: default_alert_threshold(),
            seed: None,
        }
    }
}

fn default_min_temperature() -> f64 {
    20.0
}

fn default_min_humidity() -> f64 {
    60.0
}

fn default_alert_threshold() -> f64 {
    DEFAULT_TEMPERATURE_ALERT_THRESHOLD
}

/// Loop timing configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TimingConfig {
    /// Pause after a successful iteration
    #[serde(default = "default_send_interval_ms")]
    #[validate(range(min = 1, message = "send interval must be >= 1ms"))]
    pub send_interval_ms: u64,

    /// Pause after a failed iteration
    #[serde(default = "default_recovery_delay_ms")]
    #[validate(range(min = 1, message = "recovery delay must be >= 1ms"))]
    pub recovery_delay_ms: u64,
}

impl TimingConfig {
    pub fn send_interval(&self) -> Duration {
        Duration::from_millis(self.send_interval_ms)
    }

    pub fn recovery_delay(&self) -> Duration {
        Duration::from_millis(self.recovery_delay_ms)
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            send_interval_ms: default_send_interval_ms(),
            recovery_delay_ms: default_recovery_delay_ms(),
        }
    }
}

fn default_send_interval_ms() -> u64 {
    500
}

fn default_recovery_delay_ms() -> u64 {
    1000
}
