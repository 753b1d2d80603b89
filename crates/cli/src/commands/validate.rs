//! `validate` command: load a settings file and report problems without running

use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use contracts::{BatchConfig, DeliveryMode, DeviceBlueprint};
use ingestion::TEMPERATURE_SPAN;
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    device_id: String,
    mode: DeliveryMode,
    has_connection_string: bool,
    batch_size: u64,
    alert_threshold: f64,
}

impl ValidationResult {
    fn rejected(path: &Path, error: impl Into<String>) -> Self {
        Self {
            valid: false,
            config_path: path.display().to_string(),
            error: Some(error.into()),
            warnings: Vec::new(),
            summary: None,
        }
    }

    fn accepted(path: &Path, blueprint: &DeviceBlueprint) -> Self {
        Self {
            valid: true,
            config_path: path.display().to_string(),
            error: None,
            warnings: collect_warnings(blueprint),
            summary: Some(ConfigSummary {
                device_id: blueprint.device.id.clone(),
                mode: blueprint.device.mode,
                has_connection_string: blueprint.iothub.connection_string.is_some(),
                batch_size: blueprint.batch.size,
                alert_threshold: blueprint.generator.temperature_alert_threshold,
            }),
        }
    }
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(&args.config);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{json}");
    } else {
        print!("{result}");
    }

    anyhow::ensure!(result.valid, "{} is not a usable configuration", result.config_path);
    Ok(())
}

fn validate_config(path: &Path) -> ValidationResult {
    if !path.is_file() {
        return ValidationResult::rejected(path, format!("File not found: {}", path.display()));
    }

    match config_loader::ConfigLoader::load_from_path(path) {
        Ok(blueprint) => ValidationResult::accepted(path, &blueprint),
        Err(e) => ValidationResult::rejected(path, e.to_string()),
    }
}

/// Settings that load fine but probably do not do what was meant
fn collect_warnings(blueprint: &DeviceBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();

    if blueprint.iothub.connection_string.is_none() {
        warnings.push(
            "iothub.connection_string is not set - only --mock runs or an \
             IOTHUB_CONNECTION_STRING override will work"
                .to_string(),
        );
    }

    let generator = &blueprint.generator;
    let max_temperature = generator.min_temperature + TEMPERATURE_SPAN;
    if generator.temperature_alert_threshold < generator.min_temperature {
        warnings.push(format!(
            "generator.temperature_alert_threshold ({}) is below min_temperature - every sample raises an alert",
            generator.temperature_alert_threshold
        ));
    } else if generator.temperature_alert_threshold >= max_temperature {
        warnings.push(format!(
            "generator.temperature_alert_threshold ({}) is at or above {} - no sample raises an alert",
            generator.temperature_alert_threshold, max_temperature
        ));
    }

    let default_batch = BatchConfig::default();
    if blueprint.device.mode == DeliveryMode::Realtime
        && (blueprint.batch.size != default_batch.size
            || blueprint.batch.file_prefix != default_batch.file_prefix)
    {
        warnings.push("batch settings are ignored in realtime mode".to_string());
    }

    warnings
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.summary, &self.error) {
            (Some(summary), _) => {
                writeln!(f, "✓ {} is valid", self.config_path)?;
                writeln!(f)?;
                writeln!(f, "  Device:            {}", summary.device_id)?;
                writeln!(f, "  Mode:              {}", summary.mode)?;
                let connection = if summary.has_connection_string { "set" } else { "not set" };
                writeln!(f, "  Connection string: {connection}")?;
                if summary.mode == DeliveryMode::Batch {
                    writeln!(f, "  Batch size:        {}", summary.batch_size)?;
                }
                writeln!(f, "  Alert above:       {:.1} °C", summary.alert_threshold)?;
            }
            (None, error) => {
                writeln!(f, "✗ {} is invalid", self.config_path)?;
                if let Some(error) = error {
                    writeln!(f, "\n  {error}")?;
                }
            }
        }

        if !self.warnings.is_empty() {
            writeln!(f, "\n⚠ Warnings:")?;
            for warning in &self.warnings {
                writeln!(f, "  - {warning}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn validate(content: &str) -> ValidationResult {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        validate_config(file.path())
    }

    #[test]
    fn test_valid_config_with_warning() {
        let result = validate("[device]\nid = \"dev\"\nmode = \"batch\"\n");
        assert!(result.valid);
        assert_eq!(result.summary.as_ref().unwrap().mode, DeliveryMode::Batch);
        assert!(result.warnings.iter().any(|w| w.contains("connection_string")));
    }

    #[test]
    fn test_invalid_mode() {
        let result = validate("[device]\nmode = \"stream\"\n");
        assert!(!result.valid);
        assert!(result.error.unwrap().contains("stream"));
    }

    #[test]
    fn test_zero_batch_size_invalid() {
        let result = validate("[batch]\nsize = 0\n");
        assert!(!result.valid);
    }

    #[test]
    fn test_threshold_warning() {
        let mut blueprint = DeviceBlueprint::default();
        blueprint.generator.temperature_alert_threshold = 50.0;
        let warnings = collect_warnings(&blueprint);
        assert!(warnings.iter().any(|w| w.contains("no sample raises an alert")));
    }

    #[test]
    fn test_display_lists_warnings() {
        let blueprint = DeviceBlueprint::default();
        let text = ValidationResult::accepted(Path::new("c.toml"), &blueprint).to_string();
        assert!(text.starts_with("✓ c.toml is valid"));
        assert!(text.contains("Connection string: not set"));
        assert!(text.contains("⚠ Warnings:"));
    }

    #[test]
    fn test_missing_file() {
        let result = validate_config(Path::new("/nonexistent/config.toml"));
        assert!(!result.valid);
        assert!(result.error.unwrap().contains("File not found"));
    }
}
