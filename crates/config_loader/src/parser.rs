//! Configuration parsing
//!
//! TOML is the primary format; JSON is accepted so an `appsettings.json`
//! style file can be used as-is.

use contracts::{ContractError, DeviceBlueprint};

/// Configuration file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML (preferred)
    Toml,
    /// JSON
    Json,
}

impl ConfigFormat {
    /// Infer format from a file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Parse TOML content
pub fn parse_toml(content: &str) -> Result<DeviceBlueprint, ContractError> {
    toml::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("TOML parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// Parse JSON content
pub fn parse_json(content: &str) -> Result<DeviceBlueprint, ContractError> {
    serde_json::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("JSON parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// Parse content in the given format
pub fn parse(content: &str, format: ConfigFormat) -> Result<DeviceBlueprint, ContractError> {
    match format {
        ConfigFormat::Toml => parse_toml(content),
        ConfigFormat::Json => parse_json(content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::DeliveryMode;

    #[test]
    fn test_parse_toml_full() {
        let content = r#"
[iothub]
connection_string = "HostName=hub.azure-devices.net;DeviceId=dev1;SharedAccessKey=c2VjcmV0"

[device]
id = "dev1"
mode = "batch"

[batch]
file_prefix = "readings-"
size = 3

[generator]
min_temperature = 18.5
seed = 7

[timing]
send_interval_ms = 250
"#;
        let bp = parse_toml(content).unwrap();
        assert_eq!(bp.device.id, "dev1");
        assert_eq!(bp.device.mode, DeliveryMode::Batch);
        assert_eq!(bp.batch.file_prefix, "readings-");
        assert_eq!(bp.batch.size, 3);
        assert_eq!(bp.generator.min_temperature, 18.5);
        assert_eq!(bp.generator.min_humidity, 60.0);
        assert_eq!(bp.generator.seed, Some(7));
        assert_eq!(bp.timing.send_interval_ms, 250);
        assert_eq!(bp.timing.recovery_delay_ms, 1000);
    }

    #[test]
    fn test_parse_toml_unknown_mode_fails() {
        let content = r#"
[device]
id = "dev1"
mode = "stream"
"#;
        let err = parse_toml(content).unwrap_err();
        assert!(matches!(err, ContractError::ConfigParse { .. }));
        assert!(err.to_string().contains("stream"), "got: {err}");
    }

    #[test]
    fn test_parse_json_appsettings_alias() {
        let content = r#"{
            "iothub": { "ConnectionString": "HostName=h;DeviceId=d;SharedAccessKey=aw==" }
        }"#;
        let bp = parse_json(content).unwrap();
        assert_eq!(
            bp.iothub.connection_string.as_deref(),
            Some("HostName=h;DeviceId=d;SharedAccessKey=aw==")
        );
        assert_eq!(bp.device.mode, DeliveryMode::Realtime);
    }

    #[test]
    fn test_parse_toml_syntax_error() {
        let content = "invalid toml [[[";
        let result = parse_toml(content);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ContractError::ConfigParse { .. }));
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            ConfigFormat::from_extension("toml"),
            Some(ConfigFormat::Toml)
        );
        assert_eq!(
            ConfigFormat::from_extension("JSON"),
            Some(ConfigFormat::Json)
        );
        assert_eq!(ConfigFormat::from_extension("yaml"), None);
    }
}
