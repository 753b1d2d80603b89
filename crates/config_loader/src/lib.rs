//! # Config Loader
//!
//! Turns a device settings file into a validated `DeviceBlueprint`.
//!
//! - `.toml` and `.json` files, chosen by extension
//! - field rules via `validator`, then cross-field checks (connection string,
//!   baselines, delays)
//! - `appsettings.json` style `ConnectionString` keys are accepted
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let blueprint = ConfigLoader::load_from_path(Path::new("device.toml")).unwrap();
//! println!("Device: {} ({})", blueprint.device.id, blueprint.device.mode);
//! ```

mod parser;
mod validator;

pub use contracts::DeviceBlueprint;
pub use parser::ConfigFormat;

use contracts::ContractError;
use std::path::Path;

/// Device settings loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load a blueprint from a `.toml` or `.json` file
    ///
    /// # Errors
    /// Unreadable file, unknown extension, malformed content (an unknown
    /// delivery mode included) or a rule violation.
    pub fn load_from_path(path: &Path) -> Result<DeviceBlueprint, ContractError> {
        let format = Self::detect_format(path)?;
        let content = Self::read_file(path)?;
        Self::load_from_str(&content, format)
    }

    /// Load a blueprint from in-memory content
    pub fn load_from_str(
        content: &str,
        format: ConfigFormat,
    ) -> Result<DeviceBlueprint, ContractError> {
        Self::parse_and_validate(content, format)
    }

    /// Re-run validation, e.g. after command-line overrides were applied
    pub fn validate(blueprint: &DeviceBlueprint) -> Result<(), ContractError> {
        validator::validate(blueprint)
    }

    /// Effective settings as TOML
    pub fn to_toml(blueprint: &DeviceBlueprint) -> Result<String, ContractError> {
        toml::to_string_pretty(blueprint)
            .map_err(|e| ContractError::config_parse(format!("TOML serialize error: {e}")))
    }

    pub fn to_json(blueprint: &DeviceBlueprint) -> Result<String, ContractError> {
        serde_json::to_string_pretty(blueprint)
            .map_err(|e| ContractError::config_parse(format!("JSON serialize error: {e}")))
    }
}

impl ConfigLoader {
    fn detect_format(path: &Path) -> Result<ConfigFormat, ContractError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            ContractError::config_parse("cannot determine file format from extension")
        })?;

        ConfigFormat::from_extension(ext).ok_or_else(|| {
            ContractError::config_parse(format!("unsupported config format: .{ext}"))
        })
    }

    fn read_file(path: &Path) -> Result<String, ContractError> {
        Ok(std::fs::read_to_string(path)?)
    }

    fn parse_and_validate(
        content: &str,
        format: ConfigFormat,
    ) -> Result<DeviceBlueprint, ContractError> {
        let blueprint = parser::parse(content, format)?;
        validator::validate(&blueprint)?;
        Ok(blueprint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::DeliveryMode;
    use std::io::Write;

    const MINIMAL_TOML: &str = r#"
[iothub]
connection_string = "HostName=hub.azure-devices.net;DeviceId=dev1;SharedAccessKey=c2VjcmV0"

[device]
id = "dev1"
mode = "batch"

[batch]
file_prefix = "dev1-"
size = 5
"#;

    #[test]
    fn test_load_from_str_toml() {
        let result = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let bp = result.unwrap();
        assert_eq!(bp.device.id, "dev1");
        assert_eq!(bp.device.mode, DeliveryMode::Batch);
        assert_eq!(bp.batch.size, 5);
    }

    #[test]
    fn test_round_trip_toml() {
        let bp = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml).unwrap();
        let serialized = ConfigLoader::to_toml(&bp).unwrap();
        let bp2 = ConfigLoader::load_from_str(&serialized, ConfigFormat::Toml).unwrap();
        assert_eq!(bp.device.id, bp2.device.id);
        assert_eq!(bp.device.mode, bp2.device.mode);
        assert_eq!(bp.batch.file_prefix, bp2.batch.file_prefix);
    }

    #[test]
    fn test_round_trip_json() {
        let bp = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml).unwrap();
        let json = ConfigLoader::to_json(&bp).unwrap();
        let bp2 = ConfigLoader::load_from_str(&json, ConfigFormat::Json).unwrap();
        assert_eq!(bp.batch.size, bp2.batch.size);
    }

    #[test]
    fn test_validation_runs_after_parse() {
        let content = r#"
[device]
id = "dev1"

[batch]
size = 0
"#;
        let result = ConfigLoader::load_from_str(content, ConfigFormat::Toml);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("batch.size"));
    }

    #[test]
    fn test_load_from_path() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(MINIMAL_TOML.as_bytes()).unwrap();

        let bp = ConfigLoader::load_from_path(file.path()).unwrap();
        assert_eq!(bp.batch.file_prefix, "dev1-");
    }

    #[test]
    fn test_load_from_path_unsupported_extension() {
        let file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        let err = ConfigLoader::load_from_path(file.path()).unwrap_err();
        assert!(err.to_string().contains("unsupported config format"));
    }

    #[test]
    fn test_load_from_missing_path() {
        let err = ConfigLoader::load_from_path(Path::new("/nonexistent/device.toml")).unwrap_err();
        assert!(matches!(err, ContractError::Io(_)));
    }
}
