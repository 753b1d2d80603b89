//! Configuration validation
//!
//! Rules:
//! - field rules declared on the blueprint (`validator` derive):
//!   non-empty device id and file prefix, batch size >= 1, delays >= 1ms
//! - connection string, when present, has HostName / DeviceId / SharedAccessKey
//! - generator baselines and alert threshold are finite

use contracts::{ConnectionString, ContractError, DeviceBlueprint};
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

/// Validate a DeviceBlueprint
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(blueprint: &DeviceBlueprint) -> Result<(), ContractError> {
    validate_fields(blueprint)?;
    validate_connection_string(blueprint)?;
    validate_generator(blueprint)?;
    Ok(())
}

fn validate_fields(blueprint: &DeviceBlueprint) -> Result<(), ContractError> {
    blueprint.validate().map_err(|errors| {
        let (field, message) = first_violation(&errors, "")
            .unwrap_or_else(|| ("blueprint".to_string(), errors.to_string()));
        ContractError::config_validation(field, message)
    })
}

/// Flatten nested validator output to the first `(path, message)` pair
fn first_violation(errors: &ValidationErrors, prefix: &str) -> Option<(String, String)> {
    let mut fields: Vec<_> = errors.errors().iter().collect();
    fields.sort_by(|a, b| a.0.cmp(b.0));

    for (field, kind) in fields {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };

        match kind {
            ValidationErrorsKind::Field(errs) => {
                if let Some(err) = errs.first() {
                    let message = err
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| err.code.to_string());
                    return Some((path, message));
                }
            }
            ValidationErrorsKind::Struct(inner) => {
                if let Some(found) = first_violation(inner, &path) {
                    return Some(found);
                }
            }
            ValidationErrorsKind::List(items) => {
                for (idx, inner) in items {
                    if let Some(found) = first_violation(inner, &format!("{path}[{idx}]")) {
                        return Some(found);
                    }
                }
            }
        }
    }
    None
}

fn validate_connection_string(blueprint: &DeviceBlueprint) -> Result<(), ContractError> {
    if let Some(raw) = &blueprint.iothub.connection_string {
        ConnectionString::parse(raw).map_err(|e| {
            ContractError::config_validation("iothub.connection_string", e.to_string())
        })?;
    }
    Ok(())
}

fn validate_generator(blueprint: &DeviceBlueprint) -> Result<(), ContractError> {
    let generator = &blueprint.generator;
    let checks = [
        ("generator.min_temperature", generator.min_temperature),
        ("generator.min_humidity", generator.min_humidity),
        (
            "generator.temperature_alert_threshold",
            generator.temperature_alert_threshold,
        ),
    ];

    for (field, value) in checks {
        if !value.is_finite() {
            return Err(ContractError::config_validation(
                field,
                format!("must be a finite number, got {value}"),
            ));
        }
    }
    Ok(())
}
