//! Device connection string
//!
//! Format: `HostName=<hub>;DeviceId=<id>;SharedAccessKey=<base64>`.
//! Unknown keys are ignored; values may contain `=` (base64 padding).
//! Module identities (`ModuleId=`) sign a different resource and are rejected.

use std::fmt;

use crate::error::ContractError;

/// Parsed device connection string
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionString {
    pub host_name: String,
    pub device_id: String,
    pub shared_access_key: String,
}

impl ConnectionString {
    /// Parse a connection string
    ///
    /// # Errors
    /// Missing `HostName`, `DeviceId` or `SharedAccessKey`, a segment without
    /// `=`, or a `ModuleId` segment.
    pub fn parse(raw: &str) -> Result<Self, ContractError> {
        let mut host_name = None;
        let mut device_id = None;
        let mut shared_access_key = None;

        for segment in raw.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            let (key, value) = segment.split_once('=').ok_or_else(|| {
                ContractError::connection_string(format!("segment '{segment}' has no '='"))
            })?;

            let slot = match key.trim() {
                "HostName" => &mut host_name,
                "DeviceId" => &mut device_id,
                "SharedAccessKey" => &mut shared_access_key,
                "ModuleId" => {
                    return Err(ContractError::connection_string(
                        "module identities are not supported, use a device connection string",
                    ))
                }
                _ => continue,
            };
            *slot = Some(value.trim().to_string());
        }

        let require = |value: Option<String>, name: &str| {
            value
                .filter(|v| !v.is_empty())
                .ok_or_else(|| ContractError::connection_string(format!("missing {name}")))
        };

        Ok(Self {
            host_name: require(host_name, "HostName")?,
            device_id: require(device_id, "DeviceId")?,
            shared_access_key: require(shared_access_key, "SharedAccessKey")?,
        })
    }

    /// Resource URI the SAS token is scoped to (`{host}/devices/{id}`)
    pub fn resource_uri(&self) -> String {
        format!("{}/devices/{}", self.host_name, self.device_id)
    }
}

// The key never shows up in logs
impl fmt::Debug for ConnectionString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionString")
            .field("host_name", &self.host_name)
            .field("device_id", &self.device_id)
            .field("shared_access_key", &"<redacted>")
            .finish()
    }
}

impl fmt::Display for ConnectionString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "HostName={};DeviceId={};SharedAccessKey=<redacted>",
            self.host_name, self.device_id
        )
    }
}
