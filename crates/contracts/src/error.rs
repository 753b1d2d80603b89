//! Layered error definitions
//!
//! Categorized by source: config / connection / delivery / upload

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    /// Device connection string is malformed or unsupported
    #[error("invalid connection string: {message}")]
    InvalidConnectionString { message: String },

    /// Unknown delivery mode
    #[error("unknown delivery mode '{value}', expected 'realtime' or 'batch'")]
    UnknownMode { value: String },

    // ===== Ingestion Endpoint Errors =====
    /// Connection to the ingestion endpoint could not be opened
    #[error("connection error for '{endpoint}': {message}")]
    Connection { endpoint: String, message: String },

    /// Telemetry send failed
    #[error("telemetry send failed for message {message_id}: {message}")]
    Send { message_id: u64, message: String },

    /// SAS URI request failed
    #[error("upload target request failed for blob '{blob_name}': {message}")]
    UploadTarget { blob_name: String, message: String },

    /// Upload completion notification failed
    #[error("upload completion notification failed for '{correlation_id}': {message}")]
    UploadCompletion {
        correlation_id: String,
        message: String,
    },

    // ===== Blob Storage Errors =====
    /// Blob upload failed
    #[error("blob upload failed for '{blob_name}': {message}")]
    BlobUpload { blob_name: String, message: String },

    // ===== General Errors =====
    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create connection string error
    pub fn connection_string(message: impl Into<String>) -> Self {
        Self::InvalidConnectionString {
            message: message.into(),
        }
    }

    /// Create connection error
    pub fn connection(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Connection {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    /// Create telemetry send error
    pub fn send(message_id: u64, message: impl Into<String>) -> Self {
        Self::Send {
            message_id,
            message: message.into(),
        }
    }

    /// Create upload target error
    pub fn upload_target(blob_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::UploadTarget {
            blob_name: blob_name.into(),
            message: message.into(),
        }
    }

    /// Create upload completion error
    pub fn upload_completion(
        correlation_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::UploadCompletion {
            correlation_id: correlation_id.into(),
            message: message.into(),
        }
    }

    /// Create blob upload error
    pub fn blob_upload(blob_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BlobUpload {
            blob_name: blob_name.into(),
            message: message.into(),
        }
    }

    /// Whether this error belongs to the startup tier (configuration)
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::ConfigParse { .. }
                | Self::ConfigValidation { .. }
                | Self::InvalidConnectionString { .. }
                | Self::UnknownMode { .. }
        )
    }
}
