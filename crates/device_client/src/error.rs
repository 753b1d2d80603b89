//! Device client error types

use contracts::ContractError;
use thiserror::Error;

/// Device client specific error
#[derive(Debug, Error)]
pub enum DeviceClientError {
    /// Shared access key is not valid base64
    #[error("invalid shared access key: {0}")]
    InvalidKey(#[from] base64::DecodeError),

    /// Client used before `open`
    #[error("client for '{endpoint}' is not open")]
    NotOpen { endpoint: String },

    /// Transport failure
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Endpoint answered with a non-success status
    #[error("unexpected status {status} from {url}: {body}")]
    Status {
        status: u16,
        url: String,
        body: String,
    },

    /// Wrapped ContractError
    #[error(transparent)]
    Contract(#[from] ContractError),
}

/// Result alias
pub type Result<T> = std::result::Result<T, DeviceClientError>;
