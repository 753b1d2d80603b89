//! # Device Client
//!
//! Cloud collaborator clients for the simulated device.
//!
//! Responsibilities:
//! - Sign requests with shared access signature tokens
//! - Send telemetry and run the SAS-URI upload exchange over HTTPS
//! - Upload blobs to pre-authorized URIs
//! - Provide recording mocks with failure injection for tests and `--mock` runs

pub mod blob_store;
pub mod error;
pub mod http_client;
pub mod mock_client;
pub mod sas;

pub use blob_store::HttpBlobStore;
pub use contracts::{BlobStore, ConnectionString, IngestionClient};
pub use error::{DeviceClientError, Result};
pub use http_client::HttpIngestionClient;
pub use mock_client::{MockBlobStore, MockConfig, MockIngestionClient};
pub use sas::{generate_sas_token, SasTokenProvider};
