//! Cloud collaborator traits
//!
//! The ingestion endpoint and blob storage are opaque external services.
//! Real HTTP clients and in-memory mocks both implement these.

use bytes::Bytes;

use crate::{ContractError, TelemetryMessage, UploadCompletion, UploadTarget};

/// Ingestion endpoint (device-to-cloud) client
#[trait_variant::make(IngestionClient: Send)]
pub trait LocalIngestionClient {
    /// Endpoint description (used for logging)
    fn endpoint(&self) -> &str;

    /// Open the connection to the ingestion endpoint
    async fn open(&mut self) -> Result<(), ContractError>;

    /// Send one telemetry message
    async fn send_telemetry(&self, message: &TelemetryMessage) -> Result<(), ContractError>;

    /// Request a pre-authorized upload target for `blob_name`
    async fn request_upload_target(&self, blob_name: &str) -> Result<UploadTarget, ContractError>;

    /// Report the outcome of an upload
    async fn notify_upload_complete(
        &self,
        completion: &UploadCompletion,
    ) -> Result<(), ContractError>;
}

/// Blob storage client
#[trait_variant::make(BlobStore: Send)]
pub trait LocalBlobStore {
    /// Upload `content` as a single blob at the pre-authorized `uri`
    async fn upload(&self, uri: &str, content: Bytes) -> Result<(), ContractError>;
}
