//! HTTP blob store - uploads one block blob to a pre-authorized SAS URI

use std::time::Duration;

use bytes::Bytes;
use contracts::{BlobStore, ContractError};
use reqwest::Client;
use tracing::{debug, instrument};

use crate::http_client::ensure_success;

const UPLOAD_TIMEOUT: Duration = Duration::from_secs(300);

/// Blob storage client using `PUT` with `x-ms-blob-type: BlockBlob`
#[derive(Debug, Clone)]
pub struct HttpBlobStore {
    http: Client,
}

impl HttpBlobStore {
    /// Create a blob store client
    pub fn new() -> Result<Self, ContractError> {
        let http = Client::builder()
            .timeout(UPLOAD_TIMEOUT)
            .build()
            .map_err(|e| ContractError::connection("blob storage", e.to_string()))?;
        Ok(Self { http })
    }
}

/// Blob path without the SAS query (safe to log)
fn redact_sas(uri: &str) -> &str {
    uri.split_once('?').map_or(uri, |(path, _)| path)
}

impl BlobStore for HttpBlobStore {
    #[instrument(
        name = "blob_store_upload",
        skip(self, uri, content),
        fields(blob = %redact_sas(uri), bytes = content.len())
    )]
    async fn upload(&self, uri: &str, content: Bytes) -> Result<(), ContractError> {
        let size = content.len();
        let response = self
            .http
            .put(uri)
            .header("x-ms-blob-type", "BlockBlob")
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(content)
            .send()
            .await
            .map_err(|e| ContractError::blob_upload(redact_sas(uri), e.without_url().to_string()))?;

        ensure_success(response)
            .await
            .map_err(|e| ContractError::blob_upload(redact_sas(uri), e.to_string()))?;

        debug!(blob = %redact_sas(uri), bytes = size, "Blob uploaded");
        Ok(())
    }
}
