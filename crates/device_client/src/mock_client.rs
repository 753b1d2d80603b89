//! Mock ingestion endpoint and blob store
//!
//! In-memory implementations that record every call and can inject failures.
//! Clones share state, so a test keeps one handle while the sink owns another.

use std::sync::{Arc, Mutex};

use bytes::Bytes;
use contracts::{
    BlobStore, ContractError, IngestionClient, TelemetryMessage, UploadCompletion, UploadTarget,
};
use tracing::instrument;

/// Failure injection for the mock ingestion client
#[derive(Debug, Default, Clone)]
pub struct MockConfig {
    /// `open` fails
    pub fail_open: bool,
    /// Every send fails
    pub fail_all_sends: bool,
    /// Message ids whose send fails
    pub fail_send_ids: Vec<u64>,
}

#[derive(Debug, Default)]
struct ClientState {
    opened: bool,
    sent: Vec<TelemetryMessage>,
    upload_requests: Vec<String>,
    completions: Vec<UploadCompletion>,
    fail_next_sends: usize,
    fail_next_upload_targets: usize,
    fail_next_notifications: usize,
}

/// Mock ingestion client
#[derive(Debug, Clone)]
pub struct MockIngestionClient {
    config: MockConfig,
    state: Arc<Mutex<ClientState>>,
}

impl MockIngestionClient {
    /// Storage host used in mock upload targets
    pub const STORAGE_HOST: &'static str = "mockstorage.blob.core.windows.net";
    /// Container used in mock upload targets
    pub const CONTAINER: &'static str = "telemetry";

    /// Create default mock client
    pub fn new() -> Self {
        Self::with_config(MockConfig::default())
    }

    /// Create mock client with failure injection
    pub fn with_config(config: MockConfig) -> Self {
        Self {
            config,
            state: Arc::new(Mutex::new(ClientState::default())),
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, ClientState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Fail the next `count` sends
    pub fn fail_next_sends(&self, count: usize) {
        self.state().fail_next_sends = count;
    }

    /// Fail the next `count` upload target requests
    pub fn fail_next_upload_targets(&self, count: usize) {
        self.state().fail_next_upload_targets = count;
    }

    /// Fail the next `count` completion notifications
    pub fn fail_next_notifications(&self, count: usize) {
        self.state().fail_next_notifications = count;
    }

    /// Whether `open` has succeeded
    pub fn is_open(&self) -> bool {
        self.state().opened
    }

    /// Messages sent so far
    pub fn sent_messages(&self) -> Vec<TelemetryMessage> {
        self.state().sent.clone()
    }

    /// Message ids sent so far, in order
    pub fn sent_ids(&self) -> Vec<u64> {
        self.state().sent.iter().map(|m| m.message_id).collect()
    }

    /// File names passed to `request_upload_target`, in order
    pub fn upload_requests(&self) -> Vec<String> {
        self.state().upload_requests.clone()
    }

    /// Completion notifications received, in order
    pub fn completions(&self) -> Vec<UploadCompletion> {
        self.state().completions.clone()
    }

    fn ensure_open(&self) -> Result<(), ContractError> {
        if self.state().opened {
            Ok(())
        } else {
            Err(ContractError::connection("mock", "not open"))
        }
    }

    /// Consume one pending injected failure from `counter`
    fn take_failure(counter: &mut usize) -> bool {
        if *counter > 0 {
            *counter -= 1;
            true
        } else {
            false
        }
    }
}

impl Default for MockIngestionClient {
    fn default() -> Self {
        Self::new()
    }
}

impl IngestionClient for MockIngestionClient {
    fn endpoint(&self) -> &str {
        "mock"
    }

    #[instrument(name = "mock_client_open", skip(self))]
    async fn open(&mut self) -> Result<(), ContractError> {
        if self.config.fail_open {
            return Err(ContractError::connection("mock", "mock open failure"));
        }
        self.state().opened = true;
        Ok(())
    }

    #[instrument(name = "mock_client_send", skip(self, message), fields(message_id = message.message_id))]
    async fn send_telemetry(&self, message: &TelemetryMessage) -> Result<(), ContractError> {
        self.ensure_open()?;

        let mut state = self.state();
        if self.config.fail_all_sends
            || self.config.fail_send_ids.contains(&message.message_id)
            || Self::take_failure(&mut state.fail_next_sends)
        {
            return Err(ContractError::send(message.message_id, "mock send failure"));
        }

        state.sent.push(message.clone());
        Ok(())
    }

    #[instrument(name = "mock_client_upload_target", skip(self))]
    async fn request_upload_target(&self, blob_name: &str) -> Result<UploadTarget, ContractError> {
        self.ensure_open()?;

        let mut state = self.state();
        if Self::take_failure(&mut state.fail_next_upload_targets) {
            return Err(ContractError::upload_target(blob_name, "mock upload target failure"));
        }

        state.upload_requests.push(blob_name.to_string());
        Ok(UploadTarget {
            correlation_id: format!("mock-correlation-{}", state.upload_requests.len()),
            host_name: Self::STORAGE_HOST.to_string(),
            container_name: Self::CONTAINER.to_string(),
            blob_name: blob_name.to_string(),
            sas_token: "?sv=mock&sig=mock".to_string(),
        })
    }

    #[instrument(name = "mock_client_notify", skip(self, completion))]
    async fn notify_upload_complete(
        &self,
        completion: &UploadCompletion,
    ) -> Result<(), ContractError> {
        self.ensure_open()?;

        let mut state = self.state();
        if Self::take_failure(&mut state.fail_next_notifications) {
            return Err(ContractError::upload_completion(
                &completion.correlation_id,
                "mock notification failure",
            ));
        }

        state.completions.push(completion.clone());
        Ok(())
    }
}

#[derive(Debug, Default)]
struct BlobState {
    uploads: Vec<(String, Bytes)>,
    fail_next_uploads: usize,
}

/// Mock blob store
#[derive(Debug, Clone, Default)]
pub struct MockBlobStore {
    state: Arc<Mutex<BlobState>>,
}

impl MockBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, BlobState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Fail the next `count` uploads
    pub fn fail_next_uploads(&self, count: usize) {
        self.state().fail_next_uploads = count;
    }

    /// Uploaded `(uri, content)` pairs, in order
    pub fn uploads(&self) -> Vec<(String, Bytes)> {
        self.state().uploads.clone()
    }

    /// Uploaded blob contents as text, in order
    pub fn uploaded_texts(&self) -> Vec<String> {
        self.state()
            .uploads
            .iter()
            .map(|(_, content)| String::from_utf8_lossy(content).into_owned())
            .collect()
    }
}

impl BlobStore for MockBlobStore {
    #[instrument(name = "mock_blob_upload", skip(self, content), fields(bytes = content.len()))]
    async fn upload(&self, uri: &str, content: Bytes) -> Result<(), ContractError> {
        let mut state = self.state();
        if MockIngestionClient::take_failure(&mut state.fail_next_uploads) {
            return Err(ContractError::blob_upload(uri, "mock upload failure"));
        }
        state.uploads.push((uri.to_string(), content));
        Ok(())
    }
}
