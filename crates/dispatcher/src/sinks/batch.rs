//! BatchSink - buffers samples as JSON Lines and uploads full batches as blobs

use std::sync::Arc;

use contracts::{
    BlobStore, ContractError, IngestionClient, SessionState, TelemetrySample, TelemetrySink,
    UploadCompletion,
};
use observability::metrics::{record_batch_flushed, trace_message};
use tracing::{debug, info, instrument, warn};

use crate::metrics::SinkMetrics;
use crate::sinks::buffer::{BatchBuffer, FileNamer};

/// Sink that accumulates `batch_size` samples per file and uploads each file
///
/// A flush hands the active buffer off before uploading, so after any flush,
/// successful or not, a fresh buffer with a new file name is active.
pub struct BatchSink<C, B> {
    name: String,
    client: C,
    store: B,
    batch_size: u64,
    namer: FileNamer,
    buffer: BatchBuffer,
    metrics: Arc<SinkMetrics>,
}

impl<C, B> BatchSink<C, B>
where
    C: IngestionClient + Sync,
    B: BlobStore + Sync,
{
    /// Create a batch sink; `batch_size` must be at least 1
    pub fn new(
        name: impl Into<String>,
        client: C,
        store: B,
        file_prefix: impl Into<String>,
        batch_size: u64,
    ) -> Self {
        let mut namer = FileNamer::new(file_prefix);
        let buffer = BatchBuffer::new(namer.next_name());
        Self {
            name: name.into(),
            client,
            store,
            batch_size,
            namer,
            buffer,
            metrics: Arc::new(SinkMetrics::new()),
        }
    }

    /// Get metrics handle
    pub fn metrics(&self) -> Arc<SinkMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Active buffer
    pub fn buffer(&self) -> &BatchBuffer {
        &self.buffer
    }

    pub fn batch_size(&self) -> u64 {
        self.batch_size
    }

    fn start_new_buffer(&mut self) -> BatchBuffer {
        let next = BatchBuffer::new(self.namer.next_name());
        std::mem::replace(&mut self.buffer, next)
    }

    /// Upload the active buffer: target, blob, completion
    #[instrument(
        name = "batch_sink_flush",
        skip(self),
        fields(sink = %self.name, blob_name = %self.buffer.file_name())
    )]
    async fn flush(&mut self) -> Result<(), ContractError> {
        let buffer = self.start_new_buffer();
        let samples = buffer.samples();
        let bytes = buffer.len();

        let result = self.upload(buffer).await;

        record_batch_flushed(samples, bytes, result.is_ok());
        match &result {
            Ok(blob_name) => {
                self.metrics.record_flush(bytes);
                let line = format!("Uploaded batch {blob_name} ({samples} samples, {bytes} bytes)");
                info!(sink = %self.name, blob_name = %blob_name, samples, bytes, "{line}");
                trace_message(&line);
            }
            Err(e) => {
                self.metrics.inc_failure_count();
                warn!(sink = %self.name, error = %e, samples, "Batch discarded");
            }
        }
        result.map(|_| ())
    }

    async fn upload(&self, buffer: BatchBuffer) -> Result<String, ContractError> {
        let blob_name = buffer.file_name().to_string();
        let target = self.client.request_upload_target(&blob_name).await?;

        self.store
            .upload(&target.blob_uri(), buffer.into_bytes())
            .await?;

        self.client
            .notify_upload_complete(&UploadCompletion::success(&target))
            .await?;
        Ok(blob_name)
    }
}

impl<C, B> TelemetrySink for BatchSink<C, B>
where
    C: IngestionClient + Sync,
    B: BlobStore + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(name = "batch_sink_open", skip(self), fields(sink = %self.name))]
    async fn open(&mut self) -> Result<(), ContractError> {
        self.client.open().await?;
        info!(
            sink = %self.name,
            endpoint = %self.client.endpoint(),
            batch_size = self.batch_size,
            file_name = %self.buffer.file_name(),
            "Batch sink opened"
        );
        Ok(())
    }

    #[instrument(
        name = "batch_sink_deliver",
        skip(self, sample, session),
        fields(sink = %self.name, message_id = sample.message_id)
    )]
    async fn deliver(
        &mut self,
        sample: &TelemetrySample,
        session: &SessionState,
    ) -> Result<(), ContractError> {
        let line = sample.to_json()?;
        self.buffer.append(&line);
        self.metrics.inc_samples_buffered();

        let message = format!("Write to {}: {}", self.buffer.file_name(), line);
        debug!(sink = %self.name, message_id = sample.message_id, "{message}");
        trace_message(&message);

        if session.batch_complete(self.batch_size) {
            self.flush().await?;
        }
        Ok(())
    }

    fn reset(&mut self) {
        let discarded = self.start_new_buffer();
        if !discarded.is_empty() {
            debug!(
                sink = %self.name,
                file_name = %discarded.file_name(),
                samples = discarded.samples(),
                "Partial batch discarded"
            );
        }
    }

    #[instrument(name = "batch_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        // A partial batch is not uploaded
        info!(
            sink = %self.name,
            flushed = self.metrics.batches_flushed(),
            pending = self.buffer.samples(),
            "Batch sink closed"
        );
        Ok(())
    }
}
