//! DeliverySink - the mode-selected sink driven by the run loop

use std::sync::Arc;

use contracts::{
    BlobStore, ContractError, DeliveryMode, DeviceBlueprint, IngestionClient, SessionState,
    TelemetrySample, TelemetrySink,
};
use tracing::{info, instrument};

use crate::error::DispatcherError;
use crate::metrics::SinkMetrics;
use crate::sinks::{BatchSink, RealtimeSink};

/// One of the two delivery strategies, chosen once at startup
pub enum DeliverySink<C, B> {
    Realtime(RealtimeSink<C>),
    Batch(BatchSink<C, B>),
}

impl<C, B> DeliverySink<C, B>
where
    C: IngestionClient + Sync,
    B: BlobStore + Sync,
{
    pub fn mode(&self) -> DeliveryMode {
        match self {
            Self::Realtime(_) => DeliveryMode::Realtime,
            Self::Batch(_) => DeliveryMode::Batch,
        }
    }

    /// Get metrics handle of the active sink
    pub fn metrics(&self) -> Arc<SinkMetrics> {
        match self {
            Self::Realtime(sink) => sink.metrics(),
            Self::Batch(sink) => sink.metrics(),
        }
    }
}

impl<C, B> TelemetrySink for DeliverySink<C, B>
where
    C: IngestionClient + Sync,
    B: BlobStore + Sync,
{
    fn name(&self) -> &str {
        match self {
            Self::Realtime(sink) => sink.name(),
            Self::Batch(sink) => sink.name(),
        }
    }

    async fn open(&mut self) -> Result<(), ContractError> {
        match self {
            Self::Realtime(sink) => sink.open().await,
            Self::Batch(sink) => sink.open().await,
        }
    }

    async fn deliver(
        &mut self,
        sample: &TelemetrySample,
        session: &SessionState,
    ) -> Result<(), ContractError> {
        match self {
            Self::Realtime(sink) => sink.deliver(sample, session).await,
            Self::Batch(sink) => sink.deliver(sample, session).await,
        }
    }

    fn reset(&mut self) {
        match self {
            Self::Realtime(sink) => sink.reset(),
            Self::Batch(sink) => sink.reset(),
        }
    }

    async fn close(&mut self) -> Result<(), ContractError> {
        match self {
            Self::Realtime(sink) => sink.close().await,
            Self::Batch(sink) => sink.close().await,
        }
    }
}

/// Create the sink for the configured delivery mode
///
/// The blob store is only used in batch mode.
#[instrument(
    name = "dispatcher_create_sink",
    skip(blueprint, client, store),
    fields(mode = %blueprint.device.mode)
)]
pub fn create_sink<C, B>(
    blueprint: &DeviceBlueprint,
    client: C,
    store: B,
) -> Result<DeliverySink<C, B>, DispatcherError>
where
    C: IngestionClient + Sync,
    B: BlobStore + Sync,
{
    let mode = blueprint.device.mode;
    let name = mode.to_string();

    let sink = match mode {
        DeliveryMode::Realtime => DeliverySink::Realtime(RealtimeSink::new(
            name,
            client,
            blueprint.generator.temperature_alert_threshold,
        )),
        DeliveryMode::Batch => {
            let batch = &blueprint.batch;
            if batch.size == 0 {
                return Err(DispatcherError::sink_creation(name, "batch size must be >= 1"));
            }
            if batch.file_prefix.is_empty() {
                return Err(DispatcherError::sink_creation(name, "file prefix must not be empty"));
            }
            DeliverySink::Batch(BatchSink::new(
                name,
                client,
                store,
                batch.file_prefix.clone(),
                batch.size,
            ))
        }
    };

    info!(mode = %mode, "Delivery sink created");
    Ok(sink)
}
