//! Pipeline orchestrator - wires client, sink, generator and run loop.
//!
//! Runs against a real IoT hub over HTTPS, or against in-memory mocks.

use std::future::Future;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use contracts::{BlobStore, DeviceBlueprint, IngestionClient};
use device_client::{HttpBlobStore, HttpIngestionClient, MockBlobStore, MockIngestionClient};
use dispatcher::create_sink;
use ingestion::ReadingGenerator;
use supervisor::{FixedDelay, Simulator, SimulatorConfig};
use tracing::{info, warn};

use super::{PipelineStats, StopReason};

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Validated device configuration
    pub blueprint: DeviceBlueprint,

    /// Use in-memory collaborators instead of a hub
    pub mock: bool,

    /// Maximum number of samples to generate (None = unlimited)
    pub max_samples: Option<u64>,

    /// Run timeout (None = no timeout)
    pub timeout: Option<Duration>,
}

/// Main pipeline orchestrator
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a new pipeline with the given configuration
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run until the sample limit, the timeout or `shutdown` resolves
    pub async fn run(self, shutdown: impl Future<Output = ()>) -> Result<PipelineStats> {
        if self.config.mock {
            info!("Using in-memory ingestion endpoint (mock mode)");
            return self
                .run_with(MockIngestionClient::new(), MockBlobStore::new(), shutdown)
                .await;
        }

        let raw = self
            .config
            .blueprint
            .iothub
            .connection_string
            .as_deref()
            .context("IoT hub connection string is not configured")?;
        let client = HttpIngestionClient::from_connection_string(raw)
            .context("Invalid IoT hub connection string")?;
        let store = HttpBlobStore::new().context("Failed to create blob storage client")?;

        self.run_with(client, store, shutdown).await
    }

    async fn run_with<C, B>(
        self,
        client: C,
        store: B,
        shutdown: impl Future<Output = ()>,
    ) -> Result<PipelineStats>
    where
        C: IngestionClient + Sync,
        B: BlobStore + Sync,
    {
        let start_time = Instant::now();
        let blueprint = &self.config.blueprint;

        let sink = create_sink(blueprint, client, store).context("Failed to create sink")?;
        let sink_metrics = sink.metrics();
        let mode = sink.mode();

        let generator = ReadingGenerator::from_config(&blueprint.device.id, &blueprint.generator);
        let policy = FixedDelay::new(blueprint.timing.recovery_delay());
        let mut simulator = Simulator::new(
            generator,
            sink,
            policy,
            SimulatorConfig::from_blueprint(blueprint),
        );

        // The connection is opened once, outside the recovery loop
        simulator
            .open()
            .await
            .context("Failed to open ingestion connection")?;

        info!(
            mode = %mode,
            max_samples = ?self.config.max_samples,
            timeout_secs = ?self.config.timeout.map(|t| t.as_secs()),
            "Simulator running"
        );

        let max_samples = self.config.max_samples;
        let timeout = self.config.timeout;
        let bounded = async {
            match timeout {
                Some(limit) => match tokio::time::timeout(limit, simulator.run(max_samples)).await {
                    Ok(result) => result.map(|_| StopReason::SampleLimit),
                    Err(_) => {
                        warn!(timeout_secs = limit.as_secs(), "Simulator timed out");
                        Ok(StopReason::Timeout)
                    }
                },
                None => simulator.run(max_samples).await.map(|_| StopReason::SampleLimit),
            }
        };

        let stop_reason = tokio::select! {
            result = bounded => result.context("Run loop stopped")?,
            _ = shutdown => StopReason::Shutdown,
        };

        if let Err(e) = simulator.close().await {
            warn!(error = %e, "Failed to close sink");
        }

        Ok(PipelineStats {
            mode,
            stop_reason,
            duration: start_time.elapsed(),
            session: simulator.summary(),
            sink: sink_metrics.snapshot(),
        })
    }
}
