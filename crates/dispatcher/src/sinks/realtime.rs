//! RealtimeSink - sends every sample as its own telemetry message

use std::sync::Arc;

use contracts::{
    ContractError, IngestionClient, SessionState, TelemetryMessage, TelemetrySample, TelemetrySink,
};
use observability::metrics::{record_message_sent, trace_message};
use tracing::{info, instrument};

use crate::metrics::SinkMetrics;

/// Sink that forwards each sample immediately
pub struct RealtimeSink<C> {
    name: String,
    client: C,
    alert_threshold: f64,
    metrics: Arc<SinkMetrics>,
}

impl<C: IngestionClient + Sync> RealtimeSink<C> {
    pub fn new(name: impl Into<String>, client: C, alert_threshold: f64) -> Self {
        Self {
            name: name.into(),
            client,
            alert_threshold,
            metrics: Arc::new(SinkMetrics::new()),
        }
    }

    /// Get metrics handle
    pub fn metrics(&self) -> Arc<SinkMetrics> {
        Arc::clone(&self.metrics)
    }

    async fn send(&self, sample: &TelemetrySample) -> Result<(), ContractError> {
        let message = TelemetryMessage::from_sample(sample, self.alert_threshold)?;
        self.client.send_telemetry(&message).await?;

        let line = format!("Sending message: {}", message.payload_str());
        info!(
            sink = %self.name,
            message_id = sample.message_id,
            "{line}"
        );
        trace_message(&line);
        Ok(())
    }
}

impl<C: IngestionClient + Sync> TelemetrySink for RealtimeSink<C> {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(name = "realtime_sink_open", skip(self), fields(sink = %self.name))]
    async fn open(&mut self) -> Result<(), ContractError> {
        self.client.open().await?;
        info!(sink = %self.name, endpoint = %self.client.endpoint(), "Realtime sink opened");
        Ok(())
    }

    #[instrument(
        name = "realtime_sink_deliver",
        skip(self, sample, _session),
        fields(sink = %self.name, message_id = sample.message_id)
    )]
    async fn deliver(
        &mut self,
        sample: &TelemetrySample,
        _session: &SessionState,
    ) -> Result<(), ContractError> {
        let result = self.send(sample).await;

        record_message_sent(&self.name, result.is_ok());
        match &result {
            Ok(()) => self.metrics.inc_messages_sent(),
            Err(_) => self.metrics.inc_failure_count(),
        }
        result
    }

    fn reset(&mut self) {
        // Nothing buffered
    }

    #[instrument(name = "realtime_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        info!(
            sink = %self.name,
            sent = self.metrics.messages_sent(),
            "Realtime sink closed"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::TEMPERATURE_ALERT_PROPERTY;
    use device_client::{MockConfig, MockIngestionClient};

    async fn opened_sink(client: MockIngestionClient) -> RealtimeSink<MockIngestionClient> {
        let mut sink = RealtimeSink::new("realtime", client, 30.0);
        sink.open().await.unwrap();
        sink
    }

    #[tokio::test]
    async fn test_deliver_sends_tagged_message() {
        let handle = MockIngestionClient::new();
        let mut sink = opened_sink(handle.clone()).await;
        let mut session = SessionState::new();

        for (temperature, _) in [(25.0, "false"), (31.25, "true")] {
            let id = session.next_message_id();
            let sample = TelemetrySample::new(id, "dev", temperature, 70.0);
            sink.deliver(&sample, &session).await.unwrap();
        }

        let sent = handle.sent_messages();
        assert_eq!(handle.sent_ids(), vec![0, 1]);
        assert_eq!(sent[0].properties[TEMPERATURE_ALERT_PROPERTY], "false");
        assert_eq!(sent[1].properties[TEMPERATURE_ALERT_PROPERTY], "true");
        assert_eq!(
            sent[1].payload_str(),
            r#"{"messageId":1,"deviceId":"dev","temperature":31.25,"humidity":70.0}"#
        );
        assert_eq!(sink.metrics().messages_sent(), 2);
    }

    #[tokio::test]
    async fn test_deliver_propagates_send_error() {
        let client = MockIngestionClient::with_config(MockConfig {
            fail_all_sends: true,
            ..Default::default()
        });
        let mut sink = opened_sink(client).await;
        let session = SessionState::starting_at(1);

        let err = sink
            .deliver(&TelemetrySample::new(0, "dev", 20.0, 60.0), &session)
            .await
            .unwrap_err();
        assert!(matches!(err, ContractError::Send { message_id: 0, .. }));
        assert_eq!(sink.metrics().failure_count(), 1);
    }

    #[tokio::test]
    async fn test_open_failure_propagates() {
        let client = MockIngestionClient::with_config(MockConfig {
            fail_open: true,
            ..Default::default()
        });
        let mut sink = RealtimeSink::new("realtime", client, 30.0);
        assert!(sink.open().await.is_err());
    }
}
