//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 合约快照测试
//! - 模拟 e2e 测试（无需 IoT Hub）
//! - 故障恢复场景

#[cfg(test)]
mod contract_tests {
    use contracts::{SessionState, TelemetryMessage, TelemetrySample};

    #[test]
    fn test_payload_snapshot() {
        let sample = TelemetrySample::new(0, "myFirstDevice4Rust", 27.314, 71.0);
        let message = TelemetryMessage::from_sample(&sample, 30.0).unwrap();

        assert_eq!(
            message.payload_str(),
            r#"{"messageId":0,"deviceId":"myFirstDevice4Rust","temperature":27.31,"humidity":71.0}"#
        );
        assert_eq!(message.properties["temperatureAlert"], "false");
    }

    #[test]
    fn test_counter_wraps_to_zero() {
        let mut session = SessionState::starting_at(u64::MAX);
        assert_eq!(session.next_message_id(), u64::MAX);
        assert_eq!(session.next_message_id(), 0);
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::time::Duration;

    use contracts::{DeliveryMode, DeviceBlueprint, TelemetrySample};
    use device_client::{MockBlobStore, MockConfig, MockIngestionClient};
    use dispatcher::{create_sink, DeliverySink};
    use ingestion::ReadingGenerator;
    use supervisor::{FixedDelay, Simulator, SimulatorConfig, StepOutcome};
    use tokio::time::Instant;

    type MockSimulator = Simulator<DeliverySink<MockIngestionClient, MockBlobStore>, FixedDelay>;

    fn blueprint(mode: DeliveryMode, batch_size: u64) -> DeviceBlueprint {
        let mut blueprint = DeviceBlueprint::default();
        blueprint.device.id = "e2e-device".to_string();
        blueprint.device.mode = mode;
        blueprint.batch.size = batch_size;
        blueprint.generator.seed = Some(2024);
        blueprint
    }

    async fn simulator(
        blueprint: &DeviceBlueprint,
        client: MockIngestionClient,
        store: MockBlobStore,
    ) -> MockSimulator {
        let sink = create_sink(blueprint, client, store).unwrap();
        let generator = ReadingGenerator::from_config(&blueprint.device.id, &blueprint.generator);
        let mut simulator = Simulator::new(
            generator,
            sink,
            FixedDelay::new(blueprint.timing.recovery_delay()),
            SimulatorConfig::from_blueprint(blueprint),
        );
        simulator.open().await.unwrap();
        simulator
    }

    fn ids_of(text: &str) -> Vec<u64> {
        text.lines()
            .map(|line| {
                serde_json::from_str::<TelemetrySample>(line)
                    .unwrap()
                    .message_id
            })
            .collect()
    }

    /// Realtime with a healthy endpoint: ten iterations, ids 0..9, no uploads
    #[tokio::test(start_paused = true)]
    async fn test_realtime_ten_iterations() {
        let client = MockIngestionClient::new();
        let store = MockBlobStore::new();
        let mut sim = simulator(
            &blueprint(DeliveryMode::Realtime, 10),
            client.clone(),
            store.clone(),
        )
        .await;

        sim.run(Some(10)).await.unwrap();

        assert_eq!(client.sent_ids(), (0..10).collect::<Vec<_>>());
        assert!(client.upload_requests().is_empty());
        assert!(store.uploads().is_empty());
        for message in client.sent_messages() {
            let sample: TelemetrySample = serde_json::from_slice(&message.payload).unwrap();
            assert_eq!(sample.device_id, "e2e-device");
            let expected = (sample.temperature > 30.0).to_string();
            assert_eq!(message.properties["temperatureAlert"], expected);
        }
    }

    /// Batch B=3: flush after id 2, next file starts at id 3
    #[tokio::test(start_paused = true)]
    async fn test_batch_of_three() {
        let client = MockIngestionClient::new();
        let store = MockBlobStore::new();
        let mut sim = simulator(&blueprint(DeliveryMode::Batch, 3), client.clone(), store.clone())
            .await;

        sim.run(Some(2)).await.unwrap();
        assert!(store.uploads().is_empty());

        sim.run(Some(1)).await.unwrap();
        assert_eq!(ids_of(&store.uploaded_texts()[0]), vec![0, 1, 2]);

        sim.run(Some(3)).await.unwrap();
        let texts = store.uploaded_texts();
        assert_eq!(texts.len(), 2);
        assert_eq!(ids_of(&texts[1]), vec![3, 4, 5]);

        let requests = client.upload_requests();
        assert_eq!(requests.len(), 2);
        assert_ne!(requests[0], requests[1]);
        assert!(requests.iter().all(|name| name.starts_with("telemetry-")));
        assert!(requests.iter().all(|name| name.ends_with(".jsonl")));
        assert_eq!(client.completions().len(), 2);
        assert!(client.sent_ids().is_empty());
    }

    /// A failure inside an iteration: pause, counter reset, loop continues
    #[tokio::test(start_paused = true)]
    async fn test_realtime_failure_resets_counter() {
        let client = MockIngestionClient::with_config(MockConfig {
            fail_send_ids: vec![4],
            ..Default::default()
        });
        let mut sim = simulator(
            &blueprint(DeliveryMode::Realtime, 10),
            client.clone(),
            MockBlobStore::new(),
        )
        .await;

        let start = Instant::now();
        let mut outcomes = Vec::new();
        for _ in 0..8 {
            outcomes.push(sim.step().await.unwrap());
        }

        assert_eq!(outcomes[4], StepOutcome::Recovered { message_id: 4 });
        // 0..3 sent, 4 failed, numbering restarts at 0
        assert_eq!(client.sent_ids(), vec![0, 1, 2, 3, 0, 1, 2]);
        assert_eq!(outcomes[7], StepOutcome::Delivered { message_id: 2 });
        assert_eq!(
            start.elapsed(),
            Duration::from_millis(7 * 500 + 1000)
        );
        assert_eq!(sim.summary().recoveries, 1);
    }

    /// Failed upload: batch discarded, counter reset, next batch starts at 0
    #[tokio::test(start_paused = true)]
    async fn test_batch_upload_failure_recovers() {
        let client = MockIngestionClient::new();
        let store = MockBlobStore::new();
        store.fail_next_uploads(1);
        let mut sim = simulator(&blueprint(DeliveryMode::Batch, 3), client.clone(), store.clone())
            .await;

        let outcomes: Vec<StepOutcome> = {
            let mut outcomes = Vec::new();
            for _ in 0..6 {
                outcomes.push(sim.step().await.unwrap());
            }
            outcomes
        };

        assert_eq!(outcomes[2], StepOutcome::Recovered { message_id: 2 });
        assert_eq!(sim.session().counter(), 3);

        let texts = store.uploaded_texts();
        assert_eq!(texts.len(), 1);
        assert_eq!(ids_of(&texts[0]), vec![0, 1, 2]);

        // the failed file and the successful one have different names
        let requests = client.upload_requests();
        assert_eq!(requests.len(), 2);
        assert_ne!(requests[0], requests[1]);
        assert_eq!(client.completions().len(), 1);
    }

    /// Failed SAS-URI request: nothing uploaded, counter reset, next window uploads
    #[tokio::test(start_paused = true)]
    async fn test_batch_upload_target_failure_recovers() {
        let client = MockIngestionClient::new();
        let store = MockBlobStore::new();
        let mut sim = simulator(&blueprint(DeliveryMode::Batch, 2), client.clone(), store.clone())
            .await;
        client.fail_next_upload_targets(1);

        let mut outcomes = Vec::new();
        for _ in 0..4 {
            outcomes.push(sim.step().await.unwrap());
        }

        assert_eq!(
            outcomes,
            vec![
                StepOutcome::Delivered { message_id: 0 },
                StepOutcome::Recovered { message_id: 1 },
                StepOutcome::Delivered { message_id: 0 },
                StepOutcome::Delivered { message_id: 1 },
            ]
        );
        assert_eq!(sim.session().counter(), 2);

        let texts = store.uploaded_texts();
        assert_eq!(texts.len(), 1);
        assert_eq!(ids_of(&texts[0]), vec![0, 1]);
        assert_eq!(client.upload_requests().len(), 1);
        assert_eq!(client.completions().len(), 1);
    }

    /// Unknown mode is rejected before any sample exists
    #[test]
    fn test_unknown_mode_is_startup_error() {
        let err = config_loader::ConfigLoader::load_from_str(
            "[device]\nmode = \"stream\"\n",
            config_loader::ConfigFormat::Toml,
        )
        .unwrap_err();
        assert!(err.is_config_error());
        assert!(err.to_string().contains("stream"));

        let err = "stream".parse::<DeliveryMode>().unwrap_err();
        assert!(matches!(err, contracts::ContractError::UnknownMode { .. }));
    }

    #[tokio::test]
    async fn test_open_failure_is_startup_error() {
        let client = MockIngestionClient::with_config(MockConfig {
            fail_open: true,
            ..Default::default()
        });
        let blueprint = blueprint(DeliveryMode::Realtime, 10);
        let sink = create_sink(&blueprint, client.clone(), MockBlobStore::new()).unwrap();
        let generator = ReadingGenerator::from_config(&blueprint.device.id, &blueprint.generator);
        let mut sim = Simulator::new(
            generator,
            sink,
            FixedDelay::default(),
            SimulatorConfig::default(),
        );

        assert!(sim.open().await.is_err());
        assert!(client.sent_ids().is_empty());
    }
}
