//! Simulator - generator + sink + recovery, one sample per iteration

use std::time::Duration;

use contracts::{
    ContractError, DeviceBlueprint, SessionState, TelemetrySink, DEFAULT_TEMPERATURE_ALERT_THRESHOLD,
};
use ingestion::ReadingGenerator;
use observability::metrics::{
    error_chain, record_recovery, record_sample_generated, trace_exception,
};
use observability::{SessionMetricsAggregator, SessionSummary};
use tracing::{debug, error, info, instrument, warn};

use crate::error::SupervisorError;
use crate::policy::RetryPolicy;

/// Run loop state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Generating and delivering samples
    Running,
    /// Pausing after a failed iteration
    Recovering,
}

/// What one iteration did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Sample delivered, pacing delay applied
    Delivered { message_id: u64 },
    /// Delivery failed, recovery applied
    Recovered { message_id: u64 },
}

/// Loop timing and tagging
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulatorConfig {
    /// Pause after a successful iteration
    pub send_interval: Duration,
    /// Threshold used for alert statistics
    pub alert_threshold: f64,
}

impl SimulatorConfig {
    pub fn from_blueprint(blueprint: &DeviceBlueprint) -> Self {
        Self {
            send_interval: blueprint.timing.send_interval(),
            alert_threshold: blueprint.generator.temperature_alert_threshold,
        }
    }
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            send_interval: Duration::from_millis(500),
            alert_threshold: DEFAULT_TEMPERATURE_ALERT_THRESHOLD,
        }
    }
}

/// Drives one sink with samples until stopped
///
/// Owns the session state; the generator and the sink only see it by
/// reference for the duration of a call.
pub struct Simulator<S, P> {
    generator: ReadingGenerator,
    sink: S,
    policy: P,
    config: SimulatorConfig,
    session: SessionState,
    state: LoopState,
    consecutive_failures: u32,
    metrics: SessionMetricsAggregator,
}

impl<S, P> Simulator<S, P>
where
    S: TelemetrySink,
    P: RetryPolicy,
{
    pub fn new(generator: ReadingGenerator, sink: S, policy: P, config: SimulatorConfig) -> Self {
        Self::with_session(generator, sink, policy, config, SessionState::new())
    }

    /// Start from an existing session (e.g. near the counter's maximum)
    pub fn with_session(
        generator: ReadingGenerator,
        sink: S,
        policy: P,
        config: SimulatorConfig,
        session: SessionState,
    ) -> Self {
        Self {
            generator,
            sink,
            policy,
            config,
            session,
            state: LoopState::Running,
            consecutive_failures: 0,
            metrics: SessionMetricsAggregator::new(),
        }
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Aggregated statistics so far
    pub fn summary(&self) -> SessionSummary {
        self.metrics.summary()
    }

    /// Open the sink; failure here is a startup error
    #[instrument(name = "simulator_open", skip(self), fields(sink = %self.sink.name()))]
    pub async fn open(&mut self) -> Result<(), SupervisorError> {
        self.sink.open().await.map_err(|source| SupervisorError::Open {
            sink: self.sink.name().to_string(),
            source,
        })?;
        info!(
            sink = %self.sink.name(),
            device_id = %self.generator.device_id(),
            "Simulator ready"
        );
        Ok(())
    }

    /// Run one iteration: generate, deliver, then pace or recover
    ///
    /// # Errors
    /// Only when the retry policy gives up.
    pub async fn step(&mut self) -> Result<StepOutcome, SupervisorError> {
        let sample = self.generator.next_sample(&mut self.session);
        record_sample_generated(&sample);
        self.metrics
            .record_sample(&sample, self.config.alert_threshold);

        match self.sink.deliver(&sample, &self.session).await {
            Ok(()) => {
                self.consecutive_failures = 0;
                self.metrics.record_delivered();
                tokio::time::sleep(self.config.send_interval).await;
                Ok(StepOutcome::Delivered {
                    message_id: sample.message_id,
                })
            }
            Err(err) => {
                self.recover(sample.message_id, err).await?;
                Ok(StepOutcome::Recovered {
                    message_id: sample.message_id,
                })
            }
        }
    }

    async fn recover(&mut self, message_id: u64, err: ContractError) -> Result<(), SupervisorError> {
        self.state = LoopState::Recovering;
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);

        error!(
            sink = %self.sink.name(),
            message_id,
            error = %err,
            chain = %error_chain(&err),
            "Iteration failed"
        );
        trace_exception(&err);

        let Some(delay) = self.policy.backoff(self.consecutive_failures) else {
            warn!(
                attempts = self.consecutive_failures,
                "Retry policy gave up"
            );
            return Err(SupervisorError::GaveUp {
                attempts: self.consecutive_failures,
                source: err,
            });
        };

        info!(delay_ms = delay.as_millis() as u64, "Suspend");
        tokio::time::sleep(delay).await;

        if self.policy.resets_session() {
            self.session.reset();
            self.sink.reset();
        }
        record_recovery();
        self.metrics.record_recovery();
        self.state = LoopState::Running;
        Ok(())
    }

    /// Run until `max_samples` iterations have completed (forever when `None`)
    ///
    /// Returns the number of iterations run. Cancel-safe at iteration
    /// granularity: dropping the future mid-iteration leaves the session
    /// and sink usable.
    #[instrument(name = "simulator_run", skip(self), fields(sink = %self.sink.name()))]
    pub async fn run(&mut self, max_samples: Option<u64>) -> Result<u64, SupervisorError> {
        let mut iterations: u64 = 0;
        while max_samples.is_none_or(|max| iterations < max) {
            self.step().await?;
            iterations += 1;

            if iterations.is_multiple_of(100) {
                debug!(iterations, "Simulator progress");
            }
        }
        info!(iterations, "Sample limit reached");
        Ok(iterations)
    }

    /// Close the sink
    pub async fn close(&mut self) -> Result<(), ContractError> {
        self.sink.close().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::TelemetrySample;
    use std::collections::VecDeque;
    use tokio::time::Instant;

    /// Sink that records deliveries and fails on scripted calls
    #[derive(Default)]
    struct ScriptedSink {
        delivered: Vec<(u64, u64)>,
        failures: VecDeque<bool>,
        resets: usize,
        opened: bool,
        fail_open: bool,
    }

    impl ScriptedSink {
        fn failing_on(pattern: &[bool]) -> Self {
            Self {
                failures: pattern.iter().copied().collect(),
                ..Default::default()
            }
        }
    }

    impl TelemetrySink for ScriptedSink {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn open(&mut self) -> Result<(), ContractError> {
            if self.fail_open {
                return Err(ContractError::connection("scripted", "refused"));
            }
            self.opened = true;
            Ok(())
        }

        async fn deliver(
            &mut self,
            sample: &TelemetrySample,
            session: &SessionState,
        ) -> Result<(), ContractError> {
            if self.failures.pop_front().unwrap_or(false) {
                return Err(ContractError::send(sample.message_id, "scripted failure"));
            }
            self.delivered.push((sample.message_id, session.counter()));
            Ok(())
        }

        fn reset(&mut self) {
            self.resets += 1;
        }

        async fn close(&mut self) -> Result<(), ContractError> {
            Ok(())
        }
    }

    struct GiveUpAfter(u32);

    impl RetryPolicy for GiveUpAfter {
        fn backoff(&self, consecutive_failures: u32) -> Option<Duration> {
            (consecutive_failures < self.0).then_some(Duration::from_millis(10))
        }
    }

    fn simulator<P: RetryPolicy>(sink: ScriptedSink, policy: P) -> Simulator<ScriptedSink, P> {
        let generator = ReadingGenerator::seeded("dev", 20.0, 60.0, 7);
        Simulator::new(generator, sink, policy, SimulatorConfig::default())
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_paces_and_increments() {
        let mut sim = simulator(ScriptedSink::default(), crate::FixedDelay::default());
        sim.open().await.unwrap();

        let start = Instant::now();
        assert_eq!(sim.run(Some(10)).await.unwrap(), 10);

        assert_eq!(start.elapsed(), Duration::from_millis(5_000));
        let ids: Vec<u64> = sim.sink().delivered.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, (0..10).collect::<Vec<_>>());
        // sink sees the post-increment counter
        assert_eq!(sim.sink().delivered[2], (2, 3));
        assert_eq!(sim.summary().delivered, 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_pauses_and_resets_counter() {
        let sink = ScriptedSink::failing_on(&[false, false, true]);
        let mut sim = simulator(sink, crate::FixedDelay::default());

        let start = Instant::now();
        sim.step().await.unwrap();
        sim.step().await.unwrap();
        let outcome = sim.step().await.unwrap();

        assert_eq!(outcome, StepOutcome::Recovered { message_id: 2 });
        assert_eq!(start.elapsed(), Duration::from_millis(2 * 500 + 1000));
        assert_eq!(sim.session().counter(), 0);
        assert_eq!(sim.state(), LoopState::Running);
        assert_eq!(sim.sink().resets, 1);

        // numbering restarts at zero
        assert_eq!(
            sim.step().await.unwrap(),
            StepOutcome::Delivered { message_id: 0 }
        );
        assert_eq!(sim.summary().recoveries, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeated_failures_never_stop_fixed_delay() {
        let sink = ScriptedSink::failing_on(&[true; 20]);
        let mut sim = simulator(sink, crate::FixedDelay::default());

        let start = Instant::now();
        sim.run(Some(20)).await.unwrap();

        assert_eq!(start.elapsed(), Duration::from_millis(20 * 1000));
        assert!(sim.sink().delivered.is_empty());
        assert_eq!(sim.summary().recoveries, 20);
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_policy_gives_up() {
        let sink = ScriptedSink::failing_on(&[true, true, true]);
        let mut sim = simulator(sink, GiveUpAfter(2));

        let err = sim.run(None).await.unwrap_err();
        assert!(matches!(err, SupervisorError::GaveUp { attempts: 2, .. }));
        assert_eq!(sim.state(), LoopState::Recovering);
    }

    #[tokio::test]
    async fn test_open_failure_is_reported() {
        let sink = ScriptedSink {
            fail_open: true,
            ..Default::default()
        };
        let mut sim = simulator(sink, crate::FixedDelay::default());
        let err = sim.open().await.unwrap_err();
        assert!(err.to_string().contains("scripted"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wrap_is_not_a_failure() {
        let generator = ReadingGenerator::seeded("dev", 20.0, 60.0, 1);
        let mut sim = Simulator::with_session(
            generator,
            ScriptedSink::default(),
            crate::FixedDelay::default(),
            SimulatorConfig::default(),
            SessionState::starting_at(u64::MAX),
        );

        sim.run(Some(2)).await.unwrap();
        assert_eq!(sim.sink().delivered, vec![(u64::MAX, 0), (0, 1)]);
        assert_eq!(sim.sink().resets, 0);
    }
}
