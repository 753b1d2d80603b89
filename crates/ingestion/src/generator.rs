//! Reading generator
//!
//! Produces one synthetic reading per call: a uniform draw above a fixed
//! baseline. Offsets are drawn on a 0.01 grid, so rounding to two decimals never
//! pushes a value out of its half-open range.

use contracts::{round_to_hundredths, GeneratorConfig, SessionState, TelemetrySample};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::trace;

/// Width of the temperature range above the baseline
pub const TEMPERATURE_SPAN: f64 = 15.0;

/// Width of the humidity range above the baseline
pub const HUMIDITY_SPAN: f64 = 20.0;

/// Synthetic temperature/humidity source
#[derive(Debug)]
pub struct ReadingGenerator {
    device_id: String,
    min_temperature: f64,
    min_humidity: f64,
    rng: StdRng,
}

impl ReadingGenerator {
    /// Create a generator seeded from OS entropy
    pub fn new(device_id: impl Into<String>, min_temperature: f64, min_humidity: f64) -> Self {
        Self::with_rng(device_id, min_temperature, min_humidity, StdRng::from_os_rng())
    }

    /// Create a reproducible generator
    pub fn seeded(
        device_id: impl Into<String>,
        min_temperature: f64,
        min_humidity: f64,
        seed: u64,
    ) -> Self {
        Self::with_rng(
            device_id,
            min_temperature,
            min_humidity,
            StdRng::seed_from_u64(seed),
        )
    }

    /// Create from generator configuration
    pub fn from_config(device_id: impl Into<String>, config: &GeneratorConfig) -> Self {
        match config.seed {
            Some(seed) => Self::seeded(device_id, config.min_temperature, config.min_humidity, seed),
            None => Self::new(device_id, config.min_temperature, config.min_humidity),
        }
    }

    fn with_rng(
        device_id: impl Into<String>,
        min_temperature: f64,
        min_humidity: f64,
        rng: StdRng,
    ) -> Self {
        // Baselines live on the same 0.01 grid as the offsets
        Self {
            device_id: device_id.into(),
            min_temperature: round_to_hundredths(min_temperature),
            min_humidity: round_to_hundredths(min_humidity),
            rng,
        }
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    /// Temperature baseline in use
    pub fn min_temperature(&self) -> f64 {
        self.min_temperature
    }

    /// Humidity baseline in use
    pub fn min_humidity(&self) -> f64 {
        self.min_humidity
    }

    /// Produce the next sample, allocating its id from `session`
    pub fn next_sample(&mut self, session: &mut SessionState) -> TelemetrySample {
        let temperature = self.min_temperature + self.draw_offset(TEMPERATURE_SPAN);
        let humidity = self.min_humidity + self.draw_offset(HUMIDITY_SPAN);
        let message_id = session.next_message_id();

        let sample = TelemetrySample::new(message_id, self.device_id.as_str(), temperature, humidity);
        trace!(
            message_id,
            temperature = sample.temperature,
            humidity = sample.humidity,
            "Sample generated"
        );
        sample
    }

    /// Uniform offset in `[0, span)` on a 0.01 grid
    fn draw_offset(&mut self, span: f64) -> f64 {
        let steps = (span * 100.0) as u64;
        self.rng.random_range(0..steps) as f64 / 100.0
    }
}
