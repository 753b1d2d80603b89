//! TelemetrySink trait - delivery interface driven by the run loop
//!
//! Defines the abstract interface for Sinks.

use crate::{ContractError, SessionState, TelemetrySample};

/// Telemetry delivery trait
///
/// All sink implementations must implement this trait.
#[trait_variant::make(TelemetrySink: Send)]
pub trait LocalTelemetrySink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Open the underlying connection
    async fn open(&mut self) -> Result<(), ContractError>;

    /// Deliver (or buffer) one sample
    ///
    /// `session` is the state after the sample's id was allocated.
    ///
    /// # Errors
    /// Returns delivery error (should include context)
    async fn deliver(
        &mut self,
        sample: &TelemetrySample,
        session: &SessionState,
    ) -> Result<(), ContractError>;

    /// Drop any partial state after a failed iteration
    fn reset(&mut self);

    /// Close sink
    async fn close(&mut self) -> Result<(), ContractError>;
}
