//! Supervisor error types

use contracts::ContractError;
use thiserror::Error;

/// Errors that stop the run loop
#[derive(Debug, Error)]
pub enum SupervisorError {
    /// Sink could not be opened before the loop started
    #[error("failed to open sink '{sink}': {source}")]
    Open {
        sink: String,
        #[source]
        source: ContractError,
    },

    /// The retry policy declined another attempt
    #[error("retry policy gave up after {attempts} consecutive failures: {source}")]
    GaveUp {
        attempts: u32,
        #[source]
        source: ContractError,
    },
}
