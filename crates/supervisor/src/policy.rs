//! Retry policies for the run loop

use std::time::Duration;

/// Decides what happens after a failed iteration
pub trait RetryPolicy: Send {
    /// Pause before the next attempt, or `None` to stop the loop
    ///
    /// `consecutive_failures` counts failed iterations since the last success,
    /// starting at 1.
    fn backoff(&self, consecutive_failures: u32) -> Option<Duration>;

    /// Whether recovery resets the message-id counter and the sink's partial state
    fn resets_session(&self) -> bool {
        true
    }
}

/// Same pause after every failure, forever
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedDelay {
    delay: Duration,
}

impl FixedDelay {
    /// Default recovery pause
    pub const DEFAULT_DELAY: Duration = Duration::from_millis(1000);

    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl Default for FixedDelay {
    fn default() -> Self {
        Self::new(Self::DEFAULT_DELAY)
    }
}

impl RetryPolicy for FixedDelay {
    fn backoff(&self, _consecutive_failures: u32) -> Option<Duration> {
        Some(self.delay)
    }
}
