//! Pipeline statistics and metrics.

use std::fmt;
use std::time::Duration;

use contracts::DeliveryMode;
use dispatcher::MetricsSnapshot;
use observability::SessionSummary;

/// Why the run loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// `--max-samples` reached
    SampleLimit,
    /// `--timeout` elapsed
    Timeout,
    /// Ctrl+C / SIGTERM
    Shutdown,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SampleLimit => write!(f, "sample limit"),
            Self::Timeout => write!(f, "timeout"),
            Self::Shutdown => write!(f, "shutdown signal"),
        }
    }
}

/// Statistics from a simulator run
#[derive(Debug, Clone)]
pub struct PipelineStats {
    /// Delivery mode in effect
    pub mode: DeliveryMode,

    /// Why the loop stopped
    pub stop_reason: StopReason,

    /// Total duration of the run
    pub duration: Duration,

    /// Generator and recovery statistics
    pub session: SessionSummary,

    /// Sink counters
    pub sink: MetricsSnapshot,
}

impl PipelineStats {
    /// Samples generated per second
    pub fn samples_per_sec(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.session.total_samples as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                     Simulator Statistics                     ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("Overview");
        println!("   ├─ Mode: {}", self.mode);
        println!("   ├─ Stopped by: {}", self.stop_reason);
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Samples generated: {}", self.session.total_samples);
        println!("   ├─ Samples/s: {:.2}", self.samples_per_sec());
        println!("   └─ Recoveries: {}", self.session.recoveries);

        println!("\nDelivery");
        match self.mode {
            DeliveryMode::Realtime => {
                println!("   ├─ Messages sent: {}", self.sink.messages_sent);
            }
            DeliveryMode::Batch => {
                println!("   ├─ Samples buffered: {}", self.sink.samples_buffered);
                println!("   ├─ Batches uploaded: {}", self.sink.batches_flushed);
                println!("   ├─ Bytes uploaded: {}", self.sink.bytes_uploaded);
            }
        }
        println!("   └─ Failures: {}", self.sink.failure_count);

        println!("\nReadings");
        println!("   ├─ Temperature (C): {}", self.session.temperature);
        println!("   ├─ Humidity (%): {}", self.session.humidity);
        println!(
            "   └─ Temperature alerts: {} ({:.2}%)",
            self.session.temperature_alerts, self.session.alert_rate
        );

        println!();
    }
}
