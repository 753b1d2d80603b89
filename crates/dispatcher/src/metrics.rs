//! Sink metrics for observability

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for a single sink
#[derive(Debug, Default)]
pub struct SinkMetrics {
    /// Messages accepted by the ingestion endpoint
    messages_sent: AtomicU64,
    /// Samples appended to a batch buffer
    samples_buffered: AtomicU64,
    /// Batches uploaded and acknowledged
    batches_flushed: AtomicU64,
    /// Blob bytes uploaded
    bytes_uploaded: AtomicU64,
    /// Failed sends or flushes
    failure_count: AtomicU64,
}

impl SinkMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages_sent(&self) -> u64 {
        self.messages_sent.load(Ordering::Relaxed)
    }

    pub fn inc_messages_sent(&self) {
        self.messages_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn samples_buffered(&self) -> u64 {
        self.samples_buffered.load(Ordering::Relaxed)
    }

    pub fn inc_samples_buffered(&self) {
        self.samples_buffered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn batches_flushed(&self) -> u64 {
        self.batches_flushed.load(Ordering::Relaxed)
    }

    /// Count one acknowledged batch of `bytes`
    pub fn record_flush(&self, bytes: usize) {
        self.batches_flushed.fetch_add(1, Ordering::Relaxed);
        self.bytes_uploaded
            .fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub fn bytes_uploaded(&self) -> u64 {
        self.bytes_uploaded.load(Ordering::Relaxed)
    }

    pub fn failure_count(&self) -> u64 {
        self.failure_count.load(Ordering::Relaxed)
    }

    pub fn inc_failure_count(&self) {
        self.failure_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            messages_sent: self.messages_sent(),
            samples_buffered: self.samples_buffered(),
            batches_flushed: self.batches_flushed(),
            bytes_uploaded: self.bytes_uploaded(),
            failure_count: self.failure_count(),
        }
    }
}

/// Snapshot of sink metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub messages_sent: u64,
    pub samples_buffered: u64,
    pub batches_flushed: u64,
    pub bytes_uploaded: u64,
    pub failure_count: u64,
}
