//! Dispatch counters.
//!
//! Shared between the dispatcher and the heartbeat ticks it schedules, so every counter
//! is a relaxed atomic.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::info;

/// Counters for one connection.
#[derive(Debug)]
pub struct Metrics {
    /// Envelopes routed to a decoder or the handshake
    pub messages_dispatched: AtomicU64,
    /// Envelopes whose kind has no registered behavior
    pub messages_unhandled: AtomicU64,
    /// Batches expanded
    pub batches_expanded: AtomicU64,
    /// Batches that needed decompression
    pub batches_compressed: AtomicU64,
    /// Sub-envelopes produced by batch expansion
    pub batch_records: AtomicU64,
    /// Successful handshakes
    pub handshakes_success: AtomicU64,
    /// Rejected or failed handshakes
    pub handshakes_failed: AtomicU64,
    /// Correlated replies and heartbeats handed to the transport
    pub messages_sent: AtomicU64,
    /// Heartbeat schedules installed
    pub heartbeats_scheduled: AtomicU64,
    /// Messages dropped because of a structural error
    pub protocol_errors: AtomicU64,
    start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            messages_dispatched: AtomicU64::new(0),
            messages_unhandled: AtomicU64::new(0),
            batches_expanded: AtomicU64::new(0),
            batches_compressed: AtomicU64::new(0),
            batch_records: AtomicU64::new(0),
            handshakes_success: AtomicU64::new(0),
            handshakes_failed: AtomicU64::new(0),
            messages_sent: AtomicU64::new(0),
            heartbeats_scheduled: AtomicU64::new(0),
            protocol_errors: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn message_dispatched(&self) {
        self.messages_dispatched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn message_unhandled(&self) {
        self.messages_unhandled.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a batch expansion and the number of records it produced
    pub fn batch_expanded(&self, records: usize, compressed: bool) {
        self.batches_expanded.fetch_add(1, Ordering::Relaxed);
        self.batch_records
            .fetch_add(records as u64, Ordering::Relaxed);
        if compressed {
            self.batches_compressed.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn handshake_success(&self) {
        self.handshakes_success.fetch_add(1, Ordering::Relaxed);
    }

    pub fn handshake_failed(&self) {
        self.handshakes_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn message_sent(&self) {
        self.messages_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn heartbeat_scheduled(&self) {
        self.heartbeats_scheduled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn protocol_error(&self) {
        self.protocol_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            messages_dispatched: self.messages_dispatched.load(Ordering::Relaxed),
            messages_unhandled: self.messages_unhandled.load(Ordering::Relaxed),
            batches_expanded: self.batches_expanded.load(Ordering::Relaxed),
            batches_compressed: self.batches_compressed.load(Ordering::Relaxed),
            batch_records: self.batch_records.load(Ordering::Relaxed),
            handshakes_success: self.handshakes_success.load(Ordering::Relaxed),
            handshakes_failed: self.handshakes_failed.load(Ordering::Relaxed),
            messages_sent: self.messages_sent.load(Ordering::Relaxed),
            heartbeats_scheduled: self.heartbeats_scheduled.load(Ordering::Relaxed),
            protocol_errors: self.protocol_errors.load(Ordering::Relaxed),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        }
    }

    /// Emit the current counters as one `info` event.
    pub fn log_metrics(&self) {
        let snapshot = self.snapshot();
        info!(
            messages_dispatched = snapshot.messages_dispatched,
            messages_unhandled = snapshot.messages_unhandled,
            batches_expanded = snapshot.batches_expanded,
            batches_compressed = snapshot.batches_compressed,
            batch_records = snapshot.batch_records,
            handshakes_success = snapshot.handshakes_success,
            handshakes_failed = snapshot.handshakes_failed,
            messages_sent = snapshot.messages_sent,
            heartbeats_scheduled = snapshot.heartbeats_scheduled,
            protocol_errors = snapshot.protocol_errors,
            uptime_seconds = snapshot.uptime_seconds,
            "Dispatch metrics snapshot"
        );
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Plain copy of the counters, for assertions and periodic reporting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub messages_dispatched: u64,
    pub messages_unhandled: u64,
    pub batches_expanded: u64,
    pub batches_compressed: u64,
    pub batch_records: u64,
    pub handshakes_success: u64,
    pub handshakes_failed: u64,
    pub messages_sent: u64,
    pub heartbeats_scheduled: u64,
    pub protocol_errors: u64,
    pub uptime_seconds: u64,
}
