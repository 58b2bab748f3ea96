//! Producer metrics

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Producer metrics
#[derive(Debug, Default)]
pub struct ProducerMetrics {
    /// Completed send cycles
    pub cycles: AtomicU64,

    /// Datagrams handed to the socket
    pub datagrams_sent: AtomicU64,

    /// Failed sends
    pub send_failures: AtomicU64,

    /// Copies currently sending
    pub active_copies: AtomicUsize,
}

impl ProducerMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one finished cycle
    pub fn record_cycle(&self) {
        self.cycles.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a datagram sent
    pub fn record_sent(&self) {
        self.datagrams_sent.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a send failure
    pub fn record_send_failure(&self) {
        self.send_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Update active copy count
    pub fn update_active_copies(&self, copies: usize) {
        self.active_copies.store(copies, Ordering::Relaxed);
    }

    /// Get snapshot
    pub fn snapshot(&self) -> ProducerSnapshot {
        ProducerSnapshot {
            cycles: self.cycles.load(Ordering::Relaxed),
            datagrams_sent: self.datagrams_sent.load(Ordering::Relaxed),
            send_failures: self.send_failures.load(Ordering::Relaxed),
            active_copies: self.active_copies.load(Ordering::Relaxed),
        }
    }
}

/// Metrics snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProducerSnapshot {
    pub cycles: u64,
    pub datagrams_sent: u64,
    pub send_failures: u64,
    pub active_copies: usize,
}
