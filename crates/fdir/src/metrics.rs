//! Worker metrics for observability

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Metrics of a single FDIR worker
#[derive(Debug, Default)]
pub struct WorkerMetrics {
    /// Completed cycles
    cycles: AtomicU64,
    /// Cycles that forwarded a record
    forwarded: AtomicU64,
    /// Cycles that forwarded nothing
    skipped: AtomicU64,
    /// Cycles that lowered the expected count
    degradations: AtomicU64,
    /// Copies that missed the cycle deadline
    receive_timeouts: AtomicU64,
    /// Receive calls that failed
    receive_errors: AtomicU64,
    /// Datagrams with the wrong size
    decode_errors: AtomicU64,
    /// Records dropped for validity == 0
    invalid_records: AtomicU64,
    /// Output sends that failed
    send_failures: AtomicU64,
    /// Cycle reports dropped because the channel was full
    reports_dropped: AtomicU64,
    /// Current expected copy count
    expected: AtomicUsize,
}

macro_rules! counter {
    ($get:ident, $inc:ident) => {
        pub fn $get(&self) -> u64 {
            self.$get.load(Ordering::Relaxed)
        }

        pub fn $inc(&self) {
            self.$get.fetch_add(1, Ordering::Relaxed);
        }
    };
}

impl WorkerMetrics {
    pub fn new(expected: usize) -> Self {
        Self {
            expected: AtomicUsize::new(expected),
            ..Self::default()
        }
    }

    counter!(cycles, inc_cycles);
    counter!(forwarded, inc_forwarded);
    counter!(skipped, inc_skipped);
    counter!(degradations, inc_degradations);
    counter!(receive_timeouts, inc_receive_timeouts);
    counter!(receive_errors, inc_receive_errors);
    counter!(decode_errors, inc_decode_errors);
    counter!(invalid_records, inc_invalid_records);
    counter!(send_failures, inc_send_failures);
    counter!(reports_dropped, inc_reports_dropped);

    pub fn expected(&self) -> usize {
        self.expected.load(Ordering::Relaxed)
    }

    pub fn set_expected(&self, expected: usize) {
        self.expected.store(expected, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> WorkerMetricsSnapshot {
        WorkerMetricsSnapshot {
            cycles: self.cycles(),
            forwarded: self.forwarded(),
            skipped: self.skipped(),
            degradations: self.degradations(),
            receive_timeouts: self.receive_timeouts(),
            receive_errors: self.receive_errors(),
            decode_errors: self.decode_errors(),
            invalid_records: self.invalid_records(),
            send_failures: self.send_failures(),
            reports_dropped: self.reports_dropped(),
            expected: self.expected(),
        }
    }
}

/// Snapshot of worker metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerMetricsSnapshot {
    pub cycles: u64,
    pub forwarded: u64,
    pub skipped: u64,
    pub degradations: u64,
    pub receive_timeouts: u64,
    pub receive_errors: u64,
    pub decode_errors: u64,
    pub invalid_records: u64,
    pub send_failures: u64,
    pub reports_dropped: u64,
    pub expected: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_and_snapshot() {
        let metrics = WorkerMetrics::new(3);
        metrics.inc_cycles();
        metrics.inc_cycles();
        metrics.inc_forwarded();
        metrics.inc_degradations();
        metrics.set_expected(2);

        let snap = metrics.snapshot();
        assert_eq!(snap.cycles, 2);
        assert_eq!(snap.forwarded, 1);
        assert_eq!(snap.skipped, 0);
        assert_eq!(snap.degradations, 1);
        assert_eq!(snap.expected, 2);
    }
}
