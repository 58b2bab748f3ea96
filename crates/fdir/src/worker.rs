//! FdirWorker - receive, select, forward loop of one sensor kind

use std::sync::Arc;
use std::time::Duration;

use contracts::{FdirConfig, GroupConfig, SelectionPolicy, SensorKind, SensorRecord};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, trace, warn};
use transport::{Endpoint, TransportError};

use crate::metrics::{WorkerMetrics, WorkerMetricsSnapshot};
use crate::selector::{Decision, FdirSelector};
use crate::{CycleState, RedundancyGroup};

/// Worker lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Idle,
    Receiving,
    Selecting,
    Forwarding,
    Stopping,
}

/// Result of the forwarding step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Datagram of this many bytes went out
    Sent(usize),
    /// Send failed; the record is lost
    Failed,
    /// Nothing to forward this cycle
    Skipped,
}

/// Summary of one completed cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    pub kind: SensorKind,
    /// 1-based cycle number
    pub cycle: u64,
    pub expected_before: usize,
    pub expected_after: usize,
    pub received_count: usize,
    /// Index chosen by the selection rule
    pub chosen: Option<usize>,
    /// Index whose record was sent
    pub forwarded: Option<usize>,
    pub send: SendOutcome,
}

impl CycleReport {
    pub fn degraded(&self) -> bool {
        self.expected_after < self.expected_before
    }
}

/// Final state of a stopped worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerSummary {
    pub kind: SensorKind,
    pub redundancy: usize,
    pub expected: usize,
    pub metrics: WorkerMetricsSnapshot,
}

/// Worker tuning
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorkerOptions {
    /// Shared receive deadline of one cycle
    pub cycle_timeout: Duration,
    pub policy: SelectionPolicy,
    /// Treat validity == 0 as "did not arrive"
    pub discard_invalid: bool,
    /// Stop after this many cycles
    pub max_cycles: Option<u64>,
}

impl WorkerOptions {
    pub fn new(cycle_timeout: Duration) -> Self {
        Self {
            cycle_timeout,
            policy: SelectionPolicy::default(),
            discard_invalid: false,
            max_cycles: None,
        }
    }

    /// Options of one configured group
    pub fn from_config(group: &GroupConfig, fdir: &FdirConfig) -> Self {
        Self {
            cycle_timeout: group.cycle_timeout(),
            policy: fdir.selection_policy,
            discard_invalid: fdir.discard_invalid,
            max_cycles: None,
        }
    }

    pub fn with_policy(mut self, policy: SelectionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_discard_invalid(mut self, discard: bool) -> Self {
        self.discard_invalid = discard;
        self
    }

    pub fn with_max_cycles(mut self, max_cycles: Option<u64>) -> Self {
        self.max_cycles = max_cycles;
        self
    }
}

/// FDIR worker of one redundancy group
///
/// Owns its group, selector and cycle buffer. Nothing is shared with other
/// workers; state leaves only through [`WorkerMetrics`] and the optional
/// report channel.
pub struct FdirWorker {
    group: RedundancyGroup,
    selector: FdirSelector,
    cycle_state: CycleState,
    state: WorkerState,
    cycle: u64,
    options: WorkerOptions,
    metrics: Arc<WorkerMetrics>,
    reports: Option<mpsc::Sender<CycleReport>>,
}

impl FdirWorker {
    pub fn new(group: RedundancyGroup, options: WorkerOptions) -> Self {
        let redundancy = group.redundancy();
        Self {
            selector: FdirSelector::new(redundancy, options.policy),
            cycle_state: CycleState::new(redundancy),
            state: WorkerState::Idle,
            cycle: 0,
            metrics: Arc::new(WorkerMetrics::new(redundancy)),
            reports: None,
            group,
            options,
        }
    }

    /// Emit a [`CycleReport`] per cycle on `tx`
    pub fn with_reports(mut self, tx: mpsc::Sender<CycleReport>) -> Self {
        self.reports = Some(tx);
        self
    }

    pub fn kind(&self) -> SensorKind {
        self.group.kind()
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    /// Copies expected next cycle
    pub fn expected(&self) -> usize {
        self.selector.expected()
    }

    /// Completed cycles
    pub fn cycles(&self) -> u64 {
        self.cycle
    }

    pub fn metrics(&self) -> &Arc<WorkerMetrics> {
        &self.metrics
    }

    /// Run until cancelled or `max_cycles` is reached
    #[instrument(
        name = "fdir_worker_loop",
        skip(self, cancel),
        fields(sensor = %self.group.kind())
    )]
    pub async fn run(mut self, cancel: CancellationToken) -> WorkerSummary {
        info!(
            sensor = %self.kind(),
            redundancy = self.group.redundancy(),
            timeout_ms = self.options.cycle_timeout.as_millis() as u64,
            policy = ?self.options.policy,
            "FDIR worker started"
        );

        loop {
            if cancel.is_cancelled() {
                break;
            }
            if self.options.max_cycles.is_some_and(|max| self.cycle >= max) {
                debug!(sensor = %self.kind(), "Cycle limit reached");
                break;
            }
            if self.run_cycle(&cancel).await.is_none() {
                break;
            }
        }

        self.stop()
    }

    /// Run one receive / select / forward cycle
    ///
    /// Returns `None` when cancelled before the cycle completed; a partial
    /// cycle forwards nothing.
    pub async fn run_cycle(&mut self, cancel: &CancellationToken) -> Option<CycleReport> {
        if cancel.is_cancelled() {
            return None;
        }

        self.state = WorkerState::Receiving;
        self.cycle_state.reset();
        self.receive_all(cancel).await?;

        self.state = WorkerState::Selecting;
        let decision = self.selector.decide(&self.cycle_state);
        self.cycle += 1;
        self.log_decision(&decision);

        self.state = WorkerState::Forwarding;
        let send = self.forward(decision.forward).await;

        let report = CycleReport {
            kind: self.kind(),
            cycle: self.cycle,
            expected_before: decision.expected_before,
            expected_after: decision.expected_after,
            received_count: decision.received,
            chosen: decision.chosen,
            forwarded: decision.forward.filter(|_| matches!(send, SendOutcome::Sent(_))),
            send,
        };
        self.record(&report);
        self.state = WorkerState::Receiving;
        Some(report)
    }

    /// Attempt one datagram from each active input before a shared deadline
    async fn receive_all(&mut self, cancel: &CancellationToken) -> Option<()> {
        let deadline = cycle_deadline(Instant::now(), self.options.cycle_timeout);
        let kind = self.kind();
        let size = kind.record_size();

        for index in 0..self.selector.expected() {
            let Some(input) = self.group.input(index) else {
                break;
            };

            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => return None,
                result = receive_before(input, size, deadline) => result,
            };

            match result {
                Ok(bytes) => match framing::decode(kind, &bytes) {
                    Ok(record) => self.accept(index, record),
                    Err(e) => {
                        self.metrics.inc_decode_errors();
                        warn!(sensor = %kind, copy = index, error = %e, "Discarding malformed datagram");
                    }
                },
                Err(e) if e.is_empty_read() => {
                    self.metrics.inc_receive_timeouts();
                    debug!(sensor = %kind, copy = index, "Copy missed the cycle deadline");
                }
                Err(e) => {
                    self.metrics.inc_receive_errors();
                    warn!(sensor = %kind, copy = index, error = %e, "Receive failed");
                }
            }
        }
        Some(())
    }

    fn accept(&mut self, index: usize, record: SensorRecord) {
        if self.options.discard_invalid && record.validity() == Some(false) {
            self.metrics.inc_invalid_records();
            debug!(sensor = %self.kind(), copy = index, "Discarding record flagged invalid");
            return;
        }
        trace!(sensor = %self.kind(), copy = index, "Copy received");
        self.cycle_state.insert(index, record);
    }

    async fn forward(&self, index: Option<usize>) -> SendOutcome {
        let Some(record) = index.and_then(|i| self.cycle_state.get(i)) else {
            return SendOutcome::Skipped;
        };

        let bytes = framing::encode(record);
        match self.group.output().send(&bytes).await {
            Ok(sent) => SendOutcome::Sent(sent),
            Err(e) => {
                error!(
                    sensor = %self.kind(),
                    endpoint = %self.group.output().label(),
                    error = %e,
                    "Forwarding send failed"
                );
                SendOutcome::Failed
            }
        }
    }

    fn log_decision(&self, decision: &Decision) {
        if decision.degraded() {
            warn!(
                sensor = %self.kind(),
                cycle = self.cycle,
                from = decision.expected_before,
                to = decision.expected_after,
                "Redundancy degraded"
            );
        } else if decision.received == 0 {
            warn!(sensor = %self.kind(), cycle = self.cycle, "No copy arrived, nothing forwarded");
        } else {
            debug!(
                sensor = %self.kind(),
                cycle = self.cycle,
                received = decision.received,
                chosen = ?decision.chosen,
                "Cycle selected"
            );
        }
    }

    fn record(&mut self, report: &CycleReport) {
        self.metrics.inc_cycles();
        self.metrics.set_expected(report.expected_after);
        if report.degraded() {
            self.metrics.inc_degradations();
        }
        match report.send {
            SendOutcome::Sent(_) => self.metrics.inc_forwarded(),
            SendOutcome::Failed => self.metrics.inc_send_failures(),
            SendOutcome::Skipped => self.metrics.inc_skipped(),
        }

        let Some(tx) = &self.reports else {
            return;
        };
        match tx.try_send(*report) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.metrics.inc_reports_dropped();
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!(sensor = %self.kind(), "Report receiver gone, reports disabled");
                self.reports = None;
            }
        }
    }

    fn stop(mut self) -> WorkerSummary {
        self.state = WorkerState::Stopping;
        self.group.close();

        let summary = WorkerSummary {
            kind: self.kind(),
            redundancy: self.group.redundancy(),
            expected: self.selector.expected(),
            metrics: self.metrics.snapshot(),
        };
        info!(
            sensor = %summary.kind,
            cycles = summary.metrics.cycles,
            forwarded = summary.metrics.forwarded,
            expected = summary.expected,
            "FDIR worker stopped"
        );
        summary
    }
}

/// About 30 years, same horizon as tokio's own sleep clamp
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

fn cycle_deadline(start: Instant, timeout: Duration) -> Instant {
    start.checked_add(timeout).unwrap_or_else(|| start + FAR_FUTURE)
}

/// Drain a queued datagram first, then wait until the deadline
async fn receive_before(
    input: &Endpoint,
    size: usize,
    deadline: Instant,
) -> Result<bytes::Bytes, TransportError> {
    match input.try_receive(size) {
        Err(TransportError::WouldBlock) => {}
        other => return other,
    }
    let timeout = deadline.saturating_duration_since(Instant::now());
    match tokio::time::timeout_at(deadline, input.receive(size)).await {
        Ok(result) => result,
        Err(_) => Err(TransportError::Timeout(timeout)),
    }
}
