//! GncConsumer - waits on the per-kind GNC ports and decodes what arrives

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use contracts::{HubBlueprint, SensorKind, SensorRecord};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, trace, warn};
use transport::{poll_ready, Endpoint, TransportError};

use crate::ConsumerError;

/// Default readiness wait per poll
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_millis(1000);

/// A decoded record as seen by the GNC
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConsumedRecord {
    pub kind: SensorKind,
    pub record: SensorRecord,
}

/// Actuators switched on when a record of `kind` arrives
pub fn actuators(kind: SensorKind) -> &'static [u8] {
    match kind {
        SensorKind::Imu => &[5],
        SensorKind::Gnss => &[2, 6],
        SensorKind::StarTracker => &[1, 2, 3],
    }
}

/// Consumer counters
#[derive(Debug, Default)]
pub struct ConsumerMetrics {
    received: [AtomicU64; 3],
    invalid_size: AtomicU64,
    poll_timeouts: AtomicU64,
    receive_errors: AtomicU64,
}

fn slot(kind: SensorKind) -> usize {
    match kind {
        SensorKind::Imu => 0,
        SensorKind::Gnss => 1,
        SensorKind::StarTracker => 2,
    }
}

impl ConsumerMetrics {
    pub fn record_received(&self, kind: SensorKind) {
        self.received[slot(kind)].fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_invalid_size(&self) {
        self.invalid_size.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_poll_timeout(&self) {
        self.poll_timeouts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_receive_error(&self) {
        self.receive_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ConsumerSnapshot {
        ConsumerSnapshot {
            received: std::array::from_fn(|i| self.received[i].load(Ordering::Relaxed)),
            invalid_size: self.invalid_size.load(Ordering::Relaxed),
            poll_timeouts: self.poll_timeouts.load(Ordering::Relaxed),
            receive_errors: self.receive_errors.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of consumer counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsumerSnapshot {
    received: [u64; 3],
    pub invalid_size: u64,
    pub poll_timeouts: u64,
    pub receive_errors: u64,
}

impl ConsumerSnapshot {
    /// Records received of `kind`
    pub fn received(&self, kind: SensorKind) -> u64 {
        self.received[slot(kind)]
    }

    pub fn total_received(&self) -> u64 {
        self.received.iter().sum()
    }
}

/// GNC-side receiver of the hub outputs
pub struct GncConsumer {
    inputs: Vec<(SensorKind, Endpoint)>,
    poll_timeout: Duration,
    metrics: Arc<ConsumerMetrics>,
    records: Option<mpsc::Sender<ConsumedRecord>>,
}

impl GncConsumer {
    /// Bind the GNC port of every configured kind
    #[instrument(name = "gnc_consumer_open", skip(blueprint))]
    pub async fn open(blueprint: &HubBlueprint) -> Result<Self, ConsumerError> {
        let mut inputs = Vec::with_capacity(blueprint.groups.len());
        for group in &blueprint.groups {
            let config = blueprint.gnc_endpoint(group.kind)?;
            let endpoint = Endpoint::open(&config)
                .await
                .map_err(|source| ConsumerError::Endpoint {
                    kind: group.kind,
                    source,
                })?;
            inputs.push((group.kind, endpoint));
        }
        Self::from_endpoints(inputs)
    }

    /// Build from already opened input endpoints
    pub fn from_endpoints(inputs: Vec<(SensorKind, Endpoint)>) -> Result<Self, ConsumerError> {
        if inputs.is_empty() {
            return Err(ConsumerError::NoEndpoints);
        }
        Ok(Self {
            inputs,
            poll_timeout: DEFAULT_POLL_TIMEOUT,
            metrics: Arc::new(ConsumerMetrics::default()),
            records: None,
        })
    }

    pub fn with_poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout = timeout;
        self
    }

    /// Emit every decoded record on `tx`
    pub fn with_records(mut self, tx: mpsc::Sender<ConsumedRecord>) -> Self {
        self.records = Some(tx);
        self
    }

    pub fn metrics(&self) -> &Arc<ConsumerMetrics> {
        &self.metrics
    }

    /// Wait for readiness once and drain every ready endpoint
    ///
    /// Returns the decoded records; empty when the poll timed out.
    pub async fn poll_once(&self) -> Vec<ConsumedRecord> {
        let endpoints: Vec<&Endpoint> = self.inputs.iter().map(|(_, e)| e).collect();
        let ready = poll_ready(&endpoints, self.poll_timeout).await;

        if ready.is_empty() {
            self.metrics.record_poll_timeout();
            debug!(timeout_ms = self.poll_timeout.as_millis() as u64, "GNC poll timed out");
            return Vec::new();
        }

        let mut consumed = Vec::new();
        for index in ready {
            let (kind, endpoint) = &self.inputs[index];
            self.drain(*kind, endpoint, &mut consumed);
        }
        consumed
    }

    fn drain(&self, kind: SensorKind, endpoint: &Endpoint, out: &mut Vec<ConsumedRecord>) {
        loop {
            let bytes = match endpoint.try_receive(kind.record_size()) {
                Ok(bytes) => bytes,
                Err(TransportError::WouldBlock) => break,
                Err(e) => {
                    self.metrics.record_receive_error();
                    warn!(sensor = %kind, error = %e, "GNC receive failed");
                    break;
                }
            };

            match framing::decode(kind, &bytes) {
                Ok(record) => {
                    self.metrics.record_received(kind);
                    actuate(kind, &record);
                    out.push(ConsumedRecord { kind, record });
                }
                Err(e) => {
                    self.metrics.record_invalid_size();
                    warn!(sensor = %kind, error = %e, "GNC dropped malformed datagram");
                }
            }
        }
    }

    /// Poll until cancelled
    #[instrument(name = "gnc_consumer_loop", skip(self, cancel))]
    pub async fn run(mut self, cancel: CancellationToken) -> ConsumerSnapshot {
        info!(inputs = self.inputs.len(), "GNC consumer started");

        loop {
            let consumed = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                consumed = self.poll_once() => consumed,
            };

            let delivered = match &self.records {
                Some(tx) => forward_all(tx, consumed).await,
                None => true,
            };
            if !delivered {
                debug!("GNC record receiver gone");
                self.records = None;
            }
        }

        self.inputs.iter_mut().for_each(|(_, e)| e.close());
        let snapshot = self.metrics.snapshot();
        info!(
            received = snapshot.total_received(),
            invalid = snapshot.invalid_size,
            timeouts = snapshot.poll_timeouts,
            "GNC consumer stopped"
        );
        snapshot
    }
}

async fn forward_all(tx: &mpsc::Sender<ConsumedRecord>, records: Vec<ConsumedRecord>) -> bool {
    for record in records {
        if tx.send(record).await.is_err() {
            return false;
        }
    }
    true
}

/// Actuation step placeholder
fn actuate(kind: SensorKind, record: &SensorRecord) {
    trace!(sensor = %kind, ?record, "GNC record");
    debug!(sensor = %kind, actuators = ?actuators(kind), "Setting actuators on");
}
