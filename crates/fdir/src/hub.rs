//! FdirHub - one worker per redundancy group

use std::sync::Arc;

use contracts::{HubBlueprint, SensorKind};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument};

use crate::metrics::{WorkerMetrics, WorkerMetricsSnapshot};
use crate::worker::{CycleReport, FdirWorker, WorkerOptions, WorkerSummary};
use crate::{FdirError, RedundancyGroup};

/// Hub start options
#[derive(Debug, Clone, Copy, Default)]
pub struct HubOptions {
    /// Stop each worker after this many cycles
    pub max_cycles: Option<u64>,
}

/// Handle to a running worker
pub struct WorkerHandle {
    kind: SensorKind,
    metrics: Arc<WorkerMetrics>,
    task: JoinHandle<WorkerSummary>,
}

impl WorkerHandle {
    /// Spawn `worker` on the runtime
    pub fn spawn(worker: FdirWorker, cancel: CancellationToken) -> Self {
        let kind = worker.kind();
        let metrics = Arc::clone(worker.metrics());
        let task = tokio::spawn(worker.run(cancel));
        Self {
            kind,
            metrics,
            task,
        }
    }

    pub fn kind(&self) -> SensorKind {
        self.kind
    }

    pub fn metrics(&self) -> &Arc<WorkerMetrics> {
        &self.metrics
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the worker to stop
    pub async fn join(self) -> Result<WorkerSummary, FdirError> {
        self.task.await.map_err(|e| FdirError::WorkerJoin {
            kind: self.kind,
            message: e.to_string(),
        })
    }
}

/// Running FDIR hub
pub struct FdirHub {
    workers: Vec<WorkerHandle>,
    cancel: CancellationToken,
    reports: Option<mpsc::Receiver<CycleReport>>,
}

impl FdirHub {
    /// Open every configured group and start its worker
    ///
    /// Startup is all-or-nothing: if any endpoint fails to open, no worker
    /// is started and the error names the sensor kind.
    pub async fn start(blueprint: &HubBlueprint, cancel: CancellationToken) -> Result<Self, FdirError> {
        Self::start_with_options(blueprint, cancel, HubOptions::default()).await
    }

    #[instrument(
        name = "fdir_hub_start",
        skip(blueprint, cancel),
        fields(groups = blueprint.groups.len())
    )]
    pub async fn start_with_options(
        blueprint: &HubBlueprint,
        cancel: CancellationToken,
        options: HubOptions,
    ) -> Result<Self, FdirError> {
        if blueprint.groups.is_empty() {
            return Err(FdirError::NoGroups);
        }

        let mut groups = Vec::with_capacity(blueprint.groups.len());
        for config in &blueprint.groups {
            let group = RedundancyGroup::open(config.kind, blueprint).await?;
            groups.push((config, group));
        }

        let capacity = blueprint.fdir.report_capacity.max(1) * groups.len();
        let (tx, rx) = mpsc::channel(capacity);

        let workers = groups
            .into_iter()
            .map(|(config, group)| {
                let worker_options = WorkerOptions::from_config(config, &blueprint.fdir)
                    .with_max_cycles(options.max_cycles);
                let worker = FdirWorker::new(group, worker_options).with_reports(tx.clone());
                WorkerHandle::spawn(worker, cancel.child_token())
            })
            .collect::<Vec<_>>();

        info!(
            workers = workers.len(),
            policy = ?blueprint.fdir.selection_policy,
            "FDIR hub started"
        );

        Ok(Self {
            workers,
            cancel,
            reports: Some(rx),
        })
    }

    pub fn workers(&self) -> &[WorkerHandle] {
        &self.workers
    }

    /// Current metrics of every worker
    pub fn metrics(&self) -> Vec<(SensorKind, WorkerMetricsSnapshot)> {
        self.workers
            .iter()
            .map(|w| (w.kind(), w.metrics().snapshot()))
            .collect()
    }

    /// Take the merged cycle report stream of all workers
    pub fn take_reports(&mut self) -> Option<mpsc::Receiver<CycleReport>> {
        self.reports.take()
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Whether every worker has stopped on its own
    pub fn is_finished(&self) -> bool {
        self.workers.iter().all(WorkerHandle::is_finished)
    }

    /// Wait for all workers without cancelling them
    pub async fn join(self) -> Result<Vec<WorkerSummary>, FdirError> {
        let mut summaries = Vec::with_capacity(self.workers.len());
        let mut first_error = None;

        for handle in self.workers {
            match handle.join().await {
                Ok(summary) => summaries.push(summary),
                Err(e) => {
                    error!(error = %e, "FDIR worker failed");
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(summaries),
        }
    }

    /// Cancel every worker and wait for them to stop
    #[instrument(name = "fdir_hub_shutdown", skip(self))]
    pub async fn shutdown(self) -> Result<Vec<WorkerSummary>, FdirError> {
        self.cancel.cancel();
        let summaries = self.join().await?;
        info!(workers = summaries.len(), "FDIR hub shutdown complete");
        Ok(summaries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::GroupConfig;

    fn free_port_pair() -> (std::net::UdpSocket, u16) {
        let socket = std::net::UdpSocket::bind("127.0.0.1:0").unwrap();
        let port = socket.local_addr().unwrap().port();
        (socket, port)
    }

    fn single_group(kind: SensorKind, fdir_port: u16, gnc_port: u16) -> GroupConfig {
        let mut group = GroupConfig::new(kind).with_redundancy(1);
        group.fdir_base_port = Some(fdir_port);
        group.gnc_port = Some(gnc_port);
        group.cycle_timeout_ms = Some(50);
        group
    }

    #[tokio::test]
    async fn empty_blueprint_is_rejected() {
        let blueprint = HubBlueprint {
            groups: Vec::new(),
            ..Default::default()
        };
        let err = FdirHub::start(&blueprint, CancellationToken::new())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, FdirError::NoGroups));
    }

    #[tokio::test]
    async fn startup_fails_fast_naming_the_kind() {
        let (free, free_port) = free_port_pair();
        drop(free);
        let (_holder, taken_port) = free_port_pair();
        let (_gnc_a, gnc_a) = free_port_pair();
        let (_gnc_b, gnc_b) = free_port_pair();

        let blueprint = HubBlueprint {
            groups: vec![
                single_group(SensorKind::Imu, free_port, gnc_a),
                single_group(SensorKind::Gnss, taken_port, gnc_b),
            ],
            ..Default::default()
        };

        let err = FdirHub::start(&blueprint, CancellationToken::new())
            .await
            .err()
            .unwrap();
        assert_eq!(err.kind(), Some(SensorKind::Gnss));
    }

    #[tokio::test]
    async fn start_and_shutdown() {
        let (free, fdir_port) = free_port_pair();
        drop(free);
        let (_gnc, gnc_port) = free_port_pair();

        let blueprint = HubBlueprint {
            groups: vec![single_group(SensorKind::StarTracker, fdir_port, gnc_port)],
            ..Default::default()
        };

        let mut hub = FdirHub::start(&blueprint, CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(hub.workers().len(), 1);
        let mut reports = hub.take_reports().unwrap();
        assert!(hub.take_reports().is_none());

        // silent group still completes cycles on its deadline
        let report = reports.recv().await.unwrap();
        assert_eq!(report.kind, SensorKind::StarTracker);
        assert_eq!(report.received_count, 0);

        let summaries = hub.shutdown().await.unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].expected, 1);
    }

    #[tokio::test]
    async fn max_cycles_lets_workers_finish() {
        let (free, fdir_port) = free_port_pair();
        drop(free);
        let (_gnc, gnc_port) = free_port_pair();

        let blueprint = HubBlueprint {
            groups: vec![single_group(SensorKind::Imu, fdir_port, gnc_port)],
            ..Default::default()
        };

        let hub = FdirHub::start_with_options(
            &blueprint,
            CancellationToken::new(),
            HubOptions {
                max_cycles: Some(3),
            },
        )
        .await
        .unwrap();

        let summaries = hub.join().await.unwrap();
        assert_eq!(summaries[0].metrics.cycles, 3);
        assert_eq!(summaries[0].metrics.skipped, 3);
    }
}
