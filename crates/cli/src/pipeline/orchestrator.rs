//! Hub orchestrator - starts the FDIR hub and, optionally, the mock
//! producers and the GNC consumer in the same process.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use contracts::HubBlueprint;
use fdir::{FdirHub, HubOptions};
use gnc_consumer::{ConsumerSnapshot, GncConsumer};
use producer::{producers_from_blueprint, FaultInjection, ProducerSnapshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::HubStats;
use crate::error::CliError;

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// The hub blueprint
    pub blueprint: HubBlueprint,

    /// Stop each worker after this many cycles (None = unlimited)
    pub max_cycles: Option<u64>,

    /// Hub timeout (None = no timeout)
    pub timeout: Option<Duration>,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,

    /// Run mock producers alongside the hub
    pub with_producers: bool,

    /// Producer fault injection
    pub fault: Option<FaultInjection>,

    /// Run the GNC consumer alongside the hub
    pub with_gnc: bool,
}

/// FDIR hub orchestrator
pub struct HubPipeline {
    config: PipelineConfig,
}

impl HubPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run until every worker stops, the timeout expires, or `cancel` fires
    ///
    /// Always shuts the hub down before returning, so the statistics cover
    /// every cycle that was reported.
    pub async fn run(self, cancel: CancellationToken) -> Result<HubStats> {
        let start_time = Instant::now();
        let blueprint = &self.config.blueprint;

        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        // The GNC binds first so the hub's first forwards have a receiver.
        let gnc = if self.config.with_gnc {
            let consumer = GncConsumer::open(blueprint)
                .await
                .context("Failed to open GNC consumer")?;
            Some(tokio::spawn(consumer.run(cancel.child_token())))
        } else {
            None
        };

        let mut hub = FdirHub::start_with_options(
            blueprint,
            cancel.child_token(),
            HubOptions {
                max_cycles: self.config.max_cycles,
            },
        )
        .await
        .map_err(CliError::from)?;

        let mut reports = hub
            .take_reports()
            .context("FDIR hub report stream already taken")?;

        let producers = if self.config.with_producers {
            producers_from_blueprint(blueprint, false, self.config.fault, None)
                .context("Failed to build mock producers")?
                .into_iter()
                .map(|p| (p.kind(), p.spawn(cancel.child_token())))
                .collect::<Vec<_>>()
        } else {
            Vec::new()
        };

        info!(
            groups = blueprint.groups.len(),
            producers = producers.len(),
            gnc = gnc.is_some(),
            max_cycles = ?self.config.max_cycles,
            "FDIR hub running"
        );

        let deadline = async {
            match self.config.timeout {
                Some(timeout) => tokio::time::sleep(timeout).await,
                None => std::future::pending().await,
            }
        };
        tokio::pin!(deadline);

        let mut stats = HubStats::default();
        loop {
            tokio::select! {
                report = reports.recv() => match report {
                    Some(report) => {
                        observability::record_cycle_report(&report);
                        stats.cycles.update(&report);
                    }
                    // Every worker has stopped.
                    None => break,
                },
                _ = &mut deadline => {
                    warn!(
                        timeout_secs = self.config.timeout.map(|t| t.as_secs()),
                        "Hub timed out"
                    );
                    break;
                }
            }
        }

        info!("Shutting down FDIR hub...");
        stats.workers = hub.shutdown().await.map_err(CliError::from)?;

        // Reports still queued after shutdown belong to finished cycles.
        while let Ok(report) = reports.try_recv() {
            observability::record_cycle_report(&report);
            stats.cycles.update(&report);
        }

        cancel.cancel();
        for (kind, handle) in producers {
            if let Some(snapshot) = join_producer(kind, handle).await {
                stats.producers.push((kind, snapshot));
            }
        }
        if let Some(handle) = gnc {
            stats.gnc = Some(join_gnc(handle).await?);
        }

        stats.duration = start_time.elapsed();
        info!(
            duration_secs = stats.duration.as_secs_f64(),
            cycles = stats.cycles.total_cycles(),
            "FDIR hub shutdown complete"
        );

        Ok(stats)
    }
}

async fn join_producer(
    kind: contracts::SensorKind,
    handle: JoinHandle<producer::Result<ProducerSnapshot>>,
) -> Option<ProducerSnapshot> {
    match handle.await {
        Ok(Ok(snapshot)) => Some(snapshot),
        Ok(Err(e)) => {
            warn!(sensor = %kind, error = %e, "Mock producer failed");
            None
        }
        Err(e) => {
            warn!(sensor = %kind, error = %e, "Mock producer task aborted");
            None
        }
    }
}

async fn join_gnc(handle: JoinHandle<ConsumerSnapshot>) -> Result<ConsumerSnapshot> {
    handle
        .await
        .map_err(|e| CliError::task_join("gnc_consumer", e.to_string()).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{GroupConfig, SensorKind};

    fn free_port() -> u16 {
        std::net::UdpSocket::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port()
    }

    /// One fast GNSS group on ephemeral ports
    fn test_blueprint() -> HubBlueprint {
        let mut group = GroupConfig::new(SensorKind::Gnss).with_redundancy(2);
        group.fdir_base_port = Some(free_port());
        group.gnc_port = Some(free_port());
        group.frequency_hz = Some(50.0);
        HubBlueprint {
            groups: vec![group],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn runs_hub_with_producers_and_gnc() {
        let config = PipelineConfig {
            blueprint: test_blueprint(),
            max_cycles: Some(5),
            timeout: Some(Duration::from_secs(10)),
            metrics_port: None,
            with_producers: true,
            fault: None,
            with_gnc: true,
        };

        let stats = HubPipeline::new(config)
            .run(CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(stats.cycles.total_cycles(), 5);
        assert_eq!(stats.workers.len(), 1);
        assert_eq!(stats.producers.len(), 1);
        assert!(stats.gnc.is_some());
    }

    #[tokio::test]
    async fn cancellation_stops_the_hub() {
        let config = PipelineConfig {
            blueprint: test_blueprint(),
            max_cycles: None,
            timeout: None,
            metrics_port: None,
            with_producers: false,
            fault: None,
            with_gnc: false,
        };
        let cancel = CancellationToken::new();
        let task = tokio::spawn(HubPipeline::new(config).run(cancel.clone()));

        tokio::time::sleep(Duration::from_millis(100)).await;
        cancel.cancel();

        let stats = tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(stats.workers.len(), 1);
    }
}
