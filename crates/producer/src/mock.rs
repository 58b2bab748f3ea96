//! Mock 冗余传感器生产者
//!
//! 每类传感器一个任务，每个周期把同一条合成记录发给所有活跃副本。
//! 可选的故障注入会在若干周期后减少活跃副本数。

use std::net::SocketAddr;
use std::sync::Arc;

use contracts::{
    EndpointConfig, GnssRecord, HubBlueprint, ImuRecord, SensorKind, SensorRecord,
    StarTrackerRecord,
};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, trace, warn};
use transport::Endpoint;

use crate::error::{ProducerError, Result};
use crate::metrics::{ProducerMetrics, ProducerSnapshot};
use crate::scheduler::PeriodicTask;

/// IMU 积分间隔 (s)
const IMU_T_INC: f64 = 0.01;

/// 故障注入配置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaultInjection {
    /// 注入故障的传感器类型
    pub kind: SensorKind,

    /// 正常发送多少个周期后注入
    pub after_cycles: u64,

    /// 注入后仍在发送的副本数 (保留索引最低的副本)
    pub surviving_copies: usize,
}

impl Default for FaultInjection {
    fn default() -> Self {
        Self {
            kind: SensorKind::Imu,
            after_cycles: 10,
            surviving_copies: 2,
        }
    }
}

/// Mock 生产者配置
#[derive(Debug, Clone)]
pub struct MockProducerConfig {
    /// 传感器类型
    pub kind: SensorKind,

    /// 发送频率 (Hz)
    pub frequency_hz: f64,

    /// 每个副本的目标地址，按副本索引排列
    pub targets: Vec<SocketAddr>,

    /// 故障注入 (仅当 kind 匹配时生效)
    pub fault: Option<FaultInjection>,

    /// 最多发送的周期数
    pub max_cycles: Option<u64>,
}

impl MockProducerConfig {
    /// 从蓝图构建
    ///
    /// `bypass_fdir` 为 true 时直接发往 GNC 名义端口。
    pub fn from_blueprint(
        blueprint: &HubBlueprint,
        kind: SensorKind,
        bypass_fdir: bool,
    ) -> Result<Self> {
        let frequency_hz = blueprint
            .group(kind)
            .map(|g| g.frequency_hz())
            .ok_or(ProducerError::NoTargets { kind })?;
        Ok(Self {
            kind,
            frequency_hz,
            targets: blueprint.producer_targets(kind, bypass_fdir)?,
            fault: None,
            max_cycles: None,
        })
    }

    /// 设置故障注入
    pub fn with_fault(mut self, fault: Option<FaultInjection>) -> Self {
        self.fault = fault;
        self
    }

    /// 设置周期上限
    pub fn with_max_cycles(mut self, max_cycles: Option<u64>) -> Self {
        self.max_cycles = max_cycles;
        self
    }

    /// 第 `cycle` 个周期 (从 1 开始) 的活跃副本数
    pub fn active_copies(&self, cycle: u64) -> usize {
        let all = self.targets.len();
        match self.fault {
            Some(fault) if fault.kind == self.kind && cycle > fault.after_cycles => {
                fault.surviving_copies.min(all)
            }
            _ => all,
        }
    }
}

/// Mock 生产者
pub struct MockProducer {
    config: MockProducerConfig,
    metrics: Arc<ProducerMetrics>,
}

impl MockProducer {
    /// 创建新的 Mock 生产者
    pub fn new(config: MockProducerConfig) -> Self {
        Self {
            config,
            metrics: Arc::new(ProducerMetrics::new()),
        }
    }

    pub fn kind(&self) -> SensorKind {
        self.config.kind
    }

    pub fn metrics(&self) -> &Arc<ProducerMetrics> {
        &self.metrics
    }

    /// 在后台任务中运行
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<Result<ProducerSnapshot>> {
        tokio::spawn(self.run(cancel))
    }

    /// 运行直到取消或达到周期上限
    #[instrument(name = "mock_producer_run", skip(self, cancel), fields(sensor = %self.config.kind))]
    pub async fn run(self, cancel: CancellationToken) -> Result<ProducerSnapshot> {
        let kind = self.config.kind;
        if self.config.targets.is_empty() {
            return Err(ProducerError::NoTargets { kind });
        }

        let outputs = self.open_outputs().await?;
        let mut task = PeriodicTask::from_frequency(self.config.frequency_hz)
            .map_err(|source| ProducerError::Scheduler { kind, source })?;

        info!(
            sensor = %kind,
            copies = outputs.len(),
            frequency_hz = self.config.frequency_hz,
            fault = ?self.config.fault.filter(|f| f.kind == kind),
            "Mock producer started"
        );

        let mut active = outputs.len();
        self.metrics.update_active_copies(active);

        loop {
            if self
                .config
                .max_cycles
                .is_some_and(|max| task.cycle() >= max)
            {
                break;
            }

            let cycle = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                cycle = task.wait_next_cycle() => cycle,
            };

            let now_active = self.config.active_copies(cycle);
            if now_active != active {
                warn!(sensor = %kind, cycle, from = active, to = now_active, "Fault injected");
                active = now_active;
                self.metrics.update_active_copies(active);
            }

            let record = synthetic_record(kind, cycle, task.period().as_secs_f64());
            let bytes = framing::encode(&record);
            for (copy, output) in outputs.iter().take(active).enumerate() {
                match output.send(&bytes).await {
                    Ok(_) => self.metrics.record_sent(),
                    Err(e) => {
                        self.metrics.record_send_failure();
                        warn!(sensor = %kind, copy, error = %e, "Send failed");
                    }
                }
            }
            self.metrics.record_cycle();
            trace!(sensor = %kind, cycle, copies = active, "Cycle sent");
        }

        let snapshot = self.metrics.snapshot();
        debug!(sensor = %kind, cycles = snapshot.cycles, "Mock producer stopped");
        Ok(snapshot)
    }

    async fn open_outputs(&self) -> Result<Vec<Endpoint>> {
        let kind = self.config.kind;
        let mut outputs = Vec::with_capacity(self.config.targets.len());
        for (copy, target) in self.config.targets.iter().enumerate() {
            let config = EndpointConfig::output(format!("producer {kind}[{copy}]"), *target);
            let endpoint = Endpoint::open(&config)
                .await
                .map_err(|source| ProducerError::Transport { kind, source })?;
            outputs.push(endpoint);
        }
        Ok(outputs)
    }
}

/// 为蓝图中每个冗余组创建生产者
pub fn producers_from_blueprint(
    blueprint: &HubBlueprint,
    bypass_fdir: bool,
    fault: Option<FaultInjection>,
    max_cycles: Option<u64>,
) -> Result<Vec<MockProducer>> {
    blueprint
        .groups
        .iter()
        .map(|group| {
            let config = MockProducerConfig::from_blueprint(blueprint, group.kind, bypass_fdir)?
                .with_fault(fault)
                .with_max_cycles(max_cycles);
            Ok(MockProducer::new(config))
        })
        .collect()
}

/// 第 `cycle` 个周期的合成记录
///
/// 数值随周期缓慢变化，便于在接收端区分不同周期。
pub fn synthetic_record(kind: SensorKind, cycle: u64, period_s: f64) -> SensorRecord {
    let t = cycle as f64 * period_s;
    match kind {
        SensorKind::Imu => SensorRecord::Imu(ImuRecord {
            vel_inc: [0.0, 0.0, 9.81 * IMU_T_INC],
            ang_inc: [1e-5 * (t * 0.1).sin(), 1e-5 * (t * 0.1).cos(), 0.0],
            t_inc: IMU_T_INC,
            validity: 1,
        }),
        SensorKind::Gnss => SensorRecord::Gnss(GnssRecord {
            position_m: [31.2304 + t * 1e-6, 121.4737 + t * 1e-6, 100.0],
            velocity_enu_m_s: [1.0, 0.5, 0.0],
            dop: 0.8,
            validity: 1,
        }),
        SensorKind::StarTracker => {
            let half = 0.5 * (t * 1e-3);
            SensorRecord::StarTracker(StarTrackerRecord {
                time_tag: t,
                quaternion: [half.cos(), 0.0, 0.0, half.sin()],
            })
        }
    }
}
