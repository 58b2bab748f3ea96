//! FDIR 指标收集模块
//!
//! 基于 CycleReport 收集和统计各 FDIR worker 的运行指标。

use std::collections::BTreeMap;

use contracts::SensorKind;
use fdir::{CycleReport, SendOutcome};
use metrics::{counter, gauge, histogram};

/// 从 CycleReport 记录指标
///
/// 每个 worker 周期结束时调用。
///
/// # Example
///
/// ```ignore
/// use observability::metrics::record_cycle_report;
///
/// while let Some(report) = reports.recv().await {
///     record_cycle_report(&report);
/// }
/// ```
pub fn record_cycle_report(report: &CycleReport) {
    let sensor = report.kind.as_str();

    counter!("fdir_hub_cycles_total", "sensor" => sensor).increment(1);

    // 本周期收到的副本数
    histogram!("fdir_hub_received_copies", "sensor" => sensor)
        .record(report.received_count as f64);

    // 当前期望副本数 (只降不升)
    gauge!("fdir_hub_expected_copies", "sensor" => sensor).set(report.expected_after as f64);

    if report.degraded() {
        counter!("fdir_hub_degradations_total", "sensor" => sensor).increment(1);
    }

    let outcome = match report.send {
        SendOutcome::Sent(_) => "forwarded",
        SendOutcome::Failed => "send_failed",
        SendOutcome::Skipped => "skipped",
    };
    counter!(
        "fdir_hub_cycle_outcomes_total",
        "sensor" => sensor,
        "outcome" => outcome
    )
    .increment(1);

    if let Some(index) = report.forwarded {
        gauge!("fdir_hub_forwarded_copy", "sensor" => sensor).set(index as f64);
    }
}

/// 记录 GNC 收到的记录
pub fn record_consumed(kind: SensorKind) {
    counter!("fdir_gnc_records_total", "sensor" => kind.as_str()).increment(1);
}

/// 单个传感器类型的统计
#[derive(Debug, Clone, Default)]
pub struct KindStats {
    pub cycles: u64,
    pub forwarded: u64,
    pub skipped: u64,
    pub send_failures: u64,
    pub degradations: u64,
    /// 最近一次周期后的期望副本数
    pub expected: usize,
    /// 每周期收到的副本数
    pub received: RunningStats,
}

/// FDIR 指标聚合器
///
/// 在内存中聚合周期报告，便于输出摘要。
#[derive(Debug, Clone, Default)]
pub struct FdirMetricsAggregator {
    kinds: BTreeMap<SensorKind, KindStats>,
}

impl FdirMetricsAggregator {
    /// 创建新的聚合器
    pub fn new() -> Self {
        Self::default()
    }

    /// 更新聚合统计
    pub fn update(&mut self, report: &CycleReport) {
        let stats = self.kinds.entry(report.kind).or_default();
        stats.cycles += 1;
        stats.expected = report.expected_after;
        stats.received.push(report.received_count as f64);

        if report.degraded() {
            stats.degradations += 1;
        }
        match report.send {
            SendOutcome::Sent(_) => stats.forwarded += 1,
            SendOutcome::Failed => stats.send_failures += 1,
            SendOutcome::Skipped => stats.skipped += 1,
        }
    }

    /// 某类传感器的统计
    pub fn kind(&self, kind: SensorKind) -> Option<&KindStats> {
        self.kinds.get(&kind)
    }

    /// 总周期数
    pub fn total_cycles(&self) -> u64 {
        self.kinds.values().map(|s| s.cycles).sum()
    }

    /// 生成摘要报告
    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            kinds: self
                .kinds
                .iter()
                .map(|(kind, stats)| KindSummary {
                    kind: *kind,
                    cycles: stats.cycles,
                    forwarded: stats.forwarded,
                    skipped: stats.skipped,
                    send_failures: stats.send_failures,
                    degradations: stats.degradations,
                    expected: stats.expected,
                    forward_rate: if stats.cycles > 0 {
                        stats.forwarded as f64 / stats.cycles as f64 * 100.0
                    } else {
                        0.0
                    },
                    received: StatsSummary::from(&stats.received),
                })
                .collect(),
        }
    }

    /// 重置统计
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// 单类传感器摘要
#[derive(Debug, Clone)]
pub struct KindSummary {
    pub kind: SensorKind,
    pub cycles: u64,
    pub forwarded: u64,
    pub skipped: u64,
    pub send_failures: u64,
    pub degradations: u64,
    pub expected: usize,
    pub forward_rate: f64,
    pub received: StatsSummary,
}

/// 指标摘要
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub kinds: Vec<KindSummary>,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== FDIR Metrics Summary ===")?;
        if self.kinds.is_empty() {
            return writeln!(f, "No cycles recorded");
        }
        for k in &self.kinds {
            writeln!(
                f,
                "{}: cycles={} forwarded={} ({:.2}%) skipped={} send_failures={} degradations={} expected={}",
                k.kind,
                k.cycles,
                k.forwarded,
                k.forward_rate,
                k.skipped,
                k.send_failures,
                k.degradations,
                k.expected
            )?;
            writeln!(f, "  received copies: {}", k.received)?;
        }
        Ok(())
    }
}

/// 统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.2}, max={:.2}, mean={:.2}, std={:.2} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// 在线统计 (Welford)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// 添加新值
    pub fn push(&mut self, value: f64) {
        self.count += 1;
        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
            return;
        }

        self.min = self.min.min(value);
        self.max = self.max.max(value);
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// 样本方差
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(kind: SensorKind, cycle: u64, before: usize, after: usize, received: usize) -> CycleReport {
        let forwarded = (received > 0).then_some(0);
        CycleReport {
            kind,
            cycle,
            expected_before: before,
            expected_after: after,
            received_count: received,
            chosen: forwarded,
            forwarded,
            send: if received > 0 {
                SendOutcome::Sent(kind.record_size())
            } else {
                SendOutcome::Skipped
            },
        }
    }

    #[test]
    fn test_running_stats() {
        let mut stats = RunningStats::default();
        for v in [3.0, 3.0, 2.0, 2.0, 0.0] {
            stats.push(v);
        }
        assert_eq!(stats.count(), 5);
        assert!((stats.mean() - 2.0).abs() < 1e-10);
        assert!((stats.min() - 0.0).abs() < 1e-10);
        assert!((stats.max() - 3.0).abs() < 1e-10);
        assert!((stats.variance() - 1.5).abs() < 1e-10);
    }

    #[test]
    fn test_aggregator_update() {
        let mut aggregator = FdirMetricsAggregator::new();
        aggregator.update(&report(SensorKind::Gnss, 1, 3, 3, 3));
        aggregator.update(&report(SensorKind::Gnss, 2, 3, 2, 2));
        aggregator.update(&report(SensorKind::Gnss, 3, 2, 2, 0));
        aggregator.update(&report(SensorKind::Imu, 1, 3, 3, 3));

        let gnss = aggregator.kind(SensorKind::Gnss).unwrap();
        assert_eq!(gnss.cycles, 3);
        assert_eq!(gnss.forwarded, 2);
        assert_eq!(gnss.skipped, 1);
        assert_eq!(gnss.degradations, 1);
        assert_eq!(gnss.expected, 2);
        assert_eq!(aggregator.total_cycles(), 4);
    }

    #[test]
    fn test_summary_display() {
        let mut aggregator = FdirMetricsAggregator::new();
        aggregator.update(&report(SensorKind::StarTracker, 1, 3, 3, 3));
        aggregator.update(&report(SensorKind::StarTracker, 2, 3, 3, 0));

        let output = aggregator.summary().to_string();
        assert!(output.contains("star_tracker: cycles=2"), "got: {output}");
        assert!(output.contains("50.00%"), "got: {output}");
        assert!(FdirMetricsAggregator::new()
            .summary()
            .to_string()
            .contains("No cycles recorded"));
    }

    #[test]
    fn recording_without_recorder_is_noop() {
        record_cycle_report(&report(SensorKind::Imu, 1, 3, 2, 2));
        record_consumed(SensorKind::Imu);
    }
}
