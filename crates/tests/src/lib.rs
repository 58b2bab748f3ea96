//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 生产者 -> FDIR worker -> GNC 的端到端场景
//! - 不同传感器类型 worker 之间的隔离
//! - 配置文件 -> FdirHub 的完整启动路径

#[cfg(test)]
mod support {
    use std::time::Duration;

    use contracts::{EndpointConfig, SensorKind, SensorRecord};
    use fdir::{CycleReport, FdirWorker, RedundancyGroup, WorkerOptions, WorkerSummary};
    use tokio::sync::mpsc;
    use tokio::task::JoinHandle;
    use tokio_util::sync::CancellationToken;
    use transport::Endpoint;

    /// Receive deadline of one worker cycle in these scenarios
    pub const CYCLE_TIMEOUT: Duration = Duration::from_millis(200);

    /// A spawned worker wired to loopback producers and a GNC socket
    pub struct Loop {
        pub kind: SensorKind,
        pub producers: Vec<Endpoint>,
        pub gnc: Endpoint,
        pub cancel: CancellationToken,
        pub task: JoinHandle<WorkerSummary>,
    }

    pub async fn spawn_worker(
        kind: SensorKind,
        copies: usize,
        options: WorkerOptions,
        reports: mpsc::Sender<CycleReport>,
    ) -> Loop {
        let loopback = "127.0.0.1:0".parse().unwrap();
        let gnc = Endpoint::open(&EndpointConfig::input(format!("gnc<-{kind}"), loopback))
            .await
            .unwrap();
        let output = Endpoint::open(&EndpointConfig::output(
            format!("{kind}->gnc"),
            gnc.local_addr().unwrap(),
        ))
        .await
        .unwrap();

        let mut inputs = Vec::with_capacity(copies);
        let mut producers = Vec::with_capacity(copies);
        for copy in 0..copies {
            let input = Endpoint::open(&EndpointConfig::input(format!("{kind}[{copy}]"), loopback))
                .await
                .unwrap();
            let producer = Endpoint::open(&EndpointConfig::output(
                format!("producer {kind}[{copy}]"),
                input.local_addr().unwrap(),
            ))
            .await
            .unwrap();
            inputs.push(input);
            producers.push(producer);
        }

        let group = RedundancyGroup::from_endpoints(kind, inputs, output).unwrap();
        let cancel = CancellationToken::new();
        let worker = FdirWorker::new(group, options).with_reports(reports);
        let task = tokio::spawn(worker.run(cancel.clone()));

        Loop {
            kind,
            producers,
            gnc,
            cancel,
            task,
        }
    }

    impl Loop {
        /// Send `record` from each listed copy
        pub async fn send(&self, copies: &[usize], record: impl Fn(usize) -> SensorRecord) {
            for &copy in copies {
                self.producers[copy]
                    .send(&framing::encode(&record(copy)))
                    .await
                    .unwrap();
            }
        }

        /// Next record forwarded to the GNC
        pub async fn forwarded(&self) -> SensorRecord {
            let bytes = self
                .gnc
                .receive_timeout(self.kind.record_size(), Duration::from_secs(2))
                .await
                .unwrap();
            framing::decode(self.kind, &bytes).unwrap()
        }

        /// Whether nothing is waiting on the GNC socket
        pub fn gnc_is_empty(&self) -> bool {
            matches!(
                self.gnc.try_receive(self.kind.record_size()),
                Err(transport::TransportError::WouldBlock)
            )
        }

        pub async fn stop(self) -> WorkerSummary {
            self.cancel.cancel();
            tokio::time::timeout(Duration::from_secs(2), self.task)
                .await
                .unwrap()
                .unwrap()
        }
    }

    pub async fn next_report(rx: &mut mpsc::Receiver<CycleReport>) -> CycleReport {
        tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("no cycle report in time")
            .expect("report channel closed")
    }
}

#[cfg(test)]
mod scenario_tests {
    use contracts::{
        GnssRecord, ImuRecord, SelectionPolicy, SensorKind, SensorRecord, StarTrackerRecord,
    };
    use fdir::{SendOutcome, WorkerOptions};
    use tokio::sync::mpsc;

    use crate::support::{next_report, spawn_worker, CYCLE_TIMEOUT};

    fn imu(cycle: u64, copy: usize) -> SensorRecord {
        SensorRecord::Imu(ImuRecord {
            vel_inc: [0.0, 0.0, cycle as f64],
            ang_inc: [copy as f64, 0.0, 0.0],
            t_inc: 0.01,
            validity: 1,
        })
    }

    fn gnss(cycle: u64, copy: usize) -> SensorRecord {
        SensorRecord::Gnss(GnssRecord {
            position_m: [cycle as f64, copy as f64, 100.0],
            velocity_enu_m_s: [1.0, 0.0, 0.0],
            dop: 0.9,
            validity: 1,
        })
    }

    fn star(cycle: u64, copy: usize) -> SensorRecord {
        SensorRecord::StarTracker(StarTrackerRecord {
            time_tag: cycle as f64 + copy as f64 * 0.001,
            quaternion: [1.0, 0.0, 0.0, 0.0],
        })
    }

    /// Three IMU copies over five cycles: five outputs, all copy 0's record
    #[tokio::test]
    async fn scenario_a_full_redundancy_forwards_primary() {
        let (tx, mut rx) = mpsc::channel(16);
        let imu_loop =
            spawn_worker(SensorKind::Imu, 3, WorkerOptions::new(CYCLE_TIMEOUT), tx).await;

        for cycle in 1..=5u64 {
            imu_loop.send(&[0, 1, 2], |copy| imu(cycle, copy)).await;

            let report = next_report(&mut rx).await;
            assert_eq!(report.cycle, cycle);
            assert_eq!(report.received_count, 3);
            assert_eq!(report.chosen, Some(0));
            assert_eq!(report.expected_after, 3);
            assert_eq!(imu_loop.forwarded().await, imu(cycle, 0));
        }

        assert!(imu_loop.gnc_is_empty());
        let summary = imu_loop.stop().await;
        assert_eq!(summary.metrics.forwarded, 5);
        assert_eq!(summary.expected, 3);
    }

    /// GNSS copy 2 stops after cycle 2: at cycle 3 expected drops to 2 and
    /// the chosen index equals the received count
    #[tokio::test]
    async fn scenario_b_lost_copy_degrades_sticky() {
        let (tx, mut rx) = mpsc::channel(16);
        let gnss_loop =
            spawn_worker(SensorKind::Gnss, 3, WorkerOptions::new(CYCLE_TIMEOUT), tx).await;

        for cycle in 1..=2u64 {
            gnss_loop.send(&[0, 1, 2], |copy| gnss(cycle, copy)).await;
            let report = next_report(&mut rx).await;
            assert_eq!(report.chosen, Some(0));
            assert_eq!(gnss_loop.forwarded().await, gnss(cycle, 0));
        }

        gnss_loop.send(&[0, 1], |copy| gnss(3, copy)).await;
        let report = next_report(&mut rx).await;
        assert_eq!(report.cycle, 3);
        assert_eq!(report.received_count, 2);
        assert_eq!(report.expected_before, 3);
        assert_eq!(report.expected_after, 2);
        assert_eq!(report.chosen, Some(2));
        // Slot 2 is empty, so the lowest arrival goes out.
        assert_eq!(report.forwarded, Some(0));
        assert_eq!(gnss_loop.forwarded().await, gnss(3, 0));

        for cycle in 4..=5u64 {
            gnss_loop.send(&[0, 1], |copy| gnss(cycle, copy)).await;
            let report = next_report(&mut rx).await;
            assert_eq!(report.expected_before, 2);
            assert_eq!(report.expected_after, 2);
            assert_eq!(report.chosen, Some(0));
            assert_eq!(gnss_loop.forwarded().await, gnss(cycle, 0));
        }

        let summary = gnss_loop.stop().await;
        assert_eq!(summary.expected, 2);
        assert_eq!(summary.metrics.degradations, 1);
        assert_eq!(summary.metrics.forwarded, 5);
    }

    /// All star trackers silent for one cycle: nothing forwarded, expected
    /// untouched; one copy resumes and forwarding continues degraded
    #[tokio::test]
    async fn scenario_c_silent_cycle_then_single_copy() {
        let (tx, mut rx) = mpsc::channel(16);
        let star_loop =
            spawn_worker(SensorKind::StarTracker, 3, WorkerOptions::new(CYCLE_TIMEOUT), tx).await;

        star_loop.send(&[0, 1, 2], |copy| star(1, copy)).await;
        assert_eq!(next_report(&mut rx).await.chosen, Some(0));
        assert_eq!(star_loop.forwarded().await, star(1, 0));

        let silent = next_report(&mut rx).await;
        assert_eq!(silent.cycle, 2);
        assert_eq!(silent.received_count, 0);
        assert_eq!(silent.chosen, None);
        assert_eq!(silent.send, SendOutcome::Skipped);
        assert_eq!(silent.expected_after, 3);
        assert!(star_loop.gnc_is_empty());

        star_loop.send(&[0], |copy| star(3, copy)).await;
        let resumed = next_report(&mut rx).await;
        assert_eq!(resumed.received_count, 1);
        assert_eq!(resumed.chosen, Some(1));
        assert_eq!(resumed.expected_after, 1);
        assert_eq!(star_loop.forwarded().await, star(3, 0));

        star_loop.send(&[0], |copy| star(4, copy)).await;
        let steady = next_report(&mut rx).await;
        assert_eq!(steady.chosen, Some(0));
        assert_eq!(steady.expected_after, 1);
        assert_eq!(star_loop.forwarded().await, star(4, 0));

        star_loop.stop().await;
    }

    /// Under the lowest-surviving policy the copy that actually arrived is
    /// forwarded even when it is not copy 0
    #[tokio::test]
    async fn lowest_surviving_forwards_the_arrival() {
        let (tx, mut rx) = mpsc::channel(16);
        let options =
            WorkerOptions::new(CYCLE_TIMEOUT).with_policy(SelectionPolicy::LowestSurviving);
        let star_loop = spawn_worker(SensorKind::StarTracker, 3, options, tx).await;

        star_loop.send(&[1], |copy| star(1, copy)).await;
        let report = next_report(&mut rx).await;
        assert_eq!(report.chosen, Some(1));
        assert_eq!(report.forwarded, Some(1));
        assert_eq!(report.expected_after, 1);
        assert_eq!(star_loop.forwarded().await, star(1, 1));

        star_loop.stop().await;
    }
}

#[cfg(test)]
mod isolation_tests {
    use std::time::Duration;

    use contracts::{GnssRecord, ImuRecord, SensorKind, SensorRecord};
    use fdir::WorkerOptions;
    use tokio::sync::mpsc;

    use crate::support::{spawn_worker, CYCLE_TIMEOUT};

    /// Degrading the GNSS worker leaves the concurrent IMU worker untouched
    #[tokio::test]
    async fn workers_do_not_share_state() {
        let (tx, mut rx) = mpsc::channel(64);
        let imu_loop =
            spawn_worker(SensorKind::Imu, 3, WorkerOptions::new(CYCLE_TIMEOUT), tx.clone()).await;
        let gnss_loop =
            spawn_worker(SensorKind::Gnss, 3, WorkerOptions::new(CYCLE_TIMEOUT), tx).await;

        for _ in 0..3 {
            imu_loop
                .send(&[0, 1, 2], |_| SensorRecord::Imu(ImuRecord::default()))
                .await;
            gnss_loop
                .send(&[0], |_| SensorRecord::Gnss(GnssRecord::default()))
                .await;
            imu_loop.forwarded().await;
            gnss_loop.forwarded().await;
            // Let both workers finish their cycle before the next burst.
            tokio::time::sleep(CYCLE_TIMEOUT + Duration::from_millis(50)).await;
        }

        let imu = imu_loop.stop().await;
        let gnss = gnss_loop.stop().await;
        assert_eq!(imu.expected, 3);
        assert_eq!(imu.metrics.degradations, 0);
        assert_eq!(gnss.expected, 1);
        assert_eq!(gnss.metrics.degradations, 1);

        let mut imu_reports = 0;
        while let Ok(report) = rx.try_recv() {
            match report.kind {
                SensorKind::Imu => {
                    imu_reports += 1;
                    assert_eq!(report.expected_after, 3);
                }
                SensorKind::Gnss => assert!(report.expected_after <= report.expected_before),
                SensorKind::StarTracker => panic!("no star tracker worker was started"),
            }
        }
        assert!(imu_reports >= 3);
    }
}

#[cfg(test)]
mod hub_tests {
    use std::time::Duration;

    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::SensorKind;
    use fdir::{FdirHub, HubOptions};
    use gnc_consumer::GncConsumer;
    use observability::FdirMetricsAggregator;
    use producer::{producers_from_blueprint, FaultInjection};
    use tokio_util::sync::CancellationToken;

    fn free_port_block(len: u16) -> u16 {
        // Retry until a run of `len` consecutive ports binds.
        loop {
            let base = std::net::UdpSocket::bind("127.0.0.1:0")
                .unwrap()
                .local_addr()
                .unwrap()
                .port();
            if base.checked_add(len).is_none() {
                continue;
            }
            let all_free = (0..len)
                .map(|i| std::net::UdpSocket::bind(("127.0.0.1", base + i)))
                .collect::<Result<Vec<_>, _>>()
                .is_ok();
            if all_free {
                return base;
            }
        }
    }

    /// Config file -> hub + mock producers + GNC, with an IMU fault
    #[tokio::test]
    async fn hub_degrades_only_the_faulty_kind() {
        // every copy also claims its nominal port gnc_port + index
        let base = free_port_block(12);
        let (imu_fdir, gnss_fdir) = (base, base + 3);
        let (imu_gnc, gnss_gnc) = (base + 6, base + 9);
        let config = format!(
            r#"
[fdir]
selection_policy = "sticky"

[[groups]]
kind = "imu"
redundancy = 3
fdir_base_port = {imu_fdir}
gnc_port = {imu_gnc}
frequency_hz = 10.0

[[groups]]
kind = "gnss"
redundancy = 3
fdir_base_port = {gnss_fdir}
gnc_port = {gnss_gnc}
frequency_hz = 10.0
"#
        );
        let blueprint = ConfigLoader::load_from_str(&config, ConfigFormat::Toml).unwrap();

        let cancel = CancellationToken::new();
        let gnc = GncConsumer::open(&blueprint)
            .await
            .unwrap()
            .with_poll_timeout(Duration::from_millis(100));
        let gnc_task = tokio::spawn(gnc.run(cancel.clone()));

        let mut hub = FdirHub::start_with_options(
            &blueprint,
            cancel.child_token(),
            HubOptions {
                max_cycles: Some(10),
            },
        )
        .await
        .unwrap();
        let mut reports = hub.take_reports().unwrap();

        let fault = FaultInjection {
            kind: SensorKind::Imu,
            after_cycles: 3,
            surviving_copies: 2,
        };
        let producers: Vec<_> = producers_from_blueprint(&blueprint, false, Some(fault), None)
            .unwrap()
            .into_iter()
            .map(|p| p.spawn(cancel.clone()))
            .collect();

        let mut aggregator = FdirMetricsAggregator::new();
        let collect = async {
            while let Some(report) = reports.recv().await {
                aggregator.update(&report);
            }
        };
        tokio::time::timeout(Duration::from_secs(10), collect)
            .await
            .expect("hub did not finish its cycles");

        let summaries = hub.join().await.unwrap();
        cancel.cancel();
        for producer in producers {
            producer.await.unwrap().unwrap();
        }
        let gnc = gnc_task.await.unwrap();

        let imu = summaries.iter().find(|s| s.kind == SensorKind::Imu).unwrap();
        let gnss = summaries.iter().find(|s| s.kind == SensorKind::Gnss).unwrap();
        assert_eq!(imu.expected, 2);
        assert_eq!(gnss.expected, 3);

        assert_eq!(aggregator.kind(SensorKind::Imu).unwrap().degradations, 1);
        assert_eq!(aggregator.total_cycles(), 20);
        assert!(gnc.received(SensorKind::Imu) > 0);
        assert!(gnc.received(SensorKind::Gnss) > 0);
        assert_eq!(gnc.invalid_size, 0);
    }

    #[tokio::test]
    async fn hub_start_is_all_or_nothing() {
        let blueprint = contracts::HubBlueprint::default();
        let holder = std::net::UdpSocket::bind((
            blueprint.network.address,
            blueprint.groups[1].fdir_port(0).unwrap(),
        ));
        // Only meaningful when this process got the port first.
        if holder.is_err() {
            return;
        }

        let err = FdirHub::start(&blueprint, CancellationToken::new())
            .await
            .err()
            .expect("hub must not start with a taken port");
        assert_eq!(err.kind(), Some(SensorKind::Gnss));
    }
}
