//! Hub run statistics.

use std::time::Duration;

use contracts::SensorKind;
use fdir::WorkerSummary;
use gnc_consumer::ConsumerSnapshot;
use observability::FdirMetricsAggregator;
use producer::ProducerSnapshot;

/// Statistics from a hub run
#[derive(Debug, Clone, Default)]
pub struct HubStats {
    /// Total duration of the run
    pub duration: Duration,

    /// Aggregated cycle reports
    pub cycles: FdirMetricsAggregator,

    /// Final state of every worker
    pub workers: Vec<WorkerSummary>,

    /// In-process mock producers
    pub producers: Vec<(SensorKind, ProducerSnapshot)>,

    /// In-process GNC consumer
    pub gnc: Option<ConsumerSnapshot>,
}

impl HubStats {
    /// Worker cycles per second, all kinds together
    pub fn cycle_rate(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.cycles.total_cycles() as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                     FDIR Hub Statistics                      ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("📊 Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Cycles: {}", self.cycles.total_cycles());
        println!("   ├─ Cycles/s: {:.2}", self.cycle_rate());
        println!("   └─ Workers: {}", self.workers.len());

        if !self.workers.is_empty() {
            println!("\n🛰️  Workers");
            for (i, worker) in self.workers.iter().enumerate() {
                let prefix = if i == self.workers.len() - 1 { "└─" } else { "├─" };
                let m = &worker.metrics;
                println!(
                    "   {} {}: expected {}/{} | forwarded {} | skipped {} | degradations {} | timeouts {} | send failures {}",
                    prefix,
                    worker.kind,
                    worker.expected,
                    worker.redundancy,
                    m.forwarded,
                    m.skipped,
                    m.degradations,
                    m.receive_timeouts,
                    m.send_failures
                );
            }
        }

        let summary = self.cycles.summary();
        if !summary.kinds.is_empty() {
            println!("\n📈 Received Copies per Cycle");
            for (i, kind) in summary.kinds.iter().enumerate() {
                let prefix = if i == summary.kinds.len() - 1 { "└─" } else { "├─" };
                println!(
                    "   {} {}: {} (forward rate {:.2}%)",
                    prefix, kind.kind, kind.received, kind.forward_rate
                );
            }
        }

        if !self.producers.is_empty() {
            println!("\n📤 Mock Producers");
            for (i, (kind, snapshot)) in self.producers.iter().enumerate() {
                let prefix = if i == self.producers.len() - 1 { "└─" } else { "├─" };
                println!(
                    "   {} {}: {} cycles, {} datagrams, {} active copies",
                    prefix, kind, snapshot.cycles, snapshot.datagrams_sent, snapshot.active_copies
                );
            }
        }

        if let Some(gnc) = &self.gnc {
            println!("\n🎯 GNC");
            for kind in SensorKind::ALL {
                println!("   ├─ {}: {} records", kind, gnc.received(kind));
            }
            println!("   ├─ Invalid datagrams: {}", gnc.invalid_size);
            println!("   └─ Poll timeouts: {}", gnc.poll_timeouts);
        }

        println!();
    }
}
