//! `produce` command implementation.

use anyhow::{Context, Result};
use producer::{producers_from_blueprint, FaultInjection};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::{cancel_on_shutdown_signal, load_blueprint};
use crate::cli::ProduceArgs;

/// Execute the `produce` command
pub async fn run_produce(args: &ProduceArgs) -> Result<()> {
    let blueprint = load_blueprint(&args.config)?;

    let fault = args.inject_fault.then(|| FaultInjection {
        kind: args.fault_kind.into(),
        after_cycles: args.fault_after,
        surviving_copies: args.fault_copies,
    });
    let max_cycles = (args.cycles > 0).then_some(args.cycles);

    let producers = producers_from_blueprint(&blueprint, args.bypass_fdir, fault, max_cycles)
        .context("Failed to build mock producers")?;

    info!(
        producers = producers.len(),
        bypass_fdir = args.bypass_fdir,
        fault = ?fault,
        max_cycles = ?max_cycles,
        "Starting mock producers"
    );

    let cancel = CancellationToken::new();
    cancel_on_shutdown_signal(cancel.clone());

    let handles: Vec<_> = producers
        .into_iter()
        .map(|p| (p.kind(), p.spawn(cancel.clone())))
        .collect();

    let mut failed = 0usize;
    for (kind, handle) in handles {
        match handle.await {
            Ok(Ok(snapshot)) => {
                println!(
                    "{}: {} cycles, {} datagrams sent, {} send failures, {} active copies",
                    kind,
                    snapshot.cycles,
                    snapshot.datagrams_sent,
                    snapshot.send_failures,
                    snapshot.active_copies
                );
            }
            Ok(Err(e)) => {
                warn!(sensor = %kind, error = %e, "Mock producer failed");
                failed += 1;
                // One failed producer stops the others.
                cancel.cancel();
            }
            Err(e) => {
                warn!(sensor = %kind, error = %e, "Mock producer task aborted");
                failed += 1;
                cancel.cancel();
            }
        }
    }
    cancel.cancel();

    if failed > 0 {
        anyhow::bail!("{failed} mock producer(s) failed");
    }
    Ok(())
}
