//! `monitor` command implementation.

use anyhow::{Context, Result};
use gnc_consumer::GncConsumer;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::{cancel_on_shutdown_signal, load_blueprint};
use crate::cli::MonitorArgs;
use crate::error::CliError;

/// Execute the `monitor` command
pub async fn run_monitor(args: &MonitorArgs) -> Result<()> {
    let blueprint = load_blueprint(&args.config)?;

    let (tx, mut rx) = mpsc::channel(64);
    let consumer = GncConsumer::open(&blueprint)
        .await
        .context("Failed to open GNC endpoints")?
        .with_poll_timeout(Duration::from_millis(args.poll_timeout_ms))
        .with_records(tx);

    let cancel = CancellationToken::new();
    cancel_on_shutdown_signal(cancel.clone());
    let handle = tokio::spawn(consumer.run(cancel.clone()));

    info!(
        groups = blueprint.groups.len(),
        max_records = args.max_records,
        "GNC monitor started"
    );

    let mut seen = 0u64;
    while let Some(consumed) = rx.recv().await {
        observability::record_consumed(consumed.kind);
        seen += 1;
        println!("[{seen:>6}] {}: {:?}", consumed.kind, consumed.record);

        if args.max_records > 0 && seen >= args.max_records {
            info!(records = seen, "Reached max records limit");
            cancel.cancel();
            break;
        }
    }
    drop(rx);

    let snapshot = handle
        .await
        .map_err(|e| CliError::task_join("gnc_consumer", e.to_string()))?;

    println!(
        "\nGNC received {} records ({} invalid datagrams, {} poll timeouts)",
        snapshot.total_received(),
        snapshot.invalid_size,
        snapshot.poll_timeouts
    );
    Ok(())
}
