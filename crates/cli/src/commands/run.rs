//! `run` command implementation.

use anyhow::{Context, Result};
use contracts::HubBlueprint;
use producer::FaultInjection;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::{cancel_on_shutdown_signal, load_blueprint};
use crate::cli::RunArgs;
use crate::pipeline::{HubPipeline, PipelineConfig};

/// Execute the `run` command
pub async fn run_hub(args: &RunArgs) -> Result<()> {
    let mut blueprint = load_blueprint(&args.config)?;

    if let Some(policy) = args.policy {
        info!(?policy, "Overriding selection policy from CLI");
        blueprint.fdir.selection_policy = policy.into();
    }

    info!(
        address = %blueprint.network.address,
        groups = blueprint.groups.len(),
        policy = ?blueprint.fdir.selection_policy,
        discard_invalid = blueprint.fdir.discard_invalid,
        "Configuration loaded"
    );

    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&blueprint);
        return Ok(());
    }

    let pipeline_config = PipelineConfig {
        blueprint,
        max_cycles: (args.max_cycles > 0).then_some(args.max_cycles),
        timeout: (args.timeout > 0).then(|| Duration::from_secs(args.timeout)),
        metrics_port: (args.metrics_port > 0).then_some(args.metrics_port),
        with_producers: args.with_producers,
        fault: args.inject_fault.then(FaultInjection::default),
        with_gnc: args.with_gnc,
    };

    let cancel = CancellationToken::new();
    cancel_on_shutdown_signal(cancel.clone());

    info!("Starting FDIR hub...");
    let stats = HubPipeline::new(pipeline_config)
        .run(cancel)
        .await
        .context("FDIR hub failed")?;

    info!(
        cycles = stats.cycles.total_cycles(),
        duration_secs = stats.duration.as_secs_f64(),
        "FDIR hub finished"
    );
    stats.print_summary();
    Ok(())
}

/// Print configuration summary for dry-run mode
fn print_config_summary(blueprint: &HubBlueprint) {
    println!("\n=== Configuration Summary ===\n");
    println!("Network: {}", blueprint.network.address);
    println!(
        "FDIR: policy={:?}, discard_invalid={}",
        blueprint.fdir.selection_policy, blueprint.fdir.discard_invalid
    );
    println!("\nGroups ({}):", blueprint.groups.len());
    for group in &blueprint.groups {
        println!(
            "  - {} x{} | fdir {}.. | gnc {} | {} Hz | timeout {:?}",
            group.kind,
            group.redundancy,
            group.fdir_base_port(),
            group.gnc_port(),
            group.frequency_hz(),
            group.cycle_timeout()
        );
    }
    println!();
}
