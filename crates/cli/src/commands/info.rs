//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::{CopyId, HubBlueprint};
use serde::Serialize;

use super::load_blueprint;
use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    address: String,
    selection_policy: String,
    discard_invalid: bool,
    groups: Vec<GroupInfo>,
}

#[derive(Serialize)]
struct GroupInfo {
    kind: String,
    redundancy: usize,
    record_size: usize,
    frequency_hz: f64,
    cycle_timeout_ms: u128,
    gnc_port: u16,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    copies: Vec<CopyInfo>,
}

#[derive(Serialize)]
struct CopyInfo {
    copy: String,
    fdir_port: Option<u16>,
    nominal_port: Option<u16>,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    let blueprint = load_blueprint(&args.config)?;

    if args.dump {
        let toml = config_loader::ConfigLoader::to_toml(&blueprint)
            .context("Failed to serialize configuration")?;
        println!("{}", toml);
    } else if args.json {
        let info = build_config_info(&blueprint, args.ports);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&blueprint, args.ports);
    }

    Ok(())
}

fn build_config_info(blueprint: &HubBlueprint, ports: bool) -> ConfigInfo {
    let groups = blueprint
        .groups
        .iter()
        .map(|g| GroupInfo {
            kind: g.kind.to_string(),
            redundancy: g.redundancy,
            record_size: g.kind.record_size(),
            frequency_hz: g.frequency_hz(),
            cycle_timeout_ms: g.cycle_timeout().as_millis(),
            gnc_port: g.gnc_port(),
            copies: if ports {
                (0..g.redundancy)
                    .map(|i| CopyInfo {
                        copy: CopyId::new(g.kind, i).to_string(),
                        fdir_port: g.fdir_port(i),
                        nominal_port: g.nominal_port(i),
                    })
                    .collect()
            } else {
                Vec::new()
            },
        })
        .collect();

    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        address: blueprint.network.address.to_string(),
        selection_policy: format!("{:?}", blueprint.fdir.selection_policy),
        discard_invalid: blueprint.fdir.discard_invalid,
        groups,
    }
}

fn print_config_info(blueprint: &HubBlueprint, ports: bool) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                  FDIR Hub Configuration                      ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("🌐 Network");
    println!("   ├─ Version: {:?}", blueprint.version);
    println!("   └─ Address: {}", blueprint.network.address);

    println!("\n⚙️  FDIR");
    println!("   ├─ Selection policy: {:?}", blueprint.fdir.selection_policy);
    println!("   ├─ Discard invalid: {}", blueprint.fdir.discard_invalid);
    println!("   └─ Report capacity: {}", blueprint.fdir.report_capacity);

    println!("\n🛰️  Groups ({})", blueprint.groups.len());
    for (i, group) in blueprint.groups.iter().enumerate() {
        let is_last = i == blueprint.groups.len() - 1;
        let prefix = if is_last { "└─" } else { "├─" };
        let child_prefix = if is_last { "   " } else { "│  " };

        println!(
            "   {} {} x{} ({} bytes, {} Hz, timeout {:?}) -> gnc {}",
            prefix,
            group.kind,
            group.redundancy,
            group.kind.record_size(),
            group.frequency_hz(),
            group.cycle_timeout(),
            group.gnc_port()
        );

        if ports {
            for copy in 0..group.redundancy {
                let copy_prefix = if copy == group.redundancy - 1 { "└─" } else { "├─" };
                println!(
                    "   {}  {} {}: fdir {:?}, nominal {:?}",
                    child_prefix,
                    copy_prefix,
                    CopyId::new(group.kind, copy),
                    group.fdir_port(copy),
                    group.nominal_port(copy)
                );
            }
        }
    }

    println!();
}
