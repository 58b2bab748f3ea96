//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::HubBlueprint;
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    address: String,
    policy: String,
    group_count: usize,
    copy_count: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(blueprint) => {
            let warnings = collect_warnings(&blueprint);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: (!warnings.is_empty()).then_some(warnings),
                summary: Some(ConfigSummary {
                    version: format!("{:?}", blueprint.version),
                    address: blueprint.network.address.to_string(),
                    policy: format!("{:?}", blueprint.fdir.selection_policy),
                    group_count: blueprint.groups.len(),
                    copy_count: blueprint.groups.iter().map(|g| g.redundancy).sum(),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(blueprint: &HubBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();

    if blueprint.groups.is_empty() {
        warnings.push("No redundancy groups configured - the hub has nothing to run".to_string());
    }

    for group in &blueprint.groups {
        if group.redundancy == 1 {
            warnings.push(format!(
                "Group '{}' has a single copy - no redundancy to fall back on",
                group.kind
            ));
        }
        if let Some(ms) = group.cycle_timeout_ms {
            let period_ms = 1000.0 / group.frequency_hz();
            if (ms as f64) < period_ms {
                warnings.push(format!(
                    "Group '{}' cycle_timeout_ms ({ms}) is shorter than the producer period ({period_ms:.0} ms)",
                    group.kind
                ));
            }
        }
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Address: {}", summary.address);
            println!("  Policy: {}", summary.policy);
            println!("  Groups: {}", summary.group_count);
            println!("  Copies: {}", summary.copy_count);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{GroupConfig, SensorKind};

    #[test]
    fn default_blueprint_has_no_warnings() {
        assert!(collect_warnings(&HubBlueprint::default()).is_empty());
    }

    #[test]
    fn warns_about_single_copy_and_short_timeout() {
        let mut group = GroupConfig::new(SensorKind::Imu).with_redundancy(1);
        group.cycle_timeout_ms = Some(100);
        let blueprint = HubBlueprint {
            groups: vec![group],
            ..Default::default()
        };
        let warnings = collect_warnings(&blueprint);
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("single copy"));
    }

    #[test]
    fn missing_file_is_invalid() {
        let args = ValidateArgs {
            config: "/nonexistent/fdir.toml".into(),
            json: true,
        };
        let result = validate_config(&args);
        assert!(!result.valid);
        assert!(result.error.unwrap().contains("File not found"));
    }
}
