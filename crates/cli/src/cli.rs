//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use contracts::{SelectionPolicy, SensorKind};
use std::net::Ipv4Addr;
use std::path::PathBuf;

/// FDIR Hub - fault detection, isolation and recovery for redundant sensors
#[derive(Parser, Debug)]
#[command(
    name = "fdir-hub",
    author,
    version,
    about = "FDIR hub for N-modular redundant sensors",
    long_about = "Receives every redundant copy of the IMU, GNSS and star tracker streams \n\
                  over UDP, detects lost copies, and forwards a single record per sensor \n\
                  kind to the GNC. Also ships mock producers and a GNC monitor."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "FDIR_HUB_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "FDIR_HUB_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the FDIR hub
    Run(RunArgs),

    /// Run mock redundant sensor producers
    Produce(ProduceArgs),

    /// Run the GNC consumer and print what the hub forwards
    Monitor(MonitorArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Configuration source shared by every command
#[derive(Parser, Debug, Clone)]
pub struct ConfigArgs {
    /// Path to configuration file (TOML or JSON); built-in defaults when omitted
    #[arg(short, long, env = "FDIR_HUB_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override the IPv4 address of every endpoint
    #[arg(long, env = "FDIR_HUB_ADDRESS")]
    pub address: Option<Ipv4Addr>,
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Override the selection policy
    #[arg(long, value_enum, env = "FDIR_HUB_POLICY")]
    pub policy: Option<PolicyArg>,

    /// Stop each worker after this many cycles (0 = unlimited)
    #[arg(long, default_value = "0", env = "FDIR_HUB_MAX_CYCLES")]
    pub max_cycles: u64,

    /// Hub timeout in seconds (0 = no timeout)
    #[arg(long, default_value = "0", env = "FDIR_HUB_TIMEOUT")]
    pub timeout: u64,

    /// Validate configuration and exit without starting the hub
    #[arg(long)]
    pub dry_run: bool,

    /// Also run the mock producers in this process
    #[arg(long)]
    pub with_producers: bool,

    /// Also run the GNC consumer in this process
    #[arg(long)]
    pub with_gnc: bool,

    /// Inject the default producer fault (only with --with-producers)
    #[arg(long, requires = "with_producers")]
    pub inject_fault: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "FDIR_HUB_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `produce` command
#[derive(Parser, Debug, Clone)]
pub struct ProduceArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Send straight to the nominal GNC ports instead of the FDIR ports
    #[arg(long)]
    pub bypass_fdir: bool,

    /// Drop copies of one sensor kind after a number of cycles
    #[arg(long)]
    pub inject_fault: bool,

    /// Sensor kind the fault applies to
    #[arg(long, value_enum, default_value = "imu", requires = "inject_fault")]
    pub fault_kind: SensorArg,

    /// Healthy cycles before the fault
    #[arg(long, default_value = "10", requires = "inject_fault")]
    pub fault_after: u64,

    /// Copies still sending after the fault
    #[arg(long, default_value = "2", requires = "inject_fault")]
    pub fault_copies: usize,

    /// Stop after this many cycles per sensor (0 = unlimited)
    #[arg(long, default_value = "0", env = "FDIR_HUB_PRODUCER_CYCLES")]
    pub cycles: u64,
}

/// Arguments for the `monitor` command
#[derive(Parser, Debug, Clone)]
pub struct MonitorArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Readiness wait per poll in milliseconds
    #[arg(long, default_value = "1000")]
    pub poll_timeout_ms: u64,

    /// Stop after this many records (0 = unlimited)
    #[arg(long, default_value = "0")]
    pub max_records: u64,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "fdir.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Show every copy's FDIR and nominal port
    #[arg(long)]
    pub ports: bool,

    /// Print the effective configuration as TOML
    #[arg(long, conflicts_with = "json")]
    pub dump: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

/// Selection policy flag
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum PolicyArg {
    Sticky,
    LowestSurviving,
}

impl From<PolicyArg> for SelectionPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Sticky => SelectionPolicy::Sticky,
            PolicyArg::LowestSurviving => SelectionPolicy::LowestSurviving,
        }
    }
}

/// Sensor kind flag
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum SensorArg {
    Imu,
    Gnss,
    StarTracker,
}

impl From<SensorArg> for SensorKind {
    fn from(arg: SensorArg) -> Self {
        match arg {
            SensorArg::Imu => SensorKind::Imu,
            SensorArg::Gnss => SensorKind::Gnss,
            SensorArg::StarTracker => SensorKind::StarTracker,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_run_flags() {
        let cli = Cli::parse_from([
            "fdir-hub",
            "run",
            "--max-cycles",
            "5",
            "--policy",
            "lowest-surviving",
            "--with-producers",
            "--inject-fault",
        ]);
        let Commands::Run(args) = cli.command else {
            panic!("expected run command");
        };
        assert_eq!(args.max_cycles, 5);
        assert!(matches!(args.policy, Some(PolicyArg::LowestSurviving)));
        assert!(args.inject_fault);
        assert!(args.config.config.is_none());
    }

    #[test]
    fn inject_fault_requires_producers() {
        assert!(Cli::try_parse_from(["fdir-hub", "run", "--inject-fault"]).is_err());
    }

    #[test]
    fn parses_produce_fault() {
        let cli = Cli::parse_from([
            "fdir-hub",
            "produce",
            "--inject-fault",
            "--fault-kind",
            "star-tracker",
            "--fault-copies",
            "1",
        ]);
        let Commands::Produce(args) = cli.command else {
            panic!("expected produce command");
        };
        assert_eq!(SensorKind::from(args.fault_kind), SensorKind::StarTracker);
        assert_eq!(args.fault_after, 10);
        assert_eq!(args.fault_copies, 1);
    }
}
