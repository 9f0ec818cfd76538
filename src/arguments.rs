/// Command-line argument handling for tradescan
///
/// Features:
/// - Process arguments captured once in CMD_ARGS
/// - clap parser for the scan options
/// - `--debug-<tag>` flags generated from the logger tags so clap accepts them
use clap::{Arg, ArgAction, Args, Command, FromArgMatches, Parser};
use once_cell::sync::Lazy;
use std::env;
use std::sync::Mutex;

use crate::config::{Config, RetrievalMode};

/// Process arguments, captured once
static CMD_ARGS: Lazy<Mutex<Vec<String>>> = Lazy::new(|| Mutex::new(env::args().collect()));

/// Gets a copy of the current command-line arguments
pub fn get_cmd_args() -> Vec<String> {
    match CMD_ARGS.lock() {
        Ok(args) => args.clone(),
        Err(_) => env::args().collect(),
    }
}

// =============================================================================
// SCAN OPTIONS
// =============================================================================

/// Chain names accepted by the chain data provider
pub const SUPPORTED_CHAINS: [&str; 10] = [
    "eth-mainnet",
    "bsc-mainnet",
    "matic-mainnet",
    "avalanche-mainnet",
    "fantom-mainnet",
    "optimism-mainnet",
    "arbitrum-mainnet",
    "solana-mainnet",
    "celo-mainnet",
    "moonbeam-mainnet",
];

/// `--debug-<tag>` flag names, one per logger tag
const DEBUG_FLAGS: [&str; 8] = [
    "debug-system",
    "debug-config",
    "debug-api",
    "debug-feed",
    "debug-decoder",
    "debug-classify",
    "debug-pipeline",
    "debug-report",
];

#[derive(Debug, Clone, PartialEq, Parser)]
#[command(
    name = "tradescan",
    version,
    about = "Recent trades report for a DEX pair"
)]
pub struct CliArgs {
    /// Pair or token contract address
    #[arg(long, value_name = "ADDRESS")]
    pub address: String,

    /// Chain name (e.g. eth-mainnet)
    #[arg(long, value_name = "CHAIN", value_parser = SUPPORTED_CHAINS)]
    pub chain: String,

    /// Report file name; `.txt` is appended when missing
    #[arg(long, value_name = "FILE")]
    pub output: String,

    /// Covalent API key (overrides config and COVALENT_API_KEY)
    #[arg(long, value_name = "KEY")]
    pub api_key: Option<String>,

    /// Configuration file
    #[arg(long = "config", value_name = "PATH")]
    pub config_path: Option<String>,

    /// Retrieval mode
    #[arg(long, value_name = "MODE")]
    pub mode: Option<RetrievalMode>,

    /// Trailing window length in days
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(i64).range(1..))]
    pub days: Option<i64>,

    /// Abort the scan after N seconds (0 = no deadline)
    #[arg(long, value_name = "N")]
    pub deadline_secs: Option<u64>,

    #[command(flatten)]
    pub logging: LoggingArgs,
}

/// Flags read by the logger; declared here so clap accepts them
#[derive(Debug, Clone, Default, PartialEq, Args)]
pub struct LoggingArgs {
    /// Verbose output for every tag
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Only warnings and errors
    #[arg(long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored console output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Mirror log output into a file
    #[arg(long, value_name = "PATH", global = true)]
    pub log_file: Option<String>,
}

fn debug_flag_args() -> Vec<Arg> {
    DEBUG_FLAGS
        .iter()
        .map(|flag| {
            Arg::new(*flag)
                .long(*flag)
                .action(ArgAction::SetTrue)
                .help("Debug output for this log tag")
        })
        .collect()
}

pub fn command() -> Command {
    use clap::CommandFactory;
    CliArgs::command().args(debug_flag_args())
}

/// Parse scan options from raw process arguments (program name first)
pub fn parse_cli(args: &[String]) -> Result<CliArgs, clap::Error> {
    let matches = command().try_get_matches_from(args)?;
    CliArgs::from_arg_matches(&matches)
}

impl CliArgs {
    /// Command-line values win over the configuration file
    pub fn apply_to_config(&self, config: &mut Config) {
        if let Some(key) = self.api_key.as_ref().filter(|k| !k.trim().is_empty()) {
            config.covalent.api_key = key.trim().to_string();
        }
        if let Some(mode) = self.mode {
            config.retrieval.mode = mode;
        }
        if let Some(days) = self.days {
            config.retrieval.window_days = days;
        }
        if let Some(deadline) = self.deadline_secs {
            config.retrieval.deadline_secs = deadline;
        }
    }
}
