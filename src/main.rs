use anyhow::Context;
use chrono::Utc;
use colored::Colorize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use tradescan::{
    apis::{covalent::CovalentProvider, dexscreener::DexScreenerClient},
    arguments::{self, CliArgs},
    config::{self, Config},
    errors::{ScanError, Stage},
    logger::{self, LogTag},
    report::{self, ReportOptions},
    transactions::{scan_recent_trades, ChainDataProvider, ScanLimits, ScanRequest},
};

/// Set while the transaction scan runs, the only step Ctrl-C can cancel
static SCANNING: AtomicBool = AtomicBool::new(false);

/// Exit status after an interrupt that had nothing to cancel
const INTERRUPTED_EXIT_CODE: i32 = 130;

/// Main entry point for tradescan
///
/// Pair lookup, then the trailing-window scan, then the report. Any abort
/// prints the failing stage and exits with status 1.
#[tokio::main]
async fn main() {
    let args = arguments::get_cmd_args();
    logger::init(&args);

    let cli = match arguments::parse_cli(&args) {
        Ok(cli) => cli,
        Err(e) => e.exit(),
    };

    let cancel = CancellationToken::new();
    spawn_ctrl_c_handler(cancel.clone());

    let result = run(cli, cancel).await;
    logger::flush();

    if let Err(e) = result {
        let stage = e
            .downcast_ref::<ScanError>()
            .map(|scan| scan.stage().to_string())
            .unwrap_or_else(|| "startup".to_string());
        logger::error(LogTag::System, &format!("Failed during {}: {:#}", stage, e));
        eprintln!("{} {}: {:#}", "✗ Failed during".red().bold(), stage, e);
        logger::flush();
        std::process::exit(1);
    }
}

#[derive(Debug, PartialEq, Eq)]
enum InterruptAction {
    CancelScan,
    Exit,
}

/// First Ctrl-C during the scan cancels it; any other Ctrl-C exits
fn interrupt_action(scanning: bool, cancel: &CancellationToken) -> InterruptAction {
    if scanning && !cancel.is_cancelled() {
        InterruptAction::CancelScan
    } else {
        InterruptAction::Exit
    }
}

fn spawn_ctrl_c_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            match interrupt_action(SCANNING.load(Ordering::SeqCst), &cancel) {
                InterruptAction::CancelScan => {
                    logger::warning(LogTag::System, "Ctrl-C received, cancelling scan");
                    cancel.cancel();
                }
                InterruptAction::Exit => {
                    logger::warning(LogTag::System, "Ctrl-C received, exiting");
                    logger::flush();
                    std::process::exit(INTERRUPTED_EXIT_CODE);
                }
            }
        }
    });
}

fn load_config(cli: &CliArgs) -> Result<Config, ScanError> {
    let mut config = match cli.config_path.as_deref() {
        Some(path) => config::load_config_from_path(path)?,
        None => config::load_config()?,
    };
    config::apply_env_overrides(&mut config);
    cli.apply_to_config(&mut config);
    config::validate(&config)?;
    Ok(config)
}

async fn run(cli: CliArgs, cancel: CancellationToken) -> anyhow::Result<()> {
    let config = load_config(&cli)?;
    // Built before any network call so a missing API key fails first
    let provider: Arc<dyn ChainDataProvider> =
        Arc::new(CovalentProvider::from_config(&config.covalent)?);
    logger::info(
        LogTag::Config,
        &format!(
            "Mode: {:?}, window: {} days, deadline: {}",
            config.retrieval.mode,
            config.retrieval.window_days,
            match config.retrieval.deadline_secs {
                0 => "none".to_string(),
                secs => format!("{}s", secs),
            }
        ),
    );

    logger::info(LogTag::System, "Fetching pair data...");
    let pair = DexScreenerClient::new(&config.dexscreener)?
        .search_pair(&cli.address)
        .await?;
    logger::info(
        LogTag::System,
        &format!(
            "Pair {} on {} ({}/{})",
            pair.pair_address, pair.dex_id, pair.base_token.symbol, pair.quote_token.symbol
        ),
    );

    logger::info(LogTag::System, "Fetching recent transactions...");
    let limits = ScanLimits::from_config(&config.retrieval).with_cancel(cancel);
    let request = ScanRequest::new(cli.chain.as_str(), cli.address.as_str());
    SCANNING.store(true, Ordering::SeqCst);
    let outcome = scan_recent_trades(provider, &config, request, &limits).await;
    SCANNING.store(false, Ordering::SeqCst);
    let outcome = outcome?;

    logger::info(LogTag::System, "Writing report to file...");
    let options = ReportOptions::from_config(&config.report, config.retrieval.window_days);
    let path = report::write_report(
        &cli.output,
        &pair,
        &outcome.transactions,
        &options,
        Utc::now(),
    )
    .with_context(|| format!("[{}] could not write {}", Stage::Report, cli.output))?;

    println!(
        "{} {} ({} transactions, {} skipped)",
        "✓ Report successfully written to".green().bold(),
        path.display(),
        outcome.transactions.len(),
        outcome.skipped
    );
    Ok(())
}
