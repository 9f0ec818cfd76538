/// Plain-text pair report
///
/// Header with the pair metadata followed by one line per classified
/// transaction, oldest page last (newest first as retrieved).
use chrono::{DateTime, SecondsFormat, Utc};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::apis::dexscreener::PairMetadata;
use crate::config::ReportConfig;
use crate::errors::{ScanError, ScanResult};
use crate::logger::{self, LogTag};
use crate::transactions::ClassifiedTransaction;

const REPORT_EXTENSION: &str = "txt";

#[derive(Debug, Clone, PartialEq)]
pub struct ReportOptions {
    /// Replaces '.' in the token count columns
    pub decimal_separator: String,
    /// Shown in the "Recent Transactions" heading
    pub window_days: i64,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            decimal_separator: ",".to_string(),
            window_days: 7,
        }
    }
}

impl ReportOptions {
    pub fn from_config(config: &ReportConfig, window_days: i64) -> Self {
        Self {
            decimal_separator: config.decimal_separator.clone(),
            window_days,
        }
    }
}

/// Append `.txt` unless the name already ends with it (case-sensitive)
pub fn ensure_txt_extension(name: &str) -> PathBuf {
    let suffix = format!(".{}", REPORT_EXTENSION);
    if name.ends_with(&suffix) {
        PathBuf::from(name)
    } else {
        PathBuf::from(format!("{}{}", name, suffix))
    }
}

fn rfc3339(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn epoch_ms_to_rfc3339(ms: i64) -> String {
    DateTime::<Utc>::from_timestamp(ms.div_euclid(1000), 0)
        .map(|at| rfc3339(&at))
        .unwrap_or_default()
}

fn token_count(value: f64, separator: &str) -> String {
    format!("{:.5}", value).replace('.', separator)
}

pub fn render_report(
    pair: &PairMetadata,
    transactions: &[ClassifiedTransaction],
    options: &ReportOptions,
    created_at: DateTime<Utc>,
) -> String {
    let mut out = String::new();

    // Writing into a String cannot fail
    let _ = writeln!(out, "Report Created At: {}", rfc3339(&created_at));
    out.push('\n');
    let _ = writeln!(out, "Pair Address: {}", pair.pair_address);
    let _ = writeln!(out, "DEX: {} ({})", pair.dex_id, pair.chain_id);
    let _ = writeln!(out, "URL: {}", pair.url);
    let _ = writeln!(
        out,
        "Base Token: {} ({})",
        pair.base_token.name, pair.base_token.symbol
    );
    let _ = writeln!(
        out,
        "Quote Token: {} ({})",
        pair.quote_token.name, pair.quote_token.symbol
    );
    let _ = writeln!(out, "Price (Native): {}", pair.price_native);
    let _ = writeln!(out, "Price (USD): {}", pair.price_usd);

    let buckets = [("5m", 0usize), ("1h", 1), ("6h", 2), ("24h", 3)];
    let volume = [pair.volume.m5, pair.volume.h1, pair.volume.h6, pair.volume.h24];
    let txns = [pair.txns.m5, pair.txns.h1, pair.txns.h6, pair.txns.h24];
    let change = [
        pair.price_change.m5,
        pair.price_change.h1,
        pair.price_change.h6,
        pair.price_change.h24,
    ];

    for (label, i) in buckets {
        let _ = writeln!(out, "Volume ({}): {:.2}", label, volume[i]);
    }
    let _ = writeln!(out, "Liquidity (USD): {:.2}", pair.liquidity_usd);
    for (label, i) in buckets {
        let _ = writeln!(
            out,
            "Transactions ({}): Buys: {}, Sells: {}",
            label, txns[i].buys, txns[i].sells
        );
    }
    for (label, i) in buckets {
        let _ = writeln!(out, "Price Change ({}): {:.2}%", label, change[i]);
    }
    let _ = writeln!(out, "Boosts (Active): {}", pair.boosts_active);
    let _ = writeln!(
        out,
        "Pair Created At: {}",
        epoch_ms_to_rfc3339(pair.pair_created_at)
    );

    out.push('\n');
    let _ = writeln!(
        out,
        "Recent Transactions (Last {} days):",
        options.window_days
    );
    for tx in transactions {
        let _ = writeln!(
            out,
            "Date: {}, Amount (USD): {:.2}, Token Count ({}): {}, Token Count ({}): {}, Price: ${:.7}, Wallet: {}, Type: {}",
            tx.date,
            tx.amount_usd,
            pair.quote_token.symbol,
            token_count(tx.token_count_quote, &options.decimal_separator),
            pair.base_token.symbol,
            token_count(tx.token_count_base, &options.decimal_separator),
            tx.price,
            tx.wallet,
            tx.side,
        );
    }

    out
}

/// Render and write the report, returning the final path
pub fn write_report(
    output: &str,
    pair: &PairMetadata,
    transactions: &[ClassifiedTransaction],
    options: &ReportOptions,
    created_at: DateTime<Utc>,
) -> ScanResult<PathBuf> {
    let path = ensure_txt_extension(output);
    let report = render_report(pair, transactions, options, created_at);

    write_file(&path, &report)?;

    logger::info(
        LogTag::Report,
        &format!(
            "Report written to {} ({} transactions)",
            path.display(),
            transactions.len()
        ),
    );
    Ok(path)
}

fn write_file(path: &Path, contents: &str) -> ScanResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, contents).map_err(|e| {
        logger::error(
            LogTag::Report,
            &format!("Failed to write report {}: {}", path.display(), e),
        );
        ScanError::Io(e)
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apis::dexscreener::{Timeframes, TokenMeta, TxnCounts};
    use crate::transactions::TradeSide;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn pair() -> PairMetadata {
        PairMetadata {
            chain_id: "ethereum".to_string(),
            dex_id: "uniswap".to_string(),
            url: "https://dexscreener.com/ethereum/0xpair".to_string(),
            pair_address: "0xpair".to_string(),
            base_token: TokenMeta {
                address: "0xbase".to_string(),
                name: "Pepe".to_string(),
                symbol: "PEPE".to_string(),
            },
            quote_token: TokenMeta {
                address: "0xquote".to_string(),
                name: "Wrapped Ether".to_string(),
                symbol: "WETH".to_string(),
            },
            price_native: "0.0000004".to_string(),
            price_usd: "0.001".to_string(),
            volume: Timeframes {
                m5: 1.0,
                h1: 2.5,
                h6: 3.333,
                h24: 1000.0,
            },
            liquidity_usd: 12345.678,
            txns: Timeframes {
                m5: TxnCounts { buys: 1, sells: 2 },
                h1: TxnCounts { buys: 3, sells: 4 },
                h6: TxnCounts { buys: 5, sells: 6 },
                h24: TxnCounts { buys: 7, sells: 8 },
            },
            price_change: Timeframes {
                m5: -1.234,
                h1: 0.0,
                h6: 5.5,
                h24: 10.0,
            },
            boosts_active: 3,
            pair_created_at: 1_681_000_000_123,
        }
    }

    fn transaction() -> ClassifiedTransaction {
        ClassifiedTransaction {
            date: "2024-05-02 09:03:07".to_string(),
            amount_usd: 100.0,
            token_count_quote: 2.0,
            token_count_base: 1234.5,
            price: 50.0,
            wallet: "0xwallet".to_string(),
            side: TradeSide::Buy,
        }
    }

    fn created_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 10, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_render_layout() {
        let report = render_report(
            &pair(),
            &[transaction()],
            &ReportOptions::default(),
            created_at(),
        );
        let lines: Vec<&str> = report.lines().collect();

        assert_eq!(lines[0], "Report Created At: 2024-06-10T12:00:00Z");
        assert_eq!(lines[1], "");
        assert_eq!(lines[2], "Pair Address: 0xpair");
        assert_eq!(lines[3], "DEX: uniswap (ethereum)");
        assert_eq!(lines[5], "Base Token: Pepe (PEPE)");
        assert_eq!(lines[6], "Quote Token: Wrapped Ether (WETH)");
        assert_eq!(lines[10], "Volume (1h): 2.50");
        assert_eq!(lines[11], "Volume (6h): 3.33");
        assert_eq!(lines[13], "Liquidity (USD): 12345.68");
        assert_eq!(lines[14], "Transactions (5m): Buys: 1, Sells: 2");
        assert_eq!(lines[18], "Price Change (5m): -1.23%");
        assert_eq!(lines[22], "Boosts (Active): 3");
        assert_eq!(lines[23], "Pair Created At: 2023-04-09T00:26:40Z");
        assert_eq!(lines[24], "");
        assert_eq!(lines[25], "Recent Transactions (Last 7 days):");
        assert_eq!(
            lines[26],
            "Date: 2024-05-02 09:03:07, Amount (USD): 100.00, Token Count (WETH): 2,00000, Token Count (PEPE): 1234,50000, Price: $50.0000000, Wallet: 0xwallet, Type: buy"
        );
        assert_eq!(lines.len(), 27);
    }

    #[test]
    fn test_decimal_separator_option() {
        let options = ReportOptions {
            decimal_separator: ".".to_string(),
            window_days: 3,
        };
        let report = render_report(&pair(), &[transaction()], &options, created_at());
        assert!(report.contains("Recent Transactions (Last 3 days):"));
        assert!(report.contains("Token Count (WETH): 2.00000"));
        // Price keeps its dot regardless
        assert!(report.contains("Price: $50.0000000"));
    }

    #[test]
    fn test_empty_transaction_list() {
        let report = render_report(&pair(), &[], &ReportOptions::default(), created_at());
        assert!(report.ends_with("Recent Transactions (Last 7 days):\n"));
    }

    #[test]
    fn test_ensure_txt_extension() {
        assert_eq!(ensure_txt_extension("report"), PathBuf::from("report.txt"));
        assert_eq!(ensure_txt_extension("report.txt"), PathBuf::from("report.txt"));
        assert_eq!(ensure_txt_extension("report.TXT"), PathBuf::from("report.TXT.txt"));
        assert_eq!(ensure_txt_extension("data.csv"), PathBuf::from("data.csv.txt"));
    }

    #[test]
    fn test_write_report_to_disk() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("nested").join("pepe");

        let path = write_report(
            target.to_str().unwrap(),
            &pair(),
            &[transaction()],
            &ReportOptions::default(),
            created_at(),
        )
        .unwrap();

        assert_eq!(path, dir.path().join("nested").join("pepe.txt"));
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("Report Created At: 2024-06-10T12:00:00Z"));
        assert!(contents.contains("Type: buy"));
    }
}
