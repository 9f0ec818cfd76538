/// Configuration schemas, each defined once with its defaults
use crate::config_struct;
use serde::{Deserialize, Serialize};

// ============================================================================
// CHAIN DATA PROVIDER
// ============================================================================

config_struct! {
    /// Covalent (GoldRush) transactions API
    pub struct CovalentConfig {
        base_url: String = "https://api.covalenthq.com".to_string(),
        /// Empty means "read COVALENT_API_KEY from the environment"
        api_key: String = String::new(),
        /// Per-request timeout; 0 leaves requests unbounded
        request_timeout_secs: u64 = 0,
    }
}

// ============================================================================
// PAIR METADATA
// ============================================================================

config_struct! {
    /// DexScreener pair search
    pub struct DexScreenerConfig {
        base_url: String = "https://api.dexscreener.com".to_string(),
        timeout_secs: u64 = 10,
    }
}

// ============================================================================
// RETRIEVAL
// ============================================================================

/// How transactions are pulled from the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetrievalMode {
    /// Caller requests each page in turn
    Paged,
    /// Background task pushes items through a channel
    Streamed,
}

impl std::str::FromStr for RetrievalMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "paged" => Ok(RetrievalMode::Paged),
            "streamed" | "stream" => Ok(RetrievalMode::Streamed),
            other => Err(format!(
                "Unknown retrieval mode '{}' (expected paged or streamed)",
                other
            )),
        }
    }
}

config_struct! {
    pub struct RetrievalConfig {
        mode: RetrievalMode = RetrievalMode::Streamed,
        /// Trailing window length
        window_days: i64 = 7,
        /// Items buffered between the streaming producer and the pipeline
        channel_capacity: usize = 256,
        /// Whole-scan deadline; 0 means no deadline
        deadline_secs: u64 = 0,
    }
}

// ============================================================================
// REPORT
// ============================================================================

config_struct! {
    pub struct ReportConfig {
        /// Decimal separator used for token counts in the transaction list
        decimal_separator: String = ",".to_string(),
    }
}

// ============================================================================
// ROOT
// ============================================================================

config_struct! {
    pub struct Config {
        covalent: CovalentConfig = CovalentConfig::default(),
        dexscreener: DexScreenerConfig = DexScreenerConfig::default(),
        retrieval: RetrievalConfig = RetrievalConfig::default(),
        report: ReportConfig = ReportConfig::default(),
    }
}
