// Core data types for the retrieval -> decode -> classify pipeline

use bigdecimal::BigDecimal;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{ScanError, ScanResult};

/// Timestamp format used for classified transactions (UTC, locale-free)
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// =============================================================================
// RAW RECORDS (provider side)
// =============================================================================

/// One transfer record as delivered by the chain data provider
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTransaction {
    pub tx_hash: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    /// Raw integer transfer value; `None` when missing or not a number
    pub value: Option<BigDecimal>,
    pub value_usd: Option<f64>,
    pub sender: Option<String>,
    pub log_events: Vec<LogEvent>,
}

/// Event log attached to a transaction
///
/// `name` is `None` when the provider could not decode the log.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogEvent {
    pub name: Option<String>,
    pub params: Vec<LogParam>,
}

/// Decoded log parameter with the provider's loosely-typed scalar value
#[derive(Debug, Clone, PartialEq)]
pub struct LogParam {
    pub name: String,
    pub value: serde_json::Value,
}

impl LogEvent {
    pub fn decoded(name: &str, params: Vec<LogParam>) -> Self {
        Self {
            name: Some(name.to_string()),
            params,
        }
    }

    pub fn undecoded() -> Self {
        Self::default()
    }
}

impl LogParam {
    pub fn new(name: &str, value: impl Into<serde_json::Value>) -> Self {
        Self {
            name: name.to_string(),
            value: value.into(),
        }
    }
}

// =============================================================================
// CLASSIFIED OUTPUT
// =============================================================================

/// Trade direction from the wallet's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeSide {
    Buy,
    Sell,
    #[default]
    Unknown,
}

impl TradeSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeSide::Buy => "buy",
            TradeSide::Sell => "sell",
            TradeSide::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for TradeSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A transfer that passed the row filters, normalized and priced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedTransaction {
    pub date: String,
    pub amount_usd: f64,
    pub token_count_quote: f64,
    pub token_count_base: f64,
    pub price: f64,
    pub wallet: String,
    pub side: TradeSide,
}

// =============================================================================
// RETRIEVAL REQUEST
// =============================================================================

/// Closed time range `[start, end]` bounding retrieval
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Window of `days` days ending at `end`
    ///
    /// Fails when the start would fall outside the representable date range.
    pub fn trailing(end: DateTime<Utc>, days: i64) -> ScanResult<Self> {
        let start = Duration::try_days(days)
            .and_then(|span| end.checked_sub_signed(span))
            .ok_or_else(|| {
                ScanError::Config(format!("window of {} days is out of range", days))
            })?;
        Ok(Self { start, end })
    }

    pub fn is_before_start(&self, at: &DateTime<Utc>) -> bool {
        *at < self.start
    }

    pub fn is_after_end(&self, at: &DateTime<Utc>) -> bool {
        *at > self.end
    }
}

/// What to retrieve: one address on one chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRequest {
    pub chain_id: String,
    pub address: String,
}

impl ScanRequest {
    pub fn new(chain_id: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            chain_id: chain_id.into(),
            address: address.into(),
        }
    }
}

/// Continuation cursor handed back by the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor(pub u32);

/// One retrieval batch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionPage {
    pub items: Vec<RawTransaction>,
    /// `None` marks the last page
    pub next: Option<PageCursor>,
}
