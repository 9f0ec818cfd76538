/// Covalent (GoldRush) wire types for `transactions_v3`
///
/// Every field is optional: the provider omits or nulls fields freely and a
/// missing field must become a row-level skip, never a decode failure.
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::str::FromStr;

use crate::transactions::types::{LogEvent, LogParam, RawTransaction};

#[derive(Debug, Deserialize)]
pub struct CovalentEnvelope<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub error: bool,
    pub error_message: Option<String>,
    pub error_code: Option<u16>,
}

#[derive(Debug, Deserialize)]
pub struct TransactionsData {
    #[serde(default)]
    pub items: Vec<CovalentTransaction>,
    pub links: Option<PageLinks>,
    pub current_page: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct PageLinks {
    /// Older page
    pub prev: Option<String>,
    /// Newer page
    pub next: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CovalentTransaction {
    pub block_signed_at: Option<DateTime<Utc>>,
    pub tx_hash: Option<String>,
    pub value: Option<serde_json::Value>,
    pub value_quote: Option<f64>,
    pub from_address: Option<String>,
    pub log_events: Option<Vec<CovalentLogEvent>>,
}

#[derive(Debug, Deserialize)]
pub struct CovalentLogEvent {
    pub decoded: Option<CovalentDecoded>,
}

#[derive(Debug, Deserialize)]
pub struct CovalentDecoded {
    pub name: Option<String>,
    pub params: Option<Vec<CovalentParam>>,
}

#[derive(Debug, Deserialize)]
pub struct CovalentParam {
    pub name: Option<String>,
    pub value: Option<serde_json::Value>,
}

impl CovalentTransaction {
    pub fn into_raw(self) -> RawTransaction {
        RawTransaction {
            tx_hash: self.tx_hash,
            timestamp: self.block_signed_at,
            value: self.value.as_ref().and_then(parse_raw_value),
            value_usd: self.value_quote,
            sender: self.from_address,
            log_events: self
                .log_events
                .unwrap_or_default()
                .into_iter()
                .map(CovalentLogEvent::into_log_event)
                .collect(),
        }
    }
}

impl CovalentLogEvent {
    fn into_log_event(self) -> LogEvent {
        match self.decoded {
            Some(decoded) => LogEvent {
                name: decoded.name,
                params: decoded
                    .params
                    .unwrap_or_default()
                    .into_iter()
                    .filter_map(|p| {
                        Some(LogParam {
                            name: p.name?,
                            value: p.value.unwrap_or(serde_json::Value::Null),
                        })
                    })
                    .collect(),
            },
            None => LogEvent::undecoded(),
        }
    }
}

/// Raw value arrives as a decimal string (sometimes a number)
///
/// Anything that is not a finite decimal becomes `None`.
fn parse_raw_value(value: &serde_json::Value) -> Option<BigDecimal> {
    match value {
        serde_json::Value::String(s) => BigDecimal::from_str(s.trim()).ok(),
        serde_json::Value::Number(n) => BigDecimal::from_str(&n.to_string()).ok(),
        _ => None,
    }
}
