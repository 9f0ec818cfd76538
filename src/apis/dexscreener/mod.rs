/// DexScreener pair lookup
///
/// API Documentation: https://docs.dexscreener.com/api/reference
///
/// Endpoint used:
/// - /latest/dex/search/?q={query} - Search pairs; the first hit is the pair
pub mod types;

pub use self::types::{DexScreenerPairRaw, PairMetadata, SearchResponse, Timeframes, TokenMeta, TxnCounts};

use reqwest::StatusCode;
use std::time::Instant;

use crate::apis::client::HttpClient;
use crate::config::DexScreenerConfig;
use crate::errors::{ScanError, ScanResult, Stage};
use crate::logger::{self, LogTag};

const PROVIDER_NAME: &str = "DexScreener";

// ============================================================================
// CLIENT IMPLEMENTATION
// ============================================================================

pub struct DexScreenerClient {
    http: HttpClient,
    base_url: String,
}

impl DexScreenerClient {
    pub fn new(config: &DexScreenerConfig) -> ScanResult<Self> {
        if config.timeout_secs == 0 {
            return Err(ScanError::Config(
                "dexscreener.timeout_secs must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            http: HttpClient::from_secs(config.timeout_secs, Stage::PairLookup)?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn search_url(&self) -> String {
        format!("{}/latest/dex/search/", self.base_url)
    }

    /// Look up the pair for a contract address (first search hit)
    pub async fn search_pair(&self, query: &str) -> ScanResult<PairMetadata> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ScanError::Config("Query cannot be empty".to_string()));
        }

        let url = self.search_url();
        logger::debug(
            LogTag::Api,
            &format!("[DEXSCREENER] Searching pairs: query={}", query),
        );

        let start = Instant::now();
        let response = self
            .http
            .client()
            .get(&url)
            .query(&[("q", query)])
            .send()
            .await
            .map_err(|e| ScanError::from_reqwest(Stage::PairLookup, e))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ScanError::from_reqwest(Stage::PairLookup, e))?;

        logger::verbose(
            LogTag::Api,
            &format!(
                "[DEXSCREENER] HTTP {} in {}ms: {}",
                status,
                start.elapsed().as_millis(),
                body
            ),
        );

        parse_search_response(status, &body)
    }
}

/// Map a search response to the first pair
fn parse_search_response(status: StatusCode, body: &str) -> ScanResult<PairMetadata> {
    if status == StatusCode::NOT_FOUND {
        return Err(ScanError::not_found(
            Stage::PairLookup,
            "token not found (404). Please check the contract address",
        ));
    }

    if status != StatusCode::OK {
        return Err(ScanError::provider(
            Stage::PairLookup,
            PROVIDER_NAME,
            Some(status.as_u16()),
            body,
        ));
    }

    let data: SearchResponse = serde_json::from_str(body).map_err(|e| {
        ScanError::decode(
            Stage::Decode,
            format!("Failed to parse response: {}", e),
        )
    })?;

    data.pairs
        .unwrap_or_default()
        .first()
        .map(DexScreenerPairRaw::to_metadata)
        .ok_or_else(|| {
            ScanError::not_found(
                Stage::PairLookup,
                "no pairs found for the given contract address",
            )
        })
}
