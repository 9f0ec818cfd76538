/// Covalent (GoldRush) transactions client
///
/// Endpoint used:
/// - /v1/{chainName}/address/{address}/transactions_v3/             newest page
/// - /v1/{chainName}/address/{address}/transactions_v3/page/{n}/    page n
///
/// Pages run newest to oldest by following `links.prev`.
pub mod types;

pub use self::types::{CovalentEnvelope, CovalentTransaction, PageLinks, TransactionsData};

use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Instant;

use crate::apis::client::HttpClient;
use crate::config::{CovalentConfig, API_KEY_ENV};
use crate::errors::{ScanError, ScanResult, Stage};
use crate::logger::{self, LogTag};
use crate::transactions::provider::ChainDataProvider;
use crate::transactions::types::{PageCursor, ScanRequest, TransactionPage};

const PROVIDER_NAME: &str = "Covalent";

// ============================================================================
// CLIENT IMPLEMENTATION
// ============================================================================

pub struct CovalentProvider {
    http: HttpClient,
    base_url: String,
    api_key: String,
}

impl CovalentProvider {
    pub fn new(base_url: &str, api_key: &str, timeout_secs: u64) -> ScanResult<Self> {
        if api_key.trim().is_empty() {
            return Err(ScanError::Config(format!(
                "Covalent API key is missing (set covalent.api_key, {} or --api-key)",
                API_KEY_ENV
            )));
        }

        Ok(Self {
            http: HttpClient::from_secs(timeout_secs, Stage::Retrieval)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.trim().to_string(),
        })
    }

    pub fn from_config(config: &CovalentConfig) -> ScanResult<Self> {
        Self::new(&config.base_url, &config.api_key, config.request_timeout_secs)
    }

    fn page_url(&self, request: &ScanRequest, cursor: Option<PageCursor>) -> String {
        let mut url = format!(
            "{}/v1/{}/address/{}/transactions_v3/",
            self.base_url, request.chain_id, request.address
        );
        if let Some(PageCursor(page)) = cursor {
            url.push_str(&format!("page/{}/", page));
        }
        url
    }
}

/// Page number of a `links.prev` URL (`.../page/{n}/`)
pub fn page_from_link(link: &str) -> Option<PageCursor> {
    let url = url::Url::parse(link).ok()?;
    let segments: Vec<&str> = url.path_segments()?.filter(|s| !s.is_empty()).collect();
    let position = segments.iter().rposition(|s| *s == "page")?;
    segments
        .get(position + 1)
        .and_then(|n| n.parse::<u32>().ok())
        .map(PageCursor)
}

/// Cursor of the next (older) page, if any
fn older_page(data: &TransactionsData) -> Option<PageCursor> {
    let prev = data.links.as_ref()?.prev.as_deref()?;
    page_from_link(prev).or_else(|| {
        data.current_page
            .filter(|page| *page > 0)
            .map(|page| PageCursor(page - 1))
    })
}

#[async_trait]
impl ChainDataProvider for CovalentProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn fetch_page(
        &self,
        request: &ScanRequest,
        cursor: Option<PageCursor>,
    ) -> ScanResult<TransactionPage> {
        let url = self.page_url(request, cursor);
        logger::debug(
            LogTag::Api,
            &format!("[COVALENT] Fetching transactions page: {}", url),
        );

        let start = Instant::now();
        let response = self
            .http
            .client()
            .get(&url)
            .bearer_auth(&self.api_key)
            .query(&[("quote-currency", "USD")])
            .send()
            .await
            .map_err(|e| ScanError::from_reqwest(Stage::Retrieval, e))?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Err(ScanError::not_found(
                Stage::Retrieval,
                format!(
                    "no transactions for {} on {}",
                    request.address, request.chain_id
                ),
            ));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ScanError::from_reqwest(Stage::Retrieval, e))?;

        if !status.is_success() {
            logger::warning(
                LogTag::Api,
                &format!("[COVALENT] HTTP {} for {}: {}", status, url, body),
            );
            return Err(ScanError::provider(
                Stage::Retrieval,
                PROVIDER_NAME,
                Some(status.as_u16()),
                body,
            ));
        }

        let data = parse_transactions_body(&body)?;

        let next = older_page(&data);
        let items: Vec<_> = data.items.into_iter().map(|t| t.into_raw()).collect();

        logger::debug(
            LogTag::Api,
            &format!(
                "[COVALENT] Page {:?}: {} items, next={:?} ({}ms)",
                cursor.map(|c| c.0),
                items.len(),
                next.map(|c| c.0),
                start.elapsed().as_millis()
            ),
        );

        Ok(TransactionPage { items, next })
    }
}

/// Unwrap the Covalent envelope of a successful HTTP response
fn parse_transactions_body(body: &str) -> ScanResult<TransactionsData> {
    let envelope: CovalentEnvelope<TransactionsData> =
        serde_json::from_str(body).map_err(|e| {
            ScanError::decode(
                Stage::Decode,
                format!("Failed to parse Covalent response: {}", e),
            )
        })?;

    if envelope.error {
        return Err(ScanError::provider(
            Stage::Retrieval,
            PROVIDER_NAME,
            envelope.error_code,
            envelope
                .error_message
                .unwrap_or_else(|| "unknown error".to_string()),
        ));
    }

    envelope
        .data
        .ok_or_else(|| ScanError::decode(Stage::Decode, "Covalent response has no data field"))
}
