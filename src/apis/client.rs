/// Shared HTTP client construction for the API adapters
use reqwest::Client;
use std::time::Duration;

use crate::errors::{ScanError, ScanResult, Stage};

const USER_AGENT: &str = concat!("tradescan/", env!("CARGO_PKG_VERSION"));

/// HTTP client wrapper with an optional request timeout
///
/// No retry logic: every request is attempted exactly once.
pub struct HttpClient {
    client: Client,
    timeout: Option<Duration>,
}

impl HttpClient {
    /// `timeout = None` leaves requests unbounded
    pub fn new(timeout: Option<Duration>, stage: Stage) -> ScanResult<Self> {
        let mut builder = Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder.build().map_err(|e| {
            ScanError::network(stage, format!("Failed to create HTTP client: {}", e))
        })?;

        Ok(Self { client, timeout })
    }

    /// Timeout from a seconds value where 0 means none
    pub fn from_secs(timeout_secs: u64, stage: Stage) -> ScanResult<Self> {
        let timeout = (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs));
        Self::new(timeout, stage)
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}
