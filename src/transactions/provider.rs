// Chain data provider abstraction
//
// A provider answers one question: "give me the page at this cursor". Feeds
// build the iteration semantics (paging, streaming, windowing) on top.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use super::types::{PageCursor, RawTransaction, ScanRequest, TransactionPage};
use crate::errors::{ScanError, ScanResult, Stage};

#[async_trait]
pub trait ChainDataProvider: Send + Sync {
    /// Provider name used in logs and errors
    fn name(&self) -> &str;

    /// Fetch the page at `cursor` (`None` = first page)
    ///
    /// Each call is exactly one upstream round trip and is never retried.
    async fn fetch_page(
        &self,
        request: &ScanRequest,
        cursor: Option<PageCursor>,
    ) -> ScanResult<TransactionPage>;
}

/// In-memory provider serving fixed pages
///
/// Page `n` is served for cursor `n`; the last page reports no continuation.
/// A page can be replaced by an error to simulate upstream failures.
pub struct StaticProvider {
    pages: Vec<Result<Vec<RawTransaction>, String>>,
    requests: AtomicUsize,
    seen_cursors: Mutex<Vec<Option<PageCursor>>>,
}

impl StaticProvider {
    pub fn new(pages: Vec<Vec<RawTransaction>>) -> Self {
        Self {
            pages: pages.into_iter().map(Ok).collect(),
            requests: AtomicUsize::new(0),
            seen_cursors: Mutex::new(Vec::new()),
        }
    }

    /// Make the page at `index` fail with a provider error
    pub fn with_failure(mut self, index: usize, message: &str) -> Self {
        if index < self.pages.len() {
            self.pages[index] = Err(message.to_string());
        } else {
            self.pages.resize_with(index, || Ok(Vec::new()));
            self.pages.push(Err(message.to_string()));
        }
        self
    }

    /// Number of pages requested so far
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub fn seen_cursors(&self) -> Vec<Option<PageCursor>> {
        match self.seen_cursors.lock() {
            Ok(cursors) => cursors.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait]
impl ChainDataProvider for StaticProvider {
    fn name(&self) -> &str {
        "static"
    }

    async fn fetch_page(
        &self,
        _request: &ScanRequest,
        cursor: Option<PageCursor>,
    ) -> ScanResult<TransactionPage> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut seen) = self.seen_cursors.lock() {
            seen.push(cursor);
        }

        let index = cursor.map(|c| c.0 as usize).unwrap_or(0);
        let page = match self.pages.get(index) {
            Some(Ok(items)) => items.clone(),
            Some(Err(message)) => {
                return Err(ScanError::provider(
                    Stage::Retrieval,
                    self.name(),
                    Some(500),
                    message.clone(),
                ))
            }
            None => Vec::new(),
        };

        let next = if index + 1 < self.pages.len() {
            Some(PageCursor(index as u32 + 1))
        } else {
            None
        };

        Ok(TransactionPage { items: page, next })
    }
}
