// Transaction feeds - one iteration contract over two retrieval strategies
//
// PagedFeed    pull: the consumer asks for the next page when its buffer runs dry
// StreamedFeed push: a background task walks the pages and sends items over a
//              bounded channel, errors travel in-band on the same channel
// WindowedFeed applies the time window to either of them
//
// Items are expected newest first. The first item older than the window start
// ends iteration for good; whatever is left in that batch, and every later
// batch, is dropped unseen.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::provider::ChainDataProvider;
use super::types::{PageCursor, RawTransaction, ScanRequest, TimeWindow};
use crate::config::RetrievalMode;
use crate::errors::{ScanError, ScanResult, Stage};
use crate::logger::{self, LogTag};

#[async_trait]
pub trait TransactionFeed: Send {
    /// Next record, `Ok(None)` once the feed is exhausted
    ///
    /// An `Err` is abort-class: the whole scan stops, nothing is retried.
    async fn next_transaction(&mut self) -> ScanResult<Option<RawTransaction>>;

    /// Stop retrieving; later calls return `Ok(None)`
    fn close(&mut self) {}
}

#[async_trait]
impl<F: TransactionFeed + ?Sized> TransactionFeed for Box<F> {
    async fn next_transaction(&mut self) -> ScanResult<Option<RawTransaction>> {
        (**self).next_transaction().await
    }

    fn close(&mut self) {
        (**self).close()
    }
}

// =============================================================================
// PAGED (PULL)
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PageState {
    Start,
    At(PageCursor),
    Done,
}

pub struct PagedFeed {
    provider: Arc<dyn ChainDataProvider>,
    request: ScanRequest,
    buffer: VecDeque<RawTransaction>,
    state: PageState,
    pages_fetched: usize,
}

impl PagedFeed {
    pub fn new(provider: Arc<dyn ChainDataProvider>, request: ScanRequest) -> Self {
        Self {
            provider,
            request,
            buffer: VecDeque::new(),
            state: PageState::Start,
            pages_fetched: 0,
        }
    }

    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }
}

#[async_trait]
impl TransactionFeed for PagedFeed {
    async fn next_transaction(&mut self) -> ScanResult<Option<RawTransaction>> {
        loop {
            if let Some(item) = self.buffer.pop_front() {
                return Ok(Some(item));
            }

            let cursor = match self.state {
                PageState::Start => None,
                PageState::At(cursor) => Some(cursor),
                PageState::Done => return Ok(None),
            };

            let page = match self.provider.fetch_page(&self.request, cursor).await {
                Ok(page) => page,
                Err(e) => {
                    self.state = PageState::Done;
                    return Err(e);
                }
            };
            self.pages_fetched += 1;

            logger::debug(
                LogTag::Feed,
                &format!(
                    "Fetched page {} from {}: {} items, more={}",
                    cursor.map(|c| c.0).unwrap_or(0),
                    self.provider.name(),
                    page.items.len(),
                    page.next.is_some()
                ),
            );

            self.buffer.extend(page.items);
            self.state = match page.next {
                Some(next) => PageState::At(next),
                None => PageState::Done,
            };
        }
    }

    fn close(&mut self) {
        self.buffer.clear();
        self.state = PageState::Done;
    }
}

// =============================================================================
// STREAMED (PUSH)
// =============================================================================

pub struct StreamedFeed {
    receiver: Option<mpsc::Receiver<ScanResult<RawTransaction>>>,
    producer: Option<JoinHandle<()>>,
}

impl StreamedFeed {
    /// Start the background producer
    ///
    /// Must be called inside a tokio runtime. `capacity` bounds how far the
    /// producer can run ahead of the consumer.
    pub fn spawn(
        provider: Arc<dyn ChainDataProvider>,
        request: ScanRequest,
        capacity: usize,
    ) -> Self {
        Self::start(provider, request, None, capacity)
    }

    /// Like `spawn`, but the producer stops walking pages after it has pushed
    /// the first record older than `window.start`
    pub fn spawn_within(
        provider: Arc<dyn ChainDataProvider>,
        request: ScanRequest,
        window: TimeWindow,
        capacity: usize,
    ) -> Self {
        Self::start(provider, request, Some(window), capacity)
    }

    fn start(
        provider: Arc<dyn ChainDataProvider>,
        request: ScanRequest,
        window: Option<TimeWindow>,
        capacity: usize,
    ) -> Self {
        let (sender, receiver) = mpsc::channel(capacity.max(1));

        let producer = tokio::spawn(async move {
            let mut pages = PagedFeed::new(provider, request);
            loop {
                match pages.next_transaction().await {
                    Ok(Some(item)) => {
                        let last = match (window.as_ref(), item.timestamp.as_ref()) {
                            (Some(window), Some(ts)) => window.is_before_start(ts),
                            _ => false,
                        };
                        if sender.send(Ok(item)).await.is_err() {
                            // Consumer went away
                            break;
                        }
                        if last {
                            logger::debug(
                                LogTag::Feed,
                                "Producer reached the window start, no more pages",
                            );
                            break;
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        let _ = sender.send(Err(e)).await;
                        break;
                    }
                }
            }
        });

        Self {
            receiver: Some(receiver),
            producer: Some(producer),
        }
    }

    fn shutdown(&mut self) {
        self.receiver = None;
        if let Some(producer) = self.producer.take() {
            producer.abort();
        }
    }
}

#[async_trait]
impl TransactionFeed for StreamedFeed {
    async fn next_transaction(&mut self) -> ScanResult<Option<RawTransaction>> {
        let receiver = match self.receiver.as_mut() {
            Some(receiver) => receiver,
            None => return Ok(None),
        };

        match receiver.recv().await {
            Some(Ok(item)) => Ok(Some(item)),
            Some(Err(e)) => {
                self.shutdown();
                Err(e)
            }
            None => {
                // Channel closed: either a clean end or a producer crash
                self.receiver = None;
                match self.producer.take() {
                    Some(producer) => match producer.await {
                        Ok(()) => Ok(None),
                        Err(e) => Err(ScanError::network(
                            Stage::Retrieval,
                            format!("streaming producer failed: {}", e),
                        )),
                    },
                    None => Ok(None),
                }
            }
        }
    }

    fn close(&mut self) {
        self.shutdown();
    }
}

impl Drop for StreamedFeed {
    fn drop(&mut self) {
        if let Some(producer) = self.producer.take() {
            producer.abort();
        }
    }
}

// =============================================================================
// WINDOW
// =============================================================================

pub struct WindowedFeed<F> {
    inner: F,
    window: TimeWindow,
    halted: bool,
}

impl<F: TransactionFeed> WindowedFeed<F> {
    pub fn new(inner: F, window: TimeWindow) -> Self {
        Self {
            inner,
            window,
            halted: false,
        }
    }

}

#[async_trait]
impl<F: TransactionFeed> TransactionFeed for WindowedFeed<F> {
    async fn next_transaction(&mut self) -> ScanResult<Option<RawTransaction>> {
        if self.halted {
            return Ok(None);
        }

        loop {
            let item = match self.inner.next_transaction().await? {
                Some(item) => item,
                None => return Ok(None),
            };

            match item.timestamp {
                Some(ts) if self.window.is_before_start(&ts) => {
                    logger::debug(
                        LogTag::Feed,
                        &format!(
                            "Reached {} (before window start {}), stopping retrieval",
                            ts, self.window.start
                        ),
                    );
                    self.close();
                    return Ok(None);
                }
                Some(ts) if self.window.is_after_end(&ts) => {
                    logger::debug(
                        LogTag::Feed,
                        &format!("Skipping record at {} (after window end)", ts),
                    );
                }
                _ => return Ok(Some(item)),
            }
        }
    }

    fn close(&mut self) {
        self.halted = true;
        self.inner.close();
    }
}

// =============================================================================
// FACTORY
// =============================================================================

/// Build the configured feed, already bounded by `window`
pub fn build_feed(
    mode: RetrievalMode,
    provider: Arc<dyn ChainDataProvider>,
    request: ScanRequest,
    window: TimeWindow,
    channel_capacity: usize,
) -> Box<dyn TransactionFeed> {
    logger::debug(
        LogTag::Feed,
        &format!(
            "Using {:?} retrieval from {} for {} on {}",
            mode,
            provider.name(),
            request.address,
            request.chain_id
        ),
    );

    match mode {
        RetrievalMode::Paged => Box::new(WindowedFeed::new(
            PagedFeed::new(provider, request),
            window,
        )),
        RetrievalMode::Streamed => Box::new(WindowedFeed::new(
            StreamedFeed::spawn_within(provider, request, window, channel_capacity),
            window,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transactions::provider::StaticProvider;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 10, 0, 0, 0).unwrap()
    }

    fn window() -> TimeWindow {
        TimeWindow::trailing(now(), 7).unwrap()
    }

    fn at(hours_ago: i64, tag: &str) -> RawTransaction {
        RawTransaction {
            tx_hash: Some(tag.to_string()),
            timestamp: Some(now() - Duration::hours(hours_ago)),
            ..RawTransaction::default()
        }
    }

    fn request() -> ScanRequest {
        ScanRequest::new("eth-mainnet", "0xpair")
    }

    async fn drain(feed: &mut dyn TransactionFeed) -> ScanResult<Vec<String>> {
        let mut tags = Vec::new();
        while let Some(item) = feed.next_transaction().await? {
            tags.push(item.tx_hash.unwrap_or_default());
        }
        Ok(tags)
    }

    /// Three batches; batch 2 has an out-of-window record in the middle
    fn three_batches() -> Vec<Vec<RawTransaction>> {
        vec![
            vec![at(1, "a1"), at(2, "a2")],
            vec![at(10, "b1"), at(24 * 8, "b2-old"), at(11, "b3")],
            vec![at(12, "c1")],
        ]
    }

    #[tokio::test]
    async fn test_paged_feed_walks_all_pages_in_order() {
        let provider = Arc::new(StaticProvider::new(vec![
            vec![at(1, "a1"), at(2, "a2")],
            vec![],
            vec![at(3, "c1")],
        ]));
        let mut feed = PagedFeed::new(provider.clone(), request());

        assert_eq!(drain(&mut feed).await.unwrap(), vec!["a1", "a2", "c1"]);
        assert_eq!(feed.pages_fetched(), 3);
        assert_eq!(provider.request_count(), 3);
        // Exhausted feeds stay exhausted without new requests
        assert!(feed.next_transaction().await.unwrap().is_none());
        assert_eq!(provider.request_count(), 3);
    }

    #[tokio::test]
    async fn test_window_truncates_on_first_miss() {
        let provider = Arc::new(StaticProvider::new(three_batches()));
        let mut feed = WindowedFeed::new(PagedFeed::new(provider.clone(), request()), window());

        assert_eq!(drain(&mut feed).await.unwrap(), vec!["a1", "a2", "b1"]);
        // Batch 3 is never requested
        assert_eq!(provider.request_count(), 2);
        assert!(feed.next_transaction().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_streamed_feed_matches_paged_feed() {
        for capacity in [1, 2, 64] {
            let provider = Arc::new(StaticProvider::new(three_batches()));
            let mut feed = WindowedFeed::new(
                StreamedFeed::spawn(provider, request(), capacity),
                window(),
            );
            assert_eq!(drain(&mut feed).await.unwrap(), vec!["a1", "a2", "b1"]);
        }
    }

    #[tokio::test]
    async fn test_streamed_producer_stops_at_window_start() {
        let pages = vec![
            vec![at(1, "a1"), at(2, "a2")],
            vec![at(10, "b1"), at(24 * 8, "b2-old")],
            vec![at(12, "c1")],
            vec![at(13, "d1")],
        ];
        for capacity in [1, 256] {
            let provider = Arc::new(StaticProvider::new(pages.clone()));
            let mut feed = build_feed(
                RetrievalMode::Streamed,
                provider.clone(),
                request(),
                window(),
                capacity,
            );

            assert_eq!(drain(feed.as_mut()).await.unwrap(), vec!["a1", "a2", "b1"]);
            assert_eq!(provider.request_count(), 2, "capacity {}", capacity);
        }
    }

    #[tokio::test]
    async fn test_records_after_window_end_are_skipped_not_terminal() {
        let provider = Arc::new(StaticProvider::new(vec![vec![
            at(-5, "future"),
            at(1, "a1"),
            at(-1, "future2"),
            at(2, "a2"),
        ]]));
        let mut feed = WindowedFeed::new(PagedFeed::new(provider, request()), window());

        assert_eq!(drain(&mut feed).await.unwrap(), vec!["a1", "a2"]);
    }

    #[tokio::test]
    async fn test_missing_timestamp_passes_through_window() {
        let mut undated = at(0, "undated");
        undated.timestamp = None;
        let provider = Arc::new(StaticProvider::new(vec![vec![at(1, "a1"), undated, at(2, "a2")]]));
        let mut feed = WindowedFeed::new(PagedFeed::new(provider, request()), window());

        assert_eq!(drain(&mut feed).await.unwrap(), vec!["a1", "undated", "a2"]);
    }

    #[tokio::test]
    async fn test_paged_failure_aborts() {
        let provider = Arc::new(StaticProvider::new(three_batches()).with_failure(1, "rate limited"));
        let mut feed = WindowedFeed::new(PagedFeed::new(provider.clone(), request()), window());

        let err = drain(&mut feed).await.unwrap_err();
        assert!(err.to_string().contains("rate limited"));
        assert_eq!(err.stage(), Stage::Retrieval);
        assert_eq!(provider.request_count(), 2);
    }

    #[tokio::test]
    async fn test_streamed_failure_is_delivered_in_band() {
        let provider = Arc::new(StaticProvider::new(three_batches()).with_failure(1, "gateway"));
        let mut feed = StreamedFeed::spawn(provider, request(), 8);

        assert!(feed.next_transaction().await.unwrap().is_some());
        assert!(feed.next_transaction().await.unwrap().is_some());
        let err = feed.next_transaction().await.unwrap_err();
        assert!(err.to_string().contains("gateway"));
        assert!(feed.next_transaction().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_build_feed_modes_agree() {
        for mode in [RetrievalMode::Paged, RetrievalMode::Streamed] {
            let provider: Arc<dyn ChainDataProvider> =
                Arc::new(StaticProvider::new(three_batches()));
            let mut feed = build_feed(mode, provider, request(), window(), 4);
            assert_eq!(drain(feed.as_mut()).await.unwrap(), vec!["a1", "a2", "b1"]);
        }
    }
}
