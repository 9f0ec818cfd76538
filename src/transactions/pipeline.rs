// Pipeline driver: feed -> decoder -> classifier -> ordered output
//
// Strictly sequential: one record is pulled, decoded and classified before
// the next pull. Feed errors abort the run; classifier skips only reduce the
// output count.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::classifier::{Classification, TransactionClassifier};
use super::decoder::LogEventDecoder;
use super::feed::{build_feed, TransactionFeed};
use super::provider::ChainDataProvider;
use super::types::{ClassifiedTransaction, RawTransaction, ScanRequest, TimeWindow};
use crate::config::{Config, RetrievalConfig};
use crate::errors::{ScanError, ScanResult, Stage};
use crate::logger::{self, LogTag};

/// Optional bounds on a scan
///
/// The default has no deadline and a token nobody cancels, so a hanging
/// provider call hangs the scan.
#[derive(Debug, Clone, Default)]
pub struct ScanLimits {
    pub deadline: Option<Instant>,
    pub cancel: CancellationToken,
}

impl ScanLimits {
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            deadline: Some(Instant::now() + timeout),
            cancel: CancellationToken::new(),
        }
    }

    /// `deadline_secs = 0` means no deadline
    pub fn from_config(retrieval: &RetrievalConfig) -> Self {
        if retrieval.deadline_secs > 0 {
            Self::with_timeout(Duration::from_secs(retrieval.deadline_secs))
        } else {
            Self::unbounded()
        }
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

/// Ordered scan output plus counters
#[derive(Debug, Clone, Default)]
pub struct ScanOutcome {
    pub transactions: Vec<ClassifiedTransaction>,
    pub examined: usize,
    pub skipped: usize,
}

enum Step {
    Item(ScanResult<Option<RawTransaction>>),
    Cancelled,
    TimedOut,
}

async fn wait_for_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending::<()>().await,
    }
}

/// Drain `feed` through the decoder and classifier
pub async fn run_pipeline(
    feed: &mut dyn TransactionFeed,
    decoder: &LogEventDecoder,
    classifier: &TransactionClassifier,
    limits: &ScanLimits,
) -> ScanResult<ScanOutcome> {
    let started = Instant::now();
    let mut outcome = ScanOutcome::default();

    loop {
        let step = tokio::select! {
            biased;
            _ = limits.cancel.cancelled() => Step::Cancelled,
            _ = wait_for_deadline(limits.deadline) => Step::TimedOut,
            item = feed.next_transaction() => Step::Item(item),
        };

        let raw = match step {
            Step::Item(Ok(Some(raw))) => raw,
            Step::Item(Ok(None)) => break,
            Step::Item(Err(e)) => {
                logger::error(LogTag::Pipeline, &format!("Scan aborted: {}", e));
                return Err(e);
            }
            Step::Cancelled => {
                feed.close();
                logger::warning(LogTag::Pipeline, "Scan cancelled");
                return Err(ScanError::Cancelled {
                    stage: Stage::Retrieval,
                });
            }
            Step::TimedOut => {
                feed.close();
                let after_ms = started.elapsed().as_millis() as u64;
                logger::warning(
                    LogTag::Pipeline,
                    &format!("Scan deadline reached after {}ms", after_ms),
                );
                return Err(ScanError::Timeout {
                    stage: Stage::Retrieval,
                    after_ms,
                });
            }
        };

        outcome.examined += 1;
        let hint = decoder.decode(&raw.log_events, raw.sender.as_deref());

        match classifier.classify(&raw, hint) {
            Classification::Accepted(tx) => {
                logger::verbose(
                    LogTag::Classifier,
                    &format!(
                        "{} {} quote={} usd={:.2} price={}",
                        tx.date, tx.side, tx.token_count_quote, tx.amount_usd, tx.price
                    ),
                );
                outcome.transactions.push(tx);
            }
            Classification::Skipped(reason) => {
                outcome.skipped += 1;
                logger::debug(
                    LogTag::Classifier,
                    &format!(
                        "Skipping transaction {}: {}",
                        raw.tx_hash.as_deref().unwrap_or("<no hash>"),
                        reason
                    ),
                );
            }
        }
    }

    logger::info(
        LogTag::Pipeline,
        &format!(
            "Scan finished: {} examined, {} classified, {} skipped in {}ms",
            outcome.examined,
            outcome.transactions.len(),
            outcome.skipped,
            started.elapsed().as_millis()
        ),
    );

    Ok(outcome)
}

/// Scan `request` over `window` with an explicit provider
pub async fn scan_with_provider(
    provider: Arc<dyn ChainDataProvider>,
    retrieval: &RetrievalConfig,
    request: ScanRequest,
    window: TimeWindow,
    limits: &ScanLimits,
) -> ScanResult<ScanOutcome> {
    let mut feed = build_feed(
        retrieval.mode,
        provider,
        request,
        window,
        retrieval.channel_capacity,
    );

    run_pipeline(
        feed.as_mut(),
        &LogEventDecoder::standard(),
        &TransactionClassifier::new(),
        limits,
    )
    .await
}

/// Scan the configured trailing window, ending now
pub async fn scan_recent_trades(
    provider: Arc<dyn ChainDataProvider>,
    config: &Config,
    request: ScanRequest,
    limits: &ScanLimits,
) -> ScanResult<ScanOutcome> {
    let window = TimeWindow::trailing(Utc::now(), config.retrieval.window_days)?;

    logger::info(
        LogTag::Pipeline,
        &format!(
            "Scanning {} on {} from {} to {}",
            request.address, request.chain_id, window.start, window.end
        ),
    );

    scan_with_provider(provider, &config.retrieval, request, window, limits).await
}
