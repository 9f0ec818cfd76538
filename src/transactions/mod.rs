/// Transaction retrieval, decoding and classification
///
/// - `types`: raw and classified records, windows, pages
/// - `provider`: the chain data provider seam
/// - `feed`: paged / streamed / windowed iteration
/// - `decoder`: typed event log decoding
/// - `classifier`: row filters, normalization, pricing
/// - `pipeline`: the sequential driver
pub mod classifier;
pub mod decoder;
pub mod feed;
pub mod pipeline;
pub mod provider;
pub mod types;

pub use classifier::{normalize_units, Classification, TransactionClassifier};
pub use decoder::{DecodedHint, DecoderRegistry, LogEventDecoder};
pub use feed::{build_feed, PagedFeed, StreamedFeed, TransactionFeed, WindowedFeed};
pub use pipeline::{run_pipeline, scan_recent_trades, scan_with_provider, ScanLimits, ScanOutcome};
pub use provider::{ChainDataProvider, StaticProvider};
pub use types::*;
