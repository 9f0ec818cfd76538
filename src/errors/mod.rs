/// Error types for tradescan
///
/// Two classes of failure exist:
/// - `ScanError`: abort-class. Stops the whole report and carries the failing
///   stage plus the underlying message.
/// - `SkipReason`: row-level. One transaction is excluded, the scan goes on.
use thiserror::Error;

/// Pipeline stage an abort happened in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Config,
    PairLookup,
    Retrieval,
    Decode,
    Report,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Config => "config",
            Stage::PairLookup => "pair lookup",
            Stage::Retrieval => "transaction retrieval",
            Stage::Decode => "decode",
            Stage::Report => "report",
        };
        write!(f, "{}", name)
    }
}

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("[{stage}] network error: {message}")]
    Network { stage: Stage, message: String },

    #[error("[{stage}] {provider} returned {}: {message}", status_text(.status))]
    Provider {
        stage: Stage,
        provider: String,
        status: Option<u16>,
        message: String,
    },

    #[error("[{stage}] not found: {message}")]
    NotFound { stage: Stage, message: String },

    #[error("[{stage}] malformed payload: {message}")]
    Decode { stage: Stage, message: String },

    #[error("[{stage}] operation timed out after {after_ms}ms")]
    Timeout { stage: Stage, after_ms: u64 },

    #[error("[{stage}] operation cancelled")]
    Cancelled { stage: Stage },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ScanError {
    pub fn stage(&self) -> Stage {
        match self {
            ScanError::Network { stage, .. }
            | ScanError::Provider { stage, .. }
            | ScanError::NotFound { stage, .. }
            | ScanError::Decode { stage, .. }
            | ScanError::Timeout { stage, .. }
            | ScanError::Cancelled { stage } => *stage,
            ScanError::Config(_) => Stage::Config,
            ScanError::Io(_) => Stage::Report,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ScanError::NotFound { .. })
    }

    pub fn network(stage: Stage, message: impl Into<String>) -> Self {
        ScanError::Network {
            stage,
            message: message.into(),
        }
    }

    pub fn provider(
        stage: Stage,
        provider: impl Into<String>,
        status: Option<u16>,
        message: impl Into<String>,
    ) -> Self {
        ScanError::Provider {
            stage,
            provider: provider.into(),
            status,
            message: message.into(),
        }
    }

    pub fn not_found(stage: Stage, message: impl Into<String>) -> Self {
        ScanError::NotFound {
            stage,
            message: message.into(),
        }
    }

    pub fn decode(stage: Stage, message: impl Into<String>) -> Self {
        ScanError::Decode {
            stage,
            message: message.into(),
        }
    }

    /// Map a reqwest transport/body error, keeping timeouts distinct
    pub fn from_reqwest(stage: Stage, err: reqwest::Error) -> Self {
        if err.is_decode() {
            ScanError::decode(stage, err.to_string())
        } else {
            ScanError::network(stage, format!("HTTP request failed: {}", err))
        }
    }
}

fn status_text(status: &Option<u16>) -> String {
    match status {
        Some(code) => code.to_string(),
        None => "an error".to_string(),
    }
}

pub type ScanResult<T> = Result<T, ScanError>;

/// Why a single transaction was left out of the output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    MissingTimestamp,
    MissingValue,
    ZeroValue,
    MissingSender,
    MissingUsdValue,
    ZeroQuote,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            SkipReason::MissingTimestamp => "missing block timestamp",
            SkipReason::MissingValue => "missing or non-numeric value",
            SkipReason::ZeroValue => "zero value",
            SkipReason::MissingSender => "missing sender address",
            SkipReason::MissingUsdValue => "missing USD value",
            SkipReason::ZeroQuote => "quote token count is zero",
        };
        write!(f, "{}", text)
    }
}
