//! Structured logging for tradescan
//!
//! Small, tag-based logging API:
//! - Standard log levels (Error/Warning/Info/Debug/Verbose)
//! - Per-tag debug control via `--debug-<tag>` flags
//! - Colored console output plus an optional plain-text log file
//!
//! ## Usage
//!
//! ```rust
//! use tradescan::logger::{self, LogTag};
//!
//! logger::info(LogTag::Feed, "Fetching page 0");
//! logger::debug(LogTag::Decoder, "Swap event matched buyer"); // Only if --debug-decoder
//! logger::verbose(LogTag::Api, "Raw response: ..."); // Only if --verbose
//! ```
//!
//! Call [`init`] once at startup with the process arguments.

mod config;
mod core;
mod file;
mod format;
mod levels;
mod tags;

pub use config::{get_logger_config, init_from_args, set_logger_config, LoggerConfig};
pub use levels::LogLevel;
pub use tags::LogTag;

/// Initialize the logger system
///
/// Parses `--debug-<tag>`, `--verbose`, `--quiet` and `--log-file <path>`
/// from `args`, then opens the log file if one was requested.
pub fn init(args: &[String]) {
    config::init_from_args(args);

    if let Some(path) = get_logger_config().log_file {
        file::init_file_logging(&path);
    }
}

/// Log at ERROR level (always shown)
pub fn error(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Error, message);
}

/// Log at WARNING level
pub fn warning(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Warning, message);
}

/// Log at INFO level (standard operations)
pub fn info(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Info, message);
}

/// Log at DEBUG level
///
/// Only shown when `--debug-<tag>` was passed for this tag.
///
/// # Example
/// ```rust
/// # use tradescan::logger::{self, LogTag};
/// // Only shown with --debug-feed
/// logger::debug(LogTag::Feed, "Page cursor: 3");
/// ```
pub fn debug(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Debug, message);
}

/// Log at VERBOSE level (only with --verbose)
pub fn verbose(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Verbose, message);
}

/// Force flush pending log file writes
pub fn flush() {
    file::flush_file_logging();
}
