/// Logger configuration built from command-line flags
///
/// Recognised flags:
/// - `--debug-<tag>`: debug output for one tag (e.g. `--debug-feed`)
/// - `--verbose`: verbose output for every tag
/// - `--quiet`: only warnings and errors
/// - `--log-file <path>`: mirror output into a plain-text file
use super::levels::LogLevel;
use super::tags::LogTag;
use once_cell::sync::Lazy;
use std::collections::HashSet;
use std::sync::RwLock;

#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub min_level: LogLevel,
    pub debug_tags: HashSet<LogTag>,
    pub log_file: Option<String>,
    pub colors: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            min_level: LogLevel::Info,
            debug_tags: HashSet::new(),
            log_file: None,
            colors: true,
        }
    }
}

static LOGGER_CONFIG: Lazy<RwLock<LoggerConfig>> =
    Lazy::new(|| RwLock::new(LoggerConfig::default()));

/// Snapshot of the current configuration
pub fn get_logger_config() -> LoggerConfig {
    match LOGGER_CONFIG.read() {
        Ok(config) => config.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    }
}

pub fn set_logger_config(config: LoggerConfig) {
    match LOGGER_CONFIG.write() {
        Ok(mut guard) => *guard = config,
        Err(poisoned) => *poisoned.into_inner() = config,
    }
}

/// Build the logger configuration from raw process arguments
pub fn init_from_args(args: &[String]) {
    set_logger_config(parse_args(args));
}

fn parse_args(args: &[String]) -> LoggerConfig {
    let mut config = LoggerConfig::default();

    let mut iter = args.iter().peekable();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--verbose" => config.min_level = LogLevel::Verbose,
            "--quiet" => config.min_level = LogLevel::Warning,
            "--no-color" => config.colors = false,
            "--log-file" => {
                if let Some(path) = iter.peek() {
                    config.log_file = Some((*path).clone());
                    iter.next();
                }
            }
            other => {
                if let Some(key) = other.strip_prefix("--debug-") {
                    if let Some(tag) = LogTag::from_debug_key(key) {
                        config.debug_tags.insert(tag);
                        if config.min_level < LogLevel::Debug {
                            config.min_level = LogLevel::Debug;
                        }
                    }
                }
            }
        }
    }

    config
}

pub fn is_debug_enabled_for_tag(tag: &LogTag) -> bool {
    get_logger_config().debug_tags.contains(tag)
}
