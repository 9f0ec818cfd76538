//! Log formatting and output
//!
//! Colorized console lines aligned on tag and level, wrapped at word
//! boundaries, mirrored uncolored into the log file.

use super::config::get_logger_config;
use super::file::write_to_file;
use super::levels::LogLevel;
use super::tags::LogTag;
use chrono::Local;
use colored::*;
use std::io::{stderr, ErrorKind, Write};

const TAG_WIDTH: usize = 9;
const LEVEL_WIDTH: usize = 7;
const BRACKET_SPACE_WIDTH: usize = 3;
const TIME_WIDTH: usize = 9;
const TOTAL_PREFIX_WIDTH: usize = TIME_WIDTH + TAG_WIDTH + LEVEL_WIDTH + BRACKET_SPACE_WIDTH * 2;

/// Maximum line length before wrapping
const MAX_LINE_LENGTH: usize = 145;

/// Format and output a log message
pub fn format_and_log(tag: LogTag, level: LogLevel, message: &str) {
    let now = Local::now();
    let colors = get_logger_config().colors;

    let time = now.format("%H:%M:%S").to_string();
    let tag_label = format!("{:<width$}", tag.to_plain_string(), width = TAG_WIDTH);
    let level_label = format!("{:<width$}", level.as_str(), width = LEVEL_WIDTH);

    let base_line = if colors {
        format!(
            "{} [{}] [{}] ",
            time.dimmed(),
            color_tag(&tag, &tag_label),
            color_level(level, &level_label)
        )
    } else {
        format!("{} [{}] [{}] ", time, tag_label, level_label)
    };

    let available = MAX_LINE_LENGTH.saturating_sub(TOTAL_PREFIX_WIDTH).max(50);
    let chunks = wrap_text(message, available);

    let timestamp = now.format("%Y-%m-%d %H:%M:%S").to_string();
    let continuation = " ".repeat(TOTAL_PREFIX_WIDTH);

    for (i, chunk) in chunks.iter().enumerate() {
        if i == 0 {
            print_stderr_safe(&format!("{}{}", base_line, chunk));
        } else {
            print_stderr_safe(&format!("{}{}", continuation, chunk));
        }
        write_to_file(&format!(
            "{} [{}] [{}] {}",
            timestamp,
            tag.to_plain_string(),
            level.as_str(),
            chunk
        ));
    }
}

fn color_tag(tag: &LogTag, label: &str) -> ColoredString {
    match tag {
        LogTag::System => label.bright_yellow().bold(),
        LogTag::Config => label.bright_white().bold(),
        LogTag::Api => label.bright_purple().bold(),
        LogTag::Feed => label.bright_blue().bold(),
        LogTag::Decoder => label.bright_magenta().bold(),
        LogTag::Classifier => label.bright_green().bold(),
        LogTag::Pipeline => label.bright_cyan().bold(),
        LogTag::Report => label.bright_white().bold(),
    }
}

fn color_level(level: LogLevel, label: &str) -> ColoredString {
    match level {
        LogLevel::Error => label.bright_red().bold(),
        LogLevel::Warning => label.bright_yellow().bold(),
        LogLevel::Info => label.white(),
        LogLevel::Debug => label.bright_black(),
        LogLevel::Verbose => label.dimmed(),
    }
}

/// Report output goes to stdout; logs stay on stderr.
fn print_stderr_safe(message: &str) {
    if let Err(e) = writeln!(stderr(), "{}", message) {
        if e.kind() == ErrorKind::BrokenPipe {
            std::process::exit(0);
        }
    }
}

/// Wrap text at word boundaries, respecting existing newlines
fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    let mut result = Vec::new();

    for line in text.split('\n') {
        if line.chars().count() <= max_width {
            result.push(line.to_string());
            continue;
        }

        let mut current = String::new();
        for word in line.split_whitespace() {
            let word_len = word.chars().count();
            let current_len = current.chars().count();

            if word_len > max_width {
                if !current.is_empty() {
                    result.push(std::mem::take(&mut current));
                }
                result.extend(break_long_word(word, max_width));
            } else if current.is_empty() {
                current = word.to_string();
            } else if current_len + word_len + 1 <= max_width {
                current.push(' ');
                current.push_str(word);
            } else {
                result.push(std::mem::replace(&mut current, word.to_string()));
            }
        }

        if !current.is_empty() {
            result.push(current);
        }
    }

    if result.is_empty() {
        result.push(String::new());
    }

    result
}

/// Break a very long word (addresses, URLs) into fixed-width chunks
fn break_long_word(word: &str, max_width: usize) -> Vec<String> {
    let chars: Vec<char> = word.chars().collect();
    chars
        .chunks(max_width.max(1))
        .map(|chunk| chunk.iter().collect())
        .collect()
}
