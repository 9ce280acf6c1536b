//! Data models for the log tally.
//!
//! This module contains the core data structures used throughout
//! the application: severity levels, parsed records, per-line outcomes
//! and the running tally.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Severity level of a log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Info,
    Warn,
    Error,
}

impl Level {
    /// All levels in declaration order.
    pub const ALL: [Level; 3] = [Level::Info, Level::Warn, Level::Error];

    /// Parse a level token, ignoring case and surrounding whitespace.
    pub fn parse(token: &str) -> Option<Self> {
        match token.trim().to_lowercase().as_str() {
            "info" => Some(Level::Info),
            "warn" => Some(Level::Warn),
            "error" => Some(Level::Error),
            _ => None,
        }
    }

    /// Lower-case name as it appears in reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a non-blank line was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SkipReason {
    #[error("invalid format: expected <date> <level> ...")]
    TooFewTokens,
    #[error("invalid date format: expected YYYY-MM-DD")]
    BadDate,
    #[error("invalid level: expected info, warn, error")]
    BadLevel,
    #[error("missing required field: action")]
    MissingAction,
}

/// A validated log line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRecord {
    /// The date token, checked for shape only.
    pub date: String,
    /// Severity level.
    pub level: Level,
    /// `key=value` fields; keys are lower-cased.
    pub fields: HashMap<String, String>,
}

impl ParsedRecord {
    /// The `action` field. Always present and non-empty on a classified record.
    pub fn action(&self) -> &str {
        self.fields.get("action").map(String::as_str).unwrap_or("")
    }
}

/// Result of classifying one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    Blank,
    Skipped(SkipReason),
    Valid(ParsedRecord),
}

/// Per-level counters. All levels are always present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelCounts {
    pub info: usize,
    pub warn: usize,
    pub error: usize,
}

impl LevelCounts {
    pub fn get(&self, level: Level) -> usize {
        match level {
            Level::Info => self.info,
            Level::Warn => self.warn,
            Level::Error => self.error,
        }
    }

    fn increment(&mut self, level: Level) {
        match level {
            Level::Info => self.info += 1,
            Level::Warn => self.warn += 1,
            Level::Error => self.error += 1,
        }
    }
}

/// Running aggregate of one pass over the input.
///
/// `valid + skipped + blank` always equals the number of lines consumed,
/// and no action is ever stored with a zero count.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tally {
    valid: usize,
    skipped: usize,
    blank: usize,
    levels: LevelCounts,
    actions: HashMap<String, usize>,
}

impl Tally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_blank(&mut self) {
        self.blank += 1;
    }

    pub fn record_skipped(&mut self) {
        self.skipped += 1;
    }

    pub fn record_valid(&mut self, record: &ParsedRecord) {
        self.valid += 1;
        self.levels.increment(record.level);
        *self
            .actions
            .entry(record.action().to_string())
            .or_insert(0) += 1;
    }

    pub fn valid(&self) -> usize {
        self.valid
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn blank(&self) -> usize {
        self.blank
    }

    /// Lines counted in reports. Blank lines are not included.
    pub fn total_lines(&self) -> usize {
        self.valid + self.skipped
    }

    /// Every line seen, blank ones included.
    pub fn lines_consumed(&self) -> usize {
        self.valid + self.skipped + self.blank
    }

    pub fn levels(&self) -> LevelCounts {
        self.levels
    }

    pub fn actions(&self) -> &HashMap<String, usize> {
        &self.actions
    }

    /// The `n` most frequent actions, count descending then name ascending.
    pub fn top_actions(&self, n: usize) -> Vec<(String, usize)> {
        let mut ranked: Vec<(String, usize)> = self
            .actions
            .iter()
            .map(|(action, count)| (action.clone(), *count))
            .collect();

        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(n);
        ranked
    }
}

/// A malformed line that stopped a strict run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line_number}: {reason} -> {line:?}")]
pub struct StrictAbort {
    /// 1-based position in the input.
    pub line_number: usize,
    pub reason: SkipReason,
    /// The offending line, verbatim.
    pub line: String,
}

/// Conditions that end a run without a usable tally.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("could not read input file {}: {source}", .path.display())]
    UnreadableInput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("no valid action data found")]
    EmptyResult,
}

/// How a run over the input ended.
#[derive(Debug)]
pub enum RunOutcome {
    Completed(Tally),
    Aborted(StrictAbort),
    Fatal(RunError),
}
