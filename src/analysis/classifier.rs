//! Per-line validation.
//!
//! A line is `<date> <level> [key=value ...]`. Classification is pure:
//! it never touches the tally or emits diagnostics.

use crate::models::{Level, LineOutcome, ParsedRecord, SkipReason};
use std::collections::HashMap;

/// Classify one raw line. Trailing line terminators are ignored.
pub fn classify(line: &str) -> LineOutcome {
    if line.trim().is_empty() {
        return LineOutcome::Blank;
    }

    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() < 2 {
        return LineOutcome::Skipped(SkipReason::TooFewTokens);
    }

    let date = tokens[0];
    if !is_date_shaped(date) {
        return LineOutcome::Skipped(SkipReason::BadDate);
    }

    let Some(level) = Level::parse(tokens[1]) else {
        return LineOutcome::Skipped(SkipReason::BadLevel);
    };

    let fields = extract_fields(&tokens[2..]);

    match fields.get("action") {
        Some(action) if !action.is_empty() => {}
        _ => return LineOutcome::Skipped(SkipReason::MissingAction),
    }

    LineOutcome::Valid(ParsedRecord {
        date: date.to_string(),
        level,
        fields,
    })
}

/// Shape check only: ten characters with exactly two dashes.
/// Calendar values and dash positions are not checked.
pub fn is_date_shaped(token: &str) -> bool {
    token.chars().count() == 10 && token.matches('-').count() == 2
}

/// Collect `key=value` tokens, splitting on the first `=`.
/// Tokens without `=` are ignored; a repeated key keeps its last value.
pub fn extract_fields(tokens: &[&str]) -> HashMap<String, String> {
    let mut fields = HashMap::new();

    for token in tokens {
        if let Some((key, value)) = token.split_once('=') {
            fields.insert(key.trim().to_lowercase(), value.trim().to_string());
        }
    }

    fields
}
