//! Report generation.
//!
//! Renders a finished tally as a CSV report, a JSON report, or a
//! human-readable console summary, and writes report files in one
//! scoped operation.

use crate::models::{Level, LevelCounts, Tally};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;

/// One entry in the top actions ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionCount {
    pub action: String,
    pub count: usize,
}

/// Immutable snapshot of a tally, ready for output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub skipped_lines: usize,
    pub valid_lines: usize,
    pub blank_lines: usize,
    /// Valid plus skipped; blank lines are not counted.
    pub total_lines: usize,
    pub levels: LevelCounts,
    pub top_actions: Vec<ActionCount>,
}

impl ReportSummary {
    /// Snapshot `tally`, keeping the `top_n` most frequent actions.
    pub fn from_tally(tally: &Tally, top_n: usize) -> Self {
        Self {
            skipped_lines: tally.skipped(),
            valid_lines: tally.valid(),
            blank_lines: tally.blank(),
            total_lines: tally.total_lines(),
            levels: tally.levels(),
            top_actions: tally
                .top_actions(top_n)
                .into_iter()
                .map(|(action, count)| ActionCount { action, count })
                .collect(),
        }
    }
}

/// Metadata about the report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Path of the analyzed log file.
    pub input_file: String,
    /// When the report was generated.
    pub generated_at: DateTime<Utc>,
    /// Whether the run used strict mode.
    pub strict: bool,
}

/// The complete report written in JSON format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    pub summary: ReportSummary,
}

/// Generate the CSV report.
pub fn generate_csv_report(summary: &ReportSummary) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(["category", "total"])?;
    writer.serialize(("skipped_lines", summary.skipped_lines))?;
    writer.serialize(("valid_lines", summary.valid_lines))?;
    writer.serialize(("total_lines", summary.total_lines))?;

    writer.serialize(("--levels--", ""))?;
    for level in Level::ALL {
        writer.serialize((level.as_str(), summary.levels.get(level)))?;
    }

    writer.serialize(("--top_actions--", ""))?;
    for entry in &summary.top_actions {
        writer.serialize((entry.action.as_str(), entry.count))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV writer: {}", e.error()))?;
    String::from_utf8(bytes).context("CSV output was not valid UTF-8")
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// Generate the console summary printed by `--dry-run`.
pub fn generate_console_summary(summary: &ReportSummary) -> String {
    let mut output = String::new();

    output.push_str("📊 Log Summary\n");
    output.push_str(&format!("   Skipped lines: {}\n", summary.skipped_lines));
    output.push_str(&format!("   Valid lines:   {}\n", summary.valid_lines));
    output.push_str(&format!("   Total lines:   {}\n", summary.total_lines));
    if summary.blank_lines > 0 {
        output.push_str(&format!(
            "   Blank lines:   {} (not included in total)\n",
            summary.blank_lines
        ));
    }

    output.push_str("\n   Levels:\n");
    for level in Level::ALL {
        output.push_str(&format!(
            "   - {:<5} {}\n",
            level.as_str(),
            summary.levels.get(level)
        ));
    }

    output.push_str("\n   Top actions:\n");
    for (i, entry) in summary.top_actions.iter().enumerate() {
        output.push_str(&format!("   {}. {} ({})\n", i + 1, entry.action, entry.count));
    }

    output
}

/// Write report content to `path` as a single unit.
///
/// Content goes to a temporary file next to the destination, which then
/// replaces the destination. A failed write leaves no file behind.
pub fn write_report(content: &str, path: &Path) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;
    file.write_all(content.as_bytes())
        .with_context(|| format!("Failed to write report to {}", path.display()))?;
    file.flush()?;

    file.persist(path)
        .with_context(|| format!("Failed to save report to {}", path.display()))?;

    Ok(())
}
