//! Single-pass line aggregation.
//!
//! The aggregator owns the tally for the duration of one run, classifies
//! each line in order and folds the outcome into the tally.

use super::classifier::classify;
use super::diagnostics::DiagnosticsSink;
use crate::models::{LineOutcome, RunError, RunOutcome, StrictAbort, Tally};
use std::io::BufRead;
use std::path::Path;

/// Stateful consumer of one input stream.
pub struct Aggregator<'a> {
    strict: bool,
    sink: &'a dyn DiagnosticsSink,
    tally: Tally,
    line_number: usize,
}

impl<'a> Aggregator<'a> {
    /// Create an aggregator. In strict mode the first malformed line ends the run.
    pub fn new(strict: bool, sink: &'a dyn DiagnosticsSink) -> Self {
        Self {
            strict,
            sink,
            tally: Tally::new(),
            line_number: 0,
        }
    }

    /// Classify and fold one line.
    ///
    /// Returns the abort record when strict mode rejects the line; the line
    /// is counted as skipped either way.
    pub fn consume(&mut self, line: &str) -> Result<(), StrictAbort> {
        self.line_number += 1;
        let outcome = classify(line);
        self.fold(line, outcome)
    }

    /// Apply an already classified outcome for the current line.
    fn fold(&mut self, line: &str, outcome: LineOutcome) -> Result<(), StrictAbort> {
        match outcome {
            LineOutcome::Blank => {
                self.tally.record_blank();
                self.sink
                    .debug(&format!("line {}: blank, ignored", self.line_number));
                Ok(())
            }
            LineOutcome::Skipped(reason) => {
                self.tally.record_skipped();
                let abort = StrictAbort {
                    line_number: self.line_number,
                    reason,
                    line: line.to_string(),
                };
                if self.strict {
                    self.sink.error(&format!("strict mode abort: {}", abort));
                    Err(abort)
                } else {
                    self.sink.warn(&format!("skipping {}", abort));
                    Ok(())
                }
            }
            LineOutcome::Valid(record) => {
                self.sink.debug(&format!(
                    "line {}: {} {} action={}",
                    self.line_number,
                    record.date,
                    record.level,
                    record.action()
                ));
                self.tally.record_valid(&record);
                Ok(())
            }
        }
    }

    /// The tally so far.
    #[allow(dead_code)] // For callers driving `consume` directly
    pub fn tally(&self) -> &Tally {
        &self.tally
    }

    /// End the run, rejecting a tally with no recorded actions.
    pub fn finish(self) -> RunOutcome {
        if self.tally.actions().is_empty() {
            self.sink.debug(&format!(
                "no actions recorded ({} lines read, {} blank, {} skipped)",
                self.line_number,
                self.tally.blank(),
                self.tally.skipped()
            ));
            return RunOutcome::Fatal(RunError::EmptyResult);
        }

        self.sink.info(&format!(
            "processed {} lines: {} valid, {} skipped, {} blank",
            self.tally.lines_consumed(),
            self.tally.valid(),
            self.tally.skipped(),
            self.tally.blank()
        ));
        RunOutcome::Completed(self.tally)
    }

    /// Consume an in-memory sequence of lines and finish the run.
    #[allow(dead_code)] // In-memory counterpart of `run_reader`
    pub fn run_lines<I, S>(mut self, lines: I) -> RunOutcome
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for line in lines {
            if let Err(abort) = self.consume(line.as_ref()) {
                return RunOutcome::Aborted(abort);
            }
        }
        self.finish()
    }

    /// Consume a reader line by line and finish the run.
    ///
    /// A read error at any point is fatal and discards the partial tally.
    pub fn run_reader<R: BufRead>(mut self, path: &Path, reader: R) -> RunOutcome {
        for line in reader.lines() {
            let line = match line {
                Ok(line) => line,
                Err(source) => {
                    return RunOutcome::Fatal(RunError::UnreadableInput {
                        path: path.to_path_buf(),
                        source,
                    })
                }
            };
            if let Err(abort) = self.consume(&line) {
                return RunOutcome::Aborted(abort);
            }
        }
        self.finish()
    }
}

/// Open `path` and run a full pass over it.
pub fn process_file(path: &Path, strict: bool, sink: &dyn DiagnosticsSink) -> RunOutcome {
    let file = match std::fs::File::open(path) {
        Ok(file) => file,
        Err(source) => {
            return RunOutcome::Fatal(RunError::UnreadableInput {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    sink.debug(&format!("reading {}", path.display()));
    Aggregator::new(strict, sink).run_reader(path, std::io::BufReader::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::diagnostics::{MemorySink, Severity};
    use crate::models::SkipReason;
    use std::io::Write;

    const SAMPLE: &str =
        "2024-01-01 info action=login\n2024-01-01 error action=login\nbad line\n";

    fn completed(outcome: RunOutcome) -> Tally {
        match outcome {
            RunOutcome::Completed(tally) => tally,
            other => panic!("expected completed run, got {:?}", other),
        }
    }

    #[test]
    fn test_end_to_end_sample() {
        let sink = MemorySink::default();
        let tally = completed(Aggregator::new(false, &sink).run_lines(SAMPLE.lines()));

        assert_eq!(tally.valid(), 2);
        assert_eq!(tally.skipped(), 1);
        assert_eq!(tally.blank(), 0);
        assert_eq!(tally.levels().info, 1);
        assert_eq!(tally.levels().warn, 0);
        assert_eq!(tally.levels().error, 1);
        assert_eq!(tally.actions().len(), 1);
        assert_eq!(tally.actions().get("login"), Some(&2));
        assert_eq!(tally.top_actions(3), vec![("login".to_string(), 2)]);
    }

    #[test]
    fn test_skip_diagnostic_has_line_number_and_content() {
        let sink = MemorySink::default();
        completed(Aggregator::new(false, &sink).run_lines(SAMPLE.lines()));

        let warnings = sink.at(Severity::Warn);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("line 3"));
        assert!(warnings[0].contains("invalid date format"));
        assert!(warnings[0].contains("bad line"));
        assert!(sink.at(Severity::Error).is_empty());
    }

    #[test]
    fn test_counts_cover_every_line() {
        let input = "\n2024-01-01 info action=a\n   \nnope\n2024-01-01 warn x=1\n2024-01-01 WARN action=b\n";
        let sink = MemorySink::default();
        let mut aggregator = Aggregator::new(false, &sink);
        for line in input.lines() {
            aggregator.consume(line).unwrap();
        }

        let tally = aggregator.tally();
        assert_eq!(tally.lines_consumed(), 6);
        assert_eq!(tally.blank(), 2);
        assert_eq!(tally.skipped(), 2);
        assert_eq!(tally.valid(), 2);
        assert_eq!(tally.total_lines(), 4);
    }

    #[test]
    fn test_strict_mode_stops_at_first_bad_line() {
        let input = [
            "2024-01-01 info action=login",
            "2024-01-01 info",
            "2024-01-01 info action=logout",
        ];
        let sink = MemorySink::default();
        let mut aggregator = Aggregator::new(true, &sink);

        assert!(aggregator.consume(input[0]).is_ok());
        let abort = aggregator.consume(input[1]).unwrap_err();
        assert_eq!(abort.line_number, 2);
        assert_eq!(abort.reason, SkipReason::MissingAction);
        assert_eq!(abort.line, "2024-01-01 info");
        assert_eq!(aggregator.tally().actions().get("logout"), None);

        let errors = sink.at(Severity::Error);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("line 2"));
        assert!(sink.at(Severity::Warn).is_empty());
    }

    #[test]
    fn test_strict_run_returns_aborted() {
        let sink = MemorySink::default();
        let outcome = Aggregator::new(true, &sink).run_lines(SAMPLE.lines());
        match outcome {
            RunOutcome::Aborted(abort) => {
                assert_eq!(abort.line_number, 3);
                assert_eq!(abort.line, "bad line");
            }
            other => panic!("expected abort, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_input_is_fatal() {
        let sink = MemorySink::default();
        let outcome = Aggregator::new(false, &sink).run_lines(Vec::<String>::new());
        assert!(matches!(outcome, RunOutcome::Fatal(RunError::EmptyResult)));
    }

    #[test]
    fn test_blank_only_input_is_fatal() {
        let sink = MemorySink::default();
        let mut aggregator = Aggregator::new(false, &sink);
        for line in ["", "  ", "\t"] {
            aggregator.consume(line).unwrap();
        }
        assert_eq!(aggregator.tally().blank(), 3);
        assert_eq!(aggregator.tally().valid(), 0);
        assert!(matches!(
            aggregator.finish(),
            RunOutcome::Fatal(RunError::EmptyResult)
        ));
        assert!(sink.at(Severity::Error).is_empty());
        assert!(sink
            .at(Severity::Debug)
            .iter()
            .any(|m| m.contains("3 blank")));
    }

    #[test]
    fn test_process_missing_file_is_unreadable() {
        let sink = MemorySink::default();
        let dir = tempfile::tempdir().unwrap();
        let outcome = process_file(&dir.path().join("missing.log"), false, &sink);
        assert!(matches!(
            outcome,
            RunOutcome::Fatal(RunError::UnreadableInput { .. })
        ));
    }

    #[test]
    fn test_process_file_reads_all_lines() {
        let sink = MemorySink::default();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        file.write_all(b"\n2024-02-02 warn action=logout user=amy\n")
            .unwrap();

        let tally = completed(process_file(file.path(), false, &sink));
        assert_eq!(tally.valid(), 3);
        assert_eq!(tally.skipped(), 1);
        assert_eq!(tally.blank(), 1);
        assert_eq!(tally.levels().warn, 1);
    }

    #[test]
    fn test_invalid_utf8_is_unreadable() {
        let sink = MemorySink::default();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"2024-01-01 info action=login\n\xff\xfe\n")
            .unwrap();

        let outcome = process_file(file.path(), false, &sink);
        assert!(matches!(
            outcome,
            RunOutcome::Fatal(RunError::UnreadableInput { .. })
        ));
    }
}
