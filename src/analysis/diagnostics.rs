//! Diagnostics sink used by the aggregator.
//!
//! The aggregator reports through this trait instead of calling the global
//! logger directly, so tests can capture what it emits.

use tracing::{debug, error, info, warn};

/// Destination for run diagnostics.
pub trait DiagnosticsSink {
    fn debug(&self, message: &str);
    fn info(&self, message: &str);
    fn warn(&self, message: &str);
    fn error(&self, message: &str);
}

/// Forwards diagnostics to the installed `tracing` subscriber.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticsSink for TracingSink {
    fn debug(&self, message: &str) {
        debug!("{}", message);
    }

    fn info(&self, message: &str) {
        info!("{}", message);
    }

    fn warn(&self, message: &str) {
        warn!("{}", message);
    }

    fn error(&self, message: &str) {
        error!("{}", message);
    }
}

#[cfg(test)]
pub use memory::{MemorySink, Severity};

#[cfg(test)]
mod memory {
    use super::DiagnosticsSink;
    use std::cell::RefCell;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Severity {
        Debug,
        Info,
        Warn,
        Error,
    }

    /// Records every message in order.
    #[derive(Debug, Default)]
    pub struct MemorySink {
        messages: RefCell<Vec<(Severity, String)>>,
    }

    impl MemorySink {
        pub fn at(&self, severity: Severity) -> Vec<String> {
            self.messages
                .borrow()
                .iter()
                .filter(|(s, _)| *s == severity)
                .map(|(_, m)| m.clone())
                .collect()
        }

        fn push(&self, severity: Severity, message: &str) {
            self.messages
                .borrow_mut()
                .push((severity, message.to_string()));
        }
    }

    impl DiagnosticsSink for MemorySink {
        fn debug(&self, message: &str) {
            self.push(Severity::Debug, message);
        }

        fn info(&self, message: &str) {
            self.push(Severity::Info, message);
        }

        fn warn(&self, message: &str) {
            self.push(Severity::Warn, message);
        }

        fn error(&self, message: &str) {
            self.push(Severity::Error, message);
        }
    }
}
