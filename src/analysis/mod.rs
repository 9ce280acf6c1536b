//! Analysis modules.
//!
//! Line classification, the single-pass aggregator and the diagnostics
//! sink it reports through.

pub mod aggregator;
pub mod classifier;
pub mod diagnostics;

pub use aggregator::{process_file, Aggregator};
pub use diagnostics::{DiagnosticsSink, TracingSink};
