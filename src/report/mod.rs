//! Session report generation
//!
//! Turns a finished session (summary row + ordered turn records) into a
//! three-table artifact on disk, with a delimited-text fallback when the
//! structured write fails.

mod analysis;
mod exporter;

pub use analysis::{latency_analysis, AnalysisRow};
pub use exporter::{ExportError, ReportExporter};
