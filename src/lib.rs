pub mod config;
pub mod report;
pub mod session;

pub use config::{Config, MetricsConfig};
pub use report::{latency_analysis, AnalysisRow, ExportError, ReportExporter};
pub use session::{
    SessionRecorder, SessionState, TurnMetrics, TurnRecord, TurnTimer, HIGH_LATENCY_THRESHOLD,
};
