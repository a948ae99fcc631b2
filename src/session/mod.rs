//! Session lifecycle and latency aggregation
//!
//! This module provides the `SessionRecorder` abstraction that manages:
//! - One measurement session at a time (start / add_turn / end)
//! - Per-turn latency records, append-only in turn order
//! - Running counters and latency extremes, updated incrementally
//! - Close-time averages and the summary handed to the report exporter

mod recorder;
mod stats;
mod timing;
mod turn;

pub use recorder::SessionRecorder;
pub use stats::{SessionState, HIGH_LATENCY_THRESHOLD};
pub use timing::TurnTimer;
pub use turn::{TurnMetrics, TurnRecord};
