use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use super::turn::{TurnMetrics, TurnRecord};

/// Total latency above this many seconds counts as a high-latency turn
pub const HIGH_LATENCY_THRESHOLD: f64 = 2.0;

/// Running statistics for one measurement session.
///
/// Counters and latency extremes are maintained incrementally on every
/// admitted turn; the four averages are only computed once, at session end.
#[derive(Debug, Clone, Serialize)]
pub struct SessionState {
    /// Sortable, second-resolution id derived from the session start time
    pub session_id: String,

    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,

    /// Session duration in seconds, set at session end
    pub duration: Option<f64>,

    pub total_turns: u64,
    pub successful_turns: u64,
    pub interrupted_turns: u64,

    pub avg_total_latency: f64,
    pub avg_eou_delay: f64,
    pub avg_ttft: f64,
    pub avg_ttfb: f64,

    pub max_latency: f64,

    /// Lowest valid total latency observed so far. `None` until the first
    /// valid value arrives; reported as 0 externally.
    #[serde(serialize_with = "min_latency_or_zero")]
    pub min_latency: Option<f64>,

    pub high_latency_turns: u64,

    /// Open key-value bag for caller-supplied session context
    /// (provider names, model ids, ...). Not validated.
    pub config: Map<String, Value>,
}

fn min_latency_or_zero<S>(min: &Option<f64>, s: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    s.serialize_f64(min.unwrap_or(0.0))
}

impl SessionState {
    /// Create a fresh session starting at `start_time`.
    pub fn new(start_time: DateTime<Utc>) -> Self {
        Self {
            session_id: start_time.format("%Y%m%d_%H%M%S").to_string(),
            start_time,
            end_time: None,
            duration: None,
            total_turns: 0,
            successful_turns: 0,
            interrupted_turns: 0,
            avg_total_latency: 0.0,
            avg_eou_delay: 0.0,
            avg_ttft: 0.0,
            avg_ttfb: 0.0,
            max_latency: 0.0,
            min_latency: None,
            high_latency_turns: 0,
            config: Map::new(),
        }
    }

    /// Fold one admitted turn into the running counters and extremes.
    ///
    /// Latency extremes and the high-latency count track every turn with a
    /// positive total latency, interrupted or not; only the averages
    /// (computed at end) exclude interrupted turns.
    pub fn record_turn(&mut self, record: &TurnRecord) {
        self.total_turns += 1;

        if record.metrics.interrupted {
            self.interrupted_turns += 1;
        } else {
            self.successful_turns += 1;
        }

        if let Some(latency) = record.metrics.total_latency {
            if latency > 0.0 {
                if latency > self.max_latency {
                    self.max_latency = latency;
                }
                if self.min_latency.map_or(true, |min| latency < min) {
                    self.min_latency = Some(latency);
                }
                if latency > HIGH_LATENCY_THRESHOLD {
                    self.high_latency_turns += 1;
                }
            }
        }
    }

    /// Compute the four per-metric averages over the given turns.
    ///
    /// Each average covers turns that were not interrupted and measured the
    /// metric with a positive value; an empty qualifying set leaves the
    /// average at 0.
    pub fn compute_averages(&mut self, turns: &[TurnRecord]) {
        self.avg_total_latency = mean_of(turns, |m| m.total_latency);
        self.avg_eou_delay = mean_of(turns, |m| m.eou_delay);
        self.avg_ttft = mean_of(turns, |m| m.ttft);
        self.avg_ttfb = mean_of(turns, |m| m.ttfb);
    }

    /// Snapshot this state as a flat JSON object (the Session Summary row).
    pub fn to_summary(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

/// Arithmetic mean of one metric over valid (not interrupted, value > 0)
/// turns, or 0 when no turn qualifies.
pub fn mean_of(
    turns: &[TurnRecord],
    metric: impl Fn(&TurnMetrics) -> Option<f64>,
) -> f64 {
    let values: Vec<f64> = turns
        .iter()
        .filter(|t| !t.metrics.interrupted)
        .filter_map(|t| metric(&t.metrics))
        .filter(|v| *v > 0.0)
        .collect();

    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}
