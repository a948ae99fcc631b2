use serde::Serialize;

use crate::session::{TurnMetrics, TurnRecord};

/// One row of the Latency Analysis table.
///
/// Per-metric statistics rows populate every column; threshold-bucket rows
/// carry only a count, so the sparse columns are skipped when serialized.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisRow {
    #[serde(rename = "Metric")]
    pub metric: String,

    #[serde(rename = "Average", skip_serializing_if = "Option::is_none")]
    pub average: Option<f64>,

    #[serde(rename = "Min", skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,

    #[serde(rename = "Max", skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,

    #[serde(rename = "Count")]
    pub count: usize,
}

impl AnalysisRow {
    fn stats(metric: &str, values: &[f64]) -> Self {
        let (average, min, max) = if values.is_empty() {
            (0.0, 0.0, 0.0)
        } else {
            (
                values.iter().sum::<f64>() / values.len() as f64,
                values.iter().copied().fold(f64::INFINITY, f64::min),
                values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            )
        };

        Self {
            metric: metric.to_string(),
            average: Some(average),
            min: Some(min),
            max: Some(max),
            count: values.len(),
        }
    }

    fn bucket(metric: &str, count: usize) -> Self {
        Self {
            metric: metric.to_string(),
            average: None,
            min: None,
            max: None,
            count,
        }
    }
}

/// Build the Latency Analysis table from scratch over the exported turns.
///
/// Deliberately recomputed here instead of reusing the recorder's running
/// aggregates, so the exporter stays decoupled and testable on a bare turn
/// slice. Uses the same validity filter as the session averages: turns not
/// interrupted, metric measured with a positive value.
pub fn latency_analysis(turns: &[TurnRecord]) -> Vec<AnalysisRow> {
    let valid: Vec<&TurnRecord> = turns
        .iter()
        .filter(|t| !t.metrics.interrupted)
        .collect();

    if valid.is_empty() {
        return Vec::new();
    }

    let series = |metric: fn(&TurnMetrics) -> Option<f64>| -> Vec<f64> {
        valid
            .iter()
            .filter_map(|t| metric(&t.metrics))
            .filter(|v| *v > 0.0)
            .collect()
    };

    let latencies = series(|m| m.total_latency);
    let mut rows = Vec::new();

    if !latencies.is_empty() {
        rows.push(AnalysisRow::stats("Total Latency", &latencies));
        rows.push(AnalysisRow::stats("EOU Delay", &series(|m| m.eou_delay)));
        rows.push(AnalysisRow::stats("TTFT", &series(|m| m.ttft)));
        rows.push(AnalysisRow::stats("TTFB", &series(|m| m.ttfb)));
    }

    rows.push(AnalysisRow::bucket(
        "Turns > 2s latency",
        latencies.iter().filter(|l| **l > 2.0).count(),
    ));
    rows.push(AnalysisRow::bucket(
        "Turns > 1s latency",
        latencies.iter().filter(|l| **l > 1.0).count(),
    ));
    rows.push(AnalysisRow::bucket(
        "Turns < 0.5s latency",
        latencies.iter().filter(|l| **l < 0.5).count(),
    ));

    rows
}
