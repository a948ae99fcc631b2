use chrono::Utc;
use serde_json::{Map, Value};
use tracing::{info, warn};

use super::stats::{mean_of, SessionState};
use super::turn::{TurnMetrics, TurnRecord};
use crate::config::MetricsConfig;
use crate::report::ReportExporter;

/// Records latency metrics for one voice session at a time.
///
/// The recorder is an explicit instance with no shared state: independent
/// recorders never interfere, and the caller is responsible for external
/// serialization if turns arrive from more than one thread. Every mutation
/// here is synchronous and O(1); the only I/O happens when `end` hands the
/// finished session to the exporter.
pub struct SessionRecorder {
    exporter: ReportExporter,
    session: Option<SessionState>,
    turns: Vec<TurnRecord>,

    /// Summary fields supplied by the caller at `end`, merged over the
    /// tracked state last-write-wins. Kept so repeated `end` calls and
    /// later snapshots see the same merged view.
    overlay: Map<String, Value>,
}

impl SessionRecorder {
    pub fn new(config: MetricsConfig) -> Self {
        Self {
            exporter: ReportExporter::new(config.output_dir),
            session: None,
            turns: Vec::new(),
            overlay: Map::new(),
        }
    }

    /// Begin a new session, resetting all recorder state.
    ///
    /// The session id is derived from the start wall-clock time at second
    /// resolution; two sessions started within the same second collide,
    /// which is accepted.
    pub fn start(&mut self) {
        if let Some(open) = &self.session {
            if open.end_time.is_none() {
                warn!(
                    "Discarding unfinished session {} ({} turns)",
                    open.session_id, open.total_turns
                );
            }
        }

        let state = SessionState::new(Utc::now());
        info!("Started new session: {}", state.session_id);

        self.session = Some(state);
        self.turns.clear();
        self.overlay.clear();
    }

    /// Admit one turn's metrics into the open session.
    ///
    /// Without an open session this is a no-op that logs a warning; turn
    /// loss must never escalate into a failure of the conversation being
    /// measured.
    pub fn add_turn(&mut self, metrics: TurnMetrics) {
        let Some(session) = &mut self.session else {
            warn!("Session not started, dropping turn metrics. Call start() first.");
            return;
        };

        let record = TurnRecord {
            session_id: session.session_id.clone(),
            timestamp: Utc::now(),
            metrics,
        };

        session.record_turn(&record);
        info!("Added turn metrics: turn {}", record.metrics.turn_number);
        self.turns.push(record);
    }

    /// Close the session: stamp the end time, compute averages, merge the
    /// caller's summary overlay, and export the report.
    ///
    /// Overlay keys overwrite tracked fields by design; it is the caller's
    /// escape hatch for supplying authoritative summary values (e.g. a
    /// final turn count known only to session semantics). Colliding keys
    /// should only be supplied when that override is intended.
    ///
    /// Calling `end` again recomputes the end time and duration, merges any
    /// additional overlay on top of the previous one, and rewrites the same
    /// deterministically named artifact.
    pub fn end(&mut self, overlay: Option<Map<String, Value>>) {
        let Some(session) = &mut self.session else {
            warn!("No active session to end.");
            return;
        };

        let end_time = Utc::now();
        session.end_time = Some(end_time);
        session.duration = Some(
            end_time
                .signed_duration_since(session.start_time)
                .num_milliseconds() as f64
                / 1000.0,
        );

        if let Some(overlay) = overlay {
            self.overlay.extend(overlay);
        }

        session.compute_averages(&self.turns);

        let mut summary = session.to_summary();
        for (key, value) in &self.overlay {
            summary.insert(key.clone(), value.clone());
        }

        self.exporter.export(&session.session_id, &summary, &self.turns);

        info!("Session ended: {}", session.session_id);
        info!(
            "Duration: {:.2}s, Turns: {}",
            session.duration.unwrap_or(0.0),
            session.total_turns
        );
    }

    /// Mean total latency over valid (not interrupted, latency > 0) turns
    /// admitted so far, or 0 when none qualify.
    pub fn average_latency(&self) -> f64 {
        mean_of(&self.turns, |m| m.total_latency)
    }

    /// Snapshot of the current session state, merged with any summary
    /// overlay and the current average latency.
    ///
    /// Returns only the average when no session has been started.
    pub fn session_stats(&self) -> Map<String, Value> {
        let mut stats = match &self.session {
            Some(session) => session.to_summary(),
            None => Map::new(),
        };

        for (key, value) in &self.overlay {
            stats.insert(key.clone(), value.clone());
        }

        if let Some(avg) = serde_json::Number::from_f64(self.average_latency()) {
            stats.insert("current_avg_latency".to_string(), Value::Number(avg));
        }

        stats
    }

    /// Turns admitted so far, in insertion order.
    pub fn turns(&self) -> &[TurnRecord] {
        &self.turns
    }
}
