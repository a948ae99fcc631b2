use chrono::{DateTime, Utc};

use super::turn::TurnMetrics;

/// Stopwatch for the stages of a single conversation turn.
///
/// The driver marks each pipeline stage as it happens; `metrics` derives
/// the latency figures from the differences between stage instants. Stages
/// that were never marked yield `None` metrics rather than zeros.
#[derive(Debug, Default, Clone)]
pub struct TurnTimer {
    user_speech_end: Option<DateTime<Utc>>,
    stt_complete: Option<DateTime<Utc>>,
    llm_first_token: Option<DateTime<Utc>>,
    tts_first_byte: Option<DateTime<Utc>>,
    response_start: Option<DateTime<Utc>>,
}

impl TurnTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear every stage instant.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Reset for a new turn while keeping the user-speech-end instant,
    /// which may already have been marked for the upcoming turn.
    pub fn reset_turn(&mut self) {
        let user_speech_end = self.user_speech_end;
        self.reset();
        self.user_speech_end = user_speech_end;
    }

    pub fn mark_user_speech_end(&mut self) {
        self.user_speech_end = Some(Utc::now());
    }

    pub fn mark_stt_complete(&mut self) {
        self.stt_complete = Some(Utc::now());
    }

    pub fn mark_llm_first_token(&mut self) {
        self.llm_first_token = Some(Utc::now());
    }

    pub fn mark_tts_first_byte(&mut self) {
        self.tts_first_byte = Some(Utc::now());
    }

    pub fn mark_response_start(&mut self) {
        self.response_start = Some(Utc::now());
    }

    /// Derive the turn's latency metrics from the marked stages.
    ///
    /// All figures are anchored on the user-speech-end instant; without it
    /// no latency can be derived and every metric is `None`.
    pub fn metrics(&self, turn_number: u32) -> TurnMetrics {
        let mut metrics = TurnMetrics {
            turn_number,
            ..TurnMetrics::default()
        };

        let Some(speech_end) = self.user_speech_end else {
            return metrics;
        };

        metrics.eou_delay = seconds_between(speech_end, self.stt_complete);
        metrics.ttft = match (self.stt_complete, self.llm_first_token) {
            (Some(stt), Some(token)) => seconds_between(stt, Some(token)),
            _ => None,
        };
        metrics.ttfb = match (self.llm_first_token, self.tts_first_byte) {
            (Some(token), Some(byte)) => seconds_between(token, Some(byte)),
            _ => None,
        };
        metrics.total_latency = seconds_between(speech_end, self.response_start);

        metrics
    }
}

fn seconds_between(from: DateTime<Utc>, to: Option<DateTime<Utc>>) -> Option<f64> {
    to.map(|to| to.signed_duration_since(from).num_milliseconds() as f64 / 1000.0)
}
