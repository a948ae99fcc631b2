use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Measurements for a single conversation turn, supplied by the
/// voice-interaction driver.
///
/// All latency values are in seconds. `None` means the stage was not
/// measured for this turn; zero and missing values are treated the same
/// by the aggregates (both excluded).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TurnMetrics {
    /// Turn number as assigned by the caller. Treated as metadata only:
    /// uniqueness and ordering are not validated.
    pub turn_number: u32,

    /// End-of-utterance to transcription latency
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eou_delay: Option<f64>,

    /// Time to first token from the LLM
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttft: Option<f64>,

    /// Time to first byte from the TTS stage
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttfb: Option<f64>,

    /// End-of-utterance to start of spoken response
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_latency: Option<f64>,

    /// Whether the user interrupted the agent's response
    #[serde(default)]
    pub interrupted: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_response: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_input: Option<String>,
}

/// A turn as stored by the session: the caller's metrics stamped with the
/// owning session id and the admission time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnRecord {
    pub session_id: String,

    /// When the recorder admitted this turn
    pub timestamp: DateTime<Utc>,

    #[serde(flatten)]
    pub metrics: TurnMetrics,
}
