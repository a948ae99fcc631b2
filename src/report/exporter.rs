use serde::Serialize;
use serde_json::{Map, Value};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{error, info};

use super::analysis::{latency_analysis, AnalysisRow};
use crate::session::TurnRecord;

/// Why a primary report write failed. The exporter reacts to the kind
/// (fallback on either), the logs show which one it was.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write report file: {0}")]
    Io(#[from] std::io::Error),
}

/// The primary report artifact: three named tables in one JSON document.
#[derive(Serialize)]
struct SessionReport<'a> {
    session_summary: Vec<&'a Map<String, Value>>,
    turn_details: &'a [TurnRecord],
    latency_analysis: Vec<AnalysisRow>,
}

/// Writes finished sessions to disk.
///
/// One call per session end: a JSON report named from the session id, or,
/// when that write fails, two delimited-text files carrying the summary and
/// turn tables. Nothing here ever returns an error to the caller; a
/// session's telemetry is not worth crashing the conversation it measured.
pub struct ReportExporter {
    output_dir: PathBuf,
}

impl ReportExporter {
    pub fn new(output_dir: PathBuf) -> Self {
        Self { output_dir }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Write the session report, falling back to delimited text on failure.
    ///
    /// Re-exporting the same session id overwrites the previous artifact.
    pub fn export(&self, session_id: &str, summary: &Map<String, Value>, turns: &[TurnRecord]) {
        match self.write_report(session_id, summary, turns) {
            Ok(path) => info!("Metrics saved to: {}", path.display()),
            Err(err) => {
                error!("Failed to save metrics report: {}", err);
                match self.write_fallback(session_id, summary, turns) {
                    Ok(()) => info!(
                        "Metrics saved as fallback text files in: {}",
                        self.output_dir.display()
                    ),
                    // Swallowed: telemetry loss is acceptable, a crash is not.
                    Err(err) => error!("Failed to save fallback metrics: {}", err),
                }
            }
        }
    }

    fn write_report(
        &self,
        session_id: &str,
        summary: &Map<String, Value>,
        turns: &[TurnRecord],
    ) -> Result<PathBuf, ExportError> {
        fs::create_dir_all(&self.output_dir)?;

        let path = self
            .output_dir
            .join(format!("voice_agent_metrics_{}.json", session_id));

        let report = SessionReport {
            session_summary: vec![summary],
            turn_details: turns,
            latency_analysis: latency_analysis(turns),
        };

        let file = File::create(&path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &report)?;
        writer.flush()?;

        Ok(path)
    }

    /// Degraded output mode: Session Summary and Turn Details as two
    /// comma-delimited files. The Latency Analysis table is not reproduced
    /// here.
    fn write_fallback(
        &self,
        session_id: &str,
        summary: &Map<String, Value>,
        turns: &[TurnRecord],
    ) -> Result<(), ExportError> {
        fs::create_dir_all(&self.output_dir)?;

        let summary_path = self
            .output_dir
            .join(format!("session_summary_{}.csv", session_id));
        write_summary_csv(&summary_path, summary)?;

        let turns_path = self
            .output_dir
            .join(format!("turn_details_{}.csv", session_id));
        write_turns_csv(&turns_path, turns)?;

        Ok(())
    }
}

fn write_summary_csv(path: &Path, summary: &Map<String, Value>) -> Result<(), ExportError> {
    let mut writer = BufWriter::new(File::create(path)?);

    let header: Vec<String> = summary.keys().map(|k| csv_field(k)).collect();
    writeln!(writer, "{}", header.join(","))?;

    let row: Vec<String> = summary.values().map(value_field).collect();
    writeln!(writer, "{}", row.join(","))?;

    writer.flush()?;
    Ok(())
}

fn write_turns_csv(path: &Path, turns: &[TurnRecord]) -> Result<(), ExportError> {
    let mut writer = BufWriter::new(File::create(path)?);

    writeln!(
        writer,
        "session_id,timestamp,turn_number,eou_delay,ttft,ttfb,total_latency,interrupted,agent_response,user_input"
    )?;

    for turn in turns {
        let m = &turn.metrics;
        let row = [
            csv_field(&turn.session_id),
            turn.timestamp.to_rfc3339(),
            m.turn_number.to_string(),
            optional_field(m.eou_delay),
            optional_field(m.ttft),
            optional_field(m.ttfb),
            optional_field(m.total_latency),
            m.interrupted.to_string(),
            csv_field(m.agent_response.as_deref().unwrap_or("")),
            csv_field(m.user_input.as_deref().unwrap_or("")),
        ];
        writeln!(writer, "{}", row.join(","))?;
    }

    writer.flush()?;
    Ok(())
}

fn optional_field(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn value_field(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => csv_field(s),
        other => csv_field(&other.to_string()),
    }
}

/// Quote a field when it contains a delimiter, quote, or newline.
fn csv_field(field: &str) -> String {
    if field.contains([',', '"', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
