// Integration tests for the report exporter: primary JSON artifact,
// re-export behavior, and the delimited-text fallback path.

use anyhow::Result;
use serde_json::Value;
use std::fs;
use tempfile::TempDir;
use voice_metrics::{MetricsConfig, SessionRecorder, TurnMetrics};

fn recorder(dir: &TempDir) -> SessionRecorder {
    SessionRecorder::new(MetricsConfig {
        output_dir: dir.path().to_path_buf(),
    })
}

fn turn(turn_number: u32, total_latency: f64) -> TurnMetrics {
    TurnMetrics {
        turn_number,
        total_latency: Some(total_latency),
        agent_response: Some(format!("response {}", turn_number)),
        user_input: Some(format!("question {}", turn_number)),
        ..TurnMetrics::default()
    }
}

fn session_id(recorder: &SessionRecorder) -> String {
    recorder.session_stats()["session_id"]
        .as_str()
        .unwrap()
        .to_string()
}

#[test]
fn test_report_round_trips_turn_details() -> Result<()> {
    let dir = TempDir::new()?;
    let mut recorder = recorder(&dir);
    recorder.start();

    for (i, latency) in [0.4, 1.2, 2.6].into_iter().enumerate() {
        recorder.add_turn(turn((i + 1) as u32, latency));
    }
    let id = session_id(&recorder);
    recorder.end(None);

    let path = dir.path().join(format!("voice_agent_metrics_{}.json", id));
    let report: Value = serde_json::from_str(&fs::read_to_string(&path)?)?;

    let turns = report["turn_details"].as_array().unwrap();
    assert_eq!(turns.len(), 3);
    for (i, row) in turns.iter().enumerate() {
        assert_eq!(row["turn_number"].as_u64().unwrap(), (i + 1) as u64);
        assert_eq!(row["session_id"].as_str().unwrap(), id);
    }

    let summary = report["session_summary"].as_array().unwrap();
    assert_eq!(summary.len(), 1);
    assert_eq!(summary[0]["total_turns"].as_u64().unwrap(), 3);
    assert_eq!(summary[0]["high_latency_turns"].as_u64().unwrap(), 1);

    Ok(())
}

#[test]
fn test_report_contains_latency_analysis_rows() -> Result<()> {
    let dir = TempDir::new()?;
    let mut recorder = recorder(&dir);
    recorder.start();

    recorder.add_turn(TurnMetrics {
        turn_number: 1,
        eou_delay: Some(0.2),
        ttft: Some(0.7),
        ttfb: Some(0.1),
        total_latency: Some(1.1),
        ..TurnMetrics::default()
    });
    recorder.add_turn(turn(2, 2.4));
    let id = session_id(&recorder);
    recorder.end(None);

    let path = dir.path().join(format!("voice_agent_metrics_{}.json", id));
    let report: Value = serde_json::from_str(&fs::read_to_string(&path)?)?;

    let analysis = report["latency_analysis"].as_array().unwrap();
    // Four metric rows plus three threshold buckets.
    assert_eq!(analysis.len(), 7);
    assert_eq!(analysis[0]["Metric"].as_str().unwrap(), "Total Latency");
    assert_eq!(analysis[0]["Count"].as_u64().unwrap(), 2);
    assert_eq!(analysis[0]["Min"].as_f64().unwrap(), 1.1);
    assert_eq!(analysis[0]["Max"].as_f64().unwrap(), 2.4);

    let buckets: Vec<u64> = analysis[4..]
        .iter()
        .map(|row| row["Count"].as_u64().unwrap())
        .collect();
    // > 2.0s, > 1.0s, < 0.5s over the total-latency series.
    assert_eq!(buckets, vec![1, 2, 0]);

    Ok(())
}

#[test]
fn test_end_is_safe_to_call_twice() -> Result<()> {
    let dir = TempDir::new()?;
    let mut recorder = recorder(&dir);
    recorder.start();
    recorder.add_turn(turn(1, 0.9));
    let id = session_id(&recorder);

    recorder.end(None);
    recorder.end(None);

    // Same deterministic name, overwritten in place, still valid JSON.
    let path = dir.path().join(format!("voice_agent_metrics_{}.json", id));
    let report: Value = serde_json::from_str(&fs::read_to_string(&path)?)?;
    assert_eq!(report["turn_details"].as_array().unwrap().len(), 1);

    Ok(())
}

#[test]
fn test_primary_failure_falls_back_to_text_artifacts() -> Result<()> {
    let dir = TempDir::new()?;
    let mut recorder = recorder(&dir);
    recorder.start();

    for i in 1..=4 {
        recorder.add_turn(turn(i, 0.5 + i as f64 * 0.3));
    }
    let id = session_id(&recorder);

    // A directory squatting on the primary artifact path makes the JSON
    // write fail with an I/O error and forces the fallback.
    fs::create_dir_all(dir.path().join(format!("voice_agent_metrics_{}.json", id)))?;

    recorder.end(None);

    let summary_path = dir.path().join(format!("session_summary_{}.csv", id));
    let turns_path = dir.path().join(format!("turn_details_{}.csv", id));

    let summary = fs::read_to_string(&summary_path)?;
    assert_eq!(summary.lines().count(), 2, "header plus one summary row");
    assert!(summary.lines().next().unwrap().contains("session_id"));

    let turns = fs::read_to_string(&turns_path)?;
    assert_eq!(turns.lines().count(), 5, "header plus four turn rows");

    Ok(())
}

#[test]
fn test_fallback_quotes_fields_with_delimiters() -> Result<()> {
    let dir = TempDir::new()?;
    let mut recorder = recorder(&dir);
    recorder.start();

    recorder.add_turn(TurnMetrics {
        turn_number: 1,
        total_latency: Some(0.8),
        agent_response: Some("Sure, here are three options: a, b, c".to_string()),
        ..TurnMetrics::default()
    });
    let id = session_id(&recorder);

    fs::create_dir_all(dir.path().join(format!("voice_agent_metrics_{}.json", id)))?;
    recorder.end(None);

    let turns = fs::read_to_string(dir.path().join(format!("turn_details_{}.csv", id)))?;
    assert!(turns.contains("\"Sure, here are three options: a, b, c\""));

    Ok(())
}

#[test]
fn test_unwritable_output_dir_does_not_panic() -> Result<()> {
    let dir = TempDir::new()?;
    // Point the output directory at a path whose parent is a regular file,
    // so both the primary write and the fallback fail.
    let blocker = dir.path().join("blocker");
    fs::write(&blocker, b"not a directory")?;

    let mut recorder = SessionRecorder::new(MetricsConfig {
        output_dir: blocker.join("metrics"),
    });
    recorder.start();
    recorder.add_turn(turn(1, 1.0));
    recorder.end(None);

    // Both paths failed; the error was logged and swallowed.
    assert!(!blocker.join("metrics").exists());
    Ok(())
}

#[test]
fn test_report_for_session_with_no_turns() -> Result<()> {
    let dir = TempDir::new()?;
    let mut recorder = recorder(&dir);
    recorder.start();
    let id = session_id(&recorder);
    recorder.end(None);

    let path = dir.path().join(format!("voice_agent_metrics_{}.json", id));
    let report: Value = serde_json::from_str(&fs::read_to_string(&path)?)?;

    assert!(report["turn_details"].as_array().unwrap().is_empty());
    assert!(report["latency_analysis"].as_array().unwrap().is_empty());
    assert_eq!(
        report["session_summary"][0]["min_latency"].as_f64().unwrap(),
        0.0
    );

    Ok(())
}
