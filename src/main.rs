use anyhow::Result;
use clap::Parser;
use serde_json::{json, Map, Value};
use tracing::info;
use voice_metrics::{Config, SessionRecorder, TurnMetrics};

/// Generate a sample metrics session to exercise the report pipeline
/// without a live voice agent.
#[derive(Parser, Debug)]
#[command(name = "voice-metrics", version)]
struct Args {
    /// Config file (optional; defaults apply when missing)
    #[arg(long, default_value = "config/voice-metrics")]
    config: String,

    /// Override the report output directory
    #[arg(long)]
    output_dir: Option<std::path::PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let mut cfg = Config::load(&args.config)?;
    if let Some(dir) = args.output_dir {
        cfg.metrics.output_dir = dir;
    }

    info!("voice-metrics v0.1.0");
    info!("Report output directory: {}", cfg.metrics.output_dir.display());

    let mut recorder = SessionRecorder::new(cfg.metrics.clone());
    recorder.start();

    // A plausible five-turn conversation, one turn interrupted.
    let sample_turns: [(f64, f64, f64, bool); 5] = [
        (0.21, 0.48, 0.14, false),
        (0.33, 0.95, 0.22, false),
        (0.18, 1.40, 0.19, false),
        (0.40, 1.85, 0.28, true),
        (0.25, 0.62, 0.11, false),
    ];

    for (i, (eou_delay, ttft, ttfb, interrupted)) in sample_turns.into_iter().enumerate() {
        let turn_number = (i + 1) as u32;
        recorder.add_turn(TurnMetrics {
            turn_number,
            eou_delay: Some(eou_delay),
            ttft: Some(ttft),
            ttfb: Some(ttfb),
            total_latency: Some(eou_delay + ttft + ttfb + 0.2),
            interrupted,
            agent_response: Some(format!("Sample response for turn {}", turn_number)),
            user_input: Some(format!("User question {}", turn_number)),
        });
    }

    info!(
        "Current average latency: {:.3}s",
        recorder.average_latency()
    );

    let mut overlay = Map::new();
    overlay.insert(
        "config".to_string(),
        json!({
            "stt": "deepgram",
            "llm": "groq",
            "tts": "cartesia",
            "version": "demo",
        }),
    );
    overlay.insert("demo_mode".to_string(), Value::Bool(true));

    recorder.end(Some(overlay));

    info!(
        "Sample session complete, check {} for the report",
        cfg.metrics.output_dir.display()
    );

    Ok(())
}
