// src/main.rs

use anyhow::{Context, Result};
use clap::Parser;
use mudra_detection::analysis::SharedClassifier;
use mudra_detection::replay::{self, ReplayStats};
use mudra_detection::{Config, MudraEngine};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "mudra-detection",
    about = "Replay recorded hand-landmark streams through the mudra engine"
)]
struct Args {
    /// YAML configuration. Defaults are used when omitted.
    #[arg(long)]
    config: Option<String>,

    /// A .jsonl file, or a directory searched recursively for *.jsonl
    #[arg(long)]
    input: PathBuf,

    /// Echo landmarks in every frame result
    #[arg(long)]
    landmarks: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("mudra_detection={},ort=warn", config.logging.level))
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    info!("🙏 Mudra Detection Engine Starting");
    info!(
        "Debounce: enter={}, exit={}, max_mismatch={} | ML threshold={:.2}, stability={:.3}",
        config.debounce.enter_threshold,
        config.debounce.exit_threshold,
        config.debounce.max_mismatch,
        config.classifier.confidence_threshold,
        config.classifier.stability_bound
    );

    let mut builder = MudraEngine::builder(config.clone());
    if let Some(classifier) = load_classifier(&config)? {
        builder = builder.classifier(classifier);
    }
    let engine = builder.build().context("Failed to build engine")?;
    info!("✓ {} mudras supported", engine.supported_mudras().len());

    let files = replay::find_replay_files(&args.input)?;
    if files.is_empty() {
        error!("No replay files found in {}", args.input.display());
        return Ok(());
    }

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let mut totals = ReplayStats::default();

    for (idx, path) in files.iter().enumerate() {
        info!("Replaying {}/{}: {}", idx + 1, files.len(), path.display());
        let file =
            File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
        match replay::replay(&engine, BufReader::new(file), &mut out, args.landmarks) {
            Ok(stats) => {
                info!(
                    "✓ {} frames, {} resets, {} skipped",
                    stats.frames, stats.resets, stats.skipped
                );
                totals.frames += stats.frames;
                totals.resets += stats.resets;
                totals.skipped += stats.skipped;
            }
            Err(e) => error!("Failed to replay {}: {:#}", path.display(), e),
        }
    }
    out.flush()?;

    let summary = engine.metrics().summary();
    info!("\n========================================");
    info!("Replay complete: {} file(s)", files.len());
    info!(
        "  Frames: {} ({} with hand, {} invalid)",
        summary.total_frames, summary.hand_frames, summary.invalid_frames
    );
    info!(
        "  Rule hits: {} | ML hits: {} | Undecided: {} ({} in motion)",
        summary.rule_hits, summary.ml_hits, summary.undecided_frames, summary.in_motion_frames
    );
    info!("  Confirmations: {}", summary.confirmations);
    info!(
        "  Sessions: {} created, {} evicted, {} reset ({} live)",
        summary.sessions_created,
        summary.sessions_evicted,
        summary.sessions_reset,
        engine.session_count()
    );
    if summary.classifier_errors > 0 {
        warn!("  Classifier errors: {}", summary.classifier_errors);
    }
    if totals.skipped > 0 {
        warn!("  Skipped lines: {}", totals.skipped);
    }
    info!("  {:.1} frames/s", summary.fps);
    info!("========================================");

    Ok(())
}

fn load_classifier(config: &Config) -> Result<Option<SharedClassifier>> {
    let Some(path) = config.classifier.model_path.as_deref() else {
        info!("No statistical model configured, running rule-only");
        return Ok(None);
    };

    #[cfg(feature = "onnx")]
    {
        let classifier = mudra_detection::inference::OnnxClassifier::new(&config.classifier)
            .with_context(|| format!("Failed to load statistical model {}", path))?;
        let shared: SharedClassifier = std::sync::Arc::new(classifier);
        Ok(Some(shared))
    }

    #[cfg(not(feature = "onnx"))]
    {
        warn!(
            "⚠️  Model {} configured but this build lacks the `onnx` feature, running rule-only",
            path
        );
        Ok(None)
    }
}
