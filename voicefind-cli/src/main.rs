//! voicefind — locate the first human voice in an audio file.
//!
//! Takes exactly two positional arguments: the input audio path and the
//! output JSON path. Writes a single JSON object with the detection
//! metrics; everything on stdout is diagnostic only.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::info;

use voicefind_core::{
    audio, ClassifierHandle, DetectorConfig, SileroClassifier, VoiceDetector, VoiceReport,
};

const USAGE: &str = "usage: voicefind <audio_path> <output_json_path>";

fn main() {
    // ── Tracing ───────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "voicefind=info".parse().unwrap()),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some((input, output)) = parse_args(&args) else {
        eprintln!("{USAGE}");
        std::process::exit(2);
    };

    if let Err(e) = run(&input, &output) {
        eprintln!("voicefind: {e:#}");
        std::process::exit(1);
    }
}

/// Exactly two positional arguments; anything else is a usage error.
fn parse_args(args: &[String]) -> Option<(PathBuf, PathBuf)> {
    match args {
        [input, output] => Some((PathBuf::from(input), PathBuf::from(output))),
        _ => None,
    }
}

fn run(input: &Path, output: &Path) -> Result<()> {
    let started = Instant::now();
    info!(input = %input.display(), "processing");

    // Load the classifier once; repeated runs within one process would
    // reuse this handle rather than reloading the model.
    let load_started = Instant::now();
    let model_path = SileroClassifier::default_model_path();
    let classifier = ClassifierHandle::new(SileroClassifier::new(&model_path)?);
    info!(
        model = %model_path.display(),
        elapsed_ms = load_started.elapsed().as_millis() as u64,
        "classifier loaded"
    );

    let config = DetectorConfig::default();

    let decode_started = Instant::now();
    let decoded = audio::decode_file(input)?;
    let buffer = audio::resample(decoded, config.target_sample_rate)?;
    info!(
        audio_duration = format_args!("{:.2}", buffer.duration_secs()),
        elapsed_ms = decode_started.elapsed().as_millis() as u64,
        "audio decoded"
    );

    let detector = VoiceDetector::new(config, classifier);
    let report = detector.analyze(&buffer)?;

    write_report(output, &report)?;
    info!(
        output = %output.display(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "report written"
    );
    Ok(())
}

/// Serialize the report and move it into place in one step, so a killed or
/// failed run never leaves a partial JSON file at the destination.
fn write_report(path: &Path, report: &VoiceReport) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("serialize report")?;

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    std::fs::write(&tmp, json.as_bytes())
        .with_context(|| format!("write {}", tmp.display()))?;
    std::fs::rename(&tmp, path).with_context(|| format!("rename to {}", path.display()))?;
    Ok(())
}
