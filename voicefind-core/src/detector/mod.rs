//! `VoiceDetector` — the top-level detection pipeline.
//!
//! ## Stages (per run)
//!
//! ```text
//! 1. Window scan: overlapping windows → admission gates → classifier
//! 2. Validation: drop too-short and edge-touching candidates
//! 3. Proximity grouping: discard isolated low-total groups
//! 4. Merge-close: fuse segments separated by sub-threshold gaps
//! 5. Report: apply the minimum-total-voice acceptance floor
//! ```
//!
//! The run is synchronous and batch-oriented. Windows are independent
//! inputs (no shared mutable state between them), so the scan could be
//! parallelised later without changing any of the stages below it.

pub mod consolidate;
pub mod windows;

use std::time::Instant;

use tracing::info;

use crate::audio::buffer::AudioBuffer;
use crate::classify::ClassifierHandle;
use crate::error::Result;
use crate::report::VoiceReport;

/// A detected speech segment in absolute recording time.
///
/// Invariants: `end > start`, `duration == end − start`. After
/// consolidation the segment list is sorted by `start` and non-overlapping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoiceSegment {
    /// Segment start, seconds from the beginning of the recording.
    pub start: f64,
    /// Segment end, seconds from the beginning of the recording.
    pub end: f64,
    /// `end − start`, seconds.
    pub duration: f64,
    /// Index of the analysis window this candidate came from.
    pub window_index: usize,
}

impl VoiceSegment {
    pub fn new(start: f64, end: f64, window_index: usize) -> Self {
        Self {
            start,
            end,
            duration: end - start,
            window_index,
        }
    }
}

/// Configuration for `VoiceDetector`. All fields overridable.
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    /// Sample rate the classifier expects (Hz). Default: 16000.
    pub target_sample_rate: u32,
    /// Classifier sensitivity ladder, tried in order until a window yields
    /// a non-empty result. Default: `[0.70, 0.56]` — the reduced second
    /// tier rescues quiet speech without loosening the threshold globally.
    pub classifier_thresholds: Vec<f32>,
    /// Minimum duration for a candidate segment to be kept (s). Default: 0.2.
    pub min_segment_duration: f64,
    /// Maximum silence between segments that still merges them (s). Default: 0.3.
    pub min_silence_duration: f64,
    /// Analysis window length (s). Default: 3.0.
    pub window_duration: f64,
    /// Fraction of a window shared with its successor. Default: 0.5.
    pub window_overlap: f64,
    /// Total voice below this duration is reported as "no voice" (s).
    /// Default: 0.8.
    pub min_total_voice_duration: f64,
    /// Energy gate ratio against the 75th-percentile reference. Default: 0.05.
    pub energy_threshold_ratio: f32,
    /// Maximum gap joining segments into one proximity group (s). Default: 1.0.
    pub proximity_gap: f64,
    /// Segments starting or ending within this margin of the recording
    /// edges are treated as artifacts (s). Default: 0.1.
    pub edge_margin: f64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            target_sample_rate: 16_000,
            classifier_thresholds: vec![0.70, 0.70 * 0.8],
            min_segment_duration: 0.2,
            min_silence_duration: 0.3,
            window_duration: 3.0,
            window_overlap: 0.5,
            min_total_voice_duration: 0.8,
            energy_threshold_ratio: 0.05,
            proximity_gap: 1.0,
            edge_margin: 0.1,
        }
    }
}

/// The detection pipeline, bound to one classifier instance.
///
/// The classifier is injected rather than loaded internally so the model
/// loads once per process and the pipeline stays testable with a fake.
pub struct VoiceDetector {
    config: DetectorConfig,
    classifier: ClassifierHandle,
}

impl VoiceDetector {
    pub fn new(config: DetectorConfig, classifier: ClassifierHandle) -> Self {
        Self { config, classifier }
    }

    /// Run the full pipeline over a decoded recording.
    ///
    /// The buffer must already be at `config.target_sample_rate`
    /// (see `audio::resample`).
    ///
    /// # Errors
    /// Classifier failures abort the run; there are no partial results.
    pub fn analyze(&self, buffer: &AudioBuffer) -> Result<VoiceReport> {
        let audio_duration = buffer.duration_secs();
        info!(
            audio_duration = format_args!("{audio_duration:.2}"),
            sample_rate = buffer.sample_rate,
            "analyzing recording"
        );

        let scan_started = Instant::now();
        let (raw, flags) = windows::scan_windows(&self.config, &self.classifier, buffer)?;
        let voiced_windows = flags.iter().filter(|&&v| v).count();
        info!(
            raw_segments = raw.len(),
            windows = flags.len(),
            voiced_windows,
            elapsed_ms = scan_started.elapsed().as_millis() as u64,
            "window scan complete"
        );

        let consolidate_started = Instant::now();
        let validated = consolidate::validate(raw, audio_duration, &self.config);
        let grouped = consolidate::group_by_proximity(validated, &self.config);
        let merged = consolidate::merge_close(grouped, &self.config);
        info!(
            segments = merged.len(),
            elapsed_ms = consolidate_started.elapsed().as_millis() as u64,
            "consolidation complete"
        );

        Ok(VoiceReport::build(&merged, audio_duration, &self.config))
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }
}
