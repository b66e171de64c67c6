//! Output report — the three derived metrics plus the acceptance floor.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::detector::{DetectorConfig, VoiceSegment};

/// The structured result of one detection run.
///
/// Field names and types are the output contract; the JSON written by the
/// CLI contains exactly these four fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceReport {
    /// Start of the earliest consolidated segment, seconds. 0 when no
    /// sufficient voice was found.
    pub first_voice_second: f64,
    /// Sum of consolidated segment durations, seconds.
    pub total_voice_duration: f64,
    /// Number of consolidated segments.
    pub voice_segments_count: usize,
    /// True duration of the recording, seconds — reported even when no
    /// voice was found.
    pub audio_duration: f64,
}

impl VoiceReport {
    /// Build the report from the consolidated segment list.
    ///
    /// Acceptance floor: detections whose total duration stays below
    /// `min_total_voice_duration` are suppressed to the zero-valued report
    /// rather than surfaced as sparse, possibly-spurious voice. This is a
    /// normal outcome, not an error.
    pub fn build(
        segments: &[VoiceSegment],
        audio_duration: f64,
        config: &DetectorConfig,
    ) -> VoiceReport {
        let total_voice_duration: f64 = segments.iter().map(|seg| seg.end - seg.start).sum();

        if segments.is_empty() || total_voice_duration < config.min_total_voice_duration {
            if segments.is_empty() {
                info!("no voice detected");
            } else {
                info!(
                    total_voice_duration = format_args!("{total_voice_duration:.2}"),
                    floor = config.min_total_voice_duration,
                    "voice detected but below the acceptance floor"
                );
            }
            return VoiceReport::none(audio_duration);
        }

        let first_voice_second = segments
            .iter()
            .map(|seg| seg.start)
            .fold(f64::INFINITY, f64::min);

        info!(
            first_voice_second = format_args!("{first_voice_second:.3}"),
            total_voice_duration = format_args!("{total_voice_duration:.2}"),
            voice_segments_count = segments.len(),
            "voice found"
        );

        VoiceReport {
            first_voice_second,
            total_voice_duration,
            voice_segments_count: segments.len(),
            audio_duration,
        }
    }

    /// The zero-valued report for recordings without sufficient voice.
    pub fn none(audio_duration: f64) -> VoiceReport {
        VoiceReport {
            first_voice_second: 0.0,
            total_voice_duration: 0.0,
            voice_segments_count: 0,
            audio_duration,
        }
    }

    /// Whether any voice cleared the acceptance floor.
    pub fn has_voice(&self) -> bool {
        self.voice_segments_count > 0
    }
}
