//! Windowed scan — drives the classifier efficiently across the recording.
//!
//! The recording is partitioned into overlapping fixed-duration windows.
//! Each window passes through the two cheap admission gates first; only
//! admitted windows reach the classifier. De-duplication of candidates
//! that the overlap scheme produces twice is not done here — that is the
//! consolidator's job, and it works on absolute timestamps.

use tracing::{debug, trace};

use super::{DetectorConfig, VoiceSegment};
use crate::audio::buffer::AudioBuffer;
use crate::classify::{ClassifierHandle, SpeechRange};
use crate::error::Result;
use crate::gate::{has_sufficient_energy, has_voice_characteristics};

/// Scan the full buffer, returning every raw candidate segment (absolute
/// time, not yet de-duplicated) and a per-window voice-detected flag.
pub fn scan_windows(
    config: &DetectorConfig,
    classifier: &ClassifierHandle,
    buffer: &AudioBuffer,
) -> Result<(Vec<VoiceSegment>, Vec<bool>)> {
    let sample_rate = buffer.sample_rate;
    let (samples_per_window, step) = window_layout(config, sample_rate);
    let total_samples = buffer.samples.len();

    let mut candidates: Vec<VoiceSegment> = Vec::new();
    let mut voice_flags: Vec<bool> = Vec::new();

    let mut start_sample = 0usize;
    let mut window_index = 0usize;

    while start_sample < total_samples {
        let end_sample = (start_sample + samples_per_window).min(total_samples);
        let window = &buffer.samples[start_sample..end_sample];

        let admitted = has_sufficient_energy(window, sample_rate, config.energy_threshold_ratio)
            && has_voice_characteristics(window, sample_rate);

        let mut voice_detected = false;
        if admitted {
            let ranges = classify_with_backoff(classifier, window, sample_rate, config)?;

            let window_start_secs = start_sample as f64 / sample_rate as f64;
            for range in ranges {
                if range.duration_secs(sample_rate) < config.min_segment_duration {
                    continue;
                }
                let start = window_start_secs + range.start_sample as f64 / sample_rate as f64;
                let end = window_start_secs + range.end_sample as f64 / sample_rate as f64;
                candidates.push(VoiceSegment::new(start, end, window_index));
                voice_detected = true;
            }
        } else {
            trace!(window_index, "window rejected by admission gates");
        }

        voice_flags.push(voice_detected);
        start_sample += step;
        window_index += 1;
    }

    Ok((candidates, voice_flags))
}

/// Window length and hop in samples. The hop is clamped to at least one
/// sample so a pathological overlap setting cannot stall the scan.
fn window_layout(config: &DetectorConfig, sample_rate: u32) -> (usize, usize) {
    let samples_per_window = (config.window_duration * sample_rate as f64) as usize;
    let overlap_samples = (samples_per_window as f64 * config.window_overlap) as usize;
    let step = samples_per_window.saturating_sub(overlap_samples).max(1);
    (samples_per_window, step)
}

/// Try the sensitivity ladder in order until a tier yields candidates.
///
/// An empty result at every tier is a legitimate "no speech here"; a
/// classifier error at any tier aborts the run.
fn classify_with_backoff(
    classifier: &ClassifierHandle,
    window: &[f32],
    sample_rate: u32,
    config: &DetectorConfig,
) -> Result<Vec<SpeechRange>> {
    let mut guard = classifier.0.lock();
    for (tier, &threshold) in config.classifier_thresholds.iter().enumerate() {
        let ranges = guard.speech_ranges(window, sample_rate, threshold)?;
        if !ranges.is_empty() {
            if tier > 0 {
                debug!(tier, threshold, "reduced-threshold tier found speech");
            }
            return Ok(ranges);
        }
    }
    Ok(Vec::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use parking_lot::Mutex;

    use crate::classify::SpeechClassifier;

    /// Returns scripted ranges per call and records the thresholds used.
    struct ScriptedClassifier {
        per_call: Vec<Vec<SpeechRange>>,
        call: usize,
        thresholds_seen: Arc<Mutex<Vec<f32>>>,
        fail: bool,
    }

    impl ScriptedClassifier {
        fn new(per_call: Vec<Vec<SpeechRange>>) -> (Self, Arc<Mutex<Vec<f32>>>) {
            let thresholds_seen = Arc::new(Mutex::new(Vec::new()));
            (
                Self {
                    per_call,
                    call: 0,
                    thresholds_seen: Arc::clone(&thresholds_seen),
                    fail: false,
                },
                thresholds_seen,
            )
        }
    }

    impl SpeechClassifier for ScriptedClassifier {
        fn speech_ranges(
            &mut self,
            _samples: &[f32],
            _sample_rate: u32,
            threshold: f32,
        ) -> Result<Vec<SpeechRange>> {
            if self.fail {
                return Err(crate::error::VoiceFindError::Classifier(
                    "intentional test failure".into(),
                ));
            }
            self.thresholds_seen.lock().push(threshold);
            let ranges = self.per_call.get(self.call).cloned().unwrap_or_default();
            self.call += 1;
            Ok(ranges)
        }

        fn reset(&mut self) {}
    }

    const SR: u32 = 16_000;

    fn speechy_buffer(secs: f64) -> AudioBuffer {
        // 150 Hz tone: passes both the energy and the spectral gate.
        let n = (secs * SR as f64) as usize;
        let samples = (0..n)
            .map(|i| (i as f32 * 150.0 * 2.0 * std::f32::consts::PI / SR as f32).sin() * 0.5)
            .collect();
        AudioBuffer::new(samples, SR)
    }

    #[test]
    fn window_layout_with_half_overlap() {
        let config = DetectorConfig::default();
        let (window, step) = window_layout(&config, SR);
        assert_eq!(window, 48_000); // 3 s
        assert_eq!(step, 24_000); // 1.5 s hop
    }

    #[test]
    fn silent_buffer_never_reaches_the_classifier() {
        let buffer = AudioBuffer::new(vec![0.0; SR as usize * 6], SR);
        let (scripted, thresholds_seen) = ScriptedClassifier::new(vec![]);
        let handle = ClassifierHandle::new(scripted);
        let config = DetectorConfig::default();

        let (candidates, flags) = scan_windows(&config, &handle, &buffer).unwrap();
        assert!(candidates.is_empty());
        assert!(flags.iter().all(|&v| !v));
        assert!(thresholds_seen.lock().is_empty());
    }

    #[test]
    fn candidates_are_translated_to_absolute_time() {
        // One full window (0–3 s) plus a clipped second window (1.5–3 s).
        let buffer = speechy_buffer(3.0);
        let (scripted, _) = ScriptedClassifier::new(vec![
            // Window 0: speech from sample 16000 to 32000 (1.0–2.0 s).
            vec![SpeechRange {
                start_sample: 16_000,
                end_sample: 32_000,
            }],
            // Window 1: nothing at either tier.
            vec![],
            vec![],
        ]);
        let handle = ClassifierHandle::new(scripted);
        let config = DetectorConfig::default();

        let (candidates, flags) = scan_windows(&config, &handle, &buffer).unwrap();
        assert_eq!(candidates.len(), 1);
        assert!((candidates[0].start - 1.0).abs() < 1e-9);
        assert!((candidates[0].end - 2.0).abs() < 1e-9);
        assert!((candidates[0].duration - 1.0).abs() < 1e-9);
        assert_eq!(candidates[0].window_index, 0);
        assert_eq!(flags, vec![true, false]);
    }

    #[test]
    fn short_ranges_are_dropped() {
        let buffer = speechy_buffer(3.0);
        // 0.1 s ranges, below the 0.2 s minimum, for both windows.
        let (scripted, _) = ScriptedClassifier::new(vec![
            vec![SpeechRange {
                start_sample: 0,
                end_sample: 1_600,
            }];
            2
        ]);
        let handle = ClassifierHandle::new(scripted);
        let config = DetectorConfig::default();

        let (candidates, flags) = scan_windows(&config, &handle, &buffer).unwrap();
        assert!(candidates.is_empty());
        assert_eq!(flags, vec![false, false]);
    }

    #[test]
    fn backoff_walks_the_threshold_ladder_in_order() {
        let buffer = speechy_buffer(3.0);
        let (scripted, thresholds_seen) = ScriptedClassifier::new(vec![
            vec![], // window 0, primary tier: nothing
            vec![SpeechRange {
                start_sample: 0,
                end_sample: 8_000,
            }], // window 0, reduced tier: speech
            vec![], // window 1, primary tier
            vec![], // window 1, reduced tier
        ]);
        let handle = ClassifierHandle::new(scripted);
        let config = DetectorConfig::default();

        let (candidates, _) = scan_windows(&config, &handle, &buffer).unwrap();
        assert_eq!(candidates.len(), 1);
        assert!((candidates[0].start - 0.0).abs() < 1e-9);
        assert!((candidates[0].end - 0.5).abs() < 1e-9);

        let seen = thresholds_seen.lock();
        assert_eq!(seen.len(), 4);
        assert!((seen[0] - 0.70).abs() < 1e-6);
        assert!((seen[1] - 0.56).abs() < 1e-6);
    }

    #[test]
    fn classifier_error_aborts_the_scan() {
        let buffer = speechy_buffer(3.0);
        let (mut scripted, _) = ScriptedClassifier::new(vec![]);
        scripted.fail = true;
        let handle = ClassifierHandle::new(scripted);
        let config = DetectorConfig::default();

        let err = scan_windows(&config, &handle, &buffer).unwrap_err();
        assert!(matches!(err, crate::error::VoiceFindError::Classifier(_)));
    }
}
