//! End-to-end pipeline scenarios with a deterministic fake classifier.
//!
//! The fake marks any 512-sample step whose mean absolute amplitude is
//! elevated as voiced, so scenarios are scripted purely by where tone
//! bursts are placed in the buffer. Silent windows never even reach it —
//! the admission gates reject them first.

use voicefind_core::{
    AudioBuffer, ClassifierHandle, DetectorConfig, SpeechClassifier, SpeechRange, VoiceDetector,
};

const SR: u32 = 16_000;
const STEP: usize = 512;

/// Amplitude-threshold classifier: voiced wherever the signal is loud.
struct AmplitudeClassifier;

impl SpeechClassifier for AmplitudeClassifier {
    fn speech_ranges(
        &mut self,
        samples: &[f32],
        _sample_rate: u32,
        _threshold: f32,
    ) -> voicefind_core::error::Result<Vec<SpeechRange>> {
        let mut ranges = Vec::new();
        let mut open_start: Option<usize> = None;

        for (i, step) in samples.chunks(STEP).enumerate() {
            let level = step.iter().map(|s| s.abs()).sum::<f32>() / step.len() as f32;
            let voiced = level > 0.05;
            match (voiced, open_start) {
                (true, None) => open_start = Some(i * STEP),
                (false, Some(start)) => {
                    ranges.push(SpeechRange {
                        start_sample: start,
                        end_sample: (i * STEP).min(samples.len()),
                    });
                    open_start = None;
                }
                _ => {}
            }
        }
        if let Some(start) = open_start {
            ranges.push(SpeechRange {
                start_sample: start,
                end_sample: samples.len(),
            });
        }
        Ok(ranges)
    }

    fn reset(&mut self) {}
}

/// A silent buffer of `secs` seconds with 150 Hz tone bursts at the given
/// (start, end) second offsets.
fn buffer_with_bursts(secs: f64, bursts: &[(f64, f64)]) -> AudioBuffer {
    let total = (secs * SR as f64) as usize;
    let mut samples = vec![0.0f32; total];
    for &(start, end) in bursts {
        let from = (start * SR as f64) as usize;
        let to = ((end * SR as f64) as usize).min(total);
        for (i, sample) in samples[from..to].iter_mut().enumerate() {
            *sample = (i as f32 * 150.0 * 2.0 * std::f32::consts::PI / SR as f32).sin() * 0.5;
        }
    }
    AudioBuffer::new(samples, SR)
}

fn detector() -> VoiceDetector {
    VoiceDetector::new(
        DetectorConfig::default(),
        ClassifierHandle::new(AmplitudeClassifier),
    )
}

#[test]
fn fully_silent_recording_yields_zero_report() {
    let buffer = buffer_with_bursts(10.0, &[]);
    let report = detector().analyze(&buffer).unwrap();

    assert_eq!(report.first_voice_second, 0.0);
    assert_eq!(report.total_voice_duration, 0.0);
    assert_eq!(report.voice_segments_count, 0);
    assert!((report.audio_duration - 10.0).abs() < 1e-9);
}

#[test]
fn single_clean_burst_is_located() {
    // One 2 s burst at t=3 → one segment starting ≈ 3.0.
    let buffer = buffer_with_bursts(10.0, &[(3.0, 5.0)]);
    let report = detector().analyze(&buffer).unwrap();

    assert_eq!(report.voice_segments_count, 1);
    assert!(
        (report.first_voice_second - 3.0).abs() < 0.1,
        "first_voice_second={}",
        report.first_voice_second
    );
    assert!(
        (report.total_voice_duration - 2.0).abs() < 0.15,
        "total_voice_duration={}",
        report.total_voice_duration
    );
    assert!((report.audio_duration - 10.0).abs() < 1e-9);
}

#[test]
fn close_bursts_merge_into_one_segment() {
    // Gap of 0.1 s between bursts, below the 0.3 s merge tolerance.
    let buffer = buffer_with_bursts(10.0, &[(1.0, 1.5), (1.6, 2.0)]);
    let report = detector().analyze(&buffer).unwrap();

    assert_eq!(report.voice_segments_count, 1);
    assert!(
        (report.first_voice_second - 1.0).abs() < 0.1,
        "first_voice_second={}",
        report.first_voice_second
    );
    // The merged segment spans the gap: ≈ [1.0, 2.0].
    assert!(
        (report.total_voice_duration - 1.0).abs() < 0.15,
        "total_voice_duration={}",
        report.total_voice_duration
    );
}

#[test]
fn distant_bursts_stay_separate_segments() {
    let buffer = buffer_with_bursts(12.0, &[(2.0, 3.0), (8.0, 9.0)]);
    let report = detector().analyze(&buffer).unwrap();

    assert_eq!(report.voice_segments_count, 2);
    assert!((report.first_voice_second - 2.0).abs() < 0.1);
    assert!((report.total_voice_duration - 2.0).abs() < 0.2);
}

#[test]
fn sub_floor_blip_is_suppressed() {
    // A 0.3 s blip survives every consolidation stage but falls below the
    // 0.8 s acceptance floor.
    let buffer = buffer_with_bursts(10.0, &[(4.0, 4.3)]);
    let report = detector().analyze(&buffer).unwrap();

    assert_eq!(report.voice_segments_count, 0);
    assert_eq!(report.first_voice_second, 0.0);
    assert_eq!(report.total_voice_duration, 0.0);
    assert!((report.audio_duration - 10.0).abs() < 1e-9);
}

#[test]
fn edge_touching_burst_is_treated_as_artifact() {
    // Voice flush against the recording start is dropped by validation.
    let buffer = buffer_with_bursts(10.0, &[(0.0, 0.9)]);
    let report = detector().analyze(&buffer).unwrap();

    assert_eq!(report.voice_segments_count, 0);
}

#[test]
fn analysis_is_deterministic() {
    let buffer = buffer_with_bursts(10.0, &[(3.0, 5.0), (7.0, 7.6)]);
    let det = detector();

    let first = det.analyze(&buffer).unwrap();
    let second = det.analyze(&buffer).unwrap();

    let a = serde_json::to_string(&first).unwrap();
    let b = serde_json::to_string(&second).unwrap();
    assert_eq!(a, b);
}
