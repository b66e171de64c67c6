//! Spectral admission gate.
//!
//! Computes the magnitude spectrum of a window and measures what fraction
//! of the total spectral energy falls inside the voice fundamental band
//! (80–400 Hz). Speech carries a substantial share of its energy there;
//! hiss, hum harmonics, and most broadband noise do not.
//!
//! ## Fail-open
//!
//! When a verdict cannot be computed (empty input, zero or non-finite
//! total energy), the gate passes the window through so the classifier —
//! the authoritative judge — still gets to evaluate it. A false "no voice"
//! from a fragile filter is worse than one wasted classifier call.

use rustfft::{num_complex::Complex32, FftPlanner};

/// Lower edge of the voice fundamental band (Hz, inclusive).
const VOICE_FREQ_MIN: f32 = 80.0;
/// Upper edge of the voice fundamental band (Hz, inclusive).
const VOICE_FREQ_MAX: f32 = 400.0;
/// Minimum share of spectral energy required inside the voice band.
const VOICE_ENERGY_RATIO: f32 = 0.10;

/// Returns true when the window's spectrum looks voice-like, or when the
/// analysis cannot produce a reliable verdict (fail-open).
pub fn has_voice_characteristics(samples: &[f32], sample_rate: u32) -> bool {
    if samples.is_empty() || sample_rate == 0 {
        return true;
    }

    let mut planner = FftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(samples.len());

    let mut spectrum: Vec<Complex32> = samples
        .iter()
        .map(|&s| Complex32::new(s, 0.0))
        .collect();
    fft.process(&mut spectrum);

    // Real input: only the non-negative frequency half carries information.
    let half = samples.len() / 2 + 1;
    let bin_hz = sample_rate as f32 / samples.len() as f32;

    let mut total = 0.0f32;
    let mut in_band = 0.0f32;
    let mut band_bins = 0usize;
    for (i, value) in spectrum[..half].iter().enumerate() {
        let magnitude = value.norm();
        total += magnitude;
        let freq = i as f32 * bin_hz;
        if (VOICE_FREQ_MIN..=VOICE_FREQ_MAX).contains(&freq) {
            in_band += magnitude;
            band_bins += 1;
        }
    }

    if !total.is_finite() || total <= 0.0 {
        // Numerical failure or pure digital silence: no verdict, fail open.
        return true;
    }
    if band_bins == 0 {
        // Spectrum computable but the band holds no bins: nothing voice-like.
        return false;
    }

    in_band / total > VOICE_ENERGY_RATIO
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: u32 = 16_000;

    fn tone(freq: f32, secs: f32) -> Vec<f32> {
        let n = (secs * SR as f32) as usize;
        (0..n)
            .map(|i| (i as f32 * freq * 2.0 * std::f32::consts::PI / SR as f32).sin() * 0.5)
            .collect()
    }

    #[test]
    fn fundamental_band_tone_passes() {
        assert!(has_voice_characteristics(&tone(150.0, 0.5), SR));
    }

    #[test]
    fn band_edges_are_inclusive() {
        assert!(has_voice_characteristics(&tone(80.0, 0.5), SR));
        assert!(has_voice_characteristics(&tone(400.0, 0.5), SR));
    }

    #[test]
    fn high_frequency_tone_is_rejected() {
        assert!(!has_voice_characteristics(&tone(3_000.0, 0.5), SR));
    }

    #[test]
    fn digital_silence_fails_open() {
        // Zero total energy: no verdict possible, pass through.
        assert!(has_voice_characteristics(&vec![0.0f32; 8_000], SR));
    }

    #[test]
    fn empty_input_fails_open() {
        assert!(has_voice_characteristics(&[], SR));
    }

    #[test]
    fn band_without_bins_is_rejected() {
        // 16 samples at 16 kHz → bins at 0, 1000, 2000, … Hz: none inside
        // 80–400 Hz, so there is nothing voice-like to find.
        let samples: Vec<f32> = (0..16).map(|i| if i % 2 == 0 { 0.5 } else { -0.5 }).collect();
        assert!(!has_voice_characteristics(&samples, SR));
    }
}
