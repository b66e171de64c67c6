//! Energy admission gate.
//!
//! ## Algorithm
//!
//! 1. Slice the window into 25 ms frames at a 10 ms hop.
//! 2. Per frame, compute the mean absolute amplitude.
//! 3. Reference level = 75th percentile of the frame energies. A percentile
//!    is used instead of the maximum so a single click or pop does not
//!    inflate the reference and mask quiet speech.
//! 4. Pass when the mean of all frame energies exceeds
//!    `threshold_ratio × reference`.

/// Frame length in seconds (25 ms).
const FRAME_SECS: f64 = 0.025;
/// Hop between frame starts in seconds (10 ms).
const HOP_SECS: f64 = 0.010;
/// Percentile used as the noise-robust reference level.
const REFERENCE_PERCENTILE: f64 = 75.0;

/// Returns true when the window carries enough broadband energy to be
/// worth classifying. Windows too short for a single full frame are
/// rejected outright.
pub fn has_sufficient_energy(samples: &[f32], sample_rate: u32, threshold_ratio: f32) -> bool {
    let frame_len = (FRAME_SECS * sample_rate as f64) as usize;
    let hop_len = (HOP_SECS * sample_rate as f64) as usize;
    if frame_len == 0 || hop_len == 0 {
        return false;
    }

    let Some(last_start) = samples.len().checked_sub(frame_len) else {
        return false;
    };

    let mut energies: Vec<f32> = Vec::with_capacity(last_start / hop_len + 1);
    let mut start = 0usize;
    while start < last_start {
        let frame = &samples[start..start + frame_len];
        let energy = frame.iter().map(|s| s.abs()).sum::<f32>() / frame_len as f32;
        energies.push(energy);
        start += hop_len;
    }

    if energies.is_empty() {
        return false;
    }

    let mean = energies.iter().sum::<f32>() / energies.len() as f32;
    let reference = percentile(&mut energies, REFERENCE_PERCENTILE);
    mean > reference * threshold_ratio
}

/// Linear-interpolation percentile over an unsorted slice (sorts in place).
fn percentile(values: &mut [f32], p: f64) -> f32 {
    debug_assert!(!values.is_empty());
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let rank = (values.len() - 1) as f64 * p / 100.0;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        return values[lower];
    }
    let frac = (rank - lower as f64) as f32;
    values[lower] + (values[upper] - values[lower]) * frac
}
