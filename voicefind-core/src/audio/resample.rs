//! Whole-buffer sample-rate conversion using a rubato `FastFixedIn` resampler.
//!
//! Decoded files commonly arrive at 44.1 or 48 kHz while the classifier
//! expects 16 kHz mono f32. Unlike a streaming capture path, the full
//! recording is available up front, so the buffer is converted in one pass:
//! fixed-size input blocks fed through rubato, with a zero-padded final
//! block so the tail of the recording is flushed rather than truncated.
//!
//! When the buffer is already at the target rate this is a no-op.

use rubato::{FastFixedIn, PolynomialDegree, Resampler};

use crate::audio::buffer::AudioBuffer;
use crate::error::{Result, VoiceFindError};

/// Input frames per rubato call.
const CHUNK_SIZE: usize = 1024;

/// Convert `buffer` to `target_rate`, returning a new buffer.
///
/// # Errors
/// `VoiceFindError::Resample` if rubato fails to initialise or process.
pub fn resample(buffer: AudioBuffer, target_rate: u32) -> Result<AudioBuffer> {
    if buffer.is_empty() {
        return Ok(AudioBuffer::new(Vec::new(), target_rate));
    }
    if buffer.sample_rate == target_rate {
        return Ok(buffer);
    }

    let ratio = target_rate as f64 / buffer.sample_rate as f64;

    let mut resampler = FastFixedIn::<f32>::new(
        ratio,
        1.0, // fixed ratio — no dynamic adjustment
        PolynomialDegree::Cubic,
        CHUNK_SIZE,
        1, // mono
    )
    .map_err(|e| VoiceFindError::Resample(format!("resampler init: {e}")))?;

    let expected_out = (buffer.samples.len() as f64 * ratio).round() as usize;
    let max_out = resampler.output_frames_max();
    let mut output_block = vec![vec![0f32; max_out]; 1];
    let mut converted: Vec<f32> = Vec::with_capacity(expected_out + max_out);

    let mut chunk = vec![0f32; CHUNK_SIZE];
    let mut offset = 0usize;
    while offset < buffer.samples.len() {
        let take = CHUNK_SIZE.min(buffer.samples.len() - offset);
        chunk[..take].copy_from_slice(&buffer.samples[offset..offset + take]);
        // Zero-pad the final partial block; the excess is trimmed below.
        chunk[take..].fill(0.0);

        let (_consumed, produced) = resampler
            .process_into_buffer(&[chunk.as_slice()], &mut output_block, None)
            .map_err(|e| VoiceFindError::Resample(format!("resampler process: {e}")))?;
        converted.extend_from_slice(&output_block[0][..produced]);

        offset += take;
    }

    // Trim to the ideal output length so downstream duration arithmetic
    // (windows, edge margins) stays exact.
    converted.truncate(expected_out);

    Ok(AudioBuffer::new(converted, target_rate))
}
