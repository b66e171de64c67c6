//! Typed PCM buffer passed from the decoder to the detection pipeline.

/// A complete mono recording at a known sample rate.
///
/// Decoded once per run and owned by the pipeline for its duration.
#[derive(Debug, Clone)]
pub struct AudioBuffer {
    /// Mono f32 samples in [-1.0, 1.0].
    pub samples: Vec<f32>,
    /// Sample rate in Hz (e.g. 16000, 44100, 48000).
    pub sample_rate: u32,
}

impl AudioBuffer {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Returns the duration of this recording in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Returns true if the recording contains no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
