//! Speech classifier abstraction.
//!
//! The `SpeechClassifier` trait decouples the windowed detector from any
//! specific backend (Silero ONNX, or a scripted fake in tests).
//!
//! `&mut self` on `speech_ranges` intentionally expresses that classifiers
//! are stateful — RNN hidden states carry across the sub-windows of one
//! call. All mutation is serialised through `ClassifierHandle`'s
//! `parking_lot::Mutex`.

#[cfg(feature = "onnx")]
pub mod silero;

#[cfg(feature = "onnx")]
pub use silero::SileroClassifier;

use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::Result;

/// A voiced sub-range inside one analysis window, in samples relative to
/// the window start. Invariant: `end_sample > start_sample`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpeechRange {
    pub start_sample: usize,
    pub end_sample: usize,
}

impl SpeechRange {
    /// Length of the range in seconds at the given rate.
    pub fn duration_secs(&self, sample_rate: u32) -> f64 {
        (self.end_sample - self.start_sample) as f64 / sample_rate as f64
    }
}

/// Contract for voice-activity classification backends.
///
/// The backend is opaque to the detector: any algorithm that maps a PCM
/// window to voiced sub-ranges at a given sensitivity threshold fits.
pub trait SpeechClassifier: Send + 'static {
    /// Classify one PCM window, returning the voiced sub-ranges found at
    /// the given probability `threshold` (higher = stricter).
    ///
    /// # Errors
    /// Backend failures (session errors, shape mismatches) are fatal for
    /// the whole run — the detector never retries a failed invocation.
    fn speech_ranges(
        &mut self,
        samples: &[f32],
        sample_rate: u32,
        threshold: f32,
    ) -> Result<Vec<SpeechRange>>;

    /// Reset internal state (e.g. RNN hidden states) between windows.
    fn reset(&mut self);
}

/// Thread-safe reference-counted handle to any `SpeechClassifier`.
///
/// Models are expensive to load; the caller constructs one handle per
/// process and passes it into every `VoiceDetector` so repeated runs reuse
/// the same session. Uses `parking_lot::Mutex` for non-poisoning locks.
#[derive(Clone)]
pub struct ClassifierHandle(pub Arc<Mutex<dyn SpeechClassifier>>);

impl ClassifierHandle {
    /// Wrap any `SpeechClassifier` in a `ClassifierHandle`.
    pub fn new<C: SpeechClassifier>(classifier: C) -> Self {
        Self(Arc::new(Mutex::new(classifier)))
    }
}

impl std::fmt::Debug for ClassifierHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassifierHandle").finish_non_exhaustive()
    }
}
