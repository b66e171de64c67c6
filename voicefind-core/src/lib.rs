//! # voicefind-core
//!
//! Voice onset detection engine: given a decoded recording, find where
//! speech first occurs, how much of it there is, and in how many segments.
//!
//! ## Architecture
//!
//! ```text
//! audio file → decode → resample(16 kHz) → window scan
//!                                              │
//!                              energy gate ∧ spectral gate
//!                                              │
//!                              SpeechClassifier::speech_ranges
//!                                              │
//!                       validate → group-by-proximity → merge-close
//!                                              │
//!                                        VoiceReport
//! ```
//!
//! The two cheap gates decide whether the expensive neural classifier is
//! invoked on a window at all. The whole pipeline is synchronous and
//! batch-oriented: one buffer in, one report out.

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod audio;
pub mod classify;
pub mod detector;
pub mod error;
pub mod gate;
pub mod report;

// Convenience re-exports for downstream crates
pub use audio::buffer::AudioBuffer;
pub use classify::{ClassifierHandle, SpeechClassifier, SpeechRange};
pub use detector::{DetectorConfig, VoiceDetector};
pub use error::VoiceFindError;
pub use report::VoiceReport;

#[cfg(feature = "onnx")]
pub use classify::SileroClassifier;
