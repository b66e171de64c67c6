//! Silero VAD neural speech classifier.
//!
//! Wraps the official Silero VAD ONNX model published at
//! <https://github.com/snakers4/silero-vad>.
//!
//! Supports both the v3/v4 LSTM interface (separate `h`/`c` tensors) and
//! the v5 GRU interface (single `state` tensor); the variant is detected
//! from the session's input/output names at load time.
//!
//! One `speech_ranges` call scans the window in 512-sample steps (32 ms at
//! 16 kHz), collecting a speech probability per step, then folds the
//! probability track into contiguous voiced ranges: a range opens at the
//! first step at or above the threshold and closes only after a short run
//! of sub-threshold steps, so intra-word dips do not split a phrase.

use std::path::{Path, PathBuf};

use ndarray::{Array1, Array2, Array3};
use ort::session::builder::SessionBuilder;
use ort::session::SessionInputValue;
use ort::value::Value;
use tracing::{debug, info};

use super::{SpeechClassifier, SpeechRange};
use crate::error::{Result, VoiceFindError};

/// Step size expected by Silero VAD (samples at 16 kHz = 32 ms).
const STEP: usize = 512;
/// v3/v4 LSTM state size: 2 layers × 1 batch × 64 units (each of h and c).
const LSTM_SIZE: usize = 128;
/// v5 GRU state size: 2 layers × 1 batch × 128 units.
const GRU_STATE_SIZE: usize = 256;
/// Sub-threshold steps tolerated inside an open range before it closes
/// (3 × 32 ms ≈ 100 ms of hangover).
const HANGOVER_STEPS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SileroIoMode {
    /// v3/v4 LSTM: separate `h` and `c` state tensors.
    StatefulLstm,
    /// v5 GRU: single `state` tensor, output `stateN`.
    StatefulGru,
}

/// Neural speech classifier using the Silero VAD ONNX model.
pub struct SileroClassifier {
    session: ort::session::Session,
    io_mode: SileroIoMode,
    input_name: String,
    sr_name: Option<String>,
    output_name: String,
    // v3/v4 LSTM state names
    h_name: Option<String>,
    c_name: Option<String>,
    hn_name: Option<String>,
    cn_name: Option<String>,
    // v5 GRU state names
    state_name: Option<String>,
    state_out_name: Option<String>,
    // state buffers
    h: Vec<f32>,
    c: Vec<f32>,
    state: Vec<f32>,
}

impl SileroClassifier {
    /// Load the Silero VAD ONNX model from `path`.
    ///
    /// Loading is expensive; do it once per process and share the result
    /// through a `ClassifierHandle`.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(VoiceFindError::ModelNotFound {
                path: path.to_path_buf(),
            });
        }

        let size_mb = std::fs::metadata(path)
            .map(|m| m.len() as f64 / 1_048_576.0)
            .unwrap_or(0.0);

        let session = SessionBuilder::new()
            .map_err(|e| VoiceFindError::OnnxSession(e.to_string()))?
            .commit_from_file(path)
            .map_err(|e| VoiceFindError::OnnxSession(e.to_string()))?;

        let input_names: Vec<String> = session
            .inputs()
            .iter()
            .map(|outlet| outlet.name().to_string())
            .collect();
        let output_names: Vec<String> = session
            .outputs()
            .iter()
            .map(|outlet| outlet.name().to_string())
            .collect();

        let input_name = resolve_name(&input_names, &["input", "audio", "x"])
            .or_else(|| input_names.first().cloned())
            .ok_or_else(|| VoiceFindError::OnnxSession("Silero model has no inputs".into()))?;
        let sr_name = resolve_name(&input_names, &["sr", "sample_rate"]);

        let h_name = resolve_name(&input_names, &["h", "state_h"]);
        let c_name = resolve_name(&input_names, &["c", "state_c"]);
        let state_name = resolve_name(&input_names, &["state", "h_0", "hidden"]);

        let output_name = resolve_name(&output_names, &["output", "speech_prob", "prob"])
            .or_else(|| output_names.first().cloned())
            .ok_or_else(|| VoiceFindError::OnnxSession("Silero model has no outputs".into()))?;
        let hn_name = resolve_name(&output_names, &["hn", "state_hn", "h_out"]);
        let cn_name = resolve_name(&output_names, &["cn", "state_cn", "c_out"]);
        let state_out_name =
            resolve_name(&output_names, &["stateN", "state_out", "h_0_out", "hn_out"]);

        let io_mode =
            if h_name.is_some() && c_name.is_some() && hn_name.is_some() && cn_name.is_some() {
                SileroIoMode::StatefulLstm
            } else if state_name.is_some() && state_out_name.is_some() {
                SileroIoMode::StatefulGru
            } else {
                return Err(VoiceFindError::OnnxSession(format!(
                    "unrecognised Silero model interface (inputs {input_names:?}, outputs {output_names:?})"
                )));
            };

        info!(
            path = %path.display(),
            size_mb = format_args!("{size_mb:.2}"),
            ?io_mode,
            "Silero classifier loaded"
        );

        Ok(Self {
            session,
            io_mode,
            input_name,
            sr_name,
            output_name,
            h_name,
            c_name,
            hn_name,
            cn_name,
            state_name,
            state_out_name,
            h: vec![0.0; LSTM_SIZE],
            c: vec![0.0; LSTM_SIZE],
            state: vec![0.0; GRU_STATE_SIZE],
        })
    }

    /// Default path for the Silero VAD model file.
    ///
    /// `VOICEFIND_SILERO_MODEL` overrides; otherwise a platform data dir.
    pub fn default_model_path() -> PathBuf {
        if let Some(path) = std::env::var_os("VOICEFIND_SILERO_MODEL") {
            return PathBuf::from(path);
        }
        default_models_dir().join("silero_vad.onnx")
    }

    /// Run one 512-sample step through the model; update the recurrent
    /// state; return the speech probability.
    fn run_step(&mut self, step: &[f32], sample_rate: u32) -> Result<f32> {
        debug_assert_eq!(step.len(), STEP);

        let input_arr = Array2::<f32>::from_shape_vec((1, STEP), step.to_vec())
            .map_err(|e| VoiceFindError::OnnxSession(e.to_string()))?;
        let input_val = Value::from_array(input_arr)
            .map_err(|e: ort::Error| VoiceFindError::OnnxSession(e.to_string()))?;

        let mut input_values: Vec<(String, SessionInputValue<'_>)> =
            vec![(self.input_name.clone(), input_val.into())];

        if let Some(sr_name) = &self.sr_name {
            let sr_arr = Array1::<i64>::from_elem(1, sample_rate as i64);
            let sr_val = Value::from_array(sr_arr)
                .map_err(|e: ort::Error| VoiceFindError::OnnxSession(e.to_string()))?;
            input_values.push((sr_name.clone(), sr_val.into()));
        }

        match self.io_mode {
            SileroIoMode::StatefulLstm => {
                let h_arr = Array3::<f32>::from_shape_vec((2, 1, 64), self.h.clone())
                    .map_err(|e| VoiceFindError::OnnxSession(e.to_string()))?;
                let c_arr = Array3::<f32>::from_shape_vec((2, 1, 64), self.c.clone())
                    .map_err(|e| VoiceFindError::OnnxSession(e.to_string()))?;
                let h_val = Value::from_array(h_arr)
                    .map_err(|e: ort::Error| VoiceFindError::OnnxSession(e.to_string()))?;
                let c_val = Value::from_array(c_arr)
                    .map_err(|e: ort::Error| VoiceFindError::OnnxSession(e.to_string()))?;
                if let Some(h_name) = &self.h_name {
                    input_values.push((h_name.clone(), h_val.into()));
                }
                if let Some(c_name) = &self.c_name {
                    input_values.push((c_name.clone(), c_val.into()));
                }
            }
            SileroIoMode::StatefulGru => {
                let state_arr = Array3::<f32>::from_shape_vec((2, 1, 128), self.state.clone())
                    .map_err(|e| VoiceFindError::OnnxSession(e.to_string()))?;
                let state_val = Value::from_array(state_arr)
                    .map_err(|e: ort::Error| VoiceFindError::OnnxSession(e.to_string()))?;
                if let Some(state_name) = &self.state_name {
                    input_values.push((state_name.clone(), state_val.into()));
                }
            }
        }

        let outputs = self
            .session
            .run(input_values)
            .map_err(|e| VoiceFindError::OnnxSession(e.to_string()))?;

        let prob_output = outputs
            .get(self.output_name.as_str())
            .unwrap_or(&outputs[0]);
        let (_, prob_data) = prob_output
            .try_extract_tensor::<f32>()
            .map_err(|e| VoiceFindError::OnnxSession(e.to_string()))?;
        let prob = prob_data.first().copied().unwrap_or(0.0);

        match self.io_mode {
            SileroIoMode::StatefulLstm => {
                if let (Some(hn_name), Some(cn_name)) = (&self.hn_name, &self.cn_name) {
                    let hn_out = outputs.get(hn_name.as_str()).ok_or_else(|| {
                        VoiceFindError::OnnxSession(format!("missing LSTM output {hn_name}"))
                    })?;
                    let cn_out = outputs.get(cn_name.as_str()).ok_or_else(|| {
                        VoiceFindError::OnnxSession(format!("missing LSTM output {cn_name}"))
                    })?;
                    let (_, hn_data) = hn_out
                        .try_extract_tensor::<f32>()
                        .map_err(|e| VoiceFindError::OnnxSession(e.to_string()))?;
                    let (_, cn_data) = cn_out
                        .try_extract_tensor::<f32>()
                        .map_err(|e| VoiceFindError::OnnxSession(e.to_string()))?;
                    self.h = hn_data.to_vec();
                    self.c = cn_data.to_vec();
                }
            }
            SileroIoMode::StatefulGru => {
                if let Some(state_out_name) = &self.state_out_name {
                    let state_out = outputs.get(state_out_name.as_str()).ok_or_else(|| {
                        VoiceFindError::OnnxSession(format!("missing GRU output {state_out_name}"))
                    })?;
                    let (_, state_data) = state_out
                        .try_extract_tensor::<f32>()
                        .map_err(|e| VoiceFindError::OnnxSession(e.to_string()))?;
                    self.state = state_data.to_vec();
                }
            }
        }

        Ok(prob)
    }
}

fn resolve_name(candidates: &[String], preferred: &[&str]) -> Option<String> {
    preferred.iter().find_map(|needle| {
        candidates
            .iter()
            .find(|name| name.eq_ignore_ascii_case(needle))
            .cloned()
    })
}

/// Platform default models directory.
fn default_models_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA")
            .map(|p| PathBuf::from(p).join("Lattice Labs").join("voicefind"))
            .unwrap_or_else(|| PathBuf::from("models"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var_os("XDG_DATA_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".local/share")))
            .map(|base| base.join("voicefind").join("models"))
            .unwrap_or_else(|| PathBuf::from("models"))
    }
}

/// Fold a per-step probability track into contiguous voiced ranges.
///
/// Pure helper so range construction stays testable without a session.
fn ranges_from_probabilities(
    probs: &[f32],
    threshold: f32,
    window_len: usize,
) -> Vec<SpeechRange> {
    let mut ranges = Vec::new();
    let mut open_start: Option<usize> = None;
    let mut last_voiced = 0usize;

    for (i, &prob) in probs.iter().enumerate() {
        if prob >= threshold {
            if open_start.is_none() {
                open_start = Some(i);
            }
            last_voiced = i;
        } else if let Some(start) = open_start {
            if i - last_voiced > HANGOVER_STEPS {
                ranges.push(SpeechRange {
                    start_sample: start * STEP,
                    end_sample: ((last_voiced + 1) * STEP).min(window_len),
                });
                open_start = None;
            }
        }
    }
    if let Some(start) = open_start {
        ranges.push(SpeechRange {
            start_sample: start * STEP,
            end_sample: ((last_voiced + 1) * STEP).min(window_len),
        });
    }
    ranges
}

impl SpeechClassifier for SileroClassifier {
    fn speech_ranges(
        &mut self,
        samples: &[f32],
        sample_rate: u32,
        threshold: f32,
    ) -> Result<Vec<SpeechRange>> {
        // Fresh recurrent state per window: windows are independent inputs.
        self.reset();

        let mut probs = Vec::with_capacity(samples.len() / STEP + 1);
        let mut padded = [0f32; STEP];

        for step in samples.chunks(STEP) {
            let prob = if step.len() == STEP {
                self.run_step(step, sample_rate)?
            } else {
                // Final partial step: zero-pad to the model's input size.
                padded[..step.len()].copy_from_slice(step);
                padded[step.len()..].fill(0.0);
                self.run_step(&padded, sample_rate)?
            };
            probs.push(prob);
        }

        let ranges = ranges_from_probabilities(&probs, threshold, samples.len());
        debug!(
            steps = probs.len(),
            ranges = ranges.len(),
            threshold,
            "silero window classified"
        );
        Ok(ranges)
    }

    fn reset(&mut self) {
        self.h.iter_mut().for_each(|v| *v = 0.0);
        self.c.iter_mut().for_each(|v| *v = 0.0);
        self.state.iter_mut().for_each(|v| *v = 0.0);
    }
}
