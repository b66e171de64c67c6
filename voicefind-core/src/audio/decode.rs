//! Audio file decoding via symphonia.
//!
//! Accepts any container/codec symphonia can probe (WAV, MP3, FLAC, OGG,
//! AAC, …), downmixes to mono by channel averaging, and returns samples at
//! the file's native rate. Resampling to the detector's target rate is a
//! separate step (`audio::resample`).

use std::fs::File;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::debug;

use crate::audio::buffer::AudioBuffer;
use crate::error::{Result, VoiceFindError};

/// Decode `path` to a mono f32 `AudioBuffer` at the file's native rate.
///
/// # Errors
/// `VoiceFindError::Decode` for unreadable, corrupt, or unsupported input.
pub fn decode_file(path: impl AsRef<Path>) -> Result<AudioBuffer> {
    let path = path.as_ref();
    let file = File::open(path)
        .map_err(|e| VoiceFindError::Decode(format!("open {}: {e}", path.display())))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| VoiceFindError::Decode(format!("probe {}: {e}", path.display())))?;

    let mut format = probed.format;
    let track = format
        .default_track()
        .ok_or_else(|| VoiceFindError::Decode("no default audio track".into()))?;
    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| VoiceFindError::Decode("missing sample rate".into()))?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| VoiceFindError::Decode(format!("codec init: {e}")))?;

    let mut mono: Vec<f32> = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(err))
                if err.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(err) => return Err(VoiceFindError::Decode(format!("read packet: {err}"))),
        };
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            // A corrupt packet mid-stream is fatal: the detector needs the
            // whole recording with correct timing, not a gappy one.
            Err(err) => return Err(VoiceFindError::Decode(format!("decode packet: {err}"))),
        };

        let spec = *decoded.spec();
        let channels = spec.channels.count();
        let frames = decoded.frames() as u64;
        let mut sample_buf = SampleBuffer::<f32>::new(frames, spec);
        sample_buf.copy_interleaved_ref(decoded);
        let samples = sample_buf.samples();

        if channels <= 1 {
            mono.extend_from_slice(samples);
        } else {
            for frame in samples.chunks_exact(channels) {
                mono.push(frame.iter().sum::<f32>() / channels as f32);
            }
        }
    }

    debug!(
        path = %path.display(),
        sample_rate,
        samples = mono.len(),
        "decoded audio file"
    );

    Ok(AudioBuffer::new(mono, sample_rate))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_wav(path: &Path, channels: u16, sample_rate: u32, frames: usize) {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for i in 0..frames {
            let phase = i as f32 * 220.0 * 2.0 * std::f32::consts::PI / sample_rate as f32;
            let value = (phase.sin() * 0.4 * i16::MAX as f32) as i16;
            for _ in 0..channels {
                writer.write_sample(value).unwrap();
            }
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn decodes_mono_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        write_wav(&path, 1, 16_000, 16_000);

        let buf = decode_file(&path).unwrap();
        assert_eq!(buf.sample_rate, 16_000);
        assert_eq!(buf.samples.len(), 16_000);
        assert!((buf.duration_secs() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn downmixes_stereo_to_mono() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        write_wav(&path, 2, 44_100, 4_410);

        let buf = decode_file(&path).unwrap();
        assert_eq!(buf.sample_rate, 44_100);
        assert_eq!(buf.samples.len(), 4_410);
    }

    #[test]
    fn missing_file_is_a_decode_error() {
        let err = decode_file("/nonexistent/clip.wav").unwrap_err();
        assert!(matches!(err, VoiceFindError::Decode(_)));
    }

    #[test]
    fn garbage_file_is_a_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.mp3");
        std::fs::write(&path, b"this is not audio at all").unwrap();
        let err = decode_file(&path).unwrap_err();
        assert!(matches!(err, VoiceFindError::Decode(_)));
    }
}
