//! Audio front end: file decoding and sample-rate conversion.
//!
//! Both are collaborators of the detection core, not part of it: the
//! detector only ever sees a mono f32 `AudioBuffer` at its target rate.

pub mod buffer;
pub mod decode;
pub mod resample;

pub use buffer::AudioBuffer;
pub use decode::decode_file;
pub use resample::resample;
