//! Audio subsystem: device output, streaming decode, rate conversion, and
//! channel remapping.

pub mod decoder;
pub mod output;
pub mod remap;
pub mod resampler;

pub use decoder::TrackDecoder;
pub use output::AudioOutput;
