//! Shared test fixtures
//!
//! Real, decodable WAV files generated on the fly so playback tests exercise
//! the actual decode path without shipping binary fixtures.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

/// Write a 440 Hz sine WAV with the given shape.
pub fn write_sine_wav(
    path: &Path,
    frames: usize,
    sample_rate: u32,
    channels: u16,
    amplitude: f32,
) {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for n in 0..frames {
        let t = n as f32 / sample_rate as f32;
        let sample = (2.0 * std::f32::consts::PI * 440.0 * t).sin() * amplitude;
        for _ in 0..channels {
            writer
                .write_sample((sample * i16::MAX as f32) as i16)
                .unwrap();
        }
    }
    writer.finalize().unwrap();
}

/// Create `count` short stereo tracks named `t01.wav`, `t02.wav`, ...
pub fn fixture_tracks(dir: &Path, count: usize) -> Vec<PathBuf> {
    (1..=count)
        .map(|n| {
            let path = dir.join(format!("t{:02}.wav", n));
            write_sine_wav(&path, 512, 44100, 2, 0.5);
            path
        })
        .collect()
}

/// Sum of squares over a sample region; nonzero means audible content.
pub fn energy(samples: &[f32]) -> f32 {
    samples.iter().map(|s| s * s).sum()
}
