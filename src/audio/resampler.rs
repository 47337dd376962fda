//! Streaming sample-rate conversion using rubato
//!
//! Converts decoded audio to the output device's sample rate. The converter
//! is fed incrementally as packets decode: input is buffered in planar form
//! until a full fixed-size chunk is available, then processed. At end of
//! stream [`StreamResampler::flush`] drains the remainder.

use crate::error::{Error, Result};
use rubato::{FastFixedIn, PolynomialDegree, Resampler};
use tracing::debug;

/// Fixed input chunk size, in frames, fed to the converter.
const RESAMPLE_CHUNK: usize = 1024;

/// Incremental resampler wrapping rubato's `FastFixedIn`.
///
/// FastFixedIn trades a little quality for speed, which suits a live render
/// path; the polynomial degree keeps the quality loss inaudible.
pub struct StreamResampler {
    inner: FastFixedIn<f32>,
    channels: usize,
    /// Planar input awaiting a full chunk, one Vec per channel
    queued: Vec<Vec<f32>>,
}

impl StreamResampler {
    /// Create a converter from `source_rate` to `target_rate`.
    pub fn new(source_rate: u32, target_rate: u32, channels: u16) -> Result<Self> {
        let channels = channels as usize;
        let inner = FastFixedIn::<f32>::new(
            target_rate as f64 / source_rate as f64,
            1.0, // ratio never changes at runtime
            PolynomialDegree::Septic,
            RESAMPLE_CHUNK,
            channels,
        )
        .map_err(|e| Error::Decode(format!("Failed to create resampler: {}", e)))?;

        debug!(
            "resampling {} Hz -> {} Hz ({} channels)",
            source_rate, target_rate, channels
        );

        Ok(Self {
            inner,
            channels,
            queued: vec![Vec::new(); channels],
        })
    }

    /// Feed interleaved source-rate samples, returning any interleaved
    /// target-rate samples that became available.
    pub fn push(&mut self, interleaved: &[f32]) -> Result<Vec<f32>> {
        deinterleave_into(interleaved, &mut self.queued);

        let mut out = Vec::new();
        while self.queued[0].len() >= RESAMPLE_CHUNK {
            let planar = {
                let chunk: Vec<&[f32]> = self
                    .queued
                    .iter()
                    .map(|c| &c[..RESAMPLE_CHUNK])
                    .collect();
                self.inner
                    .process(&chunk, None)
                    .map_err(|e| Error::Decode(format!("Resampling failed: {}", e)))?
            };
            for channel in self.queued.iter_mut() {
                channel.drain(..RESAMPLE_CHUNK);
            }
            interleave_into(&planar, &mut out);
        }

        Ok(out)
    }

    /// Drain buffered input and the converter's internal state at end of
    /// stream. The converter must not be fed again afterwards.
    pub fn flush(&mut self) -> Result<Vec<f32>> {
        let mut out = Vec::new();

        if !self.queued[0].is_empty() {
            let planar = {
                let remainder: Vec<&[f32]> = self.queued.iter().map(|c| c.as_slice()).collect();
                self.inner
                    .process_partial(Some(&remainder), None)
                    .map_err(|e| Error::Decode(format!("Resampler flush failed: {}", e)))?
            };
            for channel in self.queued.iter_mut() {
                channel.clear();
            }
            interleave_into(&planar, &mut out);
        }

        let tail = self
            .inner
            .process_partial(None::<&[&[f32]]>, None)
            .map_err(|e| Error::Decode(format!("Resampler flush failed: {}", e)))?;
        interleave_into(&tail, &mut out);

        Ok(out)
    }

    pub fn channels(&self) -> usize {
        self.channels
    }
}

/// Split interleaved samples into per-channel buffers, appending.
fn deinterleave_into(interleaved: &[f32], planar: &mut [Vec<f32>]) {
    let channels = planar.len();
    for frame in interleaved.chunks_exact(channels) {
        for (channel, &sample) in planar.iter_mut().zip(frame) {
            channel.push(sample);
        }
    }
}

/// Append planar channel buffers to an interleaved output vector.
fn interleave_into(planar: &[Vec<f32>], out: &mut Vec<f32>) {
    if planar.is_empty() {
        return;
    }
    let frames = planar[0].len();
    out.reserve(frames * planar.len());
    for frame in 0..frames {
        for channel in planar {
            out.push(channel[frame]);
        }
    }
}
