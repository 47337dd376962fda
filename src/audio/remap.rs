//! Channel remapping between source and device layouts
//!
//! Pure up/downmix policy applied per rendered block:
//! - equal channel counts: direct copy
//! - mono source: duplicated to every output channel
//! - stereo source into 2+ channels: L/R pass through; on 5.1-and-up layouts
//!   the center, LFE and rear pair are derived from L/R at reduced level
//! - any other combination: per-frame arithmetic-mean downmix

/// Remap interleaved `input` frames at `in_channels` into interleaved
/// `output` at `out_channels`.
///
/// Writes `min(input frames, output frames)` frames and returns that count.
/// Output channels with no mapped source are written as silence.
pub fn remap_frames(
    input: &[f32],
    in_channels: usize,
    output: &mut [f32],
    out_channels: usize,
) -> usize {
    if in_channels == 0 || out_channels == 0 {
        return 0;
    }

    let frames = (input.len() / in_channels).min(output.len() / out_channels);
    let out_region = &mut output[..frames * out_channels];

    if in_channels == out_channels {
        out_region.copy_from_slice(&input[..frames * in_channels]);
        return frames;
    }

    for sample in out_region.iter_mut() {
        *sample = 0.0;
    }

    for frame in 0..frames {
        let src = &input[frame * in_channels..(frame + 1) * in_channels];
        let dst = &mut out_region[frame * out_channels..(frame + 1) * out_channels];

        if in_channels == 1 {
            // Mono: duplicate to every output channel
            dst.fill(src[0]);
        } else if in_channels == 2 && out_channels >= 2 {
            let left = src[0];
            let right = src[1];

            dst[0] = left;
            dst[1] = right;

            // Derive center/LFE/rears on 5.1-and-up layouts
            if out_channels >= 6 {
                dst[2] = (left + right) * 0.7;
                dst[3] = (left + right) * 0.3;
                dst[4] = left * 0.5;
                dst[5] = right * 0.5;
            }
        } else {
            // Arbitrary combination: mean of all source channels
            let mean = src.iter().sum::<f32>() / in_channels as f32;
            dst.fill(mean);
        }
    }

    frames
}

/// Scale every sample in a rendered region by a volume factor.
pub fn apply_volume(samples: &mut [f32], volume: f32) {
    if (volume - 1.0).abs() < f32::EPSILON {
        return;
    }
    for sample in samples.iter_mut() {
        *sample *= volume;
    }
}
