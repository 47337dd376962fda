//! Streaming audio decoder using symphonia
//!
//! Opens a source file and produces interleaved f32 PCM frames on demand, in
//! the source's native channel count, resampled to the output device's sample
//! rate. End of stream is reported by returning fewer frames than requested.
//!
//! Opening a session probes the container and initializes the codec only;
//! actual decoding happens incrementally in [`TrackDecoder::read_frames`], so
//! a session swap inside the render callback stays cheap.

use crate::audio::resampler::StreamResampler;
use crate::error::{Error, Result};
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{Decoder, DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

/// A live decode session for one track.
pub struct TrackDecoder {
    format: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    /// Source's native channel count, preserved through resampling
    channels: u16,
    source_rate: u32,
    /// Present only when the source rate differs from the device rate
    resampler: Option<StreamResampler>,
    /// Reusable interleaving buffer for decoded packets
    sample_buf: Option<SampleBuffer<f32>>,
    /// Interleaved native-channel samples at the device rate, ready to serve
    pending: Vec<f32>,
    eof: bool,
}

impl TrackDecoder {
    /// Open a decode session for `path`, producing frames at `target_rate`.
    pub fn open(path: &Path, target_rate: u32) -> Result<Self> {
        let file = std::fs::File::open(path)
            .map_err(|e| Error::Decode(format!("Failed to open {}: {}", path.display(), e)))?;

        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        // Hint the probe with the file extension
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
            .map_err(|e| Error::Decode(format!("Failed to probe format: {}", e)))?;

        let format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| Error::Decode("No audio track found".to_string()))?;

        let track_id = track.id;
        let codec_params = &track.codec_params;

        let source_rate = codec_params
            .sample_rate
            .ok_or_else(|| Error::Decode("Sample rate not found".to_string()))?;

        let channels = codec_params
            .channels
            .map(|c| c.count() as u16)
            .ok_or_else(|| Error::Decode("Channel count not found".to_string()))?;

        let decoder = symphonia::default::get_codecs()
            .make(codec_params, &DecoderOptions::default())
            .map_err(|e| Error::Decode(format!("Failed to create decoder: {}", e)))?;

        let resampler = if source_rate != target_rate {
            Some(StreamResampler::new(source_rate, target_rate, channels)?)
        } else {
            None
        };

        debug!(
            "opened {}: {} Hz, {} channels",
            path.display(),
            source_rate,
            channels
        );

        Ok(Self {
            format,
            decoder,
            track_id,
            channels,
            source_rate,
            resampler,
            sample_buf: None,
            pending: Vec::new(),
            eof: false,
        })
    }

    /// Source's native channel count.
    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Source's native sample rate, before conversion to the device rate.
    pub fn source_rate(&self) -> u32 {
        self.source_rate
    }

    /// Pull up to `max_frames` interleaved native-channel frames into `out`.
    ///
    /// Clears `out` first. Returns the number of frames produced; fewer than
    /// `max_frames` signals end of stream.
    pub fn read_frames(&mut self, out: &mut Vec<f32>, max_frames: usize) -> usize {
        out.clear();
        let channels = self.channels as usize;

        while self.pending.len() < max_frames * channels && !self.eof {
            self.decode_next_packet();
        }

        let frames = max_frames.min(self.pending.len() / channels);
        out.extend(self.pending.drain(..frames * channels));
        frames
    }

    /// Decode one packet into `pending`, or mark end of stream.
    fn decode_next_packet(&mut self) {
        let packet = match self.format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                self.finish();
                return;
            }
            Err(e) => {
                warn!("error reading packet: {}", e);
                self.finish();
                return;
            }
        };

        if packet.track_id() != self.track_id {
            return;
        }

        let decoded = match self.decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(e)) => {
                // Corrupt packet, skip it
                warn!("decode error: {}", e);
                return;
            }
            Err(e) => {
                warn!("decoder failed: {}", e);
                self.finish();
                return;
            }
        };

        let spec = *decoded.spec();
        let needed = decoded.capacity() * spec.channels.count();
        let undersized = self
            .sample_buf
            .as_ref()
            .map_or(true, |buf| buf.capacity() < needed);
        if undersized {
            self.sample_buf = Some(SampleBuffer::new(decoded.capacity() as u64, spec));
        }
        let Some(buf) = self.sample_buf.as_mut() else {
            return;
        };

        buf.copy_interleaved_ref(decoded);
        let samples = buf.samples();

        match &mut self.resampler {
            Some(resampler) => match resampler.push(samples) {
                Ok(converted) => self.pending.extend_from_slice(&converted),
                Err(e) => {
                    warn!("resampling failed: {}", e);
                    self.finish();
                }
            },
            None => self.pending.extend_from_slice(samples),
        }
    }

    /// Flush the resampler tail and mark the stream exhausted.
    fn finish(&mut self) {
        if self.eof {
            return;
        }
        if let Some(resampler) = &mut self.resampler {
            match resampler.flush() {
                Ok(tail) => self.pending.extend_from_slice(&tail),
                Err(e) => warn!("resampler flush failed: {}", e),
            }
        }
        self.eof = true;
    }
}
