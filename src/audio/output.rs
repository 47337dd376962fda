//! Audio output using cpal
//!
//! Owns the output device for the daemon's lifetime. The device's native
//! channel count and sample rate are detected at startup, falling back to
//! stereo at 44.1 kHz when the device cannot be probed. The render callback
//! is invoked at the device's cadence with one interleaved f32 block to fill.

use crate::error::{Error, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, Stream, StreamConfig};
use tracing::{debug, error, info, warn};

/// Audio output manager using cpal.
pub struct AudioOutput {
    device: Device,
    config: StreamConfig,
    sample_format: SampleFormat,
    stream: Option<Stream>,
}

impl AudioOutput {
    /// Open the output device.
    ///
    /// # Arguments
    /// - `device_name`: Optional device name (None = default device)
    ///
    /// # Errors
    /// Fatal when no usable output device exists; a named device that cannot
    /// be found falls back to the default device first.
    pub fn new(device_name: Option<String>) -> Result<Self> {
        let host = cpal::default_host();

        let device = if let Some(name) = device_name.as_ref() {
            let mut devices = host
                .output_devices()
                .map_err(|e| Error::AudioOutput(format!("Failed to enumerate devices: {}", e)))?;

            match devices.find(|d| d.name().ok().as_ref() == Some(name)) {
                Some(dev) => {
                    info!("using requested audio device: {}", name);
                    dev
                }
                None => {
                    warn!("requested device '{}' not found, falling back to default", name);
                    host.default_output_device().ok_or_else(|| {
                        Error::AudioOutput(format!(
                            "Device '{}' not found and no default device available",
                            name
                        ))
                    })?
                }
            }
        } else {
            let dev = host
                .default_output_device()
                .ok_or_else(|| Error::AudioOutput("No default output device found".to_string()))?;
            info!(
                "using default audio device: {}",
                dev.name().unwrap_or_else(|_| "Unknown".to_string())
            );
            dev
        };

        let (config, sample_format) = Self::native_config(&device);

        debug!(
            "audio config: sample_rate={}, channels={}, format={:?}",
            config.sample_rate.0, config.channels, sample_format
        );

        Ok(Self {
            device,
            config,
            sample_format,
            stream: None,
        })
    }

    /// Probe the device's native configuration, falling back to stereo.
    fn native_config(device: &Device) -> (StreamConfig, SampleFormat) {
        match device.default_output_config() {
            Ok(supported) => {
                let sample_format = supported.sample_format();
                (supported.config(), sample_format)
            }
            Err(e) => {
                warn!(
                    "could not probe device config ({}), falling back to stereo 44.1 kHz",
                    e
                );
                (
                    StreamConfig {
                        channels: 2,
                        sample_rate: cpal::SampleRate(44100),
                        buffer_size: cpal::BufferSize::Default,
                    },
                    SampleFormat::F32,
                )
            }
        }
    }

    /// Start the output stream.
    ///
    /// `render` is invoked on the audio thread with one interleaved f32
    /// block per device period and must fill it completely; it must never
    /// block on I/O. Non-f32 device formats are rendered through an f32
    /// staging buffer and converted.
    pub fn start<F>(&mut self, render: F) -> Result<()>
    where
        F: FnMut(&mut [f32]) + Send + 'static,
    {
        info!("starting audio stream");

        let stream = match self.sample_format {
            SampleFormat::F32 => self.build_stream_f32(render)?,
            SampleFormat::I16 => self.build_stream_i16(render)?,
            SampleFormat::U16 => self.build_stream_u16(render)?,
            sample_format => {
                return Err(Error::AudioOutput(format!(
                    "Unsupported sample format: {:?}",
                    sample_format
                )));
            }
        };

        stream
            .play()
            .map_err(|e| Error::AudioOutput(format!("Failed to start stream: {}", e)))?;

        self.stream = Some(stream);
        info!("audio stream started");
        Ok(())
    }

    fn build_stream_f32<F>(&self, mut render: F) -> Result<Stream>
    where
        F: FnMut(&mut [f32]) + Send + 'static,
    {
        let stream = self
            .device
            .build_output_stream(
                &self.config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    render(data);
                    // Clamp to prevent clipping
                    for sample in data.iter_mut() {
                        *sample = sample.clamp(-1.0, 1.0);
                    }
                },
                move |err| {
                    error!("audio stream error: {}", err);
                },
                None,
            )
            .map_err(|e| Error::AudioOutput(format!("Failed to build stream: {}", e)))?;

        Ok(stream)
    }

    fn build_stream_i16<F>(&self, mut render: F) -> Result<Stream>
    where
        F: FnMut(&mut [f32]) + Send + 'static,
    {
        let mut staging: Vec<f32> = Vec::new();
        let stream = self
            .device
            .build_output_stream(
                &self.config,
                move |data: &mut [i16], _: &cpal::OutputCallbackInfo| {
                    staging.resize(data.len(), 0.0);
                    render(&mut staging);
                    for (out, sample) in data.iter_mut().zip(&staging) {
                        *out = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
                    }
                },
                move |err| {
                    error!("audio stream error: {}", err);
                },
                None,
            )
            .map_err(|e| Error::AudioOutput(format!("Failed to build stream: {}", e)))?;

        Ok(stream)
    }

    fn build_stream_u16<F>(&self, mut render: F) -> Result<Stream>
    where
        F: FnMut(&mut [f32]) + Send + 'static,
    {
        let mut staging: Vec<f32> = Vec::new();
        let stream = self
            .device
            .build_output_stream(
                &self.config,
                move |data: &mut [u16], _: &cpal::OutputCallbackInfo| {
                    staging.resize(data.len(), 0.0);
                    render(&mut staging);
                    for (out, sample) in data.iter_mut().zip(&staging) {
                        // Convert from [-1.0, 1.0] to [0, 65535]
                        *out = ((sample.clamp(-1.0, 1.0) + 1.0) * 32767.5) as u16;
                    }
                },
                move |err| {
                    error!("audio stream error: {}", err);
                },
                None,
            )
            .map_err(|e| Error::AudioOutput(format!("Failed to build stream: {}", e)))?;

        Ok(stream)
    }

    /// Stop the output stream and release it.
    pub fn stop(&mut self) -> Result<()> {
        if let Some(stream) = self.stream.take() {
            info!("stopping audio stream");
            stream
                .pause()
                .map_err(|e| Error::AudioOutput(format!("Failed to pause stream: {}", e)))?;
            drop(stream);
        }
        Ok(())
    }

    /// Device name.
    pub fn device_name(&self) -> String {
        self.device.name().unwrap_or_else(|_| "Unknown".to_string())
    }

    /// Native sample rate.
    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }

    /// Native channel count.
    pub fn channels(&self) -> u16 {
        self.config.channels
    }
}

impl Drop for AudioOutput {
    fn drop(&mut self) {
        // Ensure stream is stopped on drop
        let _ = self.stop();
    }
}
