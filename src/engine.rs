//! Real-time audio rendering engine
//!
//! Owns at most one decode session and produces one interleaved f32 block per
//! device callback: pull frames from the decoder in its native channel count,
//! remap onto the device layout, scale by volume. When the decoder runs dry
//! mid-block the engine asks the controller for the next track and, if one is
//! supplied synchronously, continues rendering into the same block starting
//! at the first silent frame, so a track transition produces no audible gap.
//!
//! Locking rule: the session lock is released before the end-of-track
//! notification is dispatched, because the notification re-enters the
//! controller (queue mutation) and may race with command threads calling
//! back into the engine. After re-acquisition the session is re-validated;
//! a decoder installed by a racing command wins over the supplied track.

use crate::audio::decoder::TrackDecoder;
use crate::audio::remap;
use crate::error::Result;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info, warn};

/// Callback asking the controller what to play after the current track ends.
/// Returning `None` leaves the engine idle.
pub type TrackEndHandler = Box<dyn FnMut() -> Option<PathBuf> + Send>;

/// Live render state, guarded by the engine's session lock.
struct RenderSession {
    decoder: Option<TrackDecoder>,
    paused: bool,
    /// Volume in [0.0, 1.0], applied after remapping
    volume: f32,
    /// Reusable native-channel read buffer for the render path
    scratch: Vec<f32>,
}

/// The playback engine shared between command threads and the audio callback.
pub struct RenderEngine {
    session: Mutex<RenderSession>,
    on_track_end: Mutex<Option<TrackEndHandler>>,
    /// Output device channel count
    channels: usize,
    /// Output device sample rate
    sample_rate: u32,
}

impl RenderEngine {
    /// Create an engine rendering for a device with the given layout.
    pub fn new(channels: usize, sample_rate: u32) -> Self {
        Self {
            session: Mutex::new(RenderSession {
                decoder: None,
                paused: false,
                volume: 1.0,
                scratch: Vec::new(),
            }),
            on_track_end: Mutex::new(None),
            channels,
            sample_rate,
        }
    }

    /// Install the end-of-track notification handler.
    pub fn set_track_end_handler(&self, handler: TrackEndHandler) {
        *self.on_track_end.lock().unwrap() = Some(handler);
    }

    /// Open a decode session for `track`, replacing any prior session.
    ///
    /// On failure the engine is left idle (silence) and the error returned;
    /// nothing propagates to the render thread.
    pub fn load(&self, track: &Path) -> Result<()> {
        let mut session = self.session.lock().unwrap();
        session.decoder = None;

        match TrackDecoder::open(track, self.sample_rate) {
            Ok(decoder) => {
                info!(
                    "playing: {} ({} ch @ {} Hz)",
                    track.display(),
                    decoder.channels(),
                    decoder.source_rate()
                );
                session.decoder = Some(decoder);
                session.paused = false;
                Ok(())
            }
            Err(e) => {
                warn!("failed to load {}: {}", track.display(), e);
                Err(e)
            }
        }
    }

    /// Tear down the decode session; queue and history are not affected.
    pub fn stop(&self) {
        let mut session = self.session.lock().unwrap();
        session.decoder = None;
        session.paused = false;
    }

    /// Silence output without discarding the decode session.
    pub fn pause(&self) {
        self.session.lock().unwrap().paused = true;
    }

    pub fn resume(&self) {
        self.session.lock().unwrap().paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.session.lock().unwrap().paused
    }

    /// True when no decode session is active.
    pub fn is_idle(&self) -> bool {
        self.session.lock().unwrap().decoder.is_none()
    }

    /// Set volume, clamped to [0.0, 1.0]; takes effect on the next block.
    pub fn set_volume(&self, volume: f32) {
        let clamped = volume.clamp(0.0, 1.0);
        self.session.lock().unwrap().volume = clamped;
        debug!("volume set to {:.2}", clamped);
    }

    pub fn volume(&self) -> f32 {
        self.session.lock().unwrap().volume
    }

    /// Device channel count this engine renders for.
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Device sample rate this engine renders at.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Fill one interleaved output block. Invoked from the audio callback.
    ///
    /// Never blocks on I/O beyond the decoder's own reads and never lets a
    /// failure escape; anything unexpected degrades to silence.
    pub fn render(&self, out: &mut [f32]) {
        out.fill(0.0);
        let frames = out.len() / self.channels;
        if frames == 0 {
            return;
        }

        let mut session = self.session.lock().unwrap();
        let mut filled = 0usize;

        while filled < frames {
            if session.paused || session.decoder.is_none() {
                // Remainder stays silent
                return;
            }

            let got = {
                let RenderSession {
                    decoder,
                    scratch,
                    volume,
                    ..
                } = &mut *session;
                let Some(decoder) = decoder.as_mut() else {
                    return;
                };
                let native = decoder.channels() as usize;
                let got = decoder.read_frames(scratch, frames - filled);
                if got > 0 {
                    let region = &mut out[filled * self.channels..(filled + got) * self.channels];
                    remap::remap_frames(scratch, native, region, self.channels);
                    remap::apply_volume(region, *volume);
                }
                got
            };
            filled += got;

            if filled == frames {
                break;
            }

            // End of stream: ask the controller for the next track with the
            // session lock released, since the notification re-enters both
            // the controller and this engine.
            session.decoder = None;
            drop(session);

            loop {
                let next = {
                    let mut handler = self.on_track_end.lock().unwrap();
                    handler.as_mut().and_then(|notify| notify())
                };

                session = self.session.lock().unwrap();

                // Re-validate: a command thread may have loaded a track while
                // the lock was released; that session takes precedence.
                if session.decoder.is_some() {
                    break;
                }

                let Some(track) = next else { return };

                match TrackDecoder::open(&track, self.sample_rate) {
                    Ok(decoder) => {
                        info!(
                            "next track: {} ({} ch @ {} Hz)",
                            track.display(),
                            decoder.channels(),
                            decoder.source_rate()
                        );
                        session.decoder = Some(decoder);
                        session.paused = false;
                        break;
                    }
                    Err(e) => {
                        // Ask the controller again so it advances past the
                        // undecodable entry; every ask consumes a queue entry
                        // or ends in None, so this terminates.
                        warn!("failed to load next track {}: {}", track.display(), e);
                        drop(session);
                    }
                }
            }
        }
    }
}
