//! Playback controller: queue/history state machine and command handling
//!
//! Sole owner of the decision of what to load next. Queue, history, current
//! track and the playing-from-queue flag live behind a single lock; commands
//! arrive sequentially from the listener thread, and the engine's end-of-track
//! notification arrives from the audio callback (with the engine's own lock
//! already released, see `engine.rs`).
//!
//! Lock order is controller state, then engine session. The end-of-track path
//! takes only the controller lock, so no hold-and-wait cycle exists between
//! the two.

use crate::engine::RenderEngine;
use crate::library;
use crate::protocol::Command;
use crate::queue::{History, PlayQueue};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

/// Shared playback state, guarded by the controller lock.
#[derive(Default)]
struct ControllerState {
    queue: PlayQueue,
    history: History,
    current: Option<PathBuf>,
    /// Whether end-of-track should auto-advance from the queue
    playing_from_queue: bool,
}

/// Interprets commands and drives track transitions.
pub struct Controller {
    state: Mutex<ControllerState>,
    engine: Arc<RenderEngine>,
    shutdown: Arc<AtomicBool>,
}

impl Controller {
    pub fn new(engine: Arc<RenderEngine>, shutdown: Arc<AtomicBool>) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(ControllerState::default()),
            engine,
            shutdown,
        })
    }

    /// Wire the engine's end-of-track notification back into this controller.
    ///
    /// The handler captures a weak reference; the controller owns the engine,
    /// not the other way around.
    pub fn install_track_end_handler(self: &Arc<Self>) {
        let weak = Arc::downgrade(self);
        self.engine.set_track_end_handler(Box::new(move || {
            weak.upgrade().and_then(|controller| controller.supply_next_track())
        }));
    }

    /// Apply one decoded command. Called sequentially by the listener.
    pub fn dispatch(&self, command: Command) {
        match command {
            Command::Stop => self.handle_stop(),
            Command::Next => self.handle_next(),
            Command::Prev => self.handle_prev(),
            Command::Quit => self.handle_quit(),
            Command::PlayDirect(source) => self.handle_play_direct(&source),
            Command::Enqueue(source) => self.handle_enqueue(&source),
            Command::LegacyPlay(source) => self.handle_legacy_play(&source),
        }
    }

    /// Stop playback; queue and history stay untouched.
    fn handle_stop(&self) {
        let mut state = self.state.lock().unwrap();
        info!("stop");
        self.engine.stop();
        state.current = None;
        state.playing_from_queue = false;
    }

    /// Advance to the next queued track. No-op when the queue is empty.
    fn handle_next(&self) {
        let mut state = self.state.lock().unwrap();
        if state.queue.is_empty() {
            debug!("next: queue empty, ignoring");
            return;
        }
        self.advance_from_queue(&mut state);
    }

    /// Return to the most recently played track, re-queueing the current one
    /// at the front so forward navigation resumes where it left off.
    fn handle_prev(&self) {
        let mut state = self.state.lock().unwrap();
        let Some(previous) = state.history.pop_front() else {
            debug!("prev: history empty, ignoring");
            return;
        };

        if let Some(current) = state.current.take() {
            state.queue.push_front(current);
        }

        state.current = Some(previous);
        state.playing_from_queue = true;
        self.start_current(&mut state);
    }

    /// Drain all state and raise the shutdown flag. The main thread joins
    /// the remaining threads and releases the device before exiting.
    fn handle_quit(&self) {
        {
            let mut state = self.state.lock().unwrap();
            info!("quit: clearing playback state");
            self.engine.stop();
            state.queue.clear();
            state.history.clear();
            state.current = None;
            state.playing_from_queue = false;
        }
        self.shutdown.store(true, Ordering::SeqCst);
    }

    /// Play a file or folder immediately, replacing the queue.
    fn handle_play_direct(&self, source: &str) {
        let path = PathBuf::from(source);
        if !path.exists() {
            debug!("play: source missing, ignoring: {}", source);
            return;
        }

        let mut state = self.state.lock().unwrap();
        state.queue.clear();

        if path.is_dir() {
            let tracks = match library::scan_shuffled(&path) {
                Ok(tracks) => tracks,
                Err(e) => {
                    warn!("failed to scan {}: {}", path.display(), e);
                    return;
                }
            };
            if tracks.is_empty() {
                info!("no audio files found in {}", path.display());
                return;
            }

            info!("playing {} tracks from {}", tracks.len(), path.display());

            let mut tracks = tracks.into_iter();
            let first = tracks.next().unwrap();
            if let Some(current) = state.current.replace(first) {
                state.history.push(current);
            }
            for track in tracks {
                state.queue.push_back(track);
            }
        } else if let Some(current) = state.current.replace(path) {
            state.history.push(current);
        }

        state.playing_from_queue = true;
        self.start_current(&mut state);
    }

    /// Append a file or folder to the queue; start playback when idle.
    fn handle_enqueue(&self, source: &str) {
        let path = PathBuf::from(source);
        if !path.exists() {
            debug!("enqueue: source missing, ignoring: {}", source);
            return;
        }

        let mut state = self.state.lock().unwrap();

        if path.is_dir() {
            let tracks = match library::scan_shuffled(&path) {
                Ok(tracks) => tracks,
                Err(e) => {
                    warn!("failed to scan {}: {}", path.display(), e);
                    return;
                }
            };
            if tracks.is_empty() {
                info!("no audio files found in {}", path.display());
                return;
            }
            info!("queueing {} tracks from {}", tracks.len(), path.display());
            for track in tracks {
                state.queue.push_back(track);
            }
        } else {
            debug!("queueing {}", path.display());
            state.queue.push_back(path);
        }

        if state.current.is_none() {
            self.advance_from_queue(&mut state);
        } else {
            state.playing_from_queue = true;
        }
    }

    /// Legacy bare-path play: direct playback that bypasses queue semantics.
    fn handle_legacy_play(&self, source: &str) {
        let path = PathBuf::from(source);
        if !path.exists() {
            debug!("legacy play: source missing, ignoring: {}", source);
            return;
        }

        let mut state = self.state.lock().unwrap();
        if let Some(current) = state.current.replace(path) {
            state.history.push(current);
        }
        state.playing_from_queue = false;
        self.start_current(&mut state);
    }

    /// Pop the next existing track from the queue and start it.
    ///
    /// Missing sources are skipped with a bounded loop over the queue length;
    /// when the loop exhausts the queue, auto-advance is disabled and whatever
    /// was playing keeps playing.
    fn advance_from_queue(&self, state: &mut ControllerState) {
        match Self::pop_next_existing(&mut state.queue) {
            Some(next) => {
                if let Some(current) = state.current.replace(next) {
                    state.history.push(current);
                }
                state.playing_from_queue = true;
                self.start_current(state);
            }
            None => {
                debug!("queue exhausted without a playable track");
                state.playing_from_queue = false;
            }
        }
    }

    /// Bounded skip-loop over the queue; at most `queue.len()` pops.
    fn pop_next_existing(queue: &mut PlayQueue) -> Option<PathBuf> {
        for _ in 0..queue.len() {
            let track = queue.pop_front()?;
            if track.exists() {
                return Some(track);
            }
            debug!("skipping missing track: {}", track.display());
        }
        None
    }

    /// Load the current track into the engine. A decode failure leaves the
    /// engine idle and clears the current track (silence, never an error to
    /// the client).
    fn start_current(&self, state: &mut ControllerState) {
        if let Some(track) = state.current.clone() {
            if self.engine.load(&track).is_err() {
                state.current = None;
            }
        }
    }

    /// End-of-track notification from the engine: choose the next track.
    ///
    /// Runs on the audio thread with the engine's session lock released.
    /// When playing from the queue and a playable entry remains, the finished
    /// track is pushed to history and the new one returned for the engine's
    /// gapless continuation. Otherwise the finished track still goes to
    /// history (keeping it reachable via prev) and the engine idles.
    fn supply_next_track(&self) -> Option<PathBuf> {
        let mut state = self.state.lock().unwrap();

        if state.playing_from_queue {
            if let Some(next) = Self::pop_next_existing(&mut state.queue) {
                if let Some(finished) = state.current.replace(next.clone()) {
                    state.history.push(finished);
                }
                return Some(next);
            }
            state.playing_from_queue = false;
        }

        if let Some(finished) = state.current.take() {
            debug!("end of track: {}", finished.display());
            state.history.push(finished);
        }
        None
    }

    // State snapshots, used by tests and diagnostics.

    pub fn current_track(&self) -> Option<PathBuf> {
        self.state.lock().unwrap().current.clone()
    }

    pub fn queue_tracks(&self) -> Vec<PathBuf> {
        self.state.lock().unwrap().queue.tracks()
    }

    pub fn history_tracks(&self) -> Vec<PathBuf> {
        self.state.lock().unwrap().history.tracks()
    }

    pub fn is_playing_from_queue(&self) -> bool {
        self.state.lock().unwrap().playing_from_queue
    }
}
