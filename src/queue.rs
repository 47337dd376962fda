//! Play queue and bounded history primitives
//!
//! Pure data structures, no I/O. Tracks are opaque path identifiers that only
//! ever move between the queue, the history, and the current-track slot.

use std::collections::VecDeque;
use std::path::PathBuf;

/// Maximum number of recently played tracks retained for "previous" navigation.
pub const HISTORY_CAPACITY: usize = 20;

/// Pending tracks awaiting playback.
///
/// FIFO for normal advance; `push_front` re-inserts the interrupted track when
/// navigating backwards so that forward navigation resumes where it left off.
#[derive(Debug, Default)]
pub struct PlayQueue {
    tracks: VecDeque<PathBuf>,
}

impl PlayQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a track; insertion order is the play order.
    pub fn push_back(&mut self, track: PathBuf) {
        self.tracks.push_back(track);
    }

    /// Priority re-insert at the front of the queue.
    pub fn push_front(&mut self, track: PathBuf) {
        self.tracks.push_front(track);
    }

    pub fn pop_front(&mut self) -> Option<PathBuf> {
        self.tracks.pop_front()
    }

    pub fn clear(&mut self) {
        self.tracks.clear();
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Snapshot of the queued tracks in play order.
    pub fn tracks(&self) -> Vec<PathBuf> {
        self.tracks.iter().cloned().collect()
    }
}

/// Bounded most-recent-first list of played tracks.
///
/// When a push would exceed [`HISTORY_CAPACITY`], the oldest entry is evicted
/// from the tail. This is navigation state, not session logging.
#[derive(Debug, Default)]
pub struct History {
    entries: VecDeque<PathBuf>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a track as most recently played, evicting the oldest if full.
    pub fn push(&mut self, track: PathBuf) {
        self.entries.push_front(track);
        if self.entries.len() > HISTORY_CAPACITY {
            self.entries.pop_back();
        }
    }

    /// Remove and return the most recently played track.
    pub fn pop_front(&mut self) -> Option<PathBuf> {
        self.entries.pop_front()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Snapshot, most recent first.
    pub fn tracks(&self) -> Vec<PathBuf> {
        self.entries.iter().cloned().collect()
    }
}
