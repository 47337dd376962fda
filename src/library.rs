//! Source expansion: audio file detection and folder enumeration
//!
//! A playable source is either a single file or a folder of audio files.
//! Folder expansion is one level deep, filters by a fixed extension set
//! (case-insensitive), and applies a uniform random shuffle so folder
//! playback order is randomized per command.

use crate::error::Result;
use rand::seq::SliceRandom;
use rand::thread_rng;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Recognized audio file extensions, lowercase.
const AUDIO_EXTENSIONS: &[&str] = &[
    "mp3", "wav", "ogg", "flac", "aac", "wma", "m4a", "aiff", "opus",
];

/// Check whether a path carries a recognized audio extension.
pub fn is_audio_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            AUDIO_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Enumerate the regular audio files directly under a folder.
///
/// Non-audio entries and subdirectories are ignored. The returned order is
/// whatever the filesystem yields; callers wanting playback order should use
/// [`scan_shuffled`].
pub fn collect_audio_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_file() && is_audio_file(&path) {
            files.push(path);
        }
    }

    debug!("found {} audio files in {}", files.len(), dir.display());
    Ok(files)
}

/// Enumerate a folder's audio files and shuffle them uniformly.
pub fn scan_shuffled(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = collect_audio_files(dir)?;
    files.shuffle(&mut thread_rng());
    Ok(files)
}
