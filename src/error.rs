//! Error types for loudd
//!
//! Defines module-specific error types using thiserror for clear error propagation.
//!
//! Only startup-time resource failures (audio device, control socket) are fatal;
//! per-command and per-track failures are absorbed locally and logged.

use thiserror::Error;

/// Main error type for loudd
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file loading errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Audio decoding errors
    #[error("Audio decode error: {0}")]
    Decode(String),

    /// Audio output device errors
    #[error("Audio output error: {0}")]
    AudioOutput(String),

    /// Control socket errors
    #[error("Listener error: {0}")]
    Listener(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type using loudd Error
pub type Result<T> = std::result::Result<T, Error>;
