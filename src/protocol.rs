//! Wire protocol for the control channel
//!
//! One command per UDP datagram, UTF-8 text, no length prefix, fire-and-forget.
//! The grammar is decoded exactly once here, at the listener boundary:
//!
//! | Payload          | Meaning              |
//! |------------------|----------------------|
//! | (empty)          | Stop                 |
//! | `n`              | Next                 |
//! | `p`              | Prev                 |
//! | `q`              | Quit                 |
//! | `play:<source>`  | Play source directly |
//! | `q:<source>`     | Enqueue source       |
//! | anything else    | Legacy bare-path play|
//!
//! Unrecognized payloads are never rejected; they fall back to the legacy
//! bare-path play command for backward compatibility with older clients.

/// Maximum practical datagram size for a command payload.
pub const MAX_DATAGRAM: usize = 1024;

/// A decoded control command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Stop playback, leave queue and history alone
    Stop,
    /// Advance to the next queued track
    Next,
    /// Return to the most recently played track
    Prev,
    /// Tear down all state and shut the daemon down
    Quit,
    /// Play a file or folder immediately, replacing the queue
    PlayDirect(String),
    /// Append a file or folder to the queue
    Enqueue(String),
    /// Legacy client fallback: the raw payload is a source path
    LegacyPlay(String),
}

impl Command {
    /// Decode a datagram payload into a command.
    ///
    /// Never fails; anything that matches no known prefix is a legacy play.
    pub fn parse(payload: &str) -> Command {
        if payload.is_empty() {
            return Command::Stop;
        }

        match payload {
            "n" => return Command::Next,
            "p" => return Command::Prev,
            "q" => return Command::Quit,
            _ => {}
        }

        if let Some(source) = payload.strip_prefix("play:") {
            return Command::PlayDirect(source.to_string());
        }

        if let Some(source) = payload.strip_prefix("q:") {
            return Command::Enqueue(source.to_string());
        }

        Command::LegacyPlay(payload.to_string())
    }
}
