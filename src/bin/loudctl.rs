//! loudctl - send a single control command to a running loudd daemon
//!
//! Fire-and-forget: one UDP datagram per invocation, no response expected.
//! Source paths are canonicalized before sending when they resolve locally,
//! since the daemon interprets relative paths against its own working
//! directory.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::net::UdpSocket;
use std::path::Path;

#[derive(Parser, Debug)]
#[command(name = "loudctl")]
#[command(about = "Control a running loudd daemon")]
#[command(version)]
struct Args {
    /// UDP control port of the daemon
    #[arg(short, long, default_value_t = loudd::config::DEFAULT_PORT, env = "LOUDD_PORT")]
    port: u16,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Stop playback
    Stop,
    /// Skip to the next queued track
    Next,
    /// Return to the previously played track
    Prev,
    /// Shut the daemon down
    Quit,
    /// Play a file or folder immediately, replacing the queue
    Play { source: String },
    /// Append a file or folder to the play queue
    Queue { source: String },
    /// Send a raw protocol payload
    Send { payload: String },
}

/// Resolve a source argument to an absolute path when it exists locally.
fn resolve_source(source: &str) -> String {
    match std::fs::canonicalize(Path::new(source)) {
        Ok(absolute) => absolute.to_string_lossy().into_owned(),
        Err(_) => source.to_string(),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let payload = match args.command {
        Cmd::Stop => String::new(),
        Cmd::Next => "n".to_string(),
        Cmd::Prev => "p".to_string(),
        Cmd::Quit => "q".to_string(),
        Cmd::Play { source } => format!("play:{}", resolve_source(&source)),
        Cmd::Queue { source } => format!("q:{}", resolve_source(&source)),
        Cmd::Send { payload } => payload,
    };

    let socket = UdpSocket::bind("127.0.0.1:0").context("Failed to create socket")?;
    socket
        .send_to(payload.as_bytes(), ("127.0.0.1", args.port))
        .with_context(|| format!("Failed to send command to port {}", args.port))?;

    Ok(())
}
