//! # loudd
//!
//! A background daemon that plays audio files and folders on command,
//! controlled by short text datagrams over UDP.
//!
//! **Architecture:** a real-time render path (symphonia + rubato + cpal)
//! driven by the output device's callback, a queue/history state machine
//! owned by the [`controller::Controller`], and a fire-and-forget UDP
//! control protocol decoded once at the [`listener::CommandListener`]
//! boundary.

pub mod audio;
pub mod config;
pub mod controller;
pub mod engine;
pub mod error;
pub mod library;
pub mod listener;
pub mod protocol;
pub mod queue;

pub use error::{Error, Result};
