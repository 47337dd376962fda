//! loudd - UDP-controlled audio playback daemon
//!
//! Binds the control socket, opens the output device, and supervises the
//! listener thread and the device-driven render callback until a quit
//! command or a termination signal raises the shutdown flag.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use loudd::audio::AudioOutput;
use loudd::config::Config;
use loudd::controller::Controller;
use loudd::engine::RenderEngine;
use loudd::listener::CommandListener;

/// Command-line arguments for loudd
#[derive(Parser, Debug)]
#[command(name = "loudd")]
#[command(about = "UDP-controlled audio playback daemon")]
#[command(version)]
struct Args {
    /// UDP control port
    #[arg(short, long, env = "LOUDD_PORT")]
    port: Option<u16>,

    /// Output device name (default: system default device)
    #[arg(short, long, env = "LOUDD_DEVICE")]
    device: Option<String>,

    /// Initial volume, 0.0 to 1.0
    #[arg(long)]
    volume: Option<f32>,

    /// Path to a TOML config file
    #[arg(short, long, env = "LOUDD_CONFIG")]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "loudd=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let mut config = Config::load(args.config.as_deref()).context("Failed to load config")?;
    config.apply_overrides(args.port, args.device, args.volume);

    // Startup resource failures are fatal; everything after this point
    // degrades gracefully instead.
    let mut output =
        AudioOutput::new(config.device.clone()).context("Failed to open audio output device")?;
    info!(
        "audio device: {} ({} channels @ {} Hz)",
        output.device_name(),
        output.channels(),
        output.sample_rate()
    );

    let engine = Arc::new(RenderEngine::new(
        output.channels() as usize,
        output.sample_rate(),
    ));
    engine.set_volume(config.volume);

    let shutdown = Arc::new(AtomicBool::new(false));
    let controller = Controller::new(Arc::clone(&engine), Arc::clone(&shutdown));
    controller.install_track_end_handler();

    {
        let engine = Arc::clone(&engine);
        output
            .start(move |block| engine.render(block))
            .context("Failed to start audio stream")?;
    }

    let listener = CommandListener::spawn(config.port, controller, Arc::clone(&shutdown))
        .context("Failed to start command listener")?;
    info!("listening for commands on udp port {}", config.port);

    {
        let shutdown = Arc::clone(&shutdown);
        ctrlc::set_handler(move || {
            info!("termination signal received");
            shutdown.store(true, Ordering::SeqCst);
        })
        .context("Failed to install signal handler")?;
    }

    // Supervisory loop: nothing to do but wait for the flag.
    while !shutdown.load(Ordering::SeqCst) {
        std::thread::sleep(Duration::from_millis(100));
    }

    info!("shutting down");
    listener.join();
    if let Err(e) = output.stop() {
        tracing::warn!("error stopping audio stream: {}", e);
    }
    info!("shutdown complete");

    Ok(())
}
