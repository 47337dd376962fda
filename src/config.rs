//! Daemon configuration
//!
//! Defaults, an optional TOML config file, and command-line overrides, in
//! that precedence order (lowest to highest).

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Default UDP control port.
pub const DEFAULT_PORT: u16 = 7001;

/// Daemon configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// UDP control port, bound on all interfaces
    pub port: u16,
    /// Output device name; None selects the system default
    pub device: Option<String>,
    /// Initial volume in [0.0, 1.0]
    pub volume: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            device: None,
            volume: 1.0,
        }
    }
}

impl Config {
    /// Load configuration from an optional TOML file.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|e| {
                    Error::Config(format!("Failed to read {}: {}", path.display(), e))
                })?;
                toml::from_str(&text).map_err(|e| {
                    Error::Config(format!("Failed to parse {}: {}", path.display(), e))
                })?
            }
            None => Config::default(),
        };
        config.volume = config.volume.clamp(0.0, 1.0);
        Ok(config)
    }

    /// Apply command-line overrides on top of file values.
    pub fn apply_overrides(
        &mut self,
        port: Option<u16>,
        device: Option<String>,
        volume: Option<f32>,
    ) {
        if let Some(port) = port {
            self.port = port;
        }
        if device.is_some() {
            self.device = device;
        }
        if let Some(volume) = volume {
            self.volume = volume.clamp(0.0, 1.0);
        }
    }
}
