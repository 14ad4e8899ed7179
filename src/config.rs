//! Configuration parsing and management for oscpuppet

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, OscPuppetError};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub model: ModelConfig,
    pub osc: OscConfig,
    pub window: WindowConfig,
    pub camera: CameraConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: ModelConfig::default(),
            osc: OscConfig::default(),
            window: WindowConfig::default(),
            camera: CameraConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, OscPuppetError> {
        let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ConfigError::ReadFile(format!("{}: {}", path.as_ref().display(), e))
        })?;

        Self::parse(&contents)
    }

    /// Parse configuration from a TOML string
    pub fn parse(s: &str) -> Result<Self, OscPuppetError> {
        toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()).into())
    }

    /// Load configuration from default paths
    pub fn load() -> Result<Self, OscPuppetError> {
        let paths = [
            PathBuf::from("config.toml"),
            PathBuf::from("config/default.toml"),
        ];

        for path in &paths {
            if path.exists() {
                tracing::info!("Loading config from: {}", path.display());
                return Self::from_file(path);
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), OscPuppetError> {
        if self.osc.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "osc.port".to_string(),
                message: "Port must be greater than 0".to_string(),
            }
            .into());
        }

        if !(20.0..=179.0).contains(&self.camera.fov) {
            return Err(ConfigError::InvalidValue {
                field: "camera.fov".to_string(),
                message: "Field of view must be between 20 and 179 degrees".to_string(),
            }
            .into());
        }

        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::InvalidValue {
                field: "window".to_string(),
                message: "Window dimensions must be greater than 0".to_string(),
            }
            .into());
        }

        Ok(())
    }
}

/// Model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Path to the glTF/GLB avatar model
    pub path: PathBuf,
    /// Enable smooth mesh deformation (linear blend skinning)
    pub skinning: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("assets/model/avatar.glb"),
            skinning: true,
        }
    }
}

/// Motion stream (OSC over UDP) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OscConfig {
    /// UDP port the motion sender transmits to
    pub port: u16,
}

impl Default for OscConfig {
    fn default() -> Self {
        Self { port: 10000 }
    }
}

/// Window configuration (native UI only)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1152,
            height: 648,
        }
    }
}

/// Camera configuration (native UI only)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view in degrees
    pub fov: f32,
    /// Eye position in model units
    pub eye: [f32; 3],
    /// Look-at target in model units
    pub target: [f32; 3],
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov: 45.0,
            eye: [0.0, 0.0, 500.0],
            target: [0.0, 0.0, 0.0],
        }
    }
}
