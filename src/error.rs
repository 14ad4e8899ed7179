//! Error types for oscpuppet

use thiserror::Error;

/// Main error type for oscpuppet
#[derive(Error, Debug)]
pub enum OscPuppetError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),

    #[error("Stream error: {0}")]
    Stream(#[from] StreamError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadFile(String),

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid configuration value: {field} - {message}")]
    InvalidValue { field: String, message: String },
}

/// Scene-loading errors. Fatal to avatar construction: a model that cannot
/// be opened or parsed leaves nothing to bind against.
#[derive(Error, Debug)]
pub enum SceneError {
    #[error("Model file not found: {0}")]
    NotFound(String),

    #[error("Failed to import model: {0}")]
    Import(String),
}

/// Motion stream errors (socket setup and receive path)
#[derive(Error, Debug)]
pub enum StreamError {
    #[error("Failed to bind motion socket: {0}")]
    Bind(String),

    #[error("Receive error: {0}")]
    Receive(String),
}

/// Result type alias for oscpuppet operations
pub type Result<T> = std::result::Result<T, OscPuppetError>;
