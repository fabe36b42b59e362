//! Error types for voxpick.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VoxpickError {
    // Configuration errors
    #[error("Configuration file not found at {path}")]
    ConfigFileNotFound { path: String },

    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // Listener errors
    #[error("Failed to bind listener on port {port}: {message}")]
    Bind { port: u16, message: String },

    // Single-instance guard errors
    #[error("Instance guard error: {message}")]
    InstanceGuard { message: String },

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, VoxpickError>;
