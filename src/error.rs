//! # Error Types
//!
//! Custom error types for stickmix using `thiserror`.

use thiserror::Error;

/// Main error type for stickmix
#[derive(Debug, Error)]
pub enum StickmixError {
    /// Invalid configuration (bad switch definition, out-of-range value)
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Device read failures (missing index, lost event stream)
    #[error("Device read failure: {0}")]
    DeviceRead(String),

    /// Requested joystick index does not exist
    #[error("Joystick {index} not found ({available} available)")]
    JoystickNotFound {
        /// Index asked for
        index: usize,
        /// Number of joystick-like devices that were enumerated
        available: usize,
    },

    /// GPIO errors from the PPM output pin
    #[error("GPIO error: {0}")]
    Gpio(String),

    /// Configuration file errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for stickmix
pub type Result<T> = std::result::Result<T, StickmixError>;
