//! Error types for key-metronome.
//!
//! Startup failures (device allocation and registration) are the only fatal
//! conditions at runtime; everything else here is raised while resolving the
//! configuration.

use std::io;
use thiserror::Error;

/// Main error type for key-metronome operations.
#[derive(Error, Debug)]
pub enum MetronomeError {
    /// The virtual input device could not be allocated.
    #[error("failed to allocate input device: {0}")]
    DeviceAllocation(String),

    /// The allocated device was refused by the host input subsystem.
    #[error("failed to register input device '{name}': {reason}")]
    DeviceRegistration { name: String, reason: String },

    /// The specified key is invalid or unsupported.
    #[error("invalid key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },

    /// Error parsing a hotkey combination.
    #[error("invalid hotkey '{combo}': {reason}")]
    InvalidHotkey { combo: String, reason: String },

    /// Error parsing an interval.
    #[error("invalid interval '{value}': {reason}")]
    InvalidInterval { value: String, reason: String },

    /// Configuration validation error.
    #[error("configuration error: {0}")]
    ConfigValidation(String),

    /// Error reading or parsing configuration file.
    #[error("failed to load config from '{path}': {reason}")]
    ConfigLoad { path: String, reason: String },

    /// Error writing configuration file.
    #[error("failed to save config to '{path}': {reason}")]
    ConfigSave { path: String, reason: String },

    /// Platform-specific operation is not supported.
    #[error("operation not supported on this platform: {0}")]
    UnsupportedPlatform(String),

    /// Error registering or handling a toggle trigger.
    #[error("hotkey error: {0}")]
    Hotkey(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for key-metronome operations.
pub type Result<T> = std::result::Result<T, MetronomeError>;

impl MetronomeError {
    /// Create a new device allocation error.
    pub fn device_allocation(reason: impl Into<String>) -> Self {
        Self::DeviceAllocation(reason.into())
    }

    /// Create a new device registration error.
    pub fn device_registration(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::DeviceRegistration {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create a new invalid key error.
    pub fn invalid_key(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidKey {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Create a new invalid hotkey error.
    pub fn invalid_hotkey(combo: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidHotkey {
            combo: combo.into(),
            reason: reason.into(),
        }
    }

    /// Create a new invalid interval error.
    pub fn invalid_interval(value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInterval {
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a new configuration validation error.
    pub fn config_validation(message: impl Into<String>) -> Self {
        Self::ConfigValidation(message.into())
    }

    /// Create a new configuration load error.
    pub fn config_load(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConfigLoad {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a new configuration save error.
    pub fn config_save(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConfigSave {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a new unsupported platform error.
    pub fn unsupported_platform(message: impl Into<String>) -> Self {
        Self::UnsupportedPlatform(message.into())
    }

    /// Create a new hotkey error.
    pub fn hotkey(message: impl Into<String>) -> Self {
        Self::Hotkey(message.into())
    }

    /// True for the two failures that abort startup.
    pub fn is_device_failure(&self) -> bool {
        matches!(
            self,
            Self::DeviceAllocation(_) | Self::DeviceRegistration { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MetronomeError::device_registration("Key Metronome", "permission denied");
        assert_eq!(
            err.to_string(),
            "failed to register input device 'Key Metronome': permission denied"
        );

        let err = MetronomeError::invalid_key("xyz", "unknown key");
        assert_eq!(err.to_string(), "invalid key 'xyz': unknown key");

        let err = MetronomeError::config_validation("delay must be positive");
        assert_eq!(
            err.to_string(),
            "configuration error: delay must be positive"
        );
    }

    #[test]
    fn test_error_from_io() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "/dev/uinput");
        let err: MetronomeError = io_err.into();
        assert!(matches!(err, MetronomeError::Io(_)));
        assert!(!err.is_device_failure());
    }

    #[test]
    fn test_device_failures_are_flagged() {
        assert!(MetronomeError::device_allocation("no uinput").is_device_failure());
        assert!(MetronomeError::device_registration("dev", "busy").is_device_failure());
        assert!(!MetronomeError::hotkey("no display").is_device_failure());
    }
}
