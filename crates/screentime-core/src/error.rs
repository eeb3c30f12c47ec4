//! Core error types for screentime-core.
//!
//! This module defines the error hierarchy using thiserror. Most of these
//! never cross the engine boundary: schedule and sink failures are logged
//! and degrade to "not blocking" instead of being propagated.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for screentime-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Schedule entry could not be interpreted
    #[error("Schedule error: {0}")]
    Schedule(#[from] ScheduleError),

    /// Outbound collaborator failed
    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),

    /// The engine task has exited and no longer accepts messages
    #[error("Engine is stopped")]
    EngineStopped,

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Schedule-specific errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    /// Time string is not two colon-separated integers in range
    #[error("Malformed time '{value}': expected HH:MM in 24-hour form")]
    MalformedTime { value: String },

    /// Day of week outside 1..=7
    #[error("Invalid day of week {0}: expected 1 (Monday) through 7 (Sunday)")]
    InvalidDay(u8),
}

/// Failures reported by outbound collaborators (overlay, balance sink).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SinkError {
    /// The channel to the collaborator is not available right now
    #[error("Sink unavailable: {0}")]
    Unavailable(String),

    /// The collaborator has gone away for good
    #[error("Sink closed")]
    Closed,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Key does not exist in the configuration
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Could not locate or create the configuration directory
    #[error("Failed to access config directory: {0}")]
    DataDir(String),
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
