//! Core error types for transferdesk-core.
//!
//! Only hard failures live here. Missing or late upstream data is reported
//! through [`DataError`] so callers can degrade instead of aborting, and the
//! "no candidates" / "tied chips" outcomes are ordinary results, not errors.

use std::path::PathBuf;
use thiserror::Error;

use crate::chips::ChipName;
use crate::gameweek::GameweekId;

/// Core error type for transferdesk-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Upstream data errors
    #[error("Data error: {0}")]
    Data(#[from] DataError),

    /// Chip usage bookkeeping errors
    #[error("Chip usage error: {0}")]
    ChipUsage(#[from] ChipUsageError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
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

    /// Key does not exist in the configuration tree
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Upstream data problems. None of these abort a planning cycle.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataError {
    /// Feed missing, late or unreadable
    #[error("{source_name} unavailable: {reason}")]
    DataUnavailable { source_name: String, reason: String },

    /// Fetch did not complete within the bounded wait
    #[error("{source_name} did not respond within {waited_ms}ms")]
    Timeout { source_name: String, waited_ms: u64 },

    /// A chip usage was recorded outside every window of that chip
    #[error("{chip} used in GW{gameweek}, outside every window of that chip")]
    InvalidWindow { chip: ChipName, gameweek: GameweekId },
}

impl DataError {
    pub fn unavailable(source_name: &str, reason: impl Into<String>) -> Self {
        DataError::DataUnavailable {
            source_name: source_name.to_string(),
            reason: reason.into(),
        }
    }
}

/// Errors raised when recording a confirmed chip usage.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChipUsageError {
    /// The instance already has a usage record
    #[error("{chip} #{instance} was already used in GW{used_in}")]
    AlreadyUsed {
        chip: ChipName,
        instance: u8,
        used_in: GameweekId,
    },

    /// No window of this chip contains the gameweek
    #[error("{chip} cannot be used in GW{gameweek}: no active window")]
    OutsideWindow { chip: ChipName, gameweek: GameweekId },
}

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Gameweek outside 1..=38
    #[error("Gameweek {0} is outside the season (1..=38)")]
    GameweekOutOfRange(GameweekId),

    /// Chip window with start after stop or outside the season
    #[error("Invalid window for {chip}: [{start_gw}, {stop_gw}]")]
    MalformedWindow {
        chip: ChipName,
        start_gw: GameweekId,
        stop_gw: GameweekId,
    },

    /// Empty collection
    #[error("Empty collection: {0}")]
    EmptyCollection(String),

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseFailed(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
