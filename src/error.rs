//! Custom error types for autochain.
//!
//! Every fallible step of the continuation pipeline returns one of these.
//! The engine never lets them reach the host: they are logged and mapped to
//! a silent "no decision" at a single point (see [`crate::engine`]).

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for autochain operations
#[derive(Error, Debug)]
pub enum AutochainError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Failed to load configuration
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        path: Option<PathBuf>,
    },

    /// Invalid configuration value
    #[error("Invalid configuration: {field} - {reason}")]
    InvalidConfig { field: String, reason: String },

    // =========================================================================
    // Workflow State Errors
    // =========================================================================
    /// Signal file could not be read or consumed
    #[error("Signal error at {path}: {message}")]
    Signal { path: PathBuf, message: String },

    /// Transcript could not be read
    #[error("Transcript error: {message}")]
    Transcript { message: String },

    // =========================================================================
    // Hook Input Errors
    // =========================================================================
    /// Host did not close stdin before the deadline
    #[error("Timed out after {millis}ms waiting for hook input")]
    InputTimeout { millis: u64 },

    /// Hook input was not a valid payload
    #[error("Invalid hook input: {reason}")]
    InvalidInput { reason: String },

    // =========================================================================
    // Wrapped Errors
    // =========================================================================
    /// IO error wrapper
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON error wrapper
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl AutochainError {
    // =========================================================================
    // Constructor helpers
    // =========================================================================

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            path: None,
        }
    }

    /// Create a configuration error with path
    pub fn config_with_path(message: impl Into<String>, path: PathBuf) -> Self {
        Self::Config {
            message: message.into(),
            path: Some(path),
        }
    }

    /// Create a signal error
    pub fn signal(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Signal {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a transcript error
    pub fn transcript(message: impl Into<String>) -> Self {
        Self::Transcript {
            message: message.into(),
        }
    }

    // =========================================================================
    // Classification helpers
    // =========================================================================

    /// Check if this error is an expected absence that should not be logged
    /// above debug level (missing files, closed input, and the like)
    pub fn is_silent(&self) -> bool {
        match self {
            Self::Io(e) => e.kind() == std::io::ErrorKind::NotFound,
            Self::InputTimeout { .. } | Self::InvalidInput { .. } => true,
            _ => false,
        }
    }

    /// Get error code for exit status of the management subcommands.
    ///
    /// The `stop` hook always exits 0 regardless of this value.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config { .. } | Self::InvalidConfig { .. } => 7,
            Self::Signal { .. } => 3,
            Self::InputTimeout { .. } | Self::InvalidInput { .. } => 2,
            _ => 1,
        }
    }
}

/// Type alias for autochain results
pub type Result<T> = std::result::Result<T, AutochainError>;

/// Extension trait for converting foreign errors to [`AutochainError`]
pub trait IntoAutochainError<T> {
    fn into_config_error(self) -> Result<T>;
}

impl<T, E: Into<anyhow::Error>> IntoAutochainError<T> for std::result::Result<T, E> {
    fn into_config_error(self) -> Result<T> {
        self.map_err(|e| AutochainError::config(e.into().to_string()))
    }
}
