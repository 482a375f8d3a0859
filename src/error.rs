//! Error types for the button device core.

use thiserror::Error;

use crate::hal::HalError;

/// Errors that can occur during button device operations.
#[derive(Error, Debug)]
pub enum ButtonError {
    /// All open slots are held; recoverable, caller may retry or open blocking.
    #[error("device busy: all {capacity} open slots held")]
    Busy {
        /// Configured open capacity.
        capacity: u32,
    },

    /// No event is pending on a non-blocking read; recoverable.
    #[error("no pending event")]
    WouldBlock,

    /// A blocking wait was cancelled by the interruption broadcast.
    #[error("blocking wait interrupted")]
    Interrupted,

    /// Bring-up failed; every already-acquired resource has been unwound.
    #[error("bring-up failed at {stage}: {source}")]
    BringUp {
        /// Sub-step that reported the failure.
        stage: &'static str,
        /// Collaborator error that caused the failure.
        #[source]
        source: HalError,
    },

    /// Configuration rejected by validation.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// Human-readable validation failure.
        reason: String,
    },

    /// IO error while loading configuration.
    #[error("config IO error: {source}")]
    Io {
        /// Source IO error.
        #[from]
        source: std::io::Error,
    },

    /// TOML parse error while loading configuration.
    #[error("config parse error: {source}")]
    Parse {
        /// Source TOML error.
        #[from]
        source: toml::de::Error,
    },
}

/// Result type for button device operations.
pub type ButtonResult<T> = Result<T, ButtonError>;
