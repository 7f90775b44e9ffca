//! Telemetry error types.

use thiserror::Error;

/// Errors raised while setting up logging.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The filter directive could not be parsed.
    #[error("Invalid log filter '{directive}': {reason}")]
    InvalidFilter {
        /// Directive as given.
        directive: String,
        /// Parser message.
        reason: String,
    },

    /// Unknown output format name.
    #[error("Unknown log format: {0}")]
    UnknownFormat(String),

    /// A global subscriber is already installed.
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),
}
