//! Structured logging for Draft services.
//!
//! Draft logs through [`tracing`]. This crate installs a
//! `tracing-subscriber` formatter configured from a [`LogConfig`]: JSON lines
//! for production, a multi-line pretty format for development, or a compact
//! single-line format.
//!
//! # Example
//!
//! ```rust,no_run
//! use draft_telemetry::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::development())?;
//! tracing::info!(request_id = "abc", "Processing request");
//! # Ok::<(), draft_telemetry::TelemetryError>(())
//! ```

#![doc(html_root_url = "https://docs.rs/draft-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
pub mod logging;

pub use error::TelemetryError;
pub use logging::{create_env_filter, init_logging, LogConfig, LogFormat, ENV_FILTER_VAR};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
