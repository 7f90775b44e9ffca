//! The root configuration type.

use std::net::SocketAddr;
use std::time::Duration;

use draft_telemetry::{LogConfig, LogFormat};
use serde::{Deserialize, Serialize};

use crate::{ConfigError, LoggingSection, ServerSection, TemplatesSection};

/// Complete Draft service configuration.
///
/// Load it with [`ConfigLoader`](crate::ConfigLoader).
///
/// ```
/// use draft_config::DraftConfig;
///
/// let config = DraftConfig::default();
/// assert!(config.validate().is_ok());
/// assert_eq!(config.server.http_addr, "0.0.0.0:8080");
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DraftConfig {
    /// Listener settings.
    #[serde(default)]
    pub server: ServerSection,

    /// Log output settings.
    #[serde(default)]
    pub logging: LoggingSection,

    /// Template loading.
    #[serde(default)]
    pub templates: TemplatesSection,
}

impl DraftConfig {
    /// Local development preset: loopback address, pretty debug logs.
    #[must_use]
    pub fn development() -> Self {
        Self {
            server: ServerSection {
                http_addr: "127.0.0.1:8080".to_string(),
                shutdown_timeout_secs: 5,
                ..ServerSection::default()
            },
            logging: LoggingSection {
                level: "debug".to_string(),
                format: LogFormat::Pretty,
                file_line_info: true,
                ..LoggingSection::default()
            },
            templates: TemplatesSection::default(),
        }
    }

    /// Production preset: JSON logs at info level.
    #[must_use]
    pub fn production() -> Self {
        Self::default()
    }

    /// Checks values that deserialization cannot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.http_addr.parse::<SocketAddr>().is_err() {
            return Err(ConfigError::invalid_value(
                "server.http_addr",
                format!("invalid socket address: {}", self.server.http_addr),
            ));
        }
        if self.server.max_body_bytes == 0 {
            return Err(ConfigError::invalid_value(
                "server.max_body_bytes",
                "must be greater than zero",
            ));
        }
        if let Some(tls) = &self.server.tls {
            if tls.cert_file.as_os_str().is_empty() || tls.key_file.as_os_str().is_empty() {
                return Err(ConfigError::invalid_value(
                    "server.tls",
                    "cert_file and key_file are both required",
                ));
            }
        }
        if let Err(e) = draft_telemetry::create_env_filter(&self.logging.level) {
            return Err(ConfigError::invalid_value("logging.level", e.to_string()));
        }
        if matches!(&self.templates.glob, Some(glob) if glob.trim().is_empty()) {
            return Err(ConfigError::invalid_value("templates.glob", "must not be empty"));
        }
        Ok(())
    }

    /// Returns the shutdown timeout as a [`Duration`].
    #[must_use]
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.server.shutdown_timeout_secs)
    }

    /// Builds the logging setup described by the `[logging]` section.
    #[must_use]
    pub fn log_config(&self) -> LogConfig {
        let preset = match self.logging.format {
            LogFormat::Pretty => LogConfig::development(),
            LogFormat::Json | LogFormat::Compact => LogConfig::production(),
        };
        LogConfig {
            enabled: self.logging.enabled,
            level: self.logging.level.clone(),
            format: self.logging.format,
            file_line_info: self.logging.file_line_info,
            thread_ids: self.logging.thread_ids,
            ..preset
        }
    }
}
