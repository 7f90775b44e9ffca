//! Configuration sections.

use std::path::PathBuf;

use draft_telemetry::LogFormat;
use serde::{Deserialize, Serialize};

/// `[server]` section.
///
/// ```
/// use draft_config::ServerSection;
///
/// let server = ServerSection::default();
/// assert_eq!(server.http_addr, "0.0.0.0:8080");
/// assert!(server.tls.is_none());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    /// Listen address, e.g. `0.0.0.0:8080`.
    #[serde(default = "default_http_addr")]
    pub http_addr: String,

    /// Seconds to wait for open connections on shutdown.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,

    /// Largest accepted request body.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    /// Idle request contexts kept for reuse.
    #[serde(default = "default_pool_capacity")]
    pub pool_capacity: usize,

    /// Serve HTTPS with these files.
    #[serde(default)]
    pub tls: Option<TlsSection>,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            http_addr: default_http_addr(),
            shutdown_timeout_secs: default_shutdown_timeout(),
            max_body_bytes: default_max_body_bytes(),
            pool_capacity: default_pool_capacity(),
            tls: None,
        }
    }
}

fn default_http_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_shutdown_timeout() -> u64 {
    30
}

fn default_max_body_bytes() -> usize {
    4 * 1024 * 1024
}

fn default_pool_capacity() -> usize {
    1024
}

/// `[server.tls]` section. Both files are PEM encoded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct TlsSection {
    /// Certificate chain.
    pub cert_file: PathBuf,
    /// Private key.
    pub key_file: PathBuf,
}

/// `[logging]` section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingSection {
    /// Install a log subscriber at startup.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Filter directive.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Include source locations.
    #[serde(default)]
    pub file_line_info: bool,

    /// Include thread ids.
    #[serde(default)]
    pub thread_ids: bool,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::default(),
            file_line_info: false,
            thread_ids: false,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

/// `[templates]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct TemplatesSection {
    /// Glob of HTML templates to load at startup, e.g. `templates/**/*.html`.
    #[serde(default)]
    pub glob: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_defaults_fill_missing_fields() {
        let server: ServerSection = toml::from_str(r#"http_addr = "127.0.0.1:9000""#).unwrap();
        assert_eq!(server.http_addr, "127.0.0.1:9000");
        assert_eq!(server.shutdown_timeout_secs, 30);
        assert_eq!(server.max_body_bytes, 4 * 1024 * 1024);
        assert_eq!(server.pool_capacity, 1024);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result: Result<ServerSection, _> = toml::from_str("port = 80");
        assert!(result.is_err());
    }

    #[test]
    fn test_logging_format_from_toml() {
        let logging: LoggingSection = toml::from_str(r#"format = "compact""#).unwrap();
        assert_eq!(logging.format, LogFormat::Compact);
        assert!(logging.enabled);
        assert_eq!(logging.level, "info");
    }
}
