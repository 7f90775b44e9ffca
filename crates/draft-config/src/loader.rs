//! Layered configuration loading.
//!
//! Later layers override earlier ones:
//!
//! 1. built-in defaults (or a preset)
//! 2. a TOML or JSON file, picked by extension
//! 3. environment variables named `PREFIX__SECTION__KEY`

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use draft_telemetry::LogFormat;

use crate::{ConfigError, DraftConfig, TlsSection};

/// Default environment variable prefix.
pub const DEFAULT_ENV_PREFIX: &str = "DRAFT";

/// Builds a [`DraftConfig`] from defaults, files and the environment.
///
/// ```no_run
/// use draft_config::ConfigLoader;
///
/// # fn main() -> Result<(), draft_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_optional_file("draft.toml")?
///     .with_env_prefix("DRAFT")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct ConfigLoader {
    config: DraftConfig,
    env_prefix: Option<String>,
    sources: Vec<PathBuf>,
}

impl ConfigLoader {
    /// Starts from [`DraftConfig::default`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from [`DraftConfig::development`].
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = DraftConfig::development();
        self
    }

    /// Starts from [`DraftConfig::production`].
    #[must_use]
    pub fn with_production(mut self) -> Self {
        self.config = DraftConfig::production();
        self
    }

    /// Replaces the configuration with the contents of a `.toml` or `.json`
    /// file. Fields the file leaves out take their default values.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }
        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;

        let format = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        self.config = parse(&content, format).map_err(|e| match e {
            ConfigError::UnsupportedFormat(_) => {
                ConfigError::UnsupportedFormat(path.display().to_string())
            }
            other => other,
        })?;
        self.sources.push(path.to_path_buf());
        Ok(self)
    }

    /// Like [`with_file`](Self::with_file), but a missing file is skipped.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Replaces the configuration with `content`, given as `"toml"` or `"json"`.
    ///
    /// ```
    /// use draft_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string("[server]\nhttp_addr = \"127.0.0.1:3000\"", "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    /// assert_eq!(config.server.http_addr, "127.0.0.1:3000");
    /// ```
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        self.config = parse(content, format)?;
        Ok(self)
    }

    /// Applies `PREFIX__SECTION__KEY` environment variables when loading.
    ///
    /// For example `DRAFT__SERVER__HTTP_ADDR=0.0.0.0:9000` or
    /// `DRAFT__LOGGING__FORMAT=pretty`.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Loads `.env` from the working directory into the process environment.
    ///
    /// A missing file is not an error; a malformed one is.
    pub fn with_dotenv(self) -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(_) => Ok(self),
            Err(e) if e.not_found() => Ok(self),
            Err(e) => Err(e.into()),
        }
    }

    /// Files loaded so far.
    #[must_use]
    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }

    /// Applies environment overrides and validates.
    pub fn load(self) -> Result<DraftConfig, ConfigError> {
        let config = self.load_unvalidated()?;
        config.validate()?;
        Ok(config)
    }

    /// Applies environment overrides without validating.
    pub fn load_unvalidated(mut self) -> Result<DraftConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            let mut vars: Vec<(String, String)> = env::vars()
                .filter(|(k, _)| k.starts_with(&prefix))
                .collect();
            vars.sort();
            apply_env_vars(&mut self.config, &prefix, vars)?;
        }
        Ok(self.config)
    }
}

fn parse(content: &str, format: &str) -> Result<DraftConfig, ConfigError> {
    match format.to_ascii_lowercase().as_str() {
        "toml" => Ok(toml::from_str(content)?),
        "json" => Ok(serde_json::from_str(content)?),
        other => Err(ConfigError::UnsupportedFormat(other.to_string())),
    }
}

fn apply_env_vars<I>(config: &mut DraftConfig, prefix: &str, vars: I) -> Result<(), ConfigError>
where
    I: IntoIterator<Item = (String, String)>,
{
    for (key, value) in vars {
        apply_env_var(config, prefix, &key, &value)?;
    }
    Ok(())
}

fn apply_env_var(
    config: &mut DraftConfig,
    prefix: &str,
    key: &str,
    value: &str,
) -> Result<(), ConfigError> {
    let Some(path) = key
        .strip_prefix(prefix)
        .and_then(|k| k.strip_prefix("__"))
    else {
        return Ok(());
    };
    let parts: Vec<&str> = path.split("__").collect();

    match parts.as_slice() {
        ["SERVER", "HTTP_ADDR"] => config.server.http_addr = value.to_string(),
        ["SERVER", "SHUTDOWN_TIMEOUT_SECS"] => {
            config.server.shutdown_timeout_secs = parse_number(key, value)?;
        }
        ["SERVER", "MAX_BODY_BYTES"] => config.server.max_body_bytes = parse_number(key, value)?,
        ["SERVER", "POOL_CAPACITY"] => config.server.pool_capacity = parse_number(key, value)?,
        ["SERVER", "TLS", "CERT_FILE"] => tls_section(config).cert_file = value.into(),
        ["SERVER", "TLS", "KEY_FILE"] => tls_section(config).key_file = value.into(),

        ["LOGGING", "ENABLED"] => config.logging.enabled = parse_flag(key, value)?,
        ["LOGGING", "LEVEL"] => config.logging.level = value.to_string(),
        ["LOGGING", "FORMAT"] => {
            config.logging.format = value.parse::<LogFormat>().map_err(|_| {
                ConfigError::env_parse_error(key, "expected 'json', 'pretty' or 'compact'")
            })?;
        }
        ["LOGGING", "FILE_LINE_INFO"] => config.logging.file_line_info = parse_flag(key, value)?,
        ["LOGGING", "THREAD_IDS"] => config.logging.thread_ids = parse_flag(key, value)?,

        ["TEMPLATES", "GLOB"] => {
            config.templates.glob = (!value.is_empty()).then(|| value.to_string());
        }

        _ => return Err(ConfigError::env_parse_error(key, "unknown configuration key")),
    }
    Ok(())
}

fn tls_section(config: &mut DraftConfig) -> &mut TlsSection {
    config.server.tls.get_or_insert_with(|| TlsSection {
        cert_file: PathBuf::new(),
        key_file: PathBuf::new(),
    })
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::env_parse_error(key, "expected integer"))
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::env_parse_error(key, "expected boolean")),
    }
}
