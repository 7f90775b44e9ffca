//! Starting an engine from a [`DraftConfig`].

use draft_config::DraftConfig;
use draft_server::{Engine, RegistrationError, Server, ServerConfig, ServerError, TlsFiles};
use draft_telemetry::TelemetryError;
use thiserror::Error;

/// Errors raised while bringing a service up.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be loaded or is invalid.
    #[error(transparent)]
    Config(#[from] draft_config::ConfigError),

    /// Logging could not be initialised.
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),

    /// Routes or templates could not be registered.
    #[error(transparent)]
    Registration(#[from] RegistrationError),

    /// The listener failed.
    #[error(transparent)]
    Server(#[from] ServerError),

    /// The runtime could not be started.
    #[error("failed to start runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

/// Listener settings taken from the `[server]` section.
#[must_use]
pub fn server_config(config: &DraftConfig) -> ServerConfig {
    let mut builder = ServerConfig::builder()
        .http_addr(config.server.http_addr.clone())
        .shutdown_timeout(config.shutdown_timeout())
        .max_body_bytes(config.server.max_body_bytes);
    if let Some(tls) = &config.server.tls {
        builder = builder.tls(TlsFiles::new(&tls.cert_file, &tls.key_file));
    }
    builder.build()
}

/// An engine with the logger and recovery middleware, the configured pool
/// capacity and the configured templates.
pub fn engine_from_config(config: &DraftConfig) -> Result<Engine, RegistrationError> {
    let mut engine = Engine::default_stack();
    engine.pool_capacity(config.server.pool_capacity);
    if let Some(glob) = &config.templates.glob {
        engine.load_html_glob(glob)?;
    }
    Ok(engine)
}

/// Installs logging as described by the `[logging]` section.
pub fn init_logging(config: &DraftConfig) -> Result<(), TelemetryError> {
    draft_telemetry::init_logging(&config.log_config())
}

/// Serves `engine` with the configured listener until SIGINT or SIGTERM.
///
/// Logging is not touched; call [`init_logging`] first if wanted.
pub async fn serve(engine: Engine, config: &DraftConfig) -> Result<(), AppError> {
    let dispatcher = engine.build();
    tracing::info!(
        address = %config.server.http_addr,
        tls = config.server.tls.is_some(),
        routes = dispatcher.router().len(),
        "Starting server"
    );
    Server::new(dispatcher, server_config(config)).run().await?;
    Ok(())
}

/// Loads configuration, initialises logging, lets `routes` register handlers
/// and serves until SIGINT or SIGTERM.
///
/// Configuration comes from `draft.toml` (if present), `.env` and `DRAFT__*`
/// environment variables.
///
/// ```rust,no_run
/// fn main() -> Result<(), draft::AppError> {
///     draft::run(|engine| {
///         engine.get("/", |c| c.string(200, "hello"))?;
///         Ok(())
///     })
/// }
/// ```
pub fn run<F>(routes: F) -> Result<(), AppError>
where
    F: FnOnce(&mut Engine) -> Result<(), RegistrationError>,
{
    let config = draft_config::ConfigLoader::new()
        .with_optional_file("draft.toml")?
        .with_dotenv()?
        .with_env_prefix(draft_config::DEFAULT_ENV_PREFIX)
        .load()?;
    init_logging(&config)?;

    let mut engine = engine_from_config(&config)?;
    routes(&mut engine)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(serve(engine, &config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use draft_config::TlsSection;
    use std::time::Duration;

    #[test]
    fn test_server_config_from_sections() {
        let mut config = DraftConfig::default();
        config.server.http_addr = "127.0.0.1:9443".to_string();
        config.server.shutdown_timeout_secs = 3;
        config.server.max_body_bytes = 512;
        config.server.tls = Some(TlsSection {
            cert_file: "cert.pem".into(),
            key_file: "key.pem".into(),
        });

        let server = server_config(&config);
        assert_eq!(server.http_addr(), "127.0.0.1:9443");
        assert_eq!(server.shutdown_timeout(), Duration::from_secs(3));
        assert_eq!(server.max_body_bytes(), 512);
        let tls = server.tls().unwrap();
        assert_eq!(tls.cert_path, std::path::PathBuf::from("cert.pem"));
    }

    #[test]
    fn test_engine_from_config_without_templates() {
        let mut config = DraftConfig::default();
        config.server.pool_capacity = 2;
        let dispatcher = engine_from_config(&config).unwrap().build();
        assert_eq!(dispatcher.pool().capacity(), 2);
    }

    #[test]
    fn test_engine_from_config_bad_template_glob() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.html"), "{% if %}").unwrap();
        let mut config = DraftConfig::default();
        config.templates.glob = Some(format!("{}/*.html", dir.path().display()));
        assert!(engine_from_config(&config).is_err());
    }
}
