//! # Draft Config
//!
//! Typed, layered configuration for Draft services.
//!
//! A [`DraftConfig`] has three sections, `[server]`, `[logging]` and
//! `[templates]`. Unknown keys are rejected so typos fail loudly.
//!
//! ```toml
//! [server]
//! http_addr = "0.0.0.0:8443"
//! shutdown_timeout_secs = 10
//!
//! [server.tls]
//! cert_file = "certs/server.crt"
//! key_file = "certs/server.key"
//!
//! [logging]
//! level = "info,draft_server=debug"
//! format = "json"
//!
//! [templates]
//! glob = "templates/**/*.html"
//! ```

#![doc(html_root_url = "https://docs.rs/draft-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::DraftConfig;
pub use error::ConfigError;
pub use loader::{ConfigLoader, DEFAULT_ENV_PREFIX};
pub use schema::{LoggingSection, ServerSection, TemplatesSection, TlsSection};
