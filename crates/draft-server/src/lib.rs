//! # Draft Server
//!
//! Route registration, request dispatch and the HTTP/TLS listener.
//!
//! - [`Engine`] and [`RouterGroup`] register routes, middleware, static
//!   files and templates
//! - [`Dispatcher`] is the built, read-only engine that runs one request
//! - [`Server`] accepts connections and feeds them to the dispatcher
//!
//! ## Example
//!
//! ```rust,no_run
//! use draft_server::Engine;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut engine = Engine::default_stack();
//!     engine.get("/hello/:name", |c| {
//!         let name = c.param("name").unwrap_or_default().to_owned();
//!         c.string(200, format_args!("hello {name}"));
//!     })?;
//!
//!     let mut api = engine.group("/api");
//!     api.get("/ping", |c| c.json(200, &serde_json::json!({"pong": true})))?;
//!
//!     engine.run("127.0.0.1:8080")?;
//!     Ok(())
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/draft-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod dispatcher;
mod engine;
mod error;
pub mod middleware;
mod server;
mod shutdown;
mod static_files;

pub use config::{
    ServerConfig, ServerConfigBuilder, TlsFiles, DEFAULT_HTTP_ADDR, DEFAULT_MAX_BODY_BYTES,
    DEFAULT_SHUTDOWN_TIMEOUT_SECS,
};
pub use dispatcher::Dispatcher;
pub use engine::{Engine, RouterGroup, ANY_METHODS};
pub use error::{RegistrationError, RegistrationResult, ServerError};
pub use server::{dispatch, load_tls_config, Server};
pub use shutdown::{ConnectionGuard, ConnectionTracker, ShutdownSignal};
pub use static_files::FILEPATH_PARAM;
