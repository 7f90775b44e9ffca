//! # Draft
//!
//! A minimal HTTP routing and middleware engine.
//!
//! - routes with literal, `:name` and `*name` segments, resolved by a
//!   per-method segment trie
//! - route groups whose middleware applies to every path under their prefix
//! - a request [`Context`](prelude::Context) with an explicit `next()`
//!   continuation, `abort()` and `fail()`
//! - pooled contexts, HTML templates, static files, panic recovery and an
//!   HTTP or HTTPS listener
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use draft::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut engine = Engine::default_stack();
//!
//!     engine.get("/", |c| c.string(200, "welcome"))?;
//!
//!     let mut api = engine.group("/api");
//!     api.use_middleware([handler_fn(|c: &mut Context| {
//!         if c.request().headers().get("authorization").is_none() {
//!             c.fail(401, "unauthorized");
//!             return;
//!         }
//!         c.next();
//!     })]);
//!     api.get("/users/:id", |c| {
//!         let id = c.param("id").unwrap_or_default().to_owned();
//!         c.json(200, &json!({ "id": id }));
//!     })?;
//!
//!     engine.run("0.0.0.0:8080")?;
//!     Ok(())
//! }
//! ```
//!
//! ## Configured start-up
//!
//! [`run`] reads `draft.toml`, `.env` and `DRAFT__*` variables, installs
//! logging and serves until SIGINT or SIGTERM.

#![doc(html_root_url = "https://docs.rs/draft/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod app;

pub use app::{engine_from_config, init_logging, run, serve, server_config, AppError};

pub use draft_config as config;
pub use draft_core as core;
pub use draft_router as router;
pub use draft_server as server;
pub use draft_telemetry as telemetry;

/// Common imports.
///
/// ```rust
/// use draft::prelude::*;
/// ```
pub mod prelude {
    pub use draft_core::{handler_fn, Context, DraftError, HandlerFunc, Params, H};
    pub use draft_server::{middleware, Engine, RegistrationError, RouterGroup, ServerError};
    pub use serde_json::json;
}
