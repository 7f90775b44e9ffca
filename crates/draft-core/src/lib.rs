//! # Draft Core
//!
//! Request context and handler chain for the Draft HTTP engine.
//!
//! This crate provides the per-request building blocks that the server crate
//! wires together:
//!
//! - [`Context`] - Request state, response writers and the `next` continuation
//! - [`HandlerFunc`] - The single handler/middleware type
//! - [`ContextPool`] - Recycles contexts across requests
//! - [`HtmlRenderer`] - Template rendering backed by Tera
//! - [`FileSystem`] / [`Dir`] - File access for static routes
//! - [`DraftError`] - Errors raised while building a response

#![doc(html_root_url = "https://docs.rs/draft-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod context;
mod error;
pub mod fs;
mod pool;
mod render;
mod response;
mod types;

pub use context::Context;
pub use draft_router::Params;
pub use error::{DraftError, DraftResult};
pub use fs::{content_type, Dir, FileSystem};
pub use pool::{ContextPool, PooledContext, DEFAULT_POOL_CAPACITY};
pub use render::HtmlRenderer;
pub use response::ResponseWriter;
pub use types::{handler_fn, HandlerFunc, Request, Response, H};

/// Template engine used by [`HtmlRenderer`].
pub use tera;
/// Trait implemented by template filters.
pub use tera::Filter as TemplateFilter;
