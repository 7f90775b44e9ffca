//! Common types shared by the context, the dispatcher and the server.

use std::sync::Arc;

use bytes::Bytes;
use http_body_util::Full;

use crate::context::Context;

/// The HTTP request type seen by handlers.
///
/// The body is collected before dispatch, so handlers never await I/O.
pub type Request = http::Request<Bytes>;

/// The HTTP response type produced by a dispatch.
pub type Response = http::Response<Full<Bytes>>;

/// A registered handler or middleware.
///
/// Every routing API stores handlers in this form. A handler receives the
/// request context, produces no value and signals completion by returning,
/// optionally after calling [`Context::next`].
pub type HandlerFunc = Arc<dyn Fn(&mut Context) + Send + Sync + 'static>;

/// Loosely typed JSON object for quick responses.
///
/// ```
/// use draft_core::H;
///
/// let mut body = H::new();
/// body.insert("message".to_string(), "hello".into());
/// assert_eq!(serde_json::to_string(&body).unwrap(), r#"{"message":"hello"}"#);
/// ```
pub type H = serde_json::Map<String, serde_json::Value>;

/// Wraps a closure into a [`HandlerFunc`].
pub fn handler_fn<F>(f: F) -> HandlerFunc
where
    F: Fn(&mut Context) + Send + Sync + 'static,
{
    Arc::new(f)
}
