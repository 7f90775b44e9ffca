//! Per-request execution context.
//!
//! A [`Context`] carries one request through its handler chain. It owns the
//! request, a buffered response, the path parameters bound by the router and
//! the ordered list of handlers to run. Handlers move the chain forward with
//! [`Context::next`]:
//!
//! ```
//! use draft_core::{handler_fn, Context};
//!
//! let outer = handler_fn(|c: &mut Context| {
//!     c.set_header("x-outer", "before");
//!     c.next();
//!     // The inner handler has already written its response here.
//!     assert_eq!(c.status_code(), http::StatusCode::CREATED);
//! });
//! let inner = handler_fn(|c: &mut Context| c.string(201, "created"));
//!
//! let mut ctx = Context::new();
//! ctx.prepare(http::Request::new(bytes::Bytes::new()), None);
//! ctx.push_handlers([outer, inner]);
//! ctx.next();
//!
//! let response = ctx.take_response();
//! assert_eq!(response.status(), 201);
//! ```
//!
//! Contexts are recycled by the [`ContextPool`](crate::ContextPool), so a
//! handler must not keep anything it borrowed from one after it returns.

use std::fmt::{self, Display};
use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use draft_router::Params;
use http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use http::{Method, StatusCode};
use percent_encoding::percent_decode_str;
use serde::Serialize;
use uuid::Uuid;

use crate::error::DraftError;
use crate::fs::content_type;
use crate::render::HtmlRenderer;
use crate::response::ResponseWriter;
use crate::types::{HandlerFunc, Request, Response};

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
const APPLICATION_JSON: &str = "application/json";
const TEXT_HTML: &str = "text/html; charset=utf-8";
const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// Request-scoped state threaded through the handler chain.
pub struct Context {
    request: Request,
    response: ResponseWriter,
    path: String,
    method: Method,
    params: Params,
    request_id: Uuid,
    handlers: Vec<HandlerFunc>,
    // index of the next handler to run
    cursor: usize,
    aborted: bool,
    renderer: Option<Arc<HtmlRenderer>>,
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("params", &self.params)
            .field("request_id", &self.request_id)
            .field("handlers", &self.handlers.len())
            .field("cursor", &self.cursor)
            .field("aborted", &self.aborted)
            .finish_non_exhaustive()
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Context {
    /// Creates an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self {
            request: Request::new(Bytes::new()),
            response: ResponseWriter::new(),
            path: String::new(),
            method: Method::GET,
            params: Params::new(),
            request_id: Uuid::nil(),
            handlers: Vec::new(),
            cursor: 0,
            aborted: false,
            renderer: None,
        }
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Clears every piece of per-request state.
    ///
    /// Allocated capacity (handler list, path, response buffer) is kept.
    pub fn reset(&mut self) {
        self.request = Request::new(Bytes::new());
        self.response.reset();
        self.path.clear();
        self.method = Method::GET;
        self.params.clear();
        self.request_id = Uuid::nil();
        self.handlers.clear();
        self.cursor = 0;
        self.aborted = false;
        self.renderer = None;
    }

    /// Loads a request into the context.
    ///
    /// The path used for routing is percent-decoded. A path whose escapes do
    /// not decode to UTF-8 is routed as received.
    pub fn prepare(&mut self, request: Request, renderer: Option<Arc<HtmlRenderer>>) {
        let raw = request.uri().path();
        match percent_decode_str(raw).decode_utf8() {
            Ok(decoded) => self.path.push_str(&decoded),
            Err(_) => self.path.push_str(raw),
        }
        self.method = request.method().clone();
        self.request = request;
        self.request_id = Uuid::now_v7();
        self.renderer = renderer;
    }

    /// Appends handlers to the chain.
    pub fn push_handlers<I>(&mut self, handlers: I)
    where
        I: IntoIterator<Item = HandlerFunc>,
    {
        self.handlers.extend(handlers);
    }

    /// Appends a single handler to the chain.
    pub fn push_handler(&mut self, handler: HandlerFunc) {
        self.handlers.push(handler);
    }

    /// Replaces the bound path parameters.
    pub fn set_params(&mut self, params: Params) {
        self.params = params;
    }

    /// Moves the buffered response out of the context.
    pub fn take_response(&mut self) -> Response {
        self.response.take()
    }

    // ------------------------------------------------------------------
    // Continuation
    // ------------------------------------------------------------------

    /// Runs the next handler in the chain.
    ///
    /// When the handler returns, control comes back to the caller, which can
    /// then inspect or amend the response. A handler that never calls `next`
    /// ends the chain there. Once the chain is exhausted or aborted, calling
    /// `next` does nothing.
    pub fn next(&mut self) {
        if self.aborted {
            return;
        }
        if let Some(handler) = self.handlers.get(self.cursor).cloned() {
            self.cursor += 1;
            handler(self);
        }
    }

    /// Stops the chain without writing anything.
    ///
    /// Handlers that already started keep running to completion when control
    /// returns to them, but no further handler is entered.
    pub fn abort(&mut self) {
        self.aborted = true;
        self.cursor = self.handlers.len();
    }

    /// Stops the chain and replaces the response with `{"message": ...}`.
    pub fn fail(&mut self, code: u16, message: impl Into<String>) {
        self.abort();
        self.response.reset();
        let body = serde_json::json!({ "message": message.into() });
        self.write_json(status_from(code), body.to_string().into_bytes());
    }

    /// Returns true once [`abort`](Self::abort) or [`fail`](Self::fail) ran.
    #[must_use]
    pub fn is_aborted(&self) -> bool {
        self.aborted
    }

    /// Returns the position of the next handler to run.
    #[must_use]
    pub fn index(&self) -> usize {
        self.cursor
    }

    /// Returns the length of the handler chain.
    #[must_use]
    pub fn chain_len(&self) -> usize {
        self.handlers.len()
    }

    // ------------------------------------------------------------------
    // Request accessors
    // ------------------------------------------------------------------

    /// Returns the request.
    #[must_use]
    pub fn request(&self) -> &Request {
        &self.request
    }

    /// Returns the request method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the percent-decoded request path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the request path exactly as it appeared in the URI.
    #[must_use]
    pub fn raw_path(&self) -> &str {
        self.request.uri().path()
    }

    /// Returns the bound path parameters.
    #[must_use]
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Returns a path parameter by name.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }

    /// Returns the identifier assigned to this request.
    #[must_use]
    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    /// Returns the first query-string value for `name`.
    #[must_use]
    pub fn query(&self, name: &str) -> Option<String> {
        let query = self.request.uri().query()?;
        lookup(serde_urlencoded::from_str(query).ok()?, name)
    }

    /// Returns a form value, looking at an urlencoded body first and the
    /// query string second.
    #[must_use]
    pub fn post_form(&self, name: &str) -> Option<String> {
        let is_form = self
            .request
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with(FORM_URLENCODED));

        if is_form {
            let pairs = serde_urlencoded::from_bytes(self.request.body()).ok();
            if let Some(value) = pairs.and_then(|pairs| lookup(pairs, name)) {
                return Some(value);
            }
        }
        self.query(name)
    }

    /// Returns the second-to-last `/` segment of the request URI.
    ///
    /// For `/articles/golang/42` this is `golang`.
    #[must_use]
    pub fn query_type(&self) -> Option<&str> {
        let mut segments = self.request_uri().rsplit('/');
        segments.next()?;
        segments.next()
    }

    /// Returns the last `/` segment of the request URI, query included.
    ///
    /// For `/articles/golang/42` this is `42`.
    #[must_use]
    pub fn query_param(&self) -> Option<&str> {
        self.request_uri().rsplit('/').next()
    }

    fn request_uri(&self) -> &str {
        self.request
            .uri()
            .path_and_query()
            .map_or("", http::uri::PathAndQuery::as_str)
    }

    // ------------------------------------------------------------------
    // Response writers
    // ------------------------------------------------------------------

    /// Returns the buffered response.
    #[must_use]
    pub fn response(&self) -> &ResponseWriter {
        &self.response
    }

    /// Returns the buffered response for direct modification.
    pub fn response_mut(&mut self) -> &mut ResponseWriter {
        &mut self.response
    }

    /// Returns the response status code written so far.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        self.response.status()
    }

    /// Sets the response status code.
    ///
    /// Codes outside `100..=999` are logged and replaced by 500.
    pub fn status(&mut self, code: u16) {
        self.response.set_status(status_from(code));
    }

    /// Sets a response header, replacing any previous value.
    ///
    /// Invalid names or values are logged and ignored.
    pub fn set_header(&mut self, key: &str, value: &str) {
        match (
            HeaderName::from_bytes(key.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => self.response.insert_header(name, value),
            _ => tracing::warn!(header = key, "Ignoring invalid response header"),
        }
    }

    /// Writes a plain-text response.
    ///
    /// Accepts anything printable, including `format_args!`.
    pub fn string(&mut self, code: u16, text: impl Display) {
        self.status(code);
        self.response
            .insert_header(CONTENT_TYPE, HeaderValue::from_static(TEXT_PLAIN));
        self.response
            .body_mut()
            .extend_from_slice(text.to_string().as_bytes());
    }

    /// Writes a JSON response. Encoding failures turn into a 500 failure.
    pub fn json<T: Serialize + ?Sized>(&mut self, code: u16, value: &T) {
        match serde_json::to_vec(value) {
            Ok(body) => self.write_json(status_from(code), body),
            Err(e) => self.fail(500, e.to_string()),
        }
    }

    /// Writes raw bytes.
    pub fn data(&mut self, code: u16, bytes: &[u8]) {
        self.status(code);
        self.response.write(bytes);
    }

    /// Renders a loaded HTML template.
    pub fn html<T: Serialize + ?Sized>(&mut self, code: u16, name: &str, data: &T) {
        let rendered = match &self.renderer {
            Some(renderer) => renderer.render(name, data),
            None => Err(DraftError::TemplatesNotLoaded),
        };
        match rendered {
            Ok(html) => {
                self.status(code);
                self.response
                    .insert_header(CONTENT_TYPE, HeaderValue::from_static(TEXT_HTML));
                self.response.write(html.as_bytes());
            }
            Err(e) => {
                tracing::error!(template = name, error = %e, "Template rendering failed");
                self.fail(500, e.to_string());
            }
        }
    }

    /// Sends a file from disk with a content type derived from its extension.
    ///
    /// Missing files answer 404 and unreadable ones 403 or 500.
    pub fn file<P: AsRef<Path>>(&mut self, path: P) {
        let path = path.as_ref();
        let result = if path.is_dir() {
            Err(DraftError::Io(std::io::Error::from(
                std::io::ErrorKind::NotFound,
            )))
        } else {
            std::fs::read(path).map_err(DraftError::from)
        };

        match result {
            Ok(bytes) => {
                let name = path.to_string_lossy();
                self.serve_bytes(&name, &bytes);
            }
            Err(e) => {
                let code = e.status_code();
                tracing::debug!(path = %path.display(), error = %e, "File not served");
                self.string(
                    code.as_u16(),
                    format_args!(
                        "{} {}",
                        code.as_u16(),
                        code.canonical_reason().unwrap_or_default()
                    ),
                );
            }
        }
    }

    /// Streams `reader` as the response body, typed after `name`.
    pub fn serve_content(&mut self, name: &str, mut reader: impl std::io::Read) {
        let mut bytes = Vec::new();
        match reader.read_to_end(&mut bytes) {
            Ok(_) => self.serve_bytes(name, &bytes),
            Err(e) => self.fail(500, e.to_string()),
        }
    }

    fn serve_bytes(&mut self, name: &str, bytes: &[u8]) {
        if let Ok(value) = HeaderValue::from_str(content_type(name)) {
            self.response.insert_header(CONTENT_TYPE, value);
        }
        self.data(200, bytes);
    }

    fn write_json(&mut self, code: StatusCode, body: Vec<u8>) {
        self.response.set_status(code);
        self.response
            .insert_header(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
        self.response.write(&body);
    }
}

fn status_from(code: u16) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or_else(|_| {
        tracing::warn!(code, "Invalid status code, using 500");
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

fn lookup(pairs: Vec<(String, String)>, name: &str) -> Option<String> {
    pairs.into_iter().find(|(k, _)| k == name).map(|(_, v)| v)
}
