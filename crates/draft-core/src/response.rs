//! Buffered response writer.
//!
//! Handlers write into a [`ResponseWriter`] owned by the context. Nothing
//! reaches the socket until the whole chain has finished, which is what lets
//! an explicit failure replace a partially written body with a clean error.

use bytes::{Bytes, BytesMut};
use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, StatusCode};
use http_body_util::Full;

use crate::types::Response;

/// In-memory response under construction.
#[derive(Debug)]
pub struct ResponseWriter {
    status: StatusCode,
    headers: HeaderMap,
    body: BytesMut,
    written: bool,
}

impl Default for ResponseWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseWriter {
    /// Creates an empty `200 OK` response.
    #[must_use]
    pub fn new() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: BytesMut::new(),
            written: false,
        }
    }

    /// Returns the current status code.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Sets the status code.
    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
        self.written = true;
    }

    /// Returns the response headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the response headers for modification.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Replaces a header value.
    pub fn insert_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.insert(name, value);
    }

    /// Appends bytes to the body.
    pub fn write(&mut self, bytes: &[u8]) {
        self.body.extend_from_slice(bytes);
        self.written = true;
    }

    /// Returns the body written so far.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Returns the body buffer for formatted writes.
    pub fn body_mut(&mut self) -> &mut BytesMut {
        self.written = true;
        &mut self.body
    }

    /// Returns true once a status or any body bytes were written.
    #[must_use]
    pub fn is_written(&self) -> bool {
        self.written
    }

    /// Discards everything written so far, keeping buffer capacity.
    pub fn reset(&mut self) {
        self.status = StatusCode::OK;
        self.headers.clear();
        self.body.clear();
        self.written = false;
    }

    /// Moves the buffered response out, leaving the writer reset.
    pub fn take(&mut self) -> Response {
        let body: Bytes = self.body.split().freeze();
        let mut response = http::Response::new(Full::new(body));
        *response.status_mut() = self.status;
        *response.headers_mut() = std::mem::take(&mut self.headers);
        self.status = StatusCode::OK;
        self.written = false;
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::CONTENT_TYPE;

    #[test]
    fn test_new_writer_is_untouched() {
        let writer = ResponseWriter::new();
        assert_eq!(writer.status(), StatusCode::OK);
        assert!(!writer.is_written());
        assert!(writer.body().is_empty());
    }

    #[test]
    fn test_write_and_take() {
        let mut writer = ResponseWriter::new();
        writer.set_status(StatusCode::CREATED);
        writer.insert_header(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        writer.write(b"hello ");
        writer.write(b"world");

        let response = writer.take();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()[CONTENT_TYPE], "text/plain");

        assert_eq!(writer.status(), StatusCode::OK);
        assert!(writer.headers().is_empty());
        assert!(writer.body().is_empty());
        assert!(!writer.is_written());
    }

    #[test]
    fn test_reset_discards_partial_output() {
        let mut writer = ResponseWriter::new();
        writer.set_status(StatusCode::ACCEPTED);
        writer.write(b"partial");

        writer.reset();
        assert_eq!(writer.status(), StatusCode::OK);
        assert!(writer.body().is_empty());
        assert!(!writer.is_written());
    }
}
