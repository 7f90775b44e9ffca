//! Request building.

use bytes::Bytes;
use http::{header, HeaderMap, HeaderName, HeaderValue, Method};
use serde::Serialize;

use crate::error::TestError;

/// Builder for an in-memory request.
///
/// Errors from invalid headers or bodies are kept until
/// [`build`](Self::build) so calls can be chained.
#[must_use]
#[derive(Debug)]
pub struct TestRequest {
    method: Method,
    uri: String,
    headers: HeaderMap,
    body: Bytes,
    error: Option<TestError>,
}

impl TestRequest {
    /// Starts a request.
    pub fn new(method: Method, uri: impl AsRef<str>) -> Self {
        Self {
            method,
            uri: uri.as_ref().to_string(),
            headers: HeaderMap::new(),
            body: Bytes::new(),
            error: None,
        }
    }

    /// Starts a GET request.
    pub fn get(uri: impl AsRef<str>) -> Self {
        Self::new(Method::GET, uri)
    }

    /// Starts a POST request.
    pub fn post(uri: impl AsRef<str>) -> Self {
        Self::new(Method::POST, uri)
    }

    /// Sets a header, replacing any previous value.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        match (
            HeaderName::try_from(name.as_ref()),
            HeaderValue::try_from(value.as_ref()),
        ) {
            (Ok(name), Ok(value)) => {
                self.headers.insert(name, value);
            }
            _ => self.fail(format!("invalid header '{}'", name.as_ref())),
        }
        self
    }

    /// Sets `Authorization: Bearer <token>`.
    pub fn bearer_token(self, token: impl AsRef<str>) -> Self {
        let value = format!("Bearer {}", token.as_ref());
        self.header(header::AUTHORIZATION.as_str(), value)
    }

    /// Sets the raw body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Sets a JSON body and `Content-Type: application/json`.
    pub fn json<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(bytes) => self.body = Bytes::from(bytes),
            Err(e) => self.fail(e.to_string()),
        }
        self.header(header::CONTENT_TYPE.as_str(), "application/json")
    }

    /// Sets an urlencoded form body and the matching content type.
    pub fn form<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        match serde_urlencoded::to_string(value) {
            Ok(encoded) => self.body = Bytes::from(encoded),
            Err(e) => self.fail(e.to_string()),
        }
        self.header(
            header::CONTENT_TYPE.as_str(),
            "application/x-www-form-urlencoded",
        )
    }

    /// Produces the HTTP request.
    pub fn build(self) -> Result<http::Request<Bytes>, TestError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        let mut request = http::Request::builder()
            .method(self.method)
            .uri(self.uri.as_str())
            .body(self.body)
            .map_err(|e| {
                TestError::RequestBuild(format!("invalid request to '{}': {e}", self.uri))
            })?;
        *request.headers_mut() = self.headers;
        Ok(request)
    }

    fn fail(&mut self, message: String) {
        if self.error.is_none() {
            self.error = Some(TestError::RequestBuild(message));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_with_headers() {
        let request = TestRequest::get("/users?page=2")
            .header("X-Trace", "abc")
            .bearer_token("secret")
            .build()
            .unwrap();
        assert_eq!(request.method(), Method::GET);
        assert_eq!(request.uri().query(), Some("page=2"));
        assert_eq!(request.headers()["x-trace"], "abc");
        assert_eq!(request.headers()[header::AUTHORIZATION], "Bearer secret");
    }

    #[test]
    fn test_form_body() {
        let request = TestRequest::post("/login")
            .form(&[("user", "ada lovelace")])
            .build()
            .unwrap();
        assert_eq!(request.body().as_ref(), b"user=ada+lovelace");
        assert_eq!(
            request.headers()[header::CONTENT_TYPE],
            "application/x-www-form-urlencoded"
        );
    }

    #[test]
    fn test_invalid_header_reported_at_build() {
        let result = TestRequest::get("/").header("bad header", "x").build();
        assert!(matches!(result, Err(TestError::RequestBuild(_))));
    }

    #[test]
    fn test_invalid_uri() {
        let result = TestRequest::get("http://[::1").build();
        assert!(result.is_err());
    }
}
