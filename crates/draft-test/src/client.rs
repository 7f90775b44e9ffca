//! In-memory client.

use std::sync::Arc;

use bytes::Bytes;
use draft_server::{dispatch, Dispatcher, Engine, DEFAULT_MAX_BODY_BYTES};
use http_body_util::Full;

use crate::error::TestError;
use crate::request::TestRequest;
use crate::response::TestResponse;

/// Sends requests straight to a [`Dispatcher`], no socket involved.
///
/// Requests take the same path as on a live server: the body limit is
/// enforced and handlers run on tokio's blocking pool, so tests need a tokio
/// runtime.
///
/// ```rust
/// use draft_server::Engine;
/// use draft_test::{TestClient, TestRequest};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let mut engine = Engine::new();
/// engine.get("/ping", |c| c.string(200, "pong")).unwrap();
///
/// let client = TestClient::new(engine);
/// let response = client.send(TestRequest::get("/ping")).await.unwrap();
/// response.assert_status(200).assert_body_eq("pong");
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct TestClient {
    dispatcher: Arc<Dispatcher>,
    max_body_bytes: usize,
    default_headers: Vec<(String, String)>,
}

impl TestClient {
    /// Builds `engine` and wraps the result.
    #[must_use]
    pub fn new(engine: Engine) -> Self {
        Self::from_dispatcher(engine.build())
    }

    /// Wraps an already built dispatcher.
    #[must_use]
    pub fn from_dispatcher(dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            dispatcher,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            default_headers: Vec::new(),
        }
    }

    /// Sets the request body limit.
    #[must_use]
    pub fn with_max_body_bytes(mut self, limit: usize) -> Self {
        self.max_body_bytes = limit;
        self
    }

    /// Adds a header sent with every request unless the request sets it.
    #[must_use]
    pub fn with_default_header(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    /// The dispatcher behind this client.
    #[must_use]
    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Sends `request` and buffers the response.
    pub async fn send(&self, request: TestRequest) -> Result<TestResponse, TestError> {
        let request = request.build()?;
        let (mut parts, body) = request.into_parts();
        for (name, value) in &self.default_headers {
            if parts.headers.contains_key(name.as_str()) {
                continue;
            }
            let name = http::HeaderName::try_from(name.as_str())
                .map_err(|e| TestError::RequestBuild(e.to_string()))?;
            let value = http::HeaderValue::try_from(value.as_str())
                .map_err(|e| TestError::RequestBuild(e.to_string()))?;
            parts.headers.insert(name, value);
        }
        let request = http::Request::from_parts(parts, Full::<Bytes>::new(body));

        let response = dispatch(Arc::clone(&self.dispatcher), request, self.max_body_bytes).await;
        TestResponse::from_http(response).await
    }

    /// Shorthand for a GET without headers or body.
    pub async fn get(&self, uri: &str) -> Result<TestResponse, TestError> {
        self.send(TestRequest::get(uri)).await
    }
}
