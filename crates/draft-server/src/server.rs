//! HTTP and HTTPS listeners.
//!
//! Each accepted connection gets its own tokio task. Request bodies are
//! collected (up to the configured limit) on that task, then the handler
//! chain runs synchronously on tokio's blocking pool so a slow handler never
//! stalls the I/O threads.
//!
//! ```rust,no_run
//! use draft_server::{Engine, Server, ServerConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let mut engine = Engine::default_stack();
//! engine.get("/", |c| c.string(200, "hello"))?;
//!
//! let config = ServerConfig::builder().http_addr("127.0.0.1:8080").build();
//! Server::new(engine.build(), config).run().await?;
//! # Ok(())
//! # }
//! ```

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use axum_server::tls_rustls::RustlsConfig;
use bytes::Bytes;
use draft_core::Response;
use http::StatusCode;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Body, Incoming};
use hyper::server::conn::http1;
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;

use crate::config::{ServerConfig, TlsFiles};
use crate::dispatcher::Dispatcher;
use crate::error::ServerError;
use crate::shutdown::{ConnectionTracker, ShutdownSignal};

/// Serves a [`Dispatcher`] over HTTP/1.1, optionally behind TLS.
#[derive(Debug)]
pub struct Server {
    dispatcher: Arc<Dispatcher>,
    config: ServerConfig,
}

impl Server {
    /// Creates a server for `dispatcher`.
    #[must_use]
    pub fn new(dispatcher: Arc<Dispatcher>, config: ServerConfig) -> Self {
        Self { dispatcher, config }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Serves until SIGINT or SIGTERM.
    pub async fn run(self) -> Result<(), ServerError> {
        let shutdown = ShutdownSignal::with_os_signals();
        self.run_with_shutdown(shutdown).await
    }

    /// Serves until `shutdown` fires.
    ///
    /// Uses TLS when the configuration names certificate files.
    pub async fn run_with_shutdown(self, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let addr = self.config.socket_addr().map_err(|e| {
            ServerError::Bind(format!("invalid address '{}': {e}", self.config.http_addr()))
        })?;

        if let Some(files) = self.config.tls().cloned() {
            return self.serve_tls(addr, &files, shutdown).await;
        }

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Bind(format!("failed to bind to {addr}: {e}")))?;
        self.serve(listener, shutdown).await
    }

    /// Serves plain HTTP on an already bound listener until `shutdown` fires.
    pub async fn serve(
        self,
        listener: TcpListener,
        shutdown: ShutdownSignal,
    ) -> Result<(), ServerError> {
        let local_addr = listener.local_addr()?;
        tracing::info!(address = %local_addr, "Listening for HTTP");

        let tracker = ConnectionTracker::new();
        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, remote_addr)) => {
                        let guard = tracker.track();
                        let dispatcher = Arc::clone(&self.dispatcher);
                        let limit = self.config.max_body_bytes();
                        let shutdown = shutdown.clone();
                        tokio::spawn(async move {
                            serve_connection(stream, remote_addr, dispatcher, limit, shutdown)
                                .await;
                            drop(guard);
                        });
                    }
                    Err(e) => tracing::error!(error = %e, "Failed to accept connection"),
                },
                () = shutdown.recv() => break,
            }
        }

        let timeout = self.config.shutdown_timeout();
        tracing::info!(
            open = tracker.open_connections(),
            ?timeout,
            "Waiting for connections to close"
        );
        if tokio::time::timeout(timeout, tracker.drained()).await.is_err() {
            tracing::warn!(
                open = tracker.open_connections(),
                "Shutdown timeout reached with connections still open"
            );
        }
        tracing::info!("Server stopped");
        Ok(())
    }

    async fn serve_tls(
        self,
        addr: SocketAddr,
        files: &TlsFiles,
        shutdown: ShutdownSignal,
    ) -> Result<(), ServerError> {
        let tls = load_tls_config(files).await?;

        let handle = axum_server::Handle::new();
        let watcher = handle.clone();
        let timeout = self.config.shutdown_timeout();
        tokio::spawn(async move {
            shutdown.recv().await;
            watcher.graceful_shutdown(Some(timeout));
        });

        let dispatcher = self.dispatcher;
        let limit = self.config.max_body_bytes();
        let service = tower::service_fn(move |request: http::Request<Incoming>| {
            let dispatcher = Arc::clone(&dispatcher);
            async move { Ok::<_, Infallible>(dispatch(dispatcher, request, limit).await) }
        });

        tracing::info!(address = %addr, "Listening for HTTPS");
        axum_server::bind_rustls(addr, tls)
            .handle(handle)
            .serve(tower::make::Shared::new(service))
            .await?;
        tracing::info!("Server stopped");
        Ok(())
    }
}

/// Loads a PEM certificate chain and private key.
pub async fn load_tls_config(files: &TlsFiles) -> Result<RustlsConfig, ServerError> {
    for path in [&files.cert_path, &files.key_path] {
        if !path.exists() {
            return Err(ServerError::Tls(format!("file not found: {}", path.display())));
        }
    }
    RustlsConfig::from_pem_file(&files.cert_path, &files.key_path)
        .await
        .map_err(|e| ServerError::Tls(e.to_string()))
}

async fn serve_connection(
    stream: tokio::net::TcpStream,
    remote_addr: SocketAddr,
    dispatcher: Arc<Dispatcher>,
    limit: usize,
    shutdown: ShutdownSignal,
) {
    let service = hyper::service::service_fn(move |request: http::Request<Incoming>| {
        let dispatcher = Arc::clone(&dispatcher);
        async move { Ok::<_, Infallible>(dispatch(dispatcher, request, limit).await) }
    });

    let conn = http1::Builder::new().serve_connection(TokioIo::new(stream), service);
    tokio::pin!(conn);

    tokio::select! {
        result = conn.as_mut() => {
            if let Err(e) = result {
                tracing::debug!(remote = %remote_addr, error = %e, "Connection error");
            }
        }
        () = shutdown.recv() => {
            conn.as_mut().graceful_shutdown();
            if let Err(e) = conn.await {
                tracing::debug!(
                    remote = %remote_addr,
                    error = %e,
                    "Connection error during shutdown"
                );
            }
        }
    }
}

/// Collects the request body and runs the dispatcher on the blocking pool.
///
/// Bodies larger than `limit` bytes are answered with 413 before any handler
/// runs.
pub async fn dispatch<B>(
    dispatcher: Arc<Dispatcher>,
    request: http::Request<B>,
    limit: usize,
) -> Response
where
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let (parts, body) = request.into_parts();
    let bytes = match Limited::new(body, limit).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) if e.is::<LengthLimitError>() => {
            return plain(StatusCode::PAYLOAD_TOO_LARGE, "request body too large");
        }
        Err(e) => {
            tracing::debug!(error = %e, "Failed to read request body");
            return plain(StatusCode::BAD_REQUEST, "failed to read request body");
        }
    };
    let request = http::Request::from_parts(parts, bytes);

    match tokio::task::spawn_blocking(move || dispatcher.handle_request(request)).await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(error = %e, "Handler chain did not complete");
            plain(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
        }
    }
}

fn plain(status: StatusCode, message: &'static str) -> Response {
    let mut response = http::Response::new(Full::new(Bytes::from_static(message.as_bytes())));
    *response.status_mut() = status;
    response
}
