//! Error types for route registration and serving.

use draft_core::DraftError;
use draft_router::InsertError;
use http::Method;
use thiserror::Error;

/// Errors raised while configuring an [`Engine`](crate::Engine).
///
/// All of these are startup failures: the caller is expected to propagate
/// them out of its setup code instead of serving a half-configured app.
#[derive(Debug, Error)]
pub enum RegistrationError {
    /// The router rejected a pattern.
    #[error("cannot register {method} {pattern}: {source}")]
    Route {
        /// Method the route was registered for
        method: Method,
        /// Full pattern, group prefix included
        pattern: String,
        /// Underlying router error
        #[source]
        source: InsertError,
    },

    /// A static route path contained `:` or `*`.
    #[error("URL parameters can not be used when serving static files: {0}")]
    StaticPattern(String),

    /// Templates could not be loaded.
    #[error("cannot load templates: {0}")]
    Templates(#[from] DraftError),
}

/// Errors raised by the listener.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listen address is invalid or already in use.
    #[error("failed to bind: {0}")]
    Bind(String),

    /// TLS certificate or key could not be loaded.
    #[error("TLS configuration error: {0}")]
    Tls(String),

    /// I/O error while serving.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for registration.
pub type RegistrationResult<T> = Result<T, RegistrationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_error_display() {
        let err = RegistrationError::StaticPattern("/assets/:id".to_string());
        assert_eq!(
            err.to_string(),
            "URL parameters can not be used when serving static files: /assets/:id"
        );
    }

    #[test]
    fn test_route_error_keeps_source() {
        use std::error::Error as _;

        let err = RegistrationError::Route {
            method: Method::GET,
            pattern: "/a/*".to_string(),
            source: draft_router::Router::<()>::new()
                .insert(Method::GET, "/a/*", ())
                .unwrap_err(),
        };
        assert!(err.to_string().starts_with("cannot register GET /a/*"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_server_error_display() {
        let err = ServerError::Bind("address in use".to_string());
        assert_eq!(err.to_string(), "failed to bind: address in use");
    }
}
