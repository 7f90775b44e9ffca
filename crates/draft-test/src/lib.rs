//! # Draft Test
//!
//! In-memory request testing for Draft applications.
//!
//! A [`TestClient`] wraps a built engine and sends [`TestRequest`]s through
//! the full middleware chain without binding a port. Responses come back as
//! [`TestResponse`] with assertion helpers.

#![doc(html_root_url = "https://docs.rs/draft-test/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
mod error;
mod request;
mod response;

pub use client::TestClient;
pub use error::TestError;
pub use request::TestRequest;
pub use response::TestResponse;
