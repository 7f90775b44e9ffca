//! Segment trie router for Draft.
//!
//! This crate maps `/`-delimited request paths to registered values using one
//! prefix tree per HTTP method. It is generic over the stored value, so the
//! server crate stores handlers in it while tests and benchmarks can store
//! plain strings.
//!
//! # Features
//!
//! - **Literal segments**: `/users/list`
//! - **Parameters**: `/users/:id` binds one non-empty segment to `id`
//! - **Catch-alls**: `/assets/*filepath` binds the remaining path, slashes
//!   included, to `filepath`
//! - **Method-keyed trees**: each method has its own tree
//! - **Diagnosable misses**: a path that stops on an intermediate node is
//!   reported differently from a path that leaves the tree
//!
//! # Example
//!
//! ```rust
//! use draft_router::{MatchError, Router};
//! use http::Method;
//!
//! let mut router = Router::new();
//! router.insert(Method::GET, "/", "index").unwrap();
//! router.insert(Method::GET, "/hello/:name", "hello").unwrap();
//! router.insert(Method::GET, "/assets/*filepath", "assets").unwrap();
//!
//! let matched = router.at(&Method::GET, "/hello/draft").unwrap();
//! assert_eq!(*matched.value, "hello");
//! assert_eq!(matched.params.get("name"), Some("draft"));
//!
//! assert_eq!(router.at(&Method::GET, "/hello").unwrap_err(), MatchError::NotEndpoint);
//! assert_eq!(router.at(&Method::GET, "/nope").unwrap_err(), MatchError::NotFound);
//! ```
//!
//! # Architecture
//!
//! ```text
//!                 (root, GET)
//!                      │
//!              ┌───────┴────────┐
//!              │                │
//!           "hello"          "assets"
//!              │                │
//!           ":name"        "*filepath"
//!          [endpoint]       [endpoint]
//! ```

mod error;
mod node;
mod params;
mod router;

pub use error::{InsertError, MatchError};
pub use node::{Node, SegmentKind};
pub use params::Params;
pub use router::Router;

/// A resolved route: the registered value, the bound parameters and the
/// pattern that matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match<'r, T> {
    /// The value registered for the matched pattern
    pub value: &'r T,
    /// Parameters bound while matching
    pub params: Params,
    /// The full pattern that matched (e.g., `/users/:id`)
    pub pattern: &'r str,
}
