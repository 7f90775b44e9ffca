//! Method-keyed router.
//!
//! [`Router`] keeps one segment trie per HTTP method. A full pattern maps to
//! exactly one value per method.

use std::collections::HashMap;

use http::Method;

use crate::error::{InsertError, MatchError};
use crate::node::Node;
use crate::Match;

/// A router holding one route tree per HTTP method.
///
/// # Example
///
/// ```rust
/// use draft_router::Router;
/// use http::Method;
///
/// let mut router = Router::new();
/// router.insert(Method::GET, "/users/:id", "getUser").unwrap();
/// router.insert(Method::GET, "/assets/*filepath", "assets").unwrap();
///
/// let matched = router.at(&Method::GET, "/users/42").unwrap();
/// assert_eq!(*matched.value, "getUser");
/// assert_eq!(matched.params.get("id"), Some("42"));
///
/// let matched = router.at(&Method::GET, "/assets/css/a.css").unwrap();
/// assert_eq!(matched.params.get("filepath"), Some("css/a.css"));
/// ```
///
/// # Route Priority
///
/// At every segment the router tries, in order:
///
/// 1. **Literal segments** (e.g., `/users/me`)
/// 2. **Parameter segments** (e.g., `/users/:id`)
/// 3. **Catch-all segments** (e.g., `/files/*path`)
#[derive(Debug, Clone)]
pub struct Router<T> {
    /// Root node of each method's tree
    trees: HashMap<Method, Node<T>>,
    /// Number of distinct (method, pattern) routes
    route_count: usize,
}

impl<T> Default for Router<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Router<T> {
    /// Creates a new empty router.
    #[must_use]
    pub fn new() -> Self {
        Self {
            trees: HashMap::new(),
            route_count: 0,
        }
    }

    /// Registers `pattern` for `method`.
    ///
    /// Registering the same pattern twice for the same method keeps the tree
    /// unchanged and replaces the value; the previous value is returned so the
    /// caller can report the overwrite.
    ///
    /// # Errors
    ///
    /// Returns [`InsertError`] if the pattern is malformed or conflicts with
    /// an existing parameter name at the same position.
    pub fn insert(
        &mut self,
        method: Method,
        pattern: &str,
        value: T,
    ) -> Result<Option<T>, InsertError> {
        let replaced = self
            .trees
            .entry(method)
            .or_insert_with(Node::root)
            .insert(pattern, value)?;
        if replaced.is_none() {
            self.route_count += 1;
        }
        Ok(replaced)
    }

    /// Resolves `path` in the tree registered for `method`.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::MethodNotRegistered`] when the method has no
    /// tree, otherwise the tree's own [`MatchError`].
    pub fn at(&self, method: &Method, path: &str) -> Result<Match<'_, T>, MatchError> {
        let tree = self.trees.get(method).ok_or(MatchError::MethodNotRegistered)?;
        let (node, params) = tree.at(path)?;
        match (node.value(), node.pattern()) {
            (Some(value), Some(pattern)) => Ok(Match {
                value,
                params,
                pattern,
            }),
            _ => Err(MatchError::NotEndpoint),
        }
    }

    /// Returns the methods whose tree resolves `path`, sorted by name.
    ///
    /// Useful for diagnostics and `405` style responses.
    #[must_use]
    pub fn allowed_methods(&self, path: &str) -> Vec<Method> {
        let mut methods: Vec<Method> = self
            .trees
            .iter()
            .filter(|(_, tree)| tree.at(path).is_ok())
            .map(|(method, _)| method.clone())
            .collect();
        methods.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        methods
    }

    /// Returns every registered (method, pattern) pair.
    #[must_use]
    pub fn routes(&self) -> Vec<(Method, String)> {
        let mut routes = Vec::with_capacity(self.route_count);
        for (method, tree) in &self.trees {
            tree.for_each_endpoint(&mut |pattern, _| {
                routes.push((method.clone(), pattern.to_string()));
            });
        }
        routes.sort_by(|a, b| (a.0.as_str(), &a.1).cmp(&(b.0.as_str(), &b.1)));
        routes
    }

    /// Returns the tree for `method`, if any route was registered for it.
    #[must_use]
    pub fn tree(&self, method: &Method) -> Option<&Node<T>> {
        self.trees.get(method)
    }

    /// Returns the number of routes registered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.route_count
    }

    /// Returns true if no routes are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.route_count == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_router_new() {
        let router: Router<()> = Router::new();
        assert!(router.is_empty());
        assert_eq!(router.len(), 0);
    }

    #[test]
    fn test_router_insert_counts_distinct_routes() {
        let mut router = Router::new();
        router.insert(Method::GET, "/users", 1).unwrap();
        router.insert(Method::POST, "/users", 2).unwrap();
        router.insert(Method::GET, "/users", 3).unwrap();
        assert_eq!(router.len(), 2);
    }

    #[test]
    fn test_router_trees_are_per_method() {
        let mut router = Router::new();
        router.insert(Method::GET, "/users", "list").unwrap();
        router.insert(Method::POST, "/users", "create").unwrap();

        assert_eq!(*router.at(&Method::GET, "/users").unwrap().value, "list");
        assert_eq!(*router.at(&Method::POST, "/users").unwrap().value, "create");
        assert_eq!(
            router.at(&Method::DELETE, "/users").unwrap_err(),
            MatchError::MethodNotRegistered
        );
    }

    #[test]
    fn test_router_match_reports_pattern() {
        let mut router = Router::new();
        router.insert(Method::GET, "/users/:id", ()).unwrap();

        let matched = router.at(&Method::GET, "/users/5").unwrap();
        assert_eq!(matched.pattern, "/users/:id");
    }

    #[test]
    fn test_router_duplicate_is_last_write_wins() {
        let mut router = Router::new();
        assert_eq!(router.insert(Method::GET, "/hello", "first").unwrap(), None);
        assert_eq!(
            router.insert(Method::GET, "/hello", "second").unwrap(),
            Some("first")
        );
        assert_eq!(*router.at(&Method::GET, "/hello").unwrap().value, "second");
    }

    #[test]
    fn test_router_allowed_methods() {
        let mut router = Router::new();
        router.insert(Method::GET, "/items/:id", ()).unwrap();
        router.insert(Method::DELETE, "/items/:id", ()).unwrap();
        router.insert(Method::POST, "/items", ()).unwrap();

        assert_eq!(
            router.allowed_methods("/items/3"),
            vec![Method::DELETE, Method::GET]
        );
        assert!(router.allowed_methods("/nothing").is_empty());
    }

    #[test]
    fn test_router_routes_listing() {
        let mut router = Router::new();
        router.insert(Method::POST, "/b", ()).unwrap();
        router.insert(Method::GET, "/a/:id", ()).unwrap();
        router.insert(Method::GET, "/a", ()).unwrap();

        assert_eq!(
            router.routes(),
            vec![
                (Method::GET, "/a".to_string()),
                (Method::GET, "/a/:id".to_string()),
                (Method::POST, "/b".to_string()),
            ]
        );
    }
}
