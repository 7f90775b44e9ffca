//! Segment trie node implementation.
//!
//! Each node stands for one `/`-delimited segment of a route pattern. Literal
//! children are kept sorted for binary search; a node has at most one
//! parameter child (`:name`) and at most one catch-all child (`*name`), and a
//! catch-all child is always a leaf.

use crate::error::{InsertError, MatchError};
use crate::params::Params;

/// Kind of segment a node represents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentKind {
    /// Literal path segment (e.g., "users", "api")
    Static,
    /// Single-segment parameter (e.g., ":id")
    Param(String),
    /// Trailing catch-all (e.g., "*filepath")
    CatchAll(String),
}

/// A node in the route trie.
///
/// A node is an endpoint when it carries a value; every other node is a pure
/// intermediate created on the way to a deeper pattern.
#[derive(Debug, Clone)]
pub struct Node<T> {
    /// The pattern segment this node represents
    segment: String,

    /// The kind of segment (static, param, or catch-all)
    kind: SegmentKind,

    /// The registered value, present only on endpoints
    value: Option<T>,

    /// The full pattern that terminates here, present only on endpoints
    pattern: Option<String>,

    /// Literal children, sorted by segment
    static_children: Vec<Node<T>>,

    /// Parameter child (at most one per node)
    param_child: Option<Box<Node<T>>>,

    /// Catch-all child (at most one per node, always a leaf)
    catch_all_child: Option<Box<Node<T>>>,
}

impl<T> Node<T> {
    fn with_kind(segment: String, kind: SegmentKind) -> Self {
        Self {
            segment,
            kind,
            value: None,
            pattern: None,
            static_children: Vec::new(),
            param_child: None,
            catch_all_child: None,
        }
    }

    /// Creates the root node of a tree.
    #[must_use]
    pub fn root() -> Self {
        Self::with_kind(String::new(), SegmentKind::Static)
    }

    /// Returns the pattern segment this node represents.
    #[must_use]
    pub fn segment(&self) -> &str {
        &self.segment
    }

    /// Returns the kind of this node.
    #[must_use]
    pub fn kind(&self) -> &SegmentKind {
        &self.kind
    }

    /// Returns true if a pattern terminates at this node.
    #[must_use]
    pub fn is_endpoint(&self) -> bool {
        self.value.is_some()
    }

    /// Returns the value registered at this node.
    #[must_use]
    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    /// Returns the full pattern registered at this node.
    #[must_use]
    pub fn pattern(&self) -> Option<&str> {
        self.pattern.as_deref()
    }

    /// Inserts a full pattern, returning the value it replaced, if any.
    ///
    /// # Errors
    ///
    /// Returns [`InsertError`] when the pattern is malformed or its parameter
    /// names collide with an already registered sibling.
    pub fn insert(&mut self, pattern: &str, value: T) -> Result<Option<T>, InsertError> {
        let segments = parse_pattern(pattern)?;
        self.insert_segments(&segments, pattern, value)
    }

    fn insert_segments(
        &mut self,
        segments: &[(String, SegmentKind)],
        pattern: &str,
        value: T,
    ) -> Result<Option<T>, InsertError> {
        let Some(((segment, kind), remaining)) = segments.split_first() else {
            self.pattern = Some(pattern.to_string());
            return Ok(self.value.replace(value));
        };

        match kind {
            SegmentKind::Static => {
                let index = match self
                    .static_children
                    .binary_search_by(|c| c.segment.as_str().cmp(segment))
                {
                    Ok(index) => index,
                    Err(index) => {
                        self.static_children.insert(
                            index,
                            Self::with_kind(segment.clone(), SegmentKind::Static),
                        );
                        index
                    }
                };
                self.static_children[index].insert_segments(remaining, pattern, value)
            }
            SegmentKind::Param(_) => {
                let child = Self::slot(&mut self.param_child, segment, kind, pattern)?;
                child.insert_segments(remaining, pattern, value)
            }
            SegmentKind::CatchAll(name) => {
                debug_assert!(remaining.is_empty(), "catch-all `{name}` must be last");
                let child = Self::slot(&mut self.catch_all_child, segment, kind, pattern)?;
                child.insert_segments(remaining, pattern, value)
            }
        }
    }

    /// Returns the dynamic child in `slot`, creating it if absent.
    fn slot<'a>(
        slot: &'a mut Option<Box<Self>>,
        segment: &str,
        kind: &SegmentKind,
        pattern: &str,
    ) -> Result<&'a mut Self, InsertError> {
        if let Some(existing) = slot.as_deref() {
            if existing.kind != *kind {
                return Err(InsertError::Conflict {
                    pattern: pattern.to_string(),
                    existing: existing.segment.clone(),
                });
            }
        }
        Ok(slot.get_or_insert_with(|| Box::new(Self::with_kind(segment.to_string(), kind.clone()))))
    }

    /// Resolves a request path against the subtree rooted here.
    ///
    /// Empty segments (from leading, trailing or doubled slashes) are ignored,
    /// so an empty string is never bound to a parameter.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::NotEndpoint`] when the path ends on an
    /// intermediate node and [`MatchError::NotFound`] when it leaves the tree.
    pub fn at(&self, path: &str) -> Result<(&Self, Params), MatchError> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut params = Params::new();
        let node = self.match_segments(&segments, &mut params)?;
        Ok((node, params))
    }

    fn match_segments<'n>(
        &'n self,
        segments: &[&str],
        params: &mut Params,
    ) -> Result<&'n Self, MatchError> {
        let Some((&segment, remaining)) = segments.split_first() else {
            return if self.is_endpoint() {
                Ok(self)
            } else {
                Err(MatchError::NotEndpoint)
            };
        };

        let mut error = MatchError::NotFound;

        // Literal children take priority
        if let Some(child) = self.find_static_child(segment) {
            match child.match_segments(remaining, params) {
                Ok(node) => return Ok(node),
                Err(e) => error = error.most_specific(e),
            }
        }

        if let Some(child) = &self.param_child {
            if let SegmentKind::Param(name) = &child.kind {
                let mark = params.len();
                params.push(name.as_str(), segment);
                match child.match_segments(remaining, params) {
                    Ok(node) => return Ok(node),
                    Err(e) => {
                        params.truncate(mark);
                        error = error.most_specific(e);
                    }
                }
            }
        }

        // Catch-all consumes the rest and ends the descent
        if let Some(child) = &self.catch_all_child {
            if let SegmentKind::CatchAll(name) = &child.kind {
                if child.is_endpoint() {
                    params.push(name.as_str(), segments.join("/"));
                    return Ok(child);
                }
            }
        }

        Err(error)
    }

    fn find_static_child(&self, segment: &str) -> Option<&Self> {
        self.static_children
            .binary_search_by(|c| c.segment.as_str().cmp(segment))
            .ok()
            .map(|i| &self.static_children[i])
    }

    /// Visits every endpoint in the subtree, literal children first.
    pub fn for_each_endpoint<'n>(&'n self, f: &mut impl FnMut(&'n str, &'n T)) {
        if let (Some(pattern), Some(value)) = (&self.pattern, &self.value) {
            f(pattern, value);
        }
        for child in &self.static_children {
            child.for_each_endpoint(f);
        }
        if let Some(child) = &self.param_child {
            child.for_each_endpoint(f);
        }
        if let Some(child) = &self.catch_all_child {
            child.for_each_endpoint(f);
        }
    }
}

/// Splits a pattern into typed segments, rejecting malformed ones.
fn parse_pattern(pattern: &str) -> Result<Vec<(String, SegmentKind)>, InsertError> {
    let raw: Vec<&str> = pattern.split('/').filter(|s| !s.is_empty()).collect();
    let mut segments = Vec::with_capacity(raw.len());
    let mut names: Vec<&str> = Vec::new();

    for (i, s) in raw.iter().copied().enumerate() {
        let kind = if let Some(name) = s.strip_prefix(':') {
            if name.is_empty() {
                return Err(InsertError::invalid(pattern, "parameter segment needs a name"));
            }
            SegmentKind::Param(name.to_string())
        } else if let Some(name) = s.strip_prefix('*') {
            if name.is_empty() {
                return Err(InsertError::invalid(pattern, "catch-all segment needs a name"));
            }
            if i + 1 != raw.len() {
                return Err(InsertError::invalid(pattern, "catch-all must be the last segment"));
            }
            SegmentKind::CatchAll(name.to_string())
        } else {
            SegmentKind::Static
        };

        if let SegmentKind::Param(name) | SegmentKind::CatchAll(name) = &kind {
            if names.contains(&name.as_str()) {
                return Err(InsertError::invalid(pattern, "parameter names must be unique"));
            }
            names.push(&s[1..]);
        }

        segments.push((s.to_string(), kind));
    }

    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree(patterns: &[&'static str]) -> Node<&'static str> {
        let mut root = Node::root();
        for pattern in patterns {
            root.insert(pattern, *pattern).unwrap();
        }
        root
    }

    #[test]
    fn test_parse_pattern_kinds() {
        let segments = parse_pattern("/users/:id/files/*path").unwrap();
        assert_eq!(segments.len(), 4);
        assert_eq!(segments[0], ("users".to_string(), SegmentKind::Static));
        assert_eq!(
            segments[1],
            (":id".to_string(), SegmentKind::Param("id".to_string()))
        );
        assert_eq!(
            segments[3],
            ("*path".to_string(), SegmentKind::CatchAll("path".to_string()))
        );
    }

    #[test]
    fn test_parse_pattern_rejects_malformed() {
        assert!(parse_pattern("/files/*").is_err());
        assert!(parse_pattern("/users/:").is_err());
        assert!(parse_pattern("/files/*path/more").is_err());
        assert!(parse_pattern("/a/:id/b/:id").is_err());
    }

    #[test]
    fn test_match_static() {
        let root = tree(&["/users"]);
        let (node, params) = root.at("/users").unwrap();
        assert_eq!(node.value(), Some(&"/users"));
        assert!(params.is_empty());
    }

    #[test]
    fn test_match_param() {
        let root = tree(&["/users/:id"]);
        let (node, params) = root.at("/users/123").unwrap();
        assert_eq!(node.pattern(), Some("/users/:id"));
        assert_eq!(params.get("id"), Some("123"));
    }

    #[test]
    fn test_match_catch_all_keeps_slashes() {
        let root = tree(&["/assets/*filepath"]);
        let (node, params) = root.at("/assets/css/a.css").unwrap();
        assert_eq!(node.value(), Some(&"/assets/*filepath"));
        assert_eq!(params.get("filepath"), Some("css/a.css"));
    }

    #[test]
    fn test_static_priority_over_param() {
        let root = tree(&["/users/me", "/users/:id"]);

        let (node, params) = root.at("/users/me").unwrap();
        assert_eq!(node.value(), Some(&"/users/me"));
        assert!(params.is_empty());

        let (node, params) = root.at("/users/42").unwrap();
        assert_eq!(node.value(), Some(&"/users/:id"));
        assert_eq!(params.get("id"), Some("42"));
    }

    #[test]
    fn test_backtracks_from_failed_literal_branch() {
        let root = tree(&["/users/me/settings", "/users/:id/posts"]);

        let (node, params) = root.at("/users/me/posts").unwrap();
        assert_eq!(node.value(), Some(&"/users/:id/posts"));
        assert_eq!(params.get("id"), Some("me"));
    }

    #[test]
    fn test_failed_param_branch_leaves_no_binding() {
        let root = tree(&["/files/:name/meta", "/files/*rest"]);

        let (node, params) = root.at("/files/a/b").unwrap();
        assert_eq!(node.value(), Some(&"/files/*rest"));
        assert_eq!(params.get("name"), None);
        assert_eq!(params.get("rest"), Some("a/b"));
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn test_trailing_slash_does_not_bind_empty_param() {
        let root = tree(&["/users/:id"]);

        assert_eq!(root.at("/users/").unwrap_err(), MatchError::NotEndpoint);
        assert_eq!(root.at("/users//").unwrap_err(), MatchError::NotEndpoint);

        let (_, params) = root.at("/users/7/").unwrap();
        assert_eq!(params.get("id"), Some("7"));
    }

    #[test]
    fn test_not_endpoint_vs_not_found() {
        let root = tree(&["/api/v1/users"]);

        assert_eq!(root.at("/api/v1").unwrap_err(), MatchError::NotEndpoint);
        assert_eq!(root.at("/api/v2").unwrap_err(), MatchError::NotFound);
        assert_eq!(root.at("/api/v1/users/9").unwrap_err(), MatchError::NotFound);
    }

    #[test]
    fn test_root_pattern() {
        let root = tree(&["/"]);
        let (node, _) = root.at("/").unwrap();
        assert_eq!(node.value(), Some(&"/"));
    }

    #[test]
    fn test_duplicate_insert_replaces_value() {
        let mut root = Node::root();
        assert_eq!(root.insert("/hello", 1).unwrap(), None);
        assert_eq!(root.insert("/hello", 2).unwrap(), Some(1));

        let (node, _) = root.at("/hello").unwrap();
        assert_eq!(node.value(), Some(&2));
    }

    #[test]
    fn test_conflicting_param_names() {
        let mut root = Node::root();
        root.insert("/user/:id", 1).unwrap();

        let err = root.insert("/user/:name/profile", 2).unwrap_err();
        assert_eq!(
            err,
            InsertError::Conflict {
                pattern: "/user/:name/profile".to_string(),
                existing: ":id".to_string(),
            }
        );

        // Same name at the same position is fine
        root.insert("/user/:id/profile", 3).unwrap();
    }

    #[test]
    fn test_for_each_endpoint() {
        let root = tree(&["/b", "/a", "/a/:id", "/static/*path"]);
        let mut seen = Vec::new();
        root.for_each_endpoint(&mut |pattern, _| seen.push(pattern.to_string()));
        assert_eq!(seen, vec!["/a", "/a/:id", "/b", "/static/*path"]);
    }
}
