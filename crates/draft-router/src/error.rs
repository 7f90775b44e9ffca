//! Route insertion and matching errors.

use thiserror::Error;

/// Errors returned when registering a route pattern.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InsertError {
    /// The pattern is malformed.
    #[error("invalid route pattern `{pattern}`: {reason}")]
    InvalidPattern {
        /// The rejected pattern.
        pattern: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// The pattern declares a parameter that collides with one already
    /// registered at the same position under a different name.
    #[error("route pattern `{pattern}` conflicts with existing segment `{existing}`")]
    Conflict {
        /// The rejected pattern.
        pattern: String,
        /// The segment already present in the tree.
        existing: String,
    },
}

impl InsertError {
    pub(crate) fn invalid(pattern: &str, reason: &'static str) -> Self {
        Self::InvalidPattern {
            pattern: pattern.to_string(),
            reason,
        }
    }
}

/// Reasons a path failed to resolve.
///
/// `NotEndpoint` and `NotFound` are kept apart so that callers can tell a
/// path that walked into the middle of a registered route from one that
/// left the tree entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MatchError {
    /// No tree exists for the request method.
    #[error("no routes registered for method")]
    MethodNotRegistered,

    /// The path was consumed at a node that is not a registered endpoint.
    #[error("path ends on a non-terminal route segment")]
    NotEndpoint,

    /// No child matched a path segment.
    #[error("no route matches path")]
    NotFound,
}

impl MatchError {
    /// Keeps the more informative of two failures from sibling branches.
    pub(crate) fn most_specific(self, other: Self) -> Self {
        if self == Self::NotEndpoint || other == Self::NotEndpoint {
            Self::NotEndpoint
        } else {
            other
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_error_display() {
        let err = InsertError::invalid("/files/*", "catch-all segment needs a name");
        assert_eq!(
            err.to_string(),
            "invalid route pattern `/files/*`: catch-all segment needs a name"
        );
    }

    #[test]
    fn test_most_specific_prefers_not_endpoint() {
        assert_eq!(
            MatchError::NotFound.most_specific(MatchError::NotEndpoint),
            MatchError::NotEndpoint
        );
        assert_eq!(
            MatchError::NotEndpoint.most_specific(MatchError::NotFound),
            MatchError::NotEndpoint
        );
        assert_eq!(
            MatchError::NotFound.most_specific(MatchError::NotFound),
            MatchError::NotFound
        );
    }
}
