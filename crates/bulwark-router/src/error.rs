//! Route table errors.

use thiserror::Error;

/// Errors raised while registering routes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    /// A catch-all segment was followed by more segments.
    #[error("Wildcard segment '*{name}' must be the last segment in '{pattern}'")]
    WildcardNotLast {
        /// Wildcard name.
        name: String,
        /// The offending pattern.
        pattern: String,
    },

    /// A parameter or wildcard has no name.
    #[error("Unnamed segment in '{pattern}'")]
    UnnamedSegment {
        /// The offending pattern.
        pattern: String,
    },

    /// Two routes at the same position use different parameter names.
    #[error("Parameter '{{{found}}}' conflicts with '{{{existing}}}' in '{pattern}'")]
    ConflictingParam {
        /// The name already registered at this position.
        existing: String,
        /// The name in the new pattern.
        found: String,
        /// The offending pattern.
        pattern: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = RouteError::WildcardNotLast {
            name: "rest".to_string(),
            pattern: "/a/*rest/b".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Wildcard segment '*rest' must be the last segment in '/a/*rest/b'"
        );

        let err = RouteError::ConflictingParam {
            existing: "id".to_string(),
            found: "userId".to_string(),
            pattern: "/users/{userId}".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Parameter '{userId}' conflicts with '{id}' in '/users/{userId}'"
        );
    }
}
