//! Segment-based route table for Bulwark.
//!
//! The route table maps path patterns to handler ids per HTTP method. It is
//! the in-process routing-introspection source used by request matchers that
//! want to match the way the host framework actually routes requests.
//!
//! # Pattern Syntax
//!
//! - `users` - a static segment
//! - `{id}` - a named parameter matching exactly one segment
//! - `*path` - a trailing catch-all matching one or more segments
//!
//! Empty segments are ignored, so `/users/` and `//users` match `/users`.
//!
//! # Example
//!
//! ```rust
//! use bulwark_router::{MethodRouter, Router};
//! use http::Method;
//!
//! let mut router = Router::new();
//! router.insert("/users", MethodRouter::new().get("listUsers").post("createUser")).unwrap();
//! router.insert("/users/{id}", MethodRouter::new().get("getUser")).unwrap();
//! router.insert("/files/*path", MethodRouter::new().any("serveFile")).unwrap();
//!
//! let route_match = router.match_route(&Method::GET, "/users/123").unwrap();
//! assert_eq!(route_match.handler, "getUser");
//! assert_eq!(route_match.pattern, "/users/{id}");
//! assert_eq!(route_match.params.get("id"), Some("123"));
//! ```
//!
//! # Architecture
//!
//! ```text
//!                    (root)
//!                      │
//!              ┌───────┴───────┐
//!              │               │
//!            "users"        "files"
//!              │               │
//!        ┌─────┴─────┐        "*path"
//!        │           │
//!       (leaf)    "{id}"
//!   [GET,POST]      │
//!                 (leaf)
//!                 [GET]
//! ```

#![doc(html_root_url = "https://docs.rs/bulwark-router/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod method_router;
mod node;
mod params;
mod router;

pub use error::RouteError;
pub use method_router::MethodRouter;
pub use node::{Node, SegmentKind};
pub use params::Params;
pub use router::Router;

/// A matched route with its handler id, pattern and extracted parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch<'a> {
    /// The handler id registered for the method.
    pub handler: &'a str,
    /// The pattern the route was registered with.
    pub pattern: &'a str,
    /// Extracted path parameters.
    pub params: Params,
}

impl<'a> RouteMatch<'a> {
    /// Creates a new route match.
    #[must_use]
    pub fn new(handler: &'a str, pattern: &'a str, params: Params) -> Self {
        Self {
            handler,
            pattern,
            params,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_match_new() {
        let mut params = Params::new();
        params.push("id", "7");
        let route_match = RouteMatch::new("getUser", "/users/{id}", params);
        assert_eq!(route_match.handler, "getUser");
        assert_eq!(route_match.pattern, "/users/{id}");
        assert_eq!(route_match.params.get("id"), Some("7"));
    }
}
