//! High-level router API.

use http::Method;

use crate::error::RouteError;
use crate::method_router::MethodRouter;
use crate::node::{self, Node};
use crate::params::Params;
use crate::RouteMatch;

/// A route table backed by a radix tree.
///
/// # Example
///
/// ```rust
/// use bulwark_router::{MethodRouter, Router};
/// use http::Method;
///
/// let mut router = Router::new();
/// router.insert("/users", MethodRouter::new().get("listUsers").post("createUser")).unwrap();
/// router.insert("/users/{id}", MethodRouter::new().get("getUser").put("updateUser")).unwrap();
///
/// let result = router.match_route(&Method::GET, "/users/123");
/// assert!(result.is_some());
/// ```
///
/// # Route Priority
///
/// When multiple routes could match, the router uses the following priority:
///
/// 1. **Static segments** (e.g., `/users/me`)
/// 2. **Parameter segments** (e.g., `/users/{id}`)
/// 3. **Wildcard segments** (e.g., `/files/*path`)
#[derive(Debug, Clone)]
pub struct Router {
    root: Node,
    route_count: usize,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    /// Creates a new empty router.
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: Node::root(),
            route_count: 0,
        }
    }

    /// Inserts a route.
    ///
    /// Fails when the pattern is malformed, for example when a wildcard
    /// segment is not the last segment.
    pub fn insert(&mut self, pattern: &str, methods: MethodRouter) -> Result<(), RouteError> {
        self.root.insert(pattern, methods)?;
        self.route_count += 1;
        Ok(())
    }

    /// Adds a single-method route.
    pub fn route(
        &mut self,
        method: &Method,
        pattern: &str,
        handler: impl Into<String>,
    ) -> Result<(), RouteError> {
        self.insert(pattern, MethodRouter::new().method(method, handler))
    }

    /// Matches a method and path against the table.
    ///
    /// ```rust
    /// use bulwark_router::{MethodRouter, Router};
    /// use http::Method;
    ///
    /// let mut router = Router::new();
    /// router.insert("/users/{id}", MethodRouter::new().get("getUser")).unwrap();
    ///
    /// let route_match = router.match_route(&Method::GET, "/users/123").unwrap();
    /// assert_eq!(route_match.handler, "getUser");
    /// assert_eq!(route_match.params.get("id"), Some("123"));
    /// assert!(router.match_route(&Method::POST, "/users/123").is_none());
    /// ```
    #[must_use]
    pub fn match_route(&self, method: &Method, path: &str) -> Option<RouteMatch<'_>> {
        let (node, params) = self.root.match_path(path)?;
        let handler = node.methods.as_ref()?.handler_for(method)?;
        let pattern = node.pattern.as_deref()?;
        Some(RouteMatch::new(handler, pattern, params))
    }

    /// Matches a path regardless of method.
    ///
    /// Useful for listing allowed methods.
    #[must_use]
    pub fn match_path(&self, path: &str) -> Option<(&MethodRouter, Params)> {
        let (node, params) = self.root.match_path(path)?;
        node.methods.as_ref().map(|methods| (methods, params))
    }

    /// Matches a single pattern against a path with the table's segment
    /// rules, without consulting the registered routes.
    ///
    /// Returns `None` when the path does not match or the pattern is
    /// malformed.
    ///
    /// ```rust
    /// use bulwark_router::Router;
    ///
    /// let params = Router::match_pattern("/orders/{id}", "/orders/42").unwrap();
    /// assert_eq!(params.get("id"), Some("42"));
    /// assert!(Router::match_pattern("/orders/{id}", "/orders").is_none());
    /// ```
    #[must_use]
    pub fn match_pattern(pattern: &str, path: &str) -> Option<Params> {
        Self::try_match_pattern(pattern, path).ok().flatten()
    }

    /// Like [`Router::match_pattern`], but reports a malformed pattern.
    pub fn try_match_pattern(pattern: &str, path: &str) -> Result<Option<Params>, RouteError> {
        node::match_single(pattern, path)
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
