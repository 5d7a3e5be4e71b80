//! Routing introspection.
//!
//! A [`HandlerIntrospector`] tells a matcher which handler mapping would
//! serve a request. A mapping that can match patterns the way it routes
//! lets the matcher agree exactly with the router.

use bulwark_core::{RequestParts, UrlPathHelper};
use bulwark_router::{Params, Router};
use std::fmt;
use std::sync::Arc;

/// The outcome of a successful pattern match against a mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestMatchResult {
    variables: Params,
}

impl RequestMatchResult {
    /// Creates a match result carrying the captured variables.
    pub fn new(variables: Params) -> Self {
        Self { variables }
    }

    /// Returns the captured variables.
    pub fn variables(&self) -> &Params {
        &self.variables
    }

    /// Consumes the result, returning the captured variables.
    pub fn into_variables(self) -> Params {
        self.variables
    }
}

/// A handler mapping able to match a pattern against a request.
pub trait MatchableMapping: Send + Sync + fmt::Debug {
    /// Matches `pattern` against the request with the mapping's own path
    /// semantics. `Ok(None)` means no match.
    fn match_request(
        &self,
        request: &dyn RequestParts,
        pattern: &str,
    ) -> Result<Option<RequestMatchResult>, anyhow::Error>;
}

/// Resolves a request to the mapping that would handle it.
pub trait HandlerIntrospector: Send + Sync + fmt::Debug {
    /// Returns the mapping serving the request, or `None` when no mapping
    /// handles it or the mapping cannot match patterns.
    fn resolve(
        &self,
        request: &dyn RequestParts,
    ) -> Result<Option<Arc<dyn MatchableMapping>>, anyhow::Error>;
}

/// Introspector backed by a [`Router`].
///
/// A request resolves when the route table has a handler for its method and
/// lookup path.
///
/// ```
/// use bulwark_core::SyntheticRequest;
/// use bulwark_matcher::{HandlerIntrospector, RouteTableIntrospector};
/// use bulwark_router::{MethodRouter, Router};
/// use http::Method;
/// use std::sync::Arc;
///
/// let mut router = Router::new();
/// router.insert("/orders/{id}", MethodRouter::new().get("getOrder")).unwrap();
/// let introspector = RouteTableIntrospector::new(Arc::new(router));
///
/// let request = SyntheticRequest::new(None, "/orders/1", None, None, Method::GET);
/// let mapping = introspector.resolve(&request).unwrap().unwrap();
/// let result = mapping.match_request(&request, "/orders/{id}").unwrap().unwrap();
/// assert_eq!(result.variables().get("id"), Some("1"));
/// ```
#[derive(Debug, Clone)]
pub struct RouteTableIntrospector {
    router: Arc<Router>,
    mapping: Arc<RouteTableMapping>,
}

impl RouteTableIntrospector {
    /// Creates an introspector using the default lookup-path helper.
    pub fn new(router: Arc<Router>) -> Self {
        Self::with_path_helper(router, UrlPathHelper::default())
    }

    /// Creates an introspector with a custom lookup-path helper.
    pub fn with_path_helper(router: Arc<Router>, path_helper: UrlPathHelper) -> Self {
        Self {
            router,
            mapping: Arc::new(RouteTableMapping { path_helper }),
        }
    }

    /// Returns the route table.
    pub fn router(&self) -> &Router {
        &self.router
    }
}

impl HandlerIntrospector for RouteTableIntrospector {
    fn resolve(
        &self,
        request: &dyn RequestParts,
    ) -> Result<Option<Arc<dyn MatchableMapping>>, anyhow::Error> {
        let lookup_path = self.mapping.path_helper.lookup_path(request);
        match self.router.match_route(request.method(), &lookup_path) {
            Some(route) => {
                tracing::trace!(
                    handler = route.handler,
                    route = route.pattern,
                    http.path = %lookup_path,
                    "request resolved to route"
                );
                let mapping: Arc<dyn MatchableMapping> = self.mapping.clone();
                Ok(Some(mapping))
            }
            None => Ok(None),
        }
    }
}

/// Pattern matching with route-table segment semantics.
#[derive(Debug, Clone)]
pub struct RouteTableMapping {
    path_helper: UrlPathHelper,
}

impl MatchableMapping for RouteTableMapping {
    fn match_request(
        &self,
        request: &dyn RequestParts,
        pattern: &str,
    ) -> Result<Option<RequestMatchResult>, anyhow::Error> {
        let lookup_path = self.path_helper.lookup_path(request);
        let params = Router::try_match_pattern(pattern, &lookup_path)?;
        Ok(params.map(RequestMatchResult::new))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bulwark_core::SyntheticRequest;
    use bulwark_router::MethodRouter;
    use http::Method;

    fn introspector() -> RouteTableIntrospector {
        let mut router = Router::new();
        router
            .insert("/orders", MethodRouter::new().get("listOrders"))
            .unwrap();
        router
            .insert("/files/*path", MethodRouter::new().any("serveFile"))
            .unwrap();
        RouteTableIntrospector::new(Arc::new(router))
    }

    fn request(path: &str, method: Method) -> SyntheticRequest {
        SyntheticRequest::new(Some(""), path, None, None, method)
    }

    #[test]
    fn test_resolve_requires_method_and_path() {
        let introspector = introspector();
        assert!(introspector.resolve(&request("/orders", Method::GET)).unwrap().is_some());
        assert!(introspector.resolve(&request("/orders", Method::POST)).unwrap().is_none());
        assert!(introspector.resolve(&request("/nowhere", Method::GET)).unwrap().is_none());
    }

    #[test]
    fn test_mapping_uses_route_semantics() {
        let introspector = introspector();
        let req = request("/orders/", Method::GET);
        let mapping = introspector.resolve(&req).unwrap().unwrap();

        // empty segments are ignored, unlike Ant patterns
        assert!(mapping.match_request(&req, "/orders").unwrap().is_some());
        assert!(mapping.match_request(&req, "/orders/{id}").unwrap().is_none());
    }

    #[test]
    fn test_mapping_extracts_catch_all() {
        let introspector = introspector();
        let req = request("/files/a/b.txt", Method::DELETE);
        let mapping = introspector.resolve(&req).unwrap().unwrap();
        let result = mapping.match_request(&req, "/files/*rest").unwrap().unwrap();
        assert_eq!(result.variables().get("rest"), Some("a/b.txt"));
        assert_eq!(result.into_variables().len(), 1);
    }

    #[test]
    fn test_mapping_reports_malformed_pattern() {
        let introspector = introspector();
        let req = request("/files/a", Method::GET);
        let mapping = introspector.resolve(&req).unwrap().unwrap();
        assert!(mapping.match_request(&req, "/files/*rest/x").is_err());
    }
}
