//! Routing-aware request matching.
//!
//! [`RoutedRequestMatcher`] asks a [`HandlerIntrospector`] which mapping
//! would serve the request and lets that mapping decide, so the matcher
//! agrees with the router. When no introspector is configured, no mapping
//! resolves, or resolution fails, it falls back to Ant-style matching over
//! the lookup path. Fallbacks are counted per matcher and reported to the
//! `bulwark_matcher_fallback_total` metric.

use crate::introspect::{HandlerIntrospector, MatchableMapping};
use crate::matcher::{PathPatternMatcher, RequestMatcher};
use bulwark_core::{BulwarkResult, RequestParts, UrlPathHelper};
use bulwark_router::Params;
use bulwark_telemetry::metrics::record_matcher_fallback;
use http::Method;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Where a match decision comes from.
enum Resolution {
    Mapping(Arc<dyn MatchableMapping>),
    Fallback,
}

/// A matcher that defers to routing introspection when available.
///
/// ```
/// use bulwark_core::SyntheticRequest;
/// use bulwark_matcher::{RequestMatcher, RoutedRequestMatcher};
/// use http::Method;
///
/// let matcher = RoutedRequestMatcher::builder("/orders/{id}")
///     .method(Method::GET)
///     .build()
///     .unwrap();
///
/// let request = SyntheticRequest::new(None, "/orders/7", None, None, Method::GET);
/// assert!(matcher.matches(&request));
/// assert_eq!(matcher.fallback_count(), 1);
/// ```
#[derive(Debug)]
pub struct RoutedRequestMatcher {
    pattern: String,
    method: Option<Method>,
    servlet_path: Option<String>,
    introspector: Option<Arc<dyn HandlerIntrospector>>,
    fallback: PathPatternMatcher,
    fallback_count: AtomicU64,
}

impl RoutedRequestMatcher {
    /// Creates a matcher for `pattern` with no constraints and no
    /// introspector.
    pub fn new(pattern: &str) -> BulwarkResult<Self> {
        Self::builder(pattern).build()
    }

    /// Starts building a matcher for `pattern`.
    pub fn builder(pattern: impl Into<String>) -> RoutedRequestMatcherBuilder {
        RoutedRequestMatcherBuilder {
            pattern: pattern.into(),
            method: None,
            servlet_path: None,
            introspector: None,
            path_helper: UrlPathHelper::default(),
            case_sensitive: true,
        }
    }

    /// Returns the pattern.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Returns the method constraint.
    pub fn method(&self) -> Option<&Method> {
        self.method.as_ref()
    }

    /// Returns the servlet path constraint.
    pub fn servlet_path(&self) -> Option<&str> {
        self.servlet_path.as_deref()
    }

    /// Returns the number of decisions made by the fallback matcher.
    ///
    /// Counts matcher calls: `matches` followed by `extract_variables` on
    /// one request counts twice, `match_request` once.
    pub fn fallback_count(&self) -> u64 {
        self.fallback_count.load(Ordering::Relaxed)
    }

    fn preconditions_hold(&self, request: &dyn RequestParts) -> bool {
        if let Some(method) = &self.method {
            if method != request.method() {
                return false;
            }
        }
        match &self.servlet_path {
            Some(servlet_path) => servlet_path == request.servlet_path(),
            None => true,
        }
    }

    fn resolve(&self, request: &dyn RequestParts) -> Resolution {
        let Some(introspector) = &self.introspector else {
            return self.fall_back(request, "no_introspector");
        };

        match introspector.resolve(request) {
            Ok(Some(mapping)) => Resolution::Mapping(mapping),
            Ok(None) => self.fall_back(request, "no_mapping"),
            Err(error) => {
                tracing::debug!(
                    pattern = %self.pattern,
                    error = %error,
                    "routing introspection failed"
                );
                self.fall_back(request, "resolve_error")
            }
        }
    }

    fn fall_back(&self, request: &dyn RequestParts, reason: &'static str) -> Resolution {
        self.fallback_count.fetch_add(1, Ordering::Relaxed);
        record_matcher_fallback(reason);
        tracing::trace!(
            pattern = %self.pattern,
            http.method = %request.method(),
            http.path = %request.request_uri(),
            reason,
            "falling back to path pattern matching"
        );
        Resolution::Fallback
    }

    fn match_mapping(
        &self,
        mapping: &dyn MatchableMapping,
        request: &dyn RequestParts,
    ) -> Option<Params> {
        match mapping.match_request(request, &self.pattern) {
            Ok(result) => result.map(|result| result.into_variables()),
            Err(error) => {
                tracing::debug!(
                    pattern = %self.pattern,
                    error = %error,
                    "mapping failed to match pattern"
                );
                None
            }
        }
    }
}

impl RequestMatcher for RoutedRequestMatcher {
    fn matches(&self, request: &dyn RequestParts) -> bool {
        self.match_request(request).is_some()
    }

    fn extract_variables(&self, request: &dyn RequestParts) -> Params {
        self.match_request(request).unwrap_or_default()
    }

    fn match_request(&self, request: &dyn RequestParts) -> Option<Params> {
        if !self.preconditions_hold(request) {
            return None;
        }
        match self.resolve(request) {
            Resolution::Mapping(mapping) => self.match_mapping(mapping.as_ref(), request),
            Resolution::Fallback => self.fallback.match_request(request),
        }
    }
}

impl fmt::Display for RoutedRequestMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Routed [pattern='{}'", self.pattern)?;
        if let Some(servlet_path) = &self.servlet_path {
            write!(f, ", servletPath='{servlet_path}'")?;
        }
        if let Some(method) = &self.method {
            write!(f, ", {method}")?;
        }
        f.write_str("]")
    }
}

/// Builder for [`RoutedRequestMatcher`].
#[derive(Debug)]
pub struct RoutedRequestMatcherBuilder {
    pattern: String,
    method: Option<Method>,
    servlet_path: Option<String>,
    introspector: Option<Arc<dyn HandlerIntrospector>>,
    path_helper: UrlPathHelper,
    case_sensitive: bool,
}

impl RoutedRequestMatcherBuilder {
    /// Only match requests with this exact method.
    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    /// Only match requests with this exact servlet path.
    pub fn servlet_path(mut self, servlet_path: impl Into<String>) -> Self {
        self.servlet_path = Some(servlet_path.into());
        self
    }

    /// Sets the routing introspector.
    pub fn introspector(mut self, introspector: Arc<dyn HandlerIntrospector>) -> Self {
        self.introspector = Some(introspector);
        self
    }

    /// Sets the lookup-path helper used by the fallback matcher.
    pub fn path_helper(mut self, path_helper: UrlPathHelper) -> Self {
        self.path_helper = path_helper;
        self
    }

    /// Sets case sensitivity of the fallback matcher.
    pub fn case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    /// Compiles the fallback pattern and builds the matcher.
    pub fn build(self) -> BulwarkResult<RoutedRequestMatcher> {
        let fallback = PathPatternMatcher::with_case_sensitivity(&self.pattern, self.case_sensitive)?
            .with_path_helper(self.path_helper);
        Ok(RoutedRequestMatcher {
            pattern: self.pattern,
            method: self.method,
            servlet_path: self.servlet_path,
            introspector: self.introspector,
            fallback,
            fallback_count: AtomicU64::new(0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::introspect::{RequestMatchResult, RouteTableIntrospector};
    use bulwark_core::SyntheticRequest;
    use bulwark_router::{MethodRouter, Router};

    #[derive(Debug)]
    struct FailingIntrospector;

    impl HandlerIntrospector for FailingIntrospector {
        fn resolve(
            &self,
            _request: &dyn RequestParts,
        ) -> Result<Option<Arc<dyn MatchableMapping>>, anyhow::Error> {
            Err(anyhow::anyhow!("introspection unavailable"))
        }
    }

    #[derive(Debug)]
    struct BrokenMapping;

    impl MatchableMapping for BrokenMapping {
        fn match_request(
            &self,
            _request: &dyn RequestParts,
            _pattern: &str,
        ) -> Result<Option<RequestMatchResult>, anyhow::Error> {
            Err(anyhow::anyhow!("mapping exploded"))
        }
    }

    #[derive(Debug)]
    struct BrokenMappingIntrospector;

    impl HandlerIntrospector for BrokenMappingIntrospector {
        fn resolve(
            &self,
            _request: &dyn RequestParts,
        ) -> Result<Option<Arc<dyn MatchableMapping>>, anyhow::Error> {
            Ok(Some(Arc::new(BrokenMapping)))
        }
    }

    fn route_table() -> Arc<dyn HandlerIntrospector> {
        let mut router = Router::new();
        router
            .insert("/orders/{id}", MethodRouter::new().get("getOrder"))
            .unwrap();
        Arc::new(RouteTableIntrospector::new(Arc::new(router)))
    }

    fn request(servlet_path: &str, path_info: Option<&str>, method: Method) -> SyntheticRequest {
        SyntheticRequest::new(Some("/app"), servlet_path, path_info, None, method)
    }

    #[test]
    fn test_method_mismatch_short_circuits() {
        let matcher = RoutedRequestMatcher::builder("/orders/**")
            .method(Method::POST)
            .build()
            .unwrap();
        assert!(!matcher.matches(&request("/orders/1", None, Method::GET)));
        assert!(matcher
            .extract_variables(&request("/orders/1", None, Method::GET))
            .is_empty());
        assert_eq!(matcher.fallback_count(), 0);
    }

    #[test]
    fn test_servlet_path_constraint() {
        let matcher = RoutedRequestMatcher::builder("/api/orders/**")
            .servlet_path("/api")
            .build()
            .unwrap();
        assert!(matcher.matches(&request("/api", Some("/orders/1"), Method::GET)));
        assert!(!matcher.matches(&request("/orders", Some("/1"), Method::GET)));
    }

    #[test]
    fn test_fallback_without_introspector() {
        let matcher = RoutedRequestMatcher::new("/orders/{id}").unwrap();
        let req = request("/orders/42", None, Method::GET);
        assert!(matcher.matches(&req));
        assert_eq!(matcher.extract_variables(&req).get("id"), Some("42"));
        assert_eq!(matcher.fallback_count(), 2);
    }

    #[test]
    fn test_match_request_resolves_once() {
        let matcher = RoutedRequestMatcher::builder("/orders/{id}")
            .introspector(Arc::new(FailingIntrospector))
            .build()
            .unwrap();
        let params = matcher
            .match_request(&request("/orders/42", None, Method::GET))
            .unwrap();
        assert_eq!(params.get("id"), Some("42"));
        assert_eq!(matcher.fallback_count(), 1);

        assert!(matcher
            .match_request(&request("/invoices/1", None, Method::GET))
            .is_none());
        assert_eq!(matcher.fallback_count(), 2);
    }

    #[test]
    fn test_introspection_failure_is_swallowed() {
        let matcher = RoutedRequestMatcher::builder("/orders/*")
            .introspector(Arc::new(FailingIntrospector))
            .build()
            .unwrap();
        assert!(matcher.matches(&request("/orders/1", None, Method::GET)));
        assert!(!matcher.matches(&request("/invoices/1", None, Method::GET)));
        assert_eq!(matcher.fallback_count(), 2);
    }

    #[test]
    fn test_mapping_decides_when_resolved() {
        let matcher = RoutedRequestMatcher::builder("/orders/{id}")
            .introspector(route_table())
            .build()
            .unwrap();

        // trailing slash resolves through the route table and matches with its rules
        let req = request("/orders/42/", None, Method::GET);
        assert!(matcher.matches(&req));
        assert_eq!(matcher.extract_variables(&req).get("id"), Some("42"));
        assert_eq!(matcher.fallback_count(), 0);

        let plain = PathPatternMatcher::new("/orders/{id}").unwrap();
        assert!(!plain.matches(&req));
    }

    #[test]
    fn test_unrouted_request_falls_back() {
        let matcher = RoutedRequestMatcher::builder("/orders/{id}")
            .introspector(route_table())
            .build()
            .unwrap();
        let req = request("/orders/42", None, Method::DELETE);
        assert!(matcher.matches(&req));
        assert_eq!(matcher.fallback_count(), 1);
    }

    #[test]
    fn test_mapping_error_is_no_match() {
        let matcher = RoutedRequestMatcher::builder("/orders/**")
            .introspector(Arc::new(BrokenMappingIntrospector))
            .build()
            .unwrap();
        let req = request("/orders/1", None, Method::GET);
        assert!(!matcher.matches(&req));
        assert!(matcher.extract_variables(&req).is_empty());
        assert_eq!(matcher.fallback_count(), 0);
    }

    #[test]
    fn test_invalid_pattern_fails_build() {
        let err = RoutedRequestMatcher::new("/orders/{id").unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_display_and_accessors() {
        let matcher = RoutedRequestMatcher::builder("/a")
            .servlet_path("/api")
            .method(Method::GET)
            .build()
            .unwrap();
        assert_eq!(matcher.to_string(), "Routed [pattern='/a', servletPath='/api', GET]");
        assert_eq!(matcher.pattern(), "/a");
        assert_eq!(matcher.method(), Some(&Method::GET));
        assert_eq!(matcher.servlet_path(), Some("/api"));
    }
}
