//! The request matcher capability and the plain path-pattern matcher.

use crate::ant::AntPattern;
use bulwark_core::{BulwarkResult, RequestParts, UrlPathHelper};
use bulwark_router::Params;
use http::Method;
use std::fmt;

/// Decides whether a request satisfies a pattern.
///
/// Implementations are immutable once built and are shared across
/// concurrent requests.
pub trait RequestMatcher: Send + Sync + fmt::Debug {
    /// Returns true if the request matches.
    fn matches(&self, request: &dyn RequestParts) -> bool;

    /// Returns the variables captured from the request.
    ///
    /// The result is empty whenever [`matches`](Self::matches) is false for
    /// the same request.
    fn extract_variables(&self, request: &dyn RequestParts) -> Params {
        let _ = request;
        Params::new()
    }

    /// Matches and extracts in one step: the captured variables, or `None`
    /// when the request does not match.
    ///
    /// Callers needing both answers for one request should use this, so a
    /// matcher doing per-request work does it once.
    fn match_request(&self, request: &dyn RequestParts) -> Option<Params> {
        self.matches(request).then(|| self.extract_variables(request))
    }
}

/// Matches every request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnyRequestMatcher;

impl RequestMatcher for AnyRequestMatcher {
    fn matches(&self, _request: &dyn RequestParts) -> bool {
        true
    }
}

/// Ant-style pattern matching over the request's lookup path.
///
/// ```
/// use bulwark_core::SyntheticRequest;
/// use bulwark_matcher::{PathPatternMatcher, RequestMatcher};
/// use http::Method;
///
/// let matcher = PathPatternMatcher::new("/orders/{id}").unwrap();
/// let request = SyntheticRequest::new(Some("/app"), "/orders", Some("/42"), None, Method::GET);
///
/// assert!(matcher.matches(&request));
/// assert_eq!(matcher.extract_variables(&request).get("id"), Some("42"));
/// ```
#[derive(Debug, Clone)]
pub struct PathPatternMatcher {
    pattern: AntPattern,
    method: Option<Method>,
    path_helper: UrlPathHelper,
}

impl PathPatternMatcher {
    /// Creates a case-sensitive matcher for any method.
    pub fn new(pattern: &str) -> BulwarkResult<Self> {
        Self::with_case_sensitivity(pattern, true)
    }

    /// Creates a matcher with the given case sensitivity.
    pub fn with_case_sensitivity(pattern: &str, case_sensitive: bool) -> BulwarkResult<Self> {
        Ok(Self {
            pattern: AntPattern::with_case_sensitivity(pattern, case_sensitive)?,
            method: None,
            path_helper: UrlPathHelper::default(),
        })
    }

    /// Restricts the matcher to one HTTP method.
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    /// Replaces the lookup-path helper.
    pub fn with_path_helper(mut self, path_helper: UrlPathHelper) -> Self {
        self.path_helper = path_helper;
        self
    }

    /// Returns the pattern text.
    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    /// Returns the method constraint.
    pub fn method(&self) -> Option<&Method> {
        self.method.as_ref()
    }

    /// Returns the lookup-path helper.
    pub fn path_helper(&self) -> &UrlPathHelper {
        &self.path_helper
    }

    /// Matches an already normalized lookup path, ignoring the method.
    pub fn matches_path(&self, lookup_path: &str) -> bool {
        self.pattern.matches(lookup_path)
    }
}

impl RequestMatcher for PathPatternMatcher {
    fn matches(&self, request: &dyn RequestParts) -> bool {
        self.match_request(request).is_some()
    }

    fn extract_variables(&self, request: &dyn RequestParts) -> Params {
        self.match_request(request).unwrap_or_default()
    }

    fn match_request(&self, request: &dyn RequestParts) -> Option<Params> {
        if let Some(method) = &self.method {
            if method != request.method() {
                return None;
            }
        }
        let lookup_path = self.path_helper.lookup_path(request);
        let result = self.pattern.match_path(&lookup_path);
        tracing::trace!(
            pattern = %self.pattern,
            http.path = %lookup_path,
            matched = result.is_some(),
            "path pattern evaluated"
        );
        result
    }
}

impl fmt::Display for PathPatternMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.method {
            Some(method) => write!(f, "Ant [pattern='{}', {method}]", self.pattern),
            None => write!(f, "Ant [pattern='{}']", self.pattern),
        }
    }
}
