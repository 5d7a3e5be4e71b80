//! Per-method handler registration.

use http::Method;
use smallvec::SmallVec;

/// Handler ids registered for one path, keyed by HTTP method.
///
/// Methods are compared exactly. A handler registered with [`any`] serves
/// every method that has no explicit entry.
///
/// # Example
///
/// ```rust
/// use bulwark_router::MethodRouter;
/// use http::Method;
///
/// let methods = MethodRouter::new()
///     .get("getUser")
///     .delete("deleteUser");
///
/// assert_eq!(methods.handler_for(&Method::GET), Some("getUser"));
/// assert_eq!(methods.handler_for(&Method::POST), None);
/// ```
///
/// [`any`]: MethodRouter::any
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MethodRouter {
    entries: SmallVec<[(Method, String); 4]>,
    fallback: Option<String>,
}

impl MethodRouter {
    /// Creates an empty method router.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the handler for GET requests.
    #[must_use]
    pub fn get(self, handler: impl Into<String>) -> Self {
        self.method(&Method::GET, handler)
    }

    /// Sets the handler for POST requests.
    #[must_use]
    pub fn post(self, handler: impl Into<String>) -> Self {
        self.method(&Method::POST, handler)
    }

    /// Sets the handler for PUT requests.
    #[must_use]
    pub fn put(self, handler: impl Into<String>) -> Self {
        self.method(&Method::PUT, handler)
    }

    /// Sets the handler for DELETE requests.
    #[must_use]
    pub fn delete(self, handler: impl Into<String>) -> Self {
        self.method(&Method::DELETE, handler)
    }

    /// Sets the handler for PATCH requests.
    #[must_use]
    pub fn patch(self, handler: impl Into<String>) -> Self {
        self.method(&Method::PATCH, handler)
    }

    /// Sets the handler for HEAD requests.
    #[must_use]
    pub fn head(self, handler: impl Into<String>) -> Self {
        self.method(&Method::HEAD, handler)
    }

    /// Sets the handler for OPTIONS requests.
    #[must_use]
    pub fn options(self, handler: impl Into<String>) -> Self {
        self.method(&Method::OPTIONS, handler)
    }

    /// Sets the handler for an arbitrary method, including extension methods.
    #[must_use]
    pub fn method(mut self, method: &Method, handler: impl Into<String>) -> Self {
        let handler = handler.into();
        match self.entries.iter_mut().find(|(m, _)| m == method) {
            Some((_, existing)) => *existing = handler,
            None => self.entries.push((method.clone(), handler)),
        }
        self
    }

    /// Sets the handler used for methods without an explicit entry.
    #[must_use]
    pub fn any(mut self, handler: impl Into<String>) -> Self {
        self.fallback = Some(handler.into());
        self
    }

    /// Returns the handler serving `method`.
    #[must_use]
    pub fn handler_for(&self, method: &Method) -> Option<&str> {
        self.entries
            .iter()
            .find(|(m, _)| m == method)
            .map(|(_, handler)| handler.as_str())
            .or(self.fallback.as_deref())
    }

    /// Merges another method router into this one.
    ///
    /// Entries already present in `self` are kept.
    pub fn merge(&mut self, other: MethodRouter) {
        for (method, handler) in other.entries {
            if !self.entries.iter().any(|(m, _)| *m == method) {
                self.entries.push((method, handler));
            }
        }
        if self.fallback.is_none() {
            self.fallback = other.fallback;
        }
    }

    /// Returns true if any handler is registered.
    #[must_use]
    pub fn has_any_method(&self) -> bool {
        !self.entries.is_empty() || self.fallback.is_some()
    }

    /// Returns true if every method is served.
    #[must_use]
    pub fn accepts_any(&self) -> bool {
        self.fallback.is_some()
    }

    /// Returns the explicitly registered methods in registration order.
    #[must_use]
    pub fn allowed_methods(&self) -> Vec<Method> {
        self.entries.iter().map(|(m, _)| m.clone()).collect()
    }
}
