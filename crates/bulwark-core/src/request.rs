//! Request representations seen by matchers and stages.
//!
//! Matchers never look at a concrete request type. They read the
//! [`RequestParts`] surface, which both the [`LiveRequest`] (a real HTTP
//! request split along its context path, servlet path and path info) and
//! the [`SyntheticRequest`] (an in-memory stand-in used to drive matchers
//! without traffic) implement.

use crate::error::{BulwarkError, BulwarkResult};
use crate::types::Request;
use http::Method;
use serde_json::Value;
use std::collections::HashMap;

/// Context path assumed by a synthetic request when none is given.
pub const DEFAULT_CONTEXT_PATH: &str = "/cp";

/// Character encoding reported by every synthetic request.
pub const SYNTHETIC_CHARACTER_ENCODING: &str = "UTF-8";

/// The read-only request surface available to matchers.
///
/// `request_uri` is always `context_path + servlet_path + path_info`
/// (undecoded, without the query string).
pub trait RequestParts: Send + Sync {
    /// Returns the HTTP method.
    fn method(&self) -> &Method;

    /// Returns the application prefix, `""` for the root application.
    fn context_path(&self) -> &str;

    /// Returns the part of the path that selected the handler mapping.
    fn servlet_path(&self) -> &str;

    /// Returns the path below the servlet path, if any.
    fn path_info(&self) -> Option<&str>;

    /// Returns the raw query string without the leading `?`.
    fn query_string(&self) -> Option<&str>;

    /// Returns the request URI path.
    fn request_uri(&self) -> &str;

    /// Returns the declared character encoding.
    fn character_encoding(&self) -> Option<&str>;

    /// Looks up a request attribute.
    fn attribute(&self, name: &str) -> Option<&Value>;
}

/// A real HTTP request flowing through the pipeline.
///
/// Wraps an [`http::Request`] and records how its path splits into
/// context path, servlet path and path info, plus the attributes stages
/// attach while processing it.
///
/// # Example
///
/// ```
/// use bulwark_core::{LiveRequest, RequestParts};
/// use bytes::Bytes;
/// use http_body_util::Full;
///
/// let request = http::Request::builder()
///     .uri("/app/orders/42?x=1")
///     .body(Full::new(Bytes::new()))
///     .unwrap();
///
/// let live = LiveRequest::with_context_path(request, "/app").unwrap();
/// assert_eq!(live.context_path(), "/app");
/// assert_eq!(live.servlet_path(), "/orders/42");
/// assert_eq!(live.query_string(), Some("x=1"));
/// ```
#[derive(Debug)]
pub struct LiveRequest {
    inner: Request,
    context_path: String,
    servlet_path: String,
    path_info: Option<String>,
    attributes: HashMap<String, Value>,
}

impl LiveRequest {
    /// Wraps a request deployed at the root context with a default mapping.
    ///
    /// The whole path becomes the servlet path.
    #[must_use]
    pub fn new(inner: Request) -> Self {
        let servlet_path = inner.uri().path().to_string();
        Self {
            inner,
            context_path: String::new(),
            servlet_path,
            path_info: None,
            attributes: HashMap::new(),
        }
    }

    /// Wraps a request served below `context_path`.
    ///
    /// Everything after the context path becomes the servlet path.
    ///
    /// # Errors
    ///
    /// Returns [`BulwarkError::InvalidArgument`] if the context path is
    /// malformed or is not a prefix of the request path.
    pub fn with_context_path(inner: Request, context_path: &str) -> BulwarkResult<Self> {
        validate_prefix("context path", context_path)?;
        let servlet_path = strip_segment_prefix(inner.uri().path(), context_path)
            .ok_or_else(|| {
                BulwarkError::invalid_argument(format!(
                    "request path '{}' is outside context path '{context_path}'",
                    inner.uri().path()
                ))
            })?
            .to_string();

        Ok(Self {
            inner,
            context_path: context_path.to_string(),
            servlet_path,
            path_info: None,
            attributes: HashMap::new(),
        })
    }

    /// Wraps a request served below `context_path` by a path-prefix mapping.
    ///
    /// The path after `context_path + servlet_path` becomes the path info.
    ///
    /// # Errors
    ///
    /// Returns [`BulwarkError::InvalidArgument`] if either prefix is
    /// malformed or does not prefix the request path.
    pub fn with_servlet_mapping(
        inner: Request,
        context_path: &str,
        servlet_path: &str,
    ) -> BulwarkResult<Self> {
        validate_prefix("servlet path", servlet_path)?;
        let mut request = Self::with_context_path(inner, context_path)?;

        let within_context = std::mem::take(&mut request.servlet_path);
        let rest = strip_segment_prefix(&within_context, servlet_path).ok_or_else(|| {
            BulwarkError::invalid_argument(format!(
                "request path '{within_context}' is outside servlet path '{servlet_path}'"
            ))
        })?;

        request.path_info = (!rest.is_empty()).then(|| rest.to_string());
        request.servlet_path = servlet_path.to_string();
        Ok(request)
    }

    /// Returns the URI scheme, `http` when the URI is in origin form.
    #[must_use]
    pub fn scheme(&self) -> &str {
        self.inner.uri().scheme_str().unwrap_or("http")
    }

    /// Returns the host the request was addressed to.
    ///
    /// Taken from the absolute URI, else from the `Host` header, else
    /// `localhost`.
    #[must_use]
    pub fn server_name(&self) -> &str {
        if let Some(host) = self.inner.uri().host() {
            return host;
        }
        self.host_header()
            .map(|(name, _)| name)
            .unwrap_or("localhost")
    }

    /// Returns the port the request was addressed to.
    ///
    /// Falls back to the scheme's default port when neither the URI nor
    /// the `Host` header carries one.
    #[must_use]
    pub fn server_port(&self) -> u16 {
        if let Some(port) = self.inner.uri().port_u16() {
            return port;
        }
        if self.inner.uri().host().is_none() {
            if let Some(port) = self.host_header().and_then(|(_, port)| port) {
                return port;
            }
        }
        default_port(self.scheme())
    }

    /// Returns the request headers.
    #[must_use]
    pub fn headers(&self) -> &http::HeaderMap {
        self.inner.headers()
    }

    /// Returns a header value as a string.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.inner.headers().get(name).and_then(|v| v.to_str().ok())
    }

    /// Sets a request attribute, replacing any previous value.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.attributes.insert(name.into(), value.into());
    }

    /// Removes a request attribute.
    pub fn remove_attribute(&mut self, name: &str) -> Option<Value> {
        self.attributes.remove(name)
    }

    /// Returns all request attributes.
    #[must_use]
    pub fn attributes(&self) -> &HashMap<String, Value> {
        &self.attributes
    }

    /// Returns the wrapped HTTP request.
    #[must_use]
    pub fn inner(&self) -> &Request {
        &self.inner
    }

    /// Consumes the wrapper, returning the HTTP request.
    #[must_use]
    pub fn into_inner(self) -> Request {
        self.inner
    }

    fn host_header(&self) -> Option<(&str, Option<u16>)> {
        let host = self.header(http::header::HOST.as_str())?;
        match host.rsplit_once(':') {
            Some((name, port)) => match port.parse() {
                Ok(port) => Some((name, Some(port))),
                Err(_) => Some((host, None)),
            },
            None => Some((host, None)),
        }
    }
}

impl RequestParts for LiveRequest {
    fn method(&self) -> &Method {
        self.inner.method()
    }

    fn context_path(&self) -> &str {
        &self.context_path
    }

    fn servlet_path(&self) -> &str {
        &self.servlet_path
    }

    fn path_info(&self) -> Option<&str> {
        self.path_info.as_deref()
    }

    fn query_string(&self) -> Option<&str> {
        self.inner.uri().query()
    }

    fn request_uri(&self) -> &str {
        self.inner.uri().path()
    }

    fn character_encoding(&self) -> Option<&str> {
        let content_type = self.header(http::header::CONTENT_TYPE.as_str())?;
        content_type.split(';').skip(1).find_map(|param| {
            let (key, value) = param.split_once('=')?;
            key.trim()
                .eq_ignore_ascii_case("charset")
                .then(|| value.trim().trim_matches('"'))
        })
    }

    fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }
}

/// An in-memory request carrying only what matchers read.
///
/// There are no headers, no body and no connection details. Everything
/// a matcher may legitimately consult is available; the character
/// encoding is always UTF-8 and attribute lookup always reports absence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntheticRequest {
    context_path: String,
    servlet_path: String,
    path_info: Option<String>,
    query_string: Option<String>,
    method: Method,
    request_uri: String,
}

impl SyntheticRequest {
    /// Creates a synthetic request.
    ///
    /// `context_path` defaults to [`DEFAULT_CONTEXT_PATH`].
    #[must_use]
    pub fn new(
        context_path: Option<&str>,
        servlet_path: &str,
        path_info: Option<&str>,
        query_string: Option<&str>,
        method: Method,
    ) -> Self {
        let context_path = context_path.unwrap_or(DEFAULT_CONTEXT_PATH).to_string();
        let request_uri = format!(
            "{context_path}{servlet_path}{}",
            path_info.unwrap_or_default()
        );

        Self {
            context_path,
            servlet_path: servlet_path.to_string(),
            path_info: path_info.map(ToString::to_string),
            query_string: query_string.map(ToString::to_string),
            method,
            request_uri,
        }
    }
}

impl RequestParts for SyntheticRequest {
    fn method(&self) -> &Method {
        &self.method
    }

    fn context_path(&self) -> &str {
        &self.context_path
    }

    fn servlet_path(&self) -> &str {
        &self.servlet_path
    }

    fn path_info(&self) -> Option<&str> {
        self.path_info.as_deref()
    }

    fn query_string(&self) -> Option<&str> {
        self.query_string.as_deref()
    }

    fn request_uri(&self) -> &str {
        &self.request_uri
    }

    fn character_encoding(&self) -> Option<&str> {
        Some(SYNTHETIC_CHARACTER_ENCODING)
    }

    fn attribute(&self, _name: &str) -> Option<&Value> {
        None
    }
}

/// Returns the default port for a scheme.
#[must_use]
pub fn default_port(scheme: &str) -> u16 {
    if scheme.eq_ignore_ascii_case("https") || scheme.eq_ignore_ascii_case("wss") {
        443
    } else {
        80
    }
}

fn validate_prefix(what: &str, prefix: &str) -> BulwarkResult<()> {
    if prefix.is_empty() || (prefix.starts_with('/') && !prefix.ends_with('/')) {
        Ok(())
    } else {
        Err(BulwarkError::invalid_argument(format!(
            "{what} '{prefix}' must be empty or start with '/' and not end with '/'"
        )))
    }
}

// `prefix` must match whole segments: "/app" prefixes "/app/x" but not "/apple".
fn strip_segment_prefix<'p>(path: &'p str, prefix: &str) -> Option<&'p str> {
    let rest = path.strip_prefix(prefix)?;
    (rest.is_empty() || rest.starts_with('/')).then_some(rest)
}
