//! URL reconstruction and lookup-path normalization.

use crate::request::RequestParts;

/// Builds the URL of a request relative to its application.
///
/// The result is `servlet_path + path_info`, followed by `?query` when a
/// query string is present.
///
/// ```
/// use bulwark_core::url::build_request_url;
///
/// assert_eq!(build_request_url("/orders", Some("/42"), Some("x=1")), "/orders/42?x=1");
/// assert_eq!(build_request_url("/orders", None, None), "/orders");
/// ```
#[must_use]
pub fn build_request_url(servlet_path: &str, path_info: Option<&str>, query: Option<&str>) -> String {
    let mut url = String::with_capacity(servlet_path.len() + 16);
    url.push_str(servlet_path);
    if let Some(path_info) = path_info {
        url.push_str(path_info);
    }
    if let Some(query) = query {
        url.push('?');
        url.push_str(query);
    }
    url
}

/// Builds the absolute URL of a request.
///
/// The port is omitted when it is the default for `http` (80) or
/// `https` (443), and for any other scheme.
///
/// ```
/// use bulwark_core::url::build_full_request_url;
///
/// let url = build_full_request_url("https", "example.com", 443, "/app", "/orders?x=1");
/// assert_eq!(url, "https://example.com/app/orders?x=1");
///
/// let url = build_full_request_url("http", "localhost", 8080, "", "/orders");
/// assert_eq!(url, "http://localhost:8080/orders");
/// ```
#[must_use]
pub fn build_full_request_url(
    scheme: &str,
    server_name: &str,
    server_port: u16,
    context_path: &str,
    request_url: &str,
) -> String {
    let scheme = scheme.to_ascii_lowercase();
    let mut url = format!("{scheme}://{server_name}");

    let include_port = match scheme.as_str() {
        "http" => server_port != 80,
        "https" => server_port != 443,
        _ => false,
    };
    if include_port {
        url.push(':');
        url.push_str(&server_port.to_string());
    }

    url.push_str(context_path);
    url.push_str(request_url);
    url
}

/// Derives the path that request patterns are matched against.
///
/// The lookup path is the request URI with the context path removed, then
/// cleaned: `;` path parameters stripped, percent-escapes decoded and
/// repeated slashes collapsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlPathHelper {
    /// Match against the full path within the application rather than the
    /// path within the servlet mapping.
    pub always_use_full_path: bool,
    /// Percent-decode the path.
    pub url_decode: bool,
    /// Remove `;name=value` segments.
    pub remove_semicolon_content: bool,
}

impl Default for UrlPathHelper {
    fn default() -> Self {
        Self {
            always_use_full_path: true,
            url_decode: true,
            remove_semicolon_content: true,
        }
    }
}

impl UrlPathHelper {
    /// Creates a helper with the default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the normalized lookup path for a request.
    #[must_use]
    pub fn lookup_path(&self, request: &dyn RequestParts) -> String {
        if self.always_use_full_path {
            return self.path_within_application(request);
        }

        let within_mapping = match request.path_info() {
            Some(path_info) if !path_info.is_empty() => path_info,
            _ => request.servlet_path(),
        };
        if within_mapping.is_empty() {
            self.path_within_application(request)
        } else {
            self.clean(within_mapping)
        }
    }

    /// Returns the request URI below the context path, cleaned.
    #[must_use]
    pub fn path_within_application(&self, request: &dyn RequestParts) -> String {
        let uri = request.request_uri();
        let within = uri.strip_prefix(request.context_path()).unwrap_or(uri);
        let cleaned = self.clean(within);
        if cleaned.is_empty() {
            "/".to_string()
        } else {
            cleaned
        }
    }

    fn clean(&self, path: &str) -> String {
        let path = if self.remove_semicolon_content {
            remove_semicolon_content(path)
        } else {
            path.to_string()
        };

        let path = if self.url_decode {
            match urlencoding::decode(&path) {
                Ok(decoded) => decoded.into_owned(),
                Err(error) => {
                    tracing::trace!(path = %path, error = %error, "keeping undecodable path");
                    path
                }
            }
        } else {
            path
        };

        collapse_slashes(&path)
    }
}

/// Strips `;`-delimited parameters from each path segment.
///
/// ```
/// use bulwark_core::url::remove_semicolon_content;
///
/// assert_eq!(remove_semicolon_content("/a;jsessionid=1/b;v=2"), "/a/b");
/// ```
#[must_use]
pub fn remove_semicolon_content(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut skipping = false;
    for c in path.chars() {
        match c {
            ';' => skipping = true,
            '/' => {
                skipping = false;
                out.push(c);
            }
            _ if !skipping => out.push(c),
            _ => {}
        }
    }
    out
}

fn collapse_slashes(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut previous_slash = false;
    for c in path.chars() {
        if c == '/' {
            if !previous_slash {
                out.push(c);
            }
            previous_slash = true;
        } else {
            out.push(c);
            previous_slash = false;
        }
    }
    out
}
