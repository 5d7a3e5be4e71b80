//! The per-request invocation context.
//!
//! An [`Invocation`] bundles the request, the response and the rest of the
//! pipeline ([`Chain`]) for one stage. It exists in two modes:
//!
//! - **live**: built by the pipeline around a real request and response
//! - **synthetic**: built from path components alone, with no response and
//!   no chain, so that matchers and access rules can be exercised without
//!   traffic
//!
//! Matchers only read the [`RequestParts`] surface, which behaves the same
//! in both modes. Operations that need live state fail on a synthetic
//! invocation with [`BulwarkError::UnsupportedOperation`].

use crate::error::{BulwarkError, BulwarkResult};
use crate::request::{LiveRequest, RequestParts, SyntheticRequest};
use crate::stage::{BoxFuture, Stage};
use crate::types::Response;
use crate::url::{build_full_request_url, build_request_url};
use http::Method;
use std::fmt;
use std::sync::Arc;

/// The handler invoked once every stage has proceeded.
pub type Terminal = dyn Fn(&mut LiveRequest, &mut Response) -> BulwarkResult<()> + Send + Sync;

/// The remainder of a pipeline: the stages not yet run plus the terminal.
#[derive(Clone, Copy)]
pub struct Chain<'a> {
    stages: &'a [Arc<dyn Stage>],
    terminal: &'a Terminal,
}

impl<'a> Chain<'a> {
    /// Creates a chain over `stages` ending in `terminal`.
    #[must_use]
    pub fn new(stages: &'a [Arc<dyn Stage>], terminal: &'a Terminal) -> Self {
        Self { stages, terminal }
    }

    /// Returns the number of stages left to run.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.stages.len()
    }

    /// Returns the name of the next stage, `None` when only the terminal is left.
    #[must_use]
    pub fn next_stage(&self) -> Option<&'static str> {
        self.stages.first().map(|stage| stage.name())
    }

    /// Runs the next stage, or the terminal at the end of the chain.
    pub fn do_next(
        self,
        request: &'a mut LiveRequest,
        response: &'a mut Response,
    ) -> BoxFuture<'a, BulwarkResult<()>> {
        match self.stages.split_first() {
            Some((stage, rest)) => {
                let next = Chain::new(rest, self.terminal);
                tracing::trace!(stage = stage.name(), remaining = rest.len(), "entering stage");
                stage.process(Invocation::new(request, response, next))
            }
            None => {
                let terminal = self.terminal;
                Box::pin(async move { terminal(request, response) })
            }
        }
    }
}

impl fmt::Debug for Chain<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&'static str> = self.stages.iter().map(|stage| stage.name()).collect();
        f.debug_struct("Chain").field("stages", &names).finish_non_exhaustive()
    }
}

#[derive(Debug)]
enum InvocationRequest<'a> {
    Live(&'a mut LiveRequest),
    Synthetic(SyntheticRequest),
}

/// A request, its response and the rest of the pipeline.
///
/// # Example
///
/// ```
/// use bulwark_core::{Invocation, RequestParts};
/// use http::Method;
///
/// let invocation = Invocation::synthetic(
///     Some("/app"),
///     "/orders",
///     Some("/42"),
///     Some("x=1"),
///     Method::GET,
/// );
///
/// assert_eq!(invocation.request().request_uri(), "/app/orders/42");
/// assert_eq!(invocation.request_url(), "/orders/42?x=1");
/// assert!(invocation.chain().is_err());
/// ```
#[derive(Debug)]
pub struct Invocation<'a> {
    request: InvocationRequest<'a>,
    response: Option<&'a mut Response>,
    chain: Option<Chain<'a>>,
}

impl<'a> Invocation<'a> {
    /// Creates a live invocation.
    #[must_use]
    pub fn new(request: &'a mut LiveRequest, response: &'a mut Response, chain: Chain<'a>) -> Self {
        Self {
            request: InvocationRequest::Live(request),
            response: Some(response),
            chain: Some(chain),
        }
    }

    /// Creates a live invocation from parts that may be missing.
    ///
    /// # Errors
    ///
    /// Returns [`BulwarkError::InvalidArgument`] unless the request, the
    /// response and the chain are all present.
    pub fn from_parts(
        request: Option<&'a mut LiveRequest>,
        response: Option<&'a mut Response>,
        chain: Option<Chain<'a>>,
    ) -> BulwarkResult<Self> {
        match (request, response, chain) {
            (Some(request), Some(response), Some(chain)) => Ok(Self::new(request, response, chain)),
            _ => Err(BulwarkError::invalid_argument(
                "a live invocation needs a request, a response and a chain",
            )),
        }
    }

    /// Returns true for a synthetic invocation.
    #[must_use]
    pub fn is_synthetic(&self) -> bool {
        matches!(self.request, InvocationRequest::Synthetic(_))
    }

    /// Returns the request as seen by matchers.
    #[must_use]
    pub fn request(&self) -> &dyn RequestParts {
        match &self.request {
            InvocationRequest::Live(request) => &**request,
            InvocationRequest::Synthetic(request) => request,
        }
    }

    /// Returns the HTTP method of the request.
    #[must_use]
    pub fn method(&self) -> &Method {
        self.request().method()
    }

    /// Returns the live request.
    ///
    /// # Errors
    ///
    /// Fails with [`BulwarkError::UnsupportedOperation`] on a synthetic invocation.
    pub fn live_request(&self) -> BulwarkResult<&LiveRequest> {
        match &self.request {
            InvocationRequest::Live(request) => Ok(&**request),
            InvocationRequest::Synthetic(_) => Err(BulwarkError::unsupported("live_request")),
        }
    }

    /// Returns the live request mutably.
    ///
    /// # Errors
    ///
    /// Fails with [`BulwarkError::UnsupportedOperation`] on a synthetic invocation.
    pub fn live_request_mut(&mut self) -> BulwarkResult<&mut LiveRequest> {
        match &mut self.request {
            InvocationRequest::Live(request) => Ok(&mut **request),
            InvocationRequest::Synthetic(_) => Err(BulwarkError::unsupported("live_request_mut")),
        }
    }

    /// Returns a request header.
    ///
    /// # Errors
    ///
    /// Fails with [`BulwarkError::UnsupportedOperation`] on a synthetic
    /// invocation, which has no headers.
    pub fn header(&self, name: &str) -> BulwarkResult<Option<&str>> {
        match &self.request {
            InvocationRequest::Live(request) => Ok(request.header(name)),
            InvocationRequest::Synthetic(_) => Err(BulwarkError::unsupported("header")),
        }
    }

    /// Returns the response, `None` on a synthetic invocation.
    #[must_use]
    pub fn response(&self) -> Option<&Response> {
        self.response.as_deref()
    }

    /// Returns the response mutably, `None` on a synthetic invocation.
    pub fn response_mut(&mut self) -> Option<&mut Response> {
        self.response.as_deref_mut()
    }

    /// Returns the rest of the pipeline.
    ///
    /// # Errors
    ///
    /// Fails with [`BulwarkError::UnsupportedOperation`] on a synthetic invocation.
    pub fn chain(&self) -> BulwarkResult<Chain<'a>> {
        self.chain.ok_or_else(|| BulwarkError::unsupported("chain"))
    }

    /// Hands the request to the rest of the pipeline.
    ///
    /// On a synthetic invocation the returned future resolves to
    /// [`BulwarkError::UnsupportedOperation`].
    pub fn proceed(self) -> BoxFuture<'a, BulwarkResult<()>> {
        match (self.request, self.response, self.chain) {
            (InvocationRequest::Live(request), Some(response), Some(chain)) => {
                chain.do_next(request, response)
            }
            _ => Box::pin(std::future::ready(Err(BulwarkError::unsupported("proceed")))),
        }
    }

    /// Returns the URL relative to the application.
    ///
    /// `servlet_path + path_info`, followed by `?query` when present.
    #[must_use]
    pub fn request_url(&self) -> String {
        let request = self.request();
        build_request_url(
            request.servlet_path(),
            request.path_info(),
            request.query_string(),
        )
    }

    /// Returns the absolute URL of the request.
    ///
    /// # Errors
    ///
    /// Fails with [`BulwarkError::UnsupportedOperation`] on a synthetic
    /// invocation, which has no scheme, host or port.
    pub fn full_request_url(&self) -> BulwarkResult<String> {
        match &self.request {
            InvocationRequest::Live(request) => Ok(build_full_request_url(
                request.scheme(),
                request.server_name(),
                request.server_port(),
                request.context_path(),
                &self.request_url(),
            )),
            InvocationRequest::Synthetic(_) => Err(BulwarkError::unsupported("scheme")),
        }
    }
}

impl Invocation<'static> {
    /// Creates a synthetic invocation from path components.
    ///
    /// `context_path` defaults to `/cp`. The request URI is
    /// `context_path + servlet_path + path_info`.
    #[must_use]
    pub fn synthetic(
        context_path: Option<&str>,
        servlet_path: &str,
        path_info: Option<&str>,
        query_string: Option<&str>,
        method: Method,
    ) -> Self {
        Self {
            request: InvocationRequest::Synthetic(SyntheticRequest::new(
                context_path,
                servlet_path,
                path_info,
                query_string,
                method,
            )),
            response: None,
            chain: None,
        }
    }

    /// Creates a synthetic invocation for a servlet path under the default context.
    #[must_use]
    pub fn for_path(servlet_path: &str, method: Method) -> Self {
        Self::synthetic(None, servlet_path, None, None, method)
    }

    /// Creates a synthetic invocation for a servlet path under `context_path`.
    #[must_use]
    pub fn for_context_path(context_path: &str, servlet_path: &str, method: Method) -> Self {
        Self::synthetic(Some(context_path), servlet_path, None, None, method)
    }
}

impl fmt::Display for Invocation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invocation: URL: {}", self.request_url())
    }
}
