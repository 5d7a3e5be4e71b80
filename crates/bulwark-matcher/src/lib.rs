//! # Bulwark Matcher
//!
//! Request matchers decide which requests a security rule applies to.
//!
//! - [`PathPatternMatcher`] - Ant-style patterns (`*`, `**`, `?`, `{var}`)
//!   over the normalized lookup path
//! - [`RoutedRequestMatcher`] - defers to a [`HandlerIntrospector`] so the
//!   match agrees with how the request is routed, falling back to a
//!   [`PathPatternMatcher`] when introspection is unavailable
//! - [`RouteTableIntrospector`] - introspection backed by a
//!   [`bulwark_router::Router`]
//!
//! ## Example
//!
//! ```rust
//! use bulwark_core::SyntheticRequest;
//! use bulwark_matcher::{RequestMatcher, RouteTableIntrospector, RoutedRequestMatcher};
//! use bulwark_router::{MethodRouter, Router};
//! use http::Method;
//! use std::sync::Arc;
//!
//! let mut router = Router::new();
//! router.insert("/orders/{id}", MethodRouter::new().get("getOrder")).unwrap();
//!
//! let matcher = RoutedRequestMatcher::builder("/orders/{id}")
//!     .introspector(Arc::new(RouteTableIntrospector::new(Arc::new(router))))
//!     .build()
//!     .unwrap();
//!
//! let request = SyntheticRequest::new(None, "/orders/7", None, None, Method::GET);
//! assert!(matcher.matches(&request));
//! assert_eq!(matcher.extract_variables(&request).get("id"), Some("7"));
//! ```

#![doc(html_root_url = "https://docs.rs/bulwark-matcher/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod ant;
mod introspect;
mod matcher;
mod routed;

pub use ant::AntPattern;
pub use bulwark_router::Params;
pub use introspect::{
    HandlerIntrospector, MatchableMapping, RequestMatchResult, RouteTableIntrospector,
    RouteTableMapping,
};
pub use matcher::{AnyRequestMatcher, PathPatternMatcher, RequestMatcher};
pub use routed::{RoutedRequestMatcher, RoutedRequestMatcherBuilder};
