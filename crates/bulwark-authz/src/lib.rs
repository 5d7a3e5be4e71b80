//! # Bulwark Authz
//!
//! Expression-based authorization attributes.
//!
//! An [`ExpressionAttribute`] carries a predicate expression and an optional
//! [`ContextEnricher`]. At dispatch time the attribute enriches an
//! [`EvaluationContext`] from the current invocation and hands it to a
//! [`PredicateEngine`]. [`RegoPredicateEngine`] evaluates predicates as Rego
//! queries with the `regorus` engine.
//!
//! ## Example
//!
//! ```rust
//! use bulwark_authz::{EvaluationContext, ExpressionAttribute, PathVariablesEnricher, RegoPredicateEngine};
//! use bulwark_core::Invocation;
//! use bulwark_matcher::PathPatternMatcher;
//! use http::Method;
//! use std::sync::Arc;
//!
//! let matcher = Arc::new(PathPatternMatcher::new("/accounts/{id}").unwrap());
//! let attribute = ExpressionAttribute::new(r#"input.variables.id == "42""#)
//!     .with_enricher(Arc::new(PathVariablesEnricher::new(matcher)));
//!
//! let invocation = Invocation::for_path("/accounts/42", Method::GET);
//! let context = EvaluationContext::for_invocation(&invocation);
//! let engine = RegoPredicateEngine::new();
//! assert!(attribute.evaluate(&engine, context, &invocation).unwrap());
//! ```

#![doc(html_root_url = "https://docs.rs/bulwark-authz/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod attribute;
mod context;
mod enricher;
mod engine;
mod rego;

pub use attribute::{ContextEnricher, ExpressionAttribute, FnEnricher};
pub use context::EvaluationContext;
pub use enricher::{PathVariablesEnricher, VARIABLES_KEY};
pub use engine::PredicateEngine;
pub use rego::RegoPredicateEngine;
