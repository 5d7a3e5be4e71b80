//! Expression-bearing authorization attributes.

use crate::context::EvaluationContext;
use crate::engine::PredicateEngine;
use bulwark_core::{BulwarkResult, Invocation};
use std::fmt;
use std::sync::Arc;

/// Adds request-derived facts to an evaluation context before a predicate
/// is evaluated.
pub trait ContextEnricher: Send + Sync + fmt::Debug {
    /// Returns the enriched context. Returning `context` unchanged is valid.
    fn enrich(
        &self,
        context: EvaluationContext,
        invocation: &Invocation<'_>,
    ) -> BulwarkResult<EvaluationContext>;
}

/// A closure-backed [`ContextEnricher`].
pub struct FnEnricher<F> {
    name: &'static str,
    f: F,
}

impl<F> FnEnricher<F>
where
    F: Fn(EvaluationContext, &Invocation<'_>) -> BulwarkResult<EvaluationContext> + Send + Sync,
{
    /// Wraps a closure; `name` is used for diagnostics.
    pub fn new(name: &'static str, f: F) -> Self {
        Self { name, f }
    }
}

impl<F> fmt::Debug for FnEnricher<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnEnricher").field("name", &self.name).finish()
    }
}

impl<F> ContextEnricher for FnEnricher<F>
where
    F: Fn(EvaluationContext, &Invocation<'_>) -> BulwarkResult<EvaluationContext> + Send + Sync,
{
    fn enrich(
        &self,
        context: EvaluationContext,
        invocation: &Invocation<'_>,
    ) -> BulwarkResult<EvaluationContext> {
        (self.f)(context, invocation)
    }
}

/// An authorization attribute carrying a predicate expression.
///
/// Unlike plain string attributes it has no tag value; its display form is
/// the expression text.
///
/// ```
/// use bulwark_authz::{EvaluationContext, ExpressionAttribute, RegoPredicateEngine};
/// use bulwark_core::Invocation;
/// use http::Method;
///
/// let attribute = ExpressionAttribute::new(r#"input.request.method == "GET""#);
/// let invocation = Invocation::for_path("/orders", Method::GET);
/// let context = EvaluationContext::for_invocation(&invocation);
///
/// let engine = RegoPredicateEngine::new();
/// assert!(attribute.evaluate(&engine, context, &invocation).unwrap());
/// assert_eq!(attribute.to_string(), r#"input.request.method == "GET""#);
/// ```
#[derive(Debug, Clone)]
pub struct ExpressionAttribute {
    expression: String,
    enricher: Option<Arc<dyn ContextEnricher>>,
}

impl ExpressionAttribute {
    /// Creates an attribute without an enricher.
    pub fn new(expression: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
            enricher: None,
        }
    }

    /// Sets the context enricher.
    #[must_use]
    pub fn with_enricher(mut self, enricher: Arc<dyn ContextEnricher>) -> Self {
        self.enricher = Some(enricher);
        self
    }

    /// Returns the predicate expression.
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Returns the context enricher.
    pub fn enricher(&self) -> Option<&Arc<dyn ContextEnricher>> {
        self.enricher.as_ref()
    }

    /// Always `None`; expression attributes have no plain tag value.
    pub fn attribute(&self) -> Option<&str> {
        None
    }

    /// Applies the enricher, if any, to `context`.
    pub fn post_process(
        &self,
        context: EvaluationContext,
        invocation: &Invocation<'_>,
    ) -> BulwarkResult<EvaluationContext> {
        match &self.enricher {
            Some(enricher) => enricher.enrich(context, invocation),
            None => Ok(context),
        }
    }

    /// Enriches `context`, then evaluates the expression with `engine`.
    ///
    /// Engine failures propagate as evaluation errors.
    pub fn evaluate(
        &self,
        engine: &dyn PredicateEngine,
        context: EvaluationContext,
        invocation: &Invocation<'_>,
    ) -> BulwarkResult<bool> {
        let context = self.post_process(context, invocation)?;
        let outcome = engine.evaluate(&self.expression, &context);
        match &outcome {
            Ok(granted) => tracing::debug!(expression = %self.expression, granted, "predicate evaluated"),
            Err(error) => tracing::debug!(expression = %self.expression, %error, "predicate failed"),
        }
        outcome
    }
}

impl fmt::Display for ExpressionAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.expression)
    }
}
