//! Built-in context enrichers.

use crate::attribute::ContextEnricher;
use crate::context::EvaluationContext;
use bulwark_core::{BulwarkResult, Invocation};
use bulwark_matcher::RequestMatcher;
use std::sync::Arc;

/// Context key holding extracted path variables.
pub const VARIABLES_KEY: &str = "variables";

/// Copies the variables a matcher extracts from the request into the
/// context under `variables`.
///
/// Existing entries under `variables` are kept unless a new variable of the
/// same name replaces them.
#[derive(Debug, Clone)]
pub struct PathVariablesEnricher {
    matcher: Arc<dyn RequestMatcher>,
}

impl PathVariablesEnricher {
    /// Creates an enricher reading variables from `matcher`.
    pub fn new(matcher: Arc<dyn RequestMatcher>) -> Self {
        Self { matcher }
    }
}

impl ContextEnricher for PathVariablesEnricher {
    fn enrich(
        &self,
        mut context: EvaluationContext,
        invocation: &Invocation<'_>,
    ) -> BulwarkResult<EvaluationContext> {
        let extracted = self.matcher.extract_variables(invocation.request());
        context.bind_variables(&extracted);
        Ok(context)
    }
}
