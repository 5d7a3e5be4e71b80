//! Rego-backed predicate evaluation.
//!
//! Predicate expressions are Rego queries. The evaluation context is the
//! query `input`, so request facts are reachable as `input.request.method`,
//! `input.request.uri` and so on. Registered policies and data are visible
//! under `data`.

use crate::context::EvaluationContext;
use crate::engine::PredicateEngine;
use bulwark_core::{BulwarkError, BulwarkResult};
use regorus::Engine;
use serde_json::Value;
use tracing::{debug, trace};

/// Predicate engine evaluating expressions as Rego queries.
///
/// Policies and data are loaded into one prepared `regorus` engine when they
/// are added. Each evaluation works on a clone of it, so concurrent
/// evaluations never share input.
///
/// ```
/// use bulwark_authz::{EvaluationContext, PredicateEngine, RegoPredicateEngine};
/// use serde_json::json;
///
/// let engine = RegoPredicateEngine::new();
/// let context = EvaluationContext::new().with("user", json!({"roles": ["admin"]}));
///
/// assert!(engine.evaluate(r#"input.user.roles[_] == "admin""#, &context).unwrap());
/// assert!(!engine.evaluate("input.user.disabled", &context).unwrap());
/// ```
#[derive(Debug, Clone)]
pub struct RegoPredicateEngine {
    engine: Engine,
    policy_count: usize,
}

impl Default for RegoPredicateEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl RegoPredicateEngine {
    /// Creates an engine with no policies and strict builtin errors.
    pub fn new() -> Self {
        let mut engine = Engine::new();
        engine.set_strict_builtin_errors(true);
        Self {
            engine,
            policy_count: 0,
        }
    }

    /// Adds a policy and returns the engine.
    pub fn with_policy(mut self, name: &str, source: &str) -> BulwarkResult<Self> {
        self.add_policy(name, source)?;
        Ok(self)
    }

    /// Adds a policy module.
    ///
    /// The module is parsed immediately; a parse failure is a configuration
    /// error and leaves the engine unchanged.
    pub fn add_policy(&mut self, name: &str, source: &str) -> BulwarkResult<()> {
        self.engine
            .add_policy(name.to_string(), source.to_string())
            .map_err(|e| BulwarkError::configuration(format!("Invalid policy '{name}': {e}")))?;

        debug!(policy = name, "added policy");
        self.policy_count += 1;
        Ok(())
    }

    /// Adds a data document, merged under `data`.
    pub fn add_data(&mut self, data: Value) -> BulwarkResult<()> {
        self.engine
            .add_data(data.into())
            .map_err(|e| BulwarkError::configuration(format!("Invalid policy data: {e}")))?;
        Ok(())
    }

    /// Sets whether builtin errors fail evaluation rather than yielding
    /// undefined.
    #[must_use]
    pub fn strict_builtin_errors(mut self, strict: bool) -> Self {
        self.engine.set_strict_builtin_errors(strict);
        self
    }

    /// Returns the number of registered policies.
    pub fn policy_count(&self) -> usize {
        self.policy_count
    }
}

impl PredicateEngine for RegoPredicateEngine {
    fn evaluate(&self, expression: &str, context: &EvaluationContext) -> BulwarkResult<bool> {
        // Input is per evaluation; the prepared policies and data are shared.
        let mut engine = self.engine.clone();
        engine.set_input(context.to_value().into());

        let results = engine
            .eval_query(expression.to_string(), false)
            .map_err(|e| {
                BulwarkError::evaluation_with_source(
                    expression,
                    "query evaluation failed",
                    anyhow::Error::msg(e.to_string()),
                )
            })?;

        let Some(first) = results.result.first() else {
            trace!(expression, "query is undefined");
            return Ok(false);
        };

        let mut outcome = true;
        for expr in &first.expressions {
            match &expr.value {
                regorus::Value::Bool(value) => outcome &= *value,
                regorus::Value::Undefined => outcome = false,
                other => {
                    return Err(BulwarkError::evaluation(
                        expression,
                        format!("expected a boolean result, got {other:?}"),
                    ));
                }
            }
        }

        trace!(expression, outcome, "query evaluated");
        Ok(outcome)
    }
}
