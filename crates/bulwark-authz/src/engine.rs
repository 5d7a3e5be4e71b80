//! The predicate engine seam.

use crate::context::EvaluationContext;
use bulwark_core::BulwarkResult;
use std::fmt;

/// Evaluates boolean predicate expressions.
///
/// Engines are shared across concurrent requests and must be safe for
/// concurrent read-only use. Failures are reported as
/// [`BulwarkError::Evaluation`](bulwark_core::BulwarkError::Evaluation) and
/// must never be turned into a silent allow or deny.
pub trait PredicateEngine: Send + Sync + fmt::Debug {
    /// Evaluates `expression` against `context`.
    fn evaluate(&self, expression: &str, context: &EvaluationContext) -> BulwarkResult<bool>;
}
