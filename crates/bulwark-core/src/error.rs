//! Error types for Bulwark.
//!
//! This module provides the [`BulwarkError`] type shared by every crate in
//! the workspace. The variants mirror the four failure classes of the
//! filter chain:
//!
//! | Variant | Raised when | Recovery |
//! |---|---|---|
//! | `Configuration` | the pipeline is assembled inconsistently | none, fatal at build time |
//! | `InvalidArgument` | a constructor receives malformed input | none, caller bug |
//! | `UnsupportedOperation` | a synthetic invocation is asked for live-only state | none, caller bug |
//! | `Evaluation` | an access predicate cannot be evaluated | surfaced to the caller |

use thiserror::Error;

/// Result type alias using [`BulwarkError`].
pub type BulwarkResult<T> = Result<T, BulwarkError>;

/// Standard error type for Bulwark.
///
/// # Example
///
/// ```
/// use bulwark_core::BulwarkError;
///
/// fn require_anchor(found: bool) -> Result<(), BulwarkError> {
///     if !found {
///         return Err(BulwarkError::configuration("anchor stage not registered"));
///     }
///     Ok(())
/// }
///
/// assert!(require_anchor(false).is_err());
/// ```
#[derive(Error, Debug)]
pub enum BulwarkError {
    /// The pipeline was assembled inconsistently.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Human-readable error message.
        message: String,
    },

    /// A constructor was given malformed or missing input.
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Human-readable error message.
        message: String,
    },

    /// An operation is not available on this value.
    #[error("{operation} is not supported")]
    UnsupportedOperation {
        /// Name of the attempted operation.
        operation: String,
    },

    /// A predicate expression could not be evaluated.
    #[error("Failed to evaluate expression '{expression}': {message}")]
    Evaluation {
        /// The expression text.
        expression: String,
        /// Human-readable error message.
        message: String,
        /// The underlying engine failure, if any.
        #[source]
        source: Option<anyhow::Error>,
    },
}

impl BulwarkError {
    /// Creates a configuration error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates an invalid argument error.
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates an unsupported operation error naming the attempted operation.
    #[must_use]
    pub fn unsupported(operation: impl Into<String>) -> Self {
        Self::UnsupportedOperation {
            operation: operation.into(),
        }
    }

    /// Creates an evaluation error.
    #[must_use]
    pub fn evaluation(expression: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Evaluation {
            expression: expression.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Creates an evaluation error wrapping an engine failure.
    pub fn evaluation_with_source(
        expression: impl Into<String>,
        message: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Self::Evaluation {
            expression: expression.into(),
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Returns true for configuration errors.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }

    /// Returns true for invalid argument errors.
    #[must_use]
    pub const fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument { .. })
    }

    /// Returns true for unsupported operation errors.
    #[must_use]
    pub const fn is_unsupported(&self) -> bool {
        matches!(self, Self::UnsupportedOperation { .. })
    }

    /// Returns true for evaluation errors.
    #[must_use]
    pub const fn is_evaluation(&self) -> bool {
        matches!(self, Self::Evaluation { .. })
    }
}
