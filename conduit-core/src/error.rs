//! Error types for Conduit.
//!
//! - [`ConduitError`] - Failures raised by the framework itself
//! - [`BoxError`] - The dynamic error type every step and target returns
//!
//! Step and target errors are never caught or wrapped: executors propagate
//! them unchanged with `?`.

use thiserror::Error;

/// A boxed error type for dynamic error handling.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The result type returned by steps, targets and executors.
pub type StepResult<T = ()> = Result<T, BoxError>;

/// Errors raised by Conduit itself.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConduitError {
    /// The conduit was constructed without a target callable.
    #[error("a conduit can only be made from a target callable; none was supplied")]
    InvalidTarget,

    /// The conduit was built with `build_with_context` but no context was
    /// supplied.
    #[error("no default context was supplied")]
    MissingContext,

    /// Every advance handle of an invocation was dropped before the chain
    /// reached its end.
    #[error("the step chain halted before reaching its end")]
    Halted,

    /// The combined sequence did not have the `pre ++ [target] ++ post` shape.
    #[error("step at index {index} is out of order in the combined sequence")]
    OutOfOrder {
        /// Position of the offending step.
        index: usize,
    },
}
