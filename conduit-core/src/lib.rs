//! # conduit-core
//!
//! Core pipeline and executors for Conduit: give any callable an ordered
//! chain of steps that run immediately before and after it, without touching
//! the callable itself.
//!
//! This crate has minimal dependencies and is designed to be imported by
//! step libraries that don't need the full `conduit-std` implementation.
//!
//! # Building Blocks
//!
//! ## Step Records ([`StepRecord`], [`Step`])
//!
//! A step is a callable plus optional advisory name and optional context.
//! Steps are accepted either bare or as a full record and normalized at the
//! mutation boundary.
//!
//! ## Pipeline ([`Pipeline`])
//!
//! Two ordered phase lists (`pre` and `post`) around one target step. The
//! combined sequence `pre ++ [target] ++ post` is regenerated on every
//! mutation and handed out as a read-only snapshot ([`Steps`]).
//!
//! ## Executors
//!
//! - [`Conduit`] - continuation passing: each step receives an [`Advance`]
//!   dispatcher and must call [`Advance::next`] for the chain to go on,
//!   immediately or later.
//! - [`SyncConduit`] - value threading: `pre` steps rewrite the arguments,
//!   the target produces a result, `post` steps rewrite the result.
//!
//! # Contexts
//!
//! Every conduit carries a default context `C` handed to the target and to
//! every step without its own. Steps with their own context always run with
//! it. The default can be replaced at any time without rebuilding steps.
//!
//! # Error Types
//!
//! - [`ConduitError`] - Failures raised by the framework itself
//! - [`BoxError`] / [`StepResult`] - What steps and targets return

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod continuation;
mod error;
mod pipeline;
mod step;
mod sync;

// Re-exports
pub use continuation::{
    Advance, Completion, Conduit, ConduitOptions, ContinuationFn, ContinuationRecord,
    ContinuationStep, ContinuationSteps, ContinuationTarget,
};
pub use error::{BoxError, ConduitError, StepResult};
pub use pipeline::{Pipeline, PipelineStep, Steps, TargetStep};
pub use step::{Phase, Step, StepOptions, StepRecord};
pub use sync::{
    AfterFn, AfterStep, BeforeFn, BeforeStep, SyncConduit, SyncOptions, SyncSteps, TargetFn,
};
