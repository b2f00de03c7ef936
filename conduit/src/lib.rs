//! # conduit - Give Any Callable a Pipeline
//!
//! `conduit` wraps an existing callable with an ordered chain of steps that
//! run immediately before and after it, without modifying the callable.
//! Steps can be added, prepended and cleared, and the target or default
//! context swapped, on a live conduit.
//!
//! Two disciplines are available:
//!
//! - [`SyncConduit`] threads values: `pre` steps rewrite the arguments, the
//!   target returns a result, `post` steps rewrite the result.
//! - [`Conduit`] passes continuations: every step receives an [`Advance`]
//!   and calls [`Advance::next`] when (and if) the chain should go on.
//!
//! ## Quick Start
//!
//! ```rust
//! use conduit::prelude::*;
//!
//! struct Greeter {
//!     name: String,
//! }
//!
//! let do_stuff = SyncConduit::builder()
//!     .target(|ctx: &Greeter, msg: String| Ok(format!("Hi, {} - {}", ctx.name, msg)))
//!     .context(Greeter { name: "Jimbabwe".into() })
//!     .build_with_context()
//!     .unwrap();
//!
//! do_stuff
//!     .before(|_, msg| Ok(format!("CONDUIT SEZ BEFORE: {msg}")))
//!     .after(|_, result, _| Ok(format!("{result} CONDUIT SEZ AFTER")));
//!
//! assert_eq!(
//!     do_stuff.call("here's your msg...".into()).unwrap(),
//!     "Hi, Jimbabwe - CONDUIT SEZ BEFORE: here's your msg... CONDUIT SEZ AFTER"
//! );
//! ```

#![warn(missing_docs)]

pub use conduit_core::{
    // Continuation passing
    Advance,
    // Step signatures
    AfterFn,
    AfterStep,
    BeforeFn,
    BeforeStep,
    // Error types
    BoxError,
    Completion,
    Conduit,
    ConduitError,
    ConduitOptions,
    ContinuationFn,
    ContinuationRecord,
    ContinuationStep,
    ContinuationSteps,
    ContinuationTarget,
    // Step records
    Phase,
    // Pipeline
    Pipeline,
    PipelineStep,
    Step,
    StepOptions,
    StepRecord,
    StepResult,
    Steps,
    // Value threading
    SyncConduit,
    SyncOptions,
    SyncSteps,
    TargetFn,
    TargetStep,
};

/// Standard steps.
#[cfg(feature = "std")]
pub mod steps {
    pub use conduit_std::steps::{Job, LoggingStep, deferred, inspect, observe, tap};
}

/// Testing utilities.
#[cfg(feature = "std")]
pub mod testing {
    pub use conduit_std::testing::{CallLog, Parking};
}

/// Prelude module - common imports for Conduit.
///
/// # Usage
///
/// ```rust,ignore
/// use conduit::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        Advance, BoxError, Conduit, ConduitError, Phase, Step, StepOptions, StepRecord,
        StepResult, SyncConduit,
    };
}
