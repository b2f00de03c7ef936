//! Standard steps.
//!
//! Every constructor returns a ready [`StepRecord`](conduit_core::StepRecord)
//! that can be handed to `add_before`, `add_after` or `add_step`.

pub mod defer;
pub mod logging;
pub mod tap;

pub use defer::{Job, deferred};
pub use logging::LoggingStep;
pub use tap::{inspect, observe, tap};
