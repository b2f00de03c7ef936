//! Logging Step - Observability for conduit invocations.

use conduit_core::{Advance, AfterFn, BeforeFn, ContinuationRecord, StepRecord};
use std::{borrow::Cow, fmt::Debug};

/// Builds steps that log what flows through a conduit.
///
/// Events are emitted with `tracing` at `INFO` level and carry the step name
/// in the `step` field.
///
/// # Example
///
/// ```rust,ignore
/// use conduit_std::steps::LoggingStep;
///
/// let logging = LoggingStep::named("greeting");
///
/// conduit.add_before(logging.before(), StepOptions::new().prepend());
/// conduit.add_after(logging.after(), StepOptions::new());
/// ```
#[derive(Debug, Clone)]
pub struct LoggingStep {
    name: Cow<'static, str>,
}

impl LoggingStep {
    /// Create a new `LoggingStep` with a default name.
    pub fn new() -> Self {
        Self {
            name: Cow::Borrowed("conduit"),
        }
    }

    /// Create a new `LoggingStep` with a custom name.
    ///
    /// The name is used in log events and as the step record's name.
    pub fn named(name: impl Into<Cow<'static, str>>) -> Self {
        Self { name: name.into() }
    }

    /// The step name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// A continuation-passing step that logs the arguments and advances.
    pub fn continuation<C, A>(&self) -> ContinuationRecord<C, A>
    where
        C: Send + Sync + 'static,
        A: Clone + Debug + Send + 'static,
    {
        let name = self.name.clone();
        StepRecord::continuation(move |_: &C, advance: Advance<C, A>, args: A| {
            tracing::info!(step = %name, position = advance.position(), ?args, "conduit step");
            advance.next(args)
        })
        .named(self.name.clone())
    }

    /// A `pre` step that logs the arguments and passes them on unchanged.
    pub fn before<C, A>(&self) -> StepRecord<BeforeFn<C, A>, C>
    where
        C: Send + Sync + 'static,
        A: Debug + 'static,
    {
        let name = self.name.clone();
        StepRecord::before(move |_: &C, args: A| {
            tracing::info!(step = %name, ?args, "conduit call");
            Ok(args)
        })
        .named(self.name.clone())
    }

    /// A `post` step that logs the result and passes it on unchanged.
    pub fn after<C, A, R>(&self) -> StepRecord<AfterFn<C, A, R>, C>
    where
        C: Send + Sync + 'static,
        A: 'static,
        R: Debug + 'static,
    {
        let name = self.name.clone();
        StepRecord::after(move |_: &C, result: R, _: &A| {
            tracing::info!(step = %name, ?result, "conduit result");
            Ok(result)
        })
        .named(self.name.clone())
    }
}

impl Default for LoggingStep {
    fn default() -> Self {
        Self::new()
    }
}
