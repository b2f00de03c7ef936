//! # Step Records
//!
//! A step is one unit of behavior placed before or after the target. Callers
//! hand steps to a conduit either as a bare callable or as a full record
//! carrying a name and its own context; both are normalized into a
//! [`StepRecord`] before they are stored.
//!
//! The callable type `F` is the erased signature of the discipline in use
//! (see [`ContinuationFn`], [`BeforeFn`], [`AfterFn`]), `C` is the context
//! type steps run with.
//!
//! [`ContinuationFn`]: crate::ContinuationFn
//! [`BeforeFn`]: crate::BeforeFn
//! [`AfterFn`]: crate::AfterFn

use std::{borrow::Cow, fmt, sync::Arc};

/// A normalized step: the callable plus optional name and context.
///
/// `name` is advisory metadata only and is never used for lookup. When
/// `context` is set, the step runs with it instead of the pipeline default.
pub struct StepRecord<F: ?Sized, C> {
    func: Arc<F>,
    name: Option<Cow<'static, str>>,
    context: Option<Arc<C>>,
}

impl<F: ?Sized, C> StepRecord<F, C> {
    /// Create a record around an already erased callable.
    pub fn from_fn(func: Arc<F>) -> Self {
        Self {
            func,
            name: None,
            context: None,
        }
    }

    /// Attach an advisory name.
    pub fn named(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Bind this step to its own context.
    pub fn with_context(self, context: C) -> Self {
        self.with_shared_context(Arc::new(context))
    }

    /// Bind this step to a context shared with other owners.
    pub fn with_shared_context(mut self, context: Arc<C>) -> Self {
        self.context = Some(context);
        self
    }

    /// The step's callable.
    pub fn func(&self) -> &Arc<F> {
        &self.func
    }

    /// The step's advisory name, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The step's own context, if any.
    pub fn context(&self) -> Option<&Arc<C>> {
        self.context.as_ref()
    }

    /// Resolve the context this step runs with.
    pub fn bound_context<'a>(&'a self, default: &'a Arc<C>) -> &'a Arc<C> {
        self.context.as_ref().unwrap_or(default)
    }
}

impl<F: ?Sized, C> Clone for StepRecord<F, C> {
    fn clone(&self) -> Self {
        Self {
            func: Arc::clone(&self.func),
            name: self.name.clone(),
            context: self.context.clone(),
        }
    }
}

impl<F: ?Sized, C> fmt::Debug for StepRecord<F, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepRecord")
            .field("name", &self.name)
            .field("has_context", &self.context.is_some())
            .finish_non_exhaustive()
    }
}

/// A step as accepted at the mutation boundary.
///
/// Either a bare callable or a full record. [`Step::into_record`] normalizes
/// both shapes into a [`StepRecord`].
pub enum Step<F: ?Sized, C> {
    /// A callable with no name and no context of its own.
    Bare(Arc<F>),
    /// A full record.
    Record(StepRecord<F, C>),
}

impl<F: ?Sized, C> Step<F, C> {
    /// Normalize into a record.
    pub fn into_record(self) -> StepRecord<F, C> {
        match self {
            Step::Bare(func) => StepRecord::from_fn(func),
            Step::Record(record) => record,
        }
    }
}

impl<F: ?Sized, C> From<StepRecord<F, C>> for Step<F, C> {
    fn from(record: StepRecord<F, C>) -> Self {
        Step::Record(record)
    }
}

impl<F: ?Sized, C> From<Arc<F>> for Step<F, C> {
    fn from(func: Arc<F>) -> Self {
        Step::Bare(func)
    }
}

/// The phase a step belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Phase {
    /// Runs before the target.
    #[default]
    Pre,
    /// Runs after the target.
    Post,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Pre => f.write_str("pre"),
            Phase::Post => f.write_str("post"),
        }
    }
}

/// Placement of a newly added step.
///
/// `phase` is only consulted by the phase-routing form (`add_step`); the
/// `add_before`/`add_after` forms pick the phase themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StepOptions {
    /// Target phase list. Defaults to [`Phase::Pre`].
    pub phase: Phase,
    /// Insert at the front of the phase list instead of appending.
    pub prepend: bool,
}

impl StepOptions {
    /// Append to the `pre` phase.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append to the given phase.
    pub fn append_to(phase: Phase) -> Self {
        Self {
            phase,
            prepend: false,
        }
    }

    /// Prepend to the given phase.
    pub fn prepend_to(phase: Phase) -> Self {
        Self {
            phase,
            prepend: true,
        }
    }

    /// Set the phase.
    pub fn phase(mut self, phase: Phase) -> Self {
        self.phase = phase;
        self
    }

    /// Insert at the front of the phase list.
    pub fn prepend(mut self) -> Self {
        self.prepend = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Func = dyn Fn(u32) -> u32 + Send + Sync;

    fn double() -> Arc<Func> {
        Arc::new(|n: u32| n * 2)
    }

    #[test]
    fn test_bare_step_normalizes_to_unnamed_record() {
        let record: StepRecord<Func, String> = Step::from(double()).into_record();
        assert_eq!(record.name(), None);
        assert!(record.context().is_none());
        assert_eq!((record.func())(4), 8);
    }

    #[test]
    fn test_record_keeps_name_and_context() {
        let record = StepRecord::<Func, String>::from_fn(double())
            .named("double")
            .with_context("own".to_string());
        let record = Step::from(record).into_record();
        assert_eq!(record.name(), Some("double"));
        assert_eq!(record.context().map(|c| c.as_str()), Some("own"));
    }

    #[test]
    fn test_bound_context_prefers_own_context() {
        let default = Arc::new("default".to_string());
        let bare = StepRecord::<Func, String>::from_fn(double());
        let bound = bare.clone().with_context("own".to_string());

        assert_eq!(bare.bound_context(&default).as_str(), "default");
        assert_eq!(bound.bound_context(&default).as_str(), "own");
    }

    #[test]
    fn test_step_options_defaults_to_append_pre() {
        let opts = StepOptions::new();
        assert_eq!(opts.phase, Phase::Pre);
        assert!(!opts.prepend);

        let opts = StepOptions::new().phase(Phase::Post).prepend();
        assert_eq!(opts, StepOptions::prepend_to(Phase::Post));
        assert_eq!(StepOptions::append_to(Phase::Post).phase.to_string(), "post");
    }
}
