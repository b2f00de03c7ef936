//! # Value-Threading Discipline
//!
//! The synchronous executor walks the combined sequence once, left to right:
//!
//! 1. every `pre` step receives the current argument list and returns the
//!    complete new argument list (always a full `A`, never a partial one);
//! 2. the target receives the final arguments and produces the result;
//! 3. every `post` step receives the running result plus the caller's
//!    original arguments and returns the new result.
//!
//! The first error stops the walk and is returned unchanged.

use crate::{
    error::{ConduitError, StepResult},
    pipeline::{Pipeline, PipelineStep, SharedPipeline, Steps},
    step::{Step, StepOptions, StepRecord},
};
use std::{fmt, sync::Arc};

/// Signature of a synchronous `pre` step.
pub type BeforeFn<C, A> = dyn Fn(&C, A) -> StepResult<A> + Send + Sync;

/// Signature of a synchronous `post` step. The last argument is the
/// caller's original argument list.
pub type AfterFn<C, A, R> = dyn Fn(&C, R, &A) -> StepResult<R> + Send + Sync;

/// Signature of a synchronous target.
pub type TargetFn<C, A, R> = dyn Fn(&C, A) -> StepResult<R> + Send + Sync;

/// A `pre` step as accepted by [`SyncConduit::add_before`].
pub type BeforeStep<C, A> = Step<BeforeFn<C, A>, C>;

/// A `post` step as accepted by [`SyncConduit::add_after`].
pub type AfterStep<C, A, R> = Step<AfterFn<C, A, R>, C>;

/// Snapshot of a [`SyncConduit`]'s combined sequence.
pub type SyncSteps<C, A, R> = Steps<BeforeFn<C, A>, AfterFn<C, A, R>, TargetFn<C, A, R>, C>;

type SyncPipeline<C, A, R> = Pipeline<BeforeFn<C, A>, AfterFn<C, A, R>, TargetFn<C, A, R>, C>;

impl<C, A> StepRecord<BeforeFn<C, A>, C>
where
    C: Send + Sync + 'static,
    A: 'static,
{
    /// Create a record from a `pre` closure.
    pub fn before<F>(func: F) -> Self
    where
        F: Fn(&C, A) -> StepResult<A> + Send + Sync + 'static,
    {
        let func: Arc<BeforeFn<C, A>> = Arc::new(func);
        Self::from_fn(func)
    }
}

impl<C, A, R> StepRecord<AfterFn<C, A, R>, C>
where
    C: Send + Sync + 'static,
    A: 'static,
    R: 'static,
{
    /// Create a record from a `post` closure.
    pub fn after<F>(func: F) -> Self
    where
        F: Fn(&C, R, &A) -> StepResult<R> + Send + Sync + 'static,
    {
        let func: Arc<AfterFn<C, A, R>> = Arc::new(func);
        Self::from_fn(func)
    }
}

enum Flow<A, R> {
    Args(A),
    Returned(R),
}

/// A callable wrapped with value-threading `pre` and `post` steps.
///
/// Like [`Conduit`](crate::Conduit), this is a cheap-to-clone handle onto a
/// shared pipeline.
///
/// # Example
///
/// ```rust
/// use conduit_core::SyncConduit;
///
/// struct Greeter {
///     name: String,
/// }
///
/// let greet = SyncConduit::builder()
///     .target(|ctx: &Greeter, msg: String| Ok(format!("Hi, {} - {}", ctx.name, msg)))
///     .context(Greeter { name: "Jimbabwe".into() })
///     .build_with_context()
///     .unwrap();
///
/// greet.before(|_, msg| Ok(format!("Yo dawg...{msg}")));
///
/// assert_eq!(
///     greet.call("here's your msg...".into()).unwrap(),
///     "Hi, Jimbabwe - Yo dawg...here's your msg..."
/// );
/// ```
pub struct SyncConduit<C, A, R> {
    pipeline: Arc<SharedPipeline<SyncPipeline<C, A, R>>>,
}

impl<C, A, R> SyncConduit<C, A, R>
where
    C: Send + Sync + 'static,
    A: Clone + 'static,
    R: 'static,
{
    /// Start building a conduit.
    pub fn builder() -> SyncOptions<C, A, R> {
        SyncOptions::new()
    }

    /// Build a conduit from options.
    ///
    /// Fails with [`ConduitError::InvalidTarget`] when no target was given.
    /// Without a context the default binding is `C::default()`.
    pub fn new(options: SyncOptions<C, A, R>) -> Result<Self, ConduitError>
    where
        C: Default,
    {
        let context = options.context.clone().unwrap_or_default();
        Self::assemble(options, context)
    }

    /// Build a conduit, requiring the options to carry a context.
    ///
    /// For context types without a `Default`.
    pub fn from_options(options: SyncOptions<C, A, R>) -> Result<Self, ConduitError> {
        let context = options.context.clone().ok_or(ConduitError::MissingContext)?;
        Self::assemble(options, context)
    }

    fn assemble(options: SyncOptions<C, A, R>, context: Arc<C>) -> Result<Self, ConduitError> {
        let target = options.target.ok_or(ConduitError::InvalidTarget)?;
        let pipeline = Pipeline::new(target, context, options.pre, options.post);
        tracing::debug!(len = pipeline.len(), "built synchronous conduit");
        Ok(Self {
            pipeline: SharedPipeline::new(pipeline),
        })
    }

    /// Invoke the wrapped callable through its steps.
    pub fn call(&self, args: A) -> StepResult<R> {
        let (steps, default_context) = {
            let pipeline = self.pipeline.read();
            (pipeline.steps(), Arc::clone(pipeline.context()))
        };
        let original = args.clone();
        let mut flow = Flow::Args(args);

        for (index, step) in steps.iter().enumerate() {
            tracing::trace!(
                index,
                name = step.name(),
                is_target = step.is_target(),
                "running conduit step"
            );
            flow = match (step, flow) {
                (PipelineStep::Before(record), Flow::Args(args)) => {
                    let context = record.bound_context(&default_context);
                    Flow::Args((record.func())(context, args)?)
                }
                (PipelineStep::Target(target), Flow::Args(args)) => {
                    Flow::Returned((target.func())(&default_context, args)?)
                }
                (PipelineStep::After(record), Flow::Returned(result)) => {
                    let context = record.bound_context(&default_context);
                    Flow::Returned((record.func())(context, result, &original)?)
                }
                _ => return Err(ConduitError::OutOfOrder { index }.into()),
            };
        }

        match flow {
            Flow::Returned(result) => Ok(result),
            Flow::Args(_) => Err(ConduitError::OutOfOrder { index: steps.len() }.into()),
        }
    }

    /// A plain closure that invokes this conduit.
    pub fn as_fn(&self) -> impl Fn(A) -> StepResult<R> + use<C, A, R> {
        let conduit = self.clone();
        move |args| conduit.call(args)
    }

    /// Append a bare `pre` step.
    pub fn before<F>(&self, func: F) -> &Self
    where
        F: Fn(&C, A) -> StepResult<A> + Send + Sync + 'static,
    {
        self.add_before(StepRecord::before(func), StepOptions::new())
    }

    /// Append a bare `post` step.
    pub fn after<F>(&self, func: F) -> &Self
    where
        F: Fn(&C, R, &A) -> StepResult<R> + Send + Sync + 'static,
    {
        self.add_after(StepRecord::after(func), StepOptions::new())
    }

    /// Insert a `pre` step. `opts.phase` is ignored.
    pub fn add_before(&self, step: impl Into<BeforeStep<C, A>>, opts: StepOptions) -> &Self {
        self.pipeline
            .write()
            .insert_pre(step.into().into_record(), opts.prepend);
        self
    }

    /// Insert a `post` step. `opts.phase` is ignored.
    pub fn add_after(&self, step: impl Into<AfterStep<C, A, R>>, opts: StepOptions) -> &Self {
        self.pipeline
            .write()
            .insert_post(step.into().into_record(), opts.prepend);
        self
    }

    /// Remove every `pre` and `post` step.
    pub fn clear(&self) -> &Self {
        self.pipeline.write().clear();
        self
    }

    /// Snapshot of the combined sequence.
    pub fn steps(&self) -> SyncSteps<C, A, R> {
        self.pipeline.read().steps()
    }

    /// Replace the wrapped callable.
    pub fn set_target<F>(&self, func: F) -> &Self
    where
        F: Fn(&C, A) -> StepResult<R> + Send + Sync + 'static,
    {
        self.pipeline.write().set_target(Arc::new(func));
        self
    }

    /// The wrapped callable.
    pub fn target(&self) -> Arc<TargetFn<C, A, R>> {
        Arc::clone(self.pipeline.read().target())
    }

    /// Replace the default context.
    pub fn set_context(&self, context: C) -> &Self {
        self.set_shared_context(Arc::new(context))
    }

    /// Replace the default context with a shared one.
    pub fn set_shared_context(&self, context: Arc<C>) -> &Self {
        self.pipeline.write().set_context(context);
        self
    }

    /// The default context.
    pub fn context(&self) -> Arc<C> {
        Arc::clone(self.pipeline.read().context())
    }
}

impl<C, A, R> Clone for SyncConduit<C, A, R> {
    fn clone(&self) -> Self {
        Self {
            pipeline: Arc::clone(&self.pipeline),
        }
    }
}

impl<C, A, R> fmt::Debug for SyncConduit<C, A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncConduit")
            .field("pipeline", &*self.pipeline.read())
            .finish()
    }
}

/// Construction options for a [`SyncConduit`].
pub struct SyncOptions<C, A, R> {
    target: Option<Arc<TargetFn<C, A, R>>>,
    context: Option<Arc<C>>,
    pre: Vec<StepRecord<BeforeFn<C, A>, C>>,
    post: Vec<StepRecord<AfterFn<C, A, R>, C>>,
}

impl<C, A, R> SyncOptions<C, A, R>
where
    C: Send + Sync + 'static,
    A: Clone + 'static,
    R: 'static,
{
    /// Empty options. A target must be set before building.
    pub fn new() -> Self {
        Self {
            target: None,
            context: None,
            pre: Vec::new(),
            post: Vec::new(),
        }
    }

    /// The callable to wrap.
    pub fn target<F>(mut self, func: F) -> Self
    where
        F: Fn(&C, A) -> StepResult<R> + Send + Sync + 'static,
    {
        let func: Arc<TargetFn<C, A, R>> = Arc::new(func);
        self.target = Some(func);
        self
    }

    /// Default context for the target and for steps without their own.
    pub fn context(self, context: C) -> Self {
        self.shared_context(Arc::new(context))
    }

    /// Default context shared with other owners.
    pub fn shared_context(mut self, context: Arc<C>) -> Self {
        self.context = Some(context);
        self
    }

    /// Initial `pre` steps, appended in order.
    pub fn pre<I>(mut self, steps: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<BeforeStep<C, A>>,
    {
        self.pre
            .extend(steps.into_iter().map(|step| step.into().into_record()));
        self
    }

    /// Initial `post` steps, appended in order.
    pub fn post<I>(mut self, steps: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<AfterStep<C, A, R>>,
    {
        self.post
            .extend(steps.into_iter().map(|step| step.into().into_record()));
        self
    }

    /// Append one bare `pre` step.
    pub fn before<F>(mut self, func: F) -> Self
    where
        F: Fn(&C, A) -> StepResult<A> + Send + Sync + 'static,
    {
        self.pre.push(StepRecord::before(func));
        self
    }

    /// Append one bare `post` step.
    pub fn after<F>(mut self, func: F) -> Self
    where
        F: Fn(&C, R, &A) -> StepResult<R> + Send + Sync + 'static,
    {
        self.post.push(StepRecord::after(func));
        self
    }

    /// Shorthand for [`SyncConduit::new`].
    pub fn build(self) -> Result<SyncConduit<C, A, R>, ConduitError>
    where
        C: Default,
    {
        SyncConduit::new(self)
    }

    /// Shorthand for [`SyncConduit::from_options`].
    pub fn build_with_context(self) -> Result<SyncConduit<C, A, R>, ConduitError> {
        SyncConduit::from_options(self)
    }
}

impl<C, A, R> Default for SyncOptions<C, A, R>
where
    C: Send + Sync + 'static,
    A: Clone + 'static,
    R: 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
