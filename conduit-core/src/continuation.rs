//! # Continuation-Passing Discipline
//!
//! Each step receives an [`Advance`] handle and the current argument list.
//! The chain only moves on when the step calls [`Advance::next`], which it may
//! do immediately, later from another thread, or never (the invocation then
//! simply stops).
//!
//! Every outer call allocates a fresh cursor, so concurrent or re-entrant
//! invocations of the same [`Conduit`] never share position. The combined
//! sequence itself is shared and read live: a step added while an invocation
//! is parked is seen by that invocation once it resumes.

use crate::{
    error::{BoxError, ConduitError, StepResult},
    pipeline::{Pipeline, PipelineStep, SharedPipeline, Steps},
    step::{Phase, Step, StepOptions, StepRecord},
};
use futures::channel::oneshot;
use std::{
    fmt,
    future::Future,
    pin::Pin,
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicUsize, Ordering},
    },
    task::{Context, Poll},
};

/// Signature of a continuation-passing step.
pub type ContinuationFn<C, A> = dyn Fn(&C, Advance<C, A>, A) -> StepResult + Send + Sync;

/// Signature of a continuation-passing target.
///
/// The target does not advance the chain itself; its step does that after
/// the callable returns.
pub type ContinuationTarget<C, A> = dyn Fn(&C, A) -> StepResult + Send + Sync;

/// A continuation-passing step as accepted by [`Conduit::add_step`].
pub type ContinuationStep<C, A> = Step<ContinuationFn<C, A>, C>;

/// A normalized continuation-passing step.
pub type ContinuationRecord<C, A> = StepRecord<ContinuationFn<C, A>, C>;

/// Snapshot of a [`Conduit`]'s combined sequence.
pub type ContinuationSteps<C, A> =
    Steps<ContinuationFn<C, A>, ContinuationFn<C, A>, ContinuationTarget<C, A>, C>;

type ContinuationPipeline<C, A> =
    Pipeline<ContinuationFn<C, A>, ContinuationFn<C, A>, ContinuationTarget<C, A>, C>;

impl<C, A> StepRecord<ContinuationFn<C, A>, C>
where
    C: Send + Sync + 'static,
    A: Clone + Send + 'static,
{
    /// Create a record from a continuation-passing closure.
    pub fn continuation<F>(func: F) -> Self
    where
        F: Fn(&C, Advance<C, A>, A) -> StepResult + Send + Sync + 'static,
    {
        let func: Arc<ContinuationFn<C, A>> = Arc::new(func);
        Self::from_fn(func)
    }
}

// Per-invocation position and completion signal.
struct Cursor<A> {
    position: AtomicUsize,
    completion: Mutex<Option<oneshot::Sender<A>>>,
}

impl<A> Cursor<A> {
    fn new(completion: Option<oneshot::Sender<A>>) -> Arc<Self> {
        Arc::new(Self {
            position: AtomicUsize::new(0),
            completion: Mutex::new(completion),
        })
    }

    fn complete(&self, args: A) {
        let sender = self
            .completion
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(sender) = sender {
            tracing::trace!("conduit chain completed");
            // The caller may have stopped waiting.
            let _ = sender.send(args);
        }
    }
}

/// The index-based dispatcher handed to every continuation-passing step.
///
/// Cloning is cheap; all clones share the invocation's cursor.
pub struct Advance<C, A> {
    pipeline: Arc<SharedPipeline<ContinuationPipeline<C, A>>>,
    cursor: Arc<Cursor<A>>,
}

impl<C, A> Advance<C, A>
where
    C: Send + Sync + 'static,
    A: Clone + Send + 'static,
{
    /// Run the step at the current position with `args`, moving the cursor
    /// forward by one.
    ///
    /// Past the end of the combined sequence this completes the invocation
    /// and returns `Ok(())`. Errors raised synchronously by the dispatched
    /// step (and anything it advanced into synchronously) are returned
    /// unchanged.
    pub fn next(&self, args: A) -> StepResult {
        let index = self.cursor.position.fetch_add(1, Ordering::SeqCst);
        let (step, default_context) = {
            let pipeline = self.pipeline.read();
            (pipeline.step(index), Arc::clone(pipeline.context()))
        };

        let Some(step) = step else {
            self.cursor.complete(args);
            return Ok(());
        };

        tracing::trace!(
            index,
            name = step.name(),
            is_target = step.is_target(),
            "dispatching conduit step"
        );

        match step {
            PipelineStep::Before(record) | PipelineStep::After(record) => {
                let context = record.bound_context(&default_context);
                (record.func())(context, self.clone(), args)
            }
            PipelineStep::Target(target) => {
                (target.func())(&default_context, args.clone())?;
                self.next(args)
            }
        }
    }

    /// Index of the step the next call to [`Advance::next`] will run.
    pub fn position(&self) -> usize {
        self.cursor.position.load(Ordering::SeqCst)
    }
}

impl<C, A> Clone for Advance<C, A> {
    fn clone(&self) -> Self {
        Self {
            pipeline: Arc::clone(&self.pipeline),
            cursor: Arc::clone(&self.cursor),
        }
    }
}

impl<C, A> fmt::Debug for Advance<C, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Advance")
            .field("position", &self.cursor.position.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

/// Future returned by [`Conduit::call_async`].
///
/// Resolves to the argument list that ran off the end of the chain, to the
/// error the chain raised synchronously, or to [`ConduitError::Halted`] once
/// every [`Advance`] of the invocation is gone without reaching the end.
#[must_use = "futures do nothing unless polled"]
pub struct Completion<A> {
    error: Option<BoxError>,
    receiver: oneshot::Receiver<A>,
}

impl<A> Future for Completion<A> {
    type Output = StepResult<A>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if let Some(error) = self.error.take() {
            return Poll::Ready(Err(error));
        }
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|result| result.map_err(|_| ConduitError::Halted.into()))
    }
}

impl<A> fmt::Debug for Completion<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completion").finish_non_exhaustive()
    }
}

/// A callable wrapped with continuation-passing `pre` and `post` steps.
///
/// `Conduit` is a handle: clones share the same pipeline, so steps added
/// through one clone are seen by all of them.
///
/// # Example
///
/// ```rust
/// use conduit_core::Conduit;
/// use std::sync::{Arc, Mutex};
///
/// let log = Arc::new(Mutex::new(Vec::new()));
/// let target_log = log.clone();
///
/// let conduit = Conduit::<(), String>::builder()
///     .target(move |_, msg: String| {
///         target_log.lock().unwrap().push(msg);
///         Ok(())
///     })
///     .build()
///     .unwrap();
///
/// conduit.before(|_, advance, msg: String| advance.next(format!("Yo dawg...{msg}")));
/// conduit.call("hi".to_string()).unwrap();
///
/// assert_eq!(*log.lock().unwrap(), vec!["Yo dawg...hi".to_string()]);
/// ```
pub struct Conduit<C, A> {
    pipeline: Arc<SharedPipeline<ContinuationPipeline<C, A>>>,
}

impl<C, A> Conduit<C, A>
where
    C: Send + Sync + 'static,
    A: Clone + Send + 'static,
{
    /// Start building a conduit.
    pub fn builder() -> ConduitOptions<C, A> {
        ConduitOptions::new()
    }

    /// Build a conduit from options.
    ///
    /// Fails with [`ConduitError::InvalidTarget`] when no target was given.
    /// Without a context the default binding is `C::default()`.
    pub fn new(options: ConduitOptions<C, A>) -> Result<Self, ConduitError>
    where
        C: Default,
    {
        let context = options.context.clone().unwrap_or_default();
        Self::assemble(options, context)
    }

    /// Build a conduit, requiring the options to carry a context.
    ///
    /// For context types without a `Default`.
    pub fn from_options(options: ConduitOptions<C, A>) -> Result<Self, ConduitError> {
        let context = options.context.clone().ok_or(ConduitError::MissingContext)?;
        Self::assemble(options, context)
    }

    fn assemble(options: ConduitOptions<C, A>, context: Arc<C>) -> Result<Self, ConduitError> {
        let target = options.target.ok_or(ConduitError::InvalidTarget)?;
        let pipeline = Pipeline::new(target, context, options.pre, options.post);
        tracing::debug!(len = pipeline.len(), "built continuation conduit");
        Ok(Self {
            pipeline: SharedPipeline::new(pipeline),
        })
    }

    /// Invoke the wrapped callable through its steps.
    ///
    /// Returns once the chain has run as far as it synchronously can. Steps
    /// that defer their advance finish the invocation later, on whatever
    /// thread calls [`Advance::next`].
    pub fn call(&self, args: A) -> StepResult {
        self.dispatcher(None).next(args)
    }

    /// Invoke and obtain a future for the end of the chain.
    pub fn call_async(&self, args: A) -> Completion<A> {
        let (sender, receiver) = oneshot::channel();
        let error = self.dispatcher(Some(sender)).next(args).err();
        Completion { error, receiver }
    }

    fn dispatcher(&self, completion: Option<oneshot::Sender<A>>) -> Advance<C, A> {
        Advance {
            pipeline: Arc::clone(&self.pipeline),
            cursor: Cursor::new(completion),
        }
    }

    /// Append a bare step to the `pre` phase.
    pub fn before<F>(&self, func: F) -> &Self
    where
        F: Fn(&C, Advance<C, A>, A) -> StepResult + Send + Sync + 'static,
    {
        self.add_before(StepRecord::continuation(func), StepOptions::new())
    }

    /// Append a bare step to the `post` phase.
    pub fn after<F>(&self, func: F) -> &Self
    where
        F: Fn(&C, Advance<C, A>, A) -> StepResult + Send + Sync + 'static,
    {
        self.add_after(StepRecord::continuation(func), StepOptions::new())
    }

    /// Insert a step into the `pre` phase. `opts.phase` is ignored.
    pub fn add_before(&self, step: impl Into<ContinuationStep<C, A>>, opts: StepOptions) -> &Self {
        self.add_step(step, opts.phase(Phase::Pre))
    }

    /// Insert a step into the `post` phase. `opts.phase` is ignored.
    pub fn add_after(&self, step: impl Into<ContinuationStep<C, A>>, opts: StepOptions) -> &Self {
        self.add_step(step, opts.phase(Phase::Post))
    }

    /// Insert a step into the phase named by `opts.phase`.
    pub fn add_step(&self, step: impl Into<ContinuationStep<C, A>>, opts: StepOptions) -> &Self {
        self.pipeline
            .write()
            .insert(opts.phase, step.into().into_record(), opts.prepend);
        self
    }

    /// Remove every `pre` and `post` step.
    pub fn clear(&self) -> &Self {
        self.pipeline.write().clear();
        self
    }

    /// Snapshot of the combined sequence.
    pub fn steps(&self) -> ContinuationSteps<C, A> {
        self.pipeline.read().steps()
    }

    /// Replace the wrapped callable.
    pub fn set_target<F>(&self, func: F) -> &Self
    where
        F: Fn(&C, A) -> StepResult + Send + Sync + 'static,
    {
        self.pipeline.write().set_target(Arc::new(func));
        self
    }

    /// The wrapped callable.
    pub fn target(&self) -> Arc<ContinuationTarget<C, A>> {
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

impl<C, A> Clone for Conduit<C, A> {
    fn clone(&self) -> Self {
        Self {
            pipeline: Arc::clone(&self.pipeline),
        }
    }
}

impl<C, A> fmt::Debug for Conduit<C, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Conduit")
            .field("pipeline", &*self.pipeline.read())
            .finish()
    }
}

/// Construction options for a [`Conduit`].
pub struct ConduitOptions<C, A> {
    target: Option<Arc<ContinuationTarget<C, A>>>,
    context: Option<Arc<C>>,
    pre: Vec<ContinuationRecord<C, A>>,
    post: Vec<ContinuationRecord<C, A>>,
}

impl<C, A> ConduitOptions<C, A>
where
    C: Send + Sync + 'static,
    A: Clone + Send + 'static,
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
        F: Fn(&C, A) -> StepResult + Send + Sync + 'static,
    {
        let func: Arc<ContinuationTarget<C, A>> = Arc::new(func);
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
        I::Item: Into<ContinuationStep<C, A>>,
    {
        self.pre
            .extend(steps.into_iter().map(|step| step.into().into_record()));
        self
    }

    /// Initial `post` steps, appended in order.
    pub fn post<I>(mut self, steps: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<ContinuationStep<C, A>>,
    {
        self.post
            .extend(steps.into_iter().map(|step| step.into().into_record()));
        self
    }

    /// Append one bare `pre` step.
    pub fn before<F>(mut self, func: F) -> Self
    where
        F: Fn(&C, Advance<C, A>, A) -> StepResult + Send + Sync + 'static,
    {
        self.pre.push(StepRecord::continuation(func));
        self
    }

    /// Append one bare `post` step.
    pub fn after<F>(mut self, func: F) -> Self
    where
        F: Fn(&C, Advance<C, A>, A) -> StepResult + Send + Sync + 'static,
    {
        self.post.push(StepRecord::continuation(func));
        self
    }

    /// Shorthand for [`Conduit::new`].
    pub fn build(self) -> Result<Conduit<C, A>, ConduitError>
    where
        C: Default,
    {
        Conduit::new(self)
    }

    /// Shorthand for [`Conduit::from_options`].
    pub fn build_with_context(self) -> Result<Conduit<C, A>, ConduitError> {
        Conduit::from_options(self)
    }
}

impl<C, A> Default for ConduitOptions<C, A>
where
    C: Send + Sync + 'static,
    A: Clone + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
