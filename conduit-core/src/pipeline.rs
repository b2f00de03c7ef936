//! # Pipeline Assembly
//!
//! A [`Pipeline`] owns the two phase lists, the target step and the default
//! context, and keeps the derived combined sequence
//! `pre ++ [target] ++ post` in sync with them. Every mutation regenerates
//! the combined sequence before returning, so a stale view is never
//! observable.
//!
//! The combined sequence is handed out as an immutable shared slice
//! ([`Steps`]). Executors take a snapshot (or read one step at a time) and
//! release the lock before running any step.

use crate::step::{Phase, StepRecord};
use std::{
    fmt,
    sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

/// The distinguished step wrapping the user's original callable.
pub struct TargetStep<T: ?Sized> {
    func: Arc<T>,
}

impl<T: ?Sized> TargetStep<T> {
    /// Wrap a target callable.
    pub fn new(func: Arc<T>) -> Self {
        Self { func }
    }

    /// The wrapped callable.
    pub fn func(&self) -> &Arc<T> {
        &self.func
    }
}

impl<T: ?Sized> Clone for TargetStep<T> {
    fn clone(&self) -> Self {
        Self {
            func: Arc::clone(&self.func),
        }
    }
}

impl<T: ?Sized> fmt::Debug for TargetStep<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetStep").finish_non_exhaustive()
    }
}

/// One entry of the combined sequence.
pub enum PipelineStep<Pre: ?Sized, Post: ?Sized, T: ?Sized, C> {
    /// A step from the `pre` list.
    Before(StepRecord<Pre, C>),
    /// The target step. Exactly one per sequence.
    Target(TargetStep<T>),
    /// A step from the `post` list.
    After(StepRecord<Post, C>),
}

impl<Pre: ?Sized, Post: ?Sized, T: ?Sized, C> PipelineStep<Pre, Post, T, C> {
    /// Whether this entry is the target step.
    pub fn is_target(&self) -> bool {
        matches!(self, PipelineStep::Target(_))
    }

    /// The phase this entry came from; `None` for the target.
    pub fn phase(&self) -> Option<Phase> {
        match self {
            PipelineStep::Before(_) => Some(Phase::Pre),
            PipelineStep::Target(_) => None,
            PipelineStep::After(_) => Some(Phase::Post),
        }
    }

    /// Advisory name of the entry.
    pub fn name(&self) -> Option<&str> {
        match self {
            PipelineStep::Before(record) => record.name(),
            PipelineStep::Target(_) => None,
            PipelineStep::After(record) => record.name(),
        }
    }

    /// The entry's own context. The target never carries one.
    pub fn context(&self) -> Option<&Arc<C>> {
        match self {
            PipelineStep::Before(record) => record.context(),
            PipelineStep::Target(_) => None,
            PipelineStep::After(record) => record.context(),
        }
    }
}

impl<Pre: ?Sized, Post: ?Sized, T: ?Sized, C> Clone for PipelineStep<Pre, Post, T, C> {
    fn clone(&self) -> Self {
        match self {
            PipelineStep::Before(record) => PipelineStep::Before(record.clone()),
            PipelineStep::Target(target) => PipelineStep::Target(target.clone()),
            PipelineStep::After(record) => PipelineStep::After(record.clone()),
        }
    }
}

impl<Pre: ?Sized, Post: ?Sized, T: ?Sized, C> fmt::Debug for PipelineStep<Pre, Post, T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineStep::Before(record) => f.debug_tuple("Before").field(record).finish(),
            PipelineStep::Target(target) => f.debug_tuple("Target").field(target).finish(),
            PipelineStep::After(record) => f.debug_tuple("After").field(record).finish(),
        }
    }
}

/// A read-only snapshot of the combined sequence.
pub type Steps<Pre, Post, T, C> = Arc<[PipelineStep<Pre, Post, T, C>]>;

/// Phase lists, target and default context, plus the derived combined
/// sequence.
pub struct Pipeline<Pre: ?Sized, Post: ?Sized, T: ?Sized, C> {
    pre: Vec<StepRecord<Pre, C>>,
    post: Vec<StepRecord<Post, C>>,
    target: TargetStep<T>,
    context: Arc<C>,
    combined: Steps<Pre, Post, T, C>,
}

impl<Pre: ?Sized, Post: ?Sized, T: ?Sized, C> Pipeline<Pre, Post, T, C> {
    /// Build a pipeline and derive its initial combined sequence.
    pub fn new(
        target: Arc<T>,
        context: Arc<C>,
        pre: Vec<StepRecord<Pre, C>>,
        post: Vec<StepRecord<Post, C>>,
    ) -> Self {
        let target = TargetStep::new(target);
        let combined = assemble(&pre, &target, &post);
        Self {
            pre,
            post,
            target,
            context,
            combined,
        }
    }

    /// Insert a step into the `pre` list.
    pub fn insert_pre(&mut self, record: StepRecord<Pre, C>, prepend: bool) {
        log_insert(Phase::Pre, prepend, record.name());
        insert(&mut self.pre, record, prepend);
        self.regenerate();
    }

    /// Insert a step into the `post` list.
    pub fn insert_post(&mut self, record: StepRecord<Post, C>, prepend: bool) {
        log_insert(Phase::Post, prepend, record.name());
        insert(&mut self.post, record, prepend);
        self.regenerate();
    }

    /// Empty both phase lists. The target is untouched.
    pub fn clear(&mut self) {
        tracing::debug!(
            pre = self.pre.len(),
            post = self.post.len(),
            "clearing conduit steps"
        );
        self.pre.clear();
        self.post.clear();
        self.regenerate();
    }

    /// Replace the callable inside the target step.
    pub fn set_target(&mut self, target: Arc<T>) {
        tracing::debug!("replacing conduit target");
        self.target = TargetStep::new(target);
        self.regenerate();
    }

    /// Replace the default context.
    pub fn set_context(&mut self, context: Arc<C>) {
        tracing::debug!("replacing conduit default context");
        self.context = context;
    }

    /// The current combined sequence.
    pub fn steps(&self) -> Steps<Pre, Post, T, C> {
        Arc::clone(&self.combined)
    }

    /// A single entry of the combined sequence.
    pub fn step(&self, index: usize) -> Option<PipelineStep<Pre, Post, T, C>> {
        self.combined.get(index).cloned()
    }

    /// Length of the combined sequence. Always `pre + post + 1`.
    pub fn len(&self) -> usize {
        self.combined.len()
    }

    /// The combined sequence always holds the target, so it is never empty.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Number of steps in the given phase.
    pub fn phase_len(&self, phase: Phase) -> usize {
        match phase {
            Phase::Pre => self.pre.len(),
            Phase::Post => self.post.len(),
        }
    }

    /// The current target callable.
    pub fn target(&self) -> &Arc<T> {
        self.target.func()
    }

    /// The current default context.
    pub fn context(&self) -> &Arc<C> {
        &self.context
    }

    fn regenerate(&mut self) {
        self.combined = assemble(&self.pre, &self.target, &self.post);
    }
}

impl<F: ?Sized, T: ?Sized, C> Pipeline<F, F, T, C> {
    /// Insert a step into the list named by `phase`.
    ///
    /// Only available when both phases share one step signature.
    pub fn insert(&mut self, phase: Phase, record: StepRecord<F, C>, prepend: bool) {
        match phase {
            Phase::Pre => self.insert_pre(record, prepend),
            Phase::Post => self.insert_post(record, prepend),
        }
    }
}

impl<Pre: ?Sized, Post: ?Sized, T: ?Sized, C> fmt::Debug for Pipeline<Pre, Post, T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("pre", &self.pre)
            .field("post", &self.post)
            .field("len", &self.combined.len())
            .finish_non_exhaustive()
    }
}

fn assemble<Pre: ?Sized, Post: ?Sized, T: ?Sized, C>(
    pre: &[StepRecord<Pre, C>],
    target: &TargetStep<T>,
    post: &[StepRecord<Post, C>],
) -> Steps<Pre, Post, T, C> {
    pre.iter()
        .cloned()
        .map(PipelineStep::Before)
        .chain(std::iter::once(PipelineStep::Target(target.clone())))
        .chain(post.iter().cloned().map(PipelineStep::After))
        .collect()
}

fn insert<F: ?Sized, C>(list: &mut Vec<StepRecord<F, C>>, record: StepRecord<F, C>, prepend: bool) {
    if prepend {
        list.insert(0, record);
    } else {
        list.push(record);
    }
}

fn log_insert(phase: Phase, prepend: bool, name: Option<&str>) {
    tracing::debug!(%phase, prepend, name, "adding conduit step");
}

/// A pipeline shared between a conduit's handles and its in-flight
/// invocations.
///
/// Locks are only held to read or mutate lists, never while a step runs.
pub(crate) struct SharedPipeline<P> {
    inner: RwLock<P>,
}

impl<P> SharedPipeline<P> {
    pub(crate) fn new(pipeline: P) -> Arc<Self> {
        Arc::new(Self {
            inner: RwLock::new(pipeline),
        })
    }

    pub(crate) fn read(&self) -> RwLockReadGuard<'_, P> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, P> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}
