//! Testing utilities for Conduit.
//!
//! # Features
//!
//! - [`CallLog`]: A shared, ordered log with ready-made marker steps
//! - [`Parking`]: A continuation-passing step that parks invocations so a
//!   test can resume them by hand, in any order

use conduit_core::{Advance, AfterFn, BeforeFn, ContinuationRecord, StepRecord, StepResult};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

// ============================================================================
// Call Log
// ============================================================================

/// A shared, ordered log of markers.
///
/// Clones share the same entries.
///
/// # Example
///
/// ```rust,ignore
/// let log = CallLog::new();
///
/// conduit.add_step(log.marker("before step invoked"), StepOptions::new());
/// conduit.call(args)?;
///
/// assert_eq!(log.entries(), vec!["before step invoked"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl CallLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry.
    pub fn push(&self, entry: impl Into<String>) {
        self.lock().push(entry.into());
    }

    /// Get a clone of the recorded entries.
    pub fn entries(&self) -> Vec<String> {
        self.lock().clone()
    }

    /// Get the number of recorded entries.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Clear all recorded entries.
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// A continuation-passing step that records `marker` and advances.
    pub fn marker<C, A>(&self, marker: &'static str) -> ContinuationRecord<C, A>
    where
        C: Send + Sync + 'static,
        A: Clone + Send + 'static,
    {
        let log = self.clone();
        StepRecord::continuation(move |_: &C, advance: Advance<C, A>, args: A| {
            log.push(marker);
            advance.next(args)
        })
        .named(marker)
    }

    /// A `pre` step that records `marker` and passes the arguments on.
    pub fn before_marker<C, A>(&self, marker: &'static str) -> StepRecord<BeforeFn<C, A>, C>
    where
        C: Send + Sync + 'static,
        A: 'static,
    {
        let log = self.clone();
        StepRecord::before(move |_: &C, args: A| {
            log.push(marker);
            Ok(args)
        })
        .named(marker)
    }

    /// A `post` step that records `marker` and passes the result on.
    pub fn after_marker<C, A, R>(&self, marker: &'static str) -> StepRecord<AfterFn<C, A, R>, C>
    where
        C: Send + Sync + 'static,
        A: 'static,
        R: 'static,
    {
        let log = self.clone();
        StepRecord::after(move |_: &C, result: R, _: &A| {
            log.push(marker);
            Ok(result)
        })
        .named(marker)
    }

    fn lock(&self) -> MutexGuard<'_, Vec<String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ============================================================================
// Parking
// ============================================================================

type Parked<C, A> = Arc<Mutex<Vec<(Advance<C, A>, A)>>>;

/// Parks every invocation that reaches its step.
///
/// The step stores the invocation's [`Advance`] together with its arguments
/// instead of advancing. [`Parking::resume`] picks them up again.
pub struct Parking<C, A> {
    parked: Parked<C, A>,
}

impl<C, A> Parking<C, A>
where
    C: Send + Sync + 'static,
    A: Clone + Send + 'static,
{
    /// Create an empty parking lot.
    pub fn new() -> Self {
        Self {
            parked: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// The parking step.
    pub fn step(&self) -> ContinuationRecord<C, A> {
        let parked = Arc::clone(&self.parked);
        StepRecord::continuation(move |_: &C, advance: Advance<C, A>, args: A| {
            parked
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push((advance, args));
            Ok(())
        })
        .named("parking")
    }

    /// Number of parked invocations.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether nothing is parked.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Resume the `index`-th parked invocation (in arrival order), mapping
    /// its arguments first. Returns `None` when nothing is parked there.
    pub fn resume_with(
        &self,
        index: usize,
        map: impl FnOnce(A) -> A,
    ) -> Option<StepResult> {
        let (advance, args) = {
            let mut parked = self.lock();
            if index >= parked.len() {
                return None;
            }
            parked.remove(index)
        };
        Some(advance.next(map(args)))
    }

    /// Resume the `index`-th parked invocation with its own arguments.
    pub fn resume(&self, index: usize) -> Option<StepResult> {
        self.resume_with(index, |args| args)
    }

    /// Drop every parked invocation without resuming it.
    pub fn abandon(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, Vec<(Advance<C, A>, A)>> {
        self.parked.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<C, A> Default for Parking<C, A>
where
    C: Send + Sync + 'static,
    A: Clone + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<C, A> Clone for Parking<C, A> {
    fn clone(&self) -> Self {
        Self {
            parked: Arc::clone(&self.parked),
        }
    }
}
