//! Deferral: continuation-passing steps that advance later.
//!
//! A deferred step hands the rest of the chain to a scheduler as a [`Job`]
//! and returns at once. The chain resumes on whatever thread or task runs
//! the job.

use conduit_core::{Advance, ContinuationRecord, StepRecord};

/// The rest of a chain, packaged for a scheduler.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// A continuation-passing step that defers its advance to `schedule`.
///
/// Errors raised once the chain resumes cannot reach the original caller;
/// they are logged with `tracing` at `WARN` level.
///
/// # Example
///
/// ```rust,ignore
/// use conduit_std::steps::deferred;
///
/// // Resume on a fresh thread.
/// conduit.add_step(
///     deferred(|job| {
///         std::thread::spawn(job);
///     }),
///     StepOptions::new(),
/// );
/// ```
pub fn deferred<C, A, S>(schedule: S) -> ContinuationRecord<C, A>
where
    C: Send + Sync + 'static,
    A: Clone + Send + 'static,
    S: Fn(Job) + Send + Sync + 'static,
{
    StepRecord::continuation(move |_: &C, advance: Advance<C, A>, args: A| {
        tracing::trace!(position = advance.position(), "deferring conduit step");
        schedule(Box::new(move || {
            if let Err(error) = advance.next(args) {
                tracing::warn!(%error, "deferred conduit chain failed");
            }
        }));
        Ok(())
    })
    .named("deferred")
}

#[cfg(test)]
mod tests {
    use super::*;
    use conduit_core::{Conduit, StepOptions};
    use std::sync::{Arc, Mutex, mpsc};

    #[test]
    fn test_deferred_step_resumes_on_another_thread() {
        let (tx, rx) = mpsc::channel();
        let conduit: Conduit<(), String> = Conduit::builder()
            .target(move |_: &(), msg: String| {
                tx.send(msg)?;
                Ok(())
            })
            .build()
            .unwrap();
        conduit.add_step(
            deferred(|job| {
                std::thread::spawn(job);
            }),
            StepOptions::new(),
        );

        conduit.call("later".into()).unwrap();
        assert_eq!(rx.recv().unwrap(), "later");
    }

    #[test]
    fn test_nothing_runs_until_the_job_does() {
        let jobs: Arc<Mutex<Vec<Job>>> = Arc::default();
        let queue = jobs.clone();
        let ran = Arc::new(Mutex::new(false));
        let target_ran = ran.clone();
        let conduit: Conduit<(), ()> = Conduit::builder()
            .target(move |_: &(), _: ()| {
                *target_ran.lock().unwrap() = true;
                Ok(())
            })
            .build()
            .unwrap();
        conduit.add_step(
            deferred(move |job| queue.lock().unwrap().push(job)),
            StepOptions::new(),
        );

        conduit.call(()).unwrap();
        assert!(!*ran.lock().unwrap());

        let job = jobs.lock().unwrap().pop().unwrap();
        job();
        assert!(*ran.lock().unwrap());
    }
}
