//! Taps: steps that look at values without changing them.

use conduit_core::{Advance, AfterFn, BeforeFn, ContinuationRecord, StepRecord};

/// A `pre` step that inspects the arguments and passes them on unchanged.
pub fn tap<C, A, F>(func: F) -> StepRecord<BeforeFn<C, A>, C>
where
    C: Send + Sync + 'static,
    A: 'static,
    F: Fn(&C, &A) + Send + Sync + 'static,
{
    StepRecord::before(move |context: &C, args: A| {
        func(context, &args);
        Ok(args)
    })
}

/// A `post` step that inspects the result (and the original arguments) and
/// passes the result on unchanged.
pub fn inspect<C, A, R, F>(func: F) -> StepRecord<AfterFn<C, A, R>, C>
where
    C: Send + Sync + 'static,
    A: 'static,
    R: 'static,
    F: Fn(&C, &R, &A) + Send + Sync + 'static,
{
    StepRecord::after(move |context: &C, result: R, args: &A| {
        func(context, &result, args);
        Ok(result)
    })
}

/// A continuation-passing step that inspects the arguments and advances.
pub fn observe<C, A, F>(func: F) -> ContinuationRecord<C, A>
where
    C: Send + Sync + 'static,
    A: Clone + Send + 'static,
    F: Fn(&C, &A) + Send + Sync + 'static,
{
    StepRecord::continuation(move |context: &C, advance: Advance<C, A>, args: A| {
        func(context, &args);
        advance.next(args)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use conduit_core::{StepOptions, SyncConduit};
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Ctx {
        id: u8,
    }

    #[test]
    fn test_tap_and_inspect_see_values() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let conduit: SyncConduit<Ctx, String, usize> = SyncConduit::builder()
            .target(|_: &Ctx, msg: String| Ok(msg.len()))
            .context(Ctx { id: 7 })
            .build()
            .unwrap();

        let before = seen.clone();
        let after = seen.clone();
        conduit
            .add_before(
                tap(move |ctx: &Ctx, msg: &String| {
                    before.lock().unwrap().push(format!("{}:{msg}", ctx.id));
                }),
                StepOptions::new(),
            )
            .add_after(
                inspect(move |_: &Ctx, len: &usize, msg: &String| {
                    after.lock().unwrap().push(format!("{msg}={len}"));
                }),
                StepOptions::new(),
            );

        assert_eq!(conduit.call("four".into()).unwrap(), 4);
        assert_eq!(
            *seen.lock().unwrap(),
            vec!["7:four".to_string(), "four=4".to_string()]
        );
    }
}
