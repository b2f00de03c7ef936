use conduit::{
    ConduitError, Phase, StepOptions, StepRecord, SyncConduit, steps::LoggingStep,
    testing::CallLog,
};

mod common;
use common::{Greeter, do_stuff, greeter};

#[test]
fn test_without_steps_matches_direct_call() {
    let conduit = do_stuff();
    let direct = (conduit.target())(&greeter("Jimbabwe"), "here's your msg...".into()).unwrap();

    assert_eq!(conduit.call("here's your msg...".into()).unwrap(), direct);
    assert_eq!(direct, "Hi, Jimbabwe - here's your msg...");
}

#[test]
fn test_before_step_rewrites_message() {
    let conduit = do_stuff();
    conduit.before(|_, msg| Ok(format!("Yo dawg...{msg}")));

    assert_eq!(
        conduit.call("here's your msg...".into()).unwrap(),
        "Hi, Jimbabwe - Yo dawg...here's your msg..."
    );
}

#[test]
fn test_before_and_after_steps_chain() {
    let conduit = do_stuff();
    conduit
        .before(|_, msg| Ok(format!("CONDUIT SEZ BEFORE: {msg}")))
        .after(|_, result, _| Ok(format!("{result} CONDUIT SEZ AFTER")));

    assert_eq!(
        conduit.call("here's your msg...".into()).unwrap(),
        "Hi, Jimbabwe - CONDUIT SEZ BEFORE: here's your msg... CONDUIT SEZ AFTER"
    );
}

#[test]
fn test_steps_run_in_combined_order() {
    let log = CallLog::new();
    let conduit = do_stuff();
    conduit
        .add_after(log.after_marker("post 1"), StepOptions::new())
        .add_before(log.before_marker("pre 2"), StepOptions::new())
        .add_after(log.after_marker("post 2"), StepOptions::new())
        .add_before(log.before_marker("pre 1"), StepOptions::new().prepend());

    conduit.call("x".into()).unwrap();
    assert_eq!(log.entries(), vec!["pre 1", "pre 2", "post 1", "post 2"]);

    let phases: Vec<Option<Phase>> = conduit.steps().iter().map(|step| step.phase()).collect();
    assert_eq!(
        phases,
        vec![
            Some(Phase::Pre),
            Some(Phase::Pre),
            None,
            Some(Phase::Post),
            Some(Phase::Post)
        ]
    );
}

#[test]
fn test_steps_length_is_pre_plus_post_plus_one() {
    let conduit = do_stuff();
    let (mut pre, mut post) = (0, 0);

    for round in 0..12 {
        let prepend = round % 3 == 0;
        if round % 2 == 0 {
            conduit.add_before(
                StepRecord::before(|_: &Greeter, msg: String| Ok(msg)),
                StepOptions::new().phase(Phase::Post),
            );
            pre += 1;
        } else {
            let opts = if prepend {
                StepOptions::new().prepend()
            } else {
                StepOptions::new()
            };
            conduit.add_after(
                StepRecord::after(|_: &Greeter, out: String, _: &String| Ok(out)),
                opts,
            );
            post += 1;
        }
        assert_eq!(conduit.steps().len(), pre + post + 1);
    }

    conduit.clear();
    assert_eq!(conduit.steps().len(), 1);
    assert!(conduit.steps()[0].is_target());
}

#[test]
fn test_own_context_beats_default_context() {
    let conduit = do_stuff();
    conduit.add_before(
        StepRecord::before(|ctx: &Greeter, msg: String| {
            Ok(format!("Yo dawg...{} says '{}'", ctx.name, msg))
        })
        .named("test1")
        .with_context(greeter("Your mom")),
        StepOptions::new(),
    );

    assert_eq!(
        conduit.call("here's your msg...".into()).unwrap(),
        "Hi, Jimbabwe - Yo dawg...Your mom says 'here's your msg...'"
    );
    assert_eq!(conduit.steps()[0].name(), Some("test1"));
    assert_eq!(
        conduit.steps()[0].context().map(|ctx| ctx.name.as_str()),
        Some("Your mom")
    );
}

#[test]
fn test_default_context_can_change_between_calls() {
    let conduit = do_stuff();
    conduit.after(|ctx, result, _| Ok(format!("{result} (via {})", ctx.name)));

    conduit.set_context(greeter("Jimmy"));
    assert_eq!(conduit.context().name, "Jimmy");
    assert_eq!(conduit.call("yo".into()).unwrap(), "Hi, Jimmy - yo (via Jimmy)");
}

#[test]
fn test_set_target_keeps_steps() {
    let conduit = do_stuff();
    conduit
        .before(|_, msg| Ok(msg.trim().to_string()))
        .after(|_, result, _| Ok(result.to_uppercase()));

    conduit.set_target(|ctx: &Greeter, msg: String| Ok(format!("Bye, {} - {}", ctx.name, msg)));

    assert_eq!(conduit.steps().len(), 3);
    assert_eq!(conduit.call("  later ".into()).unwrap(), "BYE, JIMBABWE - LATER");
}

#[test]
fn test_clones_share_the_pipeline() {
    let conduit = do_stuff();
    let handle = conduit.clone();
    handle.before(|_, msg| Ok(format!("[{msg}]")));

    assert_eq!(conduit.steps().len(), 2);
    assert_eq!(conduit.call("x".into()).unwrap(), "Hi, Jimbabwe - [x]");
}

#[test]
fn test_step_may_mutate_conduit_while_running() {
    let conduit = do_stuff();
    let handle = conduit.clone();
    conduit.before(move |_, msg| {
        if handle.steps().len() == 2 {
            handle.after(|_, result, _| Ok(format!("{result}!")));
        }
        Ok(msg)
    });

    assert_eq!(conduit.call("first".into()).unwrap(), "Hi, Jimbabwe - first");
    assert_eq!(conduit.call("second".into()).unwrap(), "Hi, Jimbabwe - second!");
}

#[test]
fn test_errors_propagate_unchanged() {
    let log = CallLog::new();
    let conduit = do_stuff();
    conduit
        .before(|_, msg| {
            if msg.is_empty() {
                Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty message").into())
            } else {
                Ok(msg)
            }
        })
        .add_after(log.after_marker("after"), StepOptions::new());

    let err = conduit.call(String::new()).unwrap_err();
    let io = err.downcast_ref::<std::io::Error>().unwrap();
    assert_eq!(io.kind(), std::io::ErrorKind::InvalidInput);
    assert!(log.is_empty());
}

#[test]
fn test_missing_target_fails_construction() {
    let result = SyncConduit::<Greeter, String, String>::builder()
        .context(greeter("Jimbabwe"))
        .build();
    assert_eq!(result.err(), Some(ConduitError::InvalidTarget));
}

#[test]
fn test_logging_steps_are_transparent() {
    let conduit = do_stuff();
    let logging = LoggingStep::named("greeting");
    conduit
        .add_before(logging.before(), StepOptions::new())
        .add_after(logging.after(), StepOptions::new());

    assert_eq!(conduit.call("hey".into()).unwrap(), "Hi, Jimbabwe - hey");
}

#[test]
fn test_as_fn_behaves_like_a_plain_function() {
    let conduit = do_stuff();
    conduit.before(|_, msg| Ok(msg.repeat(2)));
    let greet = conduit.as_fn();

    let greetings: Vec<String> = ["a", "b"]
        .into_iter()
        .map(|msg| greet(msg.to_string()).unwrap())
        .collect();
    assert_eq!(greetings, vec!["Hi, Jimbabwe - aa", "Hi, Jimbabwe - bb"]);
}
