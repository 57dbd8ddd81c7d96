#![allow(dead_code, unused_macros)]

use once_cell::sync::Lazy;
use pretty_assertions::assert_eq;
use tale::{Engine, EngineOptions, ExecutionOptions, FailureKind, RunOutcome};

/// One engine shared by every test in a binary, the way a server would.
pub static ENGINE: Lazy<Engine> = Lazy::new(|| {
    Engine::new(EngineOptions {
        execution: ExecutionOptions {
            random_seed: Some(1),
            ..ExecutionOptions::default()
        },
        ..EngineOptions::default()
    })
});

/// Successful output, or the failure kind with the output produced before it.
pub type Expected = Result<&'static str, (FailureKind, &'static str)>;

pub fn inputs(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

pub fn check(outcome: &RunOutcome, expected: Expected) {
    match expected {
        Ok(output) => {
            assert!(outcome.ok, "run failed: {:?}", outcome.error);
            assert_eq!(outcome.output, output);
            assert_eq!(outcome.error, None);
        }
        Err((kind, output)) => {
            let error = outcome.error.as_ref().unwrap_or_else(|| {
                panic!("expected a {} failure, got output {:?}", kind, outcome.output)
            });
            assert!(!outcome.ok);
            assert_eq!(error.kind, kind, "message: {}", error.message);
            assert_eq!(outcome.output, output);
        }
    }
}

/// Declare a test that runs a TALE program on the shared engine.
///
/// ```ignore
/// test_case!(
///     greeting,
///     input: "say \"hi\"",
///     output: Ok("hi\n"),
/// );
/// ```
macro_rules! test_case {
    (
        $name:ident,
        input: $input:expr,
        $(inputs: [$($value:expr),* $(,)?],)?
        output: $expected:expr $(,)?
    ) => {
        #[test]
        fn $name() {
            let values: Vec<String> = cases::inputs(&[$($($value),*)?]);
            let outcome = cases::ENGINE.run($input, &values);
            cases::check(&outcome, $expected);
        }
    };
}
