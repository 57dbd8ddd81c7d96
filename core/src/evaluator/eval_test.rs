//! Unit tests for the evaluator.

use super::*;
use crate::api::{Clock, ExecutionOptions, StructureOptions};
use crate::parser::{Line, Program, Stmt, StmtKind, parse_line};
use crate::sandbox::{CancelToken, Capabilities, FileAccess, SecurityRejection};
use crate::source::SourceProgram;
use crate::{blocks, transform, validator};
use chrono::NaiveDate;
use indoc::indoc;
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;

fn program(source: &str) -> Program {
    let tree = blocks::build(&SourceProgram::new(source), &StructureOptions::default())
        .unwrap_or_else(|e| panic!("structure error: {}", e));
    let transformed = transform::transform(&tree).unwrap_or_else(|e| panic!("transform errors: {:?}", e));
    validator::validate(&transformed, &Capabilities::standard()).unwrap_or_else(|e| panic!("validation errors: {:?}", e))
}

fn options() -> ExecutionOptions {
    ExecutionOptions {
        random_seed: Some(7),
        ..ExecutionOptions::default()
    }
}

struct Runner {
    options: ExecutionOptions,
    capabilities: Capabilities,
    inputs: Vec<String>,
}

impl Runner {
    fn new() -> Self {
        Self {
            options: options(),
            capabilities: Capabilities::standard(),
            inputs: Vec::new(),
        }
    }

    fn inputs(mut self, inputs: &[&str]) -> Self {
        self.inputs = inputs.iter().map(|s| s.to_string()).collect();
        self
    }

    fn options(mut self, configure: impl FnOnce(&mut ExecutionOptions)) -> Self {
        configure(&mut self.options);
        self
    }

    fn exec(&self, program: &Program) -> (String, Result<(), Fault>) {
        let mut interpreter = Interpreter::new(
            Arc::new(self.capabilities.clone()),
            &self.options,
            self.inputs.clone(),
            None,
        );
        let result = interpreter.run(program);
        (interpreter.into_output(), result)
    }

    fn run(&self, source: &str) -> (String, Result<(), Fault>) {
        self.exec(&program(source))
    }

    fn output(&self, source: &str) -> String {
        let (output, result) = self.run(source);
        if let Err(fault) = result {
            panic!("run failed: {}\noutput so far:\n{}", fault, output);
        }
        output
    }

    fn fault(&self, source: &str) -> (String, Fault) {
        let (output, result) = self.run(source);
        (output, result.expect_err("expected the run to fail"))
    }
}

fn output(source: &str) -> String {
    Runner::new().output(source)
}

fn runtime_kind(fault: &Fault) -> &ErrorKind {
    match &fault.error {
        ExecError::Runtime(error) => &error.kind,
        other => panic!("expected a runtime error, got {:?}", other),
    }
}

// ============================================================================
// Values and display
// ============================================================================

#[test]
fn test_arithmetic() {
    let source = indoc! {"
        say 1 + 2 * 3
        say 7 / 2
        say 6 / 2
        say 7 % 3
        say 2 ** 10
    "};
    assert_eq!(output(source), "7\n3.5\n3.0\n1\n1024\n");
}

#[test]
fn test_display_of_collections() {
    let source = indoc! {r#"
        say [1, "a", true, nothing]
        say {"k": 2.5}
        say "plain"
    "#};
    assert_eq!(output(source), "[1, 'a', true, nothing]\n{'k': 2.5}\nplain\n");
}

#[test]
fn test_say_joins_with_spaces() {
    assert_eq!(output("say \"a\", 1, true"), "a 1 true\n");
    assert_eq!(output("t is 3\nsay \"Total: \" + t"), "Total:  3\n");
}

#[test]
fn test_integer_overflow_wraps() {
    assert_eq!(output("x is 9223372036854775807\nsay x + 1"), "-9223372036854775808\n");
}

#[test]
fn test_booleans_are_not_numbers() {
    assert_eq!(output("say true == 1"), "false\n");
    let (_, fault) = Runner::new().fault("say true + 1");
    assert_eq!(runtime_kind(&fault), &ErrorKind::Type);
}

#[test]
fn test_formatted_text() {
    assert_eq!(output("x is 3\nsay formatted \"x is {x}\""), "x is 3\n");
}

// ============================================================================
// Control flow
// ============================================================================

#[test]
fn test_if_elif_else() {
    let source = indoc! {r#"
        for each n in [1, 5, 20]
          if n > 10
            say "big"
          elif n > 3
            say "medium"
          else
            say "small"
          end
        end
    "#};
    assert_eq!(output(source), "small\nmedium\nbig\n");
}

#[test]
fn test_repeat_with_counter() {
    let source = indoc! {"
        repeat 3 times as i
          say i
        end
    "};
    assert_eq!(output(source), "0\n1\n2\n");
}

#[test]
fn test_while_break_continue() {
    let source = indoc! {"
        x is 0
        while true
          add 1 to x
          if x == 2
            continue
          end
          if x > 4
            break
          end
          say x
        end
    "};
    assert_eq!(output(source), "1\n3\n4\n");
}

#[test]
fn test_for_each_unpacks_pairs() {
    let source = indoc! {r#"
        ages is {"ann": 30, "bob": 25}
        for each name, age in items(ages)
          say name, age
        end
    "#};
    assert_eq!(output(source), "ann 30\nbob 25\n");
}

// ============================================================================
// Functions and classes
// ============================================================================

#[test]
fn test_recursion() {
    let source = indoc! {"
        function fact n
          if n <= 1
            return 1
          end
          return n * fact(n - 1)
        end
        say fact(10)
    "};
    assert_eq!(output(source), "3628800\n");
}

#[test]
fn test_closures_capture_locals() {
    let source = indoc! {"
        function make_adder n
          return lambda x -> x + n
        end
        add5 is make_adder(5)
        say add5(10)
    "};
    assert_eq!(output(source), "15\n");
}

#[test]
fn test_locals_do_not_leak() {
    let source = indoc! {"
        function f
          secret is 1
        end
        f()
        say secret
    "};
    let (_, fault) = Runner::new().fault(source);
    assert_eq!(runtime_kind(&fault), &ErrorKind::Name);
    assert_eq!(fault.line, 5);
}

#[test]
fn test_global_declaration() {
    let source = indoc! {"
        total is 0
        function bump
          global total
          add 1 to total
        end
        bump()
        bump()
        say total
    "};
    assert_eq!(output(source), "2\n");
}

#[test]
fn test_wrong_argument_count() {
    let source = indoc! {"
        function pair a b
          return a
        end
        pair(1)
    "};
    let (_, fault) = Runner::new().fault(source);
    assert_eq!(fault.to_string(), "Line 4: TypeError: `pair` expects 2 arguments but got 1");
}

#[test]
fn test_class_instances() {
    let source = indoc! {r#"
        class Dog
          function init self name
            self.name is name
          end
          function speak self
            return self.name + " says woof"
          end
        end
        d is Dog("Rex")
        say d.speak()
        say type of d
    "#};
    assert_eq!(output(source), "Rex says woof\nDog\n");
}

#[test]
fn test_map_and_filter_are_eager() {
    let source = indoc! {"
        say map(lambda x -> x * 2, [1, 2, 3])
        say filter(lambda x -> x > 1, [1, 2, 3])
    "};
    assert_eq!(output(source), "[2, 4, 6]\n[2, 3]\n");
}

// ============================================================================
// Collections and text
// ============================================================================

#[test]
fn test_list_statements() {
    let source = indoc! {"
        list nums is [3, 1, 2]
        add 4 to nums
        sort nums
        say nums
        say len(nums), nums[1:3], nums[-1]
    "};
    assert_eq!(output(source), "[1, 2, 3, 4]\n4 [2, 3] 4\n");
}

#[test]
fn test_dictionary_statements() {
    let source = indoc! {r#"
        dict ages is {"ann": 30}
        set ages bob to 25
        say ages
        say get ages bob
    "#};
    assert_eq!(output(source), "{'ann': 30, 'bob': 25}\n25\n");
}

#[test]
fn test_index_errors() {
    let (_, fault) = Runner::new().fault("xs is [1]\nsay xs[3]");
    assert_eq!(runtime_kind(&fault), &ErrorKind::Index);

    let (_, fault) = Runner::new().fault("d is {}\nsay d[\"missing\"]");
    assert_eq!(runtime_kind(&fault), &ErrorKind::Key);
}

#[test]
fn test_text_helpers_and_methods() {
    let source = indoc! {r#"
        name is "ada lovelace"
        say title of name
        say name.upper()
        say split name " "
    "#};
    assert_eq!(output(source), "Ada Lovelace\nADA LOVELACE\n['ada', 'lovelace']\n");
}

#[test]
fn test_sets() {
    let source = indoc! {"
        a is {1, 2}
        b is {2, 3}
        say a.union(b)
        say a - b
    "};
    assert_eq!(output(source), "{1, 2, 3}\n{1}\n");
}

// ============================================================================
// try / catch / finally
// ============================================================================

#[test]
fn test_catch_binds_error_value() {
    let source = indoc! {r#"
        try
          x is 1 / 0
        catch problem
          say problem.kind
          say problem.message
        finally
          say "done"
        end
    "#};
    assert_eq!(output(source), "ZeroDivisionError\ndivision by zero\ndone\n");
}

#[test]
fn test_raise_is_catchable() {
    let source = indoc! {r#"
        try
          raise "boom"
        catch
          say error.kind, error.message
        end
    "#};
    assert_eq!(output(source), "Error boom\n");
}

#[test]
fn test_uncaught_error_keeps_output() {
    let source = indoc! {r#"
        say "before"
        x is 1 / 0
        say "after"
    "#};
    let (output, fault) = Runner::new().fault(source);
    assert_eq!(output, "before\n");
    assert_eq!(fault.to_string(), "Line 2: ZeroDivisionError: division by zero");
}

#[test]
fn test_finally_runs_after_uncaught_runtime_error() {
    let source = indoc! {r#"
        try
          raise "boom"
        finally
          say "cleanup"
        end
    "#};
    let (output, fault) = Runner::new().fault(source);
    assert_eq!(output, "cleanup\n");
    assert_eq!(fault.line, 2);
}

#[test]
fn test_input_exhaustion_is_not_catchable() {
    let source = indoc! {r#"
        try
          ask x
        catch
          say "caught"
        finally
          say "cleanup"
        end
    "#};
    let (output, fault) = Runner::new().fault(source);
    assert_eq!(output, "");
    assert!(matches!(fault.error, ExecError::InputExhausted(_)));
}

// ============================================================================
// Input
// ============================================================================

#[test]
fn test_input_coercion() {
    let source = indoc! {"
        ask a
        ask b
        ask c
        say type of a, type of b, type of c
        say a + 1
    "};
    let output = Runner::new().inputs(&["42", "3.14", "forty-two"]).output(source);
    assert_eq!(output, "int float str\n43\n");
}

#[test]
fn test_prompt_is_echoed_without_newline() {
    let output = Runner::new().inputs(&["Ada"]).output("ask \"Name? \" as name\nsay name");
    assert_eq!(output, "Name? Ada\n");
}

#[test]
fn test_input_exhaustion_names_the_prompt() {
    let source = indoc! {r#"
        ask "First? " as a
        say a
        ask "Second? " as b
    "#};
    let (output, fault) = Runner::new().inputs(&["1"]).fault(source);
    assert_eq!(output, "First? 1\nSecond? ");
    assert_eq!(fault.line, 3);
    let ExecError::InputExhausted(exhausted) = &fault.error else {
        panic!("expected input exhaustion");
    };
    assert_eq!(exhausted.ordinal, 2);
    assert_eq!(exhausted.prompt.as_deref(), Some("Second? "));
}

// ============================================================================
// Budget
// ============================================================================

#[test]
fn test_timeout() {
    let runner = Runner::new().options(|o| o.timeout = Duration::from_millis(50));
    let (_, fault) = runner.fault("while true\n  pass\nend");
    assert_eq!(fault.error, ExecError::Timeout { limit_ms: 50 });
}

#[test]
fn test_call_depth_limit() {
    let source = indoc! {"
        function down n
          return down(n + 1)
        end
        down(0)
    "};
    let runner = Runner::new().options(|o| o.max_call_depth = 20);
    let (_, fault) = runner.fault(source);
    assert_eq!(
        fault.error,
        ExecError::ResourceExceeded {
            what: "call depth",
            limit: 20
        }
    );
}

#[test]
fn test_collection_limit() {
    let runner = Runner::new().options(|o| o.max_collection_len = 100);
    let (_, fault) = runner.fault("s is \"ab\" * 1000");
    assert_eq!(
        fault.error,
        ExecError::ResourceExceeded {
            what: "collection size",
            limit: 100
        }
    );
    let (_, fault) = runner.fault("xs is list(range(1000))");
    assert!(matches!(fault.error, ExecError::ResourceExceeded { .. }));
}

#[test]
fn test_text_limits_apply_before_building() {
    let runner = Runner::new().options(|o| o.max_collection_len = 100);
    let too_big = ExecError::ResourceExceeded {
        what: "collection size",
        limit: 100,
    };

    let grown = indoc! {r#"
        s is "a" * 50
        t is replace s "a" "xy"
        say len t
        t is replace s "a" "xyz"
    "#};
    let (output, fault) = runner.fault(grown);
    assert_eq!(output, "100\n");
    assert_eq!(fault.line, 4);
    assert_eq!(fault.error, too_big);

    let joined = indoc! {r#"
        xs is [1, 2, 3]
        sep is ", "
        g is "-" * 60
        say join sep xs
        s is join g xs
    "#};
    let (output, fault) = runner.fault(joined);
    assert_eq!(output, "1, 2, 3\n");
    assert_eq!(fault.line, 5);
    assert_eq!(fault.error, too_big);
}

#[test]
fn test_appending_respects_the_size_limit() {
    let runner = Runner::new().options(|o| o.max_collection_len = 100);
    let source = indoc! {r#"
        chunk is "x" * 40
        open "big.txt" as f for appending
        repeat 5 times as i
          write f chunk
          say i
        end
    "#};
    let (output, fault) = runner.fault(source);
    assert_eq!(output, "0\n1\n");
    assert_eq!(fault.line, 4);
    assert!(matches!(fault.error, ExecError::ResourceExceeded { what: "collection size", .. }));
}

#[test]
fn test_output_limit() {
    let runner = Runner::new().options(|o| o.max_output_bytes = 8);
    let (_, fault) = runner.fault("say \"hello\"\nsay \"hello\"");
    assert_eq!(fault.line, 2);
    assert!(matches!(fault.error, ExecError::ResourceExceeded { what: "output size", .. }));
}

#[test]
fn test_budget_failures_skip_catch() {
    let source = indoc! {r#"
        try
          while true
            pass
          end
        catch
          say "caught"
        end
    "#};
    let runner = Runner::new().options(|o| o.timeout = Duration::from_millis(20));
    let (output, fault) = runner.fault(source);
    assert_eq!(output, "");
    assert!(matches!(fault.error, ExecError::Timeout { .. }));
}

#[test]
fn test_cancellation() {
    let cancel = CancelToken::new();
    cancel.cancel();
    let mut interpreter = Interpreter::new(
        Arc::new(Capabilities::standard()),
        &options(),
        Vec::new(),
        Some(cancel),
    );
    let fault = interpreter.run(&program("say 1")).expect_err("expected cancellation");
    assert_eq!(fault.error, ExecError::Cancelled);
    assert_eq!(interpreter.output(), "");
}

// ============================================================================
// Security re-checks
// ============================================================================

#[test]
fn test_import_rechecked_at_runtime() {
    let Ok(Line::Simple(simple)) = parse_line("import os") else {
        panic!("expected a simple statement");
    };
    let unchecked = Program {
        body: vec![Stmt {
            line: 1,
            kind: StmtKind::Simple(simple),
        }],
    };
    let (_, result) = Runner::new().exec(&unchecked);
    let fault = result.expect_err("import should be rejected");
    assert_eq!(
        fault.error,
        ExecError::Security(SecurityRejection::ModuleNotAllowed {
            module: "os".to_string()
        })
    );
}

#[test]
fn test_capability_table_is_the_environment() {
    let restricted = Runner {
        capabilities: Capabilities::standard().without_module("math"),
        ..Runner::new()
    };
    let (_, fault) = restricted.fault("import math");
    assert!(matches!(fault.error, ExecError::Security(_)));

    let (_, fault) = restricted.fault("say math.pi");
    assert_eq!(runtime_kind(&fault), &ErrorKind::Name);
}

// ============================================================================
// Modules
// ============================================================================

#[test]
fn test_math() {
    let source = indoc! {"
        import math
        say math.sqrt(16)
        say math.floor(2.7)
        from math import pi
        say round(pi, 2)
    "};
    assert_eq!(output(source), "4.0\n2\n3.14\n");
}

#[test]
fn test_math_domain_error() {
    let (_, fault) = Runner::new().fault("say math.sqrt(-1)");
    assert_eq!(fault.to_string(), "Line 1: ValueError: math domain error");
}

#[test]
fn test_seeded_random_is_deterministic() {
    let source = indoc! {"
        import random
        say random.randint(1, 100), random.randint(1, 100), random.random()
    "};
    let first = output(source);
    assert_eq!(output(source), first);

    let other = Runner::new().options(|o| o.random_seed = Some(8)).output(source);
    assert_ne!(other, first);
}

#[test]
fn test_datetime_uses_the_clock() {
    let fixed = NaiveDate::from_ymd_opt(2024, 3, 1)
        .and_then(|date| date.and_hms_opt(9, 30, 0))
        .unwrap();
    let runner = Runner::new().options(|o| o.clock = Clock::Fixed(fixed));
    let source = indoc! {r#"
        import datetime
        say datetime.year(), datetime.month(), datetime.day()
        say datetime.today()
        say datetime.weekday()
        say datetime.format("%d/%m/%Y %H:%M")
    "#};
    assert_eq!(runner.output(source), "2024 3 1\n2024-03-01\nFriday\n01/03/2024 09:30\n");
}

#[test]
fn test_json_module() {
    let source = indoc! {r#"
        data is json.loads('{"a": [1, 2.5, true, null]}')
        say data
        say json.dumps(data)
    "#};
    assert_eq!(output(source), "{'a': [1, 2.5, true, nothing]}\n{\"a\":[1,2.5,true,null]}\n");
}

#[test]
fn test_csv_module() {
    let source = indoc! {r#"
        rows is csv.parse('x,y')
        say rows
        say len(csv.format([["a", "b,c"]]))
    "#};
    assert_eq!(output(source), "[['x', 'y']]\n8\n");
}

// ============================================================================
// Files
// ============================================================================

#[test]
fn test_memory_files() {
    let source = indoc! {r#"
        open "notes.txt" as f for writing
        write f "hello"
        close f
        open "notes.txt" as g
        say read g
        close g
    "#};
    let (output, result) = Runner::new().run(source);
    assert_eq!(result, Ok(()));
    assert_eq!(output, "hello\n");
}

#[test]
fn test_json_files() {
    let source = indoc! {r#"
        json write {"n": 1} to "d.json"
        d is json read "d.json"
        say d["n"]
    "#};
    assert_eq!(output(source), "1\n");
}

#[test]
fn test_seeded_memory_files() {
    let runner = Runner::new().options(|o| {
        o.file_access = FileAccess::Memory {
            files: [("in.txt".to_string(), "one\ntwo\n".to_string())].into_iter().collect(),
        }
    });
    let source = indoc! {r#"
        open "in.txt" as f
        for each line in f
          say upper of line
        end
    "#};
    assert_eq!(runner.output(source), "ONE\nTWO\n");
}

#[test]
fn test_disabled_files() {
    let runner = Runner::new().options(|o| o.file_access = FileAccess::Disabled);
    let (_, fault) = runner.fault("open \"x.txt\" as f");
    assert_eq!(fault.error, ExecError::Security(SecurityRejection::FileAccessDisabled));
}

#[test]
fn test_path_escape_is_a_file_error() {
    let (_, fault) = Runner::new().fault("open \"../secret.txt\" as f");
    assert_eq!(runtime_kind(&fault), &ErrorKind::File);
}

#[test]
fn test_missing_file_is_catchable() {
    let source = indoc! {r#"
        try
          open "nope.txt" as f
        catch
          say error.kind
        end
    "#};
    assert_eq!(output(source), "FileError\n");
}
