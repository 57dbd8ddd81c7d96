#[macro_use]
mod cases;

use indoc::indoc;
use pretty_assertions::assert_eq;
use tale::{DiagnosticKind, FailureKind};

test_case!(
    hello,
    input: r#"say "hello""#,
    output: Ok("hello\n"),
);

test_case!(
    positive,
    input: indoc! {r#"
        x is 1
        if x > 0
          say "positive"
        end
    "#},
    output: Ok("positive\n"),
);

test_case!(
    ask_and_answer,
    input: indoc! {r#"
        ask "Name? " as name
        ask "Age? " as age
        say formatted "{name} is {age + 1} next year"
    "#},
    inputs: ["Ada", "36"],
    output: Ok("Name? Age? Ada is 37 next year\n"),
);

test_case!(
    input_coercion,
    input: indoc! {"
        ask a
        ask b
        ask c
        say type of a, type of b, type of c
    "},
    inputs: ["42", "3.14", "forty-two"],
    output: Ok("int float str\n"),
);

test_case!(
    huge_integer_input_stays_text,
    input: "ask n\nsay type of n",
    inputs: ["99999999999999999999"],
    output: Ok("str\n"),
);

test_case!(
    second_prompt_runs_dry,
    input: indoc! {r#"
        ask "First? " as a
        say "got " + a
        ask "Second? " as b
        say "never"
    "#},
    inputs: ["1"],
    output: Err((FailureKind::InputExhausted, "First? got  1\nSecond? ")),
);

test_case!(
    missing_end_never_runs,
    input: indoc! {r#"
        say "start"
        while true
          say "loop"
    "#},
    output: Err((FailureKind::Structural, "")),
);

#[test]
fn test_missing_end_blames_opening_line() {
    let source = indoc! {r#"
        x is 3
        if x > 1
          repeat 2 times
            say x
          end
    "#};
    let analysis = cases::ENGINE.analyze(source);
    assert!(!analysis.ok);
    assert_eq!(analysis.diagnostics.len(), 1);
    let diagnostic = &analysis.diagnostics[0];
    assert_eq!(diagnostic.line, 2);
    assert_eq!(diagnostic.kind, DiagnosticKind::Structural);
    assert_eq!(diagnostic.code, "S001");
}

#[test]
fn test_extra_end_blames_itself() {
    let analysis = cases::ENGINE.analyze("say 1\nend\nsay 2");
    assert_eq!(analysis.diagnostics.len(), 1);
    assert_eq!(analysis.diagnostics[0].line, 2);
    assert_eq!(analysis.diagnostics[0].code, "S002");
}

#[test]
fn test_deep_nesting_is_recovered() {
    let depth = 20;
    let mut source = String::new();
    for level in 0..depth {
        source.push_str(&format!("{}if true\n", "  ".repeat(level)));
    }
    source.push_str(&format!("{}say \"deep\"\n", "  ".repeat(depth)));
    for level in (0..depth).rev() {
        source.push_str(&format!("{}end\n", "  ".repeat(level)));
    }
    assert!(cases::ENGINE.analyze(&source).ok);
    let outcome = cases::ENGINE.run(&source, &[]);
    assert_eq!(outcome.output, "deep\n");

    // Indentation points at the innermost block once its `end` is gone.
    let mut lines: Vec<&str> = source.lines().collect();
    lines.remove(depth + 1);
    let broken = lines.join("\n");
    let analysis = cases::ENGINE.analyze(&broken);
    assert_eq!(analysis.diagnostics.len(), 1);
    assert_eq!(analysis.diagnostics[0].line, depth);
}

#[test]
fn test_analysis_is_deterministic() {
    let source = indoc! {"
        import os
        x is (1 + 2
        return 5
    "};
    let first = cases::ENGINE.analyze(source);
    let second = cases::ENGINE.analyze(source);
    assert_eq!(first.diagnostics, second.diagnostics);
    assert!(second.version > first.version);
}

#[test]
fn test_runs_are_repeatable() {
    let source = indoc! {r#"
        ask n
        total is 0
        repeat n times as i
          add i to total
        end
        say total, random.randint(1, 1000)
    "#};
    let values = cases::inputs(&["10"]);
    let first = cases::ENGINE.run(source, &values);
    let second = cases::ENGINE.run(source, &values);
    assert!(first.ok);
    assert_eq!(first.output, second.output);
    assert_eq!(first.translated, second.translated);
}

#[test]
fn test_outcome_serializes_flat() {
    let outcome = cases::ENGINE.run("say \"hi\"\nsay nope", &[]);
    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(json["ok"], false);
    assert_eq!(json["output"], "hi\n");
    assert_eq!(json["kind"], "runtime");
    assert_eq!(json["line"], 2);
    assert_eq!(json["error"], "Line 2: NameError: `nope` is not defined");
    assert_eq!(json["help"], "Did you define the variable before using it?");
    assert!(json["version"].is_u64());
}

#[test]
fn test_analysis_serializes() {
    let analysis = cases::ENGINE.analyze("if true\nsay 1");
    let json = serde_json::to_value(&analysis).unwrap();
    assert_eq!(json["ok"], false);
    assert_eq!(json["diagnostics"][0]["line"], 1);
    assert_eq!(json["diagnostics"][0]["code"], "S001");
    assert_eq!(json["diagnostics"][0]["kind"], "structural");
}
