#[macro_use]
mod cases;

use indoc::indoc;
use pretty_assertions::assert_eq;
use tale::{
    Capabilities, DiagnosticKind, Engine, EngineOptions, ExecutionOptions, FailureKind, FileAccess,
};

fn codes(source: &str) -> Vec<(usize, &'static str)> {
    cases::ENGINE
        .analyze(source)
        .diagnostics
        .iter()
        .map(|d| (d.line, d.code))
        .collect()
}

// ============================================================================
// Rejected before running
// ============================================================================

test_case!(
    import_os_never_runs,
    input: indoc! {r#"
        say "before"
        import os
        say "after"
    "#},
    output: Err((FailureKind::Security, "")),
);

test_case!(
    restricted_object_never_runs,
    input: r#"os.system("echo hi")"#,
    output: Err((FailureKind::Security, "")),
);

test_case!(
    eval_never_runs,
    input: r#"say eval("1 + 1")"#,
    output: Err((FailureKind::Security, "")),
);

test_case!(
    private_attribute_never_runs,
    input: "x is [1]\nsay x._items",
    output: Err((FailureKind::Security, "")),
);

test_case!(
    dunder_names_are_rejected_early,
    input: "say x.__class__",
    output: Err((FailureKind::Transform, "")),
);

test_case!(
    shell_characters_are_rejected_early,
    input: "say 1; import os",
    output: Err((FailureKind::Transform, "")),
);

#[test]
fn test_imports() {
    assert_eq!(codes("import os"), vec![(1, "X001")]);
    assert_eq!(codes("import subprocess"), vec![(1, "X001")]);
    assert_eq!(codes("from os import path"), vec![(1, "X001")]);
    assert_eq!(codes("import math.sqrt"), vec![(1, "X001")]);
    assert_eq!(codes("import math\nimport random\nimport json"), vec![]);
}

#[test]
fn test_every_rejection_is_reported() {
    let source = indoc! {r#"
        import socket
        say "fine"
        x is getattr
        y is x._hidden
    "#};
    assert_eq!(codes(source), vec![(1, "X001"), (3, "X004"), (4, "X002")]);
}

#[test]
fn test_analyze_and_run_agree() {
    let source = "say 1\nimport shutil";
    let analysis = cases::ENGINE.analyze(source);
    let outcome = cases::ENGINE.run(source, &[]);
    let error = outcome.error.unwrap();
    assert_eq!(error.diagnostics, analysis.diagnostics);
    assert_eq!(error.line, Some(2));
    assert_eq!(error.message, "Line 2: Import not allowed: shutil");
    assert_eq!(analysis.diagnostics[0].kind, DiagnosticKind::Security);
    assert!(error.help.is_some());
}

#[test]
fn test_security_diagnostics_serialize() {
    let outcome = cases::ENGINE.run("import os", &[]);
    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(json["ok"], false);
    assert_eq!(json["kind"], "security");
    assert_eq!(json["diagnostics"][0]["code"], "X001");
    assert_eq!(json["diagnostics"][0]["kind"], "security");
    assert!(json.get("translated").is_none());
}

// ============================================================================
// Capability tables
// ============================================================================

#[test]
fn test_removed_module_is_not_importable() {
    let engine = Engine::with_capabilities(
        EngineOptions::default(),
        Capabilities::standard().without_module("random"),
    );
    let outcome = engine.run("import random", &[]);
    assert_eq!(outcome.error.unwrap().kind, FailureKind::Security);
    assert!(engine.run("import math\nsay math.floor(2.5)", &[]).ok);
}

#[test]
fn test_empty_table_has_no_builtins() {
    let engine = Engine::with_capabilities(EngineOptions::default(), Capabilities::empty());
    let outcome = engine.run("say 1", &[]);
    let error = outcome.error.unwrap();
    assert_eq!(error.kind, FailureKind::Runtime);
    assert!(error.message.contains("`print` is not defined"), "{}", error.message);
}

#[test]
fn test_disabled_files_are_a_security_failure() {
    let options = ExecutionOptions {
        file_access: FileAccess::Disabled,
        ..ExecutionOptions::default()
    };
    let outcome = cases::ENGINE.run_with(
        "say \"start\"\nopen \"data.txt\" as f",
        &[],
        &options,
        None,
    );
    let error = outcome.error.unwrap();
    assert_eq!(outcome.output, "start\n");
    assert_eq!(error.kind, FailureKind::Security);
    assert_eq!(error.line, Some(2));
}

#[test]
fn test_files_cannot_escape_the_sandbox() {
    let source = indoc! {r#"
        try
          open "../../etc/passwd" as f
          say read f
        catch
          say error.kind
        end
    "#};
    let outcome = cases::ENGINE.run(source, &[]);
    assert!(outcome.ok);
    assert_eq!(outcome.output, "FileError\n");
}
