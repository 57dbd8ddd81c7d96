//! Unit tests for the validator.

use super::*;
use crate::api::StructureOptions;
use crate::blocks;
use crate::parser::{Simple, StmtKind};
use crate::sandbox::SecurityRejection;
use crate::source::SourceProgram;
use crate::transform;
use indoc::indoc;
use pretty_assertions::assert_eq;

fn validate_source(source: &str) -> Result<Program, Vec<ValidationError>> {
    let tree = blocks::build(&SourceProgram::new(source), &StructureOptions::default())
        .unwrap_or_else(|e| panic!("structure error: {}", e));
    let transformed = transform::transform(&tree).unwrap_or_else(|e| panic!("transform errors: {:?}", e));
    validate(&transformed, &Capabilities::standard())
}

fn errors(source: &str) -> Vec<ValidationError> {
    validate_source(source).expect_err("expected validation errors")
}

fn codes(source: &str) -> Vec<(usize, &'static str)> {
    errors(source).iter().map(|e| (e.line(), e.code())).collect()
}

// ============================================================================
// Lowering
// ============================================================================

#[test]
fn test_flat_program() {
    let program = validate_source("x is 1\nsay x").unwrap();
    assert_eq!(program.body.len(), 2);
    assert_eq!(program.body[0].line, 1);
    assert_eq!(program.body[1].line, 2);
    assert!(matches!(program.body[1].kind, StmtKind::Simple(Simple::Expr(_))));
}

#[test]
fn test_if_branches_keep_their_lines() {
    let program = validate_source(indoc! {r#"
        x is 5
        if x > 10
          say "big"
        elif x > 3
          say "medium"
        else
          say "small"
        end
    "#})
    .unwrap();

    let StmtKind::If { branches, else_body } = &program.body[1].kind else {
        panic!("expected an if statement");
    };
    assert_eq!(branches.iter().map(|b| b.line).collect::<Vec<_>>(), vec![2, 4]);
    assert_eq!(else_body.as_ref().map(|body| body[0].line), Some(7));
}

#[test]
fn test_repeat_and_for_each_become_for_loops() {
    let program = validate_source(indoc! {"
        repeat 3 times
          say 1
        end
        for each n in [1, 2]
          say n
        end
    "})
    .unwrap();
    assert!(matches!(&program.body[0].kind, StmtKind::For { targets, .. } if targets == &["_".to_string()]));
    assert!(matches!(&program.body[1].kind, StmtKind::For { targets, .. } if targets == &["n".to_string()]));
}

#[test]
fn test_function_and_class() {
    let program = validate_source(indoc! {"
        class Dog
          function init self name
            self.name is name
          end
          function speak self
            return self.name + \" says woof\"
          end
        end
    "})
    .unwrap();
    let StmtKind::Class { name, methods } = &program.body[0].kind else {
        panic!("expected a class");
    };
    assert_eq!(name, "Dog");
    assert_eq!(
        methods.iter().map(|m| m.name.as_str()).collect::<Vec<_>>(),
        vec!["init", "speak"]
    );
    assert_eq!(methods[0].params, vec!["self".to_string(), "name".to_string()]);
}

#[test]
fn test_try_catch_finally() {
    let program = validate_source(indoc! {"
        try
          x is 1 / 0
        catch problem
          say problem.message
        finally
          say \"done\"
        end
    "})
    .unwrap();
    let StmtKind::Try { catch, finally, .. } = &program.body[0].kind else {
        panic!("expected a try statement");
    };
    assert_eq!(catch.as_ref().map(|c| (c.line, c.name.as_str())), Some((3, "problem")));
    assert_eq!(finally.as_ref().map(Vec::len), Some(1));
}

// ============================================================================
// Placement
// ============================================================================

#[test]
fn test_return_outside_function() {
    assert_eq!(codes("return 1"), vec![(1, "V004")]);
}

#[test]
fn test_loop_control_outside_loop() {
    assert_eq!(codes("break\ncontinue"), vec![(1, "V005"), (2, "V005")]);
    assert_eq!(
        errors("continue")[0].to_string(),
        "`continue` can only be used inside a loop"
    );
}

#[test]
fn test_loop_control_does_not_cross_functions() {
    let source = indoc! {"
        while true
          function f
            break
          end
          break
        end
    "};
    assert_eq!(codes(source), vec![(3, "V005")]);
}

#[test]
fn test_return_inside_loop_inside_function() {
    let source = indoc! {"
        function first xs
          for each x in xs
            return x
          end
        end
    "};
    assert!(validate_source(source).is_ok());
}

#[test]
fn test_class_body_only_holds_methods() {
    let source = indoc! {"
        class Point
          x is 1
          pass
          function init self
            self.x is 0
          end
        end
    "};
    assert_eq!(codes(source), vec![(2, "V003")]);
}

// ============================================================================
// Security
// ============================================================================

#[test]
fn test_disallowed_import() {
    let errs = errors("import os");
    assert_eq!(
        errs,
        vec![ValidationError::Security {
            line: 1,
            rejection: SecurityRejection::ModuleNotAllowed {
                module: "os".to_string()
            }
        }]
    );
    assert_eq!(errs[0].code(), "X001");
}

#[test]
fn test_allowed_imports() {
    assert!(validate_source("import math\nimport random\nfrom json import loads").is_ok());
}

#[test]
fn test_dotted_import_is_rejected() {
    assert_eq!(codes("import math.sqrt"), vec![(1, "X001")]);
}

#[test]
fn test_unknown_import_member() {
    let errs = errors("from math import sqrt, system");
    assert_eq!(
        errs,
        vec![ValidationError::UnknownImportMember {
            line: 1,
            module: "math".to_string(),
            name: "system".to_string()
        }]
    );
}

#[test]
fn test_private_and_restricted_attributes() {
    let source = indoc! {r#"
        x is obj._secret
        os.system("ls")
        say math.pi
    "#};
    assert_eq!(codes(source), vec![(1, "X002"), (2, "X003")]);
}

#[test]
fn test_forbidden_names() {
    let source = indoc! {r#"
        say eval("1 + 1")
        f is getattr
        x is [1, locals]
    "#};
    assert_eq!(codes(source), vec![(1, "X004"), (2, "X004"), (3, "X004")]);
}

#[test]
fn test_forbidden_name_as_assignment_target() {
    assert_eq!(codes("input is 5"), vec![(1, "X004")]);
}

#[test]
fn test_nested_expressions_are_checked() {
    let source = indoc! {r#"
        function f x
          return [len(x), {"k": obj._class}]
        end
    "#};
    assert!(codes(source).iter().any(|(line, code)| *line == 2 && *code == "X002"));
}

// ============================================================================
// Collection of errors
// ============================================================================

#[test]
fn test_all_errors_collected_in_line_order() {
    let source = indoc! {"
        import socket
        say 1
        return 2
        break
    "};
    assert_eq!(codes(source), vec![(1, "X001"), (3, "V004"), (4, "V005")]);
}

#[test]
fn test_validation_is_deterministic() {
    let source = "import os\nreturn 1";
    assert_eq!(errors(source), errors(source));
}
