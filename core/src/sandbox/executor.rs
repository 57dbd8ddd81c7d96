//! One sandboxed run of a validated program.

use super::{CancelToken, Capabilities};
use crate::api::ExecutionOptions;
use crate::evaluator::{Fault, Interpreter};
use crate::parser::Program;
use std::collections::BTreeMap;
use std::sync::Arc;

/// What a run produced. Output is kept whether or not the run succeeded.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionResult {
    pub success: bool,
    pub output: String,
    pub failure: Option<Fault>,
    /// Final contents of the in-memory file system, when that backend was used.
    pub files: Option<BTreeMap<String, String>>,
}

/// Run `program` in a fresh interpreter.
///
/// Each call gets its own namespace, output buffer, input queue and file
/// backend; only the capability table is shared.
pub fn execute(
    program: &Program,
    inputs: Vec<String>,
    capabilities: Arc<Capabilities>,
    options: &ExecutionOptions,
    cancel: Option<CancelToken>,
) -> ExecutionResult {
    let mut interpreter = Interpreter::new(capabilities, options, inputs, cancel);
    let outcome = interpreter.run(program);

    let files = interpreter.files().memory_files().map(|files| {
        files
            .iter()
            .map(|(path, content)| (path.clone(), content.clone()))
            .collect()
    });
    let output = interpreter.into_output();

    match outcome {
        Ok(()) => {
            tracing::debug!(output_bytes = output.len(), "run finished");
            ExecutionResult {
                success: true,
                output,
                failure: None,
                files,
            }
        }
        Err(fault) => {
            tracing::debug!(line = fault.line, error = %fault.error, "run failed");
            ExecutionResult {
                success: false,
                output,
                failure: Some(fault),
                files,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::ExecError;
    use crate::parser::{Line, Stmt, StmtKind, parse_line};
    use crate::sandbox::SecurityRejection;
    use pretty_assertions::assert_eq;

    /// A flat program, one canonical statement per line.
    fn program(lines: &[&str]) -> Program {
        let body = lines
            .iter()
            .enumerate()
            .map(|(i, text)| match parse_line(text) {
                Ok(Line::Simple(simple)) => Stmt {
                    line: i + 1,
                    kind: StmtKind::Simple(simple),
                },
                other => panic!("not a simple statement: {:?}", other),
            })
            .collect();
        Program { body }
    }

    fn run(lines: &[&str], inputs: &[&str]) -> ExecutionResult {
        execute(
            &program(lines),
            inputs.iter().map(|s| s.to_string()).collect(),
            Arc::new(Capabilities::standard()),
            &ExecutionOptions::default(),
            None,
        )
    }

    #[test]
    fn test_success_keeps_output() {
        let result = run(&["print(\"hello\")"], &[]);
        assert!(result.success);
        assert_eq!(result.output, "hello\n");
        assert_eq!(result.failure, None);
    }

    #[test]
    fn test_failure_keeps_partial_output() {
        let result = run(&["print(1)", "x = 1 / 0", "print(2)"], &[]);
        assert!(!result.success);
        assert_eq!(result.output, "1\n");
        let fault = result.failure.unwrap();
        assert_eq!(fault.line, 2);
        assert_eq!(fault.to_string(), "Line 2: ZeroDivisionError: division by zero");
    }

    #[test]
    fn test_runs_do_not_share_state() {
        let first = run(&["x = ask()", "print(x + 1)"], &["41"]);
        assert_eq!(first.output, "42\n");
        let second = run(&["print(x)"], &[]);
        assert!(!second.success);
        assert_eq!(second.output, "");
    }

    #[test]
    fn test_rejected_import_is_a_security_failure() {
        let result = run(&["import os"], &[]);
        let fault = result.failure.unwrap();
        assert_eq!(
            fault.error,
            ExecError::Security(SecurityRejection::ModuleNotAllowed {
                module: "os".to_string()
            })
        );
    }

    #[test]
    fn test_memory_files_are_reported() {
        let result = run(&["f = open(\"out.txt\", \"w\")", "write(f, \"hi\")", "close(f)"], &[]);
        assert!(result.success);
        let files = result.files.unwrap();
        assert_eq!(files.get("out.txt").map(String::as_str), Some("hi"));
    }

    #[test]
    fn test_cancelled_before_start() {
        let token = CancelToken::new();
        token.cancel();
        let result = execute(
            &program(&["print(1)"]),
            Vec::new(),
            Arc::new(Capabilities::standard()),
            &ExecutionOptions::default(),
            Some(token),
        );
        assert_eq!(result.failure.map(|fault| fault.error), Some(ExecError::Cancelled));
        assert_eq!(result.output, "");
    }
}
