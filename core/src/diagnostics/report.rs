//! Conversion of stage errors into [`Diagnostic`]s.

use super::{Diagnostic, DiagnosticKind};
use crate::blocks::StructuralError;
use crate::sandbox::SecurityRejection;
use crate::transform::TransformError;
use crate::validator::ValidationError;

/// Errors that can be shown to users as a line-numbered diagnostic.
pub trait IntoDiagnostic {
    fn to_diagnostic(&self) -> Diagnostic;
}

impl IntoDiagnostic for StructuralError {
    fn to_diagnostic(&self) -> Diagnostic {
        let (code, help) = match self {
            StructuralError::MissingEnd { .. } => ("S001", "Add an `end` line to close this block."),
            StructuralError::UnexpectedEnd { .. } => (
                "S002",
                "Remove this `end`, or check that every block above it is closed only once.",
            ),
            StructuralError::OrphanBranch { .. } => (
                "S003",
                "Put this line inside the block it belongs to, before that block's `end`.",
            ),
            StructuralError::BranchNotAllowed { .. } => (
                "S004",
                "`elif` and `else` go with `if`; `catch` and `finally` go with `try`.",
            ),
            StructuralError::BranchOutOfOrder { .. } => ("S005", "`else` and `finally` must be the last branch."),
            StructuralError::DuplicateBranch { .. } => ("S006", "Keep only one of these branches."),
            StructuralError::TooDeep { .. } => ("S007", "Split the deepest part into a function."),
            StructuralError::UnterminatedNote { .. } => ("S008", "End the note with a line ending in `\"\"\"`."),
        };
        let diagnostic = Diagnostic::error(DiagnosticKind::Structural, code, self.line(), self.to_string()).with_help(help);
        match self {
            StructuralError::BranchNotAllowed { kind, block_line, .. } => {
                diagnostic.with_related(*block_line, format!("{} block opened here", kind))
            }
            StructuralError::BranchOutOfOrder { block_line, .. } | StructuralError::DuplicateBranch { block_line, .. } => {
                diagnostic.with_related(*block_line, "block opened here")
            }
            _ => diagnostic,
        }
    }
}

impl IntoDiagnostic for TransformError {
    fn to_diagnostic(&self) -> Diagnostic {
        let (code, help) = match self {
            TransformError::UnterminatedString { .. } => ("T001", "Close the text with a matching quote."),
            TransformError::UnclosedBracket { .. } => ("T002", "Add the matching closing bracket."),
            TransformError::UnexpectedBracket { .. } => ("T003", "Remove the extra bracket or add its opening partner."),
            TransformError::ForbiddenCharacter { .. } => ("T004", "Remove the character, or put it inside quotes."),
            TransformError::ReservedName { .. } => ("T005", "Choose a name that does not start with `__`."),
            TransformError::NotUnderstood { .. } => (
                "T006",
                "I could not understand the TALE syntax; check if/else/end, assignments, and helpers.",
            ),
            TransformError::WrongArity { .. } => ("T007", "Check how many values this statement needs."),
            TransformError::InvalidName { .. } => ("T008", "Names use letters, digits and `_`, and cannot start with a digit."),
        };
        Diagnostic::error(DiagnosticKind::Transform, code, self.line(), self.to_string()).with_help(help)
    }
}

impl IntoDiagnostic for ValidationError {
    fn to_diagnostic(&self) -> Diagnostic {
        if let ValidationError::Security { line, rejection } = self {
            return security_diagnostic(*line, rejection);
        }
        let help = match self {
            ValidationError::Parse { .. } => "Ensure TALE lines follow the documented patterns.",
            ValidationError::Misplaced { .. } => "Check that block keywords open blocks and every other line is a statement.",
            ValidationError::ClassBody { .. } => "Move this line into a function inside the class, such as `init`.",
            ValidationError::ReturnOutsideFunction { .. } => "Use `return` only inside a `function` block.",
            ValidationError::LoopControlOutsideLoop { .. } => {
                "Use `break` and `continue` only inside `repeat`, `while` or `for each`."
            }
            ValidationError::UnknownImportMember { .. } => "Check the spelling, or import the module and use `module.name`.",
            ValidationError::Security { .. } => "",
        };
        Diagnostic::error(DiagnosticKind::Validation, self.code(), self.line(), self.to_string()).with_help(help)
    }
}

/// Help text for a security rejection.
pub fn security_help(rejection: &SecurityRejection) -> &'static str {
    match rejection {
        SecurityRejection::ModuleNotAllowed { .. } => "Only math, random, datetime, json and csv can be imported.",
        SecurityRejection::PrivateAttribute { .. } => "Names starting with `_` are internal and cannot be used.",
        SecurityRejection::RestrictedObject { .. } => "TALE programs cannot reach the system.",
        SecurityRejection::ForbiddenName { .. } => "Use the TALE statement for this instead, such as `ask`.",
        SecurityRejection::FileAccessDisabled => "This host does not allow programs to use files.",
    }
}

fn security_diagnostic(line: usize, rejection: &SecurityRejection) -> Diagnostic {
    Diagnostic::error(DiagnosticKind::Security, rejection.code(), line, rejection.to_string())
        .with_help(security_help(rejection))
}

/// Order diagnostics by line, keeping the original order within a line.
pub fn sort_diagnostics(diagnostics: &mut [Diagnostic]) {
    diagnostics.sort_by_key(|diagnostic| diagnostic.line);
}
