//! Public error types for the TALE API.
//!
//! Stage errors (structure, transform, validation) are converted into
//! [`Diagnostic`]s before they leave the crate. Failures that happen while a
//! program runs become a [`RunError`], which always travels together with the
//! output produced before it.

use super::generate::GenerateError;
use crate::diagnostics::{Diagnostic, DiagnosticKind, security_help};
use crate::evaluator::{ErrorKind, ExecError, Fault};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Errors returned by [`Engine`](super::Engine) operations that do not
/// produce a run result.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// The program was rejected before running.
    #[error("{} problem(s) found in the program", diagnostics.len())]
    Analysis { diagnostics: Vec<Diagnostic> },

    /// The code generator refused or failed.
    #[error(transparent)]
    Generation(#[from] GenerateError),

    /// A defect in the engine itself.
    #[error("The engine failed while processing this program")]
    Internal,
}

/// Why a run did not succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Structural,
    Transform,
    Validation,
    Security,
    Runtime,
    InputExhausted,
    Timeout,
    Cancelled,
    ResourceExceeded,
    /// A defect in the engine itself.
    Internal,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureKind::Structural => "structural",
            FailureKind::Transform => "transform",
            FailureKind::Validation => "validation",
            FailureKind::Security => "security",
            FailureKind::Runtime => "runtime",
            FailureKind::InputExhausted => "input_exhausted",
            FailureKind::Timeout => "timeout",
            FailureKind::Cancelled => "cancelled",
            FailureKind::ResourceExceeded => "resource_exceeded",
            FailureKind::Internal => "internal",
        };
        f.write_str(name)
    }
}

/// The failure half of a [`RunOutcome`](super::RunOutcome).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunError {
    /// Human-readable message. Runtime failures are prefixed with their line.
    #[serde(rename = "error")]
    pub message: String,

    pub kind: FailureKind,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,

    /// A suggested fix, when there is one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,

    /// Everything analysis found, when the program never ran.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

impl RunError {
    /// Failure for a program rejected before it ran. The first diagnostic
    /// becomes the headline.
    pub fn from_diagnostics(diagnostics: Vec<Diagnostic>) -> Self {
        let first = diagnostics.first();
        let kind = match first.map(|d| d.kind) {
            Some(DiagnosticKind::Structural) => FailureKind::Structural,
            Some(DiagnosticKind::Transform) => FailureKind::Transform,
            Some(DiagnosticKind::Security) => FailureKind::Security,
            Some(DiagnosticKind::Validation) | None => FailureKind::Validation,
        };
        Self {
            message: first.map_or_else(
                || "The program could not be analyzed".to_string(),
                |d| format!("Line {}: {}", d.line, d.message),
            ),
            kind,
            line: first.map(|d| d.line),
            help: first.and_then(|d| d.help.clone()),
            diagnostics,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: FailureKind::Internal,
            line: None,
            help: None,
            diagnostics: Vec::new(),
        }
    }
}

impl From<&Fault> for RunError {
    fn from(fault: &Fault) -> Self {
        let (kind, help) = match &fault.error {
            ExecError::Runtime(error) if error.kind == ErrorKind::Name => (
                FailureKind::Runtime,
                "Did you define the variable before using it?",
            ),
            ExecError::Runtime(_) => (
                FailureKind::Runtime,
                "Check the translated program to see what went wrong.",
            ),
            ExecError::Security(rejection) => (FailureKind::Security, security_help(rejection)),
            ExecError::InputExhausted(_) => (
                FailureKind::InputExhausted,
                "Provide an input value for each `ask` line in the Inputs box before running.",
            ),
            ExecError::Timeout { .. } => (
                FailureKind::Timeout,
                "Make sure every `while` loop changes something its condition checks.",
            ),
            ExecError::Cancelled => (FailureKind::Cancelled, "The run was stopped by the host."),
            ExecError::ResourceExceeded { .. } => (
                FailureKind::ResourceExceeded,
                "Build smaller lists and text, or print less.",
            ),
        };
        Self {
            message: fault.to_string(),
            kind,
            line: Some(fault.line),
            help: Some(help.to_string()),
            diagnostics: Vec::new(),
        }
    }
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for RunError {}
