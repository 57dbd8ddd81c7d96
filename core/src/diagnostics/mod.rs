//! User-facing diagnostics.
//!
//! Every failure that can be found without executing a program ends up here as
//! a line-numbered [`Diagnostic`]. Stage-specific errors implement
//! [`IntoDiagnostic`] so the conversion happens once, at the API boundary.

mod report;

pub use report::{IntoDiagnostic, security_help, sort_diagnostics};

use serde::Serialize;
use std::fmt;

/// A line-numbered description of a problem, produced without side effects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// 1-based source line the problem is attributed to.
    pub line: usize,

    /// Primary diagnostic message.
    pub message: String,

    /// Severity level. The pipeline only produces errors today.
    pub severity: Severity,

    /// Which stage rejected the program.
    pub kind: DiagnosticKind,

    /// Stable code (e.g. "S001") for documentation lookup.
    pub code: &'static str,

    /// Optional hint suggesting how to fix the issue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,

    /// Related lines that provide additional context.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub related: Vec<RelatedInfo>,
}

impl Diagnostic {
    pub fn error(kind: DiagnosticKind, code: &'static str, line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
            severity: Severity::Error,
            kind,
            code,
            help: None,
            related: Vec::new(),
        }
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn with_related(mut self, line: usize, message: impl Into<String>) -> Self {
        self.related.push(RelatedInfo {
            line,
            message: message.into(),
        });
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Line {}: {} [{}]", self.line, self.message, self.code)?;
        if let Some(help) = &self.help {
            write!(f, "\nhelp: {}", help)?;
        }
        Ok(())
    }
}

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// The stage that produced a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Unmatched or unexpected block markers.
    Structural,
    /// A line the transformer does not understand.
    Transform,
    /// Canonical text that does not parse, or a statement in the wrong place.
    Validation,
    /// A disallowed import, attribute or capability.
    Security,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DiagnosticKind::Structural => "structure",
            DiagnosticKind::Transform => "syntax",
            DiagnosticKind::Validation => "validation",
            DiagnosticKind::Security => "security",
        };
        f.write_str(name)
    }
}

/// Related information for a diagnostic (e.g. "block opened here").
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelatedInfo {
    pub line: usize,
    pub message: String,
}
