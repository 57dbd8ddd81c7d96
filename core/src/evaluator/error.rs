//! Runtime errors.
//!
//! # Error Categories
//!
//! - **Runtime errors**: faults of the program's own logic (division by zero,
//!   a missing key, a user `raise`). These can be handled by `try`/`catch`.
//!
//! - **Everything else**: security rejections, input exhaustion, the time
//!   budget and resource limits. These end the run and cannot be caught, so a
//!   program cannot hide them behind a `catch`.

use crate::sandbox::{BudgetExceeded, InputExhausted, SecurityRejection};
use crate::values::{MAX_COMPARE_DEPTH, NestingTooDeep};
use std::fmt;
use thiserror::Error;

/// The class of a runtime error, shown to users as e.g. `TypeError`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    Type,
    Value,
    Name,
    Index,
    Key,
    ZeroDivision,
    Attribute,
    File,
    /// Raised by the program itself, with the kind it chose.
    Raised(String),
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Type => f.write_str("TypeError"),
            ErrorKind::Value => f.write_str("ValueError"),
            ErrorKind::Name => f.write_str("NameError"),
            ErrorKind::Index => f.write_str("IndexError"),
            ErrorKind::Key => f.write_str("KeyError"),
            ErrorKind::ZeroDivision => f.write_str("ZeroDivisionError"),
            ErrorKind::Attribute => f.write_str("AttributeError"),
            ErrorKind::File => f.write_str("FileError"),
            ErrorKind::Raised(kind) => f.write_str(kind),
        }
    }
}

/// A fault a `catch` block can handle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct RuntimeError {
    pub kind: ErrorKind,
    pub message: String,
}

impl RuntimeError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Everything that can stop a run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecError {
    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    #[error(transparent)]
    Security(#[from] SecurityRejection),

    #[error(transparent)]
    InputExhausted(#[from] InputExhausted),

    #[error("The program ran for more than {limit_ms} ms and was stopped. Check for a loop that never ends.")]
    Timeout { limit_ms: u64 },

    #[error("The run was cancelled")]
    Cancelled,

    #[error("The program exceeded the {what} limit of {limit}")]
    ResourceExceeded { what: &'static str, limit: usize },
}

impl ExecError {
    /// Only runtime errors reach `catch`.
    pub fn is_catchable(&self) -> bool {
        matches!(self, ExecError::Runtime(_))
    }
}

impl From<BudgetExceeded> for ExecError {
    fn from(exceeded: BudgetExceeded) -> Self {
        match exceeded {
            BudgetExceeded::Timeout { limit } => ExecError::Timeout {
                limit_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
            },
            BudgetExceeded::Cancelled => ExecError::Cancelled,
        }
    }
}

impl From<NestingTooDeep> for ExecError {
    fn from(_: NestingTooDeep) -> Self {
        ExecError::ResourceExceeded {
            what: "nesting depth",
            limit: MAX_COMPARE_DEPTH,
        }
    }
}

/// An error together with the source line that was running.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Line {line}: {error}")]
pub struct Fault {
    pub line: usize,
    pub error: ExecError,
}

impl Fault {
    pub fn new(line: usize, error: impl Into<ExecError>) -> Self {
        Self {
            line,
            error: error.into(),
        }
    }
}
