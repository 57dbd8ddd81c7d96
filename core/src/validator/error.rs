use crate::parser::ParseError;
use crate::sandbox::SecurityRejection;
use thiserror::Error;

/// A problem found in canonical text without running it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("This line could not be read: {error}")]
    Parse { line: usize, error: ParseError },

    /// A block header where a statement belongs, or the wrong header for
    /// the block.
    #[error("Expected {expected} here, but found {found}")]
    Misplaced {
        line: usize,
        expected: &'static str,
        found: &'static str,
    },

    #[error("A class can only contain functions")]
    ClassBody { line: usize },

    #[error("`return` can only be used inside a function")]
    ReturnOutsideFunction { line: usize },

    #[error("`{keyword}` can only be used inside a loop")]
    LoopControlOutsideLoop { line: usize, keyword: &'static str },

    #[error("Module `{module}` has no member `{name}`")]
    UnknownImportMember {
        line: usize,
        module: String,
        name: String,
    },

    #[error("{rejection}")]
    Security {
        line: usize,
        rejection: SecurityRejection,
    },
}

impl ValidationError {
    pub fn line(&self) -> usize {
        match self {
            ValidationError::Parse { line, .. }
            | ValidationError::Misplaced { line, .. }
            | ValidationError::ClassBody { line }
            | ValidationError::ReturnOutsideFunction { line }
            | ValidationError::LoopControlOutsideLoop { line, .. }
            | ValidationError::UnknownImportMember { line, .. }
            | ValidationError::Security { line, .. } => *line,
        }
    }

    /// Stable diagnostic code.
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::Parse { .. } => "V001",
            ValidationError::Misplaced { .. } => "V002",
            ValidationError::ClassBody { .. } => "V003",
            ValidationError::ReturnOutsideFunction { .. } => "V004",
            ValidationError::LoopControlOutsideLoop { .. } => "V005",
            ValidationError::UnknownImportMember { .. } => "V006",
            ValidationError::Security { rejection, .. } => rejection.code(),
        }
    }
}
