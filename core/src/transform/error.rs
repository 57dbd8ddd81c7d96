use super::lexer::LexFault;
use thiserror::Error;

/// A line that could not be rewritten into canonical text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    #[error("Text is opened but never closed")]
    UnterminatedString { line: usize },

    #[error("`{open}` is opened but never closed")]
    UnclosedBracket { line: usize, open: char },

    #[error("Unexpected `{close}`")]
    UnexpectedBracket { line: usize, close: char },

    #[error("The character `{ch}` is not allowed outside text")]
    ForbiddenCharacter { line: usize, ch: char },

    #[error("Names starting with `__` are reserved: `{name}`")]
    ReservedName { line: usize, name: String },

    #[error("I could not understand: {text}")]
    NotUnderstood { line: usize, text: String },

    #[error("Wrong number of values: {text}")]
    WrongArity { line: usize, text: String },

    #[error("`{name}` is not a valid name")]
    InvalidName { line: usize, name: String },
}

impl TransformError {
    pub fn line(&self) -> usize {
        match self {
            TransformError::UnterminatedString { line }
            | TransformError::UnclosedBracket { line, .. }
            | TransformError::UnexpectedBracket { line, .. }
            | TransformError::ForbiddenCharacter { line, .. }
            | TransformError::ReservedName { line, .. }
            | TransformError::NotUnderstood { line, .. }
            | TransformError::WrongArity { line, .. }
            | TransformError::InvalidName { line, .. } => *line,
        }
    }

    pub(crate) fn from_lex(line: usize, fault: LexFault) -> Self {
        match fault {
            LexFault::UnterminatedString => TransformError::UnterminatedString { line },
            LexFault::UnclosedBracket(open) => TransformError::UnclosedBracket { line, open },
            LexFault::UnexpectedBracket(close) => TransformError::UnexpectedBracket { line, close },
            LexFault::ForbiddenCharacter(ch) => TransformError::ForbiddenCharacter { line, ch },
            LexFault::ReservedName(name) => TransformError::ReservedName { line, name },
        }
    }
}
