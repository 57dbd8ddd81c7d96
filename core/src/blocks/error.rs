use super::{BlockKind, BranchKind};
use thiserror::Error;

/// The first structural fault found in a program.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructuralError {
    /// End of input reached with a block still open. Blames the opening line.
    #[error("Missing closing marker for {kind} opened at line {line}")]
    MissingEnd { kind: BlockKind, line: usize },

    /// A closing marker with no open block.
    #[error("Unexpected closing marker at line {line}")]
    UnexpectedEnd { line: usize },

    /// A branch keyword with no block open at all.
    #[error("`{branch}` at line {line} does not belong to an open {} block", .branch.owner())]
    OrphanBranch { branch: BranchKind, line: usize },

    /// A branch keyword the innermost open block does not take.
    #[error("`{branch}` at line {line} cannot be used inside {kind} (opened at line {block_line})")]
    BranchNotAllowed {
        branch: BranchKind,
        line: usize,
        kind: BlockKind,
        block_line: usize,
    },

    /// A branch keyword after one that must come last.
    #[error("`{branch}` at line {line} cannot follow `{previous}`")]
    BranchOutOfOrder {
        branch: BranchKind,
        previous: BranchKind,
        line: usize,
        block_line: usize,
    },

    /// A branch keyword that may appear only once per block.
    #[error("{kind} block opened at line {block_line} already has a `{branch}` (line {line})")]
    DuplicateBranch {
        branch: BranchKind,
        line: usize,
        kind: BlockKind,
        block_line: usize,
    },

    /// Nesting deeper than the configured maximum.
    #[error("Blocks are nested more than {max_nesting} levels deep at line {line}")]
    TooDeep { line: usize, max_nesting: usize },

    /// A `note """` that never closes.
    #[error("Unterminated note opened at line {line}")]
    UnterminatedNote { line: usize },
}

impl StructuralError {
    /// The line the fault is attributed to.
    pub fn line(&self) -> usize {
        match self {
            StructuralError::MissingEnd { line, .. }
            | StructuralError::UnexpectedEnd { line }
            | StructuralError::OrphanBranch { line, .. }
            | StructuralError::BranchNotAllowed { line, .. }
            | StructuralError::BranchOutOfOrder { line, .. }
            | StructuralError::DuplicateBranch { line, .. }
            | StructuralError::TooDeep { line, .. }
            | StructuralError::UnterminatedNote { line } => *line,
        }
    }
}
