//! Stack-based construction of the block tree.

use super::kind::is_closing_marker;
use super::{Block, BlockKind, BlockNode, BlockTree, Branch, BranchKind, BranchRejection, Statement, StructuralError};
use crate::api::StructureOptions;
use crate::source::{LineClass, SourceLine, SourceProgram};

/// Build the block tree for a program, or report its first structural fault.
///
/// Blank lines, comments and notes are skipped but keep their line numbers.
/// An extra `end` blames itself. A missing `end` blames the block whose
/// marker is absent: when indentation shows that an `end` closed a block
/// opened at a different depth, that block is the culprit; otherwise the
/// innermost unclosed block is.
pub fn build(program: &SourceProgram, options: &StructureOptions) -> Result<BlockTree, StructuralError> {
    let classes = program
        .classify()
        .map_err(|line| StructuralError::UnterminatedNote { line })?;

    let mut builder = Builder {
        root: Vec::new(),
        stack: Vec::new(),
        indents: Vec::new(),
        suspect: None,
        max_nesting: options.max_nesting,
    };

    for class in classes {
        if let LineClass::Code(line) = class {
            builder.feed(line)?;
        }
    }

    let tree = builder.finish()?;
    tracing::debug!(
        nodes = tree.node_count(),
        depth = tree.depth(),
        "built block tree"
    );
    Ok(tree)
}

struct Builder {
    root: Vec<BlockNode>,
    stack: Vec<Block>,
    /// Indentation of each open block's opening line, parallel to `stack`.
    indents: Vec<usize>,
    /// First block closed by an `end` indented like an outer block instead.
    suspect: Option<(BlockKind, usize)>,
    max_nesting: usize,
}

impl Builder {
    fn feed(&mut self, line: SourceLine<'_>) -> Result<(), StructuralError> {
        if is_closing_marker(&line) {
            return self.close(line.number, line.indent);
        }

        if let Some(branch) = BranchKind::from_line(&line) {
            return self.branch(branch, line);
        }

        if let Some(kind) = BlockKind::from_line(&line) {
            return self.open(kind, line);
        }

        self.push(BlockNode::Statement(Statement {
            line: line.number,
            text: line.text.to_string(),
        }));
        Ok(())
    }

    fn open(&mut self, kind: BlockKind, line: SourceLine<'_>) -> Result<(), StructuralError> {
        if self.stack.len() >= self.max_nesting {
            return Err(StructuralError::TooDeep {
                line: line.number,
                max_nesting: self.max_nesting,
            });
        }

        self.stack.push(Block {
            kind,
            line: line.number,
            header: line.text.to_string(),
            body: Vec::new(),
            branches: Vec::new(),
            end_line: line.number,
        });
        self.indents.push(line.indent);
        Ok(())
    }

    fn branch(&mut self, branch: BranchKind, line: SourceLine<'_>) -> Result<(), StructuralError> {
        let Some(top) = self.stack.last_mut() else {
            return Err(StructuralError::OrphanBranch {
                branch,
                line: line.number,
            });
        };

        let previous = top.branches.last().map(|b| b.kind);
        match top.kind.accepts(previous, branch) {
            Ok(()) => {}
            Err(BranchRejection::NotAllowed) => {
                return Err(StructuralError::BranchNotAllowed {
                    branch,
                    line: line.number,
                    kind: top.kind,
                    block_line: top.line,
                });
            }
            Err(BranchRejection::OutOfOrder { previous }) => {
                return Err(StructuralError::BranchOutOfOrder {
                    branch,
                    previous,
                    line: line.number,
                    block_line: top.line,
                });
            }
            Err(BranchRejection::Duplicate) => {
                return Err(StructuralError::DuplicateBranch {
                    branch,
                    line: line.number,
                    kind: top.kind,
                    block_line: top.line,
                });
            }
        }

        top.branches.push(Branch {
            kind: branch,
            line: line.number,
            header: line.text.to_string(),
            body: Vec::new(),
        });
        Ok(())
    }

    fn close(&mut self, line: usize, indent: usize) -> Result<(), StructuralError> {
        let mut block = self
            .stack
            .pop()
            .ok_or(StructuralError::UnexpectedEnd { line })?;
        let opened_at = self.indents.pop().unwrap_or_default();
        if self.suspect.is_none() && opened_at != indent && self.indents.last() == Some(&indent) {
            self.suspect = Some((block.kind, block.line));
        }
        block.end_line = line;
        self.push(BlockNode::Block(block));
        Ok(())
    }

    fn push(&mut self, node: BlockNode) {
        match self.stack.last_mut() {
            Some(top) => top.current_body().push(node),
            None => self.root.push(node),
        }
    }

    fn finish(self) -> Result<BlockTree, StructuralError> {
        if let Some(open) = self.stack.last() {
            let (kind, line) = self.suspect.unwrap_or((open.kind, open.line));
            return Err(StructuralError::MissingEnd { kind, line });
        }
        Ok(BlockTree { nodes: self.root })
    }
}
