//! Expression Transformer.
//!
//! Rewrites each line of the block tree into canonical text: statement forms
//! (`x is 1`, `say x`, `add 1 to total`), expression helpers (`len xs`,
//! `upper of name`, `call f a b`) and literal spellings. Every line first
//! passes a lexical gate, so nothing outside the supported grammar reaches
//! the parser unexamined.
//!
//! Rewriting is pure and keeps a 1:1 mapping between source and canonical
//! lines.

mod error;
mod expr;
mod lexer;
mod statement;

#[cfg(test)]
mod transform_test;

pub use error::TransformError;

use crate::blocks::{Block, BlockKind, BlockNode, BlockTree, BranchKind};
use std::fmt;

/// Canonical text for one source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformedStatement {
    pub line: usize,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransformedNode {
    Block(TransformedBlock),
    Statement(TransformedStatement),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformedBlock {
    pub kind: BlockKind,
    pub header: TransformedStatement,
    pub body: Vec<TransformedNode>,
    pub branches: Vec<TransformedBranch>,
    pub end_line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformedBranch {
    pub kind: BranchKind,
    pub header: TransformedStatement,
    pub body: Vec<TransformedNode>,
}

/// A whole program in canonical text, still shaped by its blocks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransformedProgram {
    pub nodes: Vec<TransformedNode>,
}

/// Rewrite a single leaf statement.
pub fn transform_statement(line: usize, text: &str) -> Result<TransformedStatement, TransformError> {
    Ok(TransformedStatement {
        line,
        text: statement::rewrite_statement(line, text)?,
    })
}

/// Rewrite every line of a block tree, collecting all failures.
pub fn transform(tree: &BlockTree) -> Result<TransformedProgram, Vec<TransformError>> {
    let mut errors = Vec::new();
    let nodes = transform_nodes(&tree.nodes, &mut errors);

    tracing::debug!(errors = errors.len(), "transformed program");
    if errors.is_empty() {
        Ok(TransformedProgram { nodes })
    } else {
        Err(errors)
    }
}

fn transform_nodes(nodes: &[BlockNode], errors: &mut Vec<TransformError>) -> Vec<TransformedNode> {
    let mut out = Vec::with_capacity(nodes.len());
    for node in nodes {
        match node {
            BlockNode::Statement(stmt) => match transform_statement(stmt.line, &stmt.text) {
                Ok(transformed) => out.push(TransformedNode::Statement(transformed)),
                Err(err) => errors.push(err),
            },
            BlockNode::Block(block) => {
                if let Some(block) = transform_block(block, errors) {
                    out.push(TransformedNode::Block(block));
                }
            }
        }
    }
    out
}

fn transform_block(block: &Block, errors: &mut Vec<TransformError>) -> Option<TransformedBlock> {
    let header = statement::rewrite_block_header(block.kind, block.line, &block.header)
        .map_err(|err| errors.push(err))
        .ok();
    let body = transform_nodes(&block.body, errors);

    let mut branches = Vec::with_capacity(block.branches.len());
    for branch in &block.branches {
        let branch_header = statement::rewrite_branch_header(branch.kind, branch.line, &branch.header)
            .map_err(|err| errors.push(err))
            .ok();
        let branch_body = transform_nodes(&branch.body, errors);
        if let Some(text) = branch_header {
            branches.push(TransformedBranch {
                kind: branch.kind,
                header: TransformedStatement {
                    line: branch.line,
                    text,
                },
                body: branch_body,
            });
        }
    }

    Some(TransformedBlock {
        kind: block.kind,
        header: TransformedStatement {
            line: block.line,
            text: header?,
        },
        body,
        branches,
        end_line: block.end_line,
    })
}

impl TransformedProgram {
    /// Every canonical line in source order.
    pub fn statements(&self) -> Vec<&TransformedStatement> {
        fn collect<'a>(nodes: &'a [TransformedNode], out: &mut Vec<&'a TransformedStatement>) {
            for node in nodes {
                match node {
                    TransformedNode::Statement(stmt) => out.push(stmt),
                    TransformedNode::Block(block) => {
                        out.push(&block.header);
                        collect(&block.body, out);
                        for branch in &block.branches {
                            out.push(&branch.header);
                            collect(&branch.body, out);
                        }
                    }
                }
            }
        }

        let mut out = Vec::new();
        collect(&self.nodes, &mut out);
        out
    }
}

/// Indented canonical text, one line per source line plus `end` markers.
impl fmt::Display for TransformedProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn write_nodes(f: &mut fmt::Formatter<'_>, nodes: &[TransformedNode], depth: usize) -> fmt::Result {
            let pad = "    ".repeat(depth);
            for node in nodes {
                match node {
                    TransformedNode::Statement(stmt) => writeln!(f, "{}{}", pad, stmt.text)?,
                    TransformedNode::Block(block) => {
                        writeln!(f, "{}{}", pad, block.header.text)?;
                        write_nodes(f, &block.body, depth + 1)?;
                        for branch in &block.branches {
                            writeln!(f, "{}{}", pad, branch.header.text)?;
                            write_nodes(f, &branch.body, depth + 1)?;
                        }
                        writeln!(f, "{}end", pad)?;
                    }
                }
            }
            Ok(())
        }

        write_nodes(f, &self.nodes, 0)
    }
}
