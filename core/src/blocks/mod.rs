//! Block Structure Builder.
//!
//! Turns the flat list of source lines into a tree of blocks using the
//! block-opening keywords and the `end` closing marker. Alternate branches
//! (`elif`, `else`, `catch`, `finally`) attach to the innermost open block
//! without a closing marker of their own.

mod builder;
mod error;
mod kind;

#[cfg(test)]
mod builder_test;

pub use builder::build;
pub use error::StructuralError;
pub use kind::{BlockKind, BranchKind, BranchRejection, CLOSING_MARKER};

/// A node of the block tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockNode {
    Block(Block),
    Statement(Statement),
}

/// A leaf line that does not open a block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub line: usize,
    pub text: String,
}

/// A block together with its alternate branches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub kind: BlockKind,
    /// Line of the opening keyword.
    pub line: usize,
    /// Full text of the opening line.
    pub header: String,
    pub body: Vec<BlockNode>,
    pub branches: Vec<Branch>,
    /// Line of the closing marker.
    pub end_line: usize,
}

/// An `elif`/`else`/`catch`/`finally` section of a block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
    pub kind: BranchKind,
    pub line: usize,
    pub header: String,
    pub body: Vec<BlockNode>,
}

/// The root of a program's structure.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockTree {
    pub nodes: Vec<BlockNode>,
}

impl BlockNode {
    pub fn line(&self) -> usize {
        match self {
            BlockNode::Block(block) => block.line,
            BlockNode::Statement(statement) => statement.line,
        }
    }

    /// Nesting depth: 0 for a statement, 1 + deepest child for a block.
    pub fn depth(&self) -> usize {
        match self {
            BlockNode::Statement(_) => 0,
            BlockNode::Block(block) => 1 + block.children().map(BlockNode::depth).max().unwrap_or(0),
        }
    }
}

impl Block {
    /// Every child node, main body first, then each branch in source order.
    pub fn children(&self) -> impl Iterator<Item = &BlockNode> {
        self.body
            .iter()
            .chain(self.branches.iter().flat_map(|branch| branch.body.iter()))
    }

    fn current_body(&mut self) -> &mut Vec<BlockNode> {
        match self.branches.last_mut() {
            Some(branch) => &mut branch.body,
            None => &mut self.body,
        }
    }
}

impl BlockTree {
    pub fn depth(&self) -> usize {
        self.nodes.iter().map(BlockNode::depth).max().unwrap_or(0)
    }

    /// Number of nodes in the tree (blocks and statements), for logging.
    pub fn node_count(&self) -> usize {
        fn count(node: &BlockNode) -> usize {
            match node {
                BlockNode::Statement(_) => 1,
                BlockNode::Block(block) => 1 + block.children().map(count).sum::<usize>(),
            }
        }
        self.nodes.iter().map(count).sum()
    }
}
