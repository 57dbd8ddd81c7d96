//! Unit tests for the block structure builder.

use super::*;
use crate::api::StructureOptions;
use crate::source::SourceProgram;
use indoc::indoc;
use pretty_assertions::assert_eq;

fn build_source(source: &str) -> Result<BlockTree, StructuralError> {
    build(&SourceProgram::new(source), &StructureOptions::default())
}

fn nested(depth: usize) -> String {
    let mut lines = Vec::new();
    for level in 0..depth {
        lines.push(format!("{}if x > {}", "  ".repeat(level), level));
    }
    lines.push(format!("{}say x", "  ".repeat(depth)));
    for level in (0..depth).rev() {
        lines.push(format!("{}end", "  ".repeat(level)));
    }
    lines.join("\n")
}

// ============================================================================
// Well-formed programs
// ============================================================================

#[test]
fn test_flat_statements() {
    let tree = build_source("x is 1\n\n# note\nsay x").unwrap();
    assert_eq!(
        tree.nodes,
        vec![
            BlockNode::Statement(Statement {
                line: 1,
                text: "x is 1".to_string()
            }),
            BlockNode::Statement(Statement {
                line: 4,
                text: "say x".to_string()
            }),
        ]
    );
    assert_eq!(tree.depth(), 0);
}

#[test]
fn test_if_with_branches() {
    let tree = build_source(indoc! {r#"
        if x > 1
          say "big"
        elif x > 0
          say "small"
        else
          say "none"
        end
    "#})
    .unwrap();

    let [BlockNode::Block(block)] = tree.nodes.as_slice() else {
        panic!("expected a single block, got {:?}", tree.nodes);
    };
    assert_eq!(block.kind, BlockKind::If);
    assert_eq!(block.line, 1);
    assert_eq!(block.end_line, 7);
    assert_eq!(block.body.len(), 1);
    let kinds: Vec<_> = block.branches.iter().map(|b| (b.kind, b.line)).collect();
    assert_eq!(kinds, vec![(BranchKind::Elif, 3), (BranchKind::Else, 5)]);
    assert_eq!(block.branches[1].body[0].line(), 6);
}

#[test]
fn test_try_catch_finally() {
    let tree = build_source("try\n  x is 1 / 0\ncatch err\n  say err\nfinally\n  say 1\nend").unwrap();
    let BlockNode::Block(block) = &tree.nodes[0] else {
        panic!("expected block");
    };
    assert_eq!(block.kind, BlockKind::Try);
    let kinds: Vec<_> = block.branches.iter().map(|b| b.kind).collect();
    assert_eq!(kinds, vec![BranchKind::Catch, BranchKind::Finally]);
    assert_eq!(block.branches[0].header, "catch err");
}

#[test]
fn test_recovers_depth_of_nesting() {
    for depth in 1..=10 {
        let tree = build_source(&nested(depth)).unwrap();
        assert_eq!(tree.depth(), depth, "depth {}", depth);
    }
}

#[test]
fn test_keywords_are_case_insensitive() {
    let tree = build_source("If x > 1\n  Say x\nELSE\n  say 0\nEnd").unwrap();
    assert_eq!(tree.depth(), 1);
}

#[test]
fn test_note_lines_keep_numbering() {
    let tree = build_source("note \"\"\"\nif this were code\n\"\"\"\nrepeat 2\nsay 1\nend").unwrap();
    let BlockNode::Block(block) = &tree.nodes[0] else {
        panic!("expected block");
    };
    assert_eq!((block.kind, block.line, block.end_line), (BlockKind::Repeat, 4, 6));
}

// ============================================================================
// Structural faults
// ============================================================================

#[test]
fn test_missing_end_blames_opening_line() {
    let err = build_source("x is 1\nif x > 0\n  say \"positive\"").unwrap_err();
    assert_eq!(
        err,
        StructuralError::MissingEnd {
            kind: BlockKind::If,
            line: 2
        }
    );
    assert_eq!(err.to_string(), "Missing closing marker for if opened at line 2");
}

#[test]
fn test_removed_end_blames_its_own_block() {
    // Removing any one closing marker must blame the block it belonged to.
    let source = nested(4);
    let lines: Vec<&str> = source.lines().collect();
    let ends: Vec<usize> = (0..lines.len()).filter(|&i| lines[i].trim() == "end").collect();

    for (position, &removed) in ends.iter().enumerate() {
        let kept: Vec<&str> = lines
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != removed)
            .map(|(_, line)| *line)
            .collect();
        let err = build_source(&kept.join("\n")).unwrap_err();
        // The first `end` closes the innermost block, opened on line 4.
        let expected_line = 4 - position;
        assert_eq!(err.line(), expected_line, "removed end at index {}", removed);
    }
}

#[test]
fn test_unindented_missing_end_blames_innermost() {
    let err = build_source("while true\nif x\nsay 1\nend").unwrap_err();
    assert_eq!(
        err,
        StructuralError::MissingEnd {
            kind: BlockKind::While,
            line: 1
        }
    );
}

#[test]
fn test_extra_end_blames_itself() {
    let err = build_source("if x\nsay 1\nend\nend").unwrap_err();
    assert_eq!(err, StructuralError::UnexpectedEnd { line: 4 });
    assert_eq!(err.to_string(), "Unexpected closing marker at line 4");
}

#[test]
fn test_orphan_else() {
    let err = build_source("say 1\nelse\nsay 2").unwrap_err();
    assert_eq!(
        err,
        StructuralError::OrphanBranch {
            branch: BranchKind::Else,
            line: 2
        }
    );
    assert_eq!(err.to_string(), "`else` at line 2 does not belong to an open if block");
}

#[test]
fn test_else_after_else() {
    let err = build_source("if x\nelse\nelse\nend").unwrap_err();
    assert!(matches!(err, StructuralError::DuplicateBranch { line: 3, .. }));
}

#[test]
fn test_elif_after_else() {
    let err = build_source("if x\nelse\nelif y\nend").unwrap_err();
    assert_eq!(
        err,
        StructuralError::BranchOutOfOrder {
            branch: BranchKind::Elif,
            previous: BranchKind::Else,
            line: 3,
            block_line: 1
        }
    );
}

#[test]
fn test_catch_after_finally() {
    let err = build_source("try\nsay 1\nfinally\nsay 2\ncatch e\nend").unwrap_err();
    assert_eq!(err.to_string(), "`catch` at line 5 cannot follow `finally`");
}

#[test]
fn test_else_inside_loop() {
    let err = build_source("repeat 3\nsay 1\nelse\nend").unwrap_err();
    assert!(matches!(
        err,
        StructuralError::BranchNotAllowed {
            kind: BlockKind::Repeat,
            line: 3,
            ..
        }
    ));
}

#[test]
fn test_too_deep() {
    let options = StructureOptions { max_nesting: 3 };
    let err = build(&SourceProgram::new(&nested(4)), &options).unwrap_err();
    assert_eq!(err, StructuralError::TooDeep { line: 4, max_nesting: 3 });
}

#[test]
fn test_unterminated_note() {
    let err = build_source("say 1\nnote \"\"\"\nsay 2").unwrap_err();
    assert_eq!(err, StructuralError::UnterminatedNote { line: 2 });
}

#[test]
fn test_for_without_each_is_a_statement() {
    let tree = build_source("for x in xs").unwrap();
    assert!(matches!(tree.nodes[0], BlockNode::Statement(_)));
}
