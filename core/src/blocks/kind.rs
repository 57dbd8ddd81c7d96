//! Block and branch kinds, and the transition table between them.

use crate::source::SourceLine;
use std::fmt;

/// A statement that opens a nested scope closed by `end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    If,
    Repeat,
    While,
    ForEach,
    Function,
    Class,
    Try,
}

/// An alternate branch of an open block, sharing its closing marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BranchKind {
    Elif,
    Else,
    Catch,
    Finally,
}

/// Why a branch keyword was refused by the open block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchRejection {
    /// The block kind takes no branches of this kind at all.
    NotAllowed,
    /// The branch comes after one that must be last.
    OutOfOrder { previous: BranchKind },
    /// The branch may appear at most once.
    Duplicate,
}

/// The closing marker, matched case-insensitively against the whole line.
pub const CLOSING_MARKER: &str = "end";

impl BlockKind {
    /// Recognize a block-opening line by its first word.
    pub fn from_line(line: &SourceLine<'_>) -> Option<BlockKind> {
        match line.keyword().as_str() {
            "if" => Some(BlockKind::If),
            "repeat" => Some(BlockKind::Repeat),
            "while" => Some(BlockKind::While),
            "function" => Some(BlockKind::Function),
            "class" => Some(BlockKind::Class),
            "try" => Some(BlockKind::Try),
            "for" => {
                let second = line.rest().split_whitespace().next().unwrap_or_default();
                second
                    .eq_ignore_ascii_case("each")
                    .then_some(BlockKind::ForEach)
            }
            _ => None,
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            BlockKind::If => "if",
            BlockKind::Repeat => "repeat",
            BlockKind::While => "while",
            BlockKind::ForEach => "for each",
            BlockKind::Function => "function",
            BlockKind::Class => "class",
            BlockKind::Try => "try",
        }
    }

    /// Loops are the only places `break` and `continue` are meaningful.
    pub fn is_loop(self) -> bool {
        matches!(self, BlockKind::Repeat | BlockKind::While | BlockKind::ForEach)
    }

    /// Decide whether `next` may follow `previous` (or the block body, when `None`).
    pub fn accepts(
        self,
        previous: Option<BranchKind>,
        next: BranchKind,
    ) -> Result<(), BranchRejection> {
        use BranchKind::*;

        match self {
            BlockKind::If => match (previous, next) {
                (None | Some(Elif), Elif | Else) => Ok(()),
                (Some(Else), Elif) => Err(BranchRejection::OutOfOrder { previous: Else }),
                (Some(Else), Else) => Err(BranchRejection::Duplicate),
                (_, Catch | Finally) => Err(BranchRejection::NotAllowed),
                (Some(Catch | Finally), Elif | Else) => Err(BranchRejection::NotAllowed),
            },
            BlockKind::Try => match (previous, next) {
                (None, Catch | Finally) => Ok(()),
                (Some(Catch), Finally) => Ok(()),
                (Some(Catch), Catch) => Err(BranchRejection::Duplicate),
                (Some(Finally), Catch) => Err(BranchRejection::OutOfOrder { previous: Finally }),
                (Some(Finally), Finally) => Err(BranchRejection::Duplicate),
                (_, Elif | Else) => Err(BranchRejection::NotAllowed),
                (Some(Elif | Else), Catch | Finally) => Err(BranchRejection::NotAllowed),
            },
            BlockKind::Repeat
            | BlockKind::While
            | BlockKind::ForEach
            | BlockKind::Function
            | BlockKind::Class => Err(BranchRejection::NotAllowed),
        }
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

impl BranchKind {
    pub fn from_line(line: &SourceLine<'_>) -> Option<BranchKind> {
        match line.keyword().as_str() {
            "elif" => Some(BranchKind::Elif),
            "else" => Some(BranchKind::Else),
            "catch" => Some(BranchKind::Catch),
            "finally" => Some(BranchKind::Finally),
            _ => None,
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            BranchKind::Elif => "elif",
            BranchKind::Else => "else",
            BranchKind::Catch => "catch",
            BranchKind::Finally => "finally",
        }
    }

    /// The block kind this branch belongs to.
    pub fn owner(self) -> BlockKind {
        match self {
            BranchKind::Elif | BranchKind::Else => BlockKind::If,
            BranchKind::Catch | BranchKind::Finally => BlockKind::Try,
        }
    }
}

impl fmt::Display for BranchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Whether a line is exactly the closing marker.
pub fn is_closing_marker(line: &SourceLine<'_>) -> bool {
    line.text.eq_ignore_ascii_case(CLOSING_MARKER)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(text: &str) -> SourceLine<'_> {
        SourceLine {
            number: 1,
            text,
            indent: 0,
        }
    }

    #[test]
    fn test_block_keywords() {
        assert_eq!(BlockKind::from_line(&line("if x > 1")), Some(BlockKind::If));
        assert_eq!(BlockKind::from_line(&line("For Each n in nums")), Some(BlockKind::ForEach));
        assert_eq!(BlockKind::from_line(&line("for n in nums")), None);
        assert_eq!(BlockKind::from_line(&line("try")), Some(BlockKind::Try));
        assert_eq!(BlockKind::from_line(&line("say \"if\"")), None);
        assert_eq!(BlockKind::from_line(&line("iffy is 3")), None);
    }

    #[test]
    fn test_if_transitions() {
        use BranchKind::*;
        assert!(BlockKind::If.accepts(None, Elif).is_ok());
        assert!(BlockKind::If.accepts(Some(Elif), Elif).is_ok());
        assert!(BlockKind::If.accepts(Some(Elif), Else).is_ok());
        assert_eq!(BlockKind::If.accepts(Some(Else), Else), Err(BranchRejection::Duplicate));
        assert_eq!(
            BlockKind::If.accepts(Some(Else), Elif),
            Err(BranchRejection::OutOfOrder { previous: Else })
        );
        assert_eq!(BlockKind::If.accepts(None, Catch), Err(BranchRejection::NotAllowed));
    }

    #[test]
    fn test_try_transitions() {
        use BranchKind::*;
        assert!(BlockKind::Try.accepts(None, Catch).is_ok());
        assert!(BlockKind::Try.accepts(None, Finally).is_ok());
        assert!(BlockKind::Try.accepts(Some(Catch), Finally).is_ok());
        assert_eq!(BlockKind::Try.accepts(Some(Catch), Catch), Err(BranchRejection::Duplicate));
        assert_eq!(
            BlockKind::Try.accepts(Some(Finally), Catch),
            Err(BranchRejection::OutOfOrder { previous: Finally })
        );
        assert_eq!(BlockKind::Try.accepts(None, Else), Err(BranchRejection::NotAllowed));
    }

    #[test]
    fn test_loops_take_no_branches() {
        for kind in [BlockKind::Repeat, BlockKind::While, BlockKind::ForEach, BlockKind::Function, BlockKind::Class] {
            assert_eq!(kind.accepts(None, BranchKind::Else), Err(BranchRejection::NotAllowed));
        }
    }
}
