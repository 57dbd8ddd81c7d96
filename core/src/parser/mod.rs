pub mod ast;
pub mod error;
pub mod parser;

pub use ast::{
    BinaryOp, BoolOp, CatchClause, ComparisonOp, CondBranch, Expr, FormatSegment, FunctionDef,
    Header, Line, Literal, Program, Simple, Stmt, StmtKind, Target, UnaryOp,
};
pub use error::{ParseError, ParseErrorKind};
pub use parser::{CanonicalParser, Rule, parse_expression, parse_line};
