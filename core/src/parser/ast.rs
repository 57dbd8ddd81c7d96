//! Syntax tree for canonical text.
//!
//! [`Line`] is what the grammar produces for one canonical line. [`Program`]
//! is the whole validated program, assembled from lines and the block tree,
//! and is what the evaluator runs.

use std::fmt;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    None,
}

/// A piece of an `f"..."` string.
#[derive(Debug, Clone, PartialEq)]
pub enum FormatSegment {
    Text(String),
    Expr {
        expr: Box<Expr>,
        /// Digits after the decimal point, from a `:.Nf` suffix.
        precision: Option<usize>,
    },
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BoolOp {
    And,
    Or,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ComparisonOp {
    Eq,
    Neq,
    Lt,
    Gt,
    Le,
    Ge,
    In,
    NotIn,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal),
    FormatStr(Vec<FormatSegment>),
    Ident(String),
    List(Vec<Expr>),
    Tuple(Vec<Expr>),
    Set(Vec<Expr>),
    Dict(Vec<(Expr, Expr)>),
    ListComp {
        element: Box<Expr>,
        targets: Vec<String>,
        iterable: Box<Expr>,
        condition: Option<Box<Expr>>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Boolean {
        op: BoolOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Comparison {
        op: ComparisonOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        expr: Box<Expr>,
    },
    Call {
        callable: Box<Expr>,
        args: Vec<Expr>,
    },
    Index {
        value: Box<Expr>,
        index: Box<Expr>,
    },
    Slice {
        value: Box<Expr>,
        start: Option<Box<Expr>>,
        end: Option<Box<Expr>>,
    },
    Field {
        value: Box<Expr>,
        field: String,
    },
    Lambda {
        params: Vec<String>,
        body: Rc<Expr>,
    },
}

/// The left-hand side of an assignment.
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    Name(String),
    Field { value: Expr, field: String },
    Index { value: Expr, index: Expr },
}

/// The opening line of a block or branch.
#[derive(Debug, Clone, PartialEq)]
pub enum Header {
    If(Expr),
    Elif(Expr),
    Else,
    While(Expr),
    For { targets: Vec<String>, iterable: Expr },
    Function { name: String, params: Vec<String> },
    Class(String),
    Try,
    Catch(String),
    Finally,
}

/// A statement that does not open a block.
#[derive(Debug, Clone, PartialEq)]
pub enum Simple {
    Assign { targets: Vec<Target>, value: Expr },
    AugAssign { target: Target, op: BinaryOp, value: Expr },
    Expr(Expr),
    Return(Option<Expr>),
    Raise(Option<Expr>),
    Break,
    Continue,
    Pass,
    Import(Vec<String>),
    FromImport { module: String, names: Vec<String> },
    Global(Vec<String>),
}

/// One parsed canonical line.
#[derive(Debug, Clone, PartialEq)]
pub enum Line {
    Header(Header),
    Simple(Simple),
}

/// A validated program, ready to run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub line: usize,
    pub kind: StmtKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    Simple(Simple),
    If {
        branches: Vec<CondBranch>,
        else_body: Option<Vec<Stmt>>,
    },
    While {
        condition: Expr,
        body: Vec<Stmt>,
    },
    For {
        targets: Vec<String>,
        iterable: Expr,
        body: Vec<Stmt>,
    },
    Function(Rc<FunctionDef>),
    Class {
        name: String,
        methods: Vec<Rc<FunctionDef>>,
    },
    Try {
        body: Vec<Stmt>,
        catch: Option<CatchClause>,
        finally: Option<Vec<Stmt>>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct CondBranch {
    pub line: usize,
    pub condition: Expr,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatchClause {
    pub line: usize,
    pub name: String,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    pub line: usize,
    pub name: String,
    pub params: Vec<String>,
    pub body: Vec<Stmt>,
}

impl Header {
    /// The keyword that starts this header in canonical text.
    pub fn keyword(&self) -> &'static str {
        match self {
            Header::If(_) => "if",
            Header::Elif(_) => "elif",
            Header::Else => "else",
            Header::While(_) => "while",
            Header::For { .. } => "for",
            Header::Function { .. } => "fn",
            Header::Class(_) => "class",
            Header::Try => "try",
            Header::Catch(_) => "catch",
            Header::Finally => "finally",
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::FloorDiv => "//",
            BinaryOp::Mod => "%",
            BinaryOp::Pow => "**",
        };
        f.write_str(symbol)
    }
}

impl fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            ComparisonOp::Eq => "==",
            ComparisonOp::Neq => "!=",
            ComparisonOp::Lt => "<",
            ComparisonOp::Gt => ">",
            ComparisonOp::Le => "<=",
            ComparisonOp::Ge => ">=",
            ComparisonOp::In => "in",
            ComparisonOp::NotIn => "not in",
        };
        f.write_str(symbol)
    }
}
