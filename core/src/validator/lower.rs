//! Lowering canonical lines into a [`Program`], checking as we go.

use super::ValidationError;
use crate::blocks::{BlockKind, BranchKind};
use crate::parser::{
    CatchClause, CondBranch, Expr, FormatSegment, FunctionDef, Header, Line, Simple, Stmt, StmtKind, Target,
    parse_line,
};
use crate::sandbox::{self, Capabilities, SecurityRejection};
use crate::transform::{TransformedBlock, TransformedNode, TransformedStatement};
use std::rc::Rc;

pub(super) struct Lowerer<'a> {
    capabilities: &'a Capabilities,
    errors: Vec<ValidationError>,
    in_function: bool,
    in_loop: bool,
}

impl<'a> Lowerer<'a> {
    pub(super) fn new(capabilities: &'a Capabilities) -> Self {
        Self {
            capabilities,
            errors: Vec::new(),
            in_function: false,
            in_loop: false,
        }
    }

    /// Every error found, ordered by line.
    pub(super) fn finish(mut self) -> Vec<ValidationError> {
        self.errors.sort_by_key(ValidationError::line);
        self.errors
    }

    pub(super) fn nodes(&mut self, nodes: &[TransformedNode]) -> Vec<Stmt> {
        nodes
            .iter()
            .filter_map(|node| match node {
                TransformedNode::Statement(stmt) => self.statement(stmt),
                TransformedNode::Block(block) => self.block(block),
            })
            .collect()
    }

    /// Lower `nodes` with the given function and loop context.
    fn nested(&mut self, nodes: &[TransformedNode], in_function: bool, in_loop: bool) -> Vec<Stmt> {
        let saved = (self.in_function, self.in_loop);
        self.in_function = in_function;
        self.in_loop = in_loop;
        let body = self.nodes(nodes);
        (self.in_function, self.in_loop) = saved;
        body
    }

    fn parse(&mut self, stmt: &TransformedStatement) -> Option<Line> {
        match parse_line(&stmt.text) {
            Ok(line) => Some(line),
            Err(error) => {
                tracing::debug!(line = stmt.line, text = %stmt.text, %error, "canonical line did not parse");
                self.errors.push(ValidationError::Parse { line: stmt.line, error });
                None
            }
        }
    }

    fn misplaced(&mut self, line: usize, expected: &'static str, found: &Line) {
        let found = match found {
            Line::Simple(_) => "a statement",
            Line::Header(header) => header_phrase(header),
        };
        self.errors.push(ValidationError::Misplaced { line, expected, found });
    }

    // ============================================================================
    // Statements
    // ============================================================================

    fn statement(&mut self, stmt: &TransformedStatement) -> Option<Stmt> {
        match self.parse(stmt)? {
            Line::Simple(simple) => {
                self.simple(stmt.line, &simple);
                Some(Stmt {
                    line: stmt.line,
                    kind: StmtKind::Simple(simple),
                })
            }
            other => {
                self.misplaced(stmt.line, "a statement", &other);
                None
            }
        }
    }

    fn simple(&mut self, line: usize, simple: &Simple) {
        match simple {
            Simple::Assign { targets, value } => {
                for target in targets {
                    self.target(line, target);
                }
                self.expr(line, value);
            }
            Simple::AugAssign { target, value, .. } => {
                self.target(line, target);
                self.expr(line, value);
            }
            Simple::Expr(expr) | Simple::Raise(Some(expr)) => self.expr(line, expr),
            Simple::Raise(None) | Simple::Pass => {}
            Simple::Return(value) => {
                if !self.in_function {
                    self.errors.push(ValidationError::ReturnOutsideFunction { line });
                }
                if let Some(value) = value {
                    self.expr(line, value);
                }
            }
            Simple::Break | Simple::Continue => {
                if !self.in_loop {
                    let keyword = if matches!(simple, Simple::Break) { "break" } else { "continue" };
                    self.errors.push(ValidationError::LoopControlOutsideLoop { line, keyword });
                }
            }
            Simple::Import(modules) => {
                for module in modules {
                    self.security(line, sandbox::check_import(module, self.capabilities));
                }
            }
            Simple::FromImport { module, names } => {
                let capabilities = self.capabilities;
                let spec = match sandbox::check_import(module, capabilities) {
                    Ok(()) => capabilities.module(module),
                    Err(rejection) => {
                        self.security(line, Err(rejection));
                        None
                    }
                };
                for name in names {
                    self.name(line, name);
                    if spec.is_some_and(|spec| spec.member(name).is_none()) {
                        self.errors.push(ValidationError::UnknownImportMember {
                            line,
                            module: module.clone(),
                            name: name.clone(),
                        });
                    }
                }
            }
            Simple::Global(names) => {
                for name in names {
                    self.name(line, name);
                }
            }
        }
    }

    fn target(&mut self, line: usize, target: &Target) {
        match target {
            Target::Name(name) => self.name(line, name),
            Target::Field { value, field } => {
                self.expr(line, value);
                self.attribute(line, value, field);
            }
            Target::Index { value, index } => {
                self.expr(line, value);
                self.expr(line, index);
            }
        }
    }

    // ============================================================================
    // Blocks
    // ============================================================================

    fn block(&mut self, block: &TransformedBlock) -> Option<Stmt> {
        let header = self.parse(&block.header);
        let line = block.header.line;

        match block.kind {
            BlockKind::If => {
                let body = self.nodes(&block.body);
                let mut branches = Vec::new();
                let mut else_body = None;
                match header {
                    Some(Line::Header(Header::If(condition))) => {
                        self.expr(line, &condition);
                        branches.push(CondBranch { line, condition, body });
                    }
                    Some(other) => self.misplaced(line, "an `if` header", &other),
                    None => {}
                }
                for branch in &block.branches {
                    let branch_header = self.parse(&branch.header);
                    let branch_body = self.nodes(&branch.body);
                    let branch_line = branch.header.line;
                    match (branch.kind, branch_header) {
                        (BranchKind::Elif, Some(Line::Header(Header::Elif(condition)))) => {
                            self.expr(branch_line, &condition);
                            branches.push(CondBranch {
                                line: branch_line,
                                condition,
                                body: branch_body,
                            });
                        }
                        (BranchKind::Else, Some(Line::Header(Header::Else))) => else_body = Some(branch_body),
                        (kind, Some(other)) => self.misplaced(branch_line, branch_phrase(kind), &other),
                        (_, None) => {}
                    }
                }
                (!branches.is_empty()).then(|| Stmt {
                    line,
                    kind: StmtKind::If { branches, else_body },
                })
            }
            BlockKind::While => {
                let body = self.nested(&block.body, self.in_function, true);
                match header? {
                    Line::Header(Header::While(condition)) => {
                        self.expr(line, &condition);
                        Some(Stmt {
                            line,
                            kind: StmtKind::While { condition, body },
                        })
                    }
                    other => {
                        self.misplaced(line, "a `while` header", &other);
                        None
                    }
                }
            }
            BlockKind::Repeat | BlockKind::ForEach => {
                let body = self.nested(&block.body, self.in_function, true);
                match header? {
                    Line::Header(Header::For { targets, iterable }) => {
                        for target in &targets {
                            self.name(line, target);
                        }
                        self.expr(line, &iterable);
                        Some(Stmt {
                            line,
                            kind: StmtKind::For { targets, iterable, body },
                        })
                    }
                    other => {
                        self.misplaced(line, "a `for` header", &other);
                        None
                    }
                }
            }
            BlockKind::Function => {
                let body = self.nested(&block.body, true, false);
                let def = self.function(line, header?, body)?;
                Some(Stmt {
                    line,
                    kind: StmtKind::Function(def),
                })
            }
            BlockKind::Class => {
                let methods = self.class_body(&block.body);
                match header? {
                    Line::Header(Header::Class(name)) => {
                        self.name(line, &name);
                        Some(Stmt {
                            line,
                            kind: StmtKind::Class { name, methods },
                        })
                    }
                    other => {
                        self.misplaced(line, "a `class` header", &other);
                        None
                    }
                }
            }
            BlockKind::Try => {
                let body = self.nodes(&block.body);
                let mut catch = None;
                let mut finally = None;
                for branch in &block.branches {
                    let branch_header = self.parse(&branch.header);
                    let branch_body = self.nodes(&branch.body);
                    let branch_line = branch.header.line;
                    match (branch.kind, branch_header) {
                        (BranchKind::Catch, Some(Line::Header(Header::Catch(name)))) => {
                            self.name(branch_line, &name);
                            catch = Some(CatchClause {
                                line: branch_line,
                                name,
                                body: branch_body,
                            });
                        }
                        (BranchKind::Finally, Some(Line::Header(Header::Finally))) => finally = Some(branch_body),
                        (kind, Some(other)) => self.misplaced(branch_line, branch_phrase(kind), &other),
                        (_, None) => {}
                    }
                }
                match header? {
                    Line::Header(Header::Try) => Some(Stmt {
                        line,
                        kind: StmtKind::Try { body, catch, finally },
                    }),
                    other => {
                        self.misplaced(line, "a `try` header", &other);
                        None
                    }
                }
            }
        }
    }

    fn function(&mut self, line: usize, header: Line, body: Vec<Stmt>) -> Option<Rc<FunctionDef>> {
        match header {
            Line::Header(Header::Function { name, params }) => {
                self.name(line, &name);
                for param in &params {
                    self.name(line, param);
                }
                Some(Rc::new(FunctionDef {
                    line,
                    name,
                    params,
                    body,
                }))
            }
            other => {
                self.misplaced(line, "a `function` header", &other);
                None
            }
        }
    }

    /// A class body holds method definitions and `pass`, nothing else.
    fn class_body(&mut self, nodes: &[TransformedNode]) -> Vec<Rc<FunctionDef>> {
        let mut methods = Vec::new();
        for node in nodes {
            match node {
                TransformedNode::Block(block) if block.kind == BlockKind::Function => {
                    let header = self.parse(&block.header);
                    let body = self.nested(&block.body, true, false);
                    if let Some(def) = header.and_then(|header| self.function(block.header.line, header, body)) {
                        methods.push(def);
                    }
                }
                TransformedNode::Statement(stmt) if stmt.text.trim() == "pass" => {}
                TransformedNode::Statement(stmt) => self.errors.push(ValidationError::ClassBody { line: stmt.line }),
                TransformedNode::Block(block) => {
                    self.errors.push(ValidationError::ClassBody {
                        line: block.header.line,
                    });
                }
            }
        }
        methods
    }

    // ============================================================================
    // Expressions
    // ============================================================================

    fn expr(&mut self, line: usize, expr: &Expr) {
        match expr {
            Expr::Literal(_) => {}
            Expr::FormatStr(segments) => {
                for segment in segments {
                    if let FormatSegment::Expr { expr, .. } = segment {
                        self.expr(line, expr);
                    }
                }
            }
            Expr::Ident(name) => self.name(line, name),
            Expr::List(items) | Expr::Tuple(items) | Expr::Set(items) => {
                for item in items {
                    self.expr(line, item);
                }
            }
            Expr::Dict(entries) => {
                for (key, value) in entries {
                    self.expr(line, key);
                    self.expr(line, value);
                }
            }
            Expr::ListComp {
                element,
                targets,
                iterable,
                condition,
            } => {
                for target in targets {
                    self.name(line, target);
                }
                self.expr(line, iterable);
                self.expr(line, element);
                if let Some(condition) = condition {
                    self.expr(line, condition);
                }
            }
            Expr::Binary { left, right, .. }
            | Expr::Boolean { left, right, .. }
            | Expr::Comparison { left, right, .. } => {
                self.expr(line, left);
                self.expr(line, right);
            }
            Expr::Unary { expr, .. } => self.expr(line, expr),
            Expr::Call { callable, args } => {
                self.expr(line, callable);
                for arg in args {
                    self.expr(line, arg);
                }
            }
            Expr::Index { value, index } => {
                self.expr(line, value);
                self.expr(line, index);
            }
            Expr::Slice { value, start, end } => {
                self.expr(line, value);
                for bound in [start, end].into_iter().flatten() {
                    self.expr(line, bound);
                }
            }
            Expr::Field { value, field } => {
                self.expr(line, value);
                self.attribute(line, value, field);
            }
            Expr::Lambda { params, body } => {
                for param in params {
                    self.name(line, param);
                }
                self.expr(line, body);
            }
        }
    }

    fn name(&mut self, line: usize, name: &str) {
        self.security(line, sandbox::check_name(name));
    }

    fn attribute(&mut self, line: usize, value: &Expr, field: &str) {
        let receiver = match value {
            Expr::Ident(name) => Some(name.as_str()),
            _ => None,
        };
        self.security(line, sandbox::check_attribute(receiver, field));
    }

    fn security(&mut self, line: usize, result: Result<(), SecurityRejection>) {
        if let Err(rejection) = result {
            self.errors.push(ValidationError::Security { line, rejection });
        }
    }
}

fn header_phrase(header: &Header) -> &'static str {
    match header {
        Header::If(_) => "an `if` header",
        Header::Elif(_) => "an `elif` header",
        Header::Else => "an `else` header",
        Header::While(_) => "a `while` header",
        Header::For { .. } => "a `for` header",
        Header::Function { .. } => "a `function` header",
        Header::Class(_) => "a `class` header",
        Header::Try => "a `try` header",
        Header::Catch(_) => "a `catch` header",
        Header::Finally => "a `finally` header",
    }
}

fn branch_phrase(kind: BranchKind) -> &'static str {
    match kind {
        BranchKind::Elif => "an `elif` header",
        BranchKind::Else => "an `else` header",
        BranchKind::Catch => "a `catch` header",
        BranchKind::Finally => "a `finally` header",
    }
}
