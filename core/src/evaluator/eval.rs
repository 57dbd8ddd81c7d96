//! Core evaluation logic.

use super::operators;
use super::{ErrorKind, ExecError, Fault, RuntimeError};
use crate::api::{Clock, ExecutionOptions};
use crate::parser::{
    BinaryOp, BoolOp, CatchClause, Expr, FormatSegment, Literal, Program, Simple, Stmt, StmtKind, Target, UnaryOp,
};
use crate::sandbox::{self, Budget, CancelToken, Capabilities, FileMode, FileSystem, InputQueue, OutputBuffer, SecurityRejection};
use crate::stdlib;
use crate::values::{BoundMethod, Class, ErrorValue, Function, FunctionBody, Instance, Key, Module, Table, Value};
use hashbrown::{HashMap, HashSet};
use rand::rngs::StdRng;
use std::rc::Rc;
use std::sync::Arc;

/// How a statement finished.
#[derive(Debug)]
enum Flow {
    Normal,
    Break,
    Continue,
    Return(Value),
}

/// The locals of one active user function call.
struct Frame {
    locals: HashMap<String, Value>,
    captured: Rc<HashMap<String, Value>>,
    declared_globals: HashSet<String>,
    /// The function being run, so nested functions can call themselves.
    function: Rc<Function>,
}

/// An assignable location with its receiver already evaluated.
enum Place {
    Name(String),
    Field(Value, String),
    Index(Value, Value),
}

/// Values produced by a `for` loop. Ranges are generated lazily; other
/// collections are snapshotted when the loop starts.
pub(crate) enum ValueIter {
    Range { next: i64, remaining: usize, step: i64 },
    Items(std::vec::IntoIter<Value>),
}

impl Iterator for ValueIter {
    type Item = Value;

    fn next(&mut self) -> Option<Value> {
        match self {
            ValueIter::Range { next, remaining, step } => {
                if *remaining == 0 {
                    return None;
                }
                *remaining -= 1;
                let value = *next;
                *next = next.wrapping_add(*step);
                Some(Value::Int(value))
            }
            ValueIter::Items(items) => items.next(),
        }
    }
}

/// Interpreter for one run of a validated program.
///
/// Everything a run can touch lives here: the capability table, the output
/// buffer, the input queue, the file shim and the budget. Nothing is shared
/// with other runs except the immutable capability table.
pub struct Interpreter {
    capabilities: Arc<Capabilities>,
    budget: Budget,
    output: OutputBuffer,
    input: InputQueue,
    files: FileSystem,
    rng: StdRng,
    clock: Clock,
    globals: HashMap<String, Value>,
    frames: Vec<Frame>,
    modules: HashMap<&'static str, Rc<Module>>,
    /// Errors being handled by enclosing `catch` blocks, for bare `raise`.
    handling: Vec<RuntimeError>,
    line: usize,
}

impl Interpreter {
    pub fn new(
        capabilities: Arc<Capabilities>,
        options: &ExecutionOptions,
        inputs: Vec<String>,
        cancel: Option<CancelToken>,
    ) -> Self {
        Self {
            capabilities,
            budget: Budget::new(
                options.timeout,
                options.max_call_depth,
                options.max_collection_len,
                cancel,
            ),
            output: OutputBuffer::new(options.max_output_bytes),
            input: InputQueue::new(inputs),
            files: FileSystem::new(&options.file_access),
            rng: stdlib::generator(options.random_seed),
            clock: options.clock,
            globals: HashMap::new(),
            frames: Vec::new(),
            modules: HashMap::new(),
            handling: Vec::new(),
            line: 0,
        }
    }

    /// Run a whole program.
    pub fn run(&mut self, program: &Program) -> Result<(), Fault> {
        self.exec_block(&program.body).map(|_| ())
    }

    /// Output produced so far.
    pub fn output(&self) -> &str {
        self.output.as_str()
    }

    pub fn into_output(self) -> String {
        self.output.into_string()
    }

    pub fn files(&self) -> &FileSystem {
        &self.files
    }

    /// The line being executed.
    pub fn line(&self) -> usize {
        self.line
    }

    // ============================================================================
    // Helpers for native functions
    // ============================================================================

    /// Wrap an error with the current line.
    pub fn fault(&self, error: impl Into<ExecError>) -> Fault {
        Fault::new(self.line, error)
    }

    /// A catchable runtime error at the current line.
    pub fn error(&self, kind: ErrorKind, message: impl Into<String>) -> Fault {
        self.fault(RuntimeError::new(kind, message))
    }

    pub fn write_output(&mut self, text: &str) -> Result<(), Fault> {
        self.output.write(text).map_err(|reached| {
            tracing::warn!(limit = reached.limit, "output limit reached");
            self.fault(ExecError::ResourceExceeded {
                what: "output size",
                limit: reached.limit,
            })
        })
    }

    /// Pop the next supplied input for `ask`.
    pub fn next_input(&mut self, prompt: Option<&str>) -> Result<Value, Fault> {
        self.input.next(prompt).map_err(|exhausted| {
            tracing::warn!(ordinal = exhausted.ordinal, "input queue exhausted");
            self.fault(exhausted)
        })
    }

    pub fn files_mut(&mut self) -> Result<&mut FileSystem, Fault> {
        if !self.files.is_enabled() {
            return Err(self.fault(SecurityRejection::FileAccessDisabled));
        }
        Ok(&mut self.files)
    }

    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    pub fn clock(&self) -> Clock {
        self.clock
    }

    /// Fail when a produced collection or text would exceed the size limit.
    pub fn check_collection_len(&self, len: usize) -> Result<(), Fault> {
        let limit = self.budget.max_collection_len;
        if len > limit {
            tracing::warn!(len, limit, "collection limit exceeded");
            return Err(self.fault(ExecError::ResourceExceeded {
                what: "collection size",
                limit,
            }));
        }
        Ok(())
    }

    /// Materialize the items of anything a `for` loop accepts.
    pub fn collect(&self, value: &Value) -> Result<Vec<Value>, Fault> {
        self.check_collection_len(value.range_len())?;
        Ok(self.iter(value)?.collect())
    }

    /// The hash key for `value`, or a TypeError.
    pub fn key_of(&self, value: &Value) -> Result<Key, Fault> {
        Key::of(value).ok_or_else(|| {
            self.error(
                ErrorKind::Type,
                format!("{} cannot be used as a dictionary key or set item", value.type_name()),
            )
        })
    }

    /// Call any callable value with positional arguments.
    pub fn call_value(&mut self, callable: &Value, mut args: Vec<Value>) -> Result<Value, Fault> {
        match callable {
            Value::Builtin(builtin) => (builtin.func)(self, args),
            Value::Function(function) => self.call_function(function, args),
            Value::BoundMethod(method) => {
                args.insert(0, method.receiver.clone());
                self.call_value(&method.method, args)
            }
            Value::Class(class) => self.instantiate(class, args),
            other => Err(self.error(
                ErrorKind::Type,
                format!("{} is not something you can call", other.type_name()),
            )),
        }
    }

    // ============================================================================
    // Statements
    // ============================================================================

    fn checkpoint(&self) -> Result<(), Fault> {
        self.budget.checkpoint().map_err(|exceeded| {
            tracing::warn!(line = self.line, ?exceeded, "run stopped by budget");
            self.fault(exceeded)
        })
    }

    fn check(&self, result: Result<(), SecurityRejection>) -> Result<(), Fault> {
        result.map_err(|rejection| self.fault(rejection))
    }

    fn exec_block(&mut self, body: &[Stmt]) -> Result<Flow, Fault> {
        for stmt in body {
            match self.exec_stmt(stmt)? {
                Flow::Normal => {}
                flow => return Ok(flow),
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_stmt(&mut self, stmt: &Stmt) -> Result<Flow, Fault> {
        self.line = stmt.line;
        self.checkpoint()?;

        match &stmt.kind {
            StmtKind::Simple(simple) => self.exec_simple(simple),
            StmtKind::If { branches, else_body } => {
                for branch in branches {
                    self.line = branch.line;
                    if self.eval(&branch.condition)?.is_truthy() {
                        return self.exec_block(&branch.body);
                    }
                }
                match else_body {
                    Some(body) => self.exec_block(body),
                    None => Ok(Flow::Normal),
                }
            }
            StmtKind::While { condition, body } => {
                loop {
                    self.line = stmt.line;
                    self.checkpoint()?;
                    if !self.eval(condition)?.is_truthy() {
                        break;
                    }
                    match self.exec_block(body)? {
                        Flow::Break => break,
                        Flow::Return(value) => return Ok(Flow::Return(value)),
                        Flow::Normal | Flow::Continue => {}
                    }
                }
                Ok(Flow::Normal)
            }
            StmtKind::For {
                targets,
                iterable,
                body,
            } => {
                let iterable = self.eval(iterable)?;
                for item in self.iter(&iterable)? {
                    self.line = stmt.line;
                    self.checkpoint()?;
                    self.bind_targets(targets, item)?;
                    match self.exec_block(body)? {
                        Flow::Break => break,
                        Flow::Return(value) => return Ok(Flow::Return(value)),
                        Flow::Normal | Flow::Continue => {}
                    }
                }
                Ok(Flow::Normal)
            }
            StmtKind::Function(def) => {
                let function = Function {
                    name: def.name.clone(),
                    params: def.params.clone(),
                    body: FunctionBody::Block(def.clone()),
                    captured: self.capture(),
                };
                self.assign(&def.name, Value::Function(Rc::new(function)));
                Ok(Flow::Normal)
            }
            StmtKind::Class { name, methods } => {
                let captured = self.capture();
                let methods = methods
                    .iter()
                    .map(|def| {
                        let method = Function {
                            name: def.name.clone(),
                            params: def.params.clone(),
                            body: FunctionBody::Block(def.clone()),
                            captured: captured.clone(),
                        };
                        (def.name.clone(), Rc::new(method))
                    })
                    .collect();
                let class = Class {
                    name: name.clone(),
                    methods,
                };
                self.assign(name, Value::Class(Rc::new(class)));
                Ok(Flow::Normal)
            }
            StmtKind::Try { body, catch, finally } => self.exec_try(body, catch.as_ref(), finally.as_deref()),
        }
    }

    fn exec_try(&mut self, body: &[Stmt], catch: Option<&CatchClause>, finally: Option<&[Stmt]>) -> Result<Flow, Fault> {
        let mut outcome = self.exec_block(body);

        let caught = match (&outcome, catch) {
            (
                Err(Fault {
                    line,
                    error: ExecError::Runtime(error),
                }),
                Some(clause),
            ) => Some((*line, error.clone(), clause)),
            _ => None,
        };
        if let Some((fault_line, error, clause)) = caught {
            tracing::debug!(line = fault_line, kind = %error.kind, "caught runtime error");
            self.line = clause.line;
            let value = ErrorValue::new(error.kind.to_string(), error.message.clone());
            self.assign(&clause.name, Value::Error(Rc::new(value)));
            self.handling.push(error);
            outcome = self.exec_block(&clause.body);
            self.handling.pop();
        }

        // Budget, security and input failures end the run at once.
        if let Err(fault) = &outcome {
            if !fault.error.is_catchable() {
                return outcome;
            }
        }
        if let Some(finally) = finally {
            match self.exec_block(finally)? {
                Flow::Normal => {}
                flow => return Ok(flow),
            }
        }
        outcome
    }

    fn exec_simple(&mut self, simple: &Simple) -> Result<Flow, Fault> {
        match simple {
            Simple::Assign { targets, value } => {
                let value = self.eval(value)?;
                if let [target] = targets.as_slice() {
                    self.assign_target(target, value)?;
                } else {
                    let values = self.unpack(value, targets.len())?;
                    for (target, value) in targets.iter().zip(values) {
                        self.assign_target(target, value)?;
                    }
                }
            }
            Simple::AugAssign { target, op, value } => {
                let place = self.resolve(target)?;
                let current = self.read_place(&place)?;
                let operand = self.eval(value)?;
                let updated = self.binary(*op, &current, &operand)?;
                self.write_place(place, updated)?;
            }
            Simple::Expr(expr) => {
                self.eval(expr)?;
            }
            Simple::Return(value) => {
                let value = match value {
                    Some(expr) => self.eval(expr)?,
                    None => Value::None,
                };
                return Ok(Flow::Return(value));
            }
            Simple::Raise(value) => return Err(self.raise(value.as_ref())?),
            Simple::Break => return Ok(Flow::Break),
            Simple::Continue => return Ok(Flow::Continue),
            Simple::Pass => {}
            Simple::Import(modules) => {
                for name in modules {
                    let module = self.import(name)?;
                    self.assign(name, Value::Module(module));
                }
            }
            Simple::FromImport { module, names } => {
                let imported = self.import(module)?;
                for name in names {
                    let member = imported.members.get(name).cloned().ok_or_else(|| {
                        self.error(
                            ErrorKind::Name,
                            format!("module `{}` has no member `{}`", module, name),
                        )
                    })?;
                    self.assign(name, member);
                }
            }
            Simple::Global(names) => {
                if let Some(frame) = self.frames.last_mut() {
                    frame.declared_globals.extend(names.iter().cloned());
                }
            }
        }
        Ok(Flow::Normal)
    }

    fn raise(&mut self, value: Option<&Expr>) -> Result<Fault, Fault> {
        let raised = |message: String| RuntimeError::new(ErrorKind::Raised("Error".to_string()), message);
        let error = match value {
            None => match self.handling.last() {
                Some(error) => error.clone(),
                None => raised("`raise` without a value can only be used inside a catch block".to_string()),
            },
            Some(expr) => match self.eval(expr)? {
                Value::Error(error) => RuntimeError::new(ErrorKind::Raised(error.kind.clone()), error.message.clone()),
                other => raised(other.to_display_string()),
            },
        };
        Ok(self.fault(error))
    }

    fn import(&mut self, name: &str) -> Result<Rc<Module>, Fault> {
        self.check(sandbox::check_import(name, &self.capabilities))?;
        self.module(name).ok_or_else(|| {
            self.fault(SecurityRejection::ModuleNotAllowed {
                module: name.to_string(),
            })
        })
    }

    /// The module instance for this run, created on first use.
    fn module(&mut self, name: &str) -> Option<Rc<Module>> {
        if let Some(module) = self.modules.get(name) {
            return Some(module.clone());
        }
        let spec = *self.capabilities.module(name)?;
        let module = Rc::new(spec.instantiate());
        self.modules.insert(spec.name, module.clone());
        Some(module)
    }

    // ============================================================================
    // Names and assignment
    // ============================================================================

    fn lookup(&mut self, name: &str) -> Result<Value, Fault> {
        self.check(sandbox::check_name(name))?;

        if let Some(frame) = self.frames.last() {
            if !frame.declared_globals.contains(name) {
                if let Some(value) = frame.locals.get(name).or_else(|| frame.captured.get(name)) {
                    return Ok(value.clone());
                }
            }
        }
        if let Some(value) = self.globals.get(name) {
            return Ok(value.clone());
        }
        if let Some(frame) = self.frames.last() {
            if frame.function.name == name {
                return Ok(Value::Function(frame.function.clone()));
            }
        }
        if let Some(builtin) = self.capabilities.builtin(name) {
            return Ok(Value::Builtin(builtin));
        }
        if let Some(module) = self.module(name) {
            return Ok(Value::Module(module));
        }
        Err(self.error(ErrorKind::Name, format!("`{}` is not defined", name)))
    }

    fn assign(&mut self, name: &str, value: Value) {
        match self.frames.last_mut() {
            Some(frame) if !frame.declared_globals.contains(name) => {
                frame.locals.insert(name.to_string(), value);
            }
            _ => {
                self.globals.insert(name.to_string(), value);
            }
        }
    }

    /// Snapshot of the variables a function or lambda created here can see.
    fn capture(&self) -> Rc<HashMap<String, Value>> {
        match self.frames.last() {
            None => Rc::new(HashMap::new()),
            Some(frame) => {
                let mut captured = (*frame.captured).clone();
                captured.extend(frame.locals.iter().map(|(name, value)| (name.clone(), value.clone())));
                Rc::new(captured)
            }
        }
    }

    fn bind_targets(&mut self, targets: &[String], item: Value) -> Result<(), Fault> {
        if let [name] = targets {
            self.assign(name, item);
            return Ok(());
        }
        let values = self.unpack(item, targets.len())?;
        for (name, value) in targets.iter().zip(values) {
            self.assign(name, value);
        }
        Ok(())
    }

    fn unpack(&self, value: Value, count: usize) -> Result<Vec<Value>, Fault> {
        let values = self.collect(&value)?;
        if values.len() != count {
            return Err(self.error(
                ErrorKind::Value,
                format!("expected {} values to unpack but got {}", count, values.len()),
            ));
        }
        Ok(values)
    }

    fn assign_target(&mut self, target: &Target, value: Value) -> Result<(), Fault> {
        let place = self.resolve(target)?;
        self.write_place(place, value)
    }

    fn resolve(&mut self, target: &Target) -> Result<Place, Fault> {
        match target {
            Target::Name(name) => {
                self.check(sandbox::check_name(name))?;
                Ok(Place::Name(name.clone()))
            }
            Target::Field { value, field } => {
                self.check(sandbox::check_attribute(receiver_name(value), field))?;
                Ok(Place::Field(self.eval(value)?, field.clone()))
            }
            Target::Index { value, index } => {
                let container = self.eval(value)?;
                let index = self.eval(index)?;
                Ok(Place::Index(container, index))
            }
        }
    }

    fn read_place(&mut self, place: &Place) -> Result<Value, Fault> {
        match place {
            Place::Name(name) => self.lookup(name),
            Place::Field(value, field) => self.get_attribute(value, field),
            Place::Index(value, index) => operators::index(value, index).map_err(|err| self.fault(err)),
        }
    }

    fn write_place(&mut self, place: Place, value: Value) -> Result<(), Fault> {
        match place {
            Place::Name(name) => {
                self.assign(&name, value);
                Ok(())
            }
            Place::Field(Value::Instance(instance), field) => {
                instance.fields.borrow_mut().insert(field, value);
                Ok(())
            }
            Place::Field(other, field) => Err(self.error(
                ErrorKind::Attribute,
                format!("cannot set `{}` on {}", field, other.type_name()),
            )),
            Place::Index(Value::List(items), index) => {
                let position = match index {
                    Value::Int(n) => n,
                    other => {
                        return Err(self.error(
                            ErrorKind::Type,
                            format!("indexes must be whole numbers, not {}", other.type_name()),
                        ));
                    }
                };
                let mut items = items.borrow_mut();
                let len = items.len();
                match operators::normalize_index(position, len) {
                    Some(i) => {
                        items[i] = value;
                        Ok(())
                    }
                    None => Err(self.error(
                        ErrorKind::Index,
                        format!("index {} is out of range for a collection of length {}", position, len),
                    )),
                }
            }
            Place::Index(Value::Dict(table), key) => {
                let hashed = self.key_of(&key)?;
                table.borrow_mut().insert(hashed, key, value);
                Ok(())
            }
            Place::Index(other, _) => Err(self.error(
                ErrorKind::Type,
                format!("{} does not support item assignment", other.type_name()),
            )),
        }
    }

    // ============================================================================
    // Expressions
    // ============================================================================

    pub(crate) fn eval(&mut self, expr: &Expr) -> Result<Value, Fault> {
        match expr {
            Expr::Literal(literal) => Ok(match literal {
                Literal::Int(n) => Value::Int(*n),
                Literal::Float(x) => Value::Float(*x),
                Literal::Str(s) => Value::str(s.as_str()),
                Literal::Bool(b) => Value::Bool(*b),
                Literal::None => Value::None,
            }),
            Expr::FormatStr(segments) => self.format(segments),
            Expr::Ident(name) => self.lookup(name),
            Expr::List(items) => Ok(Value::list(self.eval_all(items)?)),
            Expr::Tuple(items) => Ok(Value::tuple(self.eval_all(items)?)),
            Expr::Set(items) => {
                let items = self.eval_all(items)?;
                self.make_set(items)
            }
            Expr::Dict(entries) => {
                let mut table = Table::new();
                for (key, value) in entries {
                    let key = self.eval(key)?;
                    let value = self.eval(value)?;
                    let hashed = self.key_of(&key)?;
                    table.insert(hashed, key, value);
                }
                Ok(Value::dict(table))
            }
            Expr::ListComp {
                element,
                targets,
                iterable,
                condition,
            } => {
                let iterable = self.eval(iterable)?;
                let mut results = Vec::new();
                for item in self.iter(&iterable)? {
                    self.checkpoint()?;
                    self.bind_targets(targets, item)?;
                    if let Some(condition) = condition {
                        if !self.eval(condition)?.is_truthy() {
                            continue;
                        }
                    }
                    results.push(self.eval(element)?);
                    self.check_collection_len(results.len())?;
                }
                Ok(Value::list(results))
            }
            Expr::Binary { op, left, right } => {
                let left = self.eval(left)?;
                let right = self.eval(right)?;
                self.binary(*op, &left, &right)
            }
            Expr::Boolean { op, left, right } => {
                let left = self.eval(left)?;
                match (op, left.is_truthy()) {
                    (BoolOp::And, false) | (BoolOp::Or, true) => Ok(left),
                    _ => self.eval(right),
                }
            }
            Expr::Comparison { op, left, right } => {
                let left = self.eval(left)?;
                let right = self.eval(right)?;
                operators::compare(*op, &left, &right).map_err(|err| self.fault(err))
            }
            Expr::Unary { op, expr } => {
                let value = self.eval(expr)?;
                match (op, value) {
                    (UnaryOp::Not, value) => Ok(Value::Bool(!value.is_truthy())),
                    (UnaryOp::Neg, Value::Int(n)) => Ok(Value::Int(n.wrapping_neg())),
                    (UnaryOp::Neg, Value::Float(x)) => Ok(Value::Float(-x)),
                    (UnaryOp::Neg, other) => Err(self.error(
                        ErrorKind::Type,
                        format!("cannot make {} negative", other.type_name()),
                    )),
                }
            }
            Expr::Call { callable, args } => {
                let callable = self.eval(callable)?;
                let args = self.eval_all(args)?;
                self.call_value(&callable, args)
            }
            Expr::Index { value, index } => {
                let value = self.eval(value)?;
                let index = self.eval(index)?;
                operators::index(&value, &index).map_err(|err| self.fault(err))
            }
            Expr::Slice { value, start, end } => {
                let value = self.eval(value)?;
                let start = match start {
                    Some(start) => Some(self.eval(start)?),
                    None => None,
                };
                let end = match end {
                    Some(end) => Some(self.eval(end)?),
                    None => None,
                };
                operators::slice(&value, start.as_ref(), end.as_ref()).map_err(|err| self.fault(err))
            }
            Expr::Field { value, field } => {
                self.check(sandbox::check_attribute(receiver_name(value), field))?;
                let value = self.eval(value)?;
                self.get_attribute(&value, field)
            }
            Expr::Lambda { params, body } => Ok(Value::Function(Rc::new(Function {
                name: "lambda".to_string(),
                params: params.clone(),
                body: FunctionBody::Lambda(body.clone()),
                captured: self.capture(),
            }))),
        }
    }

    fn eval_all(&mut self, exprs: &[Expr]) -> Result<Vec<Value>, Fault> {
        exprs.iter().map(|expr| self.eval(expr)).collect()
    }

    fn binary(&self, op: BinaryOp, left: &Value, right: &Value) -> Result<Value, Fault> {
        operators::binary(op, left, right, self.budget.max_collection_len).map_err(|err| self.fault(err))
    }

    fn make_set(&self, items: Vec<Value>) -> Result<Value, Fault> {
        Table::from_values(items).map(Value::set).map_err(|item| {
            self.error(
                ErrorKind::Type,
                format!("{} cannot be used as a set item", item.type_name()),
            )
        })
    }

    fn format(&mut self, segments: &[FormatSegment]) -> Result<Value, Fault> {
        let mut text = String::new();
        for segment in segments {
            match segment {
                FormatSegment::Text(literal) => text.push_str(literal),
                FormatSegment::Expr { expr, precision } => {
                    let value = self.eval(expr)?;
                    match (precision, &value) {
                        (Some(digits), Value::Int(n)) => text.push_str(&format!("{:.*}", *digits, *n as f64)),
                        (Some(digits), Value::Float(x)) => text.push_str(&format!("{:.*}", *digits, x)),
                        _ => text.push_str(&value.to_display_string()),
                    }
                }
            }
        }
        self.check_collection_len(text.len())?;
        Ok(Value::str(text))
    }

    /// Attribute lookup on any value.
    pub fn get_attribute(&self, value: &Value, name: &str) -> Result<Value, Fault> {
        let found = match value {
            Value::Instance(instance) => {
                let field = instance.fields.borrow().get(name).cloned();
                field.or_else(|| {
                    instance
                        .class
                        .methods
                        .get(name)
                        .map(|method| bound(name, value.clone(), Value::Function(method.clone())))
                })
            }
            Value::Class(class) => class.methods.get(name).map(|method| Value::Function(method.clone())),
            Value::Module(module) => module.members.get(name).cloned(),
            Value::Error(error) => match name {
                "message" => Some(Value::str(error.message.as_str())),
                "kind" => Some(Value::str(error.kind.as_str())),
                _ => None,
            },
            other => stdlib::method(other, name).map(|builtin| bound(name, value.clone(), Value::Builtin(builtin))),
        };

        found.ok_or_else(|| {
            let message = match value {
                Value::Module(module) => format!("module `{}` has no member `{}`", module.name, name),
                other => format!("{} has no attribute `{}`", other.type_name(), name),
            };
            self.error(ErrorKind::Attribute, message)
        })
    }

    /// Iterate anything a `for` loop accepts.
    pub(crate) fn iter(&self, value: &Value) -> Result<ValueIter, Fault> {
        let items: Vec<Value> = match value {
            Value::Range { start, step, .. } => {
                return Ok(ValueIter::Range {
                    next: *start,
                    remaining: value.range_len(),
                    step: *step,
                });
            }
            Value::List(items) => items.borrow().clone(),
            Value::Tuple(items) => items.to_vec(),
            Value::Str(text) => text.chars().map(|c| Value::str(c.to_string())).collect(),
            Value::Dict(table) => table.borrow().keys().cloned().collect(),
            Value::Set(table) => table.borrow().keys().cloned().collect(),
            Value::File(handle) => {
                let handle = handle.borrow();
                if handle.closed {
                    return Err(self.error(ErrorKind::File, format!("the file \"{}\" is closed", handle.path)));
                }
                if handle.mode != FileMode::Read {
                    return Err(self.error(
                        ErrorKind::File,
                        format!("the file \"{}\" was not opened for reading", handle.path),
                    ));
                }
                handle.content.lines().map(Value::from).collect()
            }
            other => {
                return Err(self.error(ErrorKind::Type, format!("cannot loop over {}", other.type_name())));
            }
        };
        Ok(ValueIter::Items(items.into_iter()))
    }

    // ============================================================================
    // Calls
    // ============================================================================

    fn call_function(&mut self, function: &Rc<Function>, args: Vec<Value>) -> Result<Value, Fault> {
        if args.len() != function.arity() {
            return Err(self.error(
                ErrorKind::Type,
                format!(
                    "`{}` expects {} argument{} but got {}",
                    function.name,
                    function.arity(),
                    if function.arity() == 1 { "" } else { "s" },
                    args.len()
                ),
            ));
        }
        let limit = self.budget.max_call_depth;
        if self.frames.len() >= limit {
            tracing::warn!(limit, function = %function.name, "call depth limit reached");
            return Err(self.fault(ExecError::ResourceExceeded {
                what: "call depth",
                limit,
            }));
        }
        self.checkpoint()?;

        self.frames.push(Frame {
            locals: function.params.iter().cloned().zip(args).collect(),
            captured: function.captured.clone(),
            declared_globals: HashSet::new(),
            function: function.clone(),
        });
        let call_line = self.line;
        let result = match &function.body {
            FunctionBody::Block(def) => self.exec_block(&def.body).map(|flow| match flow {
                Flow::Return(value) => value,
                _ => Value::None,
            }),
            FunctionBody::Lambda(body) => self.eval(body),
        };
        self.frames.pop();
        self.line = call_line;
        result
    }

    fn instantiate(&mut self, class: &Rc<Class>, args: Vec<Value>) -> Result<Value, Fault> {
        let instance = Value::Instance(Rc::new(Instance::new(class.clone())));
        match class.methods.get("init") {
            Some(init) => {
                let mut full = Vec::with_capacity(args.len() + 1);
                full.push(instance.clone());
                full.extend(args);
                self.call_function(init, full)?;
            }
            None if !args.is_empty() => {
                return Err(self.error(
                    ErrorKind::Type,
                    format!("`{}` has no init function, so it takes no arguments", class.name),
                ));
            }
            None => {}
        }
        Ok(instance)
    }
}

fn bound(name: &str, receiver: Value, method: Value) -> Value {
    Value::BoundMethod(Rc::new(BoundMethod {
        name: name.to_string(),
        receiver,
        method,
    }))
}

/// The receiver's name when it is a plain identifier, for the security check.
fn receiver_name(expr: &Expr) -> Option<&str> {
    match expr {
        Expr::Ident(name) => Some(name),
        _ => None,
    }
}
