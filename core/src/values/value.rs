use super::function::{Builtin, Function};
use super::object::{BoundMethod, Class, ErrorValue, FileHandle, Instance, Module};
use super::table::Table;
use std::cell::RefCell;
use std::cmp::Ordering;
use std::fmt;
use std::ops::Deref;
use std::rc::Rc;
use thiserror::Error;

/// Nesting past which collection display is elided, so self-containing
/// collections still print.
const MAX_DISPLAY_DEPTH: usize = 32;

/// Nesting past which equality and ordering give up. Self-containing
/// collections reach it instead of overflowing the stack.
pub const MAX_COMPARE_DEPTH: usize = 1_000;

/// Raised when comparing collections nested deeper than [`MAX_COMPARE_DEPTH`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("collections nest more than {} levels deep", MAX_COMPARE_DEPTH)]
pub struct NestingTooDeep;

/// A runtime value.
///
/// Collections are shared and mutable through `Rc<RefCell<..>>`, matching the
/// aliasing rules beginners expect: `b is a` makes `b` and `a` the same list.
#[derive(Clone)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Rc<str>),
    List(Rc<ListCell>),
    Tuple(Rc<TupleCell>),
    Dict(Rc<DictCell>),
    Set(Rc<RefCell<Table<()>>>),
    Range { start: i64, stop: i64, step: i64 },
    Function(Rc<Function>),
    Builtin(Builtin),
    BoundMethod(Rc<BoundMethod>),
    Class(Rc<Class>),
    Instance(Rc<Instance>),
    Module(Rc<Module>),
    File(Rc<RefCell<FileHandle>>),
    Error(Rc<ErrorValue>),
}

impl Value {
    pub fn str(s: impl Into<Rc<str>>) -> Self {
        Value::Str(s.into())
    }

    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Rc::new(ListCell(RefCell::new(items))))
    }

    pub fn tuple(items: Vec<Value>) -> Self {
        Value::Tuple(Rc::new(TupleCell(items.into_boxed_slice())))
    }

    pub fn dict(table: Table<Value>) -> Self {
        Value::Dict(Rc::new(DictCell(RefCell::new(table))))
    }

    pub fn set(table: Table<()>) -> Self {
        Value::Set(Rc::new(RefCell::new(table)))
    }

    /// The name `type()` reports for this value.
    pub fn type_name(&self) -> String {
        match self {
            Value::None => "none".to_string(),
            Value::Bool(_) => "bool".to_string(),
            Value::Int(_) => "int".to_string(),
            Value::Float(_) => "float".to_string(),
            Value::Str(_) => "str".to_string(),
            Value::List(_) => "list".to_string(),
            Value::Tuple(_) => "tuple".to_string(),
            Value::Dict(_) => "dict".to_string(),
            Value::Set(_) => "set".to_string(),
            Value::Range { .. } => "range".to_string(),
            Value::Function(_) | Value::Builtin(_) | Value::BoundMethod(_) => "function".to_string(),
            Value::Class(_) => "class".to_string(),
            Value::Instance(instance) => instance.class.name.clone(),
            Value::Module(_) => "module".to_string(),
            Value::File(_) => "file".to_string(),
            Value::Error(_) => "error".to_string(),
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::None => false,
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Float(x) => *x != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::List(items) => !items.borrow().is_empty(),
            Value::Tuple(items) => !items.is_empty(),
            Value::Dict(table) => !table.borrow().is_empty(),
            Value::Set(table) => !table.borrow().is_empty(),
            Value::Range { .. } => self.range_len() > 0,
            _ => true,
        }
    }

    /// Number of elements a range yields; zero for anything else.
    pub fn range_len(&self) -> usize {
        match *self {
            Value::Range { start, stop, step } => range_len(start, stop, step),
            _ => 0,
        }
    }

    /// Structural equality. Integers and decimals compare by value.
    ///
    /// Collections nested past [`MAX_COMPARE_DEPTH`] compare unequal; use
    /// [`Value::try_equals`] where that must surface as an error.
    pub fn equals(&self, other: &Value) -> bool {
        self.try_equals(other).unwrap_or(false)
    }

    pub fn try_equals(&self, other: &Value) -> Result<bool, NestingTooDeep> {
        equals_at(self, other, 0)
    }

    /// Ordering for `<`, `sorted`, `min` and `max`; `None` when the values
    /// cannot be ordered against each other.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        self.try_compare(other).ok().flatten()
    }

    pub fn try_compare(&self, other: &Value) -> Result<Option<Ordering>, NestingTooDeep> {
        compare_at(self, other, 0)
    }

    /// Text used by `print` and `str()`.
    pub fn to_display_string(&self) -> String {
        self.to_string()
    }

    /// Text used inside collections: strings are quoted.
    pub fn repr(&self) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = write_value(&mut out, self, true, 0);
        out
    }
}

/// Storage behind [`Value::List`].
#[derive(Default)]
pub struct ListCell(RefCell<Vec<Value>>);

/// Storage behind [`Value::Tuple`].
#[derive(Default)]
pub struct TupleCell(Box<[Value]>);

/// Storage behind [`Value::Dict`].
pub struct DictCell(RefCell<Table<Value>>);

impl Deref for ListCell {
    type Target = RefCell<Vec<Value>>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Deref for TupleCell {
    type Target = [Value];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Deref for DictCell {
    type Target = RefCell<Table<Value>>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

// Dropping a container hands its children to `release`, so freeing a
// deeply nested chain never recurses once per level.

impl Drop for ListCell {
    fn drop(&mut self) {
        release(std::mem::take(self.0.get_mut()));
    }
}

impl Drop for TupleCell {
    fn drop(&mut self) {
        release(std::mem::take(&mut self.0).into_vec());
    }
}

impl Drop for DictCell {
    fn drop(&mut self) {
        let table = std::mem::replace(self.0.get_mut(), Table::new());
        release(table.into_entries().into_iter().map(|(_, value)| value).collect());
    }
}

/// Drop `pending` with an explicit work list. Containers this list holds
/// the last reference to are emptied into it before they are freed.
pub(crate) fn release(mut pending: Vec<Value>) {
    while let Some(value) = pending.pop() {
        match value {
            Value::List(mut cell) => {
                if let Some(cell) = Rc::get_mut(&mut cell) {
                    pending.append(cell.0.get_mut());
                }
            }
            Value::Tuple(mut cell) => {
                if let Some(cell) = Rc::get_mut(&mut cell) {
                    pending.extend(std::mem::take(&mut cell.0).into_vec());
                }
            }
            Value::Dict(mut cell) => {
                if let Some(cell) = Rc::get_mut(&mut cell) {
                    let table = std::mem::replace(cell.0.get_mut(), Table::new());
                    pending.extend(table.into_entries().into_iter().map(|(_, value)| value));
                }
            }
            Value::Instance(mut instance) => {
                if let Some(instance) = Rc::get_mut(&mut instance) {
                    pending.extend(instance.fields.get_mut().drain().map(|(_, value)| value));
                }
            }
            _ => {}
        }
    }
}

pub(crate) fn range_len(start: i64, stop: i64, step: i64) -> usize {
    let (start, stop, step) = (start as i128, stop as i128, step as i128);
    let span = if step > 0 {
        stop - start
    } else if step < 0 {
        start - stop
    } else {
        0
    };
    if span <= 0 {
        return 0;
    }
    let step = step.abs();
    ((span + step - 1) / step) as usize
}

fn equals_at(left: &Value, right: &Value, depth: usize) -> Result<bool, NestingTooDeep> {
    if depth > MAX_COMPARE_DEPTH {
        return Err(NestingTooDeep);
    }
    let equal = match (left, right) {
        (Value::None, Value::None) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Int(a), Value::Int(b)) => a == b,
        (Value::Float(a), Value::Float(b)) => a == b,
        (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => (*a as f64) == *b,
        (Value::Str(a), Value::Str(b)) => a == b,
        (Value::List(a), Value::List(b)) => {
            Rc::ptr_eq(a, b) || seq_equals(&a.borrow(), &b.borrow(), depth)?
        }
        (Value::Tuple(a), Value::Tuple(b)) => Rc::ptr_eq(a, b) || seq_equals(a, b, depth)?,
        (Value::Dict(a), Value::Dict(b)) => {
            if Rc::ptr_eq(a, b) {
                return Ok(true);
            }
            let (a, b) = (a.borrow(), b.borrow());
            if a.len() != b.len() {
                return Ok(false);
            }
            for (k, v) in a.iter() {
                let Some(other) = super::Key::of(k).and_then(|key| b.get(&key)) else {
                    return Ok(false);
                };
                if !equals_at(v, other, depth + 1)? {
                    return Ok(false);
                }
            }
            true
        }
        (Value::Set(a), Value::Set(b)) => {
            if Rc::ptr_eq(a, b) {
                return Ok(true);
            }
            let (a, b) = (a.borrow(), b.borrow());
            a.len() == b.len()
                && a.keys().all(|k| super::Key::of(k).is_some_and(|key| b.contains(&key)))
        }
        (
            Value::Range { start, stop, step },
            Value::Range {
                start: s2,
                stop: e2,
                step: st2,
            },
        ) => start == s2 && stop == e2 && step == st2,
        (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
        (Value::Builtin(a), Value::Builtin(b)) => a.name == b.name,
        (Value::BoundMethod(a), Value::BoundMethod(b)) => Rc::ptr_eq(a, b),
        (Value::Class(a), Value::Class(b)) => Rc::ptr_eq(a, b),
        (Value::Instance(a), Value::Instance(b)) => Rc::ptr_eq(a, b),
        (Value::Module(a), Value::Module(b)) => a.name == b.name,
        (Value::File(a), Value::File(b)) => Rc::ptr_eq(a, b),
        (Value::Error(a), Value::Error(b)) => Rc::ptr_eq(a, b),
        _ => false,
    };
    Ok(equal)
}

fn seq_equals(a: &[Value], b: &[Value], depth: usize) -> Result<bool, NestingTooDeep> {
    if a.len() != b.len() {
        return Ok(false);
    }
    for (x, y) in a.iter().zip(b) {
        if !equals_at(x, y, depth + 1)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn compare_at(left: &Value, right: &Value, depth: usize) -> Result<Option<Ordering>, NestingTooDeep> {
    if depth > MAX_COMPARE_DEPTH {
        return Err(NestingTooDeep);
    }
    let ordering = match (left, right) {
        (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
        (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
        (Value::Int(a), Value::Float(b)) => (*a as f64).partial_cmp(b),
        (Value::Float(a), Value::Int(b)) => a.partial_cmp(&(*b as f64)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
        (Value::List(a), Value::List(b)) => seq_compare(&a.borrow(), &b.borrow(), depth)?,
        (Value::Tuple(a), Value::Tuple(b)) => seq_compare(a, b, depth)?,
        _ => None,
    };
    Ok(ordering)
}

fn seq_compare(a: &[Value], b: &[Value], depth: usize) -> Result<Option<Ordering>, NestingTooDeep> {
    for (x, y) in a.iter().zip(b) {
        match compare_at(x, y, depth + 1)? {
            Some(Ordering::Equal) => continue,
            other => return Ok(other),
        }
    }
    Ok(Some(a.len().cmp(&b.len())))
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.repr())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_value(f, self, false, 0)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.into())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s.into())
    }
}

fn write_value(out: &mut impl fmt::Write, value: &Value, quoted: bool, depth: usize) -> fmt::Result {
    if depth > MAX_DISPLAY_DEPTH {
        return out.write_str("...");
    }
    match value {
        Value::None => out.write_str("nothing"),
        Value::Bool(true) => out.write_str("true"),
        Value::Bool(false) => out.write_str("false"),
        Value::Int(n) => write!(out, "{}", n),
        Value::Float(x) => out.write_str(&format_float(*x)),
        Value::Str(s) if quoted => out.write_str(&quote_string(s)),
        Value::Str(s) => out.write_str(s),
        Value::List(items) => {
            out.write_char('[')?;
            write_items(out, &items.borrow(), depth)?;
            out.write_char(']')
        }
        Value::Tuple(items) => {
            out.write_char('(')?;
            write_items(out, items, depth)?;
            if items.len() == 1 {
                out.write_char(',')?;
            }
            out.write_char(')')
        }
        Value::Dict(table) => {
            out.write_char('{')?;
            for (i, (k, v)) in table.borrow().iter().enumerate() {
                if i > 0 {
                    out.write_str(", ")?;
                }
                write_value(out, k, true, depth + 1)?;
                out.write_str(": ")?;
                write_value(out, v, true, depth + 1)?;
            }
            out.write_char('}')
        }
        Value::Set(table) => {
            let table = table.borrow();
            if table.is_empty() {
                return out.write_str("set()");
            }
            out.write_char('{')?;
            for (i, k) in table.keys().enumerate() {
                if i > 0 {
                    out.write_str(", ")?;
                }
                write_value(out, k, true, depth + 1)?;
            }
            out.write_char('}')
        }
        Value::Range { start, stop, step } => {
            if *step == 1 {
                write!(out, "range({}, {})", start, stop)
            } else {
                write!(out, "range({}, {}, {})", start, stop, step)
            }
        }
        Value::Function(function) => write!(out, "<function {}>", function.name),
        Value::Builtin(builtin) => write!(out, "<built-in function {}>", builtin.name),
        Value::BoundMethod(method) => write!(out, "<method {}>", method.name),
        Value::Class(class) => write!(out, "<class {}>", class.name),
        Value::Instance(instance) => write!(out, "<{} object>", instance.class.name),
        Value::Module(module) => write!(out, "<module {}>", module.name),
        Value::File(file) => write!(out, "<file {}>", file.borrow().path),
        Value::Error(error) if quoted => write!(out, "{}({})", error.kind, quote_string(&error.message)),
        Value::Error(error) => out.write_str(&error.message),
    }
}

fn write_items(out: &mut impl fmt::Write, items: &[Value], depth: usize) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.write_str(", ")?;
        }
        write_value(out, item, true, depth + 1)?;
    }
    Ok(())
}

/// Decimal text that always reads as a decimal: `2.0`, `0.1`, `1e+16`.
pub fn format_float(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value.is_sign_positive() { "inf" } else { "-inf" }.to_string();
    }

    let magnitude = value.abs();
    if magnitude != 0.0 && !(1e-4..1e16).contains(&magnitude) {
        let text = format!("{:e}", value);
        return match text.split_once('e') {
            Some((mantissa, exponent)) => {
                let (sign, digits) = match exponent.strip_prefix('-') {
                    Some(digits) => ('-', digits),
                    None => ('+', exponent),
                };
                format!("{}e{}{:0>2}", mantissa, sign, digits)
            }
            None => text,
        };
    }

    let text = value.to_string();
    if text.contains('.') {
        text
    } else {
        format!("{}.0", text)
    }
}

/// Quote a string the way collection displays show it.
fn quote_string(s: &str) -> String {
    let quote = if s.contains('\'') && !s.contains('"') { '"' } else { '\'' };
    let mut out = String::with_capacity(s.len() + 2);
    out.push(quote);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}
