//! Core builtins: output, input, conversions and sequence helpers.

use super::args::{self, arity};
use crate::evaluator::{ErrorKind, Fault, Interpreter};
use crate::values::{Builtin, ErrorValue, Table, Value};
use std::rc::Rc;

pub(super) const BUILTINS: &[Builtin] = &[
    Builtin::new("print", print),
    Builtin::new("ask", ask),
    Builtin::new("len", len),
    Builtin::new("range", range),
    Builtin::new("type", type_of),
    Builtin::new("int", int),
    Builtin::new("float", float),
    Builtin::new("str", str),
    Builtin::new("bool", bool),
    Builtin::new("list", list),
    Builtin::new("tuple", tuple),
    Builtin::new("dict", dict),
    Builtin::new("set", set),
    Builtin::new("abs", abs),
    Builtin::new("round", round),
    Builtin::new("min", min),
    Builtin::new("max", max),
    Builtin::new("sum", sum),
    Builtin::new("sorted", sorted),
    Builtin::new("any", any),
    Builtin::new("all", all),
    Builtin::new("enumerate", enumerate),
    Builtin::new("zip", zip),
    Builtin::new("map", map),
    Builtin::new("filter", filter),
    Builtin::new("Exception", exception),
];

// ============================================================================
// Input and Output
// ============================================================================

/// Arguments joined by a space, then a newline.
fn print(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    let mut line = args
        .iter()
        .map(Value::to_display_string)
        .collect::<Vec<_>>()
        .join(" ");
    line.push('\n');
    interp.write_output(&line)?;
    Ok(Value::None)
}

/// Next supplied input. The prompt is echoed without a newline.
fn ask(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    arity(interp, "ask", &args, 0, 1)?;
    let prompt = args.first().map(Value::to_display_string);
    if let Some(prompt) = &prompt {
        interp.write_output(prompt)?;
    }
    interp.next_input(prompt.as_deref())
}

// ============================================================================
// Conversions
// ============================================================================

fn type_of(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    arity(interp, "type", &args, 1, 1)?;
    Ok(Value::str(args[0].type_name()))
}

fn int(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    arity(interp, "int", &args, 0, 1)?;
    let Some(value) = args.first() else {
        return Ok(Value::Int(0));
    };
    match value {
        Value::Int(n) => Ok(Value::Int(*n)),
        Value::Bool(b) => Ok(Value::Int(i64::from(*b))),
        Value::Float(x) => float_to_int(interp, *x),
        Value::Str(s) => s.trim().parse::<i64>().map(Value::Int).map_err(|_| {
            interp.error(
                ErrorKind::Value,
                format!("cannot turn {} into a whole number", value.repr()),
            )
        }),
        other => Err(args::mismatch(interp, "int", "a number or text", other)),
    }
}

pub(super) fn float_to_int(interp: &Interpreter, x: f64) -> Result<Value, Fault> {
    let truncated = x.trunc();
    if !truncated.is_finite() || truncated < i64::MIN as f64 || truncated >= i64::MAX as f64 {
        return Err(interp.error(
            ErrorKind::Value,
            format!("{} is too large to be a whole number", crate::values::format_float(x)),
        ));
    }
    Ok(Value::Int(truncated as i64))
}

fn float(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    arity(interp, "float", &args, 0, 1)?;
    let Some(value) = args.first() else {
        return Ok(Value::Float(0.0));
    };
    match value {
        Value::Int(n) => Ok(Value::Float(*n as f64)),
        Value::Float(x) => Ok(Value::Float(*x)),
        Value::Bool(b) => Ok(Value::Float(if *b { 1.0 } else { 0.0 })),
        Value::Str(s) => s.trim().parse::<f64>().map(Value::Float).map_err(|_| {
            interp.error(
                ErrorKind::Value,
                format!("cannot turn {} into a decimal", value.repr()),
            )
        }),
        other => Err(args::mismatch(interp, "float", "a number or text", other)),
    }
}

fn str(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    arity(interp, "str", &args, 0, 1)?;
    Ok(Value::str(
        args.first().map(Value::to_display_string).unwrap_or_default(),
    ))
}

fn bool(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    arity(interp, "bool", &args, 0, 1)?;
    Ok(Value::Bool(args.first().is_some_and(Value::is_truthy)))
}

fn list(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    arity(interp, "list", &args, 0, 1)?;
    match args.first() {
        Some(value) => Ok(Value::list(interp.collect(value)?)),
        None => Ok(Value::list(Vec::new())),
    }
}

fn tuple(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    arity(interp, "tuple", &args, 0, 1)?;
    match args.first() {
        Some(value) => Ok(Value::tuple(interp.collect(value)?)),
        None => Ok(Value::tuple(Vec::new())),
    }
}

/// `dict()`, a copy of a dict, or a dict from `(key, value)` pairs.
fn dict(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    arity(interp, "dict", &args, 0, 1)?;
    let mut table = Table::new();
    match args.first() {
        None => {}
        Some(Value::Dict(source)) => table = source.borrow().clone(),
        Some(pairs) => {
            for pair in interp.collect(pairs)? {
                let items = interp.collect(&pair)?;
                let [key, value] = <[Value; 2]>::try_from(items).map_err(|_| {
                    interp.error(ErrorKind::Value, "dict() needs pairs of (key, value)")
                })?;
                let hashed = interp.key_of(&key)?;
                table.insert(hashed, key, value);
            }
        }
    }
    Ok(Value::dict(table))
}

fn set(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    arity(interp, "set", &args, 0, 1)?;
    let items = match args.first() {
        Some(value) => interp.collect(value)?,
        None => Vec::new(),
    };
    make_set(interp, items)
}

pub(super) fn make_set(interp: &Interpreter, items: Vec<Value>) -> Result<Value, Fault> {
    let mut table = Table::new();
    for item in items {
        let key = interp.key_of(&item)?;
        table.insert(key, item, ());
    }
    Ok(Value::set(table))
}

// ============================================================================
// Numbers
// ============================================================================

fn abs(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    arity(interp, "abs", &args, 1, 1)?;
    match &args[0] {
        Value::Int(n) => Ok(Value::Int(n.wrapping_abs())),
        Value::Float(x) => Ok(Value::Float(x.abs())),
        other => Err(args::mismatch(interp, "abs", "a number", other)),
    }
}

/// `round(x)` gives a whole number; `round(x, n)` keeps `n` decimal places.
/// Halves round to the nearest even digit.
fn round(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    arity(interp, "round", &args, 1, 2)?;
    let digits = match args.get(1) {
        Some(Value::None) | None => None,
        Some(value) => Some(args::int(interp, "round", value)?),
    };
    match (&args[0], digits) {
        (Value::Int(n), _) => Ok(Value::Int(*n)),
        (Value::Float(x), None) => float_to_int(interp, x.round_ties_even()),
        (Value::Float(x), Some(digits)) => {
            let scale = 10f64.powi(digits.clamp(-308, 308) as i32);
            let rounded = (x * scale).round_ties_even() / scale;
            Ok(Value::Float(if rounded.is_finite() { rounded } else { *x }))
        }
        (other, _) => Err(args::mismatch(interp, "round", "a number", other)),
    }
}

/// Items of a single collection argument, or the arguments themselves.
fn spread(interp: &Interpreter, name: &str, args: Vec<Value>) -> Result<Vec<Value>, Fault> {
    arity(interp, name, &args, 1, usize::MAX)?;
    if args.len() == 1 {
        interp.collect(&args[0])
    } else {
        Ok(args)
    }
}

fn extreme(interp: &Interpreter, name: &str, args: Vec<Value>, keep: std::cmp::Ordering) -> Result<Value, Fault> {
    let mut items = spread(interp, name, args)?.into_iter();
    let mut best = items
        .next()
        .ok_or_else(|| interp.error(ErrorKind::Value, format!("`{}` of an empty collection", name)))?;
    for item in items {
        if args::compare(interp, &item, &best)? == keep {
            best = item;
        }
    }
    Ok(best)
}

fn min(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    extreme(interp, "min", args, std::cmp::Ordering::Less)
}

fn max(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    extreme(interp, "max", args, std::cmp::Ordering::Greater)
}

fn sum(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    arity(interp, "sum", &args, 1, 2)?;
    let mut total = args.get(1).cloned().unwrap_or(Value::Int(0));
    for item in interp.collect(&args[0])? {
        total = match (&total, &item) {
            (Value::Int(a), Value::Int(b)) => Value::Int(a.wrapping_add(*b)),
            (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
                Value::Float(args::number(interp, "sum", &total)? + args::number(interp, "sum", &item)?)
            }
            (_, other) => return Err(args::mismatch(interp, "sum", "numbers", other)),
        };
    }
    Ok(total)
}

// ============================================================================
// Sequences
// ============================================================================

fn sorted(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    arity(interp, "sorted", &args, 1, 1)?;
    let items = interp.collect(&args[0])?;
    Ok(Value::list(args::sort_values(interp, items)?))
}

fn any(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    arity(interp, "any", &args, 1, 1)?;
    Ok(Value::Bool(interp.collect(&args[0])?.iter().any(Value::is_truthy)))
}

fn all(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    arity(interp, "all", &args, 1, 1)?;
    Ok(Value::Bool(interp.collect(&args[0])?.iter().all(Value::is_truthy)))
}

/// `(index, item)` pairs, counting from `start` (default 0).
fn enumerate(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    arity(interp, "enumerate", &args, 1, 2)?;
    let start = match args.get(1) {
        Some(value) => args::int(interp, "enumerate", value)?,
        None => 0,
    };
    let pairs = interp
        .collect(&args[0])?
        .into_iter()
        .zip(start..)
        .map(|(item, i)| Value::tuple(vec![Value::Int(i), item]))
        .collect();
    Ok(Value::list(pairs))
}

/// Tuples of corresponding items, as long as the shortest input.
fn zip(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    let columns = args
        .iter()
        .map(|value| interp.collect(value))
        .collect::<Result<Vec<_>, _>>()?;
    let len = columns.iter().map(Vec::len).min().unwrap_or(0);
    let rows = (0..len)
        .map(|i| Value::tuple(columns.iter().map(|column| column[i].clone()).collect()))
        .collect();
    Ok(Value::list(rows))
}

/// `map(f, xs)`: a new list of `f(x)`.
fn map(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    arity(interp, "map", &args, 2, 2)?;
    let (function, items) = callable_and_items(interp, "map", &args)?;
    let mut mapped = Vec::with_capacity(items.len());
    for item in items {
        mapped.push(interp.call_value(&function, vec![item])?);
    }
    Ok(Value::list(mapped))
}

/// `filter(f, xs)`: the items for which `f(x)` is truthy.
fn filter(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    arity(interp, "filter", &args, 2, 2)?;
    let (function, items) = callable_and_items(interp, "filter", &args)?;
    let mut kept = Vec::new();
    for item in items {
        if interp.call_value(&function, vec![item.clone()])?.is_truthy() {
            kept.push(item);
        }
    }
    Ok(Value::list(kept))
}

/// Accept the function in either position, so `map xs f` also works.
fn callable_and_items(interp: &Interpreter, name: &str, args: &[Value]) -> Result<(Value, Vec<Value>), Fault> {
    let is_callable = |value: &Value| {
        matches!(
            value,
            Value::Function(_) | Value::Builtin(_) | Value::BoundMethod(_) | Value::Class(_)
        )
    };
    let (function, items) = match (&args[0], &args[1]) {
        (f, items) if is_callable(f) => (f, items),
        (items, f) if is_callable(f) => (f, items),
        (other, _) => return Err(args::mismatch(interp, name, "a function", other)),
    };
    Ok((function.clone(), interp.collect(items)?))
}

// ============================================================================
// Errors
// ============================================================================

/// `Exception("message")` builds an error value for `raise`.
fn exception(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    arity(interp, "Exception", &args, 0, 1)?;
    let message = args.first().map(Value::to_display_string).unwrap_or_default();
    Ok(Value::Error(Rc::new(ErrorValue::new("Exception", message))))
}

// ============================================================================
// Ranges
// ============================================================================

fn range(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    arity(interp, "range", &args, 1, 3)?;
    let bounds = args
        .iter()
        .map(|value| args::int(interp, "range", value))
        .collect::<Result<Vec<_>, _>>()?;
    let (start, stop, step) = match bounds.as_slice() {
        [stop] => (0, *stop, 1),
        [start, stop] => (*start, *stop, 1),
        [start, stop, step] => (*start, *stop, *step),
        _ => return Err(interp.error(ErrorKind::Type, "`range` expects 1 to 3 arguments")),
    };
    if step == 0 {
        return Err(interp.error(ErrorKind::Value, "range() step cannot be zero"));
    }
    Ok(Value::Range { start, stop, step })
}

fn len(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    arity(interp, "len", &args, 1, 1)?;
    let len = match &args[0] {
        Value::Str(s) => s.chars().count(),
        Value::List(items) => items.borrow().len(),
        Value::Tuple(items) => items.len(),
        Value::Dict(table) => table.borrow().len(),
        Value::Set(table) => table.borrow().len(),
        Value::Range { .. } => args[0].range_len(),
        other => return Err(args::mismatch(interp, "len", "text or a collection", other)),
    };
    Ok(Value::Int(len as i64))
}
