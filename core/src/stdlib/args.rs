//! Argument checks shared by native functions.

use crate::evaluator::{ErrorKind, Fault, Interpreter};
use crate::values::Value;
use std::cmp::Ordering;
use std::rc::Rc;

/// Fail unless `min <= args.len() <= max`.
pub(crate) fn arity(interp: &Interpreter, name: &str, args: &[Value], min: usize, max: usize) -> Result<(), Fault> {
    if (min..=max).contains(&args.len()) {
        return Ok(());
    }
    let expected = match (min, max) {
        (min, max) if min == max => plural(min),
        (min, usize::MAX) => format!("at least {}", plural(min)),
        (min, max) => format!("{} to {} arguments", min, max),
    };
    Err(interp.error(
        ErrorKind::Type,
        format!("`{}` expects {} but got {}", name, expected, args.len()),
    ))
}

fn plural(n: usize) -> String {
    if n == 1 {
        "1 argument".to_string()
    } else {
        format!("{} arguments", n)
    }
}

pub(crate) fn mismatch(interp: &Interpreter, name: &str, expected: &str, found: &Value) -> Fault {
    interp.error(
        ErrorKind::Type,
        format!("`{}` needs {}, not {}", name, expected, found.type_name()),
    )
}

pub(crate) fn int(interp: &Interpreter, name: &str, value: &Value) -> Result<i64, Fault> {
    match value {
        Value::Int(n) => Ok(*n),
        other => Err(mismatch(interp, name, "a whole number", other)),
    }
}

pub(crate) fn number(interp: &Interpreter, name: &str, value: &Value) -> Result<f64, Fault> {
    match value {
        Value::Int(n) => Ok(*n as f64),
        Value::Float(x) => Ok(*x),
        other => Err(mismatch(interp, name, "a number", other)),
    }
}

pub(crate) fn text(interp: &Interpreter, name: &str, value: &Value) -> Result<Rc<str>, Fault> {
    match value {
        Value::Str(s) => Ok(s.clone()),
        other => Err(mismatch(interp, name, "text", other)),
    }
}

/// Stable merge sort over values that may not be comparable. Never panics;
/// the first incomparable pair becomes a TypeError.
pub(crate) fn sort_values(interp: &Interpreter, items: Vec<Value>) -> Result<Vec<Value>, Fault> {
    if items.len() <= 1 {
        return Ok(items);
    }
    let mut right = items;
    let left = right.drain(..right.len() / 2).collect::<Vec<_>>();
    let left = sort_values(interp, left)?;
    let right = sort_values(interp, right)?;

    let mut merged = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();
    while let (Some(a), Some(b)) = (left.peek(), right.peek()) {
        let ordering = compare(interp, a, b)?;
        let next = if ordering == Ordering::Greater {
            right.next()
        } else {
            left.next()
        };
        merged.extend(next);
    }
    merged.extend(left);
    merged.extend(right);
    Ok(merged)
}

/// Index of the first item equal to `item`.
pub(crate) fn position(interp: &Interpreter, items: &[Value], item: &Value) -> Result<Option<usize>, Fault> {
    crate::evaluator::position(items, item).map_err(|err| interp.fault(err))
}

/// Equality that fails instead of recursing without bound.
pub(crate) fn equal(interp: &Interpreter, a: &Value, b: &Value) -> Result<bool, Fault> {
    a.try_equals(b).map_err(|err| interp.fault(err))
}

/// Order two values or fail with a TypeError.
pub(crate) fn compare(interp: &Interpreter, a: &Value, b: &Value) -> Result<Ordering, Fault> {
    let ordering = a.try_compare(b).map_err(|err| interp.fault(err))?;
    ordering.ok_or_else(|| {
        interp.error(
            ErrorKind::Type,
            format!("cannot compare {} with {}", a.type_name(), b.type_name()),
        )
    })
}
