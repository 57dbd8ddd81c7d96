//! Binary operators, comparisons, indexing and slicing.
//!
//! Integer arithmetic wraps instead of panicking. Division and modulo follow
//! the floor convention beginners see in most teaching material.

use super::{ErrorKind, ExecError, RuntimeError};
use crate::parser::{BinaryOp, ComparisonOp};
use crate::values::{Key, Value};
use std::cmp::Ordering;

fn type_error(message: String) -> ExecError {
    RuntimeError::new(ErrorKind::Type, message).into()
}

fn zero_division() -> ExecError {
    RuntimeError::new(ErrorKind::ZeroDivision, "division by zero").into()
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Int(n) => Some(*n as f64),
        Value::Float(x) => Some(*x),
        _ => None,
    }
}

/// Evaluate `left op right`. `limit` caps the length of repeated sequences.
pub(super) fn binary(op: BinaryOp, left: &Value, right: &Value, limit: usize) -> Result<Value, ExecError> {
    if let (Value::Int(a), Value::Int(b)) = (left, right) {
        return binary_int(op, *a, *b);
    }
    if let (Some(a), Some(b)) = (as_number(left), as_number(right)) {
        return binary_float(op, a, b);
    }

    match (op, left, right) {
        (BinaryOp::Add, Value::Str(a), Value::Str(b)) => {
            check_len(a.len() + b.len(), limit)?;
            Ok(Value::str(format!("{}{}", a, b)))
        }
        (BinaryOp::Add, Value::List(a), Value::List(b)) => {
            let mut items = a.borrow().clone();
            items.extend(b.borrow().iter().cloned());
            check_len(items.len(), limit)?;
            Ok(Value::list(items))
        }
        (BinaryOp::Add, Value::Tuple(a), Value::Tuple(b)) => {
            Ok(Value::tuple(a.iter().chain(b.iter()).cloned().collect()))
        }
        (BinaryOp::Sub, Value::Set(a), Value::Set(b)) => {
            let b = b.borrow();
            let kept = a
                .borrow()
                .keys()
                .filter(|item| Key::of(item).is_some_and(|key| !b.contains(&key)))
                .cloned()
                .collect::<Vec<_>>();
            Ok(Value::set(crate::values::Table::from_values(kept).unwrap_or_default()))
        }
        (BinaryOp::Mul, Value::Str(s), Value::Int(n)) | (BinaryOp::Mul, Value::Int(n), Value::Str(s)) => {
            let times = usize::try_from(*n).unwrap_or(0);
            check_len(s.len().saturating_mul(times), limit)?;
            Ok(Value::str(s.repeat(times)))
        }
        (BinaryOp::Mul, Value::List(items), Value::Int(n)) | (BinaryOp::Mul, Value::Int(n), Value::List(items)) => {
            let times = usize::try_from(*n).unwrap_or(0);
            let items = items.borrow();
            if items.is_empty() || times == 0 {
                return Ok(Value::list(Vec::new()));
            }
            check_len(items.len().saturating_mul(times), limit)?;
            let mut repeated = Vec::with_capacity(items.len() * times);
            for _ in 0..times {
                repeated.extend(items.iter().cloned());
            }
            Ok(Value::list(repeated))
        }
        (BinaryOp::Add, Value::Str(_), other) | (BinaryOp::Add, other, Value::Str(_)) => Err(type_error(format!(
            "cannot add text and {}; convert it first with str()",
            other.type_name()
        ))),
        _ => Err(type_error(format!(
            "unsupported operand types for {}: {} and {}",
            op,
            left.type_name(),
            right.type_name()
        ))),
    }
}

fn check_len(len: usize, limit: usize) -> Result<(), ExecError> {
    if len > limit {
        tracing::warn!(len, limit, "collection limit exceeded");
        return Err(ExecError::ResourceExceeded {
            what: "collection size",
            limit,
        });
    }
    Ok(())
}

fn binary_int(op: BinaryOp, a: i64, b: i64) -> Result<Value, ExecError> {
    let value = match op {
        BinaryOp::Add => Value::Int(a.wrapping_add(b)),
        BinaryOp::Sub => Value::Int(a.wrapping_sub(b)),
        BinaryOp::Mul => Value::Int(a.wrapping_mul(b)),
        BinaryOp::Div => {
            if b == 0 {
                return Err(zero_division());
            }
            Value::Float(a as f64 / b as f64)
        }
        BinaryOp::FloorDiv => {
            if b == 0 {
                return Err(zero_division());
            }
            let quotient = a.wrapping_div(b);
            if a.wrapping_rem(b) != 0 && ((a < 0) != (b < 0)) {
                Value::Int(quotient.wrapping_sub(1))
            } else {
                Value::Int(quotient)
            }
        }
        BinaryOp::Mod => {
            if b == 0 {
                return Err(zero_division());
            }
            let remainder = a.wrapping_rem(b);
            if remainder != 0 && ((remainder < 0) != (b < 0)) {
                Value::Int(remainder.wrapping_add(b))
            } else {
                Value::Int(remainder)
            }
        }
        BinaryOp::Pow => match u32::try_from(b) {
            Ok(exponent) => Value::Int(a.wrapping_pow(exponent)),
            Err(_) => Value::Float((a as f64).powf(b as f64)),
        },
    };
    Ok(value)
}

fn binary_float(op: BinaryOp, a: f64, b: f64) -> Result<Value, ExecError> {
    let value = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => {
            if b == 0.0 {
                return Err(zero_division());
            }
            a / b
        }
        BinaryOp::FloorDiv => {
            if b == 0.0 {
                return Err(zero_division());
            }
            (a / b).floor()
        }
        BinaryOp::Mod => {
            if b == 0.0 {
                return Err(zero_division());
            }
            let remainder = a % b;
            if remainder != 0.0 && ((remainder < 0.0) != (b < 0.0)) {
                remainder + b
            } else {
                remainder
            }
        }
        BinaryOp::Pow => a.powf(b),
    };
    Ok(Value::Float(value))
}

/// Evaluate an ordering or equality comparison. `in` is handled by
/// [`contains`].
pub(super) fn compare(op: ComparisonOp, left: &Value, right: &Value) -> Result<Value, ExecError> {
    let ordering = match op {
        ComparisonOp::Eq => return Ok(Value::Bool(left.try_equals(right)?)),
        ComparisonOp::Neq => return Ok(Value::Bool(!left.try_equals(right)?)),
        ComparisonOp::In => return contains(right, left).map(Value::Bool),
        ComparisonOp::NotIn => return contains(right, left).map(|found| Value::Bool(!found)),
        _ => match left.try_compare(right)? {
            Some(ordering) => ordering,
            // NaN compares false against everything.
            None if as_number(left).is_some() && as_number(right).is_some() => {
                return Ok(Value::Bool(false));
            }
            None => {
                return Err(type_error(format!(
                    "cannot compare {} with {} using {}",
                    left.type_name(),
                    right.type_name(),
                    op
                )));
            }
        },
    };
    let result = match op {
        ComparisonOp::Lt => ordering == Ordering::Less,
        ComparisonOp::Le => ordering != Ordering::Greater,
        ComparisonOp::Gt => ordering == Ordering::Greater,
        ComparisonOp::Ge => ordering != Ordering::Less,
        _ => false,
    };
    Ok(Value::Bool(result))
}

/// Whether `item` is in `container`.
pub(crate) fn contains(container: &Value, item: &Value) -> Result<bool, ExecError> {
    match container {
        Value::Str(text) => match item {
            Value::Str(needle) => Ok(text.contains(needle.as_ref())),
            other => Err(type_error(format!(
                "`in <text>` needs text on the left, not {}",
                other.type_name()
            ))),
        },
        Value::List(items) => position(&items.borrow(), item).map(|found| found.is_some()),
        Value::Tuple(items) => position(items, item).map(|found| found.is_some()),
        Value::Dict(table) => Ok(Key::of(item).is_some_and(|key| table.borrow().contains(&key))),
        Value::Set(table) => Ok(Key::of(item).is_some_and(|key| table.borrow().contains(&key))),
        Value::Range { start, stop, step } => Ok(match item {
            Value::Int(n) => range_index_of(*start, *stop, *step, *n).is_some(),
            _ => false,
        }),
        other => Err(type_error(format!("{} is not a collection", other.type_name()))),
    }
}

/// Index of the first element equal to `item`.
pub(crate) fn position(items: &[Value], item: &Value) -> Result<Option<usize>, ExecError> {
    for (i, candidate) in items.iter().enumerate() {
        if candidate.try_equals(item)? {
            return Ok(Some(i));
        }
    }
    Ok(None)
}

fn range_index_of(start: i64, stop: i64, step: i64, n: i64) -> Option<i64> {
    if step == 0 {
        return None;
    }
    let inside = if step > 0 {
        start <= n && n < stop
    } else {
        stop < n && n <= start
    };
    let offset = (n as i128) - (start as i128);
    (inside && offset % (step as i128) == 0).then(|| (offset / step as i128) as i64)
}

/// Resolve a possibly negative index against `len`.
pub(crate) fn normalize_index(index: i64, len: usize) -> Option<usize> {
    let len = i64::try_from(len).ok()?;
    let index = if index < 0 { index + len } else { index };
    (0..len).contains(&index).then_some(index as usize)
}

fn index_error(index: i64, len: usize) -> ExecError {
    RuntimeError::new(
        ErrorKind::Index,
        format!("index {} is out of range for a collection of length {}", index, len),
    )
    .into()
}

/// Evaluate `value[index]`.
pub(super) fn index(value: &Value, index: &Value) -> Result<Value, ExecError> {
    if let Value::Dict(table) = value {
        let key = Key::of(index)
            .ok_or_else(|| type_error(format!("{} cannot be used as a key", index.type_name())))?;
        return table.borrow().get(&key).cloned().ok_or_else(|| {
            RuntimeError::new(ErrorKind::Key, format!("key {} not found", index.repr())).into()
        });
    }

    let position = match index {
        Value::Int(n) => *n,
        other => {
            return Err(type_error(format!(
                "indexes must be whole numbers, not {}",
                other.type_name()
            )));
        }
    };
    match value {
        Value::List(items) => {
            let items = items.borrow();
            normalize_index(position, items.len())
                .map(|i| items[i].clone())
                .ok_or_else(|| index_error(position, items.len()))
        }
        Value::Tuple(items) => normalize_index(position, items.len())
            .map(|i| items[i].clone())
            .ok_or_else(|| index_error(position, items.len())),
        Value::Str(text) => {
            let len = text.chars().count();
            normalize_index(position, len)
                .and_then(|i| text.chars().nth(i))
                .map(|c| Value::str(c.to_string()))
                .ok_or_else(|| index_error(position, len))
        }
        Value::Range { start, step, .. } => {
            let len = value.range_len();
            normalize_index(position, len)
                .map(|i| Value::Int(start.wrapping_add((i as i64).wrapping_mul(*step))))
                .ok_or_else(|| index_error(position, len))
        }
        other => Err(type_error(format!("{} cannot be indexed", other.type_name()))),
    }
}

/// Clamp slice bounds the forgiving way: out-of-range bounds shrink to fit.
fn slice_bounds(start: Option<i64>, end: Option<i64>, len: usize) -> (usize, usize) {
    let len = len as i64;
    let clamp = |bound: i64| {
        let bound = if bound < 0 { bound + len } else { bound };
        bound.clamp(0, len) as usize
    };
    let start = start.map_or(0, clamp);
    let end = end.map_or(len as usize, clamp);
    (start, end.max(start))
}

/// Evaluate `value[start:end]`.
pub(super) fn slice(value: &Value, start: Option<&Value>, end: Option<&Value>) -> Result<Value, ExecError> {
    let bound = |bound: Option<&Value>| match bound {
        None | Some(Value::None) => Ok(None),
        Some(Value::Int(n)) => Ok(Some(*n)),
        Some(other) => Err(type_error(format!(
            "slice bounds must be whole numbers, not {}",
            other.type_name()
        ))),
    };
    let (start, end) = (bound(start)?, bound(end)?);

    match value {
        Value::List(items) => {
            let items = items.borrow();
            let (from, to) = slice_bounds(start, end, items.len());
            Ok(Value::list(items[from..to].to_vec()))
        }
        Value::Tuple(items) => {
            let (from, to) = slice_bounds(start, end, items.len());
            Ok(Value::tuple(items[from..to].to_vec()))
        }
        Value::Str(text) => {
            let chars: Vec<char> = text.chars().collect();
            let (from, to) = slice_bounds(start, end, chars.len());
            Ok(Value::str(chars[from..to].iter().collect::<String>()))
        }
        other => Err(type_error(format!("{} cannot be sliced", other.type_name()))),
    }
}
