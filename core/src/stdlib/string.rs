//! Text helpers.
//!
//! Positions and lengths count characters, not bytes.

use super::args::{self, arity};
use crate::evaluator::{Fault, Interpreter};
use crate::values::{Builtin, Value};

pub(super) const BUILTINS: &[Builtin] = &[
    Builtin::new("upper", upper),
    Builtin::new("lower", lower),
    Builtin::new("title", title),
    Builtin::new("strip", strip),
    Builtin::new("isalpha", isalpha),
    Builtin::new("isdigit", isdigit),
    Builtin::new("isalnum", isalnum),
    Builtin::new("split", split),
    Builtin::new("join", join),
    Builtin::new("find", find),
    Builtin::new("count", count),
    Builtin::new("startswith", startswith),
    Builtin::new("endswith", endswith),
    Builtin::new("replace", replace),
];

pub(super) const METHODS: &[Builtin] = &[
    Builtin::new("upper", upper),
    Builtin::new("lower", lower),
    Builtin::new("title", title),
    Builtin::new("strip", strip),
    Builtin::new("lstrip", lstrip),
    Builtin::new("rstrip", rstrip),
    Builtin::new("isalpha", isalpha),
    Builtin::new("isdigit", isdigit),
    Builtin::new("isalnum", isalnum),
    Builtin::new("split", split),
    Builtin::new("join", join),
    Builtin::new("find", find),
    Builtin::new("count", count),
    Builtin::new("startswith", startswith),
    Builtin::new("endswith", endswith),
    Builtin::new("replace", replace),
];

// ============================================================================
// Case and Whitespace
// ============================================================================

fn map_text(interp: &Interpreter, name: &str, args: &[Value], f: impl FnOnce(&str) -> String) -> Result<Value, Fault> {
    arity(interp, name, args, 1, 1)?;
    let text = args::text(interp, name, &args[0])?;
    Ok(Value::str(f(&text)))
}

fn upper(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    map_text(interp, "upper", &args, str::to_uppercase)
}

fn lower(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    map_text(interp, "lower", &args, str::to_lowercase)
}

/// Uppercase the first letter of every run of letters, lowercase the rest.
fn title(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    map_text(interp, "title", &args, |text| {
        let mut out = String::with_capacity(text.len());
        let mut in_word = false;
        for c in text.chars() {
            if c.is_alphabetic() {
                if in_word {
                    out.extend(c.to_lowercase());
                } else {
                    out.extend(c.to_uppercase());
                }
                in_word = true;
            } else {
                out.push(c);
                in_word = false;
            }
        }
        out
    })
}

fn strip(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    map_text(interp, "strip", &args, |text| text.trim().to_string())
}

fn lstrip(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    map_text(interp, "lstrip", &args, |text| text.trim_start().to_string())
}

fn rstrip(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    map_text(interp, "rstrip", &args, |text| text.trim_end().to_string())
}

// ============================================================================
// Character Classes
// ============================================================================

fn test_text(interp: &Interpreter, name: &str, args: &[Value], f: impl Fn(char) -> bool) -> Result<Value, Fault> {
    arity(interp, name, args, 1, 1)?;
    let text = args::text(interp, name, &args[0])?;
    Ok(Value::Bool(!text.is_empty() && text.chars().all(f)))
}

fn isalpha(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    test_text(interp, "isalpha", &args, char::is_alphabetic)
}

fn isdigit(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    test_text(interp, "isdigit", &args, |c| c.is_ascii_digit())
}

fn isalnum(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    test_text(interp, "isalnum", &args, char::is_alphanumeric)
}

// ============================================================================
// Searching and Splitting
// ============================================================================

/// `split(x)` splits on runs of whitespace; `split(x, sep)` on `sep`.
fn split(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    arity(interp, "split", &args, 1, 2)?;
    let text = args::text(interp, "split", &args[0])?;
    let parts: Vec<Value> = match args.get(1) {
        None | Some(Value::None) => text.split_whitespace().map(Value::from).collect(),
        Some(separator) => {
            let separator = args::text(interp, "split", separator)?;
            if separator.is_empty() {
                return Err(interp.error(crate::evaluator::ErrorKind::Value, "cannot split on empty text"));
            }
            text.split(separator.as_ref()).map(Value::from).collect()
        }
    };
    Ok(Value::list(parts))
}

/// `join(glue, xs)`: items are shown as `print` would show them.
fn join(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    arity(interp, "join", &args, 2, 2)?;
    let glue = args::text(interp, "join", &args[0])?;
    let items = interp.collect(&args[1])?;
    let mut joined = String::new();
    for (i, item) in items.iter().enumerate() {
        let piece = item.to_display_string();
        let glue = if i == 0 { "" } else { glue.as_ref() };
        interp.check_collection_len(joined.len() + glue.len() + piece.len())?;
        joined.push_str(glue);
        joined.push_str(&piece);
    }
    Ok(Value::str(joined))
}

/// Character position of the first match, or -1.
fn find(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    arity(interp, "find", &args, 2, 2)?;
    let text = args::text(interp, "find", &args[0])?;
    let needle = args::text(interp, "find", &args[1])?;
    let position = text
        .find(needle.as_ref())
        .map_or(-1, |byte| text[..byte].chars().count() as i64);
    Ok(Value::Int(position))
}

/// Non-overlapping matches in text, or equal items in a list or tuple.
pub(super) fn count(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    arity(interp, "count", &args, 2, 2)?;
    let count = match &args[0] {
        Value::Str(text) => {
            let needle = args::text(interp, "count", &args[1])?;
            if needle.is_empty() {
                text.chars().count() + 1
            } else {
                text.matches(needle.as_ref()).count()
            }
        }
        Value::List(items) => count_equal(interp, &items.borrow(), &args[1])?,
        Value::Tuple(items) => count_equal(interp, items, &args[1])?,
        other => return Err(args::mismatch(interp, "count", "text or a list", other)),
    };
    Ok(Value::Int(count as i64))
}

fn count_equal(interp: &Interpreter, items: &[Value], item: &Value) -> Result<usize, Fault> {
    let mut count = 0;
    for candidate in items {
        if args::equal(interp, candidate, item)? {
            count += 1;
        }
    }
    Ok(count)
}

fn startswith(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    arity(interp, "startswith", &args, 2, 2)?;
    let text = args::text(interp, "startswith", &args[0])?;
    let prefix = args::text(interp, "startswith", &args[1])?;
    Ok(Value::Bool(text.starts_with(prefix.as_ref())))
}

fn endswith(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    arity(interp, "endswith", &args, 2, 2)?;
    let text = args::text(interp, "endswith", &args[0])?;
    let suffix = args::text(interp, "endswith", &args[1])?;
    Ok(Value::Bool(text.ends_with(suffix.as_ref())))
}

fn replace(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    arity(interp, "replace", &args, 3, 3)?;
    let text = args::text(interp, "replace", &args[0])?;
    let old = args::text(interp, "replace", &args[1])?;
    let new = args::text(interp, "replace", &args[2])?;
    if old.is_empty() {
        return Ok(Value::Str(text));
    }
    let matches = text.matches(old.as_ref()).count();
    let len = (text.len() - matches * old.len()).saturating_add(matches.saturating_mul(new.len()));
    interp.check_collection_len(len)?;
    Ok(Value::str(text.replace(old.as_ref(), &new)))
}
