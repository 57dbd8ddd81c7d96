//! JSON through serde_json: the `json` module and the `read_json` /
//! `write_json` file helpers.

use super::args::{self, arity};
use crate::evaluator::{ErrorKind, Fault, Interpreter};
use crate::sandbox::{Member, ModuleSpec};
use crate::values::{Builtin, Key, Table, Value, format_float};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;

/// Deepest nesting converted either way. Self-containing lists hit this
/// instead of recursing forever.
const MAX_DEPTH: usize = 64;

pub(super) const MODULE: ModuleSpec = ModuleSpec {
    name: "json",
    members: MEMBERS,
};

const MEMBERS: &[Member] = &[
    Member::function("loads", json_loads),
    Member::function("dumps", json_dumps),
];

pub(super) const BUILTINS: &[Builtin] = &[
    Builtin::new("read_json", read_json),
    Builtin::new("write_json", write_json),
];

// ============================================================================
// Conversion
// ============================================================================

fn to_json(interp: &Interpreter, value: &Value, depth: usize) -> Result<serde_json::Value, Fault> {
    if depth > MAX_DEPTH {
        return Err(interp.error(ErrorKind::Value, "the data is nested too deeply to turn into JSON"));
    }
    let json = match value {
        Value::None => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Int(n) => serde_json::Value::from(*n),
        Value::Float(x) => serde_json::Number::from_f64(*x)
            .map(serde_json::Value::Number)
            .ok_or_else(|| interp.error(ErrorKind::Value, format!("{} cannot be written as JSON", format_float(*x))))?,
        Value::Str(s) => serde_json::Value::String(s.to_string()),
        Value::List(items) => {
            let items = items.borrow().clone();
            array(interp, &items, depth)?
        }
        Value::Tuple(items) => array(interp, items, depth)?,
        Value::Dict(table) => {
            let entries: Vec<(Value, Value)> = table
                .borrow()
                .iter()
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect();
            let mut object = serde_json::Map::with_capacity(entries.len());
            for (key, value) in entries {
                let key = match key {
                    Value::Str(s) => s.to_string(),
                    Value::Int(_) | Value::Float(_) | Value::Bool(_) | Value::None => {
                        serde_json::to_string(&to_json(interp, &key, depth + 1)?).map_err(|err| json_error(interp, err))?
                    }
                    other => {
                        return Err(interp.error(
                            ErrorKind::Type,
                            format!("JSON keys must be text or numbers, not {}", other.type_name()),
                        ));
                    }
                };
                object.insert(key, to_json(interp, &value, depth + 1)?);
            }
            serde_json::Value::Object(object)
        }
        other => {
            return Err(interp.error(
                ErrorKind::Type,
                format!("{} cannot be written as JSON", other.type_name()),
            ));
        }
    };
    Ok(json)
}

fn array(interp: &Interpreter, items: &[Value], depth: usize) -> Result<serde_json::Value, Fault> {
    items
        .iter()
        .map(|item| to_json(interp, item, depth + 1))
        .collect::<Result<Vec<_>, _>>()
        .map(serde_json::Value::Array)
}

fn from_json(interp: &Interpreter, json: serde_json::Value, depth: usize) -> Result<Value, Fault> {
    if depth > MAX_DEPTH {
        return Err(interp.error(ErrorKind::Value, "the JSON is nested too deeply"));
    }
    let value = match json {
        serde_json::Value::Null => Value::None,
        serde_json::Value::Bool(b) => Value::Bool(b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(n) => Value::Int(n),
            None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
        },
        serde_json::Value::String(s) => Value::str(s),
        serde_json::Value::Array(items) => Value::list(
            items
                .into_iter()
                .map(|item| from_json(interp, item, depth + 1))
                .collect::<Result<_, _>>()?,
        ),
        serde_json::Value::Object(object) => {
            let mut table = Table::new();
            for (key, value) in object {
                let key = Value::str(key);
                let value = from_json(interp, value, depth + 1)?;
                if let Some(hashed) = Key::of(&key) {
                    table.insert(hashed, key, value);
                }
            }
            Value::dict(table)
        }
    };
    Ok(value)
}

fn json_error(interp: &Interpreter, err: serde_json::Error) -> Fault {
    interp.error(ErrorKind::Value, format!("invalid JSON: {}", err))
}

/// Render `json` with `indent` spaces per level, or compactly.
fn render(interp: &Interpreter, json: &serde_json::Value, indent: Option<usize>) -> Result<String, Fault> {
    let Some(indent) = indent else {
        return serde_json::to_string(json).map_err(|err| json_error(interp, err));
    };
    let indent = " ".repeat(indent);
    let mut out = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(indent.as_bytes()));
    json.serialize(&mut serializer).map_err(|err| json_error(interp, err))?;
    String::from_utf8(out).map_err(|err| interp.error(ErrorKind::Value, err.to_string()))
}

// ============================================================================
// Module functions
// ============================================================================

fn json_loads(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    arity(interp, "loads", &args, 1, 1)?;
    let text = args::text(interp, "loads", &args[0])?;
    let json = serde_json::from_str(&text).map_err(|err| json_error(interp, err))?;
    from_json(interp, json, 0)
}

/// `dumps(value)` or `dumps(value, indent)`.
fn json_dumps(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    arity(interp, "dumps", &args, 1, 2)?;
    let indent = match args.get(1) {
        None | Some(Value::None) => None,
        Some(indent) => Some(args::int(interp, "dumps", indent)?.clamp(0, 16) as usize),
    };
    let json = to_json(interp, &args[0], 0)?;
    let text = render(interp, &json, indent)?;
    interp.check_collection_len(text.len())?;
    Ok(Value::str(text))
}

// ============================================================================
// File helpers
// ============================================================================

fn read_json(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    arity(interp, "read_json", &args, 1, 1)?;
    let path = args::text(interp, "read_json", &args[0])?;
    let text = super::files::read_path(interp, &path)?;
    let json = serde_json::from_str(&text).map_err(|err| json_error(interp, err))?;
    from_json(interp, json, 0)
}

/// Pretty-printed with two-space indentation.
fn write_json(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    arity(interp, "write_json", &args, 2, 2)?;
    let path = args::text(interp, "write_json", &args[1])?;
    let json = to_json(interp, &args[0], 0)?;
    let text = render(interp, &json, Some(2))?;
    super::files::write_path(interp, &path, &text, false)?;
    Ok(Value::None)
}
