//! List, dictionary and set helpers.
//!
//! Each helper is also reachable as a method, e.g. `add_to(xs, 1)` and
//! `xs.append(1)` share the same receiver-first calling convention.

use super::args::{self, arity};
use super::builtins::make_set;
use crate::evaluator::{ErrorKind, Fault, Interpreter};
use crate::values::{Builtin, DictCell, Key, ListCell, Table, Value};
use std::rc::Rc;

pub(super) const BUILTINS: &[Builtin] = &[
    Builtin::new("add_to", add_to),
    Builtin::new("extend", extend),
    Builtin::new("insert", insert),
    Builtin::new("remove", remove),
    Builtin::new("clear", clear),
    Builtin::new("sort", sort),
    Builtin::new("reverse", reverse),
    Builtin::new("copy", copy),
    Builtin::new("keys", keys),
    Builtin::new("values", values),
    Builtin::new("items", items),
    Builtin::new("get", get),
    Builtin::new("pop", pop),
    Builtin::new("union", union),
    Builtin::new("intersection", intersection),
    Builtin::new("difference", difference),
    Builtin::new("subset", subset),
];

pub(super) const LIST_METHODS: &[Builtin] = &[
    Builtin::new("append", append),
    Builtin::new("extend", extend),
    Builtin::new("insert", insert),
    Builtin::new("remove", remove),
    Builtin::new("pop", pop),
    Builtin::new("clear", clear),
    Builtin::new("sort", sort),
    Builtin::new("reverse", reverse),
    Builtin::new("copy", copy),
    Builtin::new("index", index),
    Builtin::new("count", super::string::count),
];

pub(super) const TUPLE_METHODS: &[Builtin] = &[
    Builtin::new("index", index),
    Builtin::new("count", super::string::count),
];

pub(super) const DICT_METHODS: &[Builtin] = &[
    Builtin::new("keys", keys),
    Builtin::new("values", values),
    Builtin::new("items", items),
    Builtin::new("get", get),
    Builtin::new("pop", pop),
    Builtin::new("clear", clear),
    Builtin::new("copy", copy),
    Builtin::new("update", update),
];

pub(super) const SET_METHODS: &[Builtin] = &[
    Builtin::new("add", add),
    Builtin::new("remove", remove),
    Builtin::new("discard", discard),
    Builtin::new("pop", pop),
    Builtin::new("clear", clear),
    Builtin::new("copy", copy),
    Builtin::new("union", union),
    Builtin::new("intersection", intersection),
    Builtin::new("difference", difference),
    Builtin::new("issubset", subset),
];

fn list_arg(interp: &Interpreter, name: &str, value: &Value) -> Result<Rc<ListCell>, Fault> {
    match value {
        Value::List(items) => Ok(items.clone()),
        other => Err(args::mismatch(interp, name, "a list", other)),
    }
}

// ============================================================================
// Adding and Removing
// ============================================================================

/// `add v to t`: lists and sets grow in place, numbers and text are summed.
/// The result is assigned back to `t`.
fn add_to(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    arity(interp, "add_to", &args, 2, 2)?;
    let (target, value) = (&args[0], &args[1]);
    match target {
        Value::List(items) => {
            let len = items.borrow().len();
            interp.check_collection_len(len + 1)?;
            items.borrow_mut().push(value.clone());
            Ok(target.clone())
        }
        Value::Set(table) => {
            let key = interp.key_of(value)?;
            table.borrow_mut().insert(key, value.clone(), ());
            Ok(target.clone())
        }
        Value::Int(a) => match value {
            Value::Int(b) => Ok(Value::Int(a.wrapping_add(*b))),
            Value::Float(b) => Ok(Value::Float(*a as f64 + b)),
            other => Err(args::mismatch(interp, "add", "a number", other)),
        },
        Value::Float(a) => Ok(Value::Float(a + args::number(interp, "add", value)?)),
        Value::Str(a) => {
            let b = args::text(interp, "add", value)?;
            interp.check_collection_len(a.len() + b.len())?;
            Ok(Value::str(format!("{}{}", a, b)))
        }
        other => Err(interp.error(
            ErrorKind::Type,
            format!("cannot add to {}", other.type_name()),
        )),
    }
}

fn append(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    arity(interp, "append", &args, 2, 2)?;
    let items = list_arg(interp, "append", &args[0])?;
    let len = items.borrow().len();
    interp.check_collection_len(len + 1)?;
    items.borrow_mut().push(args[1].clone());
    Ok(Value::None)
}

fn add(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    arity(interp, "add", &args, 2, 2)?;
    match &args[0] {
        Value::Set(table) => {
            let key = interp.key_of(&args[1])?;
            table.borrow_mut().insert(key, args[1].clone(), ());
            Ok(Value::None)
        }
        other => Err(args::mismatch(interp, "add", "a set", other)),
    }
}

/// `extend t with e`: append every item of `e`.
fn extend(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    arity(interp, "extend", &args, 2, 2)?;
    let extra = interp.collect(&args[1])?;
    match &args[0] {
        Value::List(items) => {
            let len = items.borrow().len();
            interp.check_collection_len(len + extra.len())?;
            items.borrow_mut().extend(extra);
        }
        Value::Set(table) => {
            for item in extra {
                let key = interp.key_of(&item)?;
                table.borrow_mut().insert(key, item, ());
            }
        }
        other => return Err(args::mismatch(interp, "extend", "a list or set", other)),
    }
    Ok(Value::None)
}

/// `insert(l, i, v)`. Out-of-range positions insert at the nearest end.
fn insert(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    arity(interp, "insert", &args, 3, 3)?;
    let items = list_arg(interp, "insert", &args[0])?;
    let position = args::int(interp, "insert", &args[1])?;
    let mut items = items.borrow_mut();
    let len = items.len() as i64;
    let position = if position < 0 { position + len } else { position };
    items.insert(position.clamp(0, len) as usize, args[2].clone());
    Ok(Value::None)
}

/// `remove v from l`: the first equal item of a list, or a set/dict key.
fn remove(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    arity(interp, "remove", &args, 2, 2)?;
    let value = &args[1];
    match &args[0] {
        Value::List(items) => {
            let position = args::position(interp, &items.borrow(), value)?;
            match position {
                Some(i) => {
                    items.borrow_mut().remove(i);
                    Ok(Value::None)
                }
                None => Err(interp.error(
                    ErrorKind::Value,
                    format!("{} is not in the list", value.repr()),
                )),
            }
        }
        Value::Set(table) => remove_key(interp, &mut table.borrow_mut(), value).map(|_| Value::None),
        Value::Dict(table) => remove_key(interp, &mut table.borrow_mut(), value).map(|_| Value::None),
        other => Err(args::mismatch(interp, "remove", "a list, set or dict", other)),
    }
}

fn remove_key<V>(interp: &Interpreter, table: &mut Table<V>, key: &Value) -> Result<V, Fault> {
    let hashed = interp.key_of(key)?;
    table
        .remove(&hashed)
        .map(|(_, value)| value)
        .ok_or_else(|| interp.error(ErrorKind::Key, format!("key {} not found", key.repr())))
}

fn discard(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    arity(interp, "discard", &args, 2, 2)?;
    match &args[0] {
        Value::Set(table) => {
            let key = interp.key_of(&args[1])?;
            table.borrow_mut().remove(&key);
            Ok(Value::None)
        }
        other => Err(args::mismatch(interp, "discard", "a set", other)),
    }
}

fn clear(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    arity(interp, "clear", &args, 1, 1)?;
    match &args[0] {
        Value::List(items) => items.borrow_mut().clear(),
        Value::Dict(table) => table.borrow_mut().clear(),
        Value::Set(table) => table.borrow_mut().clear(),
        other => return Err(args::mismatch(interp, "clear", "a list, dict or set", other)),
    }
    Ok(Value::None)
}

/// `pop l`, `pop l i`, `pop d k [default]` or `pop s`.
fn pop(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    arity(interp, "pop", &args, 1, 3)?;
    match &args[0] {
        Value::List(items) => {
            let mut items = items.borrow_mut();
            let len = items.len();
            let position = match args.get(1) {
                Some(index) => args::int(interp, "pop", index)?,
                None => len as i64 - 1,
            };
            let position = if position < 0 { position + len as i64 } else { position };
            if len == 0 || !(0..len as i64).contains(&position) {
                return Err(interp.error(ErrorKind::Index, "pop from an empty list or past its end"));
            }
            Ok(items.remove(position as usize))
        }
        Value::Dict(table) => {
            let Some(key) = args.get(1) else {
                return Err(interp.error(ErrorKind::Type, "`pop` on a dict needs a key"));
            };
            match (remove_key(interp, &mut table.borrow_mut(), key), args.get(2)) {
                (Ok(value), _) => Ok(value),
                (Err(_), Some(default)) => Ok(default.clone()),
                (Err(fault), None) => Err(fault),
            }
        }
        Value::Set(table) => table
            .borrow_mut()
            .pop_last()
            .map(|(item, _)| item)
            .ok_or_else(|| interp.error(ErrorKind::Key, "pop from an empty set")),
        other => Err(args::mismatch(interp, "pop", "a list, dict or set", other)),
    }
}

// ============================================================================
// Ordering
// ============================================================================

fn sort(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    arity(interp, "sort", &args, 1, 1)?;
    let items = list_arg(interp, "sort", &args[0])?;
    let unsorted = items.borrow().clone();
    let sorted = args::sort_values(interp, unsorted)?;
    *items.borrow_mut() = sorted;
    Ok(Value::None)
}

fn reverse(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    arity(interp, "reverse", &args, 1, 1)?;
    list_arg(interp, "reverse", &args[0])?.borrow_mut().reverse();
    Ok(Value::None)
}

/// Shallow copy; immutable values are returned as they are.
fn copy(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    arity(interp, "copy", &args, 1, 1)?;
    Ok(match &args[0] {
        Value::List(items) => Value::list(items.borrow().clone()),
        Value::Dict(table) => Value::dict(table.borrow().clone()),
        Value::Set(table) => Value::set(table.borrow().clone()),
        other => other.clone(),
    })
}

/// Position of the first equal item.
fn index(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    arity(interp, "index", &args, 2, 2)?;
    let position = match &args[0] {
        Value::List(items) => args::position(interp, &items.borrow(), &args[1])?,
        Value::Tuple(items) => args::position(interp, items, &args[1])?,
        other => return Err(args::mismatch(interp, "index", "a list", other)),
    };
    position.map(|i| Value::Int(i as i64)).ok_or_else(|| {
        interp.error(
            ErrorKind::Value,
            format!("{} is not in the list", args[1].repr()),
        )
    })
}

// ============================================================================
// Dictionaries
// ============================================================================

fn dict_arg(interp: &Interpreter, name: &str, value: &Value) -> Result<Rc<DictCell>, Fault> {
    match value {
        Value::Dict(table) => Ok(table.clone()),
        other => Err(args::mismatch(interp, name, "a dict", other)),
    }
}

fn keys(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    arity(interp, "keys", &args, 1, 1)?;
    let table = dict_arg(interp, "keys", &args[0])?;
    let keys = table.borrow().keys().cloned().collect();
    Ok(Value::list(keys))
}

fn values(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    arity(interp, "values", &args, 1, 1)?;
    let table = dict_arg(interp, "values", &args[0])?;
    let values = table.borrow().iter().map(|(_, value)| value.clone()).collect();
    Ok(Value::list(values))
}

fn items(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    arity(interp, "items", &args, 1, 1)?;
    let table = dict_arg(interp, "items", &args[0])?;
    let pairs = table
        .borrow()
        .iter()
        .map(|(key, value)| Value::tuple(vec![key.clone(), value.clone()]))
        .collect();
    Ok(Value::list(pairs))
}

/// `get(d, k [, default])`; also accepts a list and an index.
fn get(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    arity(interp, "get", &args, 2, 3)?;
    let default = args.get(2).cloned().unwrap_or(Value::None);
    match &args[0] {
        Value::Dict(table) => {
            let key = interp.key_of(&args[1])?;
            Ok(table.borrow().get(&key).cloned().unwrap_or(default))
        }
        Value::List(items) => {
            let position = args::int(interp, "get", &args[1])?;
            let items = items.borrow();
            Ok(crate::evaluator::normalize_index(position, items.len())
                .map(|i| items[i].clone())
                .unwrap_or(default))
        }
        other => Err(args::mismatch(interp, "get", "a dict", other)),
    }
}

fn update(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    arity(interp, "update", &args, 2, 2)?;
    let target = dict_arg(interp, "update", &args[0])?;
    let source = dict_arg(interp, "update", &args[1])?;
    if Rc::ptr_eq(&target, &source) {
        return Ok(Value::None);
    }
    let entries = source
        .borrow()
        .iter()
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect::<Vec<_>>();
    let mut target = target.borrow_mut();
    for (key, value) in entries {
        let hashed = interp.key_of(&key)?;
        target.insert(hashed, key, value);
    }
    Ok(Value::None)
}

// ============================================================================
// Set Operations
// ============================================================================

/// Items and keys of a set, or of any collection turned into one.
fn set_items(interp: &Interpreter, value: &Value) -> Result<Vec<(Key, Value)>, Fault> {
    interp
        .collect(value)?
        .into_iter()
        .map(|item| interp.key_of(&item).map(|key| (key, item)))
        .collect()
}

fn union(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    arity(interp, "union", &args, 2, 2)?;
    let mut items = interp.collect(&args[0])?;
    items.extend(interp.collect(&args[1])?);
    make_set(interp, items)
}

fn intersection(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    arity(interp, "intersection", &args, 2, 2)?;
    let other = make_set_table(interp, &args[1])?;
    let kept = set_items(interp, &args[0])?
        .into_iter()
        .filter(|(key, _)| other.contains(key))
        .map(|(_, item)| item)
        .collect();
    make_set(interp, kept)
}

fn difference(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    arity(interp, "difference", &args, 2, 2)?;
    let other = make_set_table(interp, &args[1])?;
    let kept = set_items(interp, &args[0])?
        .into_iter()
        .filter(|(key, _)| !other.contains(key))
        .map(|(_, item)| item)
        .collect();
    make_set(interp, kept)
}

/// Whether every item of the first collection is in the second.
fn subset(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    arity(interp, "subset", &args, 2, 2)?;
    let other = make_set_table(interp, &args[1])?;
    let inside = set_items(interp, &args[0])?.iter().all(|(key, _)| other.contains(key));
    Ok(Value::Bool(inside))
}

fn make_set_table(interp: &Interpreter, value: &Value) -> Result<Table<()>, Fault> {
    let mut table = Table::new();
    for (key, item) in set_items(interp, value)? {
        table.insert(key, item, ());
    }
    Ok(table)
}
