//! TALE Standard Library
//!
//! The builtins and allow-listed modules that make up the standard
//! capability table:
//! - Core builtins: printing, input, conversions, aggregates
//! - Text and collection helpers, also reachable as methods
//! - Modules: `math`, `random`, `datetime`, `json`, `csv`
//! - File shim entry points: `open`, `read`, `write`, `close` and the
//!   `read_json` / `write_json` / `read_csv` / `write_csv` helpers
//!
//! Every native has the [`NativeFn`](crate::values::NativeFn) signature and
//! reports failures as a [`Fault`](crate::evaluator::Fault) at the current
//! line.

mod args;
mod builtins;
mod collections;
mod csv;
mod datetime;
mod files;
mod json;
mod math;
mod random;
mod string;

pub use random::generator;

use crate::sandbox::ModuleSpec;
use crate::values::{Builtin, Value};

/// Every standard builtin, in registration order.
pub fn builtins() -> Vec<Builtin> {
    [
        builtins::BUILTINS,
        string::BUILTINS,
        collections::BUILTINS,
        files::BUILTINS,
        json::BUILTINS,
        csv::BUILTINS,
    ]
    .concat()
}

/// The allow-listed modules.
pub fn modules() -> Vec<ModuleSpec> {
    vec![math::MODULE, random::MODULE, datetime::MODULE, json::MODULE, csv::MODULE]
}

/// The native method `name` on a builtin value, if it has one.
pub(crate) fn method(value: &Value, name: &str) -> Option<Builtin> {
    let methods = match value {
        Value::Str(_) => string::METHODS,
        Value::List(_) => collections::LIST_METHODS,
        Value::Tuple(_) => collections::TUPLE_METHODS,
        Value::Dict(_) => collections::DICT_METHODS,
        Value::Set(_) => collections::SET_METHODS,
        Value::File(_) => files::METHODS,
        _ => return None,
    };
    methods.iter().find(|method| method.name == name).copied()
}
