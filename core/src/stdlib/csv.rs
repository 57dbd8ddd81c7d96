//! Comma-separated values: the `csv` module and the `read_csv` /
//! `write_csv` file helpers.
//!
//! Fields are always text. A field is quoted on output when it contains a
//! comma, a quote or a line break; quotes inside are doubled.

use super::args::{self, arity};
use crate::evaluator::{Fault, Interpreter};
use crate::sandbox::{Member, ModuleSpec};
use crate::values::{Builtin, Value};

pub(super) const MODULE: ModuleSpec = ModuleSpec {
    name: "csv",
    members: MEMBERS,
};

const MEMBERS: &[Member] = &[
    Member::function("parse", csv_parse),
    Member::function("format", csv_format),
];

pub(super) const BUILTINS: &[Builtin] = &[
    Builtin::new("read_csv", read_csv),
    Builtin::new("write_csv", write_csv),
];

/// Split `text` into rows of fields. A final line break does not start a
/// new row; a blank line is an empty row.
pub(crate) fn parse(text: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut row = Vec::new();
    let mut field = String::new();
    let mut quoted = false;
    let mut at_field_start = true;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if quoted {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => quoted = false,
                c => field.push(c),
            }
            continue;
        }
        match c {
            '"' if at_field_start => {
                quoted = true;
                at_field_start = false;
            }
            ',' => {
                row.push(std::mem::take(&mut field));
                at_field_start = true;
            }
            '\r' | '\n' => {
                if c == '\r' && chars.peek() == Some(&'\n') {
                    chars.next();
                }
                if !row.is_empty() || !field.is_empty() || !at_field_start {
                    row.push(std::mem::take(&mut field));
                }
                rows.push(std::mem::take(&mut row));
                at_field_start = true;
            }
            c => {
                field.push(c);
                at_field_start = false;
            }
        }
    }
    if !row.is_empty() || !field.is_empty() || !at_field_start {
        row.push(field);
        rows.push(row);
    }
    rows
}

/// Render rows, one per line, each line ending in `\n`.
pub(crate) fn format(rows: &[Vec<String>]) -> String {
    let mut out = String::new();
    for row in rows {
        for (i, field) in row.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            if field.contains([',', '"', '\n', '\r']) {
                out.push('"');
                out.push_str(&field.replace('"', "\"\""));
                out.push('"');
            } else {
                out.push_str(field);
            }
        }
        out.push('\n');
    }
    out
}

fn rows_to_value(rows: Vec<Vec<String>>) -> Value {
    Value::list(
        rows.into_iter()
            .map(|row| Value::list(row.into_iter().map(Value::from).collect()))
            .collect(),
    )
}

fn rows_from_value(interp: &Interpreter, name: &str, value: &Value) -> Result<Vec<Vec<String>>, Fault> {
    interp
        .collect(value)?
        .iter()
        .map(|row| -> Result<Vec<String>, Fault> {
            match row {
                Value::List(_) | Value::Tuple(_) => {
                    Ok(interp.collect(row)?.iter().map(Value::to_display_string).collect())
                }
                other => Err(args::mismatch(interp, name, "rows that are lists", other)),
            }
        })
        .collect()
}

fn csv_parse(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    arity(interp, "parse", &args, 1, 1)?;
    let text = args::text(interp, "parse", &args[0])?;
    Ok(rows_to_value(parse(&text)))
}

fn csv_format(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    arity(interp, "format", &args, 1, 1)?;
    let rows = rows_from_value(interp, "format", &args[0])?;
    let text = format(&rows);
    interp.check_collection_len(text.len())?;
    Ok(Value::str(text))
}

fn read_csv(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    arity(interp, "read_csv", &args, 1, 1)?;
    let path = args::text(interp, "read_csv", &args[0])?;
    let text = super::files::read_path(interp, &path)?;
    Ok(rows_to_value(parse(&text)))
}

fn write_csv(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    arity(interp, "write_csv", &args, 2, 2)?;
    let path = args::text(interp, "write_csv", &args[1])?;
    let rows = rows_from_value(interp, "write_csv", &args[0])?;
    let text = format(&rows);
    interp.check_collection_len(text.len())?;
    super::files::write_path(interp, &path, &text, false)?;
    Ok(Value::None)
}
