//! The `datetime` module.
//!
//! Every function reads the run's [`Clock`](crate::api::Clock), so a host that fixes the clock
//! gets reproducible output. Times are local and carry no zone.

use super::args::{self, arity};
use crate::evaluator::{ErrorKind, Fault, Interpreter};
use crate::sandbox::{Member, ModuleSpec};
use crate::values::Value;
use chrono::format::{Item, StrftimeItems};
use chrono::{Datelike, NaiveDateTime, Timelike};
use std::fmt::Write;

pub(super) const MODULE: ModuleSpec = ModuleSpec {
    name: "datetime",
    members: MEMBERS,
};

const MEMBERS: &[Member] = &[
    Member::function("now", datetime_now),
    Member::function("today", datetime_today),
    Member::function("year", datetime_year),
    Member::function("month", datetime_month),
    Member::function("day", datetime_day),
    Member::function("hour", datetime_hour),
    Member::function("minute", datetime_minute),
    Member::function("second", datetime_second),
    Member::function("weekday", datetime_weekday),
    Member::function("format", datetime_format),
];

fn now(interp: &Interpreter, name: &str, args: &[Value]) -> Result<NaiveDateTime, Fault> {
    arity(interp, name, args, 0, 0)?;
    Ok(interp.clock().now())
}

fn datetime_now(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    let time = now(interp, "now", &args)?;
    Ok(Value::str(time.format("%Y-%m-%d %H:%M:%S").to_string()))
}

fn datetime_today(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    let time = now(interp, "today", &args)?;
    Ok(Value::str(time.format("%Y-%m-%d").to_string()))
}

fn datetime_year(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    Ok(Value::Int(now(interp, "year", &args)?.year() as i64))
}

fn datetime_month(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    Ok(Value::Int(now(interp, "month", &args)?.month() as i64))
}

fn datetime_day(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    Ok(Value::Int(now(interp, "day", &args)?.day() as i64))
}

fn datetime_hour(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    Ok(Value::Int(now(interp, "hour", &args)?.hour() as i64))
}

fn datetime_minute(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    Ok(Value::Int(now(interp, "minute", &args)?.minute() as i64))
}

fn datetime_second(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    Ok(Value::Int(now(interp, "second", &args)?.second() as i64))
}

/// Full English day name, e.g. `Monday`.
fn datetime_weekday(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    let time = now(interp, "weekday", &args)?;
    Ok(Value::str(time.format("%A").to_string()))
}

/// `format(pattern)` with strftime directives.
fn datetime_format(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    arity(interp, "format", &args, 1, 1)?;
    let pattern = args::text(interp, "format", &args[0])?;
    let invalid = || interp.error(ErrorKind::Value, format!("\"{}\" is not a valid date format", pattern));
    if StrftimeItems::new(&pattern).any(|item| matches!(item, Item::Error)) {
        return Err(invalid());
    }
    let mut out = String::new();
    write!(out, "{}", interp.clock().now().format(&pattern)).map_err(|_| invalid())?;
    Ok(Value::str(out))
}
