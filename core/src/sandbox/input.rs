//! Deterministic input for `ask`.

use crate::values::Value;
use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

lazy_static! {
    static ref INTEGER: Regex = Regex::new(r"^[+-]?\d+$").unwrap();
    static ref DECIMAL: Regex = Regex::new(r"^[+-]?(\d+\.\d*|\d*\.\d+)$").unwrap();
}

/// The program asked for more values than were supplied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", describe_exhaustion(.ordinal, .prompt))]
pub struct InputExhausted {
    /// 1-based number of the `ask` that found the queue empty.
    pub ordinal: usize,
    pub prompt: Option<String>,
}

fn describe_exhaustion(ordinal: &usize, prompt: &Option<String>) -> String {
    let which = match prompt.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
        Some(prompt) => format!("input #{} (\"{}\")", ordinal, prompt),
        None => format!("input #{}", ordinal),
    };
    format!(
        "No more inputs were supplied for {}. Add values in the Inputs box (one per line).",
        which
    )
}

/// Supplied input values with a read cursor that only moves forward.
#[derive(Debug, Clone, Default)]
pub struct InputQueue {
    values: Vec<String>,
    cursor: usize,
}

impl InputQueue {
    pub fn new(values: Vec<String>) -> Self {
        Self { values, cursor: 0 }
    }

    /// Values not yet consumed.
    pub fn remaining(&self) -> usize {
        self.values.len() - self.cursor
    }

    /// Pop the next value, coerced.
    pub fn next(&mut self, prompt: Option<&str>) -> Result<Value, InputExhausted> {
        let ordinal = self.cursor + 1;
        match self.values.get(self.cursor) {
            Some(raw) => {
                self.cursor += 1;
                Ok(coerce(raw))
            }
            None => Err(InputExhausted {
                ordinal,
                prompt: prompt.map(str::to_string),
            }),
        }
    }
}

/// Integer text becomes an integer, decimal text a decimal, anything else
/// stays text. Integers that do not fit in 64 bits stay text.
pub fn coerce(raw: &str) -> Value {
    if INTEGER.is_match(raw) {
        return match raw.parse::<i64>() {
            Ok(n) => Value::Int(n),
            Err(_) => Value::str(raw),
        };
    }
    if DECIMAL.is_match(raw) {
        if let Ok(x) = raw.parse::<f64>() {
            return Value::Float(x);
        }
    }
    Value::str(raw)
}
