//! The `math` module.

use super::args::{self, arity};
use super::builtins::float_to_int;
use crate::evaluator::{ErrorKind, Fault, Interpreter};
use crate::sandbox::{Member, ModuleSpec};
use crate::values::Value;

pub(super) const MODULE: ModuleSpec = ModuleSpec {
    name: "math",
    members: MEMBERS,
};

const MEMBERS: &[Member] = &[
    Member::float("pi", std::f64::consts::PI),
    Member::float("e", std::f64::consts::E),
    Member::float("tau", std::f64::consts::TAU),
    Member::float("inf", f64::INFINITY),
    Member::function("sqrt", math_sqrt),
    Member::function("pow", math_pow),
    Member::function("floor", math_floor),
    Member::function("ceil", math_ceil),
    Member::function("trunc", math_trunc),
    Member::function("fabs", math_fabs),
    Member::function("sin", math_sin),
    Member::function("cos", math_cos),
    Member::function("tan", math_tan),
    Member::function("atan2", math_atan2),
    Member::function("log", math_log),
    Member::function("log10", math_log10),
    Member::function("exp", math_exp),
    Member::function("factorial", math_factorial),
    Member::function("gcd", math_gcd),
    Member::function("hypot", math_hypot),
    Member::function("isclose", math_isclose),
];

fn domain_error(interp: &Interpreter) -> Fault {
    interp.error(ErrorKind::Value, "math domain error")
}

/// Apply `f` to one numeric argument.
fn unary(interp: &Interpreter, name: &str, args: &[Value], f: fn(f64) -> f64) -> Result<Value, Fault> {
    arity(interp, name, args, 1, 1)?;
    let x = args::number(interp, name, &args[0])?;
    Ok(Value::Float(f(x)))
}

// ============================================================================
// Powers and Roots
// ============================================================================

fn math_sqrt(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    arity(interp, "sqrt", &args, 1, 1)?;
    let x = args::number(interp, "sqrt", &args[0])?;
    if x < 0.0 {
        return Err(domain_error(interp));
    }
    Ok(Value::Float(x.sqrt()))
}

fn math_pow(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    arity(interp, "pow", &args, 2, 2)?;
    let base = args::number(interp, "pow", &args[0])?;
    let exponent = args::number(interp, "pow", &args[1])?;
    let result = base.powf(exponent);
    if result.is_nan() && !base.is_nan() && !exponent.is_nan() {
        return Err(domain_error(interp));
    }
    Ok(Value::Float(result))
}

fn math_exp(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    unary(interp, "exp", &args, f64::exp)
}

/// `log(x)` is the natural logarithm; `log(x, base)` any other.
fn math_log(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    arity(interp, "log", &args, 1, 2)?;
    let x = args::number(interp, "log", &args[0])?;
    if x <= 0.0 {
        return Err(domain_error(interp));
    }
    match args.get(1) {
        None => Ok(Value::Float(x.ln())),
        Some(base) => {
            let base = args::number(interp, "log", base)?;
            if base <= 0.0 || base == 1.0 {
                return Err(domain_error(interp));
            }
            Ok(Value::Float(x.ln() / base.ln()))
        }
    }
}

fn math_log10(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    arity(interp, "log10", &args, 1, 1)?;
    let x = args::number(interp, "log10", &args[0])?;
    if x <= 0.0 {
        return Err(domain_error(interp));
    }
    Ok(Value::Float(x.log10()))
}

fn math_hypot(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    arity(interp, "hypot", &args, 2, 2)?;
    let x = args::number(interp, "hypot", &args[0])?;
    let y = args::number(interp, "hypot", &args[1])?;
    Ok(Value::Float(x.hypot(y)))
}

// ============================================================================
// Rounding
// ============================================================================

fn rounded(interp: &Interpreter, name: &str, args: &[Value], f: fn(f64) -> f64) -> Result<Value, Fault> {
    arity(interp, name, args, 1, 1)?;
    match &args[0] {
        Value::Int(n) => Ok(Value::Int(*n)),
        other => {
            let x = args::number(interp, name, other)?;
            float_to_int(interp, f(x))
        }
    }
}

fn math_floor(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    rounded(interp, "floor", &args, f64::floor)
}

fn math_ceil(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    rounded(interp, "ceil", &args, f64::ceil)
}

fn math_trunc(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    rounded(interp, "trunc", &args, f64::trunc)
}

fn math_fabs(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    unary(interp, "fabs", &args, f64::abs)
}

// ============================================================================
// Trigonometry
// ============================================================================

fn math_sin(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    unary(interp, "sin", &args, f64::sin)
}

fn math_cos(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    unary(interp, "cos", &args, f64::cos)
}

fn math_tan(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    unary(interp, "tan", &args, f64::tan)
}

fn math_atan2(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    arity(interp, "atan2", &args, 2, 2)?;
    let y = args::number(interp, "atan2", &args[0])?;
    let x = args::number(interp, "atan2", &args[1])?;
    Ok(Value::Float(y.atan2(x)))
}

// ============================================================================
// Integers
// ============================================================================

fn math_factorial(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    arity(interp, "factorial", &args, 1, 1)?;
    let n = args::int(interp, "factorial", &args[0])?;
    if n < 0 {
        return Err(interp.error(ErrorKind::Value, "factorial is not defined for negative numbers"));
    }
    (1..=n)
        .try_fold(1i64, |acc, k| acc.checked_mul(k))
        .map(Value::Int)
        .ok_or_else(|| interp.error(ErrorKind::Value, format!("factorial({}) is too large", n)))
}

fn math_gcd(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    arity(interp, "gcd", &args, 2, 2)?;
    let mut a = args::int(interp, "gcd", &args[0])?.unsigned_abs();
    let mut b = args::int(interp, "gcd", &args[1])?.unsigned_abs();
    while b != 0 {
        (a, b) = (b, a % b);
    }
    Ok(Value::Int(a as i64))
}

fn math_isclose(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    arity(interp, "isclose", &args, 2, 2)?;
    let a = args::number(interp, "isclose", &args[0])?;
    let b = args::number(interp, "isclose", &args[1])?;
    let tolerance = 1e-9 * a.abs().max(b.abs());
    Ok(Value::Bool(a == b || (a - b).abs() <= tolerance))
}
