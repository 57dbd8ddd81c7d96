//! The `random` module and the per-run generator behind it.

use super::args::{self, arity};
use crate::evaluator::{ErrorKind, Fault, Interpreter};
use crate::sandbox::{Member, ModuleSpec};
use crate::values::Value;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

pub(super) const MODULE: ModuleSpec = ModuleSpec {
    name: "random",
    members: MEMBERS,
};

const MEMBERS: &[Member] = &[
    Member::function("random", random_random),
    Member::function("randint", random_randint),
    Member::function("uniform", random_uniform),
    Member::function("choice", random_choice),
    Member::function("shuffle", random_shuffle),
    Member::function("seed", random_seed),
];

/// The per-run generator: reproducible from `seed`, or seeded by the OS when
/// `None`.
pub fn generator(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

fn random_random(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    arity(interp, "random", &args, 0, 0)?;
    Ok(Value::Float(interp.rng().r#gen::<f64>()))
}

/// Inclusive at both ends.
fn random_randint(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    arity(interp, "randint", &args, 2, 2)?;
    let low = args::int(interp, "randint", &args[0])?;
    let high = args::int(interp, "randint", &args[1])?;
    if low > high {
        return Err(interp.error(
            ErrorKind::Value,
            format!("randint needs the low end first, but {} > {}", low, high),
        ));
    }
    Ok(Value::Int(interp.rng().gen_range(low..=high)))
}

/// Either end may be the larger one.
fn random_uniform(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    arity(interp, "uniform", &args, 2, 2)?;
    let low = args::number(interp, "uniform", &args[0])?;
    let high = args::number(interp, "uniform", &args[1])?;
    let t = interp.rng().r#gen::<f64>();
    Ok(Value::Float(low + (high - low) * t))
}

fn random_choice(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    arity(interp, "choice", &args, 1, 1)?;
    let mut items = interp.collect(&args[0])?;
    if items.is_empty() {
        return Err(interp.error(ErrorKind::Index, "cannot choose from an empty collection"));
    }
    let index = interp.rng().gen_range(0..items.len());
    Ok(items.swap_remove(index))
}

fn random_shuffle(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    arity(interp, "shuffle", &args, 1, 1)?;
    let Value::List(items) = &args[0] else {
        return Err(args::mismatch(interp, "shuffle", "a list", &args[0]));
    };
    items.borrow_mut().shuffle(interp.rng());
    Ok(Value::None)
}

fn random_seed(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    arity(interp, "seed", &args, 1, 1)?;
    let seed = args::int(interp, "seed", &args[0])?;
    *interp.rng() = generator(Some(seed as u64));
    Ok(Value::None)
}
