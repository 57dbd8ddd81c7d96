//! Callable values: user functions, lambdas and native builtins.

use super::Value;
use crate::evaluator::{Fault, Interpreter};
use crate::parser::{Expr, FunctionDef};
use hashbrown::HashMap;
use std::fmt;
use std::rc::Rc;

/// Signature of every native function exposed to programs.
///
/// Natives receive the interpreter so they can write output, pop input,
/// reach the file shim and call back into user functions.
pub type NativeFn = fn(&mut Interpreter, Vec<Value>) -> Result<Value, Fault>;

/// A native function with the name programs see.
#[derive(Clone, Copy)]
pub struct Builtin {
    pub name: &'static str,
    pub func: NativeFn,
}

impl Builtin {
    pub const fn new(name: &'static str, func: NativeFn) -> Self {
        Self { name, func }
    }
}

impl fmt::Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Builtin({})", self.name)
    }
}

#[derive(Debug, Clone)]
pub enum FunctionBody {
    Block(Rc<FunctionDef>),
    Lambda(Rc<Expr>),
}

/// A user-defined function or lambda.
pub struct Function {
    pub name: String,
    pub params: Vec<String>,
    pub body: FunctionBody,
    /// Locals of the enclosing function when this one was created.
    pub captured: Rc<HashMap<String, Value>>,
}

impl Function {
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}
