//! Tree-walking interpreter for validated TALE programs.
//!
//! The interpreter runs a [`Program`](crate::parser::Program) produced by the
//! validator. Its environment holds only what the capability table lists;
//! there is no other route to host functionality.
//!
//! ## Design Principles
//!
//! - **Never panic**: adversarial programs end in a [`Fault`], not a crash
//! - **Cooperative budget**: the deadline and cancellation token are checked
//!   at every statement, loop iteration and call
//! - **Re-checked security**: imports, attributes and names go through the
//!   same checks the validator used
//!
//! ## Example
//!
//! ```ignore
//! let mut interpreter = Interpreter::new(capabilities, &options, inputs, None);
//! let outcome = interpreter.run(&program);
//! println!("{}", interpreter.output());
//! ```

mod error;
mod eval;
mod operators;

#[cfg(test)]
mod eval_test;

pub use error::{ErrorKind, ExecError, Fault, RuntimeError};
pub use eval::Interpreter;
pub(crate) use operators::{normalize_index, position};
