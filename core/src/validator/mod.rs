//! Validator.
//!
//! Parses every canonical line with the pest grammar and assembles the
//! block-shaped [`TransformedProgram`] into a runnable [`Program`]. Nothing
//! is executed. Alongside parsing it rejects:
//!
//! - imports outside the capability table, and `from` imports of members a
//!   module does not export
//! - `_`-prefixed attributes, attributes of restricted objects and
//!   references to dynamic-evaluation names
//! - statements in the wrong place: `return` outside a function,
//!   `break`/`continue` outside a loop, anything but methods in a class
//!
//! All problems are collected and returned in line order. The security
//! checks here are the same functions the evaluator calls again at run time.

mod error;
mod lower;

#[cfg(test)]
mod validator_test;

pub use error::ValidationError;

use crate::parser::Program;
use crate::sandbox::Capabilities;
use crate::transform::TransformedProgram;
use lower::Lowerer;

/// Check a transformed program and lower it for execution.
pub fn validate(program: &TransformedProgram, capabilities: &Capabilities) -> Result<Program, Vec<ValidationError>> {
    let mut lowerer = Lowerer::new(capabilities);
    let body = lowerer.nodes(&program.nodes);
    let errors = lowerer.finish();

    tracing::debug!(statements = body.len(), errors = errors.len(), "validated program");
    if errors.is_empty() {
        Ok(Program { body })
    } else {
        Err(errors)
    }
}
