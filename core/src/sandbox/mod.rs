//! The sandbox boundary.
//!
//! Everything a run is allowed to touch is defined here: the capability
//! table, the security checks shared with the validator, the output buffer,
//! the input queue, the file shim and the resource budget. [`execute`] wraps
//! one interpreter run and turns every outcome into an [`ExecutionResult`].

mod budget;
mod capabilities;
mod executor;
mod files;
mod input;
mod output;
mod security;

pub use budget::{Budget, BudgetExceeded, CancelToken};
pub use capabilities::{Capabilities, Member, MemberKind, ModuleSpec};
pub use executor::{ExecutionResult, execute};
pub use files::{FileAccess, FileError, FileMode, FileSystem, check_path};
pub use input::{InputExhausted, InputQueue, coerce};
pub use output::{OutputBuffer, OutputLimitReached};
pub use security::{
    FORBIDDEN_NAMES, RESTRICTED_OBJECTS, SecurityRejection, check_attribute, check_import, check_name,
};
