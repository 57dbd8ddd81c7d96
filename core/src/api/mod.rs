//! Public API for the TALE engine.
//!
//! A request moves through four stages:
//!
//! 1. **Structure**: block keywords and `end` lines become a tree
//! 2. **Transform**: each line is rewritten into canonical program text
//! 3. **Validate**: canonical text is parsed and checked against the
//!    capability table, without running anything
//! 4. **Execute**: the validated program runs in a fresh sandbox
//!
//! [`Engine::analyze`] stops after stage 3 and returns [`Diagnostic`]s.
//! [`Engine::run`] goes through all four and returns a [`RunOutcome`] that
//! keeps the program's output even when it fails.
//!
//! # Example
//!
//! ```
//! use tale_core::api::{Engine, EngineOptions, FailureKind};
//!
//! let engine = Engine::new(EngineOptions::default());
//!
//! let outcome = engine.run("say \"hello\"", &[]);
//! assert!(outcome.ok);
//! assert_eq!(outcome.output, "hello\n");
//!
//! let outcome = engine.run("say \"before\"\nsay 1 / 0", &[]);
//! assert_eq!(outcome.output, "before\n");
//! assert_eq!(outcome.error.unwrap().kind, FailureKind::Runtime);
//! ```

pub mod engine;
pub mod error;
pub mod generate;
pub mod options;
pub mod results;

pub use crate::diagnostics::{Diagnostic, DiagnosticKind, RelatedInfo, Severity};
pub use engine::Engine;
pub use error::{Error, FailureKind, RunError};
pub use generate::{CodeGenerator, GenerateError, SYSTEM_PROMPT};
pub use options::{Clock, EngineOptions, ExecutionOptions, StructureOptions};
pub use results::{Analysis, GeneratedRun, RunOutcome};
