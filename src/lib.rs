//! TALE - readable, English-like programming for beginners
//!
//! # Overview
//!
//! TALE programs are written in plain words:
//!
//! ```text
//! ask "How many? " as n
//! repeat n times
//!   say "hello"
//! end
//! ```
//!
//! This crate checks such programs and runs them in a sandbox. A run can
//! only reach what the capability table lists, answers `ask` from values
//! supplied up front, and is stopped when it exceeds its time or size
//! budget. Problems are reported as line-numbered diagnostics with a
//! suggested fix.
//!
//! # Quick Start
//!
//! ```
//! use tale::{Engine, EngineOptions};
//!
//! let engine = Engine::new(EngineOptions::default());
//!
//! let outcome = engine.run("x is 1\nif x > 0\n  say \"positive\"\nend", &[]);
//! assert!(outcome.ok);
//! assert_eq!(outcome.output, "positive\n");
//!
//! let analysis = engine.analyze("import os");
//! assert!(!analysis.ok);
//! assert_eq!(analysis.diagnostics[0].code, "X001");
//! ```
//!
//! # Rendering problems
//!
//! [`render_error_to_string`] and [`render_run_error_to_string`] draw a
//! diagnostic under the offending source line, for terminals and logs.

mod error_renderer;

pub use error_renderer::{
    render_error, render_error_to, render_error_to_string, render_error_to_string_no_color, render_run_error,
    render_run_error_to_string, render_run_error_to_string_no_color,
};

// Re-export public API from tale_core
pub use tale_core::api::{
    Analysis, Clock, CodeGenerator, Diagnostic, DiagnosticKind, Engine, EngineOptions, Error, ExecutionOptions,
    FailureKind, GenerateError, GeneratedRun, RelatedInfo, RunError, RunOutcome, SYSTEM_PROMPT, Severity,
    StructureOptions,
};

// Re-export the sandbox configuration hosts need
pub use tale_core::sandbox::{CancelToken, Capabilities, FileAccess};
