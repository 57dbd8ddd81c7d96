//! Results returned to hosts. Everything here serializes with serde.

use super::error::RunError;
use crate::diagnostics::Diagnostic;
use crate::sandbox::ExecutionResult;
use serde::Serialize;
use std::collections::BTreeMap;

/// What [`Engine::run`](super::Engine::run) produced.
///
/// Output is kept whether or not the run succeeded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunOutcome {
    pub ok: bool,
    pub output: String,

    /// Present exactly when `ok` is false.
    #[serde(flatten)]
    pub error: Option<RunError>,

    /// The canonical program text, when the program got that far.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translated: Option<String>,

    /// Final in-memory files, when the memory backend was used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files: Option<BTreeMap<String, String>>,

    /// Request counter value; later requests carry larger versions.
    pub version: u64,
}

impl RunOutcome {
    pub(crate) fn rejected(diagnostics: Vec<Diagnostic>, version: u64) -> Self {
        Self::failed(RunError::from_diagnostics(diagnostics), version)
    }

    pub(crate) fn failed(error: RunError, version: u64) -> Self {
        Self {
            ok: false,
            output: String::new(),
            error: Some(error),
            translated: None,
            files: None,
            version,
        }
    }

    pub(crate) fn from_execution(result: ExecutionResult, translated: String, version: u64) -> Self {
        Self {
            ok: result.success,
            output: result.output,
            error: result.failure.as_ref().map(RunError::from),
            translated: Some(translated),
            files: result.files,
            version,
        }
    }
}

/// What [`Engine::analyze`](super::Engine::analyze) found.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis {
    pub ok: bool,
    pub diagnostics: Vec<Diagnostic>,
    pub version: u64,
}

/// A generated program together with the result of running it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedRun {
    pub code: String,
    #[serde(flatten)]
    pub outcome: RunOutcome,
}
