//! The TALE engine.

use super::error::{Error, RunError};
use super::generate::{self, CodeGenerator};
use super::results::{Analysis, GeneratedRun, RunOutcome};
use super::{EngineOptions, ExecutionOptions};
use crate::diagnostics::{Diagnostic, DiagnosticKind, IntoDiagnostic, sort_diagnostics};
use crate::parser::Program;
use crate::evaluator::ExecError;
use crate::sandbox::{self, CancelToken, Capabilities};
use crate::source::SourceProgram;
use crate::transform::{self, TransformedProgram};
use crate::{blocks, validator};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;

/// Stack given to the thread a request runs on.
const RUN_STACK_SIZE: usize = 64 << 20;

/// Translates, checks and runs TALE programs.
///
/// The engine holds:
/// - the options every request starts from (EngineOptions)
/// - the capability table programs run against, shared read-only
/// - a request counter used to tag results with a version
///
/// It is `Send + Sync`, so one engine can serve concurrent callers. Requests
/// share nothing but the capability table.
///
/// # Example
///
/// ```
/// use tale_core::api::{Engine, EngineOptions};
///
/// let engine = Engine::new(EngineOptions::default());
///
/// let outcome = engine.run("ask n\nsay n * 2", &["21".to_string()]);
/// assert!(outcome.ok);
/// assert_eq!(outcome.output, "42\n");
///
/// let analysis = engine.analyze("if true\nsay 1");
/// assert!(!analysis.ok);
/// assert_eq!(analysis.diagnostics[0].line, 1);
/// ```
pub struct Engine {
    options: EngineOptions,
    capabilities: Arc<Capabilities>,
    requests: AtomicU64,
}

impl Engine {
    /// Create an engine with the standard capability table.
    pub fn new(options: EngineOptions) -> Self {
        Self::with_capabilities(options, Capabilities::standard())
    }

    /// Create an engine whose programs can reach only `capabilities`.
    pub fn with_capabilities(options: EngineOptions, capabilities: Capabilities) -> Self {
        Self {
            options,
            capabilities: Arc::new(capabilities),
            requests: AtomicU64::new(0),
        }
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    /// Report every problem that can be found without running `code`.
    pub fn analyze(&self, code: &str) -> Analysis {
        let version = self.next_version();
        let span = tracing::info_span!("analyze", version);
        let _entered = span.enter();

        let task = || {
            let _entered = span.enter();
            self.check(code).err().unwrap_or_default()
        };
        let diagnostics = on_run_stack(&task).unwrap_or_else(|| {
            tracing::error!("analysis panicked");
            vec![Diagnostic::error(
                DiagnosticKind::Validation,
                "V000",
                1,
                "The engine failed while analyzing this program",
            )]
        });

        tracing::debug!(diagnostics = diagnostics.len(), "analysis finished");
        Analysis {
            ok: diagnostics.is_empty(),
            diagnostics,
            version,
        }
    }

    /// The canonical program text for `code`, indented by block.
    pub fn translate(&self, code: &str) -> Result<String, Error> {
        let task = || self.check(code).map(|(transformed, _)| transformed.to_string());
        match on_run_stack(&task) {
            Some(Ok(text)) => Ok(text),
            Some(Err(diagnostics)) => Err(Error::Analysis { diagnostics }),
            None => Err(Error::Internal),
        }
    }

    /// Run `code`, answering its `ask` lines from `inputs` in order.
    pub fn run(&self, code: &str, inputs: &[String]) -> RunOutcome {
        self.run_with(code, inputs, &self.options.execution, None)
    }

    /// Run `code` with explicit execution options and an optional
    /// cancellation token.
    pub fn run_with(
        &self,
        code: &str,
        inputs: &[String],
        options: &ExecutionOptions,
        cancel: Option<CancelToken>,
    ) -> RunOutcome {
        let version = self.next_version();
        let span = tracing::info_span!("run", version);
        let _entered = span.enter();

        let task = || {
            let _entered = span.enter();
            self.run_on_this_thread(code, inputs, options, cancel.clone(), version)
        };
        on_run_stack(&task).unwrap_or_else(|| {
            tracing::error!("run panicked");
            RunOutcome::failed(RunError::internal("The engine failed while running this program"), version)
        })
    }

    /// Ask `generator` for a program and run it like any other source.
    pub fn generate_and_run(
        &self,
        generator: &dyn CodeGenerator,
        prompt: &str,
        inputs: &[String],
    ) -> Result<GeneratedRun, Error> {
        let code = generate::generate_code(generator, prompt)?;
        let outcome = self.run(&code, inputs);
        Ok(GeneratedRun { code, outcome })
    }

    fn next_version(&self) -> u64 {
        self.requests.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Structure, transform and validate. Stops at the first stage that
    /// reports anything.
    fn check(&self, code: &str) -> Result<(TransformedProgram, Program), Vec<Diagnostic>> {
        let source = SourceProgram::new(code);
        let tree = blocks::build(&source, &self.options.structure).map_err(|error| vec![error.to_diagnostic()])?;
        let transformed = transform::transform(&tree).map_err(|errors| collect(&errors))?;
        let program = validator::validate(&transformed, &self.capabilities).map_err(|errors| collect(&errors))?;
        Ok((transformed, program))
    }

    fn run_on_this_thread(
        &self,
        code: &str,
        inputs: &[String],
        options: &ExecutionOptions,
        cancel: Option<CancelToken>,
        version: u64,
    ) -> RunOutcome {
        let (transformed, program) = match self.check(code) {
            Ok(checked) => checked,
            Err(diagnostics) => {
                if let Some(first) = diagnostics.first() {
                    tracing::debug!(line = first.line, code = first.code, "run rejected before execution");
                }
                return RunOutcome::rejected(diagnostics, version);
            }
        };

        let result = sandbox::execute(
            &program,
            inputs.to_vec(),
            Arc::clone(&self.capabilities),
            options,
            cancel,
        );
        if let Some(fault) = &result.failure {
            match &fault.error {
                ExecError::Security(rejection) => {
                    tracing::warn!(line = fault.line, %rejection, "run stopped by security check");
                }
                ExecError::Timeout { .. } | ExecError::Cancelled | ExecError::ResourceExceeded { .. } => {
                    tracing::warn!(line = fault.line, error = %fault.error, "run stopped by budget");
                }
                ExecError::Runtime(_) | ExecError::InputExhausted(_) => {}
            }
        }
        RunOutcome::from_execution(result, transformed.to_string(), version)
    }
}

fn collect<E: IntoDiagnostic>(errors: &[E]) -> Vec<Diagnostic> {
    let mut diagnostics: Vec<Diagnostic> = errors.iter().map(IntoDiagnostic::to_diagnostic).collect();
    sort_diagnostics(&mut diagnostics);
    diagnostics
}

/// Run `task` on a thread with a large stack, falling back to the calling
/// thread if one cannot be spawned. `None` means the task panicked.
fn on_run_stack<T: Send>(task: &(dyn Fn() -> T + Sync)) -> Option<T> {
    thread::scope(|scope| {
        let spawned = thread::Builder::new()
            .name("tale-run".to_string())
            .stack_size(RUN_STACK_SIZE)
            .spawn_scoped(scope, || task());
        match spawned {
            Ok(handle) => handle.join().ok(),
            Err(error) => {
                tracing::warn!(%error, "could not spawn run thread");
                Some(task())
            }
        }
    })
}
