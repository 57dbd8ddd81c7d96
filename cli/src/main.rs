use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result, WrapErr};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use tale::{Engine, EngineOptions, Error, render_error, render_run_error};

/// TALE - readable, English-like programming for beginners
#[derive(Parser, Debug)]
#[command(name = "tale")]
#[command(about = "Check, translate and run TALE programs", long_about = None)]
struct Args {
    /// Engine options as JSON (see `EngineOptions`)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a program
    Run {
        /// Program file, or `-` for stdin
        file: PathBuf,

        /// Answer for the next `ask` line (repeatable)
        #[arg(short = 'i', long = "input")]
        inputs: Vec<String>,

        /// File with one answer per line, used before any `-i` values
        #[arg(long = "inputs")]
        inputs_file: Option<PathBuf>,

        /// Wall-clock limit for the run
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Seed for the `random` module
        #[arg(long)]
        seed: Option<u64>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Report problems without running
    Analyze {
        /// Program file, or `-` for stdin
        file: PathBuf,

        /// Print the diagnostics as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the canonical program text
    Translate {
        /// Program file, or `-` for stdin
        file: PathBuf,
    },
}

fn read_source(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut source = String::new();
        std::io::stdin()
            .read_to_string(&mut source)
            .into_diagnostic()
            .wrap_err("could not read the program from stdin")?;
        return Ok(source);
    }
    std::fs::read_to_string(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("could not read {}", path.display()))
}

fn load_options(path: Option<&Path>) -> Result<EngineOptions> {
    let Some(path) = path else {
        return Ok(EngineOptions::default());
    };
    let text = std::fs::read_to_string(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("could not read {}", path.display()))?;
    let options = serde_json::from_str(&text)
        .into_diagnostic()
        .wrap_err_with(|| format!("invalid engine options in {}", path.display()))?;
    tracing::debug!(?options, "loaded engine options");
    Ok(options)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).into_diagnostic()?;
    println!("{}", json);
    Ok(())
}

fn exit_code(ok: bool) -> ExitCode {
    if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();

    // Initialize logging subscriber
    use tracing_subscriber::{EnvFilter, fmt};

    // Use TALE_LOG or RUST_LOG environment variable to control log level
    // Default to WARN if not set
    let filter = EnvFilter::try_from_env("TALE_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let mut options = load_options(args.config.as_deref())?;

    match args.command {
        Command::Run {
            file,
            inputs,
            inputs_file,
            timeout_ms,
            seed,
            json,
        } => {
            if let Some(ms) = timeout_ms {
                options.execution.timeout = Duration::from_millis(ms);
            }
            if seed.is_some() {
                options.execution.random_seed = seed;
            }

            let mut values = match inputs_file {
                Some(path) => read_source(&path)?.lines().map(str::to_string).collect(),
                None => Vec::new(),
            };
            values.extend(inputs);

            let source = read_source(&file)?;
            let engine = Engine::new(options);
            let outcome = engine.run(&source, &values);

            if json {
                print_json(&outcome)?;
            } else {
                print!("{}", outcome.output);
                if let Some(error) = &outcome.error {
                    if !outcome.output.is_empty() && !outcome.output.ends_with('\n') {
                        println!();
                    }
                    render_run_error(error, &source);
                }
            }
            Ok(exit_code(outcome.ok))
        }

        Command::Analyze { file, json } => {
            let source = read_source(&file)?;
            let engine = Engine::new(options);
            let analysis = engine.analyze(&source);

            if json {
                print_json(&analysis)?;
            } else if analysis.ok {
                println!("No problems found.");
            } else {
                let error = Error::Analysis {
                    diagnostics: analysis.diagnostics.clone(),
                };
                render_error(&error, &source);
            }
            Ok(exit_code(analysis.ok))
        }

        Command::Translate { file } => {
            let source = read_source(&file)?;
            let engine = Engine::new(options);
            match engine.translate(&source) {
                Ok(text) => {
                    print!("{}", text);
                    Ok(ExitCode::SUCCESS)
                }
                Err(error) => {
                    render_error(&error, &source);
                    Ok(ExitCode::FAILURE)
                }
            }
        }
    }
}
