//! Error rendering using ariadne
//!
//! This module draws TALE diagnostics and run failures under the source
//! line they point at, with the suggested fix as a help note.

use crate::{Diagnostic, Error, RunError, Severity};
use ariadne::{ColorGenerator, Label, Report, ReportKind, Source};
use std::io::Write;
use std::ops::Range;

const SOURCE_ID: &str = "<program>";

/// Render an error to stderr
///
/// # Example
/// ```no_run
/// use tale::{Engine, EngineOptions, render_error};
///
/// let engine = Engine::new(EngineOptions::default());
///
/// let source = "if x > 1\nsay x";
/// if let Err(e) = engine.translate(source) {
///     render_error(&e, source);
/// }
/// ```
pub fn render_error(error: &Error, source: &str) {
    render_error_to_writer(error, source, &mut std::io::stderr(), true).ok();
}

/// Render an error to a specific writer
pub fn render_error_to(error: &Error, source: &str, writer: &mut dyn Write) -> std::io::Result<()> {
    render_error_to_writer(error, source, writer, true)
}

/// Render an error to a String (useful for web UIs and logs)
pub fn render_error_to_string(error: &Error, source: &str) -> String {
    let mut buf = Vec::new();
    render_error_to_writer(error, source, &mut buf, true).ok();
    String::from_utf8_lossy(&buf).to_string()
}

/// Render an error to a String without color codes (useful for tests)
pub fn render_error_to_string_no_color(error: &Error, source: &str) -> String {
    let mut buf = Vec::new();
    render_error_to_writer(error, source, &mut buf, false).ok();
    String::from_utf8_lossy(&buf).to_string()
}

/// Render the failure of a run to stderr
pub fn render_run_error(error: &RunError, source: &str) {
    render_run_error_to_writer(error, source, &mut std::io::stderr(), true).ok();
}

/// Render the failure of a run to a String
pub fn render_run_error_to_string(error: &RunError, source: &str) -> String {
    let mut buf = Vec::new();
    render_run_error_to_writer(error, source, &mut buf, true).ok();
    String::from_utf8_lossy(&buf).to_string()
}

/// Render the failure of a run to a String without color codes
pub fn render_run_error_to_string_no_color(error: &RunError, source: &str) -> String {
    let mut buf = Vec::new();
    render_run_error_to_writer(error, source, &mut buf, false).ok();
    String::from_utf8_lossy(&buf).to_string()
}

fn render_error_to_writer(error: &Error, source: &str, writer: &mut dyn Write, use_color: bool) -> std::io::Result<()> {
    match error {
        Error::Analysis { diagnostics } => render_diagnostics(source, diagnostics, writer, use_color),
        Error::Generation(error) => writeln!(writer, "Generation error: {}", error),
        Error::Internal => writeln!(writer, "Internal error: {}", error),
    }
}

fn render_run_error_to_writer(
    error: &RunError,
    source: &str,
    writer: &mut dyn Write,
    use_color: bool,
) -> std::io::Result<()> {
    if !error.diagnostics.is_empty() {
        return render_diagnostics(source, &error.diagnostics, writer, use_color);
    }
    let Some(line) = error.line else {
        return writeln!(writer, "{} error: {}", error.kind, error.message);
    };

    let span = line_span(source, line);
    let mut report = Report::build(ReportKind::Error, (SOURCE_ID, span.clone()))
        .with_message(&error.message)
        .with_config(ariadne::Config::default().with_color(use_color))
        .with_label(Label::new((SOURCE_ID, span)).with_message(format!("{} error", error.kind)));
    if let Some(help) = &error.help {
        report = report.with_help(help);
    }
    report.finish().write((SOURCE_ID, Source::from(source)), &mut *writer)
}

fn render_diagnostics(
    source: &str,
    diagnostics: &[Diagnostic],
    writer: &mut dyn Write,
    use_color: bool,
) -> std::io::Result<()> {
    for diag in diagnostics {
        let mut colors = ColorGenerator::new();
        colors.next(); // Skip the first color.

        let kind = match diag.severity {
            Severity::Error => ReportKind::Error,
            Severity::Warning => ReportKind::Warning,
        };

        let span = line_span(source, diag.line);
        let mut report = Report::build(kind, (SOURCE_ID, span.clone()))
            .with_message(&diag.message)
            .with_code(diag.code)
            .with_config(ariadne::Config::default().with_color(use_color));

        let color = colors.next();
        report = report.with_label(
            Label::new((SOURCE_ID, span))
                .with_message(format!("{} error", diag.kind))
                .with_color(color),
        );

        // Related lines, such as where a block was opened
        for related in &diag.related {
            let color = colors.next();
            report = report.with_label(
                Label::new((SOURCE_ID, line_span(source, related.line)))
                    .with_message(&related.message)
                    .with_color(color),
            );
        }

        if let Some(help) = &diag.help {
            report = report.with_help(help);
        }

        report.finish().write((SOURCE_ID, Source::from(source)), &mut *writer)?;
    }

    Ok(())
}

/// Character range of the text on 1-based `line`, without surrounding
/// whitespace. Lines past the end map to the end of the source.
fn line_span(source: &str, line: usize) -> Range<usize> {
    let mut offset = 0;
    for (index, text) in source.split('\n').enumerate() {
        let width = text.chars().count();
        if index + 1 == line {
            let leading = text.chars().take_while(|c| c.is_whitespace()).count();
            let content = text.trim().chars().count();
            let start = offset + leading.min(width);
            return start..start + content;
        }
        offset += width + 1;
    }
    let end = source.chars().count();
    end..end
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Engine, EngineOptions};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_line_span() {
        let source = "say 1\n  if x\nend";
        assert_eq!(line_span(source, 1), 0..5);
        assert_eq!(line_span(source, 2), 8..12);
        assert_eq!(line_span(source, 3), 13..16);
        assert_eq!(line_span(source, 9), 16..16);
    }

    #[test]
    fn test_render_missing_end() {
        let engine = Engine::new(EngineOptions::default());
        let source = "x is 1\nif x > 0\n  say x";
        let error = engine.translate(source).unwrap_err();
        let output = render_error_to_string_no_color(&error, source);

        assert!(output.contains("S001"));
        assert!(output.contains("if x > 0"));
        assert!(output.contains("Add an `end` line"));
    }

    #[test]
    fn test_render_run_failure() {
        let engine = Engine::new(EngineOptions::default());
        let source = "say \"start\"\nsay 1 / 0";
        let outcome = engine.run(source, &[]);
        let error = outcome.error.unwrap();
        let output = render_run_error_to_string_no_color(&error, source);

        assert!(output.contains("division by zero"));
        assert!(output.contains("say 1 / 0"));
        assert!(output.lines().count() > 1);
    }

    #[test]
    fn test_render_without_line() {
        let error = RunError::internal("engine failure");
        let output = render_run_error_to_string_no_color(&error, "say 1");
        assert_eq!(output, "internal error: engine failure\n");
    }
}
