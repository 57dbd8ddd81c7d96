//! Source text handling.
//!
//! A [`SourceProgram`] is the immutable, 1-indexed list of lines a request
//! arrived with. Everything downstream refers back to these line numbers.

/// Ordered, immutable source lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceProgram {
    lines: Vec<String>,
}

/// A line that carries program content (not blank, not a comment, not inside a note).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLine<'a> {
    /// 1-based line number.
    pub number: usize,
    /// The line with surrounding whitespace removed.
    pub text: &'a str,
    /// Width of the leading whitespace (a tab counts as four columns).
    pub indent: usize,
}

impl<'a> SourceLine<'a> {
    /// The first word of the line, lowercased, used for keyword dispatch.
    pub fn keyword(&self) -> String {
        self.text
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase()
    }

    /// Everything after the first word.
    pub fn rest(&self) -> &'a str {
        match self.text.find(char::is_whitespace) {
            Some(idx) => self.text[idx..].trim(),
            None => "",
        }
    }
}

/// Classification of a raw line, before block structure is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineClass<'a> {
    Blank,
    Comment,
    Code(SourceLine<'a>),
}

const NOTE_DELIMITER: &str = "\"\"\"";

impl SourceProgram {
    pub fn new(code: &str) -> Self {
        let lines = code
            .split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
            .collect::<Vec<_>>();
        Self { lines }
    }

    /// Number of raw lines, including blanks and comments.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.iter().all(|line| line.trim().is_empty())
    }

    /// The raw text of a 1-based line.
    pub fn line(&self, number: usize) -> Option<&str> {
        number
            .checked_sub(1)
            .and_then(|idx| self.lines.get(idx))
            .map(String::as_str)
    }

    /// Classify every line, folding multi-line `note """ ... """` blocks into comments.
    ///
    /// Returns the line number of an unterminated note as the error.
    pub fn classify(&self) -> Result<Vec<LineClass<'_>>, usize> {
        let mut classes = Vec::with_capacity(self.lines.len());
        let mut open_note: Option<usize> = None;

        for (idx, raw) in self.lines.iter().enumerate() {
            let number = idx + 1;
            let text = raw.trim();

            if open_note.is_some() {
                if text.ends_with(NOTE_DELIMITER) {
                    open_note = None;
                }
                classes.push(LineClass::Comment);
                continue;
            }

            if text.is_empty() {
                classes.push(LineClass::Blank);
                continue;
            }

            if text.starts_with('#') {
                classes.push(LineClass::Comment);
                continue;
            }

            if is_note_start(text) {
                let body = text[4..].trim_start();
                let closed = body.len() >= 2 * NOTE_DELIMITER.len() && body.ends_with(NOTE_DELIMITER);
                if !closed {
                    open_note = Some(number);
                }
                classes.push(LineClass::Comment);
                continue;
            }

            classes.push(LineClass::Code(SourceLine {
                number,
                text,
                indent: indent_width(raw),
            }));
        }

        match open_note {
            Some(line) => Err(line),
            None => Ok(classes),
        }
    }
}

fn indent_width(raw: &str) -> usize {
    raw.chars()
        .take_while(|c| c.is_whitespace())
        .map(|c| if c == '\t' { 4 } else { 1 })
        .sum()
}

fn is_note_start(text: &str) -> bool {
    match text.get(..4) {
        Some(head) if head.eq_ignore_ascii_case("note") => {
            text[4..].trim_start().starts_with(NOTE_DELIMITER)
        }
        _ => false,
    }
}
