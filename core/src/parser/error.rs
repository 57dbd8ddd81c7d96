use super::parser::Rule;
use thiserror::Error;

/// Parser error for one canonical line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    /// 1-based character column in the canonical text, when known.
    pub column: Option<usize>,
}

/// Specific kinds of parse errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    /// Unexpected token
    #[error("expected {expected}, found {found}")]
    UnexpectedToken { expected: String, found: String },
    /// Invalid number literal
    #[error("the number {text} is too large")]
    InvalidNumber { text: String },
    /// Maximum bracket nesting exceeded
    #[error("this line nests brackets more than {max_depth} levels deep")]
    TooDeep { max_depth: usize },
    /// Too many operators on one line
    #[error("this line has more than {max_operators} operators")]
    TooLong { max_operators: usize },
    /// Other parse errors (catch-all for Pest errors we don't specifically handle)
    #[error("{message}")]
    Other { message: String },
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, column: Option<usize>) -> Self {
        Self { kind, column }
    }

    pub fn too_deep(max_depth: usize) -> Self {
        Self::new(ParseErrorKind::TooDeep { max_depth }, None)
    }

    pub fn too_long(max_operators: usize) -> Self {
        Self::new(ParseErrorKind::TooLong { max_operators }, None)
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::new(
            ParseErrorKind::Other {
                message: message.into(),
            },
            None,
        )
    }
}

/// Convert Pest error to human-readable ParseError
pub fn convert_pest_error(err: pest::error::Error<Rule>, source: &str) -> ParseError {
    use pest::error::ErrorVariant;

    let pos = match err.location {
        pest::error::InputLocation::Pos(pos) => pos,
        pest::error::InputLocation::Span((start, _)) => start,
    };
    let pos = pos.min(source.len());
    let column = source.get(..pos).map(|before| before.chars().count() + 1);

    let kind = match err.variant {
        ErrorVariant::ParsingError { positives, .. } => ParseErrorKind::UnexpectedToken {
            expected: format_expected_rules(&positives),
            found: describe_found(source, pos),
        },
        ErrorVariant::CustomError { message } => match number_in_message(&message) {
            Some(text) => ParseErrorKind::InvalidNumber { text },
            None => ParseErrorKind::Other { message },
        },
    };

    ParseError::new(kind, column)
}

fn number_in_message(message: &str) -> Option<String> {
    let rest = message.strip_prefix("The number ")?;
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    (!digits.is_empty()).then_some(digits)
}

/// Format expected rules in a human-readable way
fn format_expected_rules(rules: &[Rule]) -> String {
    if rules.is_empty() {
        return "something else".to_string();
    }

    // Group related rules into higher-level concepts
    let mut concepts: Vec<&'static str> = Vec::new();
    let mut note = |concept: &'static str| {
        if !concepts.contains(&concept) {
            concepts.push(concept);
        }
    };

    for rule in rules {
        match rule {
            Rule::integer | Rule::float | Rule::boolean | Rule::string | Rule::fstring | Rule::none_lit => {
                note("a value")
            }
            Rule::ident | Rule::name_list | Rule::dotted_name | Rule::param_list => note("a name"),
            Rule::EOI => note("end of line"),
            Rule::or
            | Rule::and
            | Rule::in_op
            | Rule::not_in
            | Rule::eq
            | Rule::neq
            | Rule::le
            | Rule::ge
            | Rule::lt
            | Rule::gt
            | Rule::add
            | Rule::sub
            | Rule::pow
            | Rule::floor_div
            | Rule::mul
            | Rule::div
            | Rule::modulo => note("an operator"),
            Rule::call_op | Rule::index_op | Rule::slice_op | Rule::field_op => note("`(`, `[` or `.`"),
            Rule::aug_op => note("`+=`"),
            Rule::kw_in => note("`in`"),
            Rule::kw_import => note("`import`"),
            _ => note("an expression"),
        }
    }

    match concepts.split_last() {
        Some((last, [])) => last.to_string(),
        Some((last, rest)) => format!("{} or {}", rest.join(", "), last),
        None => "something else".to_string(),
    }
}

/// Describe the text at the failure position.
fn describe_found(source: &str, pos: usize) -> String {
    let rest = source.get(pos..).unwrap_or("").trim_start();
    match rest.chars().next() {
        None => "end of line".to_string(),
        Some(ch) if ch.is_alphanumeric() || ch == '_' => {
            let word: String = rest
                .chars()
                .take_while(|c| c.is_alphanumeric() || *c == '_')
                .collect();
            format!("`{}`", word)
        }
        Some(ch) => format!("`{}`", ch),
    }
}
