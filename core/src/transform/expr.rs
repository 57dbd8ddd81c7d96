//! Expression sugar: prefix helpers, positional calls, arrow lambdas and
//! literal normalization.

use super::TransformError;
use super::lexer::{self, first_word, is_identifier, is_reserved_word, split_top_level, split_words};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Applied in order to the code between literals.
    static ref NORMALIZATIONS: Vec<(Regex, &'static str)> = vec![
        (Regex::new(r"(?i)\bis\s+not\s+same\s+as\b").unwrap(), "!="),
        (Regex::new(r"(?i)\bis\s+same\s+as\b").unwrap(), "=="),
        (Regex::new(r"(?i)\bis\s+not\b").unwrap(), "!="),
        (Regex::new(r"(?i)\bis\b").unwrap(), "=="),
        (Regex::new(r"(?i)\btrue\b").unwrap(), "true"),
        (Regex::new(r"(?i)\bfalse\b").unwrap(), "false"),
        (Regex::new(r"(?i)\b(nothing|none)\b").unwrap(), "none"),
        (Regex::new(r"\bnumber\(").unwrap(), "int("),
        (Regex::new(r"\btext\(").unwrap(), "str("),
        (Regex::new(r"\bdecimal\(").unwrap(), "float("),
    ];

    static ref ARROW_LAMBDA: Regex =
        Regex::new(r"\blambda\s+((?:[A-Za-z_]\w*[\s,]*)*?)\s*->").unwrap();
}

/// Characters that rule out the `f a b` positional shorthand.
const OPERATOR_CHARS: &[char] = &[
    '+', '-', '*', '/', '%', '<', '>', '=', '!', ':', '(', ')', '[', ']', '{', '}', '.', ',',
];

/// Binary operators that may follow a helper's operand, longest first.
const SYMBOL_OPERATORS: &[&str] = &[
    "==", "!=", "<=", ">=", "//", "**", "<", ">", "+", "-", "*", "/", "%",
];

/// Word operators that may follow a helper's operand, with their canonical spelling.
const WORD_OPERATORS: &[(&str, &str)] = &[
    ("is not same as", "!="),
    ("is same as", "=="),
    ("is not", "!="),
    ("is", "=="),
    ("not in", "not in"),
    ("in", "in"),
    ("and", "and"),
    ("or", "or"),
];

/// Rewrites the expressions of one source line.
pub(crate) struct Rewriter<'a> {
    pub line: usize,
    pub source: &'a str,
}

impl<'a> Rewriter<'a> {
    pub fn new(line: usize, source: &'a str) -> Self {
        Self { line, source }
    }

    pub fn not_understood(&self) -> TransformError {
        TransformError::NotUnderstood {
            line: self.line,
            text: self.source.to_string(),
        }
    }

    pub fn wrong_arity(&self) -> TransformError {
        TransformError::WrongArity {
            line: self.line,
            text: self.source.to_string(),
        }
    }

    /// Check that `text` is a plain name.
    pub fn name<'t>(&self, text: &'t str) -> Result<&'t str, TransformError> {
        let text = text.trim();
        if is_identifier(text) && !is_reserved_word(text) {
            Ok(text)
        } else {
            Err(TransformError::InvalidName {
                line: self.line,
                name: text.to_string(),
            })
        }
    }

    /// Rewrite one expression into canonical text.
    pub fn expr(&self, text: &str) -> Result<String, TransformError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(self.not_understood());
        }
        if lexer::is_literal(text) {
            return Ok(text.to_string());
        }
        if let Some(rewritten) = self.helper(text)? {
            return Ok(rewritten);
        }
        if let Some(rewritten) = self.arrow_lambda(text)? {
            return Ok(rewritten);
        }
        if let Some(rewritten) = self.positional_call(text)? {
            return Ok(rewritten);
        }
        Ok(normalize(text))
    }

    /// Rewrite a comma-separated list of expressions.
    pub fn expr_list(&self, text: &str) -> Result<Vec<String>, TransformError> {
        split_top_level(text, ',')
            .into_iter()
            .map(|part| self.expr(part))
            .collect()
    }

    fn helper(&self, text: &str) -> Result<Option<String>, TransformError> {
        let Some((word, rest)) = first_word(text) else {
            return Ok(None);
        };
        if rest.is_empty() || starts_with_operator(rest) {
            return Ok(None);
        }

        let rewritten = match word {
            "type" => match rest.strip_prefix("of ") {
                Some(arg) => self.unary("type", arg)?,
                None => return Ok(None),
            },
            "upper" | "lower" | "title" | "strip" | "isalpha" | "isdigit" | "isalnum" => {
                let arg = rest.strip_prefix("of ").unwrap_or(rest);
                self.unary(word, arg)?
            }
            "len" | "sum" | "min" | "max" | "sorted" | "any" | "all" | "enumerate" | "copy"
            | "read" | "keys" | "values" | "items" => self.unary(word, rest)?,
            "split" | "join" | "find" | "count" => self.binary(word, rest)?,
            "starts" => self.binary("startswith", rest)?,
            "ends" => self.binary("endswith", rest)?,
            "replace" => self.replace(rest)?,
            "map" | "filter" | "union" | "intersection" | "difference" | "subset" => {
                let (a, b) = self.pair(rest)?;
                format!("{}({}, {})", word, self.expr(a)?, self.expr(b)?)
            }
            "zip" => format!("zip({})", self.expr_list(rest)?.join(", ")),
            "dict" if rest.starts_with('{') => normalize(rest),
            "json" | "csv" => match self.data_file(word, rest)? {
                Some(rewritten) => rewritten,
                None => return Ok(None),
            },
            "call" => self.call(rest)?,
            "get" => self.get(rest)?,
            _ => return Ok(None),
        };
        Ok(Some(rewritten))
    }

    /// `name arg`, where a trailing operator ends the argument: `len xs > 3`
    /// becomes `len(xs) > 3`.
    fn unary(&self, name: &str, arg: &str) -> Result<String, TransformError> {
        let (operand, tail) = split_operand(arg);
        let call = format!("{}({})", name, self.expr(operand)?);
        self.with_tail(call, tail)
    }

    fn binary(&self, name: &str, rest: &str) -> Result<String, TransformError> {
        let (first, second) = first_word(rest).ok_or_else(|| self.wrong_arity())?;
        if second.is_empty() {
            return Err(self.wrong_arity());
        }
        let (operand, tail) = split_operand(second);
        let call = format!("{}({}, {})", name, self.expr(first)?, self.expr(operand)?);
        self.with_tail(call, tail)
    }

    fn with_tail(&self, call: String, tail: Option<(&str, &str)>) -> Result<String, TransformError> {
        match tail {
            Some((op, rest)) => Ok(format!("{} {} {}", call, op, self.expr(rest)?)),
            None => Ok(call),
        }
    }

    /// `replace x "old" "new"`.
    fn replace(&self, rest: &str) -> Result<String, TransformError> {
        let words = split_words(rest);
        let [.., old, new] = words.as_slice() else {
            return Err(self.wrong_arity());
        };
        if words.len() < 3 {
            return Err(self.wrong_arity());
        }
        let base = rest[..offset_in(rest, old)].trim();
        Ok(format!(
            "replace({}, {}, {})",
            self.expr(base)?,
            self.expr(old)?,
            self.expr(new)?
        ))
    }

    /// Two operands separated by a comma, or else by whitespace.
    fn pair<'t>(&self, rest: &'t str) -> Result<(&'t str, &'t str), TransformError> {
        let parts = split_top_level(rest, ',');
        let (a, b) = if parts.len() >= 2 {
            let first = parts[0];
            let after = rest[offset_in(rest, first) + first.len()..]
                .trim_start()
                .trim_start_matches(',')
                .trim();
            (first, after)
        } else {
            first_word(rest).ok_or_else(|| self.wrong_arity())?
        };
        if a.is_empty() || b.is_empty() {
            return Err(self.wrong_arity());
        }
        Ok((a, b))
    }

    /// `json read p`, `json write d to p`, and the `csv` equivalents.
    fn data_file(&self, kind: &str, rest: &str) -> Result<Option<String>, TransformError> {
        let Some((verb, body)) = first_word(rest) else {
            return Ok(None);
        };
        match verb {
            "read" => Ok(Some(format!("read_{}({})", kind, self.expr(body)?))),
            "write" => {
                let (data, path) =
                    lexer::split_keyword(body, "to").ok_or_else(|| self.wrong_arity())?;
                Ok(Some(format!(
                    "write_{}({}, {})",
                    kind,
                    self.expr(data)?,
                    self.expr(path)?
                )))
            }
            _ => Ok(None),
        }
    }

    /// `call f a b` becomes `f(a, b)`.
    fn call(&self, body: &str) -> Result<String, TransformError> {
        if lexer::has_code_char(body, &['(']) {
            return self.expr(body);
        }
        let words = split_words(body);
        let Some((name, args)) = words.split_first() else {
            return Err(self.not_understood());
        };
        if !is_dotted_name(name) {
            return Err(self.not_understood());
        }
        let args = args
            .iter()
            .map(|arg| self.expr(arg))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(format!("{}({})", name, args.join(", ")))
    }

    /// `get d key` (a bare key is taken literally) or `get k from d`.
    fn get(&self, rest: &str) -> Result<String, TransformError> {
        if let Some((key, dict)) = lexer::split_keyword(rest, "from") {
            return Ok(format!("get({}, {})", self.expr(dict)?, self.expr(key)?));
        }
        let (dict, key) = first_word(rest).ok_or_else(|| self.wrong_arity())?;
        if key.is_empty() {
            return Err(self.wrong_arity());
        }
        let key = if is_identifier(key) && !is_reserved_word(key) {
            format!("\"{}\"", key)
        } else {
            self.expr(key)?
        };
        Ok(format!("get({}, {})", self.expr(dict)?, key))
    }

    /// `lambda a b -> body` becomes `(a, b) => body`.
    fn arrow_lambda(&self, text: &str) -> Result<Option<String>, TransformError> {
        let Some(rest) = text.strip_prefix("lambda ") else {
            return Ok(None);
        };
        let Some(arrow) = rest.find("->") else {
            return Ok(None);
        };
        let params = rest[..arrow]
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|p| !p.is_empty())
            .map(|p| self.name(p))
            .collect::<Result<Vec<_>, _>>()?;
        let body = self.expr(&rest[arrow + 2..])?;
        Ok(Some(format!("({}) => {}", params.join(", "), body)))
    }

    /// `f a b` becomes `f(a, b)` when nothing else on the line reads as an operator.
    fn positional_call(&self, text: &str) -> Result<Option<String>, TransformError> {
        let words = split_words(text);
        let Some((name, args)) = words.split_first() else {
            return Ok(None);
        };
        if args.is_empty()
            || !is_identifier(name)
            || lexer::has_code_char(text, OPERATOR_CHARS)
            || words.iter().any(|w| is_reserved_word(w))
        {
            return Ok(None);
        }
        let args = args
            .iter()
            .map(|arg| self.expr(arg))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Some(format!("{}({})", name, args.join(", "))))
    }
}

/// Canonical spelling of literals, comparisons, conversions and dictionary keys.
pub(crate) fn normalize(text: &str) -> String {
    let quoted = lexer::quote_dict_keys(text);
    lexer::map_code(&quoted, |code| {
        let mut code = code.to_string();
        for (pattern, replacement) in NORMALIZATIONS.iter() {
            code = pattern.replace_all(&code, *replacement).into_owned();
        }
        ARROW_LAMBDA
            .replace_all(&code, |caps: &regex::Captures<'_>| {
                let params: Vec<&str> = caps[1]
                    .split(|c: char| c == ',' || c.is_whitespace())
                    .filter(|p| !p.is_empty())
                    .collect();
                format!("({}) =>", params.join(", "))
            })
            .into_owned()
    })
}

/// Split `x > 3` into the operand `x` and the trailing `(">", "3")`.
fn split_operand(text: &str) -> (&str, Option<(&'static str, &str)>) {
    let text = text.trim();
    if let Some((first, rest)) = first_word(text) {
        if let Some(tail) = split_operator(rest) {
            return (first, Some(tail));
        }
    }
    (text, None)
}

/// A leading binary operator, with its canonical spelling and the text after it.
fn split_operator(text: &str) -> Option<(&'static str, &str)> {
    for op in SYMBOL_OPERATORS {
        if let Some(rest) = text.strip_prefix(op) {
            if !rest.is_empty() && !rest.starts_with('=') {
                return Some((op, rest.trim()));
            }
        }
    }

    let lowered = text.to_ascii_lowercase();
    for (words, canonical) in WORD_OPERATORS {
        if lowered.starts_with(words) {
            let rest = &text[words.len()..];
            if rest.starts_with(char::is_whitespace) && !rest.trim().is_empty() {
                return Some((canonical, rest.trim()));
            }
        }
    }
    None
}

fn starts_with_operator(text: &str) -> bool {
    text.starts_with(['.', ',', ')', ']', '}', ':', '='])
        || split_operator(text).is_some()
}

fn is_dotted_name(text: &str) -> bool {
    text.split('.').all(is_identifier)
}

/// Byte offset of `inner` within `outer`; `inner` must be a subslice.
fn offset_in(outer: &str, inner: &str) -> usize {
    (inner.as_ptr() as usize).saturating_sub(outer.as_ptr() as usize)
}
