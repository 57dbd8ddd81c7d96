//! Statement forms and block headers.

use super::TransformError;
use super::expr::{Rewriter, normalize};
use super::lexer::{self, first_word, is_identifier, split_keyword, split_top_level};
use crate::blocks::{BlockKind, BranchKind};

/// Strip a trailing comment and run the lexical gate.
fn prepare(line: usize, text: &str) -> Result<&str, TransformError> {
    let text = lexer::strip_comment(text.trim());
    lexer::check(text).map_err(|fault| TransformError::from_lex(line, fault))?;
    Ok(text)
}

/// Split off the first word, lowercased, and the text after it.
fn keyword(text: &str) -> (String, &str) {
    match text.find(char::is_whitespace) {
        Some(idx) => (text[..idx].to_ascii_lowercase(), text[idx..].trim()),
        None => (text.to_ascii_lowercase(), ""),
    }
}

/// Rewrite a leaf statement line.
pub(crate) fn rewrite_statement(line: usize, text: &str) -> Result<String, TransformError> {
    let text = prepare(line, text)?;
    let r = Rewriter::new(line, text);
    let (keyword, rest) = keyword(text);

    if let Some(rewritten) = statement_form(&r, &keyword, rest)? {
        return Ok(rewritten);
    }

    if let Some((lhs, rhs)) = split_keyword(text, "is") {
        let targets = split_top_level(lhs, ',')
            .into_iter()
            .map(|t| target(&r, t))
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(format!("{} = {}", targets.join(", "), r.expr(rhs)?));
    }

    r.expr(text)
}

fn statement_form(r: &Rewriter<'_>, keyword: &str, rest: &str) -> Result<Option<String>, TransformError> {
    let rewritten = match keyword {
        "say" => say(r, rest)?,
        "ask" => ask(r, rest)?,
        "return" | "raise" if rest.is_empty() => keyword.to_string(),
        "return" | "raise" => format!("{} {}", keyword, r.expr(rest)?),
        "break" | "continue" | "pass" if rest.is_empty() => keyword.to_string(),
        "import" | "from" | "global" if !rest.is_empty() => format!("{} {}", keyword, rest),
        "open" => match open(r, rest)? {
            Some(rewritten) => rewritten,
            None => return Ok(None),
        },
        "write" | "append" => {
            let (file, content) = first_word(rest).ok_or_else(|| r.wrong_arity())?;
            if content.is_empty() {
                return Err(r.wrong_arity());
            }
            format!("write({}, {})", r.expr(file)?, r.expr(content)?)
        }
        "read" | "close" | "clear" | "sort" | "reverse" | "copy" | "keys" | "values" | "items"
            if !rest.is_empty() =>
        {
            format!("{}({})", keyword, r.expr(rest)?)
        }
        "add" => match split_keyword(rest, "to") {
            Some((value, into)) => {
                let into = target(r, into)?;
                format!("{} = add_to({}, {})", into, into, r.expr(value)?)
            }
            None => return Ok(None),
        },
        "extend" => match split_keyword(rest, "with") {
            Some((list, items)) => format!("extend({}, {})", r.expr(list)?, r.expr(items)?),
            None => return Ok(None),
        },
        "insert" => {
            let Some((value, place)) = split_keyword(rest, "into") else {
                return Ok(None);
            };
            let (list, index) = split_keyword(place, "at").ok_or_else(|| r.wrong_arity())?;
            format!("insert({}, {}, {})", r.expr(list)?, r.expr(index)?, r.expr(value)?)
        }
        "remove" => match split_keyword(rest, "from") {
            Some((value, list)) => format!("remove({}, {})", r.expr(list)?, r.expr(value)?),
            None => return Ok(None),
        },
        "get" if !rest.is_empty() => r.expr(&format!("get {}", rest))?,
        "set" => set(r, rest)?,
        "pop" if !rest.is_empty() => match first_word(rest) {
            Some((container, "")) => format!("pop({})", r.expr(container)?),
            Some((container, key)) => format!("pop({}, {})", r.expr(container)?, r.expr(key)?),
            None => return Ok(None),
        },
        "unpack" => match split_keyword(rest, "into") {
            Some((value, targets)) => {
                let names = split_top_level(targets, ',')
                    .into_iter()
                    .map(|t| target(r, t))
                    .collect::<Result<Vec<_>, _>>()?;
                format!("{} = {}", names.join(", "), r.expr(value)?)
            }
            None => return Ok(None),
        },
        "list" | "dict" => declaration(r, keyword, rest)?,
        _ => return Ok(None),
    };
    Ok(Some(rewritten))
}

/// `say a, b` prints each value; `say "Total: " + t` splits on `+` when text is involved.
fn say(r: &Rewriter<'_>, rest: &str) -> Result<String, TransformError> {
    if rest.is_empty() {
        return Ok("print()".to_string());
    }

    if let Some((word, template)) = first_word(rest) {
        if word.eq_ignore_ascii_case("formatted") {
            if !lexer::is_literal(template) {
                return Err(r.not_understood());
            }
            let template = if template.starts_with('f') {
                template.to_string()
            } else {
                format!("f{}", template)
            };
            return Ok(format!("print({})", template));
        }
    }

    let mut parts = split_top_level(rest, ',');
    if parts.len() == 1 {
        let pieces = split_top_level(rest, '+');
        if pieces.len() > 1 && pieces.iter().any(|p| lexer::is_literal(p)) {
            parts = pieces;
        }
    }

    let args = parts
        .into_iter()
        .map(|part| r.expr(part))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(format!("print({})", args.join(", ")))
}

/// `ask name`, `ask "Prompt" as name`, or `ask "Prompt"` (stored in `result`).
fn ask(r: &Rewriter<'_>, rest: &str) -> Result<String, TransformError> {
    if rest.is_empty() {
        return Err(r.not_understood());
    }
    if let Some((prompt, name)) = split_keyword(rest, "as") {
        return Ok(format!("{} = ask({})", r.name(name)?, r.expr(prompt)?));
    }
    if is_identifier(rest) {
        return Ok(format!("{} = ask()", r.name(rest)?));
    }
    Ok(format!("result = ask({})", r.expr(rest)?))
}

/// `open "p" as f [for reading|writing|appending]`.
fn open(r: &Rewriter<'_>, rest: &str) -> Result<Option<String>, TransformError> {
    let Some((path, alias)) = split_keyword(rest, "as") else {
        return Ok(None);
    };
    let (name, purpose) = first_word(alias).ok_or_else(|| r.not_understood())?;
    let mode = match purpose.to_ascii_lowercase().as_str() {
        "" | "for reading" => "r",
        "for writing" => "w",
        "for appending" => "a",
        _ => return Err(r.not_understood()),
    };
    Ok(Some(format!(
        "{} = open({}, \"{}\")",
        r.name(name)?,
        r.expr(path)?,
        mode
    )))
}

/// `set d k to v` stores into a dictionary; `set n [is e]` declares a set.
fn set(r: &Rewriter<'_>, rest: &str) -> Result<String, TransformError> {
    if let Some((place, value)) = split_keyword(rest, "to") {
        let (dict, key) = first_word(place).ok_or_else(|| r.wrong_arity())?;
        if key.is_empty() {
            return Ok(format!("{} = {}", target(r, dict)?, r.expr(value)?));
        }
        let key = if is_identifier(key) && !lexer::is_reserved_word(key) {
            format!("\"{}\"", key)
        } else {
            r.expr(key)?
        };
        return Ok(format!("{}[{}] = {}", target(r, dict)?, key, r.expr(value)?));
    }
    declaration(r, "set", rest)
}

/// `list n`, `dict n`, `set n`, each optionally followed by `is e`.
fn declaration(r: &Rewriter<'_>, kind: &str, rest: &str) -> Result<String, TransformError> {
    let (name, value) = match split_keyword(rest, "is") {
        Some((name, value)) => (name, r.expr(value)?),
        None => {
            let empty = match kind {
                "list" => "[]",
                "dict" => "{}",
                _ => "set()",
            };
            (rest, empty.to_string())
        }
    };
    Ok(format!("{} = {}", r.name(name)?, value))
}

/// An assignment target: a name, an attribute path, or an indexed element.
fn target(r: &Rewriter<'_>, text: &str) -> Result<String, TransformError> {
    let text = text.trim();
    let head_len = text
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(text.len());
    let head = &text[..head_len];
    let tail = &text[head_len..];
    let tail_ok = tail.is_empty() || tail.starts_with(['.', '[']);
    if !tail_ok || head.is_empty() || !is_identifier(head) || lexer::is_reserved_word(head) {
        return Err(TransformError::InvalidName {
            line: r.line,
            name: text.to_string(),
        });
    }
    if lexer::has_code_char(tail, &[' ']) && !tail.starts_with('[') {
        return Err(TransformError::InvalidName {
            line: r.line,
            name: text.to_string(),
        });
    }
    Ok(normalize(text))
}

/// Rewrite the opening line of a block.
pub(crate) fn rewrite_block_header(kind: BlockKind, line: usize, text: &str) -> Result<String, TransformError> {
    let text = prepare(line, text)?;
    let r = Rewriter::new(line, text);
    let (_, rest) = keyword(text);

    match kind {
        BlockKind::If => Ok(format!("if {}", condition(&r, rest)?)),
        BlockKind::While => Ok(format!("while {}", condition(&r, rest)?)),
        BlockKind::Repeat => {
            let (count, name) = match split_keyword(rest, "as") {
                Some((count, name)) => (count, r.name(name)?),
                None => (rest, "_"),
            };
            let count = count
                .strip_suffix("times")
                .filter(|c| c.ends_with(char::is_whitespace))
                .unwrap_or(count);
            if count.trim().is_empty() {
                return Err(r.not_understood());
            }
            Ok(format!("for {} in range({})", name, r.expr(count)?))
        }
        BlockKind::ForEach => {
            let (_, rest) = keyword(rest);
            let (names, iterable) = split_keyword(rest, "in").ok_or_else(|| r.not_understood())?;
            let names = split_top_level(names, ',')
                .into_iter()
                .map(|n| r.name(n))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(format!("for {} in {}", names.join(", "), r.expr(iterable)?))
        }
        BlockKind::Function => {
            let (name, params) = function_signature(&r, rest)?;
            Ok(format!("fn {}({})", name, params.join(", ")))
        }
        BlockKind::Class => {
            let name = r.name(rest)?;
            Ok(format!("class {}", name))
        }
        BlockKind::Try if rest.is_empty() => Ok("try".to_string()),
        BlockKind::Try => Err(r.not_understood()),
    }
}

/// Rewrite the line that starts an alternate branch.
pub(crate) fn rewrite_branch_header(kind: BranchKind, line: usize, text: &str) -> Result<String, TransformError> {
    let text = prepare(line, text)?;
    let r = Rewriter::new(line, text);
    let (_, rest) = keyword(text);

    match kind {
        BranchKind::Elif => Ok(format!("elif {}", condition(&r, rest)?)),
        BranchKind::Else | BranchKind::Finally if rest.is_empty() => Ok(kind.keyword().to_string()),
        BranchKind::Else | BranchKind::Finally => Err(r.not_understood()),
        BranchKind::Catch if rest.is_empty() => Ok("catch error".to_string()),
        BranchKind::Catch => Ok(format!("catch {}", r.name(rest)?)),
    }
}

fn condition(r: &Rewriter<'_>, rest: &str) -> Result<String, TransformError> {
    if rest.is_empty() {
        return Err(r.not_understood());
    }
    r.expr(rest)
}

/// `name a b`, `name a, b` or `name(a, b)`.
fn function_signature<'t>(r: &Rewriter<'_>, rest: &'t str) -> Result<(&'t str, Vec<&'t str>), TransformError> {
    let (name, params) = match rest.find('(') {
        Some(open) => {
            let inner = rest[open + 1..]
                .trim_end()
                .strip_suffix(')')
                .ok_or_else(|| r.not_understood())?;
            (&rest[..open], inner)
        }
        None => match rest.find(char::is_whitespace) {
            Some(idx) => (&rest[..idx], &rest[idx..]),
            None => (rest, ""),
        },
    };
    let name = r.name(name)?;
    let params = params
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|p| !p.is_empty())
        .map(|p| r.name(p))
        .collect::<Result<Vec<_>, _>>()?;
    Ok((name, params))
}
