//! Quote- and bracket-aware scanning of a single line.
//!
//! Every rewrite works on the code between text literals; nothing here ever
//! looks inside a literal except to find where it ends.

use std::ops::Range;

/// A lexical fault found before any rewriting happens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum LexFault {
    UnterminatedString,
    UnclosedBracket(char),
    UnexpectedBracket(char),
    ForbiddenCharacter(char),
    ReservedName(String),
}

/// A byte range of a line, either code or a complete text literal (quotes included).
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Segment {
    pub range: Range<usize>,
    pub literal: bool,
}

const FORBIDDEN: &[char] = &[';', '`', '$', '@', '\\'];

/// Split a line into code and literal segments.
pub(crate) fn segments(text: &str) -> Result<Vec<Segment>, LexFault> {
    let bytes = text.as_bytes();
    let mut out = Vec::new();
    let mut code_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        let quote = bytes[i];
        if quote != b'"' && quote != b'\'' {
            i += 1;
            continue;
        }

        if code_start < i {
            out.push(Segment {
                range: code_start..i,
                literal: false,
            });
        }

        let end = literal_end(bytes, i).ok_or(LexFault::UnterminatedString)?;
        out.push(Segment {
            range: i..end,
            literal: true,
        });
        i = end;
        code_start = end;
    }

    if code_start < bytes.len() {
        out.push(Segment {
            range: code_start..bytes.len(),
            literal: false,
        });
    }
    Ok(out)
}

/// Byte offset just past the literal that opens at `start`.
fn literal_end(bytes: &[u8], start: usize) -> Option<usize> {
    let quote = bytes[start];
    let triple = bytes.len() >= start + 3 && bytes[start + 1] == quote && bytes[start + 2] == quote;
    if triple {
        let mut i = start + 3;
        while i + 3 <= bytes.len() {
            if bytes[i] == b'\\' {
                i += 2;
                continue;
            }
            if bytes[i] == quote && bytes[i + 1] == quote && bytes[i + 2] == quote {
                return Some(i + 3);
            }
            i += 1;
        }
        return None;
    }

    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b if b == quote => return Some(i + 1),
            _ => i += 1,
        }
    }
    None
}

/// The lexical gate applied to every line before rewriting.
pub(crate) fn check(text: &str) -> Result<(), LexFault> {
    let mut stack: Vec<char> = Vec::new();

    for segment in segments(text)? {
        if segment.literal {
            continue;
        }
        let code = &text[segment.range];

        if let Some(ch) = code.chars().find(|c| FORBIDDEN.contains(c)) {
            return Err(LexFault::ForbiddenCharacter(ch));
        }

        for ch in code.chars() {
            match ch {
                '(' | '[' | '{' => stack.push(ch),
                ')' | ']' | '}' => match stack.pop() {
                    Some(open) if closer(open) == ch => {}
                    _ => return Err(LexFault::UnexpectedBracket(ch)),
                },
                _ => {}
            }
        }

        if let Some(name) = words(code).find(|w| w.starts_with("__")) {
            return Err(LexFault::ReservedName(name.to_string()));
        }
    }

    match stack.pop() {
        Some(open) => Err(LexFault::UnclosedBracket(open)),
        None => Ok(()),
    }
}

fn closer(open: char) -> char {
    match open {
        '(' => ')',
        '[' => ']',
        _ => '}',
    }
}

/// Identifier-like runs in a piece of code.
fn words(code: &str) -> impl Iterator<Item = &str> {
    code.split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .filter(|w| !w.is_empty())
}

/// Drop a trailing `# comment` that sits outside any literal.
pub(crate) fn strip_comment(text: &str) -> &str {
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'"' | b'\'' => match literal_end(bytes, i) {
                Some(end) => i = end,
                // The gate reports the unterminated literal.
                None => return text,
            },
            b'#' => return text[..i].trim_end(),
            _ => i += 1,
        }
    }
    text
}

/// Walk the top level of a line (outside literals and brackets), calling
/// `visit` with each byte offset and character found there.
fn walk_top_level(text: &str, mut visit: impl FnMut(usize, char) -> bool) {
    let Ok(segments) = segments(text) else {
        return;
    };
    let mut depth = 0usize;
    for segment in segments {
        if segment.literal {
            continue;
        }
        let offset = segment.range.start;
        for (idx, ch) in text[segment.range].char_indices() {
            match ch {
                '(' | '[' | '{' => depth += 1,
                ')' | ']' | '}' => depth = depth.saturating_sub(1),
                _ if depth == 0 => {
                    if !visit(offset + idx, ch) {
                        return;
                    }
                }
                _ => {}
            }
        }
    }
}

/// Split on a separator character found at the top level.
pub(crate) fn split_top_level(text: &str, sep: char) -> Vec<&str> {
    let mut cuts = Vec::new();
    walk_top_level(text, |idx, ch| {
        if ch == sep {
            cuts.push(idx);
        }
        true
    });

    let mut parts = Vec::with_capacity(cuts.len() + 1);
    let mut start = 0;
    for cut in cuts {
        parts.push(text[start..cut].trim());
        start = cut + sep.len_utf8();
    }
    parts.push(text[start..].trim());
    parts
}

/// Whether any of `chars` appears at the top level.
pub(crate) fn has_top_level(text: &str, chars: &[char]) -> bool {
    let mut found = false;
    walk_top_level(text, |_, ch| {
        found = chars.contains(&ch);
        !found
    });
    found
}

/// Whether any of `chars` appears anywhere outside literals, brackets included.
pub(crate) fn has_code_char(text: &str, chars: &[char]) -> bool {
    match segments(text) {
        Ok(segments) => segments
            .iter()
            .filter(|s| !s.literal)
            .any(|s| text[s.range.clone()].contains(chars)),
        Err(_) => true,
    }
}

/// Find a keyword surrounded by whitespace at the top level, case-insensitively,
/// and split the line around its first occurrence.
pub(crate) fn split_keyword<'a>(text: &'a str, keyword: &str) -> Option<(&'a str, &'a str)> {
    let mut found = None;
    let bytes = text.as_bytes();
    walk_top_level(text, |idx, ch| {
        if !ch.is_whitespace() {
            return true;
        }
        let start = idx + ch.len_utf8();
        let end = start + keyword.len();
        let matches = text
            .get(start..end)
            .is_some_and(|word| word.eq_ignore_ascii_case(keyword))
            && bytes.get(end).is_some_and(|b| b.is_ascii_whitespace());
        if matches {
            found = Some((start, end));
            return false;
        }
        true
    });

    found.map(|(start, end)| (text[..start].trim(), text[end..].trim()))
}

/// Split on top-level whitespace. A literal or bracket group stays in one word.
pub(crate) fn split_words(text: &str) -> Vec<&str> {
    let mut words = Vec::new();
    let mut start: Option<usize> = None;
    let mut cuts = Vec::new();
    walk_top_level(text, |idx, ch| {
        if ch.is_whitespace() {
            cuts.push(idx);
        }
        true
    });

    let mut cut_iter = cuts.into_iter().peekable();
    for (idx, ch) in text.char_indices() {
        let is_cut = cut_iter.peek() == Some(&idx);
        if is_cut {
            cut_iter.next();
            if let Some(s) = start.take() {
                words.push(&text[s..idx]);
            }
            continue;
        }
        if start.is_none() && !ch.is_whitespace() {
            start = Some(idx);
        }
    }
    if let Some(s) = start {
        words.push(&text[s..]);
    }
    words
}

/// The first top-level word and everything after it.
pub(crate) fn first_word(text: &str) -> Option<(&str, &str)> {
    let text = text.trim();
    let first = *split_words(text).first()?;
    Some((first, text[first.len()..].trim()))
}

/// Whether the whole text is a single literal, optionally prefixed with `f`.
pub(crate) fn is_literal(text: &str) -> bool {
    let text = text.trim();
    let body = text.strip_prefix('f').unwrap_or(text);
    match segments(body) {
        Ok(segments) => matches!(segments.as_slice(), [s] if s.literal),
        Err(_) => false,
    }
}

/// Whether the text is a plain identifier.
pub(crate) fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Rewrite only the code parts of a line, leaving literals untouched.
pub(crate) fn map_code(text: &str, mut rewrite: impl FnMut(&str) -> String) -> String {
    let Ok(segments) = segments(text) else {
        return rewrite(text);
    };
    let mut out = String::with_capacity(text.len());
    for segment in segments {
        let piece = &text[segment.range];
        if segment.literal {
            out.push_str(piece);
        } else {
            out.push_str(&rewrite(piece));
        }
    }
    out
}

/// Quote bare identifier keys of `{...}` literals: `{name: 1}` becomes `{"name": 1}`.
pub(crate) fn quote_dict_keys(text: &str) -> String {
    let Ok(segments) = segments(text) else {
        return text.to_string();
    };

    let mut out = String::with_capacity(text.len() + 8);
    let mut stack: Vec<char> = Vec::new();
    // The last non-space code character emitted, used to spot key position.
    let mut previous: Option<char> = None;

    for segment in segments {
        let piece = &text[segment.range];
        if segment.literal {
            out.push_str(piece);
            previous = Some('"');
            continue;
        }

        let mut chars = piece.char_indices().peekable();
        while let Some((idx, ch)) = chars.next() {
            let at_key = stack.last() == Some(&'{') && matches!(previous, Some('{') | Some(','));
            if at_key && (ch.is_ascii_alphabetic() || ch == '_') {
                let rest = &piece[idx..];
                let len = rest
                    .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                    .unwrap_or(rest.len());
                let word = &rest[..len];
                let after = rest[len..].trim_start();
                if after.starts_with(':') && !is_reserved_word(word) {
                    out.push('"');
                    out.push_str(word);
                    out.push('"');
                } else {
                    out.push_str(word);
                }
                for _ in 1..word.chars().count() {
                    chars.next();
                }
                previous = word.chars().last();
                continue;
            }

            match ch {
                '(' | '[' | '{' => stack.push(ch),
                ')' | ']' | '}' => {
                    stack.pop();
                }
                _ => {}
            }
            out.push(ch);
            if !ch.is_whitespace() {
                previous = Some(ch);
            }
        }
    }
    out
}

/// Words that never name a value in canonical text.
pub(crate) fn is_reserved_word(word: &str) -> bool {
    RESERVED_WORDS.iter().any(|w| w.eq_ignore_ascii_case(word))
}

pub(crate) const RESERVED_WORDS: &[&str] = &[
    "and", "or", "not", "in", "is", "if", "elif", "else", "while", "for", "each", "repeat",
    "function", "fn", "class", "try", "catch", "finally", "return", "raise", "break",
    "continue", "pass", "import", "from", "global", "end", "true", "false", "none", "nothing",
    "as", "to", "with", "into", "at", "of", "lambda",
];

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_segments_keep_literals_whole() {
        let text = r#"say "a # b", 'it''s' + x"#;
        let literals: Vec<&str> = segments(text)
            .unwrap()
            .into_iter()
            .filter(|s| s.literal)
            .map(|s| &text[s.range])
            .collect();
        assert_eq!(literals, vec![r#""a # b""#, "'it'", "'s'"]);
    }

    #[test]
    fn test_triple_quoted_literal() {
        let text = r#"say """she said "hi" """"#;
        assert!(check(text).is_ok());
        assert_eq!(segments(text).unwrap().len(), 2);
    }

    #[test]
    fn test_gate() {
        assert_eq!(check("say \"open"), Err(LexFault::UnterminatedString));
        assert_eq!(check("x is (1 + 2"), Err(LexFault::UnclosedBracket('(')));
        assert_eq!(check("x is 1)"), Err(LexFault::UnexpectedBracket(')')));
        assert_eq!(check("x is [1, 2)"), Err(LexFault::UnexpectedBracket(')')));
        assert_eq!(check("x is 1; y is 2"), Err(LexFault::ForbiddenCharacter(';')));
        assert_eq!(check("say $HOME"), Err(LexFault::ForbiddenCharacter('$')));
        assert_eq!(
            check("x is __import__"),
            Err(LexFault::ReservedName("__import__".to_string()))
        );
        assert!(check(r#"say "a;b $c @d \n (""#).is_ok());
        assert!(check("my__name is 1").is_ok());
    }

    #[test]
    fn test_strip_comment() {
        assert_eq!(strip_comment(r##"say "#1" # the first"##), r##"say "#1""##);
        assert_eq!(strip_comment("x is 2"), "x is 2");
    }

    #[test]
    fn test_split_keyword() {
        assert_eq!(split_keyword("x is 5", "is"), Some(("x", "5")));
        assert_eq!(split_keyword(r#"say "x is 5""#, "is"), None);
        assert_eq!(split_keyword("add 1 TO total", "to"), Some(("add 1", "total")));
        assert_eq!(split_keyword("f(a is b) is c", "is"), Some(("f(a is b)", "c")));
        assert_eq!(split_keyword("this is", "is"), None);
    }

    #[test]
    fn test_split_words_and_top_level() {
        assert_eq!(
            split_words(r#"greet "Ada Lovelace"  [1, 2]  f(x, y)"#),
            vec![r#"greet"#, r#""Ada Lovelace""#, "[1, 2]", "f(x, y)"]
        );
        assert_eq!(split_top_level(r#"a, "b, c", [d, e]"#, ','), vec!["a", r#""b, c""#, "[d, e]"]);
        assert_eq!(first_word("  len  nums "), Some(("len", "nums")));
        assert!(has_top_level("a + b", &['+']));
        assert!(!has_top_level("f(a + b)", &['+']));
        assert!(has_code_char("f(a + b)", &['+']));
        assert!(!has_code_char(r#""a + b""#, &['+']));
    }

    #[test]
    fn test_quote_dict_keys() {
        assert_eq!(
            quote_dict_keys(r#"{name: "Alex", age: 3}"#),
            r#"{"name": "Alex", "age": 3}"#
        );
        assert_eq!(quote_dict_keys(r#"{"a": {b: xs[1:2]}}"#), r#"{"a": {"b": xs[1:2]}}"#);
        assert_eq!(quote_dict_keys("{a, b}"), "{a, b}");
        assert_eq!(quote_dict_keys(r#"f"{x:.2f}""#), r#"f"{x:.2f}""#);
    }

    #[test]
    fn test_is_literal() {
        assert!(is_literal(r#""hello""#));
        assert!(is_literal(r#"f"hi {name}""#));
        assert!(!is_literal(r#""a" + "b""#));
        assert!(!is_literal("x"));
    }
}
