//! Boundary to an external code generator.
//!
//! A [`CodeGenerator`] turns a plain-English request into TALE source. Its
//! output is treated like anything a user typed: it goes through the same
//! analyze and run pipeline, with no shortcut. Prompts are screened before
//! the generator is called.

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

/// Instructions for generator implementations describing the language.
pub const SYSTEM_PROMPT: &str = r#"You are an expert TALE code generator.
Always respond with TALE code only.
Never include markdown, backticks, comments, or explanations.
Never output Python or other languages.
Keep programs concise and free of unbounded or infinite loops.

TALE is readable, English-like programming for beginners.
Core syntax rules:
- Variables: x is 5
- Output: say x
- Input: ask name
- Condition:
  if x > 5
  say "big"
  else
  say "small"
  end
- Loops:
  repeat 5
  say "hello"
  end
- While loops:
  while x < 3
  add 1 to x
  end
- Functions:
  function add a b
  return a + b
  end
- Lists: list numbers is [1,2,3]
- Dictionary access: set scores player to 10, get scores player
- File IO: open "path" as f, write f "data", close f
- Flow: try / catch err / finally / end
- Blocks end with the word end on its own line.

Generation rules:
- Return only executable TALE code.
- No markdown, no backticks, no comments, no prose.
- Avoid dangerous content, system commands, hacking, or unbounded loops."#;

/// Patterns a prompt is screened against, matched case-insensitively.
pub const UNSAFE_PATTERNS: &[&str] = &[
    r"\bhack(ing)?\b",
    r"\bexploit\b",
    r"\bsystem command\b",
    r"\bcommand prompt\b",
    r"\bterminal\b",
    r"\bshell\b",
    r"\bbash\b",
    r"\bpowershell\b",
    r"\bcmd\.exe\b",
    r"\binfinite loop\b",
    r"while\s+true",
    r"for\s+ever",
];

lazy_static! {
    static ref UNSAFE: Vec<Regex> = UNSAFE_PATTERNS
        .iter()
        .map(|pattern| Regex::new(&format!("(?i){}", pattern)).unwrap())
        .collect();
    static ref OPENING_FENCE: Regex = Regex::new(r"^```[a-zA-Z0-9_-]*").unwrap();
    static ref CLOSING_FENCE: Regex = Regex::new(r"```$").unwrap();
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerateError {
    #[error("Empty prompt")]
    EmptyPrompt,

    #[error("Unsafe request")]
    UnsafePrompt { pattern: &'static str },

    #[error("The generator returned no code")]
    EmptyResponse,

    /// The generator backend failed.
    #[error("Code generation failed: {0}")]
    Backend(String),
}

/// Something that writes TALE programs from English requests.
pub trait CodeGenerator {
    fn generate(&self, prompt: &str) -> Result<String, GenerateError>;
}

impl<F> CodeGenerator for F
where
    F: Fn(&str) -> Result<String, GenerateError>,
{
    fn generate(&self, prompt: &str) -> Result<String, GenerateError> {
        self(prompt)
    }
}

/// Reject empty prompts and prompts matching [`UNSAFE_PATTERNS`].
pub fn screen_prompt(prompt: &str) -> Result<&str, GenerateError> {
    let prompt = prompt.trim();
    if prompt.is_empty() {
        return Err(GenerateError::EmptyPrompt);
    }
    for (regex, pattern) in UNSAFE.iter().zip(UNSAFE_PATTERNS.iter().copied()) {
        if regex.is_match(prompt) {
            tracing::warn!(pattern, "prompt rejected");
            return Err(GenerateError::UnsafePrompt { pattern });
        }
    }
    Ok(prompt)
}

/// Remove a surrounding markdown code fence, if any.
pub fn strip_code_fences(text: &str) -> &str {
    let text = text.trim();
    let text = match OPENING_FENCE.find(text) {
        Some(found) => &text[found.end()..],
        None => text,
    };
    let text = match CLOSING_FENCE.find(text) {
        Some(found) => &text[..found.start()],
        None => text,
    };
    text.trim()
}

/// Screen `prompt`, call `generator`, and clean up what it returns.
pub fn generate_code(generator: &dyn CodeGenerator, prompt: &str) -> Result<String, GenerateError> {
    let prompt = screen_prompt(prompt)?;
    let response = generator.generate(prompt)?;
    let code = strip_code_fences(&response);
    if code.is_empty() {
        return Err(GenerateError::EmptyResponse);
    }
    tracing::debug!(code_len = code.len(), "generated code");
    Ok(code.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_screen_prompt() {
        assert_eq!(screen_prompt("  count to ten "), Ok("count to ten"));
        assert_eq!(screen_prompt("   "), Err(GenerateError::EmptyPrompt));
        assert!(matches!(
            screen_prompt("open a Terminal for me"),
            Err(GenerateError::UnsafePrompt { pattern: r"\bterminal\b" })
        ));
        assert!(screen_prompt("loop WHILE   TRUE").is_err());
        assert!(screen_prompt("a shellfish recipe").is_ok());
    }

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```tale\nsay 1\n```"), "say 1");
        assert_eq!(strip_code_fences("```\nsay 1\n```\n"), "say 1");
        assert_eq!(strip_code_fences("say 1"), "say 1");
    }

    #[test]
    fn test_generate_code() {
        let fenced = |_: &str| -> Result<String, GenerateError> { Ok("```\nsay \"hi\"\n```".to_string()) };
        assert_eq!(generate_code(&fenced, "greet"), Ok("say \"hi\"".to_string()));

        let empty = |_: &str| -> Result<String, GenerateError> { Ok("```\n```".to_string()) };
        assert_eq!(generate_code(&empty, "greet"), Err(GenerateError::EmptyResponse));

        let never_called = |_: &str| -> Result<String, GenerateError> { panic!("generator called") };
        assert!(generate_code(&never_called, "hack the school").is_err());
    }
}
