//! Headless vs. interactive strategy selection.

use crate::config::ExecutionMode;

/// The strategy a run actually uses once `auto` has been resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectiveMode {
    /// One-shot execution under a pseudo-terminal.
    Headless,
    /// Steered execution inside a detached tmux session.
    Interactive,
}

impl EffectiveMode {
    pub fn as_str(self) -> &'static str {
        match self {
            EffectiveMode::Headless => "headless",
            EffectiveMode::Interactive => "interactive",
        }
    }
}

fn is_line_break(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r' | '\x0b' | '\x0c' | '\x1c' | '\x1d' | '\x1e' | '\u{85}' | '\u{2028}' | '\u{2029}'
    )
}

/// Splits text on every line boundary a pasted prompt may carry.
///
/// Besides `\n` and `\r\n` this breaks on a lone `\r`, vertical tab, form
/// feed, the file/group/record separators, NEL, U+2028 and U+2029. A
/// trailing boundary does not produce an empty last line.
pub fn split_prompt_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();
    while let Some((idx, c)) = chars.next() {
        if !is_line_break(c) {
            continue;
        }
        lines.push(&text[start..idx]);
        start = idx + c.len_utf8();
        if c == '\r' && chars.next_if(|&(_, next)| next == '\n').is_some() {
            start += 1;
        }
    }
    if start < text.len() {
        lines.push(&text[start..]);
    }
    lines
}

/// Returns true if any line of the prompt, trimmed, starts with `/`.
pub fn looks_like_slash_commands(prompt: Option<&str>) -> bool {
    prompt.is_some_and(|text| {
        split_prompt_lines(text)
            .into_iter()
            .any(|line| line.trim().starts_with('/'))
    })
}

/// Picks the effective mode. An explicit request always wins.
pub fn select_mode(prompt: Option<&str>, requested: ExecutionMode) -> EffectiveMode {
    match requested {
        ExecutionMode::Headless => EffectiveMode::Headless,
        ExecutionMode::Interactive => EffectiveMode::Interactive,
        ExecutionMode::Auto if looks_like_slash_commands(prompt) => EffectiveMode::Interactive,
        ExecutionMode::Auto => EffectiveMode::Headless,
    }
}

/// Splits the prompt into the lines the interactive driver types, in order.
///
/// Whitespace-only lines are dropped; kept lines are not trimmed.
pub fn prompt_queue(prompt: &str) -> Vec<&str> {
    split_prompt_lines(prompt)
        .into_iter()
        .filter(|line| !line.trim().is_empty())
        .collect()
}
