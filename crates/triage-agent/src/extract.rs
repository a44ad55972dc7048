//! Helpers for pulling JSON out of free-form model text

use regex::Regex;
use std::sync::OnceLock;

/// Upper bound on how much raw text the greedy object scan looks at
pub const MAX_SCAN_BYTES: usize = 64 * 1024;

fn object_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?s)\{.*\}").expect("object pattern is a valid regex"))
}

/// Strip markdown code fences from a response
pub fn strip_markdown_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let clean = if let Some(rest) = trimmed.strip_prefix("```json") {
        rest
    } else if let Some(rest) = trimmed.strip_prefix("```") {
        rest
    } else {
        trimmed
    };
    let clean = clean.strip_suffix("```").unwrap_or(clean);
    clean.trim()
}

/// Fix common JSON issues in model output
///
/// Trailing commas and smart quotes are only rewritten outside string
/// literals; string contents pass through unchanged apart from stray
/// control characters.
pub fn fix_json_issues(json: &str) -> String {
    let mut fixed = String::with_capacity(json.len());
    let mut chars = json.chars();
    // Quote that ends the current string literal
    let mut closing: Option<char> = None;
    let mut escaped = false;

    while let Some(c) = chars.next() {
        if c.is_control() && c != '\n' && c != '\t' {
            continue;
        }

        if let Some(close) = closing {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' if close == '"' => closing = None,
                '\u{201C}' | '\u{201D}' if close == '\u{201D}' => {
                    closing = None;
                    fixed.push('"');
                    continue;
                }
                _ => {}
            }
            fixed.push(c);
            continue;
        }

        match c {
            '"' => closing = Some('"'),
            '\u{201C}' | '\u{201D}' => {
                closing = Some('\u{201D}');
                fixed.push('"');
                continue;
            }
            '\u{2018}' | '\u{2019}' => {
                fixed.push('\'');
                continue;
            }
            ',' => {
                let next = chars.clone().find(|n| !n.is_whitespace());
                if matches!(next, Some(']' | '}')) {
                    continue;
                }
            }
            _ => {}
        }
        fixed.push(c);
    }

    fixed
}

/// Largest prefix of `text` not longer than `max` bytes, cut on a char boundary
fn bounded(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// First `{` through last `}` in the bounded text, spanning newlines
pub fn greedy_object(text: &str) -> Option<&str> {
    object_pattern()
        .find(bounded(text, MAX_SCAN_BYTES))
        .map(|m| m.as_str())
}

/// First brace-balanced object, aware of string literals and escapes
pub fn balanced_object(text: &str) -> Option<&str> {
    let text = bounded(text, MAX_SCAN_BYTES);
    let mut depth: usize = 0;
    let mut start = None;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match c {
            '"' if depth > 0 => in_string = true,
            '{' => {
                if depth == 0 {
                    start = Some(i);
                }
                depth += 1;
            }
            '}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    return start.map(|s| &text[s..=i]);
                }
            }
            _ => {}
        }
    }

    None
}

/// First `max_chars` characters of the trimmed text
pub fn excerpt(text: &str, max_chars: usize) -> String {
    text.trim().chars().take(max_chars).collect()
}
