//! Splits template text into literal runs, bare keys and code tokens.

use std::sync::LazyLock;

use regex::Regex;

use crate::placeholder::is_code_token;

/// A `{key}` interpolation with no whitespace or nested braces.
pub static BARE_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(h12_dom::BARE_KEY_PATTERN).expect("valid key pattern"));

static LINE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t\r]*\n\s*").expect("valid line-break pattern"));

#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    Literal(String),
    /// A bare key, braces included, e.g. `{count}`.
    Key(String),
    /// A placeholder token with its braces stripped, e.g. `__CODE__0__`.
    Code(String),
}

/// Bare keys in `text` that are real binding keys (placeholder tokens
/// excluded), in order of appearance.
pub fn bare_keys(text: &str) -> Vec<String> {
    BARE_KEY
        .find_iter(text)
        .map(|m| m.as_str())
        .filter(|k| !is_code_token(k))
        .map(str::to_string)
        .collect()
}

/// Tokenize one text node. Whitespace runs that contain a line break are
/// formatting and are removed; text that is blank afterwards yields nothing.
pub fn segment(raw: &str) -> Vec<Segment> {
    let value = LINE_BREAK.replace_all(raw, "");
    if value.trim().is_empty() {
        return Vec::new();
    }

    let mut out = Vec::new();
    let mut last = 0;
    for m in BARE_KEY.find_iter(&value) {
        if m.start() > last {
            out.push(Segment::Literal(value[last..m.start()].to_string()));
        }
        let token = m.as_str();
        if is_code_token(token) {
            out.push(Segment::Code(
                token.trim_start_matches('{').trim_end_matches('}').to_string(),
            ));
        } else {
            out.push(Segment::Key(token.to_string()));
        }
        last = m.end();
    }
    if last < value.len() {
        out.push(Segment::Literal(value[last..].to_string()));
    }
    out
}
