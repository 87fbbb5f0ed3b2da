//! Hides compound interpolations behind opaque tokens so the markup grammar
//! only ever sees `{bare}` keys and `{__CODE__n__}` tokens.

use crate::extract;
use crate::transform::has_region;

/// Marker embedded in every code token.
pub const CODE_MARKER: &str = "__CODE__";

/// Bare token for index `n`, as it appears in generated code.
pub fn code_token(index: usize) -> String {
    format!("{CODE_MARKER}{index}__")
}

pub fn is_code_token(text: &str) -> bool {
    text.contains(CODE_MARKER)
}

/// Token → original expression text for one encode/restore cycle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaceholderTable {
    entries: Vec<(String, String)>,
}

impl PlaceholderTable {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Original expression recorded for `token` (with or without braces).
    pub fn get(&self, token: &str) -> Option<&str> {
        let bare = token.trim_start_matches('{').trim_end_matches('}');
        self.entries
            .iter()
            .find(|(t, _)| t == bare)
            .map(|(_, code)| code.as_str())
    }

    /// Put every recorded expression back, verbatim, wherever its bare token
    /// occurs in `generated`.
    pub fn restore(&self, generated: &str) -> String {
        let mut out = generated.to_string();
        for (token, code) in &self.entries {
            out = out.replace(token.as_str(), code);
        }
        out
    }
}

/// Replace each top-level `{...}` whose content contains whitespace or a
/// template region with a `{__CODE__n__}` token. Other single-token
/// interpolations stay as they are.
pub fn encode(text: &str) -> (String, PlaceholderTable) {
    let regions = extract::regions(text, "{", "}");
    let mut table = PlaceholderTable::default();

    let rewritten = extract::replace_regions::<std::convert::Infallible>(text, &regions, |r| {
        if r.inner.chars().any(char::is_whitespace) || has_region(r.inner) {
            let token = code_token(table.entries.len());
            table.entries.push((token.clone(), r.inner.to_string()));
            Ok(format!("{{{token}}}"))
        } else {
            Ok(format!("{{{}}}", r.inner))
        }
    });

    match rewritten {
        Ok(text) => (text, table),
        Err(never) => match never {},
    }
}
