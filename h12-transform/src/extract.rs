//! Balanced-region extraction between a start and an end marker.

use std::ops::Range;

/// One top-level balanced region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region<'a> {
    /// Text between the markers.
    pub inner: &'a str,
    /// Byte span of the region including both markers.
    pub span: Range<usize>,
}

/// Find every top-level, non-overlapping region delimited by `start`/`end`,
/// allowing arbitrary nesting inside. Regions come back in source order.
///
/// Unbalanced markers anywhere in `text` yield no regions at all, which
/// callers treat as "leave the text alone".
pub fn regions<'a>(text: &'a str, start: &str, end: &str) -> Vec<Region<'a>> {
    let bytes = text.as_bytes();
    let (open, close) = (start.as_bytes(), end.as_bytes());
    if open.is_empty() || close.is_empty() {
        return Vec::new();
    }

    let mut found = Vec::new();
    let mut depth = 0usize;
    let mut begin = 0usize;
    let mut i = 0usize;

    while i < bytes.len() {
        if bytes[i..].starts_with(open) {
            if depth == 0 {
                begin = i;
            }
            depth += 1;
            i += open.len();
        } else if bytes[i..].starts_with(close) {
            if depth == 0 {
                tracing::warn!(offset = i, marker = end, "unbalanced end marker");
                return Vec::new();
            }
            depth -= 1;
            i += close.len();
            if depth == 0 {
                found.push(Region {
                    inner: &text[begin + open.len()..i - close.len()],
                    span: begin..i,
                });
            }
        } else {
            i += 1;
        }
    }

    if depth != 0 {
        tracing::warn!(marker = start, "unbalanced start marker");
        return Vec::new();
    }
    found
}

/// Inner texts of [`regions`], markers stripped.
pub fn match_recursive<'a>(text: &'a str, start: &str, end: &str) -> Vec<&'a str> {
    regions(text, start, end).into_iter().map(|r| r.inner).collect()
}

/// Rebuild `text`, substituting each region (left to right) with whatever
/// `replace` returns for it.
pub fn replace_regions<E>(
    text: &str,
    regions: &[Region<'_>],
    mut replace: impl FnMut(&Region<'_>) -> Result<String, E>,
) -> Result<String, E> {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for region in regions {
        out.push_str(&text[last..region.span.start]);
        out.push_str(&replace(region)?);
        last = region.span.end;
    }
    out.push_str(&text[last..]);
    Ok(out)
}
