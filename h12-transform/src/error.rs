use thiserror::Error;

/// Errors raised while rewriting template regions.
///
/// Unbalanced markers are absent: a region that cannot be
/// delimited is left untouched instead.
#[derive(Debug, Error, PartialEq)]
pub enum TransformError {
    /// The markup grammar rejected a region.
    #[error("failed to parse template markup:\n{0}")]
    Parse(String),

    /// A region must contain exactly one top-level element.
    #[error("template region must have exactly one root element, found {found}")]
    RootCount { found: usize },

    /// Non-blank text outside the root element.
    #[error("unexpected text outside the root element: {0:?}")]
    StrayText(String),

    /// Nested regions kept reappearing past the configured bound.
    #[error("nested template regions exceed the maximum depth of {max}")]
    DepthExceeded { max: usize },

    /// Generated code did not parse as a Rust expression.
    #[error("generated code is not a valid expression ({message}):\n{code}")]
    InvalidOutput { message: String, code: String },
}
