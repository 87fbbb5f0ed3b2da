//! Region rewrite driver: finds every `<> ... </>` block in a source file and
//! replaces it with the construction call generated for its markup.

use crate::TransformError;
use crate::extract;
use crate::placeholder;
use crate::template_codegen;
use crate::template_parse::{MarkupParser, PestMarkup};

/// Version stamped into rewritten files and checked by the runtime.
pub const TRANSFORM_VERSION: &str = "2.2.0";

pub const REGION_START: &str = "<>";
pub const REGION_END: &str = "</>";

/// Knobs for one [`Transformer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransformOptions {
    /// How many levels of regions nested inside interpolations are resolved
    /// before giving up. The outermost region is level 0.
    pub max_depth: usize,
    /// Parse every generated expression with `syn` before returning it.
    pub validate: bool,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            max_depth: 16,
            validate: false,
        }
    }
}

impl TransformOptions {
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn validate(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }
}

/// True when `code` holds both region markers.
pub fn has_region(code: &str) -> bool {
    code.contains(REGION_START) && code.contains(REGION_END)
}

#[derive(Debug, Clone, Default)]
pub struct Transformer<P = PestMarkup> {
    parser: P,
    options: TransformOptions,
}

impl Transformer<PestMarkup> {
    pub fn new(options: TransformOptions) -> Self {
        Self {
            parser: PestMarkup,
            options,
        }
    }
}

impl<P: MarkupParser> Transformer<P> {
    pub fn with_parser(parser: P, options: TransformOptions) -> Self {
        Self { parser, options }
    }

    pub fn options(&self) -> &TransformOptions {
        &self.options
    }

    /// Rewrite every top-level region of `code`, left to right. Text outside
    /// regions is copied through untouched; so is the whole input when its
    /// markers do not balance.
    pub fn transform(&self, code: &str) -> Result<String, TransformError> {
        if !code.contains(REGION_START) && !code.contains(REGION_END) {
            return Ok(code.to_string());
        }
        let found = extract::regions(code, REGION_START, REGION_END);
        tracing::debug!(regions = found.len(), "transforming source");
        extract::replace_regions(code, &found, |r| self.generate_region(r.inner, 0))
    }

    /// Generate the expression for one region's inner markup.
    ///
    /// Compound interpolations are restored verbatim, so a region written
    /// inside one comes back as raw markers. Those are resolved in a bounded
    /// loop, one nesting level per pass.
    pub fn generate_region(&self, inner: &str, depth: usize) -> Result<String, TransformError> {
        let (safe, table) = placeholder::encode(inner);
        let root = self.parser.parse_root(&safe)?;
        let mut code = table.restore(&template_codegen::generate(&root));
        tracing::debug!(
            depth,
            tag = %root.tag,
            placeholders = table.len(),
            "generated template region"
        );

        let mut level = depth;
        while has_region(&code) {
            level += 1;
            if level > self.options.max_depth {
                return Err(TransformError::DepthExceeded {
                    max: self.options.max_depth,
                });
            }
            let nested = extract::regions(&code, REGION_START, REGION_END);
            if nested.is_empty() {
                break;
            }
            code = extract::replace_regions(&code, &nested, |r| self.generate_region(r.inner, level))?;
        }

        if self.options.validate {
            validate_expression(&code)?;
        }
        Ok(code)
    }
}

/// Confirm `code` parses as a single Rust expression.
pub fn validate_expression(code: &str) -> Result<(), TransformError> {
    syn::parse_str::<syn::Expr>(code)
        .map(|_| ())
        .map_err(|e| TransformError::InvalidOutput {
            message: e.to_string(),
            code: code.to_string(),
        })
}

/// Rewrite `code` with default options.
pub fn transform(code: &str) -> Result<String, TransformError> {
    Transformer::new(TransformOptions::default()).transform(code)
}
