pub mod error;
pub mod extract;
pub mod placeholder;
pub mod template_ast;
pub mod template_codegen;
pub mod template_parse;
pub mod text;
pub mod transform;

pub use error::TransformError;
pub use template_parse::{MarkupParser, PestMarkup, parse_root, parse_template_to_ast};
pub use transform::{
    REGION_END, REGION_START, TRANSFORM_VERSION, TransformOptions, Transformer, has_region,
    transform, validate_expression,
};
