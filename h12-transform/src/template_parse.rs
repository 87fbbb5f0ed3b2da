use pest::Parser;
use pest::iterators::Pair;

use crate::TransformError;
use crate::template_ast::{Element, Node, TemplateAttr};

/// Namespace URI inherited by everything inside `<svg>`.
pub use h12_dom::SVG_NAMESPACE;

#[derive(pest_derive::Parser)]
#[grammar = "template.pest"]
struct TemplateParser;

/// Turns placeholder-safe markup into a structural tree with one root.
pub trait MarkupParser {
    fn parse_root(&self, markup: &str) -> Result<Element, TransformError>;
}

/// The built-in grammar-driven parser.
#[derive(Debug, Default, Clone, Copy)]
pub struct PestMarkup;

impl MarkupParser for PestMarkup {
    fn parse_root(&self, markup: &str) -> Result<Element, TransformError> {
        parse_root(markup)
    }
}

/// Parse `input` into its top-level nodes:
/// - nested, self-closing (`<x/>`) and void (`<input>`) elements
/// - attributes: `"quoted"`, `'quoted'`, `{braced}`, bare, boolean
/// - text, where balanced `{...}` groups may contain any character
pub fn parse_template_to_ast(input: &str) -> Result<Vec<Node>, TransformError> {
    let mut pairs =
        TemplateParser::parse(Rule::document, input).map_err(|e| TransformError::Parse(e.to_string()))?;
    let Some(document) = pairs.next() else {
        return Ok(Vec::new());
    };
    debug_assert!(document.as_rule() == Rule::document);

    Ok(document
        .into_inner()
        .filter_map(|p| convert(p, None))
        .collect())
}

/// Parse a region that must hold exactly one root element. Whitespace around
/// the root is ignored; any other text is an error.
pub fn parse_root(input: &str) -> Result<Element, TransformError> {
    let nodes = parse_template_to_ast(input)?;
    let mut roots = Vec::new();
    for node in nodes {
        match node {
            Node::Element(e) => roots.push(e),
            Node::Text(t) if is_all_ws(&t) => {}
            Node::Text(t) => return Err(TransformError::StrayText(t.trim().to_string())),
        }
    }
    if roots.len() != 1 {
        return Err(TransformError::RootCount { found: roots.len() });
    }
    Ok(roots.remove(0))
}

fn convert(pair: Pair<Rule>, namespace: Option<&str>) -> Option<Node> {
    match pair.as_rule() {
        Rule::self_closing | Rule::void_element | Rule::paired => {
            Some(Node::Element(convert_element(pair, namespace)))
        }
        Rule::text => Some(Node::Text(pair.as_str().to_string())),
        _ => None,
    }
}

fn convert_element(pair: Pair<Rule>, inherited: Option<&str>) -> Element {
    let mut tag = String::new();
    let mut attrs = Vec::new();
    let mut children = Vec::new();
    let mut namespace = inherited.map(str::to_string);

    for part in pair.into_inner() {
        match part.as_rule() {
            Rule::tag_name | Rule::void_name => {
                tag = part.as_str().to_string();
                if tag.eq_ignore_ascii_case("svg") {
                    namespace = Some(SVG_NAMESPACE.to_string());
                }
            }
            Rule::attribute => attrs.push(parse_attr(part)),
            _ => {
                if let Some(child) = convert(part, namespace.as_deref()) {
                    children.push(child);
                }
            }
        }
    }

    Element {
        tag,
        attrs,
        children,
        namespace,
    }
}

fn parse_attr(attr: Pair<Rule>) -> TemplateAttr {
    // attribute = attr_name ( "=" value )?
    let mut name = String::new();
    let mut value = String::new();

    for part in attr.into_inner() {
        match part.as_rule() {
            Rule::attr_name => name = part.as_str().to_string(),
            Rule::dq_value | Rule::sq_value => {
                value = part
                    .into_inner()
                    .next()
                    .map(|inner| inner.as_str().to_string())
                    .unwrap_or_default();
            }
            Rule::brace_value | Rule::bare_value => value = part.as_str().to_string(),
            _ => {}
        }
    }
    TemplateAttr { name, value }
}

fn is_all_ws(s: &str) -> bool {
    s.chars().all(|c| c.is_whitespace())
}
