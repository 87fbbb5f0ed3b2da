use crate::placeholder::is_code_token;
use crate::template_ast::{Construct, Element, Node, NodeName};
use crate::text::{self, BARE_KEY, Segment};

/// Emit the construction call for `root` and, depth first, everything below
/// it. Placeholder tokens are left in place for the caller to restore.
pub fn generate(root: &Element) -> String {
    emit_element(root)
}

pub(crate) fn emit_element(el: &Element) -> String {
    match el.classify() {
        Construct::Node {
            scope,
            name,
            namespace,
            element,
        } => {
            let (children, keys) = emit_children(element);
            let attrs = emit_node_attrs(element, namespace.is_some());
            let name = match name {
                NodeName::Literal(n) => string_lit(&n),
                NodeName::Code(c) => c,
            };
            let keys: Vec<String> = keys.iter().map(|k| string_lit(k)).collect();
            format!(
                "{scope}.node({name}, vec![{children}], vec![{attrs}], &[{keys}], {ns})",
                keys = keys.join(", "),
                ns = string_lit(namespace.as_deref().unwrap_or("")),
            )
        }
        Construct::Component {
            scope,
            ctor,
            element,
        } => {
            // Text keys only bind on plain nodes; component children are
            // forwarded as-is.
            let (children, _) = emit_children(element);
            let args = emit_component_args(element);
            format!("{scope}.component({ctor}, vec![{children}], vec![{args}])")
        }
    }
}

/// Children list plus the bare keys found in direct text children.
pub(crate) fn emit_children(el: &Element) -> (String, Vec<String>) {
    let mut items = Vec::new();
    let mut keys = Vec::new();
    for child in &el.children {
        match child {
            Node::Element(e) => items.push(format!("{}.into()", emit_element(e))),
            Node::Text(t) => {
                for seg in text::segment(t) {
                    match seg {
                        Segment::Literal(s) => items.push(format!("{}.into()", string_lit(&s))),
                        Segment::Key(k) => {
                            items.push(format!("{}.into()", string_lit(&k)));
                            keys.push(k);
                        }
                        Segment::Code(c) => items.push(format!("Child::from({c})")),
                    }
                }
            }
        }
    }
    (items.join(", "), keys)
}

pub(crate) fn emit_node_attrs(el: &Element, namespaced: bool) -> String {
    let parts: Vec<String> = el
        .output_attrs()
        .map(|a| {
            // HTML attribute names are case-insensitive; keep SVG's camelCase.
            let name = if namespaced {
                a.name.clone()
            } else {
                a.name.to_ascii_lowercase()
            };
            let keys: Vec<String> = text::bare_keys(&a.value)
                .iter()
                .map(|k| string_lit(k))
                .collect();
            format!(
                "({}, Attr::new({}, &[{}]))",
                string_lit(&name),
                value_expr(&a.value),
                keys.join(", ")
            )
        })
        .collect();
    parts.join(", ")
}

pub(crate) fn emit_component_args(el: &Element) -> String {
    let parts: Vec<String> = el
        .output_attrs()
        .map(|a| format!("({}, Value::from({}))", string_lit(&a.name), value_expr(&a.value)))
        .collect();
    parts.join(", ")
}

/// A string literal, a bare placeholder token, or a `format!` call when
/// literal text and placeholders are mixed.
pub(crate) fn value_expr(value: &str) -> String {
    let tokens: Vec<_> = BARE_KEY
        .find_iter(value)
        .filter(|m| is_code_token(m.as_str()))
        .collect();
    if tokens.is_empty() {
        return string_lit(value);
    }
    if tokens.len() == 1 && tokens[0].as_str() == value {
        return strip_braces(value).to_string();
    }

    let mut fmt = String::new();
    let mut args = Vec::new();
    let mut last = 0;
    for m in tokens {
        fmt.push_str(&escape_format(&value[last..m.start()]));
        fmt.push_str("{}");
        args.push(strip_braces(m.as_str()).to_string());
        last = m.end();
    }
    fmt.push_str(&escape_format(&value[last..]));
    format!("format!({}, {})", string_lit(&fmt), args.join(", "))
}

fn strip_braces(token: &str) -> &str {
    token.trim_start_matches('{').trim_end_matches('}')
}

fn escape_format(s: &str) -> String {
    s.replace('{', "{{").replace('}', "}}")
}

/// Rust string literal for `s`, escaped exactly as the compiler expects.
pub fn string_lit(s: &str) -> String {
    let lit = syn::LitStr::new(s, proc_macro2::Span::call_site());
    quote::quote!(#lit).to_string()
}
