//! Structural tree produced by the markup parser, and its classification into
//! the two construction forms the generator knows about.

/// Attributes that steer generation instead of ending up on the output.
pub const CONTROL_ATTRS: [&str; 4] = ["args", "alias", "scope", "svg"];

/// Scope used when an element does not name one.
pub const DEFAULT_SCOPE: &str = "this";

#[derive(Debug, Clone, PartialEq)]
pub struct TemplateAttr {
    pub name: String,
    /// Empty for boolean attributes such as `args`.
    pub value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub tag: String,
    pub attrs: Vec<TemplateAttr>,
    pub children: Vec<Node>,
    /// Set for elements parsed inside an `<svg>` subtree.
    pub namespace: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
}

/// An element classified once by its control attributes.
#[derive(Debug, Clone, PartialEq)]
pub enum Construct<'a> {
    /// Plain node construction: `<scope>.node(...)`.
    Node {
        scope: String,
        name: NodeName,
        namespace: Option<String>,
        element: &'a Element,
    },
    /// Sub-component construction: `<scope>.component(...)`.
    Component {
        scope: String,
        ctor: String,
        element: &'a Element,
    },
}

/// Name of a plain node: a tag literal, or code producing one (an alias that
/// was hidden behind a placeholder).
#[derive(Debug, Clone, PartialEq)]
pub enum NodeName {
    Literal(String),
    Code(String),
}

impl Element {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.iter().any(|a| a.name == name)
    }

    pub fn is_component(&self) -> bool {
        self.has_attr("args")
    }

    /// Attributes that are emitted, i.e. everything but the reserved control
    /// attributes. A non-empty `args` value is passed through as an argument.
    pub fn output_attrs(&self) -> impl Iterator<Item = &TemplateAttr> {
        self.attrs.iter().filter(|a| {
            if a.name == "args" {
                !a.value.is_empty()
            } else {
                !CONTROL_ATTRS.contains(&a.name.as_str())
            }
        })
    }

    pub fn classify(&self) -> Construct<'_> {
        let scope = self
            .attr("scope")
            .map(strip_code_braces)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_SCOPE.to_string());

        let alias = self
            .attr("alias")
            .map(|a| a.trim().trim_start_matches('{').trim_end_matches('}').to_string())
            .filter(|a| !a.trim().is_empty());

        if self.is_component() {
            let ctor = alias.unwrap_or_else(|| format!("{}::default", pascal_case(&self.tag)));
            return Construct::Component {
                scope,
                ctor,
                element: self,
            };
        }

        let name = match alias {
            Some(a) if crate::placeholder::is_code_token(&a) => NodeName::Code(a),
            Some(a) => NodeName::Literal(a.trim().to_string()),
            None if self.namespace.is_some() => NodeName::Literal(self.tag.clone()),
            None => NodeName::Literal(self.tag.to_ascii_lowercase()),
        };
        let namespace = self.namespace.clone().or_else(|| {
            self.has_attr("svg")
                .then(|| crate::template_parse::SVG_NAMESPACE.to_string())
        });
        Construct::Node {
            scope,
            name,
            namespace,
            element: self,
        }
    }
}

/// Strip braces and all whitespace, as for `scope={ parent }`.
fn strip_code_braces(s: &str) -> String {
    s.chars()
        .filter(|c| *c != '{' && *c != '}' && !c.is_whitespace())
        .collect()
}

/// `todo-item` → `TodoItem`; path segments before `::` are kept as written.
pub fn pascal_case(tag: &str) -> String {
    let (path, last) = match tag.rfind("::") {
        Some(i) => (&tag[..i + 2], &tag[i + 2..]),
        None => ("", tag),
    };
    let mut out = String::from(path);
    for part in last.split(['-', '_', '.']).filter(|p| !p.is_empty()) {
        let mut chars = part.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    }
    out
}
