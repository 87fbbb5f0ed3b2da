//! Live node arena used by the h12 runtime.
//!
//! `Dom` owns every node of one session; `Document` is the shared handle the
//! component runtime passes around. `VNode` is a plain value snapshot of a
//! subtree, handy for assertions.

pub mod arena;
pub mod document;
pub mod events;

pub use arena::{Dom, DomError, NodeId};
pub use document::Document;
pub use events::{Event, Listener, ListenerId};

/// Namespace URI used for `<svg>` subtrees.
pub const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";

/// Regex source for a bare binding key: `{name}` with no whitespace or
/// nested braces. The transform emits keys in this form and the runtime
/// matches them in attribute templates.
pub const BARE_KEY_PATTERN: &str = r"\{[^{}\s]*\}";

/// Detached copy of a subtree, compared structurally in tests.
#[derive(Debug, Clone, PartialEq)]
pub enum VNode {
    Element {
        tag: String,
        namespace: Option<String>,
        props: Props,
        children: Vec<VNode>,
    },
    Text(String),
}

/// Attributes in the order they were first set.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Props {
    pub attrs: Vec<(String, String)>,
}

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `k`, keeping its position if it is already present.
    pub fn set(mut self, k: impl Into<String>, v: impl Into<String>) -> Self {
        let (k, v) = (k.into(), v.into());
        match self.attrs.iter_mut().find(|(name, _)| *name == k) {
            Some((_, old)) => *old = v,
            None => self.attrs.push((k, v)),
        }
        self
    }

    pub fn get(&self, k: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(name, _)| name == k)
            .map(|(_, v)| v.as_str())
    }
}

impl From<()> for Props {
    fn from(_: ()) -> Self {
        Props::default()
    }
}

impl From<Vec<(&str, &str)>> for Props {
    fn from(v: Vec<(&str, &str)>) -> Self {
        v.into_iter().fold(Props::new(), |p, (k, v)| p.set(k, v))
    }
}

pub fn h(tag: impl Into<String>, props: impl Into<Props>, children: Vec<VNode>) -> VNode {
    VNode::Element {
        tag: tag.into(),
        namespace: None,
        props: props.into(),
        children,
    }
}

pub fn text(t: impl Into<String>) -> VNode {
    VNode::Text(t.into())
}

impl VNode {
    /// Same element, placed in namespace `ns`. Text is returned unchanged.
    pub fn in_namespace(self, ns: &str) -> VNode {
        match self {
            VNode::Element {
                tag,
                props,
                children,
                ..
            } => VNode::Element {
                tag,
                namespace: Some(ns.to_string()),
                props,
                children,
            },
            other => other,
        }
    }

    /// Concatenated text of this subtree, in document order.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        fn walk(v: &VNode, out: &mut String) {
            match v {
                VNode::Text(t) => out.push_str(t),
                VNode::Element { children, .. } => children.iter().for_each(|c| walk(c, out)),
            }
        }
        walk(self, &mut out);
        out
    }
}
