//! Keyed bindings: where each `{key}` was rendered, and how a new value is
//! written back to those places.

use std::sync::LazyLock;

use h12_dom::{Dom, NodeId};
use regex::Regex;

use crate::Value;

static BARE_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(h12_dom::BARE_KEY_PATTERN).expect("valid key pattern"));

/// Where a new value goes relative to what is already bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    Replace,
    /// `key++`
    Append,
    /// `++key`
    Prepend,
}

/// Split a key as passed to `set` into its braced form and position.
/// `name`, `{name}`, `{name}++` and `++name` are all accepted.
pub fn parse_key(raw: &str) -> (String, Position) {
    let raw = raw.trim();
    let position = match raw.find("++") {
        None => Position::Replace,
        Some(0) => Position::Prepend,
        Some(_) => Position::Append,
    };
    let stripped = raw.replacen("++", "", 1);
    let name = stripped.trim().trim_start_matches('{').trim_end_matches('}');
    (format!("{{{name}}}"), position)
}

/// What currently sits at a content location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Text,
    Element,
}

/// A text or element slot inside a rendered node.
#[derive(Debug, Clone)]
pub struct Content {
    pub node: NodeId,
    /// Element the slot was rendered into.
    pub parent: NodeId,
    pub kind: ContentKind,
    /// Siblings inserted by append/prepend, removed on the next replacement.
    pub run: Vec<NodeId>,
}

/// An attribute whose text is derived from a template over several keys.
#[derive(Debug, Clone)]
pub struct AttributeSlot {
    pub node: NodeId,
    pub name: String,
    pub template: String,
}

#[derive(Debug, Clone)]
pub enum Location {
    Content(Content),
    Attribute(AttributeSlot),
}

#[derive(Debug, Clone, Default)]
pub struct Binding {
    pub locations: Vec<Location>,
    /// Last text value written through this key.
    pub committed: Option<String>,
}

/// Outcome of writing one value into one location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Applied {
    Unchanged,
    Updated,
    /// Nodes were swapped out; listeners on them may now be stale.
    Replaced,
}

/// All bindings of one component instance, in registration order.
#[derive(Debug, Default)]
pub struct BindingTable {
    entries: Vec<(String, Binding)>,
}

impl BindingTable {
    pub fn get(&self, key: &str) -> Option<&Binding> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, b)| b)
    }

    fn get_mut(&mut self, key: &str) -> Option<&mut Binding> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, b)| b)
    }

    pub fn bind(&mut self, key: &str, location: Location) {
        match self.get_mut(key) {
            Some(b) => b.locations.push(location),
            None => self.entries.push((
                key.to_string(),
                Binding {
                    locations: vec![location],
                    committed: None,
                },
            )),
        }
    }

    pub fn bind_text(&mut self, key: &str, node: NodeId, parent: NodeId) {
        self.bind(
            key,
            Location::Content(Content {
                node,
                parent,
                kind: ContentKind::Text,
                run: Vec::new(),
            }),
        );
    }

    pub fn bind_attribute(&mut self, key: &str, node: NodeId, name: &str, template: &str) {
        self.bind(
            key,
            Location::Attribute(AttributeSlot {
                node,
                name: name.to_string(),
                template: template.to_string(),
            }),
        );
    }

    /// Braced keys in registration order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn location_count(&self, key: &str) -> Option<usize> {
        self.get(key).map(|b| b.locations.len())
    }

    pub fn committed(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(|b| b.committed.as_deref())
    }

    pub fn commit(&mut self, key: &str, value: &str) {
        if let Some(b) = self.get_mut(key) {
            b.committed = Some(value.to_string());
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Attribute text for `template` after `key` takes `value`. Other keys
    /// use their committed value; a key with no binding stays as written.
    pub fn derive(&self, template: &str, key: &str, value: &str) -> String {
        BARE_KEY
            .replace_all(template, |caps: &regex::Captures<'_>| {
                let found = &caps[0];
                if found == key {
                    value.to_string()
                } else if let Some(b) = self.get(found) {
                    b.committed.clone().unwrap_or_default()
                } else {
                    found.to_string()
                }
            })
            .into_owned()
    }

    /// Write `value` into location `index` of `key`.
    pub(crate) fn apply(
        &mut self,
        dom: &mut Dom,
        key: &str,
        index: usize,
        value: &Value,
        position: Position,
    ) -> Applied {
        let Some(location) = self
            .get(key)
            .and_then(|b| b.locations.get(index))
            .cloned()
        else {
            return Applied::Unchanged;
        };

        let (location, applied) = match location {
            Location::Content(content) => {
                let (content, applied) = match content.kind {
                    ContentKind::Text => apply_to_text(dom, content, value, position),
                    ContentKind::Element => apply_to_element(dom, content, value, position),
                };
                (Location::Content(content), applied)
            }
            Location::Attribute(slot) => {
                let applied = match text_of(value) {
                    Some(text) => {
                        let derived = self.derive(&slot.template, key, &text);
                        match dom.set_attribute(slot.node, &slot.name, &derived) {
                            Ok(()) => Applied::Updated,
                            Err(err) => {
                                tracing::warn!(%err, key, attribute = %slot.name, "attribute update failed");
                                Applied::Unchanged
                            }
                        }
                    }
                    None => Applied::Unchanged,
                };
                (Location::Attribute(slot), applied)
            }
        };

        if let Some(slot) = self
            .get_mut(key)
            .and_then(|b| b.locations.get_mut(index))
        {
            *slot = location;
        }
        applied
    }
}

/// Text form of a value, if it has one. `Empty` reads as "".
pub(crate) fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::Text(s) => Some(s.clone()),
        Value::Empty => Some(String::new()),
        _ => None,
    }
}

fn current_parent(dom: &Dom, content: &Content) -> NodeId {
    dom.parent(content.node).unwrap_or(content.parent)
}

fn apply_to_text(
    dom: &mut Dom,
    mut content: Content,
    value: &Value,
    position: Position,
) -> (Content, Applied) {
    if let Value::Node(new) = value {
        let parent = current_parent(dom, &content);
        if let Err(err) = dom.replace_child(parent, *new, content.node) {
            tracing::warn!(%err, "could not swap text for element");
            return (content, Applied::Unchanged);
        }
        dom.drop_subtree(content.node);
        content.node = *new;
        content.parent = parent;
        content.kind = ContentKind::Element;
        return (content, Applied::Replaced);
    }

    let Some(text) = text_of(value) else {
        return (content, Applied::Unchanged);
    };
    let current = dom.text(content.node).unwrap_or_default().to_string();
    let next = match position {
        Position::Replace => text,
        Position::Append => current + &text,
        Position::Prepend => text + &current,
    };
    match dom.set_text(content.node, &next) {
        Ok(()) => (content, Applied::Updated),
        Err(err) => {
            tracing::warn!(%err, "text update failed");
            (content, Applied::Unchanged)
        }
    }
}

fn apply_to_element(
    dom: &mut Dom,
    mut content: Content,
    value: &Value,
    position: Position,
) -> (Content, Applied) {
    let parent = current_parent(dom, &content);
    let old = content.node;

    match (value, position) {
        (Value::Node(new), Position::Append | Position::Prepend) => {
            let placed = insert_beside_run(dom, parent, &content, *new, position);
            if let Err(err) = placed {
                tracing::warn!(%err, "could not insert next to bound element");
                return (content, Applied::Unchanged);
            }
            content.run.push(*new);
            return (content, Applied::Updated);
        }
        (Value::Node(new), Position::Replace) => {
            if let Err(err) = dom.replace_child(parent, *new, old) {
                tracing::warn!(%err, "could not swap bound element");
                return (content, Applied::Unchanged);
            }
            content.node = *new;
        }
        _ => {
            let Some(text) = text_of(value) else {
                return (content, Applied::Unchanged);
            };
            let node = dom.create_text(&text);
            if let Err(err) = dom.replace_child(parent, node, old) {
                tracing::warn!(%err, "could not swap bound element for text");
                return (content, Applied::Unchanged);
            }
            content.node = node;
            content.kind = ContentKind::Text;
        }
    }

    for sibling in content.run.drain(..) {
        if sibling != content.node {
            dom.drop_subtree(sibling);
        }
    }
    if old != content.node {
        dom.drop_subtree(old);
    }
    content.parent = parent;
    (content, Applied::Replaced)
}

/// Put `new` before the first or after the last node of the tracked run.
fn insert_beside_run(
    dom: &mut Dom,
    parent: NodeId,
    content: &Content,
    new: NodeId,
    position: Position,
) -> Result<(), h12_dom::DomError> {
    let siblings = dom.children(parent);
    let indexes = std::iter::once(content.node)
        .chain(content.run.iter().copied())
        .filter_map(|n| siblings.iter().position(|s| *s == n).map(|i| (i, n)));
    let edge = match position {
        Position::Prepend => indexes.min_by_key(|(i, _)| *i),
        _ => indexes.max_by_key(|(i, _)| *i),
    };
    let Some((_, reference)) = edge else {
        return Err(h12_dom::DomError::NotAChild {
            parent,
            child: content.node,
        });
    };
    match position {
        Position::Prepend => dom.insert_before(parent, new, reference),
        _ => dom.insert_after(parent, new, reference),
    }
}
