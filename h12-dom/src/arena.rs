use std::fmt::Write as _;

use thiserror::Error;

use crate::events::{Listener, ListenerId, Registration};
use crate::{Props, VNode};

/// Handle to a node. A handle to a dropped node stays invalid even after
/// its slot is reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: usize,
    generation: u32,
}

#[derive(Debug, Error, PartialEq)]
pub enum DomError {
    #[error("node {0:?} does not exist")]
    Missing(NodeId),
    #[error("node {0:?} is not an element")]
    NotAnElement(NodeId),
    #[error("node {child:?} is not a child of {parent:?}")]
    NotAChild { parent: NodeId, child: NodeId },
    #[error("inserting {child:?} into {parent:?} would create a cycle")]
    Cycle { parent: NodeId, child: NodeId },
}

enum Kind {
    Element {
        tag: String,
        namespace: Option<String>,
        attrs: Vec<(String, String)>,
    },
    Text(String),
}

struct Slot {
    kind: Kind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    listeners: Vec<Registration>,
}

struct Entry {
    generation: u32,
    slot: Option<Slot>,
}

/// Arena holding every node of one live session.
///
/// [`Dom::remove`] only detaches, so a node can be reinserted later;
/// [`Dom::drop_subtree`] frees a subtree and its slots are reused. The arena
/// also hands out the session's ephemeral tokens.
pub struct Dom {
    entries: Vec<Entry>,
    free: Vec<usize>,
    body: NodeId,
    next_listener: u64,
    next_token: u64,
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}

impl Dom {
    pub fn new() -> Self {
        let mut dom = Dom {
            entries: Vec::new(),
            free: Vec::new(),
            body: NodeId {
                index: 0,
                generation: 0,
            },
            next_listener: 0,
            next_token: 0,
        };
        dom.body = dom.create_element("body", None);
        dom
    }

    /// The root every connected node hangs off.
    pub fn body(&self) -> NodeId {
        self.body
    }

    /// A fresh base-36 token, unique within this arena.
    pub fn next_token(&mut self) -> String {
        self.next_token += 1;
        // Offset so tokens are never a single digit.
        let mut n = self.next_token + 36 * 36;
        let mut digits = Vec::new();
        while n > 0 {
            digits.push(std::char::from_digit((n % 36) as u32, 36).unwrap_or('0'));
            n /= 36;
        }
        digits.iter().rev().collect()
    }

    pub fn create_element(&mut self, tag: &str, namespace: Option<&str>) -> NodeId {
        self.push(Kind::Element {
            tag: tag.to_string(),
            namespace: namespace.filter(|ns| !ns.is_empty()).map(str::to_string),
            attrs: Vec::new(),
        })
    }

    pub fn create_text(&mut self, value: &str) -> NodeId {
        self.push(Kind::Text(value.to_string()))
    }

    fn push(&mut self, kind: Kind) -> NodeId {
        let slot = Slot {
            kind,
            parent: None,
            children: Vec::new(),
            listeners: Vec::new(),
        };
        match self.free.pop() {
            Some(index) => {
                let entry = &mut self.entries[index];
                entry.slot = Some(slot);
                NodeId {
                    index,
                    generation: entry.generation,
                }
            }
            None => {
                self.entries.push(Entry {
                    generation: 0,
                    slot: Some(slot),
                });
                NodeId {
                    index: self.entries.len() - 1,
                    generation: 0,
                }
            }
        }
    }

    fn slot(&self, id: NodeId) -> Result<&Slot, DomError> {
        self.entries
            .get(id.index)
            .filter(|e| e.generation == id.generation)
            .and_then(|e| e.slot.as_ref())
            .ok_or(DomError::Missing(id))
    }

    fn slot_mut(&mut self, id: NodeId) -> Result<&mut Slot, DomError> {
        self.entries
            .get_mut(id.index)
            .filter(|e| e.generation == id.generation)
            .and_then(|e| e.slot.as_mut())
            .ok_or(DomError::Missing(id))
    }

    /// False once the node has been dropped.
    pub fn exists(&self, id: NodeId) -> bool {
        self.slot(id).is_ok()
    }

    /// Nodes currently alive, the body included.
    pub fn len(&self) -> usize {
        self.entries.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Slots allocated so far, alive or free.
    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.slot(id).map(|s| &s.kind), Ok(Kind::Element { .. }))
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.slot(id).map(|s| &s.kind), Ok(Kind::Text(_)))
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match &self.slot(id).ok()?.kind {
            Kind::Element { tag, .. } => Some(tag),
            Kind::Text(_) => None,
        }
    }

    pub fn namespace(&self, id: NodeId) -> Option<&str> {
        match &self.slot(id).ok()?.kind {
            Kind::Element { namespace, .. } => namespace.as_deref(),
            Kind::Text(_) => None,
        }
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.slot(id).ok()?.kind {
            Kind::Text(t) => Some(t),
            Kind::Element { .. } => None,
        }
    }

    pub fn set_text(&mut self, id: NodeId, value: &str) -> Result<(), DomError> {
        match &mut self.slot_mut(id)?.kind {
            Kind::Text(t) => {
                t.clear();
                t.push_str(value);
                Ok(())
            }
            Kind::Element { .. } => Err(DomError::NotAnElement(id)),
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.slot(id).ok()?.parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.slot(id).map(|s| s.children.as_slice()).unwrap_or(&[])
    }

    /// True when `id` is `ancestor` or lies somewhere below it.
    pub fn contains(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut cur = Some(id);
        while let Some(n) = cur {
            if n == ancestor {
                return true;
            }
            cur = self.parent(n);
        }
        false
    }

    /// Attached to the live tree, i.e. reachable from the body.
    pub fn is_connected(&self, id: NodeId) -> bool {
        self.contains(self.body, id)
    }

    fn check_insert(&self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        if !self.is_element(parent) {
            return Err(DomError::NotAnElement(parent));
        }
        self.slot(child)?;
        if self.contains(child, parent) {
            return Err(DomError::Cycle { parent, child });
        }
        Ok(())
    }

    fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.parent(id) {
            if let Ok(slot) = self.slot_mut(parent) {
                slot.children.retain(|c| *c != id);
            }
            if let Ok(slot) = self.slot_mut(id) {
                slot.parent = None;
            }
        }
    }

    /// Insert `child` at `index` (clamped) under `parent`, moving it out of
    /// any previous parent first.
    pub fn insert_child(
        &mut self,
        parent: NodeId,
        index: usize,
        child: NodeId,
    ) -> Result<(), DomError> {
        self.check_insert(parent, child)?;
        self.detach(child);
        let slot = self.slot_mut(parent)?;
        let index = index.min(slot.children.len());
        slot.children.insert(index, child);
        self.slot_mut(child)?.parent = Some(parent);
        Ok(())
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.check_insert(parent, child)?;
        self.detach(child);
        self.slot_mut(parent)?.children.push(child);
        self.slot_mut(child)?.parent = Some(parent);
        Ok(())
    }

    pub fn prepend_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.insert_child(parent, 0, child)
    }

    fn index_in(&self, parent: NodeId, child: NodeId) -> Result<usize, DomError> {
        self.children(parent)
            .iter()
            .position(|c| *c == child)
            .ok_or(DomError::NotAChild { parent, child })
    }

    pub fn insert_before(
        &mut self,
        parent: NodeId,
        new: NodeId,
        reference: NodeId,
    ) -> Result<(), DomError> {
        if new == reference {
            return Ok(());
        }
        self.check_insert(parent, new)?;
        self.detach(new);
        let index = self.index_in(parent, reference)?;
        self.insert_child(parent, index, new)
    }

    pub fn insert_after(
        &mut self,
        parent: NodeId,
        new: NodeId,
        reference: NodeId,
    ) -> Result<(), DomError> {
        if new == reference {
            return Ok(());
        }
        self.check_insert(parent, new)?;
        self.detach(new);
        let index = self.index_in(parent, reference)?;
        self.insert_child(parent, index + 1, new)
    }

    /// Put `new` where `old` sits under `parent`; `old` ends up detached.
    pub fn replace_child(
        &mut self,
        parent: NodeId,
        new: NodeId,
        old: NodeId,
    ) -> Result<(), DomError> {
        if new == old {
            return Ok(());
        }
        self.index_in(parent, old)?;
        self.check_insert(parent, new)?;
        self.detach(new);
        let index = self.index_in(parent, old)?;
        self.slot_mut(parent)?.children[index] = new;
        self.slot_mut(new)?.parent = Some(parent);
        self.slot_mut(old)?.parent = None;
        Ok(())
    }

    /// Detach `id` from its parent. Removing a detached node is a no-op.
    pub fn remove(&mut self, id: NodeId) {
        self.detach(id);
    }

    /// Detach `id` and free it with everything below it, listeners
    /// included. Returns how many nodes were freed; the body is never freed.
    pub fn drop_subtree(&mut self, id: NodeId) -> usize {
        if id == self.body || !self.exists(id) {
            return 0;
        }
        self.detach(id);
        let mut doomed = self.descendants(id);
        doomed.push(id);
        for node in &doomed {
            let entry = &mut self.entries[node.index];
            entry.slot = None;
            entry.generation = entry.generation.wrapping_add(1);
            self.free.push(node.index);
        }
        tracing::trace!(freed = doomed.len(), "dropped subtree");
        doomed.len()
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        match &self.slot(id).ok()?.kind {
            Kind::Element { attrs, .. } => attrs
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str()),
            Kind::Text(_) => None,
        }
    }

    pub fn attributes(&self, id: NodeId) -> &[(String, String)] {
        match self.slot(id).map(|s| &s.kind) {
            Ok(Kind::Element { attrs, .. }) => attrs,
            _ => &[],
        }
    }

    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        match &mut self.slot_mut(id)?.kind {
            Kind::Element { attrs, .. } => {
                match attrs.iter_mut().find(|(k, _)| k == name) {
                    Some((_, v)) => *v = value.to_string(),
                    None => attrs.push((name.to_string(), value.to_string())),
                }
                Ok(())
            }
            Kind::Text(_) => Err(DomError::NotAnElement(id)),
        }
    }

    pub fn remove_attribute(&mut self, id: NodeId, name: &str) {
        if let Ok(Slot {
            kind: Kind::Element { attrs, .. },
            ..
        }) = self.slot_mut(id)
        {
            attrs.retain(|(k, _)| k != name);
        }
    }

    /// Every node strictly below `root` in pre-order.
    pub fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(root).iter().rev().copied().collect();
        while let Some(n) = stack.pop() {
            out.push(n);
            stack.extend(self.children(n).iter().rev().copied());
        }
        out
    }

    /// Elements below `root` carrying attribute `name`, like `[name]` as a
    /// selector.
    pub fn query_attribute_all(&self, root: NodeId, name: &str) -> Vec<NodeId> {
        self.descendants(root)
            .into_iter()
            .filter(|n| self.attribute(*n, name).is_some())
            .collect()
    }

    pub fn add_event_listener(
        &mut self,
        id: NodeId,
        event: &str,
        listener: Listener,
    ) -> Result<ListenerId, DomError> {
        if !self.is_element(id) {
            return Err(DomError::NotAnElement(id));
        }
        self.next_listener += 1;
        let lid = ListenerId(self.next_listener);
        self.slot_mut(id)?.listeners.push(Registration {
            event: event.to_string(),
            id: lid,
            listener,
        });
        Ok(lid)
    }

    /// Returns whether a listener was actually removed.
    pub fn remove_event_listener(&mut self, id: NodeId, event: &str, listener: ListenerId) -> bool {
        let Ok(slot) = self.slot_mut(id) else {
            return false;
        };
        let before = slot.listeners.len();
        slot.listeners
            .retain(|r| !(r.id == listener && r.event == event));
        before != slot.listeners.len()
    }

    pub fn listener_count(&self, id: NodeId) -> usize {
        self.slot(id).map(|s| s.listeners.len()).unwrap_or(0)
    }

    pub(crate) fn listeners_for(&self, id: NodeId, event: &str) -> Vec<Listener> {
        self.slot(id)
            .map(|s| {
                s.listeners
                    .iter()
                    .filter(|r| r.event == event)
                    .map(|r| r.listener.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Concatenated text below `id`.
    pub fn text_content(&self, id: NodeId) -> String {
        if let Some(t) = self.text(id) {
            return t.to_string();
        }
        self.descendants(id)
            .into_iter()
            .filter_map(|n| self.text(n))
            .collect()
    }

    pub fn snapshot(&self, id: NodeId) -> VNode {
        match self.slot(id).map(|s| &s.kind) {
            Ok(Kind::Element { tag, namespace, attrs }) => {
                let props = attrs
                    .iter()
                    .fold(Props::new(), |p, (k, v)| p.set(k.as_str(), v.as_str()));
                VNode::Element {
                    tag: tag.clone(),
                    namespace: namespace.clone(),
                    props,
                    children: self.children(id).iter().map(|c| self.snapshot(*c)).collect(),
                }
            }
            Ok(Kind::Text(t)) => VNode::Text(t.clone()),
            Err(_) => VNode::Text(String::new()),
        }
    }

    /// Serialize the subtree rooted at `id` as markup. Attributes keep their
    /// insertion order.
    pub fn to_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_html(id, &mut out);
        out
    }

    fn write_html(&self, id: NodeId, out: &mut String) {
        match self.slot(id).map(|s| &s.kind) {
            Ok(Kind::Text(t)) => out.push_str(&escape(t, false)),
            Ok(Kind::Element { tag, attrs, .. }) => {
                let _ = write!(out, "<{tag}");
                for (k, v) in attrs {
                    let _ = write!(out, " {k}=\"{}\"", escape(v, true));
                }
                out.push('>');
                for c in self.children(id) {
                    self.write_html(*c, out);
                }
                let _ = write!(out, "</{tag}>");
            }
            Err(_) => {}
        }
    }
}

fn escape(s: &str, attribute: bool) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' if !attribute => out.push_str("&lt;"),
            '>' if !attribute => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}
