use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

use crate::{Dom, Event, NodeId, VNode};

/// Shared handle to one session's [`Dom`].
///
/// Cloning is cheap; all clones see the same nodes. Borrows taken through
/// [`Document::dom`] / [`Document::dom_mut`] must be released before calling
/// back into user code, which [`Document::dispatch`] takes care of.
#[derive(Clone, Default)]
pub struct Document {
    inner: Rc<RefCell<Dom>>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dom(&self) -> Ref<'_, Dom> {
        self.inner.borrow()
    }

    pub fn dom_mut(&self) -> RefMut<'_, Dom> {
        self.inner.borrow_mut()
    }

    pub fn ptr_eq(&self, other: &Document) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn body(&self) -> NodeId {
        self.dom().body()
    }

    /// Attach `node` at the end of the body.
    pub fn mount(&self, node: NodeId) -> Result<(), crate::DomError> {
        let body = self.body();
        self.dom_mut().append_child(body, node)
    }

    pub fn to_html(&self, node: NodeId) -> String {
        self.dom().to_html(node)
    }

    pub fn snapshot(&self, node: NodeId) -> VNode {
        self.dom().snapshot(node)
    }

    pub fn text_content(&self, node: NodeId) -> String {
        self.dom().text_content(node)
    }

    /// Deliver `event` to listeners on its target, then on each ancestor.
    /// Listeners run in registration order per node; the arena is not
    /// borrowed while they run. Returns how many listeners were invoked.
    pub fn dispatch(&self, mut event: Event) -> usize {
        let path: Vec<NodeId> = {
            let dom = self.dom();
            let mut path = Vec::new();
            let mut cur = Some(event.target);
            while let Some(n) = cur {
                path.push(n);
                cur = dom.parent(n);
            }
            path
        };

        let mut invoked = 0;
        for node in path {
            let listeners = self.dom().listeners_for(node, &event.name);
            event.current = node;
            for listener in listeners {
                listener(&event);
                invoked += 1;
            }
        }
        tracing::trace!(event = %event.name, invoked, "dispatched");
        invoked
    }

    /// Shorthand for dispatching a bare event by name.
    pub fn emit(&self, target: NodeId, name: &str) -> usize {
        self.dispatch(Event::new(name, target))
    }
}
