use std::rc::Rc;

use crate::NodeId;

/// Identifies one registered listener so it can be removed again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub(crate) u64);

pub type Listener = Rc<dyn Fn(&Event)>;

/// An event travelling from `target` up through its ancestors.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub name: String,
    pub target: NodeId,
    /// Node whose listener is currently running.
    pub current: NodeId,
    pub detail: Option<String>,
}

impl Event {
    pub fn new(name: impl Into<String>, target: NodeId) -> Self {
        Self {
            name: name.into(),
            target,
            current: target,
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

pub(crate) struct Registration {
    pub(crate) event: String,
    pub(crate) id: ListenerId,
    pub(crate) listener: Listener,
}
