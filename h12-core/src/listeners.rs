use h12_dom::{Dom, ListenerId, NodeId};

/// Listeners one instance installed, grouped by host element, so they can
/// be removed again when their nodes go away.
#[derive(Debug, Default)]
pub struct ListenerRegistry {
    entries: Vec<(NodeId, Vec<(String, ListenerId)>)>,
}

impl ListenerRegistry {
    pub fn register(&mut self, node: NodeId, event: &str, id: ListenerId) {
        match self.entries.iter_mut().find(|(n, _)| *n == node) {
            Some((_, list)) => list.push((event.to_string(), id)),
            None => self.entries.push((node, vec![(event.to_string(), id)])),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.iter().map(|(_, l)| l.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove listeners whose host is neither connected to the document nor
    /// inside `root`; with `force`, remove all of them. Returns how many
    /// listeners were removed.
    pub fn sweep(&mut self, dom: &mut Dom, root: Option<NodeId>, force: bool) -> usize {
        let mut removed = 0;
        self.entries.retain(|(node, list)| {
            let live = dom.is_connected(*node) || root.is_some_and(|r| dom.contains(r, *node));
            if live && !force {
                return true;
            }
            for (event, id) in list.iter() {
                if dom.remove_event_listener(*node, event, *id) {
                    removed += 1;
                }
            }
            false
        });
        if removed > 0 {
            tracing::trace!(removed, force, "swept listeners");
        }
        removed
    }
}
