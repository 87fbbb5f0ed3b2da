// h12-core/src/dispatcher.rs

use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Handle returned by [`Dispatcher::on`] / [`Dispatcher::once`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct Entry<A> {
    id: ListenerId,
    once: bool,
    listener: Rc<dyn Fn(&A)>,
}

impl<A> Clone for Entry<A> {
    fn clone(&self) -> Self {
        Entry {
            id: self.id,
            once: self.once,
            listener: self.listener.clone(),
        }
    }
}

/// Synchronous named-event pub/sub.
///
/// `emit` runs the listeners registered when it started, in subscription
/// order: one added during the emit waits for the next emit, one removed
/// during the emit still runs this time.
pub struct Dispatcher<A> {
    events: RefCell<Vec<(String, Vec<Entry<A>>)>>,
    next_id: Cell<u64>,
}

impl<A> Default for Dispatcher<A> {
    fn default() -> Self {
        Self {
            events: RefCell::new(Vec::new()),
            next_id: Cell::new(0),
        }
    }
}

impl<A> Dispatcher<A> {
    pub fn new() -> Self {
        Self::default()
    }

    fn subscribe(&self, event: &str, once: bool, listener: Rc<dyn Fn(&A)>) -> ListenerId {
        let id = ListenerId(self.next_id.get() + 1);
        self.next_id.set(id.0);
        let entry = Entry { id, once, listener };

        let mut events = self.events.borrow_mut();
        match events.iter_mut().find(|(name, _)| name == event) {
            Some((_, list)) => list.push(entry),
            None => events.push((event.to_string(), vec![entry])),
        }
        id
    }

    pub fn on(&self, event: &str, listener: impl Fn(&A) + 'static) -> ListenerId {
        self.subscribe(event, false, Rc::new(listener))
    }

    /// Like [`Dispatcher::on`], but the listener removes itself before its
    /// first call.
    pub fn once(&self, event: &str, listener: impl Fn(&A) + 'static) -> ListenerId {
        self.subscribe(event, true, Rc::new(listener))
    }

    /// Remove exactly one listener. Returns whether it was registered.
    pub fn off(&self, event: &str, id: ListenerId) -> bool {
        let mut events = self.events.borrow_mut();
        let Some((_, list)) = events.iter_mut().find(|(name, _)| name == event) else {
            return false;
        };
        let before = list.len();
        list.retain(|e| e.id != id);
        before != list.len()
    }

    /// Invoke every listener of `event` with `arg`. Returns how many ran.
    pub fn emit(&self, event: &str, arg: &A) -> usize {
        let snapshot: Vec<Entry<A>> = self
            .events
            .borrow()
            .iter()
            .find(|(name, _)| name == event)
            .map(|(_, list)| list.clone())
            .unwrap_or_default();

        for entry in &snapshot {
            if entry.once {
                self.off(event, entry.id);
            }
            (entry.listener)(arg);
        }
        tracing::trace!(event, invoked = snapshot.len(), "emitted");
        snapshot.len()
    }

    /// Drop all listeners of one event.
    pub fn clear(&self, event: &str) {
        self.events.borrow_mut().retain(|(name, _)| name != event);
    }

    pub fn clear_all(&self) {
        self.events.borrow_mut().clear();
    }

    pub fn listener_count(&self, event: &str) -> usize {
        self.events
            .borrow()
            .iter()
            .find(|(name, _)| name == event)
            .map_or(0, |(_, list)| list.len())
    }
}
