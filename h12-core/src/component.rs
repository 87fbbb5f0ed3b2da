//! Component instances. Generated code runs against a [`Scope`] named
//! `this`: `this.node(..)` builds elements and records bindings,
//! `this.component(..)` nests child instances, and [`Scope::set`] patches
//! every location bound to a key.

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use h12_dom::{Document, Event, Listener, NodeId};

use crate::binding::{Applied, BindingTable, parse_key, text_of};
use crate::listeners::ListenerRegistry;
use crate::version::check_transform_version;
use crate::{Args, Attr, AttrValue, Child, Handler, Relay, RuntimeError, Value};

/// Attribute whose elements are collected into [`Scope::element`].
pub const IDENTITY_ATTR: &str = "id";

/// Attribute prefix that turns a handler value into an event listener.
pub const HANDLER_PREFIX: &str = "on";

/// A UI component. `render` usually returns a single generated call; `main`
/// seeds initial values through `this.set(..)`.
pub trait Component: 'static {
    fn render(&self, this: &Scope) -> anyhow::Result<NodeId> {
        Ok(this.node("div", vec![], vec![], &[], ""))
    }

    fn main(&self, this: &Scope, args: &Args) -> anyhow::Result<()> {
        let _ = (this, args);
        Ok(())
    }

    /// Context handed down to children. Merged over the parent's relay.
    fn relay(&self) -> Option<Relay> {
        None
    }

    /// Transform version the component's generated code came from.
    fn transform_version(&self) -> Option<&'static str> {
        None
    }
}

type Built = (Rc<dyn Component>, Rc<dyn Any>);

/// How to make a fresh component, as passed to [`Scope::component`].
#[derive(Clone, Default)]
pub struct Ctor(Option<Rc<dyn Fn() -> Built>>);

impl Ctor {
    pub fn new<C: Component, F: Fn() -> C + 'static>(make: F) -> Self {
        Ctor(Some(Rc::new(move || {
            let made = Rc::new(make());
            (made.clone() as Rc<dyn Component>, made as Rc<dyn Any>)
        })))
    }

    /// A constructor that builds nothing.
    pub fn none() -> Self {
        Ctor(None)
    }

    pub fn is_none(&self) -> bool {
        self.0.is_none()
    }

    fn build(&self) -> Option<Built> {
        self.0.as_ref().map(|make| make())
    }
}

impl fmt::Debug for Ctor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(if self.is_none() { "Ctor(none)" } else { "Ctor(..)" })
    }
}

pub trait IntoCtor {
    fn into_ctor(self) -> Ctor;
}

impl IntoCtor for Ctor {
    fn into_ctor(self) -> Ctor {
        self
    }
}

impl<C: Component, F: Fn() -> C + 'static> IntoCtor for F {
    fn into_ctor(self) -> Ctor {
        Ctor::new(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Unrendered,
    Rendered,
    Destroyed,
}

struct Instance {
    doc: Document,
    component: Rc<dyn Component>,
    state: Rc<dyn Any>,
    inner: RefCell<Inner>,
}

struct Inner {
    id: String,
    lifecycle: Lifecycle,
    parent: Weak<Instance>,
    children: Vec<(String, Scope)>,
    root: Option<NodeId>,
    bindings: BindingTable,
    elements: HashMap<String, NodeId>,
    listeners: ListenerRegistry,
    args: Args,
    relay: Option<Relay>,
}

/// Shared handle to one component instance.
///
/// The instance owns its children through the keyed child map; children
/// point back at it weakly. No `RefCell` borrow is held while user code
/// (`render`, `main`, computed values, handlers) runs.
#[derive(Clone)]
pub struct Scope(Rc<Instance>);

impl Scope {
    pub fn new<C: Component>(doc: &Document, component: C) -> Scope {
        Self::with_args(doc, component, Args::new())
    }

    pub fn with_args<C: Component>(doc: &Document, component: C, args: Args) -> Scope {
        let made = Rc::new(component);
        let relay = made.relay();
        Self::from_parts(doc, made.clone(), made, args, relay)
    }

    fn from_parts(
        doc: &Document,
        component: Rc<dyn Component>,
        state: Rc<dyn Any>,
        args: Args,
        relay: Option<Relay>,
    ) -> Scope {
        let id = doc.dom_mut().next_token();
        Scope(Rc::new(Instance {
            doc: doc.clone(),
            component,
            state,
            inner: RefCell::new(Inner {
                id,
                lifecycle: Lifecycle::Unrendered,
                parent: Weak::new(),
                children: Vec::new(),
                root: None,
                bindings: BindingTable::default(),
                elements: HashMap::new(),
                listeners: ListenerRegistry::default(),
                args,
                relay,
            }),
        }))
    }

    pub fn id(&self) -> String {
        self.0.inner.borrow().id.clone()
    }

    pub fn document(&self) -> &Document {
        &self.0.doc
    }

    pub fn root(&self) -> Option<NodeId> {
        self.0.inner.borrow().root
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.0.inner.borrow().lifecycle
    }

    pub fn parent(&self) -> Option<Scope> {
        self.0.inner.borrow().parent.upgrade().map(Scope)
    }

    pub fn child(&self, id: &str) -> Option<Scope> {
        self.0
            .inner
            .borrow()
            .children
            .iter()
            .find(|(k, _)| k == id)
            .map(|(_, c)| c.clone())
    }

    pub fn children(&self) -> Vec<Scope> {
        self.0
            .inner
            .borrow()
            .children
            .iter()
            .map(|(_, c)| c.clone())
            .collect()
    }

    pub fn args(&self) -> Args {
        self.0.inner.borrow().args.clone()
    }

    pub fn relay(&self) -> Option<Relay> {
        self.0.inner.borrow().relay.clone()
    }

    /// Element rendered with `id="name"`.
    pub fn element(&self, name: &str) -> Option<NodeId> {
        self.0.inner.borrow().elements.get(name).copied()
    }

    /// The user component behind this instance.
    pub fn state<T: Any>(&self) -> Option<Rc<T>> {
        self.0.state.clone().downcast::<T>().ok()
    }

    pub fn ptr_eq(&self, other: &Scope) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Listeners currently tracked for teardown.
    pub fn listener_count(&self) -> usize {
        self.0.inner.borrow().listeners.len()
    }

    /// Bound key names, braces stripped, in registration order.
    pub fn keys(&self) -> Vec<String> {
        self.0
            .inner
            .borrow()
            .bindings
            .keys()
            .map(|k| k.trim_start_matches('{').trim_end_matches('}').to_string())
            .collect()
    }

    pub fn key(&self, name: &str) -> Option<Setter> {
        let (key, _) = parse_key(name);
        let bound = self.0.inner.borrow().bindings.get(&key).is_some();
        bound.then(|| Setter {
            scope: self.clone(),
            key,
        })
    }

    /// Render, capture identity elements, then run `main`. Failures are
    /// logged and yield `None`; nothing built by a failed attempt stays
    /// attached.
    pub fn init(&self) -> Option<NodeId> {
        match self.try_init() {
            Ok(root) => Some(root),
            Err(err) => {
                tracing::error!(id = %self.id(), error = %err, "component init failed");
                None
            }
        }
    }

    pub fn try_init(&self) -> Result<NodeId, RuntimeError> {
        match self.lifecycle() {
            Lifecycle::Unrendered => {}
            Lifecycle::Rendered => return Err(RuntimeError::AlreadyInitialized(self.id())),
            Lifecycle::Destroyed => return Err(RuntimeError::Destroyed(self.id())),
        }
        if let Some(found) = self.0.component.transform_version() {
            check_transform_version(found)?;
        }

        let component = self.0.component.clone();
        let root = match component.render(self) {
            Ok(root) => root,
            Err(err) => {
                self.rollback();
                return Err(RuntimeError::Render(err));
            }
        };
        self.0.inner.borrow_mut().root = Some(root);
        self.capture_identities(root);

        let args = self.args();
        if let Err(err) = component.main(self, &args) {
            self.rollback();
            return Err(RuntimeError::Main(err));
        }

        self.0.inner.borrow_mut().lifecycle = Lifecycle::Rendered;
        tracing::debug!(id = %self.id(), "component initialized");
        Ok(root)
    }

    fn rollback(&self) {
        let children: Vec<Scope> = self
            .0
            .inner
            .borrow_mut()
            .children
            .drain(..)
            .map(|(_, c)| c)
            .collect();
        for child in children {
            child.destroy();
        }

        let mut inner = self.0.inner.borrow_mut();
        let mut dom = self.0.doc.dom_mut();
        inner.listeners.sweep(&mut dom, None, true);
        if let Some(root) = inner.root.take() {
            dom.drop_subtree(root);
        }
        inner.bindings.clear();
        inner.elements.clear();
    }

    /// Move every element below the root that carries the identity
    /// attribute into the registry, renaming the attribute to a fresh token.
    fn capture_identities(&self, root: NodeId) {
        let mut captured = Vec::new();
        {
            let mut dom = self.0.doc.dom_mut();
            for node in dom.query_attribute_all(root, IDENTITY_ATTR) {
                let Some(name) = dom.attribute(node, IDENTITY_ATTR).map(str::to_string) else {
                    continue;
                };
                let token = dom.next_token();
                if let Err(err) = dom.set_attribute(node, IDENTITY_ATTR, &token) {
                    tracing::warn!(%err, name = %name, "could not rename identity attribute");
                    continue;
                }
                captured.push((name, node));
            }
        }
        self.0.inner.borrow_mut().elements.extend(captured);
    }

    /// Build one element. Text children equal to one of `keys` become text
    /// bindings; attributes with keys become attribute bindings.
    pub fn node(
        &self,
        tag: &str,
        children: Vec<Child>,
        attributes: Vec<(&str, Attr)>,
        keys: &[&str],
        namespace: &str,
    ) -> NodeId {
        let ns = (!namespace.is_empty()).then_some(namespace);
        let element = self.0.doc.dom_mut().create_element(tag, ns);
        for child in children {
            self.append_child(element, child, keys);
        }
        for (name, attr) in attributes {
            self.apply_attribute(element, name, &attr);
        }
        element
    }

    fn append_child(&self, element: NodeId, child: Child, keys: &[&str]) {
        match child {
            Child::Empty => {}
            Child::Text(text) => {
                let node = self.0.doc.dom_mut().create_text(&text);
                self.attach(element, node);
                if keys.contains(&text.as_str()) {
                    self.0
                        .inner
                        .borrow_mut()
                        .bindings
                        .bind_text(&text, node, element);
                }
            }
            Child::Node(node) => self.attach(element, node),
            Child::Nodes(nodes) => {
                for node in nodes {
                    self.attach(element, node);
                }
            }
            Child::Computed(f) => {
                let produced = f(self);
                self.append_child(element, produced, &[]);
            }
        }
    }

    fn attach(&self, parent: NodeId, node: NodeId) {
        if let Err(err) = self.0.doc.dom_mut().append_child(parent, node) {
            tracing::warn!(%err, "could not append child node");
        }
    }

    fn apply_attribute(&self, element: NodeId, name: &str, attr: &Attr) {
        if let AttrValue::Text(template) = attr.value() {
            let mut inner = self.0.inner.borrow_mut();
            for key in attr.keys() {
                let (key, _) = parse_key(key);
                inner.bindings.bind_attribute(&key, element, name, template);
            }
        }

        match attr.value() {
            AttrValue::Text(value) => self.write_attribute(element, name, value),
            AttrValue::Computed(f) => {
                let value = f(self);
                self.write_attribute(element, name, &value);
            }
            AttrValue::Handler(handler) => match name.strip_prefix(HANDLER_PREFIX) {
                Some(event) if !event.is_empty() => self.listen(element, event, handler.clone()),
                _ => tracing::warn!(attribute = name, "handler on a non-event attribute ignored"),
            },
        }
    }

    fn write_attribute(&self, element: NodeId, name: &str, value: &str) {
        if let Err(err) = self.0.doc.dom_mut().set_attribute(element, name, value) {
            tracing::warn!(%err, attribute = name, "could not set attribute");
        }
    }

    fn listen(&self, element: NodeId, event: &str, handler: Handler) {
        let owner = Rc::downgrade(&self.0);
        let listener: Listener = Rc::new(move |e: &Event| {
            if let Some(instance) = owner.upgrade() {
                handler.call(&Scope(instance), e);
            }
        });
        let added = self
            .0
            .doc
            .dom_mut()
            .add_event_listener(element, event, listener);
        match added {
            Ok(id) => self
                .0
                .inner
                .borrow_mut()
                .listeners
                .register(element, event, id),
            Err(err) => tracing::warn!(%err, event, "could not add listener"),
        }
    }

    /// Create, register and initialize a child component. Returns the
    /// child's root, or `None` when `ctor` builds nothing or init fails.
    pub fn component(
        &self,
        ctor: impl IntoCtor,
        children: Vec<Child>,
        args: Vec<(&str, Value)>,
    ) -> Option<NodeId> {
        let Some((component, state)) = ctor.into_ctor().build() else {
            tracing::trace!("component without constructor skipped");
            return None;
        };

        let mut args: Args = args.into_iter().collect();
        if let Some(first) = children.into_iter().next() {
            args.insert("child", first.into_value());
        }
        let relay = match (self.relay(), component.relay()) {
            (Some(inherited), Some(own)) => Some(inherited.merged(&own)),
            (None, own) => own,
            (inherited, None) => inherited,
        };
        let requested_id = args.text("id").map(str::to_string);

        let child = Scope::from_parts(&self.0.doc, component, state, args, relay);
        {
            let mut inner = child.0.inner.borrow_mut();
            if let Some(id) = requested_id {
                inner.id = id;
            }
            inner.parent = Rc::downgrade(&self.0);
        }
        self.adopt(&child);
        child.init()
    }

    fn adopt(&self, child: &Scope) {
        let id = child.id();
        if let Some(previous) = self.child(&id) {
            tracing::warn!(id = %id, "child id already registered, destroying the previous instance");
            previous.destroy();
        }
        self.0.inner.borrow_mut().children.push((id, child.clone()));
    }

    /// Write `value` to every location bound to `key` (`name`, `{name}`,
    /// `{name}++` to append, `++{name}` to prepend). Unknown keys are
    /// ignored.
    pub fn set(&self, key: &str, value: impl Into<Value>) {
        let value = value.into();
        let (key, position) = parse_key(key);
        if self.lifecycle() == Lifecycle::Destroyed {
            tracing::trace!(key = %key, "set on destroyed component ignored");
            return;
        }
        let Some(count) = self.0.inner.borrow().bindings.location_count(&key) else {
            tracing::trace!(key = %key, "set on unbound key ignored");
            return;
        };

        let mut replaced = false;
        let mut committed = None;
        for index in 0..count {
            let resolved = value.resolve(self);
            let mut inner = self.0.inner.borrow_mut();
            let mut dom = self.0.doc.dom_mut();
            let applied = inner
                .bindings
                .apply(&mut dom, &key, index, &resolved, position);
            replaced |= applied == Applied::Replaced;
            if let Some(text) = text_of(&resolved) {
                committed = Some(text);
            }
        }
        tracing::trace!(key = %key, locations = count, ?position, "set");

        let mut inner = self.0.inner.borrow_mut();
        if let Some(text) = committed {
            inner.bindings.commit(&key, &text);
        }
        if replaced {
            let root = inner.root;
            let mut dom = self.0.doc.dom_mut();
            inner.listeners.sweep(&mut dom, root, false);
        }
    }

    /// Tear down: drop every listener, destroy children, leave the parent's
    /// child map and free the rendered subtree. Safe to call more than once.
    pub fn destroy(&self) {
        let (root, parent) = {
            let mut inner = self.0.inner.borrow_mut();
            if inner.lifecycle == Lifecycle::Destroyed {
                return;
            }
            inner.lifecycle = Lifecycle::Destroyed;
            let root = inner.root;
            let mut dom = self.0.doc.dom_mut();
            inner.listeners.sweep(&mut dom, root, true);
            (root, inner.parent.clone())
        };

        let children: Vec<Scope> = self
            .0
            .inner
            .borrow_mut()
            .children
            .drain(..)
            .map(|(_, c)| c)
            .collect();
        for child in children {
            child.destroy();
        }

        if let Some(parent) = parent.upgrade() {
            parent
                .inner
                .borrow_mut()
                .children
                .retain(|(_, c)| !Rc::ptr_eq(&c.0, &self.0));
        }
        if let Some(root) = root {
            self.0.doc.dom_mut().drop_subtree(root);
        }
        tracing::debug!(id = %self.id(), "component destroyed");
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.0.inner.borrow();
        f.debug_struct("Scope")
            .field("id", &inner.id)
            .field("lifecycle", &inner.lifecycle)
            .field("root", &inner.root)
            .finish()
    }
}

/// Setter for one bound key, as returned by [`Scope::key`].
#[derive(Clone)]
pub struct Setter {
    scope: Scope,
    key: String,
}

impl Setter {
    /// The braced key, e.g. `{count}`.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn set(&self, value: impl Into<Value>) {
        self.scope.set(&self.key, value);
    }

    pub fn append(&self, value: impl Into<Value>) {
        self.scope.set(&format!("{}++", self.key), value);
    }

    pub fn prepend(&self, value: impl Into<Value>) {
        self.scope.set(&format!("++{}", self.key), value);
    }
}

impl fmt::Debug for Setter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Setter").field("key", &self.key).finish()
    }
}
