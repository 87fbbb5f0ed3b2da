//! Values flowing from generated code into the runtime: node children,
//! attribute values, component arguments and `set()` payloads.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use h12_dom::{Event, NodeId};

use crate::Scope;

/// Event callback installed through an `on*` attribute. It runs with the
/// instance that rendered the element.
#[derive(Clone)]
pub struct Handler(Rc<dyn Fn(&Scope, &Event)>);

impl Handler {
    pub fn call(&self, this: &Scope, event: &Event) {
        (self.0)(this, event)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Handler(..)")
    }
}

/// Wrap a closure or `fn(&Scope, &Event)` as an event handler.
pub fn handler(f: impl Fn(&Scope, &Event) + 'static) -> Handler {
    Handler(Rc::new(f))
}

/// A dynamically typed value: component arguments, relay entries and the
/// payload of [`Scope::set`].
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Empty,
    Text(String),
    Node(NodeId),
    Handler(Handler),
    /// Produces the real value when it is used.
    Computed(Rc<dyn Fn(&Scope) -> Value>),
    /// Anything else; read back with [`Value::downcast`].
    Data(Rc<dyn Any>),
}

impl Value {
    pub fn data<T: Any>(value: T) -> Self {
        Value::Data(Rc::new(value))
    }

    pub fn computed(f: impl Fn(&Scope) -> Value + 'static) -> Self {
        Value::Computed(Rc::new(f))
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_node(&self) -> Option<NodeId> {
        match self {
            Value::Node(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_handler(&self) -> Option<&Handler> {
        match self {
            Value::Handler(h) => Some(h),
            _ => None,
        }
    }

    pub fn downcast<T: Any>(&self) -> Option<Rc<T>> {
        match self {
            Value::Data(d) => d.clone().downcast::<T>().ok(),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Value::Empty)
    }

    /// Evaluate computed values against `this`.
    pub(crate) fn resolve(&self, this: &Scope) -> Value {
        match self {
            Value::Computed(f) => f(this).resolve(this),
            other => other.clone(),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Empty => f.write_str("Empty"),
            Value::Text(s) => f.debug_tuple("Text").field(s).finish(),
            Value::Node(n) => f.debug_tuple("Node").field(n).finish(),
            Value::Handler(h) => h.fmt(f),
            Value::Computed(_) => f.write_str("Computed(..)"),
            Value::Data(_) => f.write_str("Data(..)"),
        }
    }
}

/// One entry of a node's children list.
#[derive(Clone, Default)]
pub enum Child {
    #[default]
    Empty,
    /// Becomes a text node; bound when it equals one of the node's keys.
    Text(String),
    Node(NodeId),
    Nodes(Vec<NodeId>),
    /// Called with the instance while the node is built.
    Computed(Rc<dyn Fn(&Scope) -> Child>),
}

impl Child {
    pub fn computed(f: impl Fn(&Scope) -> Child + 'static) -> Self {
        Child::Computed(Rc::new(f))
    }

    /// Form used for the implicit `child` argument of a component.
    pub(crate) fn into_value(self) -> Value {
        match self {
            Child::Empty => Value::Empty,
            Child::Text(s) => Value::Text(s),
            Child::Node(n) => Value::Node(n),
            Child::Nodes(v) => Value::data(v),
            Child::Computed(f) => Value::Computed(Rc::new(move |this: &Scope| {
                f(this).into_value()
            })),
        }
    }
}

impl fmt::Debug for Child {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Child::Empty => f.write_str("Empty"),
            Child::Text(s) => f.debug_tuple("Text").field(s).finish(),
            Child::Node(n) => f.debug_tuple("Node").field(n).finish(),
            Child::Nodes(v) => f.debug_tuple("Nodes").field(v).finish(),
            Child::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

/// Value half of a node attribute.
#[derive(Clone)]
pub enum AttrValue {
    Text(String),
    /// Registered as a listener when the attribute name starts with `on`.
    Handler(Handler),
    /// Called once while the node is built; the result is the attribute.
    Computed(Rc<dyn Fn(&Scope) -> String>),
}

impl AttrValue {
    pub fn computed(f: impl Fn(&Scope) -> String + 'static) -> Self {
        AttrValue::Computed(Rc::new(f))
    }
}

impl fmt::Debug for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Text(s) => f.debug_tuple("Text").field(s).finish(),
            AttrValue::Handler(h) => h.fmt(f),
            AttrValue::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

/// An attribute as emitted by the transform: its value plus the bare keys
/// (`{name}`) its text depends on.
#[derive(Debug, Clone)]
pub struct Attr {
    value: AttrValue,
    keys: Vec<String>,
}

impl Attr {
    pub fn new(value: impl Into<AttrValue>, keys: &[&str]) -> Self {
        Self {
            value: value.into(),
            keys: keys.iter().map(|k| k.to_string()).collect(),
        }
    }

    pub fn value(&self) -> &AttrValue {
        &self.value
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }
}

macro_rules! from_text {
    ($($ty:ty),* $(,)?) => {$(
        impl From<$ty> for Value {
            fn from(v: $ty) -> Self {
                Value::Text(v.to_string())
            }
        }
        impl From<$ty> for Child {
            fn from(v: $ty) -> Self {
                Child::Text(v.to_string())
            }
        }
        impl From<$ty> for AttrValue {
            fn from(v: $ty) -> Self {
                AttrValue::Text(v.to_string())
            }
        }
    )*};
}

from_text!(
    &str, String, &String, char, bool, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32,
    f64,
);

impl From<NodeId> for Value {
    fn from(n: NodeId) -> Self {
        Value::Node(n)
    }
}

impl From<Option<NodeId>> for Value {
    fn from(n: Option<NodeId>) -> Self {
        n.map_or(Value::Empty, Value::Node)
    }
}

impl From<Handler> for Value {
    fn from(h: Handler) -> Self {
        Value::Handler(h)
    }
}

impl From<NodeId> for Child {
    fn from(n: NodeId) -> Self {
        Child::Node(n)
    }
}

impl From<Option<NodeId>> for Child {
    fn from(n: Option<NodeId>) -> Self {
        n.map_or(Child::Empty, Child::Node)
    }
}

impl From<Vec<NodeId>> for Child {
    fn from(v: Vec<NodeId>) -> Self {
        Child::Nodes(v)
    }
}

impl From<Handler> for AttrValue {
    fn from(h: Handler) -> Self {
        AttrValue::Handler(h)
    }
}

/// Named values handed to a component: `args` on the way in, `relay` for
/// context shared down the tree.
#[derive(Debug, Clone, Default)]
pub struct ValueMap {
    entries: BTreeMap<String, Value>,
}

pub type Args = ValueMap;
pub type Relay = ValueMap;

impl ValueMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.get(name)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_text)
    }

    pub fn node(&self, name: &str) -> Option<NodeId> {
        self.get(name).and_then(Value::as_node)
    }

    pub fn data<T: Any>(&self, name: &str) -> Option<Rc<T>> {
        self.get(name).and_then(Value::downcast)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.entries.insert(name.into(), value.into())
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// `self` overlaid with `over`; entries of `over` win.
    pub fn merged(&self, over: &ValueMap) -> ValueMap {
        let mut entries = self.entries.clone();
        entries.extend(over.entries.iter().map(|(k, v)| (k.clone(), v.clone())));
        ValueMap { entries }
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for ValueMap {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        ValueMap {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}
