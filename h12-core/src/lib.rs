//! Runtime half of h12: component instances that execute generated
//! construction calls against an `h12_dom::Document` and keep keyed
//! bindings in sync, plus a small event dispatcher.

pub mod binding;
pub mod component;
pub mod dispatcher;
pub mod error;
pub mod listeners;
pub mod value;
pub mod version;

pub use component::{Component, Ctor, HANDLER_PREFIX, IDENTITY_ATTR, IntoCtor, Lifecycle, Scope, Setter};
pub use dispatcher::Dispatcher;
pub use error::RuntimeError;
pub use value::{Args, Attr, AttrValue, Child, Handler, Relay, Value, ValueMap, handler};
pub use version::{RUNTIME_VERSION, check_transform_version};

/// Everything generated code and component impls refer to unqualified.
pub mod prelude {
    pub use crate::{
        Args, Attr, AttrValue, Child, Component, Ctor, Handler, Relay, Scope, Value, ValueMap,
        handler,
    };
    pub use h12_dom::{Document, Event, NodeId};
}
