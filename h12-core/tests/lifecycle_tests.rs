use std::cell::Cell;

use anyhow::{Context, bail};
use h12_core::prelude::*;
use h12_core::{Lifecycle, RuntimeError};

#[derive(Default)]
struct Counter {
    count: Cell<i32>,
}

impl Component for Counter {
    fn render(&self, this: &Scope) -> anyhow::Result<NodeId> {
        Ok(this.node("span", vec!["{count}".into()], vec![], &["{count}"], ""))
    }

    fn main(&self, this: &Scope, args: &Args) -> anyhow::Result<()> {
        let start: i32 = args.text("start").unwrap_or("0").parse()?;
        self.count.set(start);
        this.set("count", start);
        Ok(())
    }
}

/// Renders one counter per entry of `ids`; `None` lets the runtime pick.
struct Board {
    ids: Vec<Option<&'static str>>,
}

impl Component for Board {
    fn render(&self, this: &Scope) -> anyhow::Result<NodeId> {
        let children: Vec<Child> = self
            .ids
            .iter()
            .map(|id| {
                let args = match id {
                    Some(id) => vec![("id", Value::from(*id))],
                    None => vec![],
                };
                Child::from(this.component(Counter::default, vec![], args))
            })
            .collect();
        Ok(this.node("section", children, vec![], &[], ""))
    }
}

fn board(ids: Vec<Option<&'static str>>) -> (Document, Scope, NodeId) {
    let doc = Document::new();
    let app = Scope::new(&doc, Board { ids });
    let root = app.init().expect("init");
    doc.mount(root).unwrap();
    (doc, app, root)
}

#[test]
fn children_are_registered_by_id() {
    let (doc, app, root) = board(vec![Some("first"), None]);
    assert_eq!(app.children().len(), 2);

    let first = app.child("first").expect("registered under its id");
    assert!(first.parent().unwrap().ptr_eq(&app));
    assert_eq!(doc.text_content(root), "00");
}

#[test]
fn destroy_detaches_and_unregisters() {
    let (doc, app, root) = board(vec![Some("first"), Some("second")]);
    let first = app.child("first").unwrap();
    let first_root = first.root().unwrap();

    first.destroy();
    assert_eq!(first.lifecycle(), Lifecycle::Destroyed);
    assert!(app.child("first").is_none());
    assert!(!doc.dom().exists(first_root));
    assert_eq!(app.children().len(), 1);
    assert!(doc.dom().contains(root, app.child("second").unwrap().root().unwrap()));

    first.destroy();
    assert!(app.child("first").is_none());
}

#[test]
fn destroy_after_manual_detach_is_fine() {
    let (doc, app, _root) = board(vec![Some("only")]);
    let only = app.child("only").unwrap();
    doc.dom_mut().remove(only.root().unwrap());
    only.destroy();
    assert!(app.children().is_empty());
}

#[test]
fn destroy_is_recursive() {
    let (doc, app, root) = board(vec![Some("a"), Some("b")]);
    let a = app.child("a").unwrap();
    app.destroy();
    assert_eq!(a.lifecycle(), Lifecycle::Destroyed);
    assert!(app.children().is_empty());
    assert!(!doc.dom().is_connected(root));
}

#[test]
fn set_after_destroy_does_nothing() {
    let (doc, app, _root) = board(vec![Some("c")]);
    let c = app.child("c").unwrap();
    c.destroy();
    let live = doc.dom().len();
    c.set("count", 9);
    assert_eq!(doc.dom().len(), live);
    assert!(c.keys().is_empty());
}

#[test]
fn duplicate_id_replaces_previous_child() {
    let (doc, app, root) = board(vec![Some("dup"), Some("dup")]);
    assert_eq!(app.children().len(), 1);
    let kept = app.child("dup").unwrap();
    assert_eq!(kept.lifecycle(), Lifecycle::Rendered);
    assert_eq!(doc.dom().children(root), &[kept.root().unwrap()]);
}

#[test]
fn repeated_mount_and_destroy_reuses_nodes() {
    let doc = Document::new();
    for _ in 0..1000 {
        let app = Scope::new(
            &doc,
            Board {
                ids: vec![Some("a"), None],
            },
        );
        let root = app.init().unwrap();
        doc.mount(root).unwrap();
        app.destroy();
        assert!(!doc.dom().exists(root));
    }
    assert_eq!(doc.dom().len(), 1);
    assert!(doc.dom().capacity() <= 6);
}

/// Renders its markup through the parent's scope, so the parent owns the
/// bindings.
struct Lifted;

impl Component for Lifted {
    fn render(&self, this: &Scope) -> anyhow::Result<NodeId> {
        let parent = this.parent().context("lifted markup needs a parent")?;
        Ok(this.node(
            "div",
            vec![parent.node("span", vec!["{k}".into()], vec![], &["{k}"], "").into()],
            vec![],
            &[],
            "",
        ))
    }
}

struct Holder;

impl Component for Holder {
    fn render(&self, this: &Scope) -> anyhow::Result<NodeId> {
        let lifted = this.component(|| Lifted, vec![], vec![("id", Value::from("lifted"))]);
        Ok(this.node("section", vec![lifted.into()], vec![], &[], ""))
    }
}

#[test]
fn scope_override_binds_to_the_ancestor() {
    let doc = Document::new();
    let holder = Scope::new(&doc, Holder);
    let root = holder.init().unwrap();
    let lifted = holder.child("lifted").unwrap();

    assert_eq!(holder.keys(), vec!["k"]);
    assert!(lifted.keys().is_empty());

    holder.set("k", "shared");
    assert_eq!(doc.text_content(lifted.root().unwrap()), "shared");
    assert_eq!(doc.to_html(root), "<section><div><span>shared</span></div></section>");

    lifted.set("k", "ignored");
    assert_eq!(doc.text_content(root), "shared");
}

#[test]
fn args_reach_main_with_child_slot() {
    struct Host;
    impl Component for Host {
        fn render(&self, this: &Scope) -> anyhow::Result<NodeId> {
            Ok(this.node(
                "div",
                vec![
                    this.component(
                        Counter::default,
                        vec!["hello".into()],
                        vec![("id", Value::from("c")), ("start", Value::from(5))],
                    )
                    .into(),
                ],
                vec![],
                &[],
                "",
            ))
        }
    }

    let doc = Document::new();
    let host = Scope::new(&doc, Host);
    let root = host.init().unwrap();
    let c = host.child("c").unwrap();
    assert_eq!(c.args().text("child"), Some("hello"));
    assert_eq!(c.args().text("start"), Some("5"));
    assert_eq!(c.state::<Counter>().unwrap().count.get(), 5);
    assert!(c.state::<Host>().is_none());
    assert_eq!(doc.text_content(root), "5");
}

#[test]
fn missing_constructor_is_a_no_op() {
    struct Empty;
    impl Component for Empty {
        fn render(&self, this: &Scope) -> anyhow::Result<NodeId> {
            let nothing = this.component(Ctor::none(), vec![], vec![]);
            assert!(nothing.is_none());
            Ok(this.node("div", vec![nothing.into()], vec![], &[], ""))
        }
    }

    let doc = Document::new();
    let app = Scope::new(&doc, Empty);
    let root = app.init().unwrap();
    assert!(app.children().is_empty());
    assert_eq!(doc.to_html(root), "<div></div>");
}

struct Themed {
    relay: Option<Relay>,
    leaf: bool,
}

impl Component for Themed {
    fn relay(&self) -> Option<Relay> {
        self.relay.clone()
    }

    fn render(&self, this: &Scope) -> anyhow::Result<NodeId> {
        if self.leaf {
            return Ok(this.node("span", vec![], vec![], &[], ""));
        }
        let plain = this.component(
            || Themed {
                relay: None,
                leaf: true,
            },
            vec![],
            vec![("id", Value::from("plain"))],
        );
        let own = this.component(
            || Themed {
                relay: Some(Relay::new().with("theme", "light")),
                leaf: true,
            },
            vec![],
            vec![("id", Value::from("own"))],
        );
        Ok(this.node("div", vec![plain.into(), own.into()], vec![], &[], ""))
    }
}

#[test]
fn relay_is_inherited_or_merged() {
    let doc = Document::new();
    let app = Scope::new(
        &doc,
        Themed {
            relay: Some(Relay::new().with("theme", "dark").with("lang", "en")),
            leaf: false,
        },
    );
    app.init().unwrap();

    let plain = app.child("plain").unwrap().relay().unwrap();
    assert_eq!(plain.text("theme"), Some("dark"));
    assert_eq!(plain.text("lang"), Some("en"));

    let own = app.child("own").unwrap().relay().unwrap();
    assert_eq!(own.text("theme"), Some("light"));
    assert_eq!(own.text("lang"), Some("en"));
}

struct Broken {
    fail_in_main: bool,
}

impl Component for Broken {
    fn render(&self, this: &Scope) -> anyhow::Result<NodeId> {
        if !self.fail_in_main {
            bail!("render exploded");
        }
        let child = this.component(Counter::default, vec![], vec![("id", Value::from("inner"))]);
        Ok(this.node("div", vec![child.into()], vec![], &[], ""))
    }

    fn main(&self, _this: &Scope, _args: &Args) -> anyhow::Result<()> {
        bail!("main exploded")
    }
}

#[test]
fn failed_render_yields_nothing() {
    let doc = Document::new();
    let app = Scope::new(&doc, Broken { fail_in_main: false });
    assert!(app.init().is_none());
    assert!(app.root().is_none());
    assert_eq!(app.lifecycle(), Lifecycle::Unrendered);
}

#[test]
fn failed_main_rolls_back_render() {
    let doc = Document::new();
    let app = Scope::new(&doc, Broken { fail_in_main: true });
    let err = app.try_init().unwrap_err();
    assert!(matches!(err, RuntimeError::Main(_)));
    assert!(err.to_string().contains("main exploded"));
    assert!(app.root().is_none());
    assert!(app.children().is_empty());
}

#[test]
fn failing_child_does_not_stop_siblings() {
    struct Parent;
    impl Component for Parent {
        fn render(&self, this: &Scope) -> anyhow::Result<NodeId> {
            let bad = this.component(|| Broken { fail_in_main: false }, vec![], vec![]);
            let good = this.component(Counter::default, vec![], vec![("id", Value::from("good"))]);
            assert!(bad.is_none());
            Ok(this.node("div", vec![bad.into(), good.into()], vec![], &[], ""))
        }
    }

    let doc = Document::new();
    let app = Scope::new(&doc, Parent);
    let root = app.init().unwrap();
    assert_eq!(doc.text_content(root), "0");
    assert!(app.child("good").is_some());
}

#[test]
fn init_twice_is_rejected() {
    let doc = Document::new();
    let app = Scope::new(&doc, Counter::default());
    let root = app.init().unwrap();
    assert!(matches!(app.try_init(), Err(RuntimeError::AlreadyInitialized(_))));
    assert!(app.init().is_none());
    assert_eq!(app.root(), Some(root));
}

struct Stamped(&'static str);

impl Component for Stamped {
    fn transform_version(&self) -> Option<&'static str> {
        Some(self.0)
    }
}

#[test]
fn transform_version_is_checked() {
    let doc = Document::new();
    assert!(Scope::new(&doc, Stamped(h12_core::RUNTIME_VERSION)).init().is_some());

    let old = Scope::new(&doc, Stamped("1.4.0"));
    assert!(matches!(
        old.try_init(),
        Err(RuntimeError::VersionMismatch { .. })
    ));
    assert!(old.root().is_none());
}
