use std::cell::Cell;

use h12_core::prelude::*;

#[derive(Default)]
struct Clicker {
    hits: Cell<u32>,
}

fn hit(this: &Scope, _: &Event) {
    if let Some(clicker) = this.state::<Clicker>() {
        clicker.hits.set(clicker.hits.get() + 1);
        this.set("hits", clicker.hits.get());
    }
}

impl Component for Clicker {
    fn render(&self, this: &Scope) -> anyhow::Result<NodeId> {
        Ok(this.node(
            "div",
            vec![
                this.node(
                    "button",
                    vec!["hit".into()],
                    vec![
                        ("id", Attr::new("button", &[])),
                        ("onclick", Attr::new(handler(hit), &[])),
                    ],
                    &[],
                    "",
                )
                .into(),
                this.node("p", vec!["{hits}".into()], vec![], &["{hits}"], "").into(),
                this.node("p", vec!["{slot}".into()], vec![], &["{slot}"], "").into(),
            ],
            vec![],
            &[],
            "",
        ))
    }

    fn main(&self, this: &Scope, _args: &Args) -> anyhow::Result<()> {
        this.set("hits", 0);
        this.set("slot", "");
        Ok(())
    }
}

fn clicker() -> (Document, Scope, NodeId) {
    let doc = Document::new();
    let app = Scope::new(&doc, Clicker::default());
    let root = app.init().unwrap();
    doc.mount(root).unwrap();
    (doc, app, root)
}

fn extra_button(app: &Scope) -> NodeId {
    app.node(
        "button",
        vec!["extra".into()],
        vec![("onclick", Attr::new(handler(hit), &[]))],
        &[],
        "",
    )
}

#[test]
fn click_runs_handler_and_updates_binding() {
    let (doc, app, root) = clicker();
    let button = app.element("button").unwrap();
    assert_eq!(app.listener_count(), 1);

    assert_eq!(doc.emit(button, "click"), 1);
    assert_eq!(doc.emit(button, "click"), 1);
    assert_eq!(app.state::<Clicker>().unwrap().hits.get(), 2);
    assert_eq!(doc.text_content(root), "hit2");
}

#[test]
fn other_events_are_not_delivered() {
    let (doc, app, _root) = clicker();
    let button = app.element("button").unwrap();
    assert_eq!(doc.emit(button, "input"), 0);
    assert_eq!(app.state::<Clicker>().unwrap().hits.get(), 0);
}

#[test]
fn handler_on_plain_attribute_is_ignored() {
    struct Plain;
    impl Component for Plain {
        fn render(&self, this: &Scope) -> anyhow::Result<NodeId> {
            Ok(this.node(
                "div",
                vec![],
                vec![
                    ("title", Attr::new(handler(hit), &[])),
                    ("on", Attr::new(handler(hit), &[])),
                ],
                &[],
                "",
            ))
        }
    }

    let doc = Document::new();
    let app = Scope::new(&doc, Plain);
    let root = app.init().unwrap();
    assert_eq!(app.listener_count(), 0);
    assert_eq!(doc.dom().attribute(root, "title"), None);
    assert_eq!(doc.to_html(root), "<div></div>");
}

#[test]
fn replaced_elements_lose_their_listeners() {
    let (doc, app, _root) = clicker();
    let extra = extra_button(&app);
    assert_eq!(app.listener_count(), 2);

    app.set("slot", extra);
    assert_eq!(app.listener_count(), 2);
    assert_eq!(doc.emit(extra, "click"), 1);

    app.set("slot", "gone");
    assert_eq!(app.listener_count(), 1);
    assert_eq!(doc.dom().listener_count(extra), 0);
    assert_eq!(doc.emit(extra, "click"), 0);
}

#[test]
fn destroy_removes_every_listener() {
    let (doc, app, _root) = clicker();
    let button = app.element("button").unwrap();
    app.destroy();
    assert_eq!(app.listener_count(), 0);
    assert_eq!(doc.dom().listener_count(button), 0);
    assert_eq!(doc.emit(button, "click"), 0);
}

#[test]
fn dropped_instance_makes_handlers_inert() {
    let (doc, app, root) = clicker();
    let button = app.element("button").unwrap();
    drop(app);
    assert_eq!(doc.emit(button, "click"), 1);
    assert_eq!(doc.text_content(root), "hit0");
}

fn mark(this: &Scope, _: &Event) {
    this.set("clicked", "yes");
}

struct Leaf;

impl Component for Leaf {
    fn render(&self, this: &Scope) -> anyhow::Result<NodeId> {
        Ok(this.node(
            "button",
            vec!["{clicked}".into()],
            vec![("onclick", Attr::new(handler(mark), &[]))],
            &["{clicked}"],
            "",
        ))
    }
}

struct Tree;

impl Component for Tree {
    fn render(&self, this: &Scope) -> anyhow::Result<NodeId> {
        Ok(this.node(
            "div",
            vec![
                this.node("span", vec!["{clicked}".into()], vec![], &["{clicked}"], "").into(),
                this.component(|| Leaf, vec![], vec![("id", Value::from("leaf"))]).into(),
            ],
            vec![],
            &[],
            "",
        ))
    }
}

#[test]
fn handler_runs_with_the_instance_that_rendered_it() {
    let doc = Document::new();
    let app = Scope::new(&doc, Tree);
    let root = app.init().unwrap();
    let leaf = app.child("leaf").unwrap();
    let button = leaf.root().unwrap();

    doc.emit(button, "click");
    assert_eq!(doc.text_content(button), "yes");
    assert_eq!(doc.to_html(root), "<div><span>{clicked}</span><button>yes</button></div>");
}

#[test]
fn events_bubble_to_ancestor_listeners() {
    struct Outer;
    impl Component for Outer {
        fn render(&self, this: &Scope) -> anyhow::Result<NodeId> {
            Ok(this.node(
                "div",
                vec![
                    this.node("i", vec!["inner".into()], vec![("id", Attr::new("inner", &[]))], &[], "")
                        .into(),
                    this.node("b", vec!["{clicked}".into()], vec![], &["{clicked}"], "").into(),
                ],
                vec![("onclick", Attr::new(handler(mark), &[]))],
                &[],
                "",
            ))
        }
    }

    let doc = Document::new();
    let app = Scope::new(&doc, Outer);
    let root = app.init().unwrap();
    let inner = app.element("inner").unwrap();
    assert_eq!(doc.emit(inner, "click"), 1);
    assert_eq!(doc.text_content(root), "inneryes");
}

fn pick_up(this: &Scope, _: &Event) {
    if let Some(parent) = this.parent() {
        parent.set("picked", "yes");
    }
}

/// Wires a handler received through its args onto its own button.
struct Picker;

impl Component for Picker {
    fn render(&self, this: &Scope) -> anyhow::Result<NodeId> {
        let on_pick = this.args().get("onpick").and_then(Value::as_handler).cloned();
        let attrs = on_pick
            .map(|h| vec![("onclick", Attr::new(h, &[]))])
            .unwrap_or_default();
        Ok(this.node("button", vec!["pick".into()], attrs, &[], ""))
    }
}

struct Chooser;

impl Component for Chooser {
    fn render(&self, this: &Scope) -> anyhow::Result<NodeId> {
        let picker = this.component(
            || Picker,
            vec![],
            vec![("id", Value::from("picker")), ("onpick", Value::from(handler(pick_up)))],
        );
        Ok(this.node(
            "div",
            vec![
                this.node("b", vec!["{picked}".into()], vec![], &["{picked}"], "").into(),
                picker.into(),
            ],
            vec![],
            &[],
            "",
        ))
    }
}

#[test]
fn handlers_passed_as_args_can_be_wired_by_the_child() {
    let doc = Document::new();
    let app = Scope::new(&doc, Chooser);
    let root = app.init().unwrap();
    let picker = app.child("picker").unwrap();
    assert!(picker.args().get("id").and_then(Value::as_handler).is_none());
    assert_eq!(picker.listener_count(), 1);

    doc.emit(picker.root().unwrap(), "click");
    assert_eq!(doc.text_content(root), "yespick");
}
