// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tests for the `understory_templatizer` crate.
//!
//! A small repeater owns the stamped instances and forwards parent property
//! changes to them, the way a list element would.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use understory_bind::{
    AnnotationNote, Behavior, BindingNote, Element, Event, Model, Node, Object, Value,
};
use understory_templatizer::{
    AnnotationParser, ParentPropForwarder, ParsedAnnotations, StampedChildren, Template,
    TemplateContent, TemplateInstance, TemplatizeError, Templatizer,
};

#[derive(Default)]
struct Repeater {
    instances: RefCell<Vec<TemplateInstance>>,
    parent_paths: RefCell<Vec<(String, Value)>>,
    instance_paths: RefCell<Vec<(String, String, Value)>>,
}

impl Repeater {
    fn add(&self, instance: &TemplateInstance) {
        self.instances.borrow_mut().push(instance.clone());
    }
}

impl ParentPropForwarder for Repeater {
    fn forward_parent_prop(&self, prop: &str, value: &Value) {
        let instances = self.instances.borrow().clone();
        for instance in &instances {
            instance.forward_parent_prop(prop, value);
        }
    }

    fn forward_parent_path(&self, path: &str, value: &Value) -> bool {
        self.parent_paths
            .borrow_mut()
            .push((path.to_string(), value.clone()));
        let instances = self.instances.borrow().clone();
        for instance in &instances {
            instance
                .element()
                .notify_path(&format!("parent.{path}"), value.clone(), true);
        }
        true
    }

    fn forward_instance_path(&self, _: &Element, root: &str, sub_path: &str, value: &Value) {
        self.instance_paths
            .borrow_mut()
            .push((root.to_string(), sub_path.to_string(), value.clone()));
    }
}

/// `<li>[[item]]</li>` with a click handler.
fn item_content() -> TemplateContent {
    TemplateContent::new(Node::fragment().with_child(Node::new("li"))).with_notes(vec![
        AnnotationNote::new(0)
            .with_binding(BindingNote::text("item"))
            .with_event("click", "onItemTap"),
    ])
}

/// Content reading `parent.title` and `parent.user.name`, each shown in a
/// span and edited through an input.
fn parent_content() -> TemplateContent {
    let fragment = Node::fragment()
        .with_child(Node::new("span"))
        .with_child(Node::new("input"))
        .with_child(Node::new("span"))
        .with_child(Node::new("input"));
    TemplateContent::new(fragment).with_notes(vec![
        AnnotationNote::new(0).with_binding(BindingNote::text("parent.title")),
        AnnotationNote::new(1).with_binding(BindingNote::property("value", "parent.title")),
        AnnotationNote::new(2).with_binding(BindingNote::text("parent.user.name")),
        AnnotationNote::new(3).with_binding(BindingNote::property("value", "parent.user.name")),
    ])
}

/// An outer element holding `template` and binding its own `title` and
/// `user` onto the template's parent properties. The template element is the
/// templatizer host.
fn outer_with(template: &Template) -> Element {
    let notes = [AnnotationNote::new(0)
        .with_binding(BindingNote::property("_parent_title", "title").one_way())
        .with_binding(BindingNote::property("_parent_user", "user").one_way())];
    let mut model = Model::new("x-app");
    model.add_annotation_effects(&notes);
    model.create_bindings();
    let outer = Element::new(Rc::new(model));
    outer.node().append_child(template.element().node().clone());
    outer.marshal_annotated_nodes(&notes);
    template.element().attach_to_host(&outer);
    outer
}

fn edit(input: &Node, value: &str) {
    input.set_property("value", Value::from(value));
    input.dispatch_event(&Event::new("value-changed", input.clone()));
}

fn child(instance: &TemplateInstance, index: usize) -> Node {
    instance.root().children()[index].clone()
}

#[test]
fn stamping_before_templatizing_fails() {
    let host = Element::new(Rc::new(Model::new("x-list")));
    let templatizer = Templatizer::new(host);
    assert_eq!(
        templatizer.stamp(None).unwrap_err(),
        TemplatizeError::NotTemplatized
    );
}

#[test]
fn model_values_are_bound_into_each_instance() {
    let host = Element::new(Rc::new(Model::new("x-list")));
    let mut templatizer = Templatizer::new(host);
    templatizer.templatize(&Template::new(item_content()));

    let first = templatizer
        .stamp(Some([("item", "one")].into_iter().collect()))
        .unwrap();
    let second = templatizer
        .stamp(Some([("item", "two")].into_iter().collect()))
        .unwrap();
    assert_eq!(child(&first, 0).text_content(), "one");
    assert_eq!(child(&second, 0).text_content(), "two");
    assert!(first.root().is_style_scoped());

    second.set("item", "three");
    assert_eq!(child(&first, 0).text_content(), "one");
    assert_eq!(child(&second, 0).text_content(), "three");
    assert_eq!(second.get("item"), Value::from("three"));
}

#[test]
fn shared_content_compiles_once() {
    let content = Rc::new(parent_content());
    let host = Element::new(Rc::new(Model::new("x-list")));
    let mut a = Templatizer::new(host.clone());
    let mut b = Templatizer::new(host);
    a.templatize(&Template::from_shared(content.clone()));
    b.templatize(&Template::from_shared(content.clone()));

    assert!(content.is_compiled());
    assert!(Rc::ptr_eq(a.archetype().unwrap(), b.archetype().unwrap()));
    assert_eq!(b.parent_props(), Some(&["title".to_string(), "user".to_string()][..]));

    let from_a = a.stamp(None).unwrap();
    let from_b = b.stamp(None).unwrap();
    for instance in [&from_a, &from_b] {
        assert_eq!(child(instance, 1).listener_count("value-changed"), 1);
    }
}

#[test]
fn parser_runs_once_and_sees_the_prep_hook() {
    struct CountingParser {
        calls: Cell<usize>,
    }
    impl AnnotationParser for CountingParser {
        fn parse_annotations(
            &self,
            content: &Node,
            prep_element: Option<&dyn Fn(&Node)>,
        ) -> ParsedAnnotations {
            self.calls.set(self.calls.get() + 1);
            let children = content.children();
            if let Some(prep) = prep_element {
                for node in &children {
                    prep(node);
                }
            }
            ParsedAnnotations {
                notes: vec![AnnotationNote::new(0).with_binding(BindingNote::text("item"))],
                parent_props: None,
            }
        }
    }

    let prepped = Rc::new(Cell::new(0));
    let mut outer_model = Model::new("x-app");
    let counter = prepped.clone();
    outer_model.set_prep_element(move |_| counter.set(counter.get() + 1));
    let outer = Element::new(Rc::new(outer_model));
    let host = Element::new(Rc::new(Model::new("x-list")));
    host.attach_to_host(&outer);

    let parser = Rc::new(CountingParser { calls: Cell::new(0) });
    let content = Rc::new(TemplateContent::new(
        Node::fragment().with_child(Node::new("li")),
    ));
    let mut first = Templatizer::new(host.clone()).with_parser(parser.clone());
    first.templatize(&Template::from_shared(content.clone()));
    let mut second = Templatizer::new(host).with_parser(parser.clone());
    second.templatize(&Template::from_shared(content.clone()));

    assert_eq!(parser.calls.get(), 1);
    assert_eq!(prepped.get(), 1);
    assert_eq!(content.notes().map(|n| n.len()), Some(1));
    assert!(first.root_data_host().unwrap().ptr_eq(&outer));

    let instance = second
        .stamp(Some([("item", "parsed")].into_iter().collect()))
        .unwrap();
    assert_eq!(child(&instance, 0).text_content(), "parsed");
}

#[test]
fn missing_content_stamps_nothing() {
    let host = Element::new(Rc::new(Model::new("x-list")));
    let mut templatizer = Templatizer::new(host);
    templatizer.templatize(&Template::without_content());
    let instance = templatizer.stamp(None).unwrap();
    assert!(instance.root().children().is_empty());
    assert!(templatizer.parent_props().is_none());
}

#[test]
fn instances_become_ready_with_their_host() {
    let readied = Rc::new(Cell::new(0));
    let counter = readied.clone();
    let content = item_content().with_behavior(Behavior::new().method("ready", move |_, _| {
        counter.set(counter.get() + 1);
        Value::Undefined
    }));
    let host = Element::new(Rc::new(Model::new("x-list")));
    let mut templatizer = Templatizer::new(host.clone());
    templatizer.templatize(&Template::new(content));

    let early = templatizer.stamp(None).unwrap();
    assert!(!early.element().is_ready());
    assert_eq!(readied.get(), 0);

    host.ready();
    assert!(early.element().is_ready());
    assert_eq!(readied.get(), 1);

    let late = templatizer.stamp(None).unwrap();
    assert!(late.element().is_ready());
    assert_eq!(readied.get(), 2);
}

#[test]
fn declarative_listeners_resolve_on_the_outer_host() {
    let taps = Rc::new(RefCell::new(Vec::new()));
    let seen = taps.clone();
    let mut outer_model = Model::new("x-app");
    outer_model.define_handler("onItemTap", move |host, event| {
        seen.borrow_mut()
            .push((host.model().name().to_string(), event.name().to_string()));
    });
    let outer = Element::new(Rc::new(outer_model));
    let host = Element::new(Rc::new(Model::new("x-list")));
    host.attach_to_host(&outer);

    let mut templatizer = Templatizer::new(host);
    templatizer.templatize(&Template::new(item_content()));
    let instance = templatizer.stamp(None).unwrap();
    assert!(instance.element().root_data_host().unwrap().ptr_eq(&outer));

    let li = child(&instance, 0);
    li.dispatch_event(&Event::new("click", li.clone()));
    assert_eq!(
        *taps.borrow(),
        [("x-app".to_string(), "click".to_string())]
    );
}

#[test]
fn parent_properties_flow_into_instances() {
    let template = Template::new(parent_content());
    let outer = outer_with(&template);
    outer.set("title", "Before");

    let repeater = Rc::new(Repeater::default());
    let mut templatizer =
        Templatizer::new(template.element().clone()).with_forwarder(repeater.clone());
    templatizer.templatize(&template);

    let instance = templatizer.stamp(None).unwrap();
    repeater.add(&instance);
    assert_eq!(child(&instance, 0).text_content(), "Before");
    assert_eq!(instance.get("parent.title"), Value::from("Before"));

    outer.set("title", "After");
    assert_eq!(template.element().get("_parent_title"), Value::from("After"));
    assert_eq!(child(&instance, 0).text_content(), "After");
    assert_eq!(child(&instance, 1).property("value"), Value::from("After"));
}

#[test]
fn instance_edits_reach_the_outer_host() {
    let template = Template::new(parent_content());
    let outer = outer_with(&template);
    let user: Object = [("name", "Ada")].into_iter().collect();
    outer.set("title", "Hello");
    outer.set("user", user.clone());

    let repeater = Rc::new(Repeater::default());
    let mut templatizer =
        Templatizer::new(template.element().clone()).with_forwarder(repeater.clone());
    templatizer.templatize(&template);
    let first = templatizer.stamp(None).unwrap();
    let second = templatizer.stamp(None).unwrap();
    repeater.add(&first);
    repeater.add(&second);
    assert_eq!(child(&first, 2).text_content(), "Ada");

    edit(&child(&first, 1), "Edited");
    assert_eq!(outer.get("title"), Value::from("Edited"));
    assert_eq!(child(&first, 0).text_content(), "Edited");
    assert_eq!(child(&second, 0).text_content(), "Edited");

    edit(&child(&first, 3), "Grace");
    assert_eq!(user.get("name"), Value::from("Grace"));
    assert_eq!(
        *repeater.parent_paths.borrow(),
        [("user.name".to_string(), Value::from("Grace"))]
    );
    assert_eq!(child(&second, 2).text_content(), "Grace");
}

#[test]
fn outer_sub_path_changes_reach_instances() {
    let template = Template::new(parent_content());
    let outer = outer_with(&template);
    let user: Object = [("name", "Ada")].into_iter().collect();
    outer.set("user", user.clone());

    let repeater = Rc::new(Repeater::default());
    let mut templatizer =
        Templatizer::new(template.element().clone()).with_forwarder(repeater.clone());
    templatizer.templatize(&template);
    let instance = templatizer.stamp(None).unwrap();
    repeater.add(&instance);

    user.set("name", "Lin");
    outer.notify_path("user.name", "Lin", false);
    assert_eq!(child(&instance, 2).text_content(), "Lin");
    assert_eq!(child(&instance, 3).property("value"), Value::from("Lin"));
}

#[test]
fn instance_paths_are_offered_to_the_forwarder() {
    let host = Element::new(Rc::new(Model::new("x-list")));
    let repeater = Rc::new(Repeater::default());
    let mut templatizer = Templatizer::new(host).with_forwarder(repeater.clone());
    templatizer.templatize(&Template::new(item_content()));
    let item: Object = [("label", "a")].into_iter().collect();
    let model: Object = [("item", item.clone())].into_iter().collect();
    let instance = templatizer.stamp(Some(model)).unwrap();

    item.set("label", "b");
    instance.element().notify_path("item.label", "b", false);
    assert_eq!(
        *repeater.instance_paths.borrow(),
        [("item".to_string(), "label".to_string(), Value::from("b"))]
    );

    instance.set("item", "plain");
    assert_eq!(repeater.instance_paths.borrow().len(), 1);
}

#[test]
fn stamped_children_include_nested_hosts() {
    struct Rows {
        nodes: Vec<Node>,
        inner: Option<(Node, Rc<Rows>)>,
    }
    impl StampedChildren for Rows {
        fn stamped_children(&self) -> Vec<Node> {
            self.nodes.clone()
        }
        fn nested(&self, child: &Node) -> Option<Rc<dyn StampedChildren>> {
            let (host, rows) = self.inner.as_ref()?;
            host.ptr_eq(child).then(|| rows.clone() as Rc<dyn StampedChildren>)
        }
    }

    let (a, sub, b) = (Node::new("a"), Node::new("x-sub"), Node::new("b"));
    let (c, d) = (Node::new("c"), Node::new("d"));
    let inner = Rc::new(Rows {
        nodes: vec![c.clone(), d.clone()],
        inner: None,
    });
    let outer = Rows {
        nodes: vec![a.clone(), sub.clone(), b.clone()],
        inner: Some((sub.clone(), inner)),
    };

    let all = Templatizer::all_stamped_children(&outer);
    let names: Vec<_> = all.iter().map(|n| n.name().to_string()).collect();
    assert_eq!(names, ["a", "x-sub", "c", "d", "b"]);
    assert!(all[2].ptr_eq(&c));
}
