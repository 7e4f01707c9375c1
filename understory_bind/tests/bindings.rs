// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tests for the `understory_bind` crate.
//!
//! These exercise elements bound into one another: values flowing down
//! through annotation effects, changes flowing back up through change events,
//! and path notifications crossing element boundaries.

use std::cell::RefCell;
use std::rc::Rc;

use understory_bind::{
    AnnotationNote, BindingNote, EffectKind, Element, Model, Node, Object, PropertyInfo,
    Signature, Value, setup_bind_listeners,
};

/// An inner element with a notifying `value` property.
fn input_element() -> Element {
    let mut model = Model::new("x-input");
    model.declare_property(&PropertyInfo::new("value").notify());
    model.create_bindings();
    Element::new(Rc::new(model))
}

/// An outer element binding `binding` onto a single inner node.
fn host_with(binding: BindingNote, inner: &Node) -> Element {
    let mut model = Model::new("x-form");
    model.add_annotation_effects(&[AnnotationNote::new(0).with_binding(binding)]);
    model.create_bindings();
    let host = Element::new(Rc::new(model));
    host.node().append_child(inner.clone());
    host.marshal_annotated_nodes(&[AnnotationNote::new(0)]);
    setup_bind_listeners(&host);
    host
}

#[test]
fn two_way_binding_flows_both_ways() {
    let input = input_element();
    let form = host_with(BindingNote::property("value", "name"), input.node());

    form.set("name", "Ada");
    assert_eq!(input.get("value"), Value::from("Ada"));

    input.set("value", "Grace");
    assert_eq!(form.get("name"), Value::from("Grace"));
}

#[test]
fn one_way_binding_does_not_flow_back() {
    let input = input_element();
    let form = host_with(BindingNote::property("value", "name").one_way(), input.node());

    form.set("name", "Ada");
    input.set("value", "Grace");
    assert_eq!(form.get("name"), Value::from("Ada"));
}

#[test]
fn custom_event_overrides_the_change_event() {
    let input = Node::new("input");
    let form = host_with(
        BindingNote::property("value", "name").with_event("input"),
        &input,
    );
    input.set_property("value", Value::from("typed"));
    input.dispatch_event(&understory_bind::Event::new("value-changed", input.clone()));
    assert!(form.get("name").is_undefined());
    input.dispatch_event(&understory_bind::Event::new("input", input.clone()));
    assert_eq!(form.get("name"), Value::from("typed"));
}

#[test]
fn inner_path_changes_reach_the_host_path() {
    let input = input_element();
    let form = host_with(BindingNote::property("value", "person"), input.node());
    let person: Object = [("first", "Ada")].into_iter().collect();
    form.set("person", person.clone());
    assert!(input.get("value").strict_eq(&Value::from(person.clone())));

    person.set("first", "Grace");
    input.notify_path("value.first", "Grace", false);
    assert_eq!(form.get("person.first"), Value::from("Grace"));
}

#[test]
fn host_path_changes_reach_the_inner_element() {
    let input = input_element();
    let form = host_with(BindingNote::property("value", "person"), input.node());
    let person: Object = [("first", "Ada")].into_iter().collect();
    form.set("person", person.clone());

    person.set("first", "Grace");
    form.notify_path("person.first", "Grace", false);
    assert_eq!(input.get("value.first"), Value::from("Grace"));
}

#[test]
fn computed_bindings_render_once_defined() {
    let mut model = Model::new("x-greeting");
    model.add_annotation_effects(&[AnnotationNote::new(0).with_binding(
        BindingNote::text("").computed(Signature::parse("greet(salutation, name)").unwrap()),
    )]);
    model.define_method("greet", |_, args| {
        Value::from(format!(
            "{} {}",
            args[0].to_display_string(),
            args[1].to_display_string()
        ))
    });
    model.create_bindings();
    let el = Element::new(Rc::new(model));
    el.node().append_child(Node::new("p"));
    el.marshal_annotated_nodes(&[AnnotationNote::new(0)]);

    el.set("name", "Ada");
    assert_eq!(el.node_at(0).unwrap().text_content(), "");
    el.set("salutation", "Hello");
    assert_eq!(el.node_at(0).unwrap().text_content(), "Hello Ada");
}

#[test]
fn read_only_values_still_notify_bound_hosts() {
    let mut model = Model::new("x-counter");
    model.declare_property(&PropertyInfo::new("count").read_only().notify());
    model.create_bindings();
    let counter = Element::new(Rc::new(model));
    let host = host_with(BindingNote::property("count", "total"), counter.node());

    // Downward writes cannot reach a read-only property.
    host.set("total", 3);
    assert!(counter.get("count").is_undefined());

    assert!(counter.call_private_setter("_setCount", 7));
    assert_eq!(host.get("total"), Value::from(7));
}

#[test]
fn effect_order_is_independent_of_registration_order() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut model = Model::new("x-ordered");
    model.declare_property(
        &PropertyInfo::new("value")
            .observer("changed")
            .notify()
            .reflect_to_attribute(),
    );
    model.add_annotation_effects(&[AnnotationNote::new(0).with_binding(BindingNote::text("value"))]);
    let l = log.clone();
    model.define_method("changed", move |_, _| {
        l.borrow_mut().push(EffectKind::Observer);
        Value::Undefined
    });
    model.create_bindings();

    let kinds: Vec<_> = model
        .property_effects("value")
        .unwrap()
        .iter()
        .map(|e| e.kind())
        .collect();
    assert_eq!(
        kinds,
        [
            EffectKind::Annotation,
            EffectKind::Reflect,
            EffectKind::Notify,
            EffectKind::Observer
        ]
    );

    let el = Element::new(Rc::new(model));
    let text = Node::new("span");
    el.node().append_child(text.clone());
    el.marshal_annotated_nodes(&[AnnotationNote::new(0)]);
    let l = log.clone();
    let probe = text.clone();
    let host_node = el.node().clone();
    el.node().add_event_listener("value-changed", move |_, _| {
        // Bindings and reflection already happened when the event fires.
        assert_eq!(probe.text_content(), "on");
        assert_eq!(host_node.attribute("value").as_deref(), Some("on"));
        l.borrow_mut().push(EffectKind::Notify);
    });

    el.set("value", "on");
    assert_eq!(*log.borrow(), [EffectKind::Notify, EffectKind::Observer]);
}
