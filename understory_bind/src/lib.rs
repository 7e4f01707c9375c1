// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Bind: reactive property effects and annotation bindings.
//!
//! This crate drives data binding for a tree of [`Node`]s. Each element type
//! is described by a [`Model`]: a table of [`Effect`]s per property, built from
//! property declarations and from annotation notes found in template content.
//! Every [`Element`] shares its model and keeps its own data store.
//!
//! ## Core Concepts
//!
//! ### Effects
//!
//! When a property changes, its effects run in [`EffectKind`] order:
//!
//! | Kind | Runs |
//! |------|------|
//! | `compute` | recomputes a computed property |
//! | `annotation` | pushes the value into a bound node |
//! | `computedAnnotation` | pushes a computed value into a bound node |
//! | `reflect` | serializes the value to the host attribute |
//! | `notify` | fires `<dash-name>-changed` |
//! | `observer` | calls `observer(new, old)` |
//! | `complexObserver` | calls an observer over several dependencies |
//! | `function` | calls an arbitrary closure |
//!
//! ### Writes
//!
//! Every write goes through the property-set guard: writing the value a
//! property already holds does nothing, and writing an object or null
//! invalidates cached sub-paths such as `user.name` below `user`.
//!
//! ### Paths
//!
//! [`Element::notify_path`] records a change below a property, runs only the
//! effects that depend on that path, and propagates the change upward, either
//! through a [`PathDelegate`] or as a `<root>-changed` event carrying the path.
//!
//! ### Two-way bindings
//!
//! Property bindings that are two-way get a [`ListenerBinding`]: the node's
//! change event flows back into the host path.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::rc::Rc;
//! use understory_bind::{
//!     AnnotationNote, BindingNote, Element, Model, Node, PropertyInfo, Value,
//! };
//!
//! // Declare a type: `title` notifies and is bound into the first node.
//! let mut model = Model::new("x-card");
//! model.declare_property(&PropertyInfo::new("title").notify());
//! let notes = [AnnotationNote::new(0).with_binding(BindingNote::text("title"))];
//! model.add_annotation_effects(&notes);
//! model.create_bindings();
//!
//! // Create an element and give it content.
//! let card = Element::new(Rc::new(model));
//! card.node().append_child(Node::new("h1"));
//! card.marshal_annotated_nodes(&notes);
//!
//! card.set("title", "Hello");
//! assert_eq!(card.node_at(0).unwrap().text_content(), "Hello");
//! assert_eq!(card.get("title"), Value::from("Hello"));
//! ```
//!
//! ## `no_std` Support
//!
//! This crate is `no_std` and uses `alloc`. It does not depend on `std`.

#![no_std]

extern crate alloc;

mod accessor;
mod annotations;
mod case_map;
mod dispatch;
mod dom;
mod effect;
mod element;
mod listener;
mod model;
mod path;
mod registry;
mod value;

pub use accessor::Accessor;
pub use annotations::{
    AnnotationNote, Behavior, BindingKind, BindingMode, BindingNote, EventNote, PropertyFlags,
    PropertyInfo,
};
pub use case_map::{
    CHANGED_SUFFIX, camel_to_dash_case, change_event_name, dash_to_camel_case,
    private_setter_name, upper_first,
};
pub use dispatch::serialize_value_to_attribute;
pub use dom::{Event, EventDetail, Node, TEXT_CONTENT};
pub use effect::{
    AnnotationEffect, BindingTarget, ComplexObserverEffect, ComputeEffect,
    ComputedAnnotationEffect, Effect, EffectArg, EffectFn, EffectKind, FunctionEffect,
    ObserverEffect, ParseEffectKindError, ParseSignatureError, Signature,
};
pub use element::{Element, ParentPropFn, WeakElement};
pub use listener::{ListenerBinding, setup_bind_listeners};
pub use model::{Handler, Method, Model, PrepElementHook, prepare_model};
pub use path::{PathDelegate, fix_path, is_descendant, is_structured, model_for_path, path_matches};
pub use registry::PropertyEffects;
pub use value::{Object, Value};
