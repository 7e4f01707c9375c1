// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Templatizer: stamp bound instances from template content.
//!
//! A [`Template`] holds inert [`TemplateContent`]: a fragment of nodes plus the
//! annotation notes describing its bindings. A [`Templatizer`] compiles the
//! content once into an [`Archetype`], a shared instance model with all
//! binding effects installed, and then stamps any number of
//! [`TemplateInstance`]s from it. Each instance owns a deep copy of the
//! fragment and its own data.
//!
//! The archetype is cached on the content, so templatizing the same content
//! again, from any host, reuses it.
//!
//! ## Parent properties
//!
//! Content may read the scope around the template through `parent.<prop>`
//! paths. With a [`ParentPropForwarder`] installed, the templatizer mirrors
//! each such property on the template element as `_parent_<prop>`; writes to
//! the mirror reach the forwarder, which pushes them into the live instances
//! with [`TemplateInstance::forward_parent_prop`]. Changes made inside an
//! instance flow back out: `parent.<prop>` is written on the outer host and
//! deeper paths are renamed to `_parent_<path>` and notified on the
//! templatizer host.
//!
//! ## Example
//!
//! ```rust
//! use understory_bind::{AnnotationNote, BindingNote, Element, Model, Node, Object};
//! use understory_templatizer::{Template, TemplateContent, Templatizer};
//! use std::rc::Rc;
//!
//! let fragment = Node::fragment().with_child(Node::new("li"));
//! let content = TemplateContent::new(fragment)
//!     .with_notes(vec![AnnotationNote::new(0).with_binding(BindingNote::text("item"))]);
//! let template = Template::new(content);
//!
//! let host = Element::new(Rc::new(Model::new("x-list")));
//! let mut templatizer = Templatizer::new(host);
//! templatizer.templatize(&template);
//!
//! let model: Object = [("item", "first")].into_iter().collect();
//! let instance = templatizer.stamp(Some(model)).unwrap();
//! let li = instance.root().children()[0].clone();
//! assert_eq!(li.text_content(), "first");
//!
//! instance.set("item", "changed");
//! assert_eq!(li.text_content(), "changed");
//! ```
//!
//! ## `no_std` Support
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod archetype;
mod forward;
mod instance;
mod template;
mod templatizer;

pub use archetype::{Archetype, INSTANCE_MODEL_NAME};
pub use forward::{PARENT_PREFIX, PARENT_SCOPE, ParentPropForwarder, parent_prop_name};
pub use instance::TemplateInstance;
pub use template::{AnnotationParser, ArchetypeState, ParsedAnnotations, Template, TemplateContent};
pub use templatizer::{StampedChildren, TemplatizeError, Templatizer};
