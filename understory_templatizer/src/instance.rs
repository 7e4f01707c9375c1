// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Stamped template instances.

use alloc::format;
use alloc::rc::Rc;

use tracing::{debug, trace};
use understory_bind::{Element, Node, Object, PathDelegate, Value};

use crate::archetype::Archetype;
use crate::forward::{PARENT_SCOPE, ParentPropForwarder, parent_prop_name};

/// One stamped copy of a template's content, bound to its own model.
#[derive(Clone, Debug)]
pub struct TemplateInstance {
    element: Element,
}

impl TemplateInstance {
    /// Builds an instance of `archetype` with initial `model` values, stamped
    /// on behalf of `host`.
    pub(crate) fn construct(
        archetype: &Archetype,
        model: Object,
        host: &Element,
        root_data_host: Option<&Element>,
        forwarder: Option<Rc<dyn ParentPropForwarder>>,
    ) -> Self {
        let element = Element::with_node(archetype.model().clone(), Node::fragment());
        element.set_path_delegate(Rc::new(InstancePathDelegate { forwarder }));
        element.set_root_data_host(root_data_host);
        element.setup_configure(model);
        element.attach_to_host(host);
        if let Some(fragment) = archetype.fragment() {
            element.stamp_content(fragment);
        }
        element.node().mark_style_scoped();
        element.marshal_annotated_nodes(archetype.notes());
        element.marshal_instance_effects();
        element.marshal_annotated_listeners(archetype.notes());
        element.try_ready();
        debug!(
            nodes = archetype.notes().len(),
            ready = element.is_ready(),
            "stamped template instance"
        );
        Self { element }
    }

    /// The instance element.
    #[inline]
    #[must_use]
    pub fn element(&self) -> &Element {
        &self.element
    }

    /// Root node holding the stamped content.
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Node {
        self.element.node()
    }

    /// Value of `path` in the instance.
    #[must_use]
    pub fn get(&self, path: &str) -> Value {
        self.element.get_path_value(path)
    }

    /// Sets an instance property.
    pub fn set(&self, property: &str, value: impl Into<Value>) {
        self.element.set(property, value);
    }

    /// Pushes a parent property value into this instance.
    ///
    /// Updates `parent.<prop>` and runs the dependent path effects without
    /// propagating the change back up.
    pub fn forward_parent_prop(&self, prop: &str, value: &Value) {
        let parent = match self.element.get(PARENT_SCOPE) {
            Value::Object(parent) => parent,
            _ => {
                let parent = Object::new();
                self.element
                    .property_set(PARENT_SCOPE, Value::from(parent.clone()), None);
                parent
            }
        };
        parent.set(prop, value.clone());
        let path = format!("{PARENT_SCOPE}.{prop}");
        self.element.notify_path(&path, value.clone(), true);
    }
}

/// Routes path changes made inside an instance to the stamping host.
struct InstancePathDelegate {
    forwarder: Option<Rc<dyn ParentPropForwarder>>,
}

impl PathDelegate for InstancePathDelegate {
    fn notify_path_upward(&self, instance: &Element, path: &str, value: &Value) -> bool {
        let Some((root, sub_path)) = path.split_once('.') else {
            trace!(path, "single-segment instance path stays local");
            return true;
        };
        let Some(host) = instance.data_host() else {
            return true;
        };
        if root == PARENT_SCOPE {
            if sub_path.contains('.') {
                host.notify_path(&parent_prop_name(sub_path), value.clone(), false);
            } else if let Some(outer) = host.data_host() {
                outer.set(sub_path, value.clone());
            } else {
                trace!(path, "templatizer host has no data host");
            }
        }
        if let Some(forwarder) = &self.forwarder {
            forwarder.forward_instance_path(instance, root, sub_path, value);
        }
        true
    }
}
