// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Two-way binding listeners.
//!
//! A [`ListenerBinding`] records that an annotated node reports changes to one
//! of its properties through a change event, and that the host should take
//! the new value into one of its own paths. [`setup_bind_listeners`] wires
//! every recorded binding into an element's annotated nodes.

use alloc::string::{String, ToString};

use tracing::{trace, warn};

use crate::case_map::change_event_name;
use crate::dom::{Event, Node};
use crate::element::Element;
use crate::path::{fix_path, is_structured};

/// A node property flowing back into a host path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListenerBinding {
    /// Index of the node in the annotated node list.
    pub index: usize,
    /// Property read from the node.
    pub property: String,
    /// Host path written.
    pub path: String,
    /// Event listened for.
    pub event: String,
    structured: bool,
}

impl ListenerBinding {
    /// A binding listening for `event`, or `<dash-property>-changed`.
    #[must_use]
    pub fn new(index: usize, property: &str, path: &str, event: Option<&str>) -> Self {
        Self {
            index,
            property: property.to_string(),
            path: path.to_string(),
            event: event.map_or_else(|| change_event_name(property), ToString::to_string),
            structured: is_structured(path),
        }
    }

    /// Whether the host path has more than one segment.
    #[inline]
    #[must_use]
    pub fn is_structured(&self) -> bool {
        self.structured
    }

    /// Takes a change reported by `target` into `host`.
    ///
    /// Events that did not originate at `target` are discarded. Path
    /// notifications are re-rooted onto the host path. Otherwise the node's
    /// property is read; a single-segment host path is set directly, and a
    /// structured one is written only if it differs loosely from the cached
    /// value.
    pub fn handle(&self, host: &Element, event: &Event, target: &Node) {
        if !event.origin().ptr_eq(target) {
            trace!(event = event.name(), "discarding change event from another origin");
            return;
        }
        if let Some(path) = event.detail().path() {
            let fixed = fix_path(&self.path, &self.property, path);
            host.notify_path(&fixed, event.detail().value().clone(), false);
            return;
        }
        let value = target.property(&self.property);
        if !self.structured {
            host.set(&self.path, value);
        } else if !host.get(&self.path).loose_eq(&value) {
            host.set_path_value(&self.path, value);
        }
    }
}

/// Wires every listener binding of `element`'s model into its annotated
/// nodes.
pub fn setup_bind_listeners(element: &Element) {
    let model = element.model().clone();
    for binding in model.bind_listeners() {
        let Some(node) = element.node_at(binding.index) else {
            warn!(
                index = binding.index,
                event = binding.event.as_str(),
                "no annotated node for listener"
            );
            continue;
        };
        let host = element.downgrade();
        let binding = binding.clone();
        let event_name = binding.event.clone();
        node.add_event_listener(&event_name, move |event, target| {
            if let Some(host) = host.upgrade() {
                binding.handle(&host, event, target);
            }
        });
    }
}
