// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Declarative inputs: binding and event notes parsed from template content,
//! property declarations, and behaviors.
//!
//! These are plain data. A [`Model`](crate::Model) turns them into effects,
//! accessors and listener bindings.

use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use bitflags::bitflags;

use crate::effect::Signature;
use crate::element::Element;
use crate::model::{Handler, Method};
use crate::value::Value;

/// How a binding writes into its node.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BindingKind {
    /// Replaces the node's text content.
    Text,
    /// Sets a node property.
    Property,
    /// Sets or removes a node attribute.
    Attribute,
}

/// Data flow direction of a binding.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum BindingMode {
    /// `{{path}}`: host to node, and node change events back to the host.
    #[default]
    TwoWay,
    /// `[[path]]`: host to node only.
    OneWay,
}

/// One binding on an annotated node.
#[derive(Clone, Debug, PartialEq)]
pub struct BindingNote {
    /// How the value is written.
    pub kind: BindingKind,
    /// Flow direction.
    pub mode: BindingMode,
    /// Target property or attribute on the node; empty for text bindings.
    pub name: String,
    /// Bound path on the host, e.g. `user.name`.
    pub value: String,
    /// Write the boolean negation.
    pub negate: bool,
    /// Overrides the change event listened for in two-way bindings.
    pub event: Option<String>,
    /// Present for computed bindings such as `{{format(a, b)}}`.
    pub signature: Option<Signature>,
}

impl BindingNote {
    fn new(kind: BindingKind, name: &str, value: &str) -> Self {
        Self {
            kind,
            mode: BindingMode::TwoWay,
            name: name.into(),
            value: value.into(),
            negate: false,
            event: None,
            signature: None,
        }
    }

    /// A text content binding.
    #[must_use]
    pub fn text(path: &str) -> Self {
        Self::new(BindingKind::Text, "", path)
    }

    /// A property binding.
    #[must_use]
    pub fn property(name: &str, path: &str) -> Self {
        Self::new(BindingKind::Property, name, path)
    }

    /// An attribute binding.
    #[must_use]
    pub fn attribute(name: &str, path: &str) -> Self {
        Self::new(BindingKind::Attribute, name, path)
    }

    /// Makes this binding one-way.
    #[must_use]
    pub fn one_way(mut self) -> Self {
        self.mode = BindingMode::OneWay;
        self
    }

    /// Negates the bound value.
    #[must_use]
    pub fn negated(mut self) -> Self {
        self.negate = true;
        self
    }

    /// Listens for `event` instead of the derived `<name>-changed`.
    #[must_use]
    pub fn with_event(mut self, event: &str) -> Self {
        self.event = Some(event.into());
        self
    }

    /// Makes this a computed binding.
    #[must_use]
    pub fn computed(mut self, signature: Signature) -> Self {
        self.signature = Some(signature);
        self
    }

    /// Whether the binding also listens for changes coming up from the node.
    ///
    /// Only named, two-way, non-negated, non-computed, non-attribute bindings
    /// do.
    #[must_use]
    pub fn should_add_listener(&self) -> bool {
        !self.name.is_empty()
            && self.mode == BindingMode::TwoWay
            && !self.negate
            && self.signature.is_none()
            && self.kind != BindingKind::Attribute
    }

    /// Every host path this binding reads.
    pub fn paths(&self) -> impl Iterator<Item = &str> + '_ {
        let plain = self.signature.is_none().then_some(self.value.as_str());
        let computed = self
            .signature
            .iter()
            .flat_map(|sig| sig.dependencies().filter_map(|arg| arg.name()));
        plain.into_iter().chain(computed)
    }
}

/// A declarative event handler on an annotated node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventNote {
    /// Event name.
    pub name: String,
    /// Handler name, resolved on the root data host.
    pub handler: String,
}

/// Bindings and listeners found on one node of template content.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AnnotationNote {
    /// Pre-order position of the node among the content's descendants.
    pub node_index: usize,
    /// Bindings on the node.
    pub bindings: Vec<BindingNote>,
    /// Declarative event handlers on the node.
    pub events: Vec<EventNote>,
}

impl AnnotationNote {
    /// A note for the node at `node_index`.
    #[must_use]
    pub fn new(node_index: usize) -> Self {
        Self {
            node_index,
            ..Self::default()
        }
    }

    /// Adds a binding.
    #[must_use]
    pub fn with_binding(mut self, binding: BindingNote) -> Self {
        self.bindings.push(binding);
        self
    }

    /// Adds an event handler.
    #[must_use]
    pub fn with_event(mut self, name: &str, handler: &str) -> Self {
        self.events.push(EventNote {
            name: name.into(),
            handler: handler.into(),
        });
        self
    }
}

bitflags! {
    /// Declared behavior of a property.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
    pub struct PropertyFlags: u8 {
        /// Fire `<name>-changed` on change.
        const NOTIFY = 1 << 0;
        /// Serialize the value to the dash-cased attribute on change.
        const REFLECT_TO_ATTRIBUTE = 1 << 1;
        /// No public setter; writes go through `_set<Name>`.
        const READ_ONLY = 1 << 2;
    }
}

/// Declaration of one property.
#[derive(Clone, Debug, PartialEq)]
pub struct PropertyInfo {
    /// Property name.
    pub name: String,
    /// Declared behavior.
    pub flags: PropertyFlags,
    /// Single-property observer method.
    pub observer: Option<String>,
    /// Computing signature; computed properties are read-only.
    pub computed: Option<Signature>,
}

impl PropertyInfo {
    /// A plain property.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.into(),
            flags: PropertyFlags::empty(),
            observer: None,
            computed: None,
        }
    }

    /// Adds `flags`.
    #[must_use]
    pub fn flags(mut self, flags: PropertyFlags) -> Self {
        self.flags |= flags;
        self
    }

    /// Adds [`PropertyFlags::NOTIFY`].
    #[must_use]
    pub fn notify(mut self) -> Self {
        self.flags |= PropertyFlags::NOTIFY;
        self
    }

    /// Adds [`PropertyFlags::REFLECT_TO_ATTRIBUTE`].
    #[must_use]
    pub fn reflect_to_attribute(mut self) -> Self {
        self.flags |= PropertyFlags::REFLECT_TO_ATTRIBUTE;
        self
    }

    /// Adds [`PropertyFlags::READ_ONLY`].
    #[must_use]
    pub fn read_only(mut self) -> Self {
        self.flags |= PropertyFlags::READ_ONLY;
        self
    }

    /// Sets the observer method.
    #[must_use]
    pub fn observer(mut self, method: &str) -> Self {
        self.observer = Some(method.into());
        self
    }

    /// Makes the property computed.
    #[must_use]
    pub fn computed(mut self, signature: Signature) -> Self {
        self.computed = Some(signature);
        self
    }

    /// Whether the property has no public setter.
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.flags.contains(PropertyFlags::READ_ONLY) || self.computed.is_some()
    }
}

/// A reusable bundle of property declarations, observers, and methods.
#[derive(Clone, Default)]
pub struct Behavior {
    /// Property declarations.
    pub properties: Vec<PropertyInfo>,
    /// Multi-property observers.
    pub observers: Vec<Signature>,
    /// Named methods.
    pub methods: Vec<(String, Method)>,
    /// Named event handlers.
    pub handlers: Vec<(String, Handler)>,
}

impl Behavior {
    /// An empty behavior.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a property declaration.
    #[must_use]
    pub fn property(mut self, info: PropertyInfo) -> Self {
        self.properties.push(info);
        self
    }

    /// Adds a multi-property observer.
    #[must_use]
    pub fn observer(mut self, signature: Signature) -> Self {
        self.observers.push(signature);
        self
    }

    /// Adds a method.
    #[must_use]
    pub fn method(
        mut self,
        name: &str,
        method: impl Fn(&Element, &[Value]) -> Value + 'static,
    ) -> Self {
        self.methods.push((name.into(), Rc::new(method)));
        self
    }

    /// Adds an event handler.
    #[must_use]
    pub fn handler(
        mut self,
        name: &str,
        handler: impl Fn(&Element, &crate::dom::Event) + 'static,
    ) -> Self {
        self.handlers.push((name.into(), Rc::new(handler)));
        self
    }
}

impl fmt::Debug for Behavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Behavior")
            .field("properties", &self.properties)
            .field("observers", &self.observers)
            .field("methods", &self.methods.len())
            .field("handlers", &self.handlers.len())
            .finish()
    }
}
