// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-type binding models.
//!
//! A [`Model`] is the shared description of an element type: which effects run
//! for which property, which accessors exist, which nodes listen for changes,
//! and which methods and handlers are available by name. It is built once,
//! finalized with [`Model::create_bindings`], and then shared by every
//! [`Element`] of that type.

use alloc::rc::Rc;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;

use hashbrown::{HashMap, HashSet};
use tracing::debug;

use crate::accessor::Accessor;
use crate::annotations::{AnnotationNote, Behavior, BindingNote, PropertyFlags, PropertyInfo};
use crate::case_map::private_setter_name;
use crate::dom::{Event, Node};
use crate::effect::{
    AnnotationEffect, BindingTarget, ComplexObserverEffect, ComputeEffect,
    ComputedAnnotationEffect, Effect, Signature,
};
use crate::element::Element;
use crate::listener::ListenerBinding;
use crate::path::model_for_path;
use crate::registry::PropertyEffects;
use crate::value::Value;

/// A named method: `(element, args) -> result`.
pub type Method = Rc<dyn Fn(&Element, &[Value]) -> Value>;

/// A named event handler.
pub type Handler = Rc<dyn Fn(&Element, &Event)>;

/// Hook invoked on each annotated node while content is parsed.
pub type PrepElementHook = Rc<dyn Fn(&Node)>;

/// Shared binding model of an element type.
pub struct Model {
    name: String,
    effects: PropertyEffects,
    accessors: HashMap<String, Accessor>,
    private_setters: HashMap<String, String>,
    read_only: HashSet<String>,
    bind_listeners: Vec<ListenerBinding>,
    methods: HashMap<String, Method>,
    handlers: HashMap<String, Handler>,
    prep_element: Option<PrepElementHook>,
}

/// Creates an empty model named `name`.
#[must_use]
pub fn prepare_model(name: &str) -> Model {
    Model::new(name)
}

impl Model {
    /// Creates an empty model named `name`.
    ///
    /// The name is used as the tag of hosts created from the model.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            effects: PropertyEffects::new(),
            accessors: HashMap::new(),
            private_setters: HashMap::new(),
            read_only: HashSet::new(),
            bind_listeners: Vec::new(),
            methods: HashMap::new(),
            handlers: HashMap::new(),
            prep_element: None,
        }
    }

    /// Model name.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registers `effect` on `property`.
    pub fn add_property_effect(&mut self, property: &str, effect: Effect) {
        self.effects.add(property, effect);
    }

    /// Ensures `property` gets an accessor even without effects.
    pub fn ensure_property_effects(&mut self, property: &str) {
        self.effects.ensure(property);
    }

    /// The effect registry.
    #[inline]
    #[must_use]
    pub fn effects(&self) -> &PropertyEffects {
        &self.effects
    }

    /// Effects registered on `property`.
    #[must_use]
    pub fn property_effects(&self, property: &str) -> Option<&[Effect]> {
        self.effects.get(property)
    }

    /// Turns a property declaration into effects.
    pub fn declare_property(&mut self, info: &PropertyInfo) {
        let name = info.name.as_str();
        if let Some(signature) = &info.computed {
            self.add_computed_property(name, signature);
        }
        if info.flags.contains(PropertyFlags::NOTIFY) {
            self.add_property_effect(name, Effect::Notify);
        }
        if info.flags.contains(PropertyFlags::REFLECT_TO_ATTRIBUTE) {
            self.add_property_effect(name, Effect::Reflect);
        }
        if info.is_read_only() {
            self.read_only.insert(name.to_string());
            self.ensure_property_effects(name);
        }
        if let Some(observer) = &info.observer {
            self.add_property_effect(name, Effect::observer(observer.as_str()));
        }
    }

    fn add_computed_property(&mut self, property: &str, signature: &Signature) {
        for trigger in signature.dependencies() {
            let Some(root) = trigger.root() else { continue };
            let effect = Effect::Compute(Rc::new(ComputeEffect {
                signature: signature.clone(),
                trigger: trigger.clone(),
                property: property.to_string(),
            }));
            self.add_property_effect(root, effect);
        }
    }

    /// Registers a multi-property observer on each of its dependencies.
    pub fn add_complex_observer(&mut self, signature: &Signature) {
        for trigger in signature.dependencies() {
            let Some(root) = trigger.root() else { continue };
            let effect = Effect::ComplexObserver(Rc::new(ComplexObserverEffect {
                signature: signature.clone(),
                trigger: trigger.clone(),
            }));
            self.add_property_effect(root, effect);
        }
    }

    /// Turns annotation notes into binding effects and listener bindings.
    ///
    /// A note's position in `notes` is the index of its node in an element's
    /// annotated node list.
    pub fn add_annotation_effects(&mut self, notes: &[AnnotationNote]) {
        for (index, note) in notes.iter().enumerate() {
            for binding in &note.bindings {
                self.add_annotation_effect(index, binding);
            }
        }
    }

    fn add_annotation_effect(&mut self, index: usize, binding: &BindingNote) {
        if binding.should_add_listener() {
            self.add_annotated_listener(
                index,
                &binding.name,
                &binding.value,
                binding.event.as_deref(),
            );
        }
        let target = BindingTarget {
            index,
            kind: binding.kind,
            name: binding.name.clone(),
        };
        match &binding.signature {
            Some(signature) => {
                for trigger in signature.dependencies() {
                    let Some(root) = trigger.root() else { continue };
                    let effect = Effect::ComputedAnnotation(Rc::new(ComputedAnnotationEffect {
                        target: target.clone(),
                        signature: signature.clone(),
                        trigger: trigger.clone(),
                    }));
                    self.add_property_effect(root, effect);
                }
            }
            None => {
                let effect = Effect::Annotation(Rc::new(AnnotationEffect {
                    target,
                    path: binding.value.clone(),
                    negate: binding.negate,
                }));
                self.add_property_effect(model_for_path(&binding.value), effect);
            }
        }
    }

    /// Records that node `index` reports changes of its `property` back to
    /// the host `path`.
    ///
    /// Listens for `event`, or `<dash-property>-changed` by default.
    pub fn add_annotated_listener(
        &mut self,
        index: usize,
        property: &str,
        path: &str,
        event: Option<&str>,
    ) {
        self.bind_listeners
            .push(ListenerBinding::new(index, property, path, event));
    }

    /// Listener bindings wired into every instance.
    #[inline]
    #[must_use]
    pub fn bind_listeners(&self) -> &[ListenerBinding] {
        &self.bind_listeners
    }

    /// Applies a behavior's declarations.
    ///
    /// Methods and handlers already defined on the model are kept.
    pub fn add_behavior(&mut self, behavior: &Behavior) {
        for info in &behavior.properties {
            self.declare_property(info);
        }
        for signature in &behavior.observers {
            self.add_complex_observer(signature);
        }
        for (name, method) in &behavior.methods {
            self.methods
                .entry_ref(name.as_str())
                .or_insert_with(|| method.clone());
        }
        for (name, handler) in &behavior.handlers {
            self.handlers
                .entry_ref(name.as_str())
                .or_insert_with(|| handler.clone());
        }
    }

    /// Defines a named method.
    pub fn define_method(
        &mut self,
        name: &str,
        method: impl Fn(&Element, &[Value]) -> Value + 'static,
    ) {
        self.methods.insert(name.to_string(), Rc::new(method));
    }

    /// Defines a named event handler.
    pub fn define_handler(&mut self, name: &str, handler: impl Fn(&Element, &Event) + 'static) {
        self.handlers.insert(name.to_string(), Rc::new(handler));
    }

    /// Looks up a method by name.
    #[must_use]
    pub fn method(&self, name: &str) -> Option<&Method> {
        self.methods.get(name)
    }

    /// Looks up a handler by name.
    #[must_use]
    pub fn handler(&self, name: &str) -> Option<&Handler> {
        self.handlers.get(name)
    }

    /// Installs the hook run on annotated nodes while content is parsed.
    pub fn set_prep_element(&mut self, hook: impl Fn(&Node) + 'static) {
        self.prep_element = Some(Rc::new(hook));
    }

    /// The prep-element hook, if any.
    #[must_use]
    pub fn prep_element(&self) -> Option<&PrepElementHook> {
        self.prep_element.as_ref()
    }

    /// Marks `property` read-only.
    pub fn set_read_only(&mut self, property: &str) {
        self.read_only.insert(property.to_string());
    }

    /// Whether `property` has no public setter.
    #[must_use]
    pub fn is_read_only_property(&self, property: &str) -> bool {
        self.read_only.contains(property)
    }

    /// Finalizes the model.
    ///
    /// Every effect list is stable-sorted by kind and an accessor is installed
    /// for each property with a list. Calling this again reinstalls the same
    /// accessors.
    pub fn create_bindings(&mut self) {
        self.effects.sort();
        let installs: Vec<(String, Rc<[Effect]>)> = self
            .effects
            .iter()
            .map(|(property, effects)| (property.to_string(), Rc::from(effects)))
            .collect();
        for (property, effects) in installs {
            self.create_accessors(&property, effects);
        }
        debug!(
            model = %self.name,
            accessors = self.accessors.len(),
            listeners = self.bind_listeners.len(),
            "created bindings"
        );
    }

    /// Installs the accessor for `property`.
    ///
    /// Read-only properties get a getter only, plus a private `_set<Name>`
    /// setter.
    pub fn create_accessors(&mut self, property: &str, effects: Rc<[Effect]>) {
        let accessor = if self.is_read_only_property(property) {
            self.private_setters
                .insert(private_setter_name(property), property.to_string());
            Accessor::read_only(property, effects)
        } else {
            Accessor::new(property, effects)
        };
        self.accessors.insert(property.to_string(), accessor);
    }

    /// The accessor for `property`.
    #[must_use]
    pub fn accessor(&self, property: &str) -> Option<&Accessor> {
        self.accessors.get(property)
    }

    /// Iterates over installed accessors.
    pub fn accessors(&self) -> impl Iterator<Item = &Accessor> + '_ {
        self.accessors.values()
    }

    /// Property written by the private setter `setter`, e.g. `_setCount`.
    #[must_use]
    pub fn private_setter(&self, setter: &str) -> Option<&str> {
        self.private_setters.get(setter).map(String::as_str)
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut accessors: Vec<_> = self.accessors.keys().collect();
        accessors.sort();
        f.debug_struct("Model")
            .field("name", &self.name)
            .field("accessors", &accessors)
            .field("bind_listeners", &self.bind_listeners)
            .field("methods", &self.methods.len())
            .field("handlers", &self.handlers.len())
            .finish_non_exhaustive()
    }
}
