// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Elements: per-instance data stores driven by a shared [`Model`].
//!
//! An [`Element`] is a cheap, cloneable handle. All operations take `&self`
//! and never hold an interior borrow while running effects, so effects may
//! freely read and write the element that triggered them.

use alloc::format;
use alloc::rc::{Rc, Weak};
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::fmt;

use hashbrown::HashMap;
use tracing::{debug, trace, warn};

use crate::accessor::Accessor;
use crate::annotations::AnnotationNote;
use crate::case_map::change_event_name;
use crate::dispatch;
use crate::dom::{Event, EventDetail, Node};
use crate::effect::Effect;
use crate::listener;
use crate::model::{Handler, Method, Model};
use crate::path::{PathDelegate, model_for_path};
use crate::value::{Object, Value};

/// Callback receiving `(property, value)` for parent property forwarding.
pub type ParentPropFn = Rc<dyn Fn(&str, &Value)>;

struct ElementInner {
    model: Rc<Model>,
    node: Node,
    own_accessors: RefCell<HashMap<String, Accessor>>,
    data: RefCell<HashMap<String, Value>>,
    nodes: RefCell<Vec<Node>>,
    config: RefCell<Option<Object>>,
    data_host: RefCell<Option<WeakElement>>,
    root_data_host: RefCell<Option<WeakElement>>,
    clients: RefCell<Vec<WeakElement>>,
    clients_readied: Cell<bool>,
    ready: Cell<bool>,
    delegate: RefCell<Option<Rc<dyn PathDelegate>>>,
    parent_prop_forwarder: RefCell<Option<ParentPropFn>>,
}

/// A bound element.
#[derive(Clone)]
pub struct Element(Rc<ElementInner>);

/// A non-owning handle to an [`Element`].
#[derive(Clone)]
pub struct WeakElement(Weak<ElementInner>);

impl WeakElement {
    /// Upgrades to a strong handle if the element is still alive.
    #[must_use]
    pub fn upgrade(&self) -> Option<Element> {
        self.0.upgrade().map(Element)
    }
}

impl fmt::Debug for WeakElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakElement").finish_non_exhaustive()
    }
}

impl Element {
    /// Creates an element of `model` hosted by a fresh node named after the
    /// model.
    #[must_use]
    pub fn new(model: Rc<Model>) -> Self {
        let node = Node::new(model.name());
        Self::with_node(model, node)
    }

    /// Creates an element of `model` hosted by `node`.
    #[must_use]
    pub fn with_node(model: Rc<Model>, node: Node) -> Self {
        let element = Self(Rc::new(ElementInner {
            model,
            node,
            own_accessors: RefCell::new(HashMap::new()),
            data: RefCell::new(HashMap::new()),
            nodes: RefCell::new(Vec::new()),
            config: RefCell::new(None),
            data_host: RefCell::new(None),
            root_data_host: RefCell::new(None),
            clients: RefCell::new(Vec::new()),
            clients_readied: Cell::new(false),
            ready: Cell::new(false),
            delegate: RefCell::new(None),
            parent_prop_forwarder: RefCell::new(None),
        }));
        element.0.node.host(&element);
        element
    }

    /// A weak handle to this element.
    #[must_use]
    pub fn downgrade(&self) -> WeakElement {
        WeakElement(Rc::downgrade(&self.0))
    }

    /// Returns `true` if both handles refer to the same element.
    #[inline]
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// The shared model.
    #[inline]
    #[must_use]
    pub fn model(&self) -> &Rc<Model> {
        &self.0.model
    }

    /// The hosting node.
    #[inline]
    #[must_use]
    pub fn node(&self) -> &Node {
        &self.0.node
    }

    /// Resets the data store.
    pub fn prepare_instance(&self) {
        self.0.data.borrow_mut().clear();
    }

    /// The accessor for `property`: an instance-level accessor if one was
    /// defined, otherwise the model's.
    #[must_use]
    pub fn accessor(&self, property: &str) -> Option<Accessor> {
        if let Some(own) = self.0.own_accessors.borrow().get(property) {
            return Some(own.clone());
        }
        self.0.model.accessor(property).cloned()
    }

    /// Installs an accessor on this element only.
    pub fn define_accessor(&self, accessor: Accessor) {
        self.0
            .own_accessors
            .borrow_mut()
            .insert(accessor.property().to_string(), accessor);
    }

    /// Current value of `property`, or of a cached path such as `a.b`.
    #[must_use]
    pub fn get(&self, property: &str) -> Value {
        self.0
            .data
            .borrow()
            .get(property)
            .cloned()
            .unwrap_or_default()
    }

    /// Public setter.
    ///
    /// Runs the accessor's effects when the value changes. Writes to a
    /// read-only property are ignored; use its private setter instead.
    pub fn set(&self, property: &str, value: impl Into<Value>) {
        let value = value.into();
        match self.accessor(property) {
            Some(accessor) if accessor.is_settable() => {
                self.property_set(property, value, Some(accessor.effects()));
            }
            Some(_) => trace!(property, "ignoring write to read-only property"),
            None => {
                self.property_set(property, value, None);
            }
        }
    }

    /// Calls the private setter `setter`, e.g. `_setCount`.
    ///
    /// Returns `false` if the model has no such setter.
    pub fn call_private_setter(&self, setter: &str, value: impl Into<Value>) -> bool {
        let Some(property) = self.0.model.private_setter(setter) else {
            return false;
        };
        self.set_property(property, value.into());
        true
    }

    /// Writes through the accessor regardless of read-only status.
    pub fn set_property(&self, property: &str, value: Value) {
        let accessor = self.accessor(property);
        self.property_set(property, value, accessor.as_ref().map(Accessor::effects));
    }

    /// Stores `value` and runs `effects` if it differs from the current value.
    ///
    /// Identical writes are no-ops. Writing an object or null also clears
    /// every cached sub-path below `property`. Returns the previous value.
    pub fn property_set(
        &self,
        property: &str,
        value: Value,
        effects: Option<&Rc<[Effect]>>,
    ) -> Value {
        let old = self.get(property);
        if old.strict_eq(&value) {
            trace!(property, "value unchanged");
            return old;
        }
        self.0
            .data
            .borrow_mut()
            .insert(property.to_string(), value.clone());
        if value.is_composite() {
            self.clear_path(property);
        }
        if let Some(effects) = effects {
            self.effect_effects(property, &value, effects, &old);
        }
        old
    }

    /// Runs `effects` in order for a change of `property`.
    pub fn effect_effects(&self, property: &str, value: &Value, effects: &[Effect], old: &Value) {
        for effect in effects {
            dispatch::apply_effect(self, property, value, effect, old);
        }
    }

    /// Invalidates every cached sub-path below `path`.
    pub fn clear_path(&self, path: &str) {
        let prefix = format!("{path}.");
        for (key, value) in self.0.data.borrow_mut().iter_mut() {
            if key.starts_with(&prefix) {
                *value = Value::Undefined;
            }
        }
    }

    pub(crate) fn cache_value(&self, path: &str, value: Value) {
        self.0.data.borrow_mut().insert(path.to_string(), value);
    }

    /// Fires a non-bubbling `<dash-property>-changed` event carrying the
    /// current value.
    pub fn notify_change(&self, property: &str) {
        let value = self.get(property);
        self.fire(
            &change_event_name(property),
            EventDetail::with_value(value),
            false,
        );
    }

    /// Dispatches an event from the host node.
    pub fn fire(&self, name: &str, detail: EventDetail, bubbles: bool) {
        let event = Event::new(name, self.0.node.clone())
            .with_detail(detail)
            .with_bubbles(bubbles);
        self.0.node.dispatch_event(&event);
    }

    /// Reads a dotted path starting at a property.
    #[must_use]
    pub fn get_path_value(&self, path: &str) -> Value {
        match path.split_once('.') {
            None => self.get(path),
            Some((root, rest)) => self.get(root).get_path(rest),
        }
    }

    /// Writes a dotted path and notifies the change.
    ///
    /// A single-segment path goes through the public setter. Otherwise the
    /// member is assigned on the parent object, if that exists, and the path
    /// is notified.
    pub fn set_path_value(&self, path: &str, value: impl Into<Value>) {
        let value = value.into();
        let Some((parent, last)) = path.rsplit_once('.') else {
            self.set(path, value);
            return;
        };
        match self.get_path_value(parent) {
            Value::Object(target) => {
                target.set(last, value.clone());
                self.notify_path(path, value, false);
            }
            _ => trace!(path, "no object to assign into"),
        }
    }

    /// Records a change at `path` and propagates it.
    ///
    /// Runs the path effects and, unless `from_above`, notifies upward.
    /// Returns `false` if the cached value was already `value`.
    pub fn notify_path(&self, path: &str, value: impl Into<Value>, from_above: bool) -> bool {
        let value = value.into();
        let old = self.property_set(path, value.clone(), None);
        if old.strict_eq(&value) {
            return false;
        }
        self.path_effector(path, &value);
        if !from_above {
            self.notify_path_upward(path, &value);
        }
        true
    }

    /// Runs the effects of the root property that care about `path`.
    pub fn path_effector(&self, path: &str, value: &Value) {
        if let Some(delegate) = self.delegate()
            && delegate.intercept_path(self, path, value)
        {
            trace!(path, "path claimed by delegate");
            return;
        }
        dispatch::run_path_effects(self, path, value);
    }

    /// Propagates a path change away from this element.
    ///
    /// The delegate gets the first chance; otherwise a non-bubbling
    /// `<root>-changed` event carries the path and value.
    pub fn notify_path_upward(&self, path: &str, value: &Value) {
        if let Some(delegate) = self.delegate()
            && delegate.notify_path_upward(self, path, value)
        {
            return;
        }
        self.fire(
            &change_event_name(model_for_path(path)),
            EventDetail::with_path(path, value.clone()),
            false,
        );
    }

    /// Installs the path delegate.
    pub fn set_path_delegate(&self, delegate: Rc<dyn PathDelegate>) {
        *self.0.delegate.borrow_mut() = Some(delegate);
    }

    fn delegate(&self) -> Option<Rc<dyn PathDelegate>> {
        self.0.delegate.borrow().clone()
    }

    /// Installs the callback used by [`Element::forward_parent_prop`].
    pub fn set_parent_prop_forwarder(&self, forwarder: Option<ParentPropFn>) {
        *self.0.parent_prop_forwarder.borrow_mut() = forwarder;
    }

    /// Forwards a parent property change to the installed callback.
    pub fn forward_parent_prop(&self, property: &str, value: &Value) {
        let forwarder = self.0.parent_prop_forwarder.borrow().clone();
        match forwarder {
            Some(forward) => forward(property, value),
            None => trace!(property, "no parent property forwarder"),
        }
    }

    /// The element whose content stamped this one.
    #[must_use]
    pub fn data_host(&self) -> Option<Self> {
        self.0.data_host.borrow().as_ref().and_then(WeakElement::upgrade)
    }

    /// The host on which handlers and methods missing from this element's
    /// model are resolved.
    #[must_use]
    pub fn root_data_host(&self) -> Option<Self> {
        self.0
            .root_data_host
            .borrow()
            .as_ref()
            .and_then(WeakElement::upgrade)
    }

    /// Sets the root data host.
    pub fn set_root_data_host(&self, host: Option<&Self>) {
        *self.0.root_data_host.borrow_mut() = host.map(Self::downgrade);
    }

    /// Registers this element as a client of `host`.
    ///
    /// The element becomes ready only once `host` has readied its clients.
    /// A host that already has is recorded as data host only.
    pub fn attach_to_host(&self, host: &Self) {
        *self.0.data_host.borrow_mut() = Some(host.downgrade());
        if !host.0.clients_readied.get() {
            host.0.clients.borrow_mut().push(self.downgrade());
        }
    }

    /// Stores the initial configuration applied by [`Element::apply_config`].
    pub fn setup_configure(&self, config: Object) {
        *self.0.config.borrow_mut() = Some(config);
    }

    /// Applies the stored configuration.
    ///
    /// Only properties that are still undefined are written, through their
    /// accessors so their effects run.
    pub fn apply_config(&self) {
        let Some(config) = self.0.config.borrow().clone() else {
            return;
        };
        for (property, value) in config.entries() {
            if !self.get(&property).is_undefined() {
                continue;
            }
            let accessor = self.accessor(&property);
            self.property_set(&property, value, accessor.as_ref().map(Accessor::effects));
        }
    }

    /// Whether [`Element::ready`] has run.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.0.ready.get()
    }

    /// Becomes ready now if the data host has already readied its clients.
    pub fn try_ready(&self) {
        let can_ready = self
            .data_host()
            .is_none_or(|host| host.0.clients_readied.get());
        if can_ready {
            self.ready();
        } else {
            debug!(model = self.0.model.name(), "deferring ready until host is ready");
        }
    }

    /// Marks this element ready, readies its clients, and calls its `ready`
    /// method if one resolves.
    pub fn ready(&self) {
        if self.is_ready() {
            return;
        }
        self.0.clients_readied.set(true);
        let clients = core::mem::take(&mut *self.0.clients.borrow_mut());
        for client in clients.iter().filter_map(WeakElement::upgrade) {
            client.ready();
        }
        self.0.ready.set(true);
        if let Some(ready) = self.0.model.method("ready").cloned() {
            ready(self, &[]);
        }
    }

    /// Resolves a method on this element's model, then on the root data host.
    #[must_use]
    pub fn resolve_method(&self, name: &str) -> Option<Method> {
        if let Some(method) = self.0.model.method(name) {
            return Some(method.clone());
        }
        self.root_data_host()
            .and_then(|host| host.0.model.method(name).cloned())
    }

    /// Resolves an event handler on this element's model.
    #[must_use]
    pub fn handler(&self, name: &str) -> Option<Handler> {
        self.0.model.handler(name).cloned()
    }

    /// Calls a method resolved with [`Element::resolve_method`].
    ///
    /// Returns `None` and logs a warning if no method resolves.
    pub fn call_method(&self, name: &str, args: &[Value]) -> Option<Value> {
        match self.resolve_method(name) {
            Some(method) => Some(method(self, args)),
            None => {
                warn!(method = name, model = self.0.model.name(), "method is not defined");
                None
            }
        }
    }

    /// Listens for `event` on `node` and calls the named handler.
    ///
    /// Handlers are resolved at dispatch time on the root data host if there
    /// is one, otherwise on this element.
    pub fn listen(&self, node: &Node, event: &str, handler: &str) {
        let host = self.root_data_host().unwrap_or_else(|| self.clone()).downgrade();
        let handler = handler.to_string();
        node.add_event_listener(event, move |event, _| {
            let Some(host) = host.upgrade() else { return };
            match host.handler(&handler) {
                Some(callback) => callback(&host, event),
                None => warn!(
                    handler = handler.as_str(),
                    event = event.name(),
                    "listener method not defined"
                ),
            }
        });
    }

    /// Clones the children of `content` into the host node.
    pub fn stamp_content(&self, content: &Node) {
        for child in content.children() {
            self.0.node.append_child(child.deep_clone());
        }
    }

    /// Resolves each note's node within the stamped content.
    ///
    /// Node `i` of the result corresponds to `notes[i]`.
    pub fn marshal_annotated_nodes(&self, notes: &[AnnotationNote]) {
        let descendants = self.0.node.descendants();
        let nodes = notes
            .iter()
            .map(|note| match descendants.get(note.node_index) {
                Some(node) => node.clone(),
                None => {
                    warn!(index = note.node_index, "annotated node not found in content");
                    Node::new("#missing")
                }
            })
            .collect();
        self.set_nodes(nodes);
    }

    /// Wires listener bindings and applies the initial configuration.
    pub fn marshal_instance_effects(&self) {
        listener::setup_bind_listeners(self);
        self.apply_config();
    }

    /// Wires the declarative event handlers of `notes`.
    pub fn marshal_annotated_listeners(&self, notes: &[AnnotationNote]) {
        for (index, note) in notes.iter().enumerate() {
            let Some(node) = self.node_at(index) else { continue };
            for event in &note.events {
                self.listen(&node, &event.name, &event.handler);
            }
        }
    }

    /// Replaces the annotated node list.
    pub fn set_nodes(&self, nodes: Vec<Node>) {
        *self.0.nodes.borrow_mut() = nodes;
    }

    /// The annotated node at `index`.
    #[must_use]
    pub fn node_at(&self, index: usize) -> Option<Node> {
        self.0.nodes.borrow().get(index).cloned()
    }

    /// Runs the model's prep-element hook on `node`.
    pub fn prep_element(&self, node: &Node) {
        if let Some(hook) = self.0.model.prep_element() {
            hook(node);
        }
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("model", &self.0.model.name())
            .field("values", &self.0.data.borrow().len())
            .field("ready", &self.0.ready.get())
            .finish_non_exhaustive()
    }
}
