// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A minimal node tree with attributes, properties, and event listeners.
//!
//! Bindings need somewhere to write: text content, attributes, and node
//! properties. Nodes form a tree through parent and child links, carry a
//! small per-node listener store, and dispatch events along the parent chain
//! when an event bubbles.
//!
//! A node may host an [`Element`]. Property reads and writes on such a node go
//! through the element's accessors, which is how a binding on an outer
//! element reaches the properties of an inner one.

use alloc::collections::BTreeMap;
use alloc::rc::{Rc, Weak};
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::fmt;

use hashbrown::HashMap;
use smallvec::SmallVec;

use crate::element::{Element, WeakElement};
use crate::value::Value;

/// Property name that addresses a node's text content.
pub const TEXT_CONTENT: &str = "textContent";

type ListenerFn = Rc<dyn Fn(&Event, &Node)>;

#[derive(Clone)]
struct Listener {
    event: String,
    callback: ListenerFn,
}

struct NodeData {
    name: String,
    text: RefCell<String>,
    attributes: RefCell<BTreeMap<String, String>>,
    properties: RefCell<HashMap<String, Value>>,
    children: RefCell<Vec<Node>>,
    parent: RefCell<Weak<Self>>,
    listeners: RefCell<SmallVec<[Listener; 2]>>,
    element: RefCell<Option<WeakElement>>,
    style_scoped: Cell<bool>,
}

/// A shared handle to a node.
#[derive(Clone)]
pub struct Node(Rc<NodeData>);

impl Node {
    /// Creates an element node named `name`.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self(Rc::new(NodeData {
            name: name.to_string(),
            text: RefCell::new(String::new()),
            attributes: RefCell::new(BTreeMap::new()),
            properties: RefCell::new(HashMap::new()),
            children: RefCell::new(Vec::new()),
            parent: RefCell::new(Weak::new()),
            listeners: RefCell::new(SmallVec::new()),
            element: RefCell::new(None),
            style_scoped: Cell::new(false),
        }))
    }

    /// Creates a text node.
    #[must_use]
    pub fn text(content: &str) -> Self {
        let node = Self::new("#text");
        *node.0.text.borrow_mut() = content.to_string();
        node
    }

    /// Creates an empty document fragment.
    #[must_use]
    pub fn fragment() -> Self {
        Self::new("#document-fragment")
    }

    /// Node name.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Returns `true` if both handles refer to the same node.
    #[inline]
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Appends `child`, returning `self` for chaining.
    pub fn append_child(&self, child: Self) -> &Self {
        *child.0.parent.borrow_mut() = Rc::downgrade(&self.0);
        self.0.children.borrow_mut().push(child);
        self
    }

    /// Adds `child` and returns `self` by value.
    #[must_use]
    pub fn with_child(self, child: Self) -> Self {
        self.append_child(child);
        self
    }

    /// Snapshot of the direct children.
    #[must_use]
    pub fn children(&self) -> Vec<Self> {
        self.0.children.borrow().clone()
    }

    /// The parent node, if attached.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        self.0.parent.borrow().upgrade().map(Self)
    }

    /// All descendants in pre-order, excluding `self`.
    #[must_use]
    pub fn descendants(&self) -> Vec<Self> {
        let mut out = Vec::new();
        let mut stack: Vec<Self> = self.children().into_iter().rev().collect();
        while let Some(node) = stack.pop() {
            stack.extend(node.children().into_iter().rev());
            out.push(node);
        }
        out
    }

    /// Own text followed by the text of all descendants.
    #[must_use]
    pub fn text_content(&self) -> String {
        let mut out = self.0.text.borrow().clone();
        for child in self.children() {
            out.push_str(&child.text_content());
        }
        out
    }

    /// Replaces all children with the given text.
    pub fn set_text_content(&self, text: &str) {
        for child in self.0.children.borrow_mut().drain(..) {
            *child.0.parent.borrow_mut() = Weak::new();
        }
        *self.0.text.borrow_mut() = text.to_string();
    }

    /// Attribute value, if present.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<String> {
        self.0.attributes.borrow().get(name).cloned()
    }

    /// Returns `true` if the attribute is present.
    #[must_use]
    pub fn has_attribute(&self, name: &str) -> bool {
        self.0.attributes.borrow().contains_key(name)
    }

    /// Sets an attribute.
    pub fn set_attribute(&self, name: &str, value: &str) {
        self.0
            .attributes
            .borrow_mut()
            .insert(name.to_string(), value.to_string());
    }

    /// Removes an attribute.
    pub fn remove_attribute(&self, name: &str) {
        self.0.attributes.borrow_mut().remove(name);
    }

    /// Reads a property.
    ///
    /// [`TEXT_CONTENT`] reads the text content. On a node hosting an element
    /// the element's value is returned.
    #[must_use]
    pub fn property(&self, name: &str) -> Value {
        if name == TEXT_CONTENT {
            return Value::from(self.text_content());
        }
        if let Some(element) = self.element() {
            return element.get(name);
        }
        self.0
            .properties
            .borrow()
            .get(name)
            .cloned()
            .unwrap_or_default()
    }

    /// Writes a property.
    ///
    /// [`TEXT_CONTENT`] replaces the text content. On a node hosting an
    /// element the write goes through the element's public setter.
    pub fn set_property(&self, name: &str, value: Value) {
        if name == TEXT_CONTENT {
            self.set_text_content(&value.to_display_string());
            return;
        }
        if let Some(element) = self.element() {
            element.set(name, value);
            return;
        }
        self.0
            .properties
            .borrow_mut()
            .insert(name.to_string(), value);
    }

    /// The element hosted by this node, if any.
    #[must_use]
    pub fn element(&self) -> Option<Element> {
        self.0.element.borrow().as_ref().and_then(WeakElement::upgrade)
    }

    pub(crate) fn host(&self, element: &Element) {
        *self.0.element.borrow_mut() = Some(element.downgrade());
    }

    /// Whether style scoping has been applied to this node.
    #[must_use]
    pub fn is_style_scoped(&self) -> bool {
        self.0.style_scoped.get()
    }

    /// Marks this node as style scoped.
    pub fn mark_style_scoped(&self) {
        self.0.style_scoped.set(true);
    }

    /// Adds a listener for `event`.
    ///
    /// The callback receives the event and the node it is attached to.
    pub fn add_event_listener(&self, event: &str, callback: impl Fn(&Event, &Self) + 'static) {
        self.0.listeners.borrow_mut().push(Listener {
            event: event.to_string(),
            callback: Rc::new(callback),
        });
    }

    /// Number of listeners registered for `event`.
    #[must_use]
    pub fn listener_count(&self, event: &str) -> usize {
        self.0
            .listeners
            .borrow()
            .iter()
            .filter(|l| l.event == event)
            .count()
    }

    /// Dispatches `event` at this node, then along the parent chain if it
    /// bubbles.
    pub fn dispatch_event(&self, event: &Event) {
        let mut current = Some(self.clone());
        while let Some(node) = current {
            node.invoke_listeners(event);
            if !event.bubbles() {
                break;
            }
            current = node.parent();
        }
    }

    fn invoke_listeners(&self, event: &Event) {
        // Listeners may add listeners or dispatch further events.
        let callbacks: SmallVec<[ListenerFn; 2]> = self
            .0
            .listeners
            .borrow()
            .iter()
            .filter(|l| l.event == event.name())
            .map(|l| l.callback.clone())
            .collect();
        for callback in callbacks {
            callback(event, self);
        }
    }

    /// Clones this node and its subtree.
    ///
    /// Name, text, and attributes are copied. Properties, listeners, and
    /// hosted elements are not.
    #[must_use]
    pub fn deep_clone(&self) -> Self {
        let copy = Self::new(&self.0.name);
        copy.0.text.borrow_mut().clone_from(&self.0.text.borrow());
        copy.0
            .attributes
            .borrow_mut()
            .clone_from(&self.0.attributes.borrow());
        for child in self.children() {
            copy.append_child(child.deep_clone());
        }
        copy
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("name", &self.0.name)
            .field("attributes", &self.0.attributes.borrow())
            .field("children", &self.0.children.borrow().len())
            .finish_non_exhaustive()
    }
}

/// Payload of an event.
#[derive(Clone, Debug, Default)]
pub struct EventDetail {
    value: Value,
    path: Option<String>,
}

impl EventDetail {
    /// A detail carrying only a value.
    #[must_use]
    pub fn with_value(value: Value) -> Self {
        Self { value, path: None }
    }

    /// A detail carrying a changed path and its value.
    #[must_use]
    pub fn with_path(path: &str, value: Value) -> Self {
        Self {
            value,
            path: Some(path.to_string()),
        }
    }

    /// The carried value.
    #[inline]
    #[must_use]
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// The changed path, for path notifications.
    #[inline]
    #[must_use]
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }
}

/// An event in flight.
#[derive(Clone, Debug)]
pub struct Event {
    name: String,
    origin: Node,
    detail: EventDetail,
    bubbles: bool,
}

impl Event {
    /// A non-bubbling event named `name` originating at `origin`.
    #[must_use]
    pub fn new(name: &str, origin: Node) -> Self {
        Self {
            name: name.to_string(),
            origin,
            detail: EventDetail::default(),
            bubbles: false,
        }
    }

    /// Sets the detail.
    #[must_use]
    pub fn with_detail(mut self, detail: EventDetail) -> Self {
        self.detail = detail;
        self
    }

    /// Sets whether the event bubbles.
    #[must_use]
    pub fn with_bubbles(mut self, bubbles: bool) -> Self {
        self.bubbles = bubbles;
        self
    }

    /// Event name.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The node the event was dispatched from.
    #[inline]
    #[must_use]
    pub fn origin(&self) -> &Node {
        &self.origin
    }

    /// The payload.
    #[inline]
    #[must_use]
    pub fn detail(&self) -> &EventDetail {
        &self.detail
    }

    /// Whether the event propagates to ancestors.
    #[inline]
    #[must_use]
    pub fn bubbles(&self) -> bool {
        self.bubbles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn names(nodes: &[Node]) -> Vec<&str> {
        nodes.iter().map(Node::name).collect()
    }

    #[test]
    fn descendants_are_pre_order() {
        let root = Node::fragment()
            .with_child(Node::new("a").with_child(Node::new("b")))
            .with_child(Node::new("c"));
        let all = root.descendants();
        assert_eq!(names(&all), vec!["a", "b", "c"]);
    }

    #[test]
    fn text_content_replaces_children() {
        let div = Node::new("div").with_child(Node::text("hello "));
        div.append_child(Node::text("world"));
        assert_eq!(div.text_content(), "hello world");
        div.set_property(TEXT_CONTENT, Value::from(42));
        assert_eq!(div.text_content(), "42");
        assert!(div.children().is_empty());
    }

    #[test]
    fn deep_clone_copies_structure_not_listeners() {
        let src = Node::new("div").with_child(Node::new("span"));
        src.set_attribute("id", "x");
        src.add_event_listener("tap", |_, _| {});
        let copy = src.deep_clone();
        assert!(!copy.ptr_eq(&src));
        assert_eq!(copy.attribute("id").as_deref(), Some("x"));
        assert_eq!(copy.children().len(), 1);
        assert_eq!(copy.listener_count("tap"), 0);
        assert!(copy.children()[0].parent().unwrap().ptr_eq(&copy));
    }

    #[test]
    fn bubbling_reaches_ancestors_only_when_requested() {
        let parent = Node::new("div");
        let child = Node::new("span");
        parent.append_child(child.clone());

        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        parent.add_event_listener("ping", move |_, _| h.set(h.get() + 1));

        child.dispatch_event(&Event::new("ping", child.clone()));
        assert_eq!(hits.get(), 0);
        child.dispatch_event(&Event::new("ping", child.clone()).with_bubbles(true));
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn listeners_see_their_own_node() {
        let node = Node::new("input");
        let seen = Rc::new(RefCell::new(None));
        let s = seen.clone();
        node.add_event_listener("change", move |event, current| {
            *s.borrow_mut() = Some((event.name().to_string(), current.clone()));
        });
        node.dispatch_event(&Event::new("change", node.clone()));
        let (name, current) = seen.borrow_mut().take().unwrap();
        assert_eq!(name, "change");
        assert!(current.ptr_eq(&node));
    }

    #[test]
    fn plain_properties_are_stored_on_the_node() {
        let node = Node::new("input");
        assert!(node.property("value").is_undefined());
        node.set_property("value", Value::from("x"));
        assert_eq!(node.property("value"), Value::from("x"));
    }
}
