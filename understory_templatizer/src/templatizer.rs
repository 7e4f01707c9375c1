// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The templatizer: compiles a template once and stamps instances from it.

use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use tracing::debug;
use understory_bind::{Element, Node, Object, Value};

use crate::archetype::Archetype;
use crate::forward::{
    HostPathDelegate, PARENT_SCOPE, ParentPropForwarder, extend_template, parent_prop_name,
};
use crate::instance::TemplateInstance;
use crate::template::{AnnotationParser, Template};

/// Error returned by [`Templatizer::stamp`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TemplatizeError {
    /// [`Templatizer::templatize`] has not been called.
    NotTemplatized,
}

impl fmt::Display for TemplatizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotTemplatized => f.write_str("stamp called before templatize"),
        }
    }
}

impl core::error::Error for TemplatizeError {}

/// Compiles templates for a host element and stamps instances from them.
///
/// The host is the element that owns the stamped instances; instances become
/// its clients and are readied with it. Handlers and methods not found on the
/// instance model resolve on the host's root data host.
pub struct Templatizer {
    host: Element,
    template: Option<Template>,
    archetype: Option<Rc<Archetype>>,
    parent_props: Option<Rc<[String]>>,
    forwarder: Option<Rc<dyn ParentPropForwarder>>,
    parser: Option<Rc<dyn AnnotationParser>>,
}

impl Templatizer {
    /// A templatizer stamping on behalf of `host`.
    #[must_use]
    pub fn new(host: Element) -> Self {
        Self {
            host,
            template: None,
            archetype: None,
            parent_props: None,
            forwarder: None,
            parser: None,
        }
    }

    /// Enables parent property forwarding through `forwarder`.
    ///
    /// Without a forwarder, parent properties are not wired.
    #[must_use]
    pub fn with_forwarder(mut self, forwarder: Rc<dyn ParentPropForwarder>) -> Self {
        self.forwarder = Some(forwarder);
        self
    }

    /// Parses template content that carries no notes yet.
    #[must_use]
    pub fn with_parser(mut self, parser: Rc<dyn AnnotationParser>) -> Self {
        self.parser = Some(parser);
        self
    }

    /// The host element.
    #[inline]
    #[must_use]
    pub fn host(&self) -> &Element {
        &self.host
    }

    /// The templatized template, if any.
    #[must_use]
    pub fn template(&self) -> Option<&Template> {
        self.template.as_ref()
    }

    /// The archetype, once templatized.
    #[must_use]
    pub fn archetype(&self) -> Option<&Rc<Archetype>> {
        self.archetype.as_ref()
    }

    /// Parent properties read by the template content.
    #[must_use]
    pub fn parent_props(&self) -> Option<&[String]> {
        self.parent_props.as_deref()
    }

    /// The outermost host: the host's data host, or that data host's own
    /// root if it is itself a stamped instance.
    ///
    /// This is a single hop, not a walk of the whole data host chain: it stops
    /// at the first host that is not a stamped instance.
    #[must_use]
    pub fn root_data_host(&self) -> Option<Element> {
        self.host
            .data_host()
            .map(|data_host| data_host.root_data_host().unwrap_or(data_host))
    }

    /// Compiles `template`, or reuses the archetype already compiled for its
    /// content.
    ///
    /// Parent property wiring runs on every call, so a second templatizer of
    /// shared content wires its own template element.
    pub fn templatize(&mut self, template: &Template) {
        self.template = Some(template.clone());
        if let Some(archetype) = template.content().and_then(|c| c.archetype()) {
            debug!("reusing compiled archetype");
            self.prep_parent_properties(&archetype);
            self.archetype = Some(archetype);
            return;
        }

        let root = self.root_data_host();
        let prep = root.map(|root| move |node: &Node| root.prep_element(node));
        let archetype = Rc::new(Archetype::compile(
            template.content().map(|c| &**c),
            self.parser.as_deref(),
            prep.as_ref().map(|f| f as &dyn Fn(&Node)),
        ));
        self.prep_parent_properties(&archetype);
        if let Some(content) = template.content() {
            content.set_compiled(archetype.clone());
        }
        self.archetype = Some(archetype);
    }

    fn prep_parent_properties(&mut self, archetype: &Archetype) {
        self.parent_props = archetype.shared_parent_props();
        let (Some(forwarder), Some(_)) = (&self.forwarder, &self.parent_props) else {
            return;
        };
        let Some(template) = &self.template else {
            return;
        };
        let target = template.element();
        let forwarding = forwarder.clone();
        target.set_parent_prop_forwarder(Some(Rc::new(move |prop: &str, value: &Value| {
            forwarding.forward_parent_prop(prop, value);
        })));
        extend_template(target, &archetype.parent_prop_accessors());
        self.host
            .set_path_delegate(Rc::new(HostPathDelegate::new(forwarder.clone())));
    }

    /// Stamps a new instance.
    ///
    /// When the content reads parent properties, the model's `parent` object
    /// (created if missing) is filled with the template element's current
    /// `_parent_<prop>` values.
    pub fn stamp(&self, model: Option<Object>) -> Result<TemplateInstance, TemplatizeError> {
        let archetype = self
            .archetype
            .as_ref()
            .ok_or(TemplatizeError::NotTemplatized)?;
        let model = model.unwrap_or_default();
        if let Some(props) = &self.parent_props {
            let parent = match model.get(PARENT_SCOPE) {
                Value::Object(parent) => parent,
                _ => Object::new(),
            };
            let source = self.template.as_ref().map(Template::element);
            for prop in props.iter() {
                let value = source
                    .map(|template| template.get(&parent_prop_name(prop)))
                    .unwrap_or_default();
                parent.set(prop.as_str(), value);
            }
            model.set(PARENT_SCOPE, parent);
        }
        let root = self.root_data_host();
        Ok(TemplateInstance::construct(
            archetype,
            model,
            &self.host,
            root.as_ref(),
            self.forwarder.clone(),
        ))
    }
}

/// Embedder-supplied view of the nodes a host has stamped.
pub trait StampedChildren {
    /// Nodes stamped directly by this host, in order.
    fn stamped_children(&self) -> Vec<Node>;

    /// The stamped children of `child`, if it is itself a stamping host.
    fn nested(&self, child: &Node) -> Option<Rc<dyn StampedChildren>> {
        let _ = child;
        None
    }
}

impl Templatizer {
    /// Every node stamped by `source`, followed in place by the nodes
    /// stamped by any nested stamping host among them.
    #[must_use]
    pub fn all_stamped_children(source: &dyn StampedChildren) -> Vec<Node> {
        let mut children = Vec::new();
        collect_stamped(source, &mut children);
        children
    }
}

fn collect_stamped(source: &dyn StampedChildren, children: &mut Vec<Node>) {
    for child in source.stamped_children() {
        let nested = source.nested(&child);
        children.push(child);
        if let Some(nested) = nested {
            collect_stamped(&*nested, children);
        }
    }
}

impl fmt::Debug for Templatizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Templatizer")
            .field("host", &self.host)
            .field("archetype", &self.archetype)
            .field("parent_props", &self.parent_props)
            .field("forwarding", &self.forwarder.is_some())
            .finish_non_exhaustive()
    }
}
