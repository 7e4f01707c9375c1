// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Templates and their content.

use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;

use understory_bind::{AnnotationNote, Behavior, Element, Model, Node};

use crate::archetype::Archetype;

/// Result of parsing template content.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParsedAnnotations {
    /// One note per annotated node, in document order.
    pub notes: Vec<AnnotationNote>,
    /// Properties the content reads from its parent scope, if the parser
    /// tracks them.
    pub parent_props: Option<Vec<String>>,
}

/// Parses template content into annotation notes.
///
/// Implementations call `prep_element` on each annotated node, if given.
pub trait AnnotationParser {
    /// Parses `content`.
    fn parse_annotations(
        &self,
        content: &Node,
        prep_element: Option<&dyn Fn(&Node)>,
    ) -> ParsedAnnotations;
}

/// Compilation state of template content.
#[derive(Clone, Debug, Default)]
pub enum ArchetypeState {
    /// No archetype has been built yet.
    #[default]
    Uncompiled,
    /// The archetype shared by every templatizer of this content.
    Compiled(Rc<Archetype>),
}

/// The inert content of a template.
///
/// Content is shared: the compiled archetype and parsed notes are cached here
/// so every templatizer of the same content reuses them.
pub struct TemplateContent {
    fragment: Node,
    notes: RefCell<Option<Rc<[AnnotationNote]>>>,
    parent_props: RefCell<Option<Rc<[String]>>>,
    behaviors: Vec<Behavior>,
    state: RefCell<ArchetypeState>,
}

impl TemplateContent {
    /// Content with the given fragment and nothing parsed yet.
    #[must_use]
    pub fn new(fragment: Node) -> Self {
        Self {
            fragment,
            notes: RefCell::new(None),
            parent_props: RefCell::new(None),
            behaviors: Vec::new(),
            state: RefCell::new(ArchetypeState::Uncompiled),
        }
    }

    /// Supplies already parsed notes.
    #[must_use]
    pub fn with_notes(self, notes: Vec<AnnotationNote>) -> Self {
        *self.notes.borrow_mut() = Some(notes.into());
        self
    }

    /// Supplies the parent properties read by the content.
    #[must_use]
    pub fn with_parent_props<I, S>(self, props: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let props: Vec<String> = props.into_iter().map(Into::into).collect();
        *self.parent_props.borrow_mut() = Some(props.into());
        self
    }

    /// Adds a behavior applied to stamped instances.
    #[must_use]
    pub fn with_behavior(mut self, behavior: Behavior) -> Self {
        self.behaviors.push(behavior);
        self
    }

    /// The content fragment.
    #[inline]
    #[must_use]
    pub fn fragment(&self) -> &Node {
        &self.fragment
    }

    /// Parsed notes, if parsing has happened.
    #[must_use]
    pub fn notes(&self) -> Option<Rc<[AnnotationNote]>> {
        self.notes.borrow().clone()
    }

    /// Parent properties, if known.
    #[must_use]
    pub fn parent_props(&self) -> Option<Rc<[String]>> {
        self.parent_props.borrow().clone()
    }

    /// Behaviors applied to stamped instances.
    #[must_use]
    pub fn behaviors(&self) -> &[Behavior] {
        &self.behaviors
    }

    /// The compiled archetype, if any.
    #[must_use]
    pub fn archetype(&self) -> Option<Rc<Archetype>> {
        match &*self.state.borrow() {
            ArchetypeState::Compiled(archetype) => Some(archetype.clone()),
            ArchetypeState::Uncompiled => None,
        }
    }

    /// Whether an archetype has been compiled for this content.
    #[must_use]
    pub fn is_compiled(&self) -> bool {
        matches!(&*self.state.borrow(), ArchetypeState::Compiled(_))
    }

    pub(crate) fn cache_parse(&self, parsed: ParsedAnnotations) -> Rc<[AnnotationNote]> {
        let notes: Rc<[AnnotationNote]> = parsed.notes.into();
        *self.notes.borrow_mut() = Some(notes.clone());
        if let Some(props) = parsed.parent_props {
            *self.parent_props.borrow_mut() = Some(props.into());
        }
        notes
    }

    pub(crate) fn set_compiled(&self, archetype: Rc<Archetype>) {
        *self.state.borrow_mut() = ArchetypeState::Compiled(archetype);
    }
}

impl fmt::Debug for TemplateContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateContent")
            .field("fragment", &self.fragment)
            .field("notes", &self.notes.borrow().as_ref().map(|n| n.len()))
            .field("behaviors", &self.behaviors.len())
            .field("compiled", &self.is_compiled())
            .finish_non_exhaustive()
    }
}

/// A template element and its content.
///
/// Cloning shares both the element and the content.
#[derive(Clone, Debug)]
pub struct Template {
    element: Element,
    content: Option<Rc<TemplateContent>>,
}

impl Template {
    /// A template element holding `content`.
    #[must_use]
    pub fn new(content: TemplateContent) -> Self {
        Self::from_shared(Rc::new(content))
    }

    /// A template element referencing content shared with other templates.
    #[must_use]
    pub fn from_shared(content: Rc<TemplateContent>) -> Self {
        Self::on_element(template_element(), Some(content))
    }

    /// A template element with no content.
    #[must_use]
    pub fn without_content() -> Self {
        Self::on_element(template_element(), None)
    }

    /// Uses an existing element as the template element.
    #[must_use]
    pub fn on_element(element: Element, content: Option<Rc<TemplateContent>>) -> Self {
        Self { element, content }
    }

    /// The template element.
    #[inline]
    #[must_use]
    pub fn element(&self) -> &Element {
        &self.element
    }

    /// The content, if any.
    #[inline]
    #[must_use]
    pub fn content(&self) -> Option<&Rc<TemplateContent>> {
        self.content.as_ref()
    }
}

fn template_element() -> Element {
    Element::new(Rc::new(Model::new("template")))
}
