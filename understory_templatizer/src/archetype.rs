// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Archetypes: the compiled, shared description of stamped instances.

use alloc::rc::Rc;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::cell::OnceCell;
use core::fmt;

use tracing::{debug, warn};
use understory_bind::{Accessor, AnnotationNote, Model, Node, model_for_path, prepare_model};

use crate::forward::{PARENT_SCOPE, parent_prop_accessor};
use crate::template::{AnnotationParser, TemplateContent};

/// Name of the model shared by stamped instances.
pub const INSTANCE_MODEL_NAME: &str = "template-instance";

/// A compiled template.
///
/// Holds the instance model with every effect and accessor installed, the
/// annotation notes used to find bound nodes in each stamped copy, and the
/// parent properties the content reads.
pub struct Archetype {
    model: Rc<Model>,
    fragment: Option<Node>,
    notes: Rc<[AnnotationNote]>,
    parent_props: Option<Rc<[String]>>,
    parent_prop_accessors: OnceCell<Rc<[Accessor]>>,
}

impl Archetype {
    /// Compiles `content`.
    ///
    /// Notes already cached on the content are reused; otherwise `parser`
    /// produces them and they are cached. Missing content yields an archetype
    /// that stamps nothing.
    pub(crate) fn compile(
        content: Option<&TemplateContent>,
        parser: Option<&dyn AnnotationParser>,
        prep_element: Option<&dyn Fn(&Node)>,
    ) -> Self {
        let mut model = prepare_model(INSTANCE_MODEL_NAME);
        let Some(content) = content else {
            warn!("templatizing a template with no content");
            model.create_bindings();
            return Self {
                model: Rc::new(model),
                fragment: None,
                notes: Rc::from(Vec::new()),
                parent_props: None,
                parent_prop_accessors: OnceCell::new(),
            };
        };

        let notes = prep_annotations(content, parser, prep_element);
        for behavior in content.behaviors() {
            model.add_behavior(behavior);
        }
        model.add_annotation_effects(&notes);
        model.create_bindings();

        let parent_props = content
            .parent_props()
            .or_else(|| derive_parent_props(&notes));
        debug!(
            notes = notes.len(),
            parent_props = parent_props.as_ref().map_or(0, |p| p.len()),
            "compiled template archetype"
        );
        Self {
            model: Rc::new(model),
            fragment: Some(content.fragment().clone()),
            notes,
            parent_props,
            parent_prop_accessors: OnceCell::new(),
        }
    }

    /// The instance model.
    #[inline]
    #[must_use]
    pub fn model(&self) -> &Rc<Model> {
        &self.model
    }

    /// The content fragment cloned into each instance.
    #[inline]
    #[must_use]
    pub fn fragment(&self) -> Option<&Node> {
        self.fragment.as_ref()
    }

    /// Annotation notes, one per bound node.
    #[inline]
    #[must_use]
    pub fn notes(&self) -> &[AnnotationNote] {
        &self.notes
    }

    /// Parent properties read by the content.
    #[must_use]
    pub fn parent_props(&self) -> Option<&[String]> {
        self.parent_props.as_deref()
    }

    pub(crate) fn shared_parent_props(&self) -> Option<Rc<[String]>> {
        self.parent_props.clone()
    }

    /// One `_parent_<prop>` accessor per parent property, built on first use
    /// and shared afterwards.
    pub(crate) fn parent_prop_accessors(&self) -> Rc<[Accessor]> {
        self.parent_prop_accessors
            .get_or_init(|| {
                self.parent_props
                    .iter()
                    .flat_map(|props| props.iter())
                    .map(|prop| parent_prop_accessor(prop))
                    .collect()
            })
            .clone()
    }
}

impl fmt::Debug for Archetype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Archetype")
            .field("model", &self.model.name())
            .field("notes", &self.notes.len())
            .field("parent_props", &self.parent_props)
            .finish_non_exhaustive()
    }
}

fn prep_annotations(
    content: &TemplateContent,
    parser: Option<&dyn AnnotationParser>,
    prep_element: Option<&dyn Fn(&Node)>,
) -> Rc<[AnnotationNote]> {
    if let Some(notes) = content.notes() {
        return notes;
    }
    match parser {
        Some(parser) => content.cache_parse(parser.parse_annotations(content.fragment(), prep_element)),
        None => {
            warn!("template content has no notes and no annotation parser was given");
            Rc::from(Vec::new())
        }
    }
}

/// Parent properties referenced as `parent.<prop>` by the notes, in first-use
/// order.
fn derive_parent_props(notes: &[AnnotationNote]) -> Option<Rc<[String]>> {
    let mut props: Vec<String> = Vec::new();
    let paths = notes
        .iter()
        .flat_map(|note| note.bindings.iter())
        .flat_map(|binding| binding.paths());
    for path in paths {
        let Some(rest) = path
            .strip_prefix(PARENT_SCOPE)
            .and_then(|rest| rest.strip_prefix('.'))
        else {
            continue;
        };
        let prop = model_for_path(rest);
        if !prop.is_empty() && !props.iter().any(|p| p == prop) {
            props.push(prop.to_string());
        }
    }
    (!props.is_empty()).then(|| props.into())
}
