// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Effect handlers.
//!
//! [`apply_effect`] routes an effect to its handler by kind. Path changes go
//! through [`run_path_effects`], which only runs the effects of the changed
//! root that depend on the changed path.

use alloc::vec::Vec;

use tracing::trace;

use crate::annotations::BindingKind;
use crate::case_map::camel_to_dash_case;
use crate::dom::{Node, TEXT_CONTENT};
use crate::effect::{
    AnnotationEffect, BindingTarget, ComplexObserverEffect, ComputeEffect,
    ComputedAnnotationEffect, Effect, EffectArg, ObserverEffect, Signature,
};
use crate::element::Element;
use crate::path::{fix_path, is_descendant, model_for_path, path_matches};
use crate::value::Value;

/// Runs one effect for a change of `property` from `old` to `value`.
pub(crate) fn apply_effect(
    element: &Element,
    property: &str,
    value: &Value,
    effect: &Effect,
    old: &Value,
) {
    trace!(property, kind = %effect.kind(), "applying effect");
    match effect {
        Effect::Compute(fx) => compute_effect(element, fx),
        Effect::Annotation(fx) => annotation_effect(element, property, value, fx),
        Effect::ComputedAnnotation(fx) => computed_annotation_effect(element, fx),
        Effect::Reflect => reflect_effect(element, property),
        Effect::Notify => element.notify_change(property),
        Effect::Observer(fx) => observer_effect(element, value, old, fx),
        Effect::ComplexObserver(fx) => complex_observer_effect(element, fx),
        Effect::Function(f) => f.call(element, property, value, old),
    }
}

/// Runs the path-aware effects of `path`'s root property.
pub(crate) fn run_path_effects(element: &Element, path: &str, value: &Value) {
    let model = element.model().clone();
    let Some(effects) = model.property_effects(model_for_path(path)) else {
        return;
    };
    for effect in effects {
        match effect {
            Effect::Annotation(fx) => annotation_path_effect(element, path, value, fx),
            Effect::Compute(fx) if triggered(path, &fx.trigger) => compute_effect(element, fx),
            Effect::ComputedAnnotation(fx) if triggered(path, &fx.trigger) => {
                computed_annotation_effect(element, fx);
            }
            Effect::ComplexObserver(fx) if triggered(path, &fx.trigger) => {
                complex_observer_effect(element, fx);
            }
            _ => {}
        }
    }
}

fn triggered(path: &str, trigger: &EffectArg) -> bool {
    trigger.name().is_some_and(|name| path_matches(path, name))
}

/// Collects the argument values, or `None` if any is undefined.
fn marshal_args(element: &Element, signature: &Signature) -> Option<Vec<Value>> {
    let mut values = Vec::with_capacity(signature.args.len());
    for arg in &signature.args {
        let value = match arg {
            EffectArg::Literal(v) => v.clone(),
            EffectArg::Dependency { name, .. } => element.get_path_value(name),
        };
        if value.is_undefined() {
            trace!(method = signature.method.as_str(), "argument undefined, skipping call");
            return None;
        }
        values.push(value);
    }
    Some(values)
}

fn call_signature(element: &Element, signature: &Signature) -> Option<Value> {
    let args = marshal_args(element, signature)?;
    element.call_method(&signature.method, &args)
}

fn compute_effect(element: &Element, fx: &ComputeEffect) {
    if let Some(result) = call_signature(element, &fx.signature) {
        element.set_property(&fx.property, result);
    }
}

fn annotation_effect(element: &Element, source: &str, value: &Value, fx: &AnnotationEffect) {
    let value = if source == fx.path {
        value.clone()
    } else {
        let current = element.get_path_value(&fx.path);
        element.cache_value(&fx.path, current.clone());
        current
    };
    let value = if fx.negate {
        Value::Bool(!value.is_truthy())
    } else {
        value
    };
    apply_effect_value(element, &fx.target, value);
}

/// A change at `path` reaching an annotation bound to the same root.
///
/// Bindings at or below `path` are refreshed. Bindings above `path` forward
/// the sub-path change into the bound node's element.
fn annotation_path_effect(element: &Element, path: &str, value: &Value, fx: &AnnotationEffect) {
    if path_matches(path, &fx.path) {
        annotation_effect(element, path, value, fx);
    } else if is_descendant(&fx.path, path) && !fx.negate {
        let Some(child) = element
            .node_at(fx.target.index)
            .and_then(|node| node.element())
        else {
            return;
        };
        let child_path = fix_path(&fx.target.name, &fx.path, path);
        child.notify_path(&child_path, value.clone(), true);
    }
}

fn computed_annotation_effect(element: &Element, fx: &ComputedAnnotationEffect) {
    if let Some(result) = call_signature(element, &fx.signature) {
        apply_effect_value(element, &fx.target, result);
    }
}

fn reflect_effect(element: &Element, property: &str) {
    let value = element.get(property);
    serialize_value_to_attribute(&value, &camel_to_dash_case(property), element.node());
}

fn observer_effect(element: &Element, value: &Value, old: &Value, fx: &ObserverEffect) {
    element.call_method(&fx.method, &[value.clone(), old.clone()]);
}

fn complex_observer_effect(element: &Element, fx: &ComplexObserverEffect) {
    call_signature(element, &fx.signature);
}

/// Writes `value` into the node addressed by `target`.
fn apply_effect_value(element: &Element, target: &BindingTarget, value: Value) {
    let Some(node) = element.node_at(target.index) else {
        trace!(index = target.index, "no annotated node for binding");
        return;
    };
    match target.kind {
        BindingKind::Attribute => serialize_value_to_attribute(&value, &target.name, &node),
        BindingKind::Text | BindingKind::Property => {
            let name = if target.name.is_empty() {
                TEXT_CONTENT
            } else {
                target.name.as_str()
            };
            node.set_property(name, value);
        }
    }
}

/// Sets `attribute` on `node` from `value`, or removes it when the value
/// serializes to nothing.
pub fn serialize_value_to_attribute(value: &Value, attribute: &str, node: &Node) {
    match value.to_attribute() {
        Some(text) => node.set_attribute(attribute, &text),
        None => node.remove_attribute(attribute),
    }
}
