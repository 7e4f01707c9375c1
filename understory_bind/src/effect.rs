// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Property effects and their kinds.
//!
//! An [`Effect`] is a reaction attached to a property: when the property's
//! value changes, every effect registered for it runs, in [`EffectKind`]
//! priority order. Effects are a closed set; each variant carries the data its
//! handler needs.

use alloc::rc::Rc;
use alloc::string::{String, ToString};
use core::fmt;
use core::str::FromStr;

use smallvec::SmallVec;

use crate::annotations::BindingKind;
use crate::element::Element;
use crate::value::Value;

/// Kinds of property effects, in the order they run.
///
/// The derived ordering is the dispatch priority: computed values are
/// produced before bindings consume them, and observers run last.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EffectKind {
    /// Recomputes a computed property.
    Compute,
    /// Pushes a value into a bound node.
    Annotation,
    /// Pushes a computed value into a bound node.
    ComputedAnnotation,
    /// Serializes the value to the host's attribute.
    Reflect,
    /// Fires a `<name>-changed` event.
    Notify,
    /// Calls a single-property observer.
    Observer,
    /// Calls a multi-property observer.
    ComplexObserver,
    /// Calls an arbitrary function.
    Function,
}

impl EffectKind {
    /// All kinds, in priority order.
    pub const ALL: [Self; 8] = [
        Self::Compute,
        Self::Annotation,
        Self::ComputedAnnotation,
        Self::Reflect,
        Self::Notify,
        Self::Observer,
        Self::ComplexObserver,
        Self::Function,
    ];

    /// Canonical name of this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Compute => "compute",
            Self::Annotation => "annotation",
            Self::ComputedAnnotation => "computedAnnotation",
            Self::Reflect => "reflect",
            Self::Notify => "notify",
            Self::Observer => "observer",
            Self::ComplexObserver => "complexObserver",
            Self::Function => "function",
        }
    }
}

impl fmt::Display for EffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EffectKind {
    type Err = ParseEffectKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ParseEffectKindError {
                kind: s.to_string(),
            })
    }
}

/// Error returned when parsing an unknown effect kind name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseEffectKindError {
    /// The name that failed to parse.
    pub kind: String,
}

impl fmt::Display for ParseEffectKindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown effect kind `{}`", self.kind)
    }
}

impl core::error::Error for ParseEffectKindError {}

/// One argument of a method signature.
#[derive(Clone, Debug, PartialEq)]
pub enum EffectArg {
    /// A literal value written in the signature.
    Literal(Value),
    /// A dependency on a property or dotted path.
    Dependency {
        /// Full dotted name, e.g. `user.name`.
        name: String,
        /// `true` if the name contains a member path.
        structured: bool,
    },
}

impl EffectArg {
    /// Parses one argument.
    ///
    /// Quoted text becomes a string literal, numeric text a number literal,
    /// and anything else a dependency.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        let quoted = |q: char| text.len() >= 2 && text.starts_with(q) && text.ends_with(q);
        if quoted('\'') || quoted('"') {
            return Self::Literal(Value::from(&text[1..text.len() - 1]));
        }
        let numeric = text
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_digit() || matches!(c, '-' | '+' | '.'));
        if let Some(n) = numeric.then(|| text.parse::<f64>().ok()).flatten() {
            return Self::Literal(Value::Number(n));
        }
        Self::dependency(text)
    }

    /// A dependency on `name`.
    #[must_use]
    pub fn dependency(name: &str) -> Self {
        Self::Dependency {
            name: name.to_string(),
            structured: crate::path::is_structured(name),
        }
    }

    /// Dependency name, or `None` for literals.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Literal(_) => None,
            Self::Dependency { name, .. } => Some(name),
        }
    }

    /// Root property of the dependency, or `None` for literals.
    #[must_use]
    pub fn root(&self) -> Option<&str> {
        self.name().map(crate::path::model_for_path)
    }
}

/// A method call with arguments, as used by computed properties, computed
/// bindings and complex observers.
#[derive(Clone, Debug, PartialEq)]
pub struct Signature {
    /// Method name.
    pub method: String,
    /// Arguments in call order.
    pub args: SmallVec<[EffectArg; 4]>,
}

impl Signature {
    /// Parses `method(arg, arg, ...)`.
    pub fn parse(text: &str) -> Result<Self, ParseSignatureError> {
        let err = || ParseSignatureError {
            text: text.to_string(),
        };
        let text = text.trim();
        let open = text.find('(').ok_or_else(err)?;
        let inner = text[open + 1..].strip_suffix(')').ok_or_else(err)?;
        let method = text[..open].trim();
        if method.is_empty() {
            return Err(err());
        }
        let args = if inner.trim().is_empty() {
            SmallVec::new()
        } else {
            inner.split(',').map(EffectArg::parse).collect()
        };
        Ok(Self {
            method: method.to_string(),
            args,
        })
    }

    /// Arguments that name properties or paths.
    pub fn dependencies(&self) -> impl Iterator<Item = &EffectArg> + '_ {
        self.args.iter().filter(|arg| arg.name().is_some())
    }
}

impl FromStr for Signature {
    type Err = ParseSignatureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Error returned when a method signature is malformed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseSignatureError {
    /// The text that failed to parse.
    pub text: String,
}

impl fmt::Display for ParseSignatureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "malformed method signature `{}`", self.text)
    }
}

impl core::error::Error for ParseSignatureError {}

/// Where a binding writes: the annotated node, the kind of binding, and the
/// target property or attribute name (empty for text bindings).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BindingTarget {
    /// Index of the node in the element's annotated node list.
    pub index: usize,
    /// How the value is written.
    pub kind: BindingKind,
    /// Property or attribute name.
    pub name: String,
}

/// Recomputes `property` from a signature.
#[derive(Clone, Debug, PartialEq)]
pub struct ComputeEffect {
    /// Method and arguments.
    pub signature: Signature,
    /// Argument whose change triggers this effect.
    pub trigger: EffectArg,
    /// Property receiving the result.
    pub property: String,
}

/// Pushes a bound path's value into a node.
#[derive(Clone, Debug, PartialEq)]
pub struct AnnotationEffect {
    /// Destination.
    pub target: BindingTarget,
    /// Bound path on the element.
    pub path: String,
    /// Write the boolean negation instead of the value.
    pub negate: bool,
}

/// Pushes a computed value into a node.
#[derive(Clone, Debug, PartialEq)]
pub struct ComputedAnnotationEffect {
    /// Destination.
    pub target: BindingTarget,
    /// Method and arguments.
    pub signature: Signature,
    /// Argument whose change triggers this effect.
    pub trigger: EffectArg,
}

/// Calls `method(new, old)` when the property changes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObserverEffect {
    /// Observer method name.
    pub method: String,
}

/// Calls a method with several dependencies once all are defined.
#[derive(Clone, Debug, PartialEq)]
pub struct ComplexObserverEffect {
    /// Method and arguments.
    pub signature: Signature,
    /// Argument whose change triggers this effect.
    pub trigger: EffectArg,
}

/// Callback of a [`Effect::Function`]: `(element, property, value, old)`.
pub type EffectFn = dyn Fn(&Element, &str, &Value, &Value);

/// An arbitrary function effect.
#[derive(Clone)]
pub struct FunctionEffect(Rc<EffectFn>);

impl FunctionEffect {
    /// Wraps a callback.
    pub fn new(f: impl Fn(&Element, &str, &Value, &Value) + 'static) -> Self {
        Self(Rc::new(f))
    }

    /// Invokes the callback.
    #[inline]
    pub fn call(&self, element: &Element, property: &str, value: &Value, old: &Value) {
        (self.0)(element, property, value, old);
    }
}

impl fmt::Debug for FunctionEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionEffect").finish_non_exhaustive()
    }
}

/// A property effect.
#[derive(Clone, Debug)]
pub enum Effect {
    /// See [`ComputeEffect`].
    Compute(Rc<ComputeEffect>),
    /// See [`AnnotationEffect`].
    Annotation(Rc<AnnotationEffect>),
    /// See [`ComputedAnnotationEffect`].
    ComputedAnnotation(Rc<ComputedAnnotationEffect>),
    /// Serializes the property to the host's dash-cased attribute.
    Reflect,
    /// Fires a non-bubbling `<dash-name>-changed` event from the host.
    Notify,
    /// See [`ObserverEffect`].
    Observer(Rc<ObserverEffect>),
    /// See [`ComplexObserverEffect`].
    ComplexObserver(Rc<ComplexObserverEffect>),
    /// See [`FunctionEffect`].
    Function(FunctionEffect),
}

impl Effect {
    /// Kind of this effect.
    #[must_use]
    pub fn kind(&self) -> EffectKind {
        match self {
            Self::Compute(_) => EffectKind::Compute,
            Self::Annotation(_) => EffectKind::Annotation,
            Self::ComputedAnnotation(_) => EffectKind::ComputedAnnotation,
            Self::Reflect => EffectKind::Reflect,
            Self::Notify => EffectKind::Notify,
            Self::Observer(_) => EffectKind::Observer,
            Self::ComplexObserver(_) => EffectKind::ComplexObserver,
            Self::Function(_) => EffectKind::Function,
        }
    }

    /// A function effect.
    pub fn function(f: impl Fn(&Element, &str, &Value, &Value) + 'static) -> Self {
        Self::Function(FunctionEffect::new(f))
    }

    /// An observer effect calling `method`.
    pub fn observer(method: impl Into<String>) -> Self {
        Self::Observer(Rc::new(ObserverEffect {
            method: method.into(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_are_ordered_by_priority() {
        let mut sorted = EffectKind::ALL;
        sorted.sort();
        assert_eq!(sorted, EffectKind::ALL);
        assert!(EffectKind::Compute < EffectKind::Function);
    }

    #[test]
    fn kind_names_parse() {
        for kind in EffectKind::ALL {
            assert_eq!(kind.as_str().parse::<EffectKind>(), Ok(kind));
        }
        let err = "bogus".parse::<EffectKind>().unwrap_err();
        assert_eq!(err.kind, "bogus");
    }

    #[test]
    fn signature_parses_literals_and_dependencies() {
        let sig = Signature::parse("format(user.name, 'x', 3, count)").unwrap();
        assert_eq!(sig.method, "format");
        assert_eq!(sig.args.len(), 4);
        assert_eq!(
            sig.args[0],
            EffectArg::Dependency {
                name: "user.name".into(),
                structured: true
            }
        );
        assert_eq!(sig.args[1], EffectArg::Literal(Value::from("x")));
        assert_eq!(sig.args[2], EffectArg::Literal(Value::from(3)));
        let roots: alloc::vec::Vec<_> = sig.dependencies().filter_map(EffectArg::root).collect();
        assert_eq!(roots, ["user", "count"]);
    }

    #[test]
    fn signature_without_args() {
        let sig: Signature = "now()".parse().unwrap();
        assert!(sig.args.is_empty());
    }

    #[test]
    fn malformed_signatures_are_rejected() {
        assert!(Signature::parse("noparens").is_err());
        assert!(Signature::parse("(a)").is_err());
        assert!(Signature::parse("m(a").is_err());
    }
}
