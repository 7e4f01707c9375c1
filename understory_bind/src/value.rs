// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dynamic values flowing through bindings.
//!
//! Bound data is dynamically typed: a property may hold nothing at all
//! ([`Value::Undefined`]), an explicit [`Value::Null`], a scalar, or a shared
//! mutable [`Object`]. Objects are reference types, so two handles to the same
//! object compare equal under [`Value::strict_eq`] while two structurally equal
//! objects do not.

use alloc::collections::BTreeMap;
use alloc::rc::Rc;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;

use serde::ser::{Serialize, SerializeMap, Serializer};

/// A dynamically typed bound value.
#[derive(Clone, Debug, Default)]
pub enum Value {
    /// No value has been assigned.
    #[default]
    Undefined,
    /// An explicit empty value.
    Null,
    /// A boolean.
    Bool(bool),
    /// A number.
    Number(f64),
    /// An immutable string.
    String(Rc<str>),
    /// A shared, mutable object.
    Object(Object),
}

impl Value {
    /// Returns `true` for [`Value::Undefined`].
    #[inline]
    #[must_use]
    pub fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }

    /// Returns `true` for objects and for [`Value::Null`].
    ///
    /// Writing such a value to a property invalidates every cached sub-path
    /// below that property.
    #[inline]
    #[must_use]
    pub fn is_composite(&self) -> bool {
        matches!(self, Self::Object(_) | Self::Null)
    }

    /// Identity comparison.
    ///
    /// Scalars compare by value (`NaN` never equals itself), objects compare by
    /// reference.
    #[must_use]
    pub fn strict_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Undefined, Self::Undefined) | (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    /// Coercing comparison.
    ///
    /// `Undefined` and `Null` are interchangeable, and numbers compare against
    /// the numeric reading of strings and booleans.
    #[must_use]
    pub fn loose_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Undefined | Self::Null, Self::Undefined | Self::Null) => true,
            (Self::Undefined | Self::Null, _) | (_, Self::Undefined | Self::Null) => false,
            (Self::Number(_), Self::String(_) | Self::Bool(_))
            | (Self::String(_) | Self::Bool(_), Self::Number(_))
            | (Self::Bool(_), Self::String(_))
            | (Self::String(_), Self::Bool(_)) => self.to_number() == other.to_number(),
            _ => self.strict_eq(other),
        }
    }

    /// Truthiness as used by negated bindings.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Undefined | Self::Null => false,
            Self::Bool(b) => *b,
            Self::Number(n) => *n != 0.0 && !n.is_nan(),
            Self::String(s) => !s.is_empty(),
            Self::Object(_) => true,
        }
    }

    /// Numeric reading of the value; `NaN` when there is none.
    #[must_use]
    pub fn to_number(&self) -> f64 {
        match self {
            Self::Undefined | Self::Object(_) => f64::NAN,
            Self::Null => 0.0,
            Self::Bool(b) => f64::from(u8::from(*b)),
            Self::Number(n) => *n,
            Self::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    0.0
                } else {
                    trimmed.parse().unwrap_or(f64::NAN)
                }
            }
        }
    }

    /// Text used when a value is written into text content.
    ///
    /// `Undefined` and `Null` render as the empty string.
    #[must_use]
    pub fn to_display_string(&self) -> String {
        match self {
            Self::Undefined | Self::Null => String::new(),
            Self::Bool(b) => b.to_string(),
            Self::Number(n) => format_number(*n),
            Self::String(s) => s.to_string(),
            Self::Object(_) => String::from("[object Object]"),
        }
    }

    /// Attribute text for this value, or `None` if the attribute should be
    /// removed.
    ///
    /// `true` serializes to an empty attribute, objects to JSON.
    #[must_use]
    pub fn to_attribute(&self) -> Option<String> {
        match self {
            Self::Undefined | Self::Null | Self::Bool(false) => None,
            Self::Bool(true) => Some(String::new()),
            Self::Object(_) => Some(self.to_json()),
            _ => Some(self.to_display_string()),
        }
    }

    /// JSON text for this value. Undefined object members are omitted.
    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Borrows the object, if this is one.
    #[inline]
    #[must_use]
    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Self::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Borrows the string, if this is one.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the number, if this is one.
    #[inline]
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the boolean, if this is one.
    #[inline]
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Walks a dotted member path below this value.
    ///
    /// Stops with `Undefined` at the first segment that does not land on an
    /// object.
    #[must_use]
    pub fn get_path(&self, path: &str) -> Self {
        let mut current = self.clone();
        for segment in path.split('.') {
            current = match &current {
                Self::Object(o) => o.get(segment),
                _ => return Self::Undefined,
            };
        }
        current
    }
}

fn format_number(n: f64) -> String {
    if n.is_nan() {
        String::from("NaN")
    } else if n.is_infinite() {
        String::from(if n > 0.0 { "Infinity" } else { "-Infinity" })
    } else {
        // `Display` for f64 prints integral values without a fraction.
        n.to_string()
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "only integral values well inside the i64 range are cast"
)]
fn as_integer(n: f64) -> Option<i64> {
    let truncated = n as i64;
    (n.abs() < 9.0e15 && truncated as f64 == n).then_some(truncated)
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.strict_eq(other)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.into())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value.into())
    }
}

impl From<Object> for Value {
    fn from(value: Object) -> Self {
        Self::Object(value)
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Undefined | Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Number(n) => match as_integer(*n) {
                Some(i) => serializer.serialize_i64(i),
                None => serializer.serialize_f64(*n),
            },
            Self::String(s) => serializer.serialize_str(s),
            Self::Object(o) => o.serialize(serializer),
        }
    }
}

/// A shared, mutable string-keyed object.
///
/// Cloning an `Object` clones the handle; both clones see the same members.
#[derive(Clone, Default)]
pub struct Object(Rc<RefCell<BTreeMap<String, Value>>>);

impl Object {
    /// Creates an empty object.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a member, or `Undefined` if it is absent.
    #[must_use]
    pub fn get(&self, key: &str) -> Value {
        self.0.borrow().get(key).cloned().unwrap_or_default()
    }

    /// Sets a member.
    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.borrow_mut().insert(key.into(), value.into());
    }

    /// Removes a member, returning its previous value.
    pub fn remove(&self, key: &str) -> Option<Value> {
        self.0.borrow_mut().remove(key)
    }

    /// Returns `true` if the member is present.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.0.borrow().contains_key(key)
    }

    /// Snapshot of the member names in order.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.0.borrow().keys().cloned().collect()
    }

    /// Snapshot of the members in key order.
    #[must_use]
    pub fn entries(&self) -> Vec<(String, Value)> {
        self.0
            .borrow()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    /// Returns `true` if there are no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    /// Returns `true` if both handles refer to the same object.
    #[inline]
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.0.borrow().iter()).finish()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Object {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let map = iter
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self(Rc::new(RefCell::new(map)))
    }
}

impl Serialize for Object {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let members = self.0.borrow();
        let defined: Vec<_> = members.iter().filter(|(_, v)| !v.is_undefined()).collect();
        let mut map = serializer.serialize_map(Some(defined.len()))?;
        for (key, value) in defined {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn objects_compare_by_identity() {
        let a = Object::new();
        let b = Object::new();
        assert!(Value::from(a.clone()).strict_eq(&Value::from(a.clone())));
        assert!(!Value::from(a).strict_eq(&Value::from(b)));
    }

    #[test]
    fn nan_is_never_strictly_equal() {
        let nan = Value::Number(f64::NAN);
        assert!(!nan.strict_eq(&nan.clone()));
    }

    #[test]
    fn loose_equality_coerces() {
        assert!(Value::Undefined.loose_eq(&Value::Null));
        assert!(Value::from(1).loose_eq(&Value::from("1")));
        assert!(Value::from(true).loose_eq(&Value::from(1)));
        assert!(!Value::from(0).loose_eq(&Value::Null));
    }

    #[test]
    fn display_strings() {
        assert_eq!(Value::Undefined.to_display_string(), "");
        assert_eq!(Value::from(3).to_display_string(), "3");
        assert_eq!(Value::from(2.5).to_display_string(), "2.5");
        assert_eq!(Value::from(false).to_display_string(), "false");
    }

    #[test]
    fn attribute_serialization() {
        assert_eq!(Value::from(true).to_attribute().as_deref(), Some(""));
        assert_eq!(Value::from(false).to_attribute(), None);
        assert_eq!(Value::Null.to_attribute(), None);
        assert_eq!(Value::from(7).to_attribute().as_deref(), Some("7"));

        let obj: Object = [("a", Value::from(1)), ("skip", Value::Undefined)]
            .into_iter()
            .collect();
        assert_eq!(
            Value::from(obj).to_attribute().as_deref(),
            Some(r#"{"a":1}"#)
        );
    }

    #[test]
    fn path_walk_stops_at_non_objects() {
        let inner: Object = [("c", 5)].into_iter().collect();
        let outer: Object = [("b", inner)].into_iter().collect();
        let root = Value::from(outer);
        assert_eq!(root.get_path("b.c"), Value::from(5));
        assert!(root.get_path("b.c.d").is_undefined());
        assert!(root.get_path("x.y").is_undefined());
    }
}
