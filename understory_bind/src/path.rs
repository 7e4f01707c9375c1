// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dotted path helpers and the path-notification seam.

use alloc::string::String;

use crate::element::Element;
use crate::value::Value;

/// Root property of a dotted path: `a.b.c` gives `a`.
#[must_use]
pub fn model_for_path(path: &str) -> &str {
    path.split_once('.').map_or(path, |(root, _)| root)
}

/// Whether `path` addresses a member below a property.
///
/// A leading dot does not count.
#[must_use]
pub fn is_structured(path: &str) -> bool {
    path.find('.').is_some_and(|i| i > 0)
}

/// Re-roots `path` from `root` onto `property`.
///
/// `fix_path("item", "value", "value.name")` gives `item.name`. `path` must
/// start with `root`.
#[must_use]
pub fn fix_path(property: &str, root: &str, path: &str) -> String {
    let mut fixed = String::from(property);
    fixed.push_str(path.get(root.len()..).unwrap_or_default());
    fixed
}

/// Whether a change at `path` affects a dependency on `dependency`.
///
/// True when they are equal or when `dependency` lies below `path`.
#[must_use]
pub fn path_matches(path: &str, dependency: &str) -> bool {
    dependency == path || is_descendant(path, dependency)
}

/// Whether `path` lies strictly below `base`.
#[must_use]
pub fn is_descendant(base: &str, path: &str) -> bool {
    path.strip_prefix(base).is_some_and(|rest| rest.starts_with('.'))
}

/// Hooks an element uses to customize path propagation.
///
/// Installed with [`Element::set_path_delegate`]. The default methods leave
/// the standard behavior in place.
pub trait PathDelegate {
    /// Called before the standard path effects run for `path`.
    ///
    /// Return `true` to claim the path and skip the standard effects.
    fn intercept_path(&self, element: &Element, path: &str, value: &Value) -> bool {
        let _ = (element, path, value);
        false
    }

    /// Called to propagate a path change away from `element`.
    ///
    /// Return `true` if the change was handled; otherwise the element fires a
    /// non-bubbling `<root>-changed` event carrying the path.
    fn notify_path_upward(&self, element: &Element, path: &str, value: &Value) -> bool {
        let _ = (element, path, value);
        false
    }
}
