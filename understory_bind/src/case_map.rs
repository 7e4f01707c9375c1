// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Conversions between property names, attribute names, and event names.

use alloc::format;
use alloc::string::String;

/// Suffix of the event fired when a notifying property changes.
pub const CHANGED_SUFFIX: &str = "-changed";

/// Converts `camelCase` to `dash-case`.
///
/// A dash is inserted wherever a lowercase letter is directly followed by an
/// uppercase one, and that uppercase letter is lowered.
///
/// ```rust
/// use understory_bind::camel_to_dash_case;
///
/// assert_eq!(camel_to_dash_case("fooBarBaz"), "foo-bar-baz");
/// assert_eq!(camel_to_dash_case("value"), "value");
/// ```
#[must_use]
pub fn camel_to_dash_case(camel: &str) -> String {
    let mut out = String::with_capacity(camel.len() + 4);
    let mut prev_lower = false;
    for c in camel.chars() {
        if prev_lower && c.is_ascii_uppercase() {
            out.push('-');
            out.push(c.to_ascii_lowercase());
            prev_lower = false;
        } else {
            out.push(c);
            prev_lower = c.is_ascii_lowercase();
        }
    }
    out
}

/// Converts `dash-case` to `camelCase`.
///
/// Only a dash followed by a lowercase letter is folded.
#[must_use]
pub fn dash_to_camel_case(dash: &str) -> String {
    let mut out = String::with_capacity(dash.len());
    let mut chars = dash.chars().peekable();
    while let Some(c) = chars.next() {
        match (c, chars.peek()) {
            ('-', Some(next)) if next.is_ascii_lowercase() => {
                out.push(next.to_ascii_uppercase());
                chars.next();
            }
            _ => out.push(c),
        }
    }
    out
}

/// Uppercases the first character.
#[must_use]
pub fn upper_first(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Name of the change event for `property`: `fooBar` becomes `foo-bar-changed`.
#[must_use]
pub fn change_event_name(property: &str) -> String {
    format!("{}{CHANGED_SUFFIX}", camel_to_dash_case(property))
}

/// Name of the private setter generated for a read-only `property`.
#[must_use]
pub fn private_setter_name(property: &str) -> String {
    format!("_set{}", upper_first(property))
}
