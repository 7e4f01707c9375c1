// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-property effect lists.

use alloc::string::String;
use alloc::vec::Vec;

use hashbrown::HashMap;

use crate::effect::Effect;

/// Effects registered on a model, keyed by property name.
///
/// Lists keep insertion order until [`PropertyEffects::sort`] orders them by
/// [`EffectKind`](crate::EffectKind). The sort is stable, so effects of equal
/// kind keep their registration order.
#[derive(Clone, Debug, Default)]
pub struct PropertyEffects {
    by_property: HashMap<String, Vec<Effect>>,
}

impl PropertyEffects {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the list for `property`, creating an empty one if needed.
    pub fn ensure(&mut self, property: &str) -> &mut Vec<Effect> {
        self.by_property.entry_ref(property).or_default()
    }

    /// Appends `effect` to the list for `property`.
    pub fn add(&mut self, property: &str, effect: Effect) {
        self.ensure(property).push(effect);
    }

    /// Effects for `property`, if any list exists.
    #[must_use]
    pub fn get(&self, property: &str) -> Option<&[Effect]> {
        self.by_property.get(property).map(Vec::as_slice)
    }

    /// Returns `true` if `property` has a list, even an empty one.
    #[must_use]
    pub fn contains(&self, property: &str) -> bool {
        self.by_property.contains_key(property)
    }

    /// Stable-sorts every list by effect kind.
    pub fn sort(&mut self) {
        for effects in self.by_property.values_mut() {
            effects.sort_by_key(Effect::kind);
        }
    }

    /// Iterates over `(property, effects)` pairs in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Effect])> + '_ {
        self.by_property
            .iter()
            .map(|(name, effects)| (name.as_str(), effects.as_slice()))
    }

    /// Number of properties with a list.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_property.len()
    }

    /// Returns `true` if no property has a list.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_property.is_empty()
    }
}
