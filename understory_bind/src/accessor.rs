// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Property accessors.

use alloc::rc::Rc;

use crate::case_map::private_setter_name;
use crate::effect::Effect;

/// An installed accessor for one property.
///
/// Reading goes to the element's data store. Writing runs the property-set
/// guard and then `effects` in order. A read-only accessor has no public
/// setter; its private `_set<Name>` setter writes through the same effects.
#[derive(Clone, Debug)]
pub struct Accessor {
    property: Rc<str>,
    effects: Rc<[Effect]>,
    settable: bool,
}

impl Accessor {
    /// A settable accessor.
    #[must_use]
    pub fn new(property: &str, effects: Rc<[Effect]>) -> Self {
        Self {
            property: property.into(),
            effects,
            settable: true,
        }
    }

    /// A read-only accessor.
    #[must_use]
    pub fn read_only(property: &str, effects: Rc<[Effect]>) -> Self {
        Self {
            settable: false,
            ..Self::new(property, effects)
        }
    }

    /// Property name.
    #[inline]
    #[must_use]
    pub fn property(&self) -> &str {
        &self.property
    }

    /// Effects run on change, in kind order.
    #[inline]
    #[must_use]
    pub fn effects(&self) -> &Rc<[Effect]> {
        &self.effects
    }

    /// Whether the public setter exists.
    #[inline]
    #[must_use]
    pub fn is_settable(&self) -> bool {
        self.settable
    }

    /// Name of the private setter, `_set<Name>`.
    #[must_use]
    pub fn private_setter(&self) -> alloc::string::String {
        private_setter_name(&self.property)
    }
}
