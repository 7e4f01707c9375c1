// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Parent property forwarding.
//!
//! Content stamped from a template reads values from the scope around the
//! template through `parent.<prop>` paths. The outer scope binds those values
//! onto the template element as `_parent_<prop>` properties; each write there
//! is handed to a [`ParentPropForwarder`], which pushes it into the stamped
//! instances. Changes made inside an instance travel the other way.

use alloc::format;
use alloc::rc::Rc;
use alloc::string::String;

use tracing::trace;
use understory_bind::{Accessor, Effect, Element, PathDelegate, Value};

/// Prefix of the template-element properties mirroring parent properties.
pub const PARENT_PREFIX: &str = "_parent_";

/// Root of the paths through which instances read parent properties.
pub const PARENT_SCOPE: &str = "parent";

/// Name of the template-element property mirroring `prop`.
#[must_use]
pub fn parent_prop_name(prop: &str) -> String {
    format!("{PARENT_PREFIX}{prop}")
}

/// Receives parent scope changes on behalf of stamped instances.
///
/// Implemented by whatever owns the instances, typically a repeater.
pub trait ParentPropForwarder {
    /// The parent property `prop` changed to `value`.
    ///
    /// Usually implemented by calling
    /// [`TemplateInstance::forward_parent_prop`](crate::TemplateInstance::forward_parent_prop)
    /// on each live instance.
    fn forward_parent_prop(&self, prop: &str, value: &Value);

    /// A path below a parent property changed.
    ///
    /// `path` has the `_parent_` prefix removed, e.g. `user.name`. Return
    /// `true` to claim the change; unclaimed changes run the host's standard
    /// path effects.
    fn forward_parent_path(&self, path: &str, value: &Value) -> bool {
        let _ = (path, value);
        false
    }

    /// A path inside `instance` changed and is being propagated upward.
    ///
    /// `root` is the first path segment and `sub_path` the remainder.
    fn forward_instance_path(&self, instance: &Element, root: &str, sub_path: &str, value: &Value) {
        let _ = (instance, root, sub_path, value);
    }
}

/// Builds the `_parent_<prop>` accessor whose only effect forwards the value
/// through the element's parent property forwarder.
pub(crate) fn parent_prop_accessor(prop: &str) -> Accessor {
    let forwarded: Rc<str> = prop.into();
    let effect = Effect::function(move |element, _, value, _| {
        element.forward_parent_prop(&forwarded, value);
    });
    Accessor::new(&parent_prop_name(prop), Rc::from([effect]))
}

/// Installs `accessors` on `template` only.
///
/// Values the template already holds under those names are kept, and no
/// effects run for them.
pub(crate) fn extend_template(template: &Element, accessors: &[Accessor]) {
    for accessor in accessors {
        template.define_accessor(accessor.clone());
    }
}

/// Path delegate of a templatizer host: `_parent_` paths go to the forwarder.
pub(crate) struct HostPathDelegate {
    forwarder: Rc<dyn ParentPropForwarder>,
}

impl HostPathDelegate {
    pub(crate) fn new(forwarder: Rc<dyn ParentPropForwarder>) -> Self {
        Self { forwarder }
    }
}

impl PathDelegate for HostPathDelegate {
    fn intercept_path(&self, _element: &Element, path: &str, value: &Value) -> bool {
        let Some(parent_path) = path.strip_prefix(PARENT_PREFIX) else {
            return false;
        };
        let claimed = self.forwarder.forward_parent_path(parent_path, value);
        trace!(path, claimed, "forwarded parent path");
        claimed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;
    use core::cell::RefCell;
    use understory_bind::Model;

    #[derive(Default)]
    struct Recorder {
        props: RefCell<Vec<(String, Value)>>,
    }

    impl ParentPropForwarder for Recorder {
        fn forward_parent_prop(&self, prop: &str, value: &Value) {
            self.props.borrow_mut().push((prop.into(), value.clone()));
        }
    }

    #[test]
    fn parent_prop_accessor_forwards_writes() {
        let template = Element::new(Rc::new(Model::new("template")));
        let recorder = Rc::new(Recorder::default());
        let r = recorder.clone();
        template.set_parent_prop_forwarder(Some(Rc::new(move |prop: &str, value: &Value| {
            r.forward_parent_prop(prop, value);
        })));
        extend_template(&template, &[parent_prop_accessor("title")]);

        template.set("_parent_title", "Hi");
        template.set("_parent_title", "Hi");
        assert_eq!(
            *recorder.props.borrow(),
            [(String::from("title"), Value::from("Hi"))]
        );
    }

    #[test]
    fn extend_template_keeps_existing_values_silently() {
        let template = Element::new(Rc::new(Model::new("template")));
        template.set("_parent_title", "before");
        let recorder = Rc::new(Recorder::default());
        let r = recorder.clone();
        template.set_parent_prop_forwarder(Some(Rc::new(move |prop: &str, value: &Value| {
            r.forward_parent_prop(prop, value);
        })));

        extend_template(&template, &[parent_prop_accessor("title")]);
        assert_eq!(template.get("_parent_title"), Value::from("before"));
        assert!(recorder.props.borrow().is_empty());

        template.set("_parent_title", "after");
        assert_eq!(recorder.props.borrow().len(), 1);
    }

    #[test]
    fn host_delegate_only_claims_parent_paths() {
        struct Claiming;
        impl ParentPropForwarder for Claiming {
            fn forward_parent_prop(&self, _: &str, _: &Value) {}
            fn forward_parent_path(&self, path: &str, _: &Value) -> bool {
                path == "user.name"
            }
        }
        let delegate = HostPathDelegate::new(Rc::new(Claiming));
        let el = Element::new(Rc::new(Model::new("x-host")));
        assert!(delegate.intercept_path(&el, "_parent_user.name", &Value::Null));
        assert!(!delegate.intercept_path(&el, "_parent_user.age", &Value::Null));
        assert!(!delegate.intercept_path(&el, "user.name", &Value::Null));
    }
}
