//! Evaluation of gating instances.
//!
//! A gating instance (e.g. `@Conditional(false)`) attached to a marker type switches that type's branch of the
//! graph on or off. Recognized attributes:
//!
//! - `value: bool`: the literal outcome.
//! - `flag: "name"`: open only when the flag is enabled.
//! - `unless: "name"`: open only when the flag is *not* enabled.
//!
//! Every present attribute must hold. An instance with none of them is open.

use std::collections::BTreeSet;

use metamark_core::markers;

use super::value::{AttrValue, Instance};

/// Flag set used to evaluate gating instances.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conditions {
    enabled: BTreeSet<String>,
}

impl Conditions {
    pub fn new(enabled: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            enabled: enabled.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_enabled(&self, flag: &str) -> bool {
        self.enabled.contains(flag)
    }

    /// Return true if the gating instance lets its branch through.
    pub fn evaluate(&self, instance: &Instance) -> bool {
        if let Some(value) = instance.attr(markers::VALUE_ATTR).and_then(AttrValue::as_bool) {
            if !value {
                return false;
            }
        }
        if let Some(flag) = instance.attr("flag").and_then(AttrValue::as_text) {
            if !self.is_enabled(flag) {
                return false;
            }
        }
        if let Some(flag) = instance.attr("unless").and_then(AttrValue::as_text) {
            if self.is_enabled(flag) {
                return false;
            }
        }
        true
    }
}
