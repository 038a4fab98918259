//! Metadata instances and their attribute values.

use std::collections::BTreeMap;
use std::fmt;

use metamark_core::markers;
use serde::{Deserialize, Serialize};

/// Name of a marker type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeName(String);

impl TypeName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TypeName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// A declared attribute value.
///
/// ## Notes
/// - Deserialization is untagged: JSON booleans, integers, strings, arrays and `{"type": ...}` objects map to the
///   variants below in that order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Bool(bool),
    Int(i64),
    Text(String),
    List(Vec<AttrValue>),
    Instance(Box<Instance>),
}

impl AttrValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttrValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttrValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Text values of a list (or of a single text value), skipping anything else.
    pub fn texts(&self) -> Vec<&str> {
        match self {
            AttrValue::Text(text) => vec![text.as_str()],
            AttrValue::List(items) => items.iter().filter_map(AttrValue::as_text).collect(),
            _ => Vec::new(),
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Bool(b) => write!(f, "{b}"),
            AttrValue::Int(i) => write!(f, "{i}"),
            AttrValue::Text(text) => write!(f, "{text:?}"),
            AttrValue::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            AttrValue::Instance(instance) => write!(f, "{instance}"),
        }
    }
}

/// One metadata instance: a marker type plus its declared attributes.
///
/// Two instances are equal when their type and attribute values are equal; where they were attached is tracked by
/// the resolver's occurrences, not here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    #[serde(rename = "type")]
    pub ty: TypeName,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, AttrValue>,
}

impl Instance {
    /// An instance with no attributes.
    pub fn marker(ty: impl Into<String>) -> Self {
        Self {
            ty: TypeName::new(ty),
            attrs: BTreeMap::new(),
        }
    }

    /// Add or replace an attribute.
    pub fn with_attr(mut self, name: impl Into<String>, value: AttrValue) -> Self {
        self.attrs.insert(name.into(), value);
        self
    }

    /// Shorthand for `with_attr("value", Text(value))`.
    pub fn with_value(self, value: impl Into<String>) -> Self {
        self.with_attr(markers::VALUE_ATTR, AttrValue::Text(value.into()))
    }

    pub fn attr(&self, name: &str) -> Option<&AttrValue> {
        self.attrs.get(name)
    }

    /// The `value` attribute as text, if it is one.
    pub fn value(&self) -> Option<&str> {
        self.attr(markers::VALUE_ATTR).and_then(AttrValue::as_text)
    }

    /// Instances nested anywhere in the attributes (not recursive).
    pub fn nested(&self) -> impl Iterator<Item = &Instance> {
        self.attrs.values().flat_map(nested_in)
    }
}

fn nested_in(value: &AttrValue) -> Box<dyn Iterator<Item = &Instance> + '_> {
    match value {
        AttrValue::Instance(instance) => Box::new(std::iter::once(instance.as_ref())),
        AttrValue::List(items) => Box::new(items.iter().flat_map(nested_in)),
        _ => Box::new(std::iter::empty()),
    }
}

impl fmt::Display for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.ty)?;
        if self.attrs.is_empty() {
            return Ok(());
        }
        f.write_str("(")?;
        for (i, (name, value)) in self.attrs.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}={value}")?;
        }
        f.write_str(")")
    }
}
