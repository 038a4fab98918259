//! Program element identifiers.

use std::fmt;
use std::str::FromStr;

use metamark_core::targets::{self, TargetId};

use super::errors::GraphError;

/// A program element: `kind:name`, e.g. `type:Widget` or `method:Widget.run()`.
///
/// The kind is one of the element kinds from [`metamark_core::targets`] except the marker-type kind (marker types
/// are declared under `"types"`, not as elements).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId {
    kind: TargetId,
    name: String,
}

impl ElementId {
    pub fn new(kind: TargetId, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }

    pub fn kind(&self) -> TargetId {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl FromStr for ElementId {
    type Err = GraphError;

    fn from_str(id: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| GraphError::InvalidElementId {
            id: id.to_string(),
            reason: reason.to_string(),
        };
        let (kind, name) = id.split_once(':').ok_or_else(|| invalid("missing `kind:` prefix"))?;
        let kind = targets::from_str(kind).ok_or_else(|| invalid("unknown element kind"))?;
        if kind == TargetId::MarkerType {
            return Err(invalid("marker types are declared under \"types\""));
        }
        let name = name.trim();
        if name.is_empty() {
            return Err(invalid("empty name"));
        }
        Ok(Self::new(kind, name))
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", targets::prefix(self.kind), self.name)
    }
}
