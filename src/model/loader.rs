//! JSON graph documents.
//!
//! ```json
//! {
//!   "types": {
//!     "Leaf":   { "annotations": [{ "type": "Marker" }, { "type": "Repeatable", "attrs": { "value": "Leaves" } }] },
//!     "Leaves": {},
//!     "Marker": { "annotations": [{ "type": "Target", "attrs": { "value": ["ANNOTATION_TYPE"] } }] }
//!   },
//!   "elements": {
//!     "type:Base":   { "annotations": [{ "type": "Leaf", "attrs": { "value": "a" } }] },
//!     "type:Widget": { "extends": "type:Base" }
//!   }
//! }
//! ```
//!
//! Built-in marker types are implicit and must not be redeclared.

use std::collections::BTreeMap;

use miette::Diagnostic;
use serde::Deserialize;
use thiserror::Error;

use super::element::ElementId;
use super::errors::{DocumentError, GraphError};
use super::graph::MetadataGraph;
use super::value::{Instance, TypeName};

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct GraphDocument {
    #[serde(default)]
    types: BTreeMap<String, TypeEntry>,
    #[serde(default)]
    elements: BTreeMap<String, ElementEntry>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct TypeEntry {
    #[serde(default)]
    annotations: Vec<Instance>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ElementEntry {
    #[serde(default)]
    extends: Option<String>,
    #[serde(default)]
    annotations: Vec<Instance>,
}

/// Failure to turn a document into a graph.
#[derive(Debug, Error, Diagnostic)]
pub enum LoadError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Graph(#[from] GraphError),
}

impl MetadataGraph {
    /// Parse and validate a JSON graph document. `name` labels the source in diagnostics.
    ///
    /// ## Errors
    /// - [`LoadError::Document`] if the text is not a graph document (with a span into `source`).
    /// - [`LoadError::Graph`] if the document is well-formed but structurally invalid.
    #[tracing::instrument(skip(source), fields(bytes = source.len()))]
    pub fn from_json(name: &str, source: &str) -> Result<Self, LoadError> {
        let document: GraphDocument =
            serde_json::from_str(source).map_err(|err| DocumentError::from_json(name, source, &err))?;

        let mut builder = MetadataGraph::builder();
        for (type_name, entry) in document.types {
            builder = builder.declare_type(TypeName::new(type_name), entry.annotations);
        }
        for (id, entry) in document.elements {
            let id: ElementId = id.parse()?;
            let extends = entry.extends.map(|parent| parent.parse::<ElementId>()).transpose()?;
            builder = builder.declare_element(id, extends, entry.annotations);
        }
        Ok(builder.build()?)
    }
}
