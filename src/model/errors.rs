//! Errors raised while loading or reading a metadata graph.

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

use super::value::TypeName;

/// A graph document that is not valid JSON (or not shaped like a graph).
#[derive(Debug, Error, Diagnostic)]
#[error("invalid graph document: {message}")]
#[diagnostic(code(metamark::document::syntax))]
pub struct DocumentError {
    pub message: String,
    #[source_code]
    pub src: NamedSource<String>,
    #[label("here")]
    pub span: SourceSpan,
}

impl DocumentError {
    /// Point a serde_json error at its line and column in `source`.
    pub fn from_json(name: &str, source: &str, err: &serde_json::Error) -> Self {
        let offset = byte_offset(source, err.line(), err.column());
        Self {
            message: err.to_string(),
            src: NamedSource::new(name, source.to_string()),
            span: (offset, 1).into(),
        }
    }
}

/// Convert serde_json's 1-based line / column into a byte offset (clamped to the source).
fn byte_offset(source: &str, line: usize, column: usize) -> usize {
    if line == 0 {
        return 0;
    }
    let line_start: usize = source.split_inclusive('\n').take(line - 1).map(str::len).sum();
    let offset = line_start + column.saturating_sub(1);
    offset.min(source.len().saturating_sub(1))
}

/// Structural problems in a graph, and lookups against things the graph does not declare.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum GraphError {
    #[error("unknown marker type `{name}` (used by {used_by})")]
    #[diagnostic(
        code(metamark::graph::unknown_type),
        help("declare it under \"types\", or check the spelling")
    )]
    UnknownType { name: TypeName, used_by: String },

    #[error("unknown element `{0}`")]
    #[diagnostic(code(metamark::graph::unknown_element))]
    UnknownElement(String),

    #[error("invalid element id `{id}`: {reason}")]
    #[diagnostic(
        code(metamark::graph::element_id),
        help("element ids look like `type:Name`, `field:Name.x` or `method:Name.run()`")
    )]
    InvalidElementId { id: String, reason: String },

    #[error("marker type names must not be empty")]
    #[diagnostic(code(metamark::graph::empty_type_name))]
    EmptyTypeName,

    #[error("`{0}` is a built-in marker type and cannot be redeclared")]
    #[diagnostic(code(metamark::graph::reserved_type))]
    ReservedType(TypeName),

    #[error("`{container}` is declared as the container of both `{first}` and `{second}`")]
    #[diagnostic(code(metamark::graph::container_conflict))]
    ConflictingContainer {
        container: TypeName,
        first: TypeName,
        second: TypeName,
    },

    #[error("malformed `{container}` container: {reason}")]
    #[diagnostic(
        code(metamark::graph::malformed_container),
        help("a container's `value` must be a list of instances of the repeated type")
    )]
    MalformedContainer { container: TypeName, reason: String },

    #[error("`{element}` cannot extend `{parent}`: {reason}")]
    #[diagnostic(code(metamark::graph::extends))]
    InvalidExtends {
        element: String,
        parent: String,
        reason: String,
    },

    #[error("inheritance cycle through `{0}`")]
    #[diagnostic(code(metamark::graph::inheritance_cycle))]
    InheritanceCycle(String),
}
