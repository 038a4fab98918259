//! Text and JSON rendering of discovery results.

use std::fmt::Write as _;

use serde::Serialize;

use crate::model::{ElementId, GraphError, Instance, MetadataGraph, TypeName};
use crate::resolver::{Occurrence, Resolver};

/// A discovered occurrence over a [`MetadataGraph`].
pub type GraphOccurrence = Occurrence<MetadataGraph>;

/// One line per occurrence: the instance, then each enclosing instance, then the element.
///
/// ```text
/// @Leaf(value="a") <- @Composite <- type:Widget
/// ```
pub fn render_text(occurrences: &[GraphOccurrence]) -> String {
    if occurrences.is_empty() {
        return "no occurrences found\n".to_string();
    }
    let mut out = String::new();
    for occurrence in occurrences {
        let _ = writeln!(out, "{}", chain_line(occurrence));
    }
    out
}

fn chain_line(occurrence: &GraphOccurrence) -> String {
    let mut line = occurrence.instance().to_string();
    for ancestor in occurrence.ancestors() {
        let _ = write!(line, " <- {}", ancestor.instance());
    }
    let _ = write!(line, " <- {}", occurrence.element());
    line
}

#[derive(Debug, Serialize)]
struct OccurrenceRecord<'a> {
    element: String,
    instance: &'a Instance,
    depth: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    container: Option<&'a TypeName>,
    /// Enclosing instances, nearest first.
    chain: Vec<&'a Instance>,
}

impl<'a> OccurrenceRecord<'a> {
    fn new(occurrence: &'a GraphOccurrence) -> Self {
        Self {
            element: occurrence.element().to_string(),
            instance: occurrence.instance(),
            depth: occurrence.depth(),
            container: occurrence.container().map(|container| &container.ty),
            chain: occurrence.ancestors().map(|a| a.instance()).collect(),
        }
    }
}

/// A pretty-printed JSON array with one record per occurrence.
///
/// ## Errors
/// Serialization failures from `serde_json`.
pub fn render_json(occurrences: &[GraphOccurrence]) -> Result<String, serde_json::Error> {
    let records: Vec<OccurrenceRecord<'_>> = occurrences.iter().map(OccurrenceRecord::new).collect();
    serde_json::to_string_pretty(&records)
}

/// The meta-occurrence tree below an element, two spaces per level.
///
/// Instances whose type carries the target marker are suffixed with `*`. Terminal types and types already on
/// the path are shown but not expanded.
///
/// ## Errors
/// Graph lookups that fail while expanding.
pub fn render_tree(
    resolver: &Resolver<'_, MetadataGraph>,
    element: &ElementId,
    roots: &[GraphOccurrence],
) -> Result<String, GraphError> {
    let mut out = format!("{element}\n");
    for root in roots {
        write_node(resolver, root, &mut out)?;
    }
    Ok(out)
}

fn write_node(
    resolver: &Resolver<'_, MetadataGraph>,
    occurrence: &GraphOccurrence,
    out: &mut String,
) -> Result<(), GraphError> {
    let ty = occurrence.metadata_type();
    let _ = write!(out, "{}{}", "  ".repeat(occurrence.depth() + 1), occurrence.instance());
    if occurrence.is_marker() {
        out.push_str(" *");
    }
    if resolver.is_terminal(ty) {
        out.push_str(" (terminal)");
    } else if occurrence.is_recurring() {
        out.push_str(" (cycle)");
    }
    out.push('\n');
    for child in resolver.meta_occurrences(occurrence)? {
        write_node(resolver, &child, out)?;
    }
    Ok(())
}
