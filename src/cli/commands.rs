//! Command implementations.
//!
//! Each command is split into a pure `*_output` function (graph in, text out) and a thin wrapper that reads the
//! document and prints. The `*_output` functions are what the integration tests drive.

use std::fs;
use std::path::Path;

use super::{CliError, CliResult, ExitCode};
use crate::config::{DiscoverConfig, OutputFormat};
use crate::model::{ElementId, GraphError, Instance, MetadataGraph, TypeName};
use crate::render;
use crate::resolver::{Predicate, Resolver, predicates};

/// Maximum graph document size (16 MB)
const MAX_SOURCE_SIZE: u64 = 16 * 1024 * 1024;

/// Read a graph document.
///
/// ## Errors
///
/// Returns an error if:
/// - The file cannot be read (I/O error)
/// - The file exceeds `MAX_SOURCE_SIZE` (16 MB)
pub fn read_source(path: &Path) -> CliResult<String> {
    let metadata = fs::metadata(path)
        .map_err(|e| CliError::failure(format!("Cannot access file '{}': {}", path.display(), e)))?;

    if metadata.len() > MAX_SOURCE_SIZE {
        return Err(CliError::failure(format!(
            "Graph document '{}' is too large ({} bytes, max {} bytes)",
            path.display(),
            metadata.len(),
            MAX_SOURCE_SIZE
        )));
    }

    fs::read_to_string(path).map_err(|e| CliError::failure(format!("Error reading file '{}': {}", path.display(), e)))
}

/// Read, parse and validate a graph document.
///
/// Load failures are rendered as miette diagnostics.
pub fn load_graph(path: &Path) -> CliResult<MetadataGraph> {
    let source = read_source(path)?;
    MetadataGraph::from_json(&path.display().to_string(), &source).map_err(report)
}

/// Render a diagnostic (with source context when it has one) as a CLI error.
fn report(err: impl miette::Diagnostic + Send + Sync + 'static) -> CliError {
    CliError::failure(format!("{:?}", miette::Report::new(err)))
}

fn resolve_element(graph: &MetadataGraph, element: &str) -> CliResult<ElementId> {
    let id: ElementId = element.parse().map_err(report)?;
    if !graph.has_element(&id) {
        return Err(report(GraphError::UnknownElement(id.to_string())));
    }
    Ok(id)
}

fn resolve_type(graph: &MetadataGraph, name: &str, role: &str) -> CliResult<TypeName> {
    let ty = TypeName::new(name);
    if !graph.has_type(&ty) {
        return Err(report(GraphError::UnknownType {
            name: ty,
            used_by: role.to_string(),
        }));
    }
    Ok(ty)
}

fn resolver_for(graph: &MetadataGraph, builtins_terminal: bool) -> Resolver<'_, MetadataGraph> {
    let resolver = Resolver::new(graph);
    if builtins_terminal {
        resolver.with_terminal_types(graph.builtin_types())
    } else {
        resolver
    }
}

// ============================================================================
// discover
// ============================================================================

/// Run discovery and render the results according to `config`.
#[tracing::instrument(skip_all, fields(element = %element, marker = %marker))]
pub fn discover_output(graph: &MetadataGraph, element: &str, marker: &str, config: &DiscoverConfig) -> CliResult<String> {
    let element = resolve_element(graph, element)?;
    let marker = resolve_type(graph, marker, "--marker")?;

    let filter: Box<dyn Predicate<MetadataGraph>> = match &config.gate {
        Some(gate) => {
            let gate = resolve_type(graph, gate.as_str(), "--gate")?;
            let conditions = config.conditions();
            Box::new(predicates::gated_by(gate, move |inst: &Instance| conditions.evaluate(inst)))
        }
        None => Box::new(predicates::always()),
    };

    let resolver = resolver_for(graph, config.builtins_terminal);
    let occurrences = resolver
        .discover(filter, &element, &marker)
        .collect::<Result<Vec<_>, _>>()
        .map_err(report)?;
    tracing::debug!(count = occurrences.len(), "discovery complete");

    match config.format {
        OutputFormat::Text => Ok(render::render_text(&occurrences)),
        OutputFormat::Json => render::render_json(&occurrences)
            .map(|mut json| {
                json.push('\n');
                json
            })
            .map_err(|e| CliError::failure(format!("Error serializing results: {e}"))),
    }
}

/// `metamark discover`
pub fn discover(path: &Path, element: &str, marker: &str, config: &DiscoverConfig) -> CliResult<ExitCode> {
    let graph = load_graph(path)?;
    print!("{}", discover_output(&graph, element, marker, config)?);
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// tree
// ============================================================================

/// Render the meta-occurrence tree below `element`.
///
/// Without a marker nothing is flagged.
pub fn tree_output(
    graph: &MetadataGraph,
    element: &str,
    marker: Option<&str>,
    builtins_terminal: bool,
) -> CliResult<String> {
    let element = resolve_element(graph, element)?;
    let marker = marker.map(|name| resolve_type(graph, name, "--marker")).transpose()?;
    let resolver = resolver_for(graph, builtins_terminal);
    let roots = resolver.element_occurrences(&element, marker.as_ref()).map_err(report)?;
    render::render_tree(&resolver, &element, &roots).map_err(report)
}

/// `metamark tree`
pub fn tree(path: &Path, element: &str, marker: Option<&str>, builtins_terminal: bool) -> CliResult<ExitCode> {
    let graph = load_graph(path)?;
    print!("{}", tree_output(&graph, element, marker, builtins_terminal)?);
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// check
// ============================================================================

/// Summarize a loaded graph and its lint warnings. Returns the report and the number of warnings.
pub fn check_output(graph: &MetadataGraph) -> (String, usize) {
    let builtins = graph.builtin_types().len();
    let declared = graph.types().count().saturating_sub(builtins);
    let warnings = graph.lint();

    let mut out = format!(
        "✓ {} marker types ({} built-in), {} elements\n",
        declared,
        builtins,
        graph.elements().count()
    );
    for warning in &warnings {
        out.push_str(&format!("warning: {warning}\n"));
    }
    (out, warnings.len())
}

/// `metamark check`
pub fn check(path: &Path, deny_warnings: bool) -> CliResult<ExitCode> {
    let graph = load_graph(path)?;
    let (summary, warnings) = check_output(&graph);
    print!("{summary}");
    if deny_warnings && warnings > 0 {
        return Ok(ExitCode::WARNINGS);
    }
    Ok(ExitCode::SUCCESS)
}
