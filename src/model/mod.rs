//! A concrete, in-memory metadata provider.
//!
//! ## Modules
//!
//! - `value` - marker type names, instances and attribute values
//! - `element` - `kind:name` program element ids
//! - `graph` - the validated [`MetadataGraph`] and its builder
//! - `loader` - JSON graph documents
//! - `conditions` - evaluation of gating instances against enabled flags
//! - `errors` - [`GraphError`] and document diagnostics

mod conditions;
mod element;
mod errors;
mod graph;
mod loader;
mod value;

pub use conditions::Conditions;
pub use element::ElementId;
pub use errors::{DocumentError, GraphError};
pub use graph::{GraphBuilder, LintWarning, MetadataGraph};
pub use loader::LoadError;
pub use value::{AttrValue, Instance, TypeName};

#[cfg(test)]
mod tests;
