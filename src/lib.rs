#![forbid(unsafe_code)]
//! metamark: recursive marker discovery over metadata graphs
//!
//! Program elements (types, fields, methods) carry metadata instances; marker types carry meta-metadata of their
//! own, which may compose further marker types, repeat through containers, and refer back to themselves. This
//! crate finds every instance whose marker type is marked with a designated target marker, however deeply it is
//! nested, and reports the chain it was reached through.
//!
//! ## Modules
//!
//! - [`resolver`]: the provider trait, occurrences, container unwrapping, the lazy traversal and predicates.
//!   Generic over any [`resolver::MetadataProvider`].
//! - [`model`]: an in-memory provider loaded from JSON graph documents.
//! - [`config`], [`render`], [`cli`]: the `metamark` command-line tool.
//!
//! ## Panic Policy
//!
//! This codebase follows explicit error handling:
//!
//! - **Production code**: Use `Result` or `Option` with `?` / `ok_or` / `map_err`. The `cli` module enforces
//!   `#![deny(clippy::unwrap_used)]`.
//!
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.
//!
//! - **True invariants**: If a panic represents a logic error in this crate, use `unreachable!("INVARIANT: reason")`
//!   with a clear explanation.

pub mod cli;
pub mod config;
pub mod model;
pub mod render;
pub mod resolver;

pub use config::{DiscoverConfig, OutputFormat};
pub use model::{ElementId, GraphError, Instance, MetadataGraph, TypeName};
pub use resolver::{MetadataProvider, Occurrence, Predicate, PredicateExt, Resolver, discover};
