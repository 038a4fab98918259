//! Recursive marker discovery over metadata graphs.
//!
//! Given a program element decorated with metadata, find every metadata instance whose marker type carries a
//! designated *target marker*, however deeply it is nested inside composed meta-metadata. Each result is an
//! [`Occurrence`] that remembers the chain of enclosing instances it was reached through.
//!
//! ## Pipeline
//!
//! - [`MetadataProvider`] (`provider`): read-only access to the graph. Implemented by callers.
//! - Container unwrapping (`unwrap`): repeated-marker containers are replaced by their components at every level.
//! - Traversal ([`Resolver`], [`Discover`]): lazy depth-first walk with predicate pruning and a per-path cycle
//!   guard.
//! - [`predicates`]: combinators for the pruning hook (pass-through, closures, boolean composition, gating).
//!
//! ## Notes
//! - The resolver never interprets metadata. What a gating instance means is decided by the predicate passed in.
//! - Provider errors are yielded as-is; there is no retry and nothing is logged-and-swallowed.
//!
//! ## Examples
//! ```rust,ignore
//! use metamark::resolver::{Resolver, predicates};
//!
//! let resolver = Resolver::new(&graph).with_terminal_types(graph.builtin_types());
//! for occurrence in resolver.discover(predicates::always(), &element, &marker) {
//!     let occurrence = occurrence?;
//!     println!("{}", occurrence.provenance());
//! }
//! ```

mod occurrence;
pub mod predicates;
mod provider;
mod unwrap;
mod walk;

pub use occurrence::{Ancestors, Attachment, AttachmentOf, Occurrence};
pub use predicates::{Predicate, PredicateExt};
pub use provider::MetadataProvider;
pub use unwrap::unwrap;
pub use walk::{Discover, Resolver, WalkStats, discover};
