//! Provide the canonical vocabulary shared by metamark's resolver, graph model and CLI.
//!
//! This crate is intentionally small and dependency-free. It holds `const` registries for:
//! - the built-in structural markers every metadata graph starts with (`Retention`, `Target`, ...), and
//! - the element kinds a `Target` marker can name (`TYPE`, `FIELD`, ...).
//!
//! ## Notes
//!
//! - This is a "vocabulary" crate: **no IO**, no global state, and no graph or traversal types.
//! - Callers work with stable ids ([`markers::BuiltinMarkerId`], [`targets::TargetId`]) and look up spellings via
//!   the registry tables instead of comparing strings ad hoc.
//!
//! ## Examples
//! ```rust
//! use metamark_core::markers::{self, BuiltinMarkerId};
//!
//! assert_eq!(markers::from_str("Repeatable"), Some(BuiltinMarkerId::Repeatable));
//! assert_eq!(markers::as_str(BuiltinMarkerId::Target), "Target");
//! ```

pub mod markers;
pub mod registry;
pub mod targets;
