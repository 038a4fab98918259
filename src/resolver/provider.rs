//! The boundary between the resolver and whatever owns the metadata.
//!
//! The resolver never builds or mutates metadata. It asks a [`MetadataProvider`] for the instances attached to an
//! element or to a marker type, and for how repeated instances are packed into containers. Implementations may be
//! static tables, reflection over runtime descriptors, or a decorator registry; see
//! [`crate::model::MetadataGraph`] for the in-memory one used by the CLI.

use std::fmt;
use std::hash::Hash;

/// Read-only access to a metadata graph.
///
/// ## Notes
/// - Every method is expected to be pure: the same arguments return the same answer for the lifetime of one
///   discovery. The resolver performs no retries and caches nothing across calls.
/// - "No metadata" is an empty `Vec`, never an error.
/// - Errors are surfaced to the caller of [`crate::resolver::Resolver::discover`] unmodified.
pub trait MetadataProvider {
    /// A program element able to carry metadata (a type, field, or method).
    type Element: Clone + Eq + Hash + fmt::Debug + fmt::Display;
    /// The identity of a marker type.
    type Type: Clone + Eq + Hash + fmt::Debug + fmt::Display;
    /// One attached metadata value.
    type Instance: Clone + PartialEq + fmt::Debug;
    /// Failure raised while enumerating metadata.
    type Error: std::error::Error;

    /// Return the instances attached directly to `element`, in declaration order.
    fn element_metadata(&self, element: &Self::Element) -> Result<Vec<Self::Instance>, Self::Error>;

    /// Return the meta-metadata attached to the marker type `ty`, in declaration order.
    fn type_metadata(&self, ty: &Self::Type) -> Result<Vec<Self::Instance>, Self::Error>;

    /// Return the marker type of `instance`.
    fn type_of(&self, instance: &Self::Instance) -> Self::Type;

    /// If `ty` is a container for a repeatable marker type, return the repeated type.
    fn container_of(&self, ty: &Self::Type) -> Result<Option<Self::Type>, Self::Error>;

    /// Return the repeated instances held by a container instance, in declaration order.
    fn components_of(&self, container: &Self::Instance) -> Result<Vec<Self::Instance>, Self::Error>;
}
