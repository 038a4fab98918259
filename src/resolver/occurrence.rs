//! Occurrence nodes: one discovered metadata instance plus its provenance.
//!
//! An [`Occurrence`] is a cheap, clonable handle. Children hold a shared reference to their enclosing occurrence;
//! parents never reference children, so chains are finite and free of reference cycles by construction.

use std::fmt;
use std::sync::Arc;

use super::provider::MetadataProvider;

/// Where an instance was read from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Attachment<E, T> {
    /// Attached directly to a program element.
    Element(E),
    /// Attached to a marker type (meta-metadata).
    Type(T),
}

impl<E: fmt::Display, T: fmt::Display> fmt::Display for Attachment<E, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Attachment::Element(element) => write!(f, "{element}"),
            Attachment::Type(ty) => write!(f, "@{ty}"),
        }
    }
}

/// Attachment point specialized to a provider.
pub type AttachmentOf<P> = Attachment<<P as MetadataProvider>::Element, <P as MetadataProvider>::Type>;

/// A metadata instance reached during discovery.
///
/// ## Notes
/// - `enclosing()` is `None` exactly when the instance was attached directly to `element()`.
/// - Instances unwrapped from a container share the container's attachment point and enclosing occurrence; the
///   container itself is only visible through [`Occurrence::container`].
/// - Equality is structural: two occurrences are equal when their instance, element, attachment and whole
///   enclosing chain are equal, regardless of which discovery call created them.
pub struct Occurrence<P: MetadataProvider> {
    node: Arc<Node<P>>,
}

struct Node<P: MetadataProvider> {
    instance: P::Instance,
    ty: P::Type,
    element: P::Element,
    attachment: AttachmentOf<P>,
    container: Option<P::Instance>,
    enclosing: Option<Occurrence<P>>,
    target: Option<P::Type>,
    is_marker: bool,
    depth: usize,
}

/// An unwrapped instance that has not been placed in the discovery tree yet.
#[derive(Debug, Clone)]
pub(crate) struct Candidate<I> {
    pub(crate) instance: I,
    pub(crate) container: Option<I>,
}

impl<P: MetadataProvider> Occurrence<P> {
    pub(crate) fn new(
        candidate: Candidate<P::Instance>,
        ty: P::Type,
        element: P::Element,
        attachment: AttachmentOf<P>,
        enclosing: Option<Occurrence<P>>,
        target: Option<P::Type>,
        is_marker: bool,
    ) -> Self {
        let depth = enclosing.as_ref().map_or(0, |parent| parent.depth() + 1);
        Self {
            node: Arc::new(Node {
                instance: candidate.instance,
                ty,
                element,
                attachment,
                container: candidate.container,
                enclosing,
                target,
                is_marker,
                depth,
            }),
        }
    }

    /// The metadata instance this occurrence wraps.
    pub fn instance(&self) -> &P::Instance {
        &self.node.instance
    }

    /// The marker type of [`Occurrence::instance`].
    pub fn metadata_type(&self) -> &P::Type {
        &self.node.ty
    }

    /// The element the whole chain is anchored to.
    pub fn element(&self) -> &P::Element {
        &self.node.element
    }

    /// The element or marker type the instance was read from.
    pub fn attachment(&self) -> &AttachmentOf<P> {
        &self.node.attachment
    }

    /// The container instance this occurrence was unwrapped from, if any.
    pub fn container(&self) -> Option<&P::Instance> {
        self.node.container.as_ref()
    }

    /// The occurrence whose marker type carried this instance.
    pub fn enclosing(&self) -> Option<&Occurrence<P>> {
        self.node.enclosing.as_ref()
    }

    /// True iff the instance's marker type is directly meta-annotated with the discovery's target marker.
    pub fn is_marker(&self) -> bool {
        self.node.is_marker
    }

    /// The target marker type this occurrence was discovered for, if any.
    ///
    /// Occurrences read for introspection without a target never carry a marker.
    pub fn target_marker(&self) -> Option<&P::Type> {
        self.node.target.as_ref()
    }

    /// Number of enclosing occurrences (0 for element-attached instances).
    pub fn depth(&self) -> usize {
        self.node.depth
    }

    /// Iterate the enclosing chain, nearest first. Does not include `self`.
    pub fn ancestors(&self) -> Ancestors<'_, P> {
        Ancestors { next: self.enclosing() }
    }

    /// The element-attached occurrence at the top of the chain (possibly `self`).
    pub fn root(&self) -> &Occurrence<P> {
        self.ancestors().last().unwrap_or(self)
    }

    /// Return true if `ty` is the marker type of `self` or of any enclosing occurrence.
    pub fn is_on_path(&self, ty: &P::Type) -> bool {
        self.metadata_type() == ty || self.ancestors().any(|a| a.metadata_type() == ty)
    }

    /// Return true if this occurrence's type is already being expanded further up its chain.
    pub fn is_recurring(&self) -> bool {
        self.enclosing()
            .is_some_and(|parent| parent.is_on_path(self.metadata_type()))
    }

    /// Render the chain as `Leaf <- Parent <- ... <- element`.
    pub fn provenance(&self) -> String {
        let mut out = self.metadata_type().to_string();
        for ancestor in self.ancestors() {
            out.push_str(" <- ");
            out.push_str(&ancestor.metadata_type().to_string());
        }
        out.push_str(" <- ");
        out.push_str(&self.element().to_string());
        out
    }

    /// Return true if both handles point at the same node (object identity, not structural equality).
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.node, &other.node)
    }
}

impl<P: MetadataProvider> Clone for Occurrence<P> {
    fn clone(&self) -> Self {
        Self {
            node: Arc::clone(&self.node),
        }
    }
}

impl<P: MetadataProvider> PartialEq for Occurrence<P> {
    fn eq(&self, other: &Self) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        let n = &self.node;
        let o = &other.node;
        n.instance == o.instance
            && n.ty == o.ty
            && n.element == o.element
            && n.attachment == o.attachment
            && n.container == o.container
            && n.target == o.target
            && n.is_marker == o.is_marker
            && n.enclosing == o.enclosing
    }
}

impl<P: MetadataProvider> fmt::Debug for Occurrence<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Occurrence")
            .field("instance", self.instance())
            .field("attachment", &self.attachment().to_string())
            .field("is_marker", &self.is_marker())
            .field("provenance", &self.provenance())
            .finish()
    }
}

/// Iterator over an occurrence's enclosing chain.
pub struct Ancestors<'a, P: MetadataProvider> {
    next: Option<&'a Occurrence<P>>,
}

impl<'a, P: MetadataProvider> Iterator for Ancestors<'a, P> {
    type Item = &'a Occurrence<P>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.enclosing();
        Some(current)
    }
}
