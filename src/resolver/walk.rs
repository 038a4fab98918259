//! The traversal engine.
//!
//! Discovery is a depth-first, pre-order walk over attached metadata and meta-metadata, driven by an explicit
//! frame stack so the result can be pulled lazily:
//!
//! 1. The element's direct metadata is unwrapped into root candidates (`enclosing = None`).
//! 2. Each candidate is run through the caller's predicate. A pruned candidate takes its whole subtree with it.
//! 3. A kept candidate is expanded (its marker type's meta-metadata becomes the next frame) unless its type is
//!    terminal or already being expanded further up the same path.
//! 4. A kept candidate whose type directly carries the target marker is yielded. Expansion happens regardless, so
//!    markers nested below other markers are found too.
//!
//! The path set holds the marker types currently being expanded (one per open frame). It is per-walk state owned
//! by the iterator; a [`Resolver`] itself is immutable and can serve any number of concurrent walks.

use std::collections::{HashSet, VecDeque};

use super::occurrence::{Attachment, Occurrence};
use super::predicates::Predicate;
use super::provider::MetadataProvider;
use super::unwrap::{carries_marker, unwrap_all};

/// Entry point for discovery over one provider.
///
/// ## Notes
/// - Terminal types are still candidates (filtered, marker-checked, yielded) but their meta-metadata is never
///   expanded. Seeding them with the provider's built-in structural markers keeps walks away from the
///   self-annotated core of the graph; the path guard alone is enough for termination.
pub struct Resolver<'p, P: MetadataProvider> {
    provider: &'p P,
    terminal: HashSet<P::Type>,
}

impl<'p, P: MetadataProvider> Resolver<'p, P> {
    /// Create a resolver with no terminal types.
    pub fn new(provider: &'p P) -> Self {
        Self {
            provider,
            terminal: HashSet::new(),
        }
    }

    /// Mark `types` as terminal: never expanded during discovery or by [`Resolver::meta_occurrences`].
    pub fn with_terminal_types(mut self, types: impl IntoIterator<Item = P::Type>) -> Self {
        self.terminal.extend(types);
        self
    }

    /// Return true if `ty` is never expanded.
    pub fn is_terminal(&self, ty: &P::Type) -> bool {
        self.terminal.contains(ty)
    }

    /// Lazily discover every occurrence under `element` whose marker type carries `marker`.
    ///
    /// ## Returns
    /// - A fresh iterator. No provider call happens until the first `next()`. Calling `discover` again with the
    ///   same arguments yields a structurally equal sequence.
    ///
    /// ## Notes
    /// - Yields `Err` once if the provider fails, then ends. Occurrences yielded before the failure stay valid.
    pub fn discover<F: Predicate<P>>(&self, filter: F, element: &P::Element, marker: &P::Type) -> Discover<'_, P, F> {
        let span = tracing::debug_span!("discover", element = %element, marker = %marker);
        Discover::new(
            self.provider,
            Some(&self.terminal),
            filter,
            Some(marker.clone()),
            Seed::Element(element.clone()),
            HashSet::new(),
            span,
        )
    }

    /// Return the occurrences for the instances attached directly to `element` (unwrapped, unfiltered).
    ///
    /// Each is marker-checked against `marker`; this is the first level [`Resolver::discover`] walks. Without a
    /// marker no occurrence is flagged.
    pub fn element_occurrences(
        &self,
        element: &P::Element,
        marker: Option<&P::Type>,
    ) -> Result<Vec<Occurrence<P>>, P::Error> {
        roots(self.provider, element, marker)
    }

    /// Return the occurrences for the instances attached to `occurrence`'s marker type (one level, unwrapped,
    /// unfiltered), each enclosed by `occurrence`.
    ///
    /// ## Returns
    /// - Empty if the type is terminal or already expanded further up the chain.
    ///
    /// ## Errors
    /// Provider failures, unmodified.
    pub fn meta_occurrences(&self, occurrence: &Occurrence<P>) -> Result<Vec<Occurrence<P>>, P::Error> {
        if self.is_terminal(occurrence.metadata_type()) || occurrence.is_recurring() {
            return Ok(Vec::new());
        }
        children(self.provider, occurrence)
    }

    /// Re-run discovery scoped to the subtree below `occurrence` (excluding `occurrence` itself).
    ///
    /// The target marker is the one `occurrence` was discovered for; without one the sequence is empty. Types on
    /// `occurrence`'s chain count as already expanded.
    pub fn enclosed_occurrences<F: Predicate<P>>(&self, occurrence: &Occurrence<P>, filter: F) -> Discover<'_, P, F> {
        let span = tracing::debug_span!(
            "enclosed",
            element = %occurrence.element(),
            root = %occurrence.metadata_type(),
            marker = ?occurrence.target_marker()
        );
        let mut path: HashSet<P::Type> = occurrence.ancestors().map(|a| a.metadata_type().clone()).collect();
        let marker = occurrence.target_marker().cloned();
        let seed = if marker.is_none() || self.is_terminal(occurrence.metadata_type()) || occurrence.is_recurring() {
            Seed::Nothing
        } else {
            path.insert(occurrence.metadata_type().clone());
            Seed::Below(occurrence.clone())
        };
        Discover::new(
            self.provider,
            Some(&self.terminal),
            filter,
            marker,
            seed,
            path,
            span,
        )
    }
}

fn check_marker<P: MetadataProvider>(provider: &P, ty: &P::Type, marker: Option<&P::Type>) -> Result<bool, P::Error> {
    match marker {
        Some(marker) => carries_marker(provider, ty, marker),
        None => Ok(false),
    }
}

fn roots<P: MetadataProvider>(
    provider: &P,
    element: &P::Element,
    marker: Option<&P::Type>,
) -> Result<Vec<Occurrence<P>>, P::Error> {
    let instances = provider.element_metadata(element)?;
    let mut out = Vec::with_capacity(instances.len());
    for candidate in unwrap_all(provider, instances)? {
        let ty = provider.type_of(&candidate.instance);
        let is_marker = check_marker(provider, &ty, marker)?;
        out.push(Occurrence::new(
            candidate,
            ty,
            element.clone(),
            Attachment::Element(element.clone()),
            None,
            marker.cloned(),
            is_marker,
        ));
    }
    Ok(out)
}

fn children<P: MetadataProvider>(provider: &P, parent: &Occurrence<P>) -> Result<Vec<Occurrence<P>>, P::Error> {
    let parent_ty = parent.metadata_type();
    let marker = parent.target_marker();
    let instances = provider.type_metadata(parent_ty)?;
    let mut out = Vec::with_capacity(instances.len());
    for candidate in unwrap_all(provider, instances)? {
        let ty = provider.type_of(&candidate.instance);
        let is_marker = check_marker(provider, &ty, marker)?;
        out.push(Occurrence::new(
            candidate,
            ty,
            parent.element().clone(),
            Attachment::Type(parent_ty.clone()),
            Some(parent.clone()),
            marker.cloned(),
            is_marker,
        ));
    }
    Ok(out)
}

/// Discover with no terminal types.
///
/// Equivalent to `Resolver::new(provider).discover(filter, element, marker)`; only the path guard bounds the walk.
pub fn discover<'p, P, F>(filter: F, provider: &'p P, element: &P::Element, marker: &P::Type) -> Discover<'p, P, F>
where
    P: MetadataProvider,
    F: Predicate<P>,
{
    let span = tracing::debug_span!("discover", element = %element, marker = %marker);
    Discover::new(
        provider,
        None,
        filter,
        Some(marker.clone()),
        Seed::Element(element.clone()),
        HashSet::new(),
        span,
    )
}

enum Seed<P: MetadataProvider> {
    Element(P::Element),
    Below(Occurrence<P>),
    Nothing,
}

struct Frame<P: MetadataProvider> {
    pending: VecDeque<Occurrence<P>>,
    /// Type whose meta-metadata this frame holds; removed from the path set when the frame is exhausted.
    expanding: Option<P::Type>,
}

/// Lazy discovery sequence returned by [`discover`], [`Resolver::discover`] and [`Resolver::enclosed_occurrences`].
pub struct Discover<'r, P: MetadataProvider, F> {
    provider: &'r P,
    terminal: Option<&'r HashSet<P::Type>>,
    filter: F,
    marker: Option<P::Type>,
    seed: Option<Seed<P>>,
    stack: Vec<Frame<P>>,
    path: HashSet<P::Type>,
    deferred: Option<P::Error>,
    finished: bool,
    stats: WalkStats,
    span: tracing::Span,
}

/// Counters reported when a walk finishes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkStats {
    /// Occurrences yielded.
    pub yielded: usize,
    /// Candidates rejected by the predicate.
    pub pruned: usize,
    /// Candidates not expanded because their type was already on the path.
    pub guarded: usize,
    /// Candidates not expanded because their type is terminal.
    pub terminal: usize,
}

impl<'r, P: MetadataProvider, F: Predicate<P>> Discover<'r, P, F> {
    fn new(
        provider: &'r P,
        terminal: Option<&'r HashSet<P::Type>>,
        filter: F,
        marker: Option<P::Type>,
        seed: Seed<P>,
        path: HashSet<P::Type>,
        span: tracing::Span,
    ) -> Self {
        Self {
            provider,
            terminal,
            filter,
            marker,
            seed: Some(seed),
            stack: Vec::new(),
            path,
            deferred: None,
            finished: false,
            stats: WalkStats::default(),
            span,
        }
    }

    fn is_terminal(&self, ty: &P::Type) -> bool {
        self.terminal.is_some_and(|terminal| terminal.contains(ty))
    }

    /// Counters for the walk so far.
    pub fn stats(&self) -> WalkStats {
        self.stats
    }

    fn step(&mut self) -> Result<Option<Occurrence<P>>, P::Error> {
        if let Some(err) = self.deferred.take() {
            return Err(err);
        }

        if let Some(seed) = self.seed.take() {
            let pending = match seed {
                Seed::Element(element) => roots(self.provider, &element, self.marker.as_ref())?,
                Seed::Below(occurrence) => children(self.provider, &occurrence)?,
                Seed::Nothing => Vec::new(),
            };
            self.stack.push(Frame {
                pending: pending.into(),
                expanding: None,
            });
        }

        loop {
            let Some(frame) = self.stack.last_mut() else {
                return Ok(None);
            };
            let Some(candidate) = frame.pending.pop_front() else {
                if let Some(ty) = self.stack.pop().and_then(|f| f.expanding) {
                    self.path.remove(&ty);
                }
                continue;
            };

            if !self.filter.test(self.provider, &candidate)? {
                tracing::trace!(ty = %candidate.metadata_type(), depth = candidate.depth(), "pruned");
                self.stats.pruned += 1;
                continue;
            }

            let ty = candidate.metadata_type();
            if self.is_terminal(ty) {
                self.stats.terminal += 1;
            } else if self.path.contains(ty) {
                tracing::trace!(ty = %ty, depth = candidate.depth(), "cycle guard: not re-expanding");
                self.stats.guarded += 1;
            } else {
                match children(self.provider, &candidate) {
                    Ok(children) => {
                        if !children.is_empty() {
                            self.path.insert(ty.clone());
                            self.stack.push(Frame {
                                pending: children.into(),
                                expanding: Some(ty.clone()),
                            });
                        }
                    }
                    // Hand out the marker we already have; the failure surfaces on the next pull.
                    Err(err) if candidate.is_marker() => {
                        self.deferred = Some(err);
                        self.stats.yielded += 1;
                        return Ok(Some(candidate));
                    }
                    Err(err) => return Err(err),
                }
            }

            if candidate.is_marker() {
                self.stats.yielded += 1;
                return Ok(Some(candidate));
            }
        }
    }
}

impl<P: MetadataProvider, F: Predicate<P>> Iterator for Discover<'_, P, F> {
    type Item = Result<Occurrence<P>, P::Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let span = self.span.clone();
        let _enter = span.enter();
        match self.step() {
            Ok(Some(occurrence)) => Some(Ok(occurrence)),
            Ok(None) => {
                self.finished = true;
                tracing::debug!(
                    yielded = self.stats.yielded,
                    pruned = self.stats.pruned,
                    guarded = self.stats.guarded,
                    terminal = self.stats.terminal,
                    "discovery finished"
                );
                None
            }
            Err(err) => {
                self.finished = true;
                self.stack.clear();
                Some(Err(err))
            }
        }
    }
}

impl<P: MetadataProvider, F: Predicate<P>> std::iter::FusedIterator for Discover<'_, P, F> {}
