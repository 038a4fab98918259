//! Predicate combinators for pruning discovery.
//!
//! A [`Predicate`] is evaluated on every candidate occurrence **before** it is yielded or expanded. Returning
//! `false` prunes the candidate and its whole subtree. The resolver treats predicates as opaque; what they check
//! (conditions, flags, depth limits) is entirely up to the caller.
//!
//! ## Examples
//! ```rust,ignore
//! use metamark::resolver::predicates::{self, PredicateExt};
//!
//! let gate = predicates::gated_by(conditional_ty, |inst: &Instance| evaluate(inst));
//! let filter = gate.and(predicates::from_fn(|o: &Occurrence<MetadataGraph>| o.depth() < 8));
//! ```

use super::occurrence::Occurrence;
use super::provider::MetadataProvider;
use super::unwrap::unwrap;

/// Decide whether a candidate occurrence is kept.
pub trait Predicate<P: MetadataProvider> {
    /// Return `Ok(true)` to keep `occurrence` (and descend into it), `Ok(false)` to prune it.
    ///
    /// ## Errors
    /// Provider failures hit while inspecting the occurrence; discovery surfaces them unmodified.
    fn test(&self, provider: &P, occurrence: &Occurrence<P>) -> Result<bool, P::Error>;
}

impl<P: MetadataProvider, Q: Predicate<P> + ?Sized> Predicate<P> for &Q {
    fn test(&self, provider: &P, occurrence: &Occurrence<P>) -> Result<bool, P::Error> {
        (**self).test(provider, occurrence)
    }
}

impl<P: MetadataProvider, Q: Predicate<P> + ?Sized> Predicate<P> for Box<Q> {
    fn test(&self, provider: &P, occurrence: &Occurrence<P>) -> Result<bool, P::Error> {
        (**self).test(provider, occurrence)
    }
}

/// Keeps everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct Always;

/// Prunes everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct Never;

/// Pass-through predicate.
pub fn always() -> Always {
    Always
}

/// Predicate that prunes every candidate (discovery yields nothing).
pub fn never() -> Never {
    Never
}

impl<P: MetadataProvider> Predicate<P> for Always {
    fn test(&self, _provider: &P, _occurrence: &Occurrence<P>) -> Result<bool, P::Error> {
        Ok(true)
    }
}

impl<P: MetadataProvider> Predicate<P> for Never {
    fn test(&self, _provider: &P, _occurrence: &Occurrence<P>) -> Result<bool, P::Error> {
        Ok(false)
    }
}

/// Infallible predicate backed by a closure.
#[derive(Debug, Clone, Copy)]
pub struct FromFn<F>(F);

/// Wrap a closure over the occurrence as a predicate.
pub fn from_fn<P, F>(f: F) -> FromFn<F>
where
    P: MetadataProvider,
    F: Fn(&Occurrence<P>) -> bool,
{
    FromFn(f)
}

impl<P, F> Predicate<P> for FromFn<F>
where
    P: MetadataProvider,
    F: Fn(&Occurrence<P>) -> bool,
{
    fn test(&self, _provider: &P, occurrence: &Occurrence<P>) -> Result<bool, P::Error> {
        Ok((self.0)(occurrence))
    }
}

/// Negation of a predicate.
#[derive(Debug, Clone, Copy)]
pub struct Not<A>(A);

/// Both predicates must keep the candidate. `B` is not evaluated when `A` prunes.
#[derive(Debug, Clone, Copy)]
pub struct And<A, B>(A, B);

/// Either predicate may keep the candidate. `B` is not evaluated when `A` keeps.
#[derive(Debug, Clone, Copy)]
pub struct Or<A, B>(A, B);

impl<P: MetadataProvider, A: Predicate<P>> Predicate<P> for Not<A> {
    fn test(&self, provider: &P, occurrence: &Occurrence<P>) -> Result<bool, P::Error> {
        Ok(!self.0.test(provider, occurrence)?)
    }
}

impl<P: MetadataProvider, A: Predicate<P>, B: Predicate<P>> Predicate<P> for And<A, B> {
    fn test(&self, provider: &P, occurrence: &Occurrence<P>) -> Result<bool, P::Error> {
        Ok(self.0.test(provider, occurrence)? && self.1.test(provider, occurrence)?)
    }
}

impl<P: MetadataProvider, A: Predicate<P>, B: Predicate<P>> Predicate<P> for Or<A, B> {
    fn test(&self, provider: &P, occurrence: &Occurrence<P>) -> Result<bool, P::Error> {
        Ok(self.0.test(provider, occurrence)? || self.1.test(provider, occurrence)?)
    }
}

/// Method-style composition for any predicate.
pub trait PredicateExt<P: MetadataProvider>: Predicate<P> + Sized {
    fn and<B: Predicate<P>>(self, other: B) -> And<Self, B> {
        And(self, other)
    }

    fn or<B: Predicate<P>>(self, other: B) -> Or<Self, B> {
        Or(self, other)
    }

    fn not(self) -> Not<Self> {
        Not(self)
    }
}

impl<P: MetadataProvider, A: Predicate<P>> PredicateExt<P> for A {}

/// Keeps candidates whose marker type is `ty`.
#[derive(Debug, Clone)]
pub struct OfType<T>(T);

/// Match on the candidate's marker type. Usually combined with `not()` to cut specific branches.
pub fn of_type<T>(ty: T) -> OfType<T> {
    OfType(ty)
}

impl<P: MetadataProvider> Predicate<P> for OfType<P::Type> {
    fn test(&self, _provider: &P, occurrence: &Occurrence<P>) -> Result<bool, P::Error> {
        Ok(occurrence.metadata_type() == &self.0)
    }
}

/// Applies an inner predicate to the candidate and every enclosing occurrence.
#[derive(Debug, Clone, Copy)]
pub struct WholeChain<A>(A);

/// Keep a candidate only if `inner` keeps it and each of its ancestors.
pub fn whole_chain<A>(inner: A) -> WholeChain<A> {
    WholeChain(inner)
}

impl<P: MetadataProvider, A: Predicate<P>> Predicate<P> for WholeChain<A> {
    fn test(&self, provider: &P, occurrence: &Occurrence<P>) -> Result<bool, P::Error> {
        if !self.0.test(provider, occurrence)? {
            return Ok(false);
        }
        for ancestor in occurrence.ancestors() {
            if !self.0.test(provider, ancestor)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

/// Gating on a condition marker.
///
/// A candidate is kept only if, for it and every ancestor, each instance of the gating marker attached to the
/// occurrence's marker type evaluates true. Occurrences whose type carries no gating instance are unaffected.
#[derive(Debug, Clone)]
pub struct Gated<T, F> {
    gate: T,
    evaluate: F,
}

/// Build a gating predicate from the gating marker type and a condition evaluator.
pub fn gated_by<T, F>(gate: T, evaluate: F) -> Gated<T, F> {
    Gated { gate, evaluate }
}

fn gate_open<P, F>(gate: &P::Type, evaluate: &F, provider: &P, occurrence: &Occurrence<P>) -> Result<bool, P::Error>
where
    P: MetadataProvider,
    F: Fn(&P::Instance) -> bool,
{
    for instance in provider.type_metadata(occurrence.metadata_type())? {
        for component in unwrap(provider, &instance)? {
            if &provider.type_of(&component) == gate && !evaluate(&component) {
                tracing::trace!(gate = %gate, guarded = %occurrence.metadata_type(), "gate evaluated false");
                return Ok(false);
            }
        }
    }
    Ok(true)
}

impl<P, F> Predicate<P> for Gated<P::Type, F>
where
    P: MetadataProvider,
    F: Fn(&P::Instance) -> bool,
{
    fn test(&self, provider: &P, occurrence: &Occurrence<P>) -> Result<bool, P::Error> {
        if !gate_open(&self.gate, &self.evaluate, provider, occurrence)? {
            return Ok(false);
        }
        for ancestor in occurrence.ancestors() {
            if !gate_open(&self.gate, &self.evaluate, provider, ancestor)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}
