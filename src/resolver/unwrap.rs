//! Container unwrapping for repeatable marker types.
//!
//! A repeatable marker type has a container type whose only attribute is the list of repeated instances. Containers
//! are bookkeeping, never discovery results: wherever they appear (on an element or deep inside meta-metadata) they
//! are replaced by their components, in order, and containers nested inside containers are flattened the same way.

use super::occurrence::Candidate;
use super::provider::MetadataProvider;

/// Expand one instance: its components if it is a container, otherwise the instance itself.
///
/// Components that are containers themselves are expanded in turn, so the result never holds a container. A
/// container type that recurs inside its own components is dropped rather than expanded again.
///
/// ## Errors
/// Provider failures from `container_of` / `components_of` are returned unmodified.
pub fn unwrap<P: MetadataProvider>(provider: &P, instance: &P::Instance) -> Result<Vec<P::Instance>, P::Error> {
    let mut out = Vec::new();
    expand(provider, instance.clone(), &mut Vec::new(), &mut out)?;
    Ok(out)
}

fn expand<P: MetadataProvider>(
    provider: &P,
    instance: P::Instance,
    open: &mut Vec<P::Type>,
    out: &mut Vec<P::Instance>,
) -> Result<(), P::Error> {
    let ty = provider.type_of(&instance);
    let Some(repeated) = provider.container_of(&ty)? else {
        out.push(instance);
        return Ok(());
    };
    if open.contains(&ty) {
        tracing::trace!(container = %ty, "container nested in itself, skipped");
        return Ok(());
    }

    let components = provider.components_of(&instance)?;
    tracing::trace!(container = %ty, repeated = %repeated, count = components.len(), "unwrapped container");
    open.push(ty);
    for component in components {
        expand(provider, component, open, out)?;
    }
    open.pop();
    Ok(())
}

/// Expand a list of attached instances into traversal candidates, remembering the outermost source container.
pub(crate) fn unwrap_all<P: MetadataProvider>(
    provider: &P,
    instances: Vec<P::Instance>,
) -> Result<Vec<Candidate<P::Instance>>, P::Error> {
    let mut out = Vec::with_capacity(instances.len());
    for instance in instances {
        let ty = provider.type_of(&instance);
        if provider.container_of(&ty)?.is_none() {
            out.push(Candidate {
                instance,
                container: None,
            });
            continue;
        }

        let components = unwrap(provider, &instance)?;
        out.extend(components.into_iter().map(|component| Candidate {
            instance: component,
            container: Some(instance.clone()),
        }));
    }
    Ok(out)
}

/// Return true if `ty` carries an instance of `marker` among its (unwrapped) meta-metadata.
pub(crate) fn carries_marker<P: MetadataProvider>(
    provider: &P,
    ty: &P::Type,
    marker: &P::Type,
) -> Result<bool, P::Error> {
    for instance in provider.type_metadata(ty)? {
        for component in unwrap(provider, &instance)? {
            if &provider.type_of(&component) == marker {
                return Ok(true);
            }
        }
    }
    Ok(false)
}
