//! Element kind vocabulary.
//!
//! Program elements carry metadata; each element has a kind. The same spellings are used in two places:
//! - as the `kind:` prefix of element ids in graph documents (`type:Widget`, `field:Widget.port`), and
//! - as the values of a `Target` marker, restricting where a marker type may be attached.
//!
//! ## Notes
//! - Canonical spellings are upper case (`TYPE`); lower-case aliases exist for element ids (`type`).

use crate::registry::{ItemInfo, Since, Stability};

/// Stable identifier for an element kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TargetId {
    Type,
    Field,
    Method,
    MarkerType,
}

/// Canonical spelling of [`TargetId::MarkerType`].
pub const MARKER_TYPE: &str = "ANNOTATION_TYPE";

/// Metadata for an element kind.
pub type TargetInfo = ItemInfo<TargetId>;

/// Registry of all element kinds.
pub const TARGETS: &[TargetInfo] = &[
    info(TargetId::Type, "TYPE", &["type"], "A type declaration."),
    info(TargetId::Field, "FIELD", &["field"], "A field of a type."),
    info(TargetId::Method, "METHOD", &["method"], "A method of a type."),
    info(
        TargetId::MarkerType,
        MARKER_TYPE,
        &["marker"],
        "A marker type declaration (meta-metadata).",
    ),
];

/// Resolve an element kind spelling (canonical or alias) to its id.
pub fn from_str(name: &str) -> Option<TargetId> {
    TARGETS.iter().find(|t| t.matches(name)).map(|t| t.id)
}

/// Return the canonical spelling for an element kind.
pub fn as_str(id: TargetId) -> &'static str {
    info_for(id).canonical
}

/// Return the lower-case spelling used as an element id prefix.
pub fn prefix(id: TargetId) -> &'static str {
    info_for(id).aliases.first().copied().unwrap_or(info_for(id).canonical)
}

/// Return the metadata entry for an element kind.
pub fn info_for(id: TargetId) -> &'static TargetInfo {
    match TARGETS.iter().find(|t| t.id == id) {
        Some(info) => info,
        None => unreachable!("INVARIANT: every TargetId has a registry entry"),
    }
}

const fn info(
    id: TargetId,
    canonical: &'static str,
    aliases: &'static [&'static str],
    description: &'static str,
) -> TargetInfo {
    ItemInfo {
        id,
        canonical,
        aliases,
        description,
        since: Since(0, 1),
        stability: Stability::Stable,
    }
}
