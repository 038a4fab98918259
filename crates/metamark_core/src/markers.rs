//! Built-in structural marker vocabulary.
//!
//! Every metadata graph starts with these marker types. They describe other marker types (how long they are
//! retained, where they may be attached, whether they repeat or inherit) and are themselves described by each
//! other: `Documented` is documented, `Target` is targeted, and so on. That mutual, reflexive self-annotation is
//! what makes a naive recursive walk over meta-metadata diverge.
//!
//! ## Notes
//! - Lookup via [`from_str`] is **case-sensitive**.
//! - [`BUILTIN_MARKERS`] order is the order graphs seed the types in.
//!
//! ## Examples
//! ```rust
//! use metamark_core::markers::{self, BuiltinMarkerId};
//!
//! let info = markers::info_for(BuiltinMarkerId::Documented);
//! assert!(info.meta.iter().any(|m| m.marker == BuiltinMarkerId::Documented));
//! ```

use crate::registry::{ItemInfo, Since, Stability};
use crate::targets;

/// Stable identifier for a built-in marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinMarkerId {
    Retention,
    Target,
    Documented,
    Inherited,
    Repeatable,
}

/// Attribute name every built-in marker stores its single argument under.
pub const VALUE_ATTR: &str = "value";

/// Retention value used by the built-in markers themselves.
pub const RETENTION_RUNTIME: &str = "RUNTIME";

/// Value carried by a built-in meta marker instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaValue {
    /// No `value` attribute.
    Absent,
    /// A single text value (e.g. `RUNTIME`).
    Text(&'static str),
    /// A list of text values (e.g. `[ANNOTATION_TYPE]`).
    List(&'static [&'static str]),
}

/// One meta marker instance attached to a built-in marker type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuiltinMeta {
    pub marker: BuiltinMarkerId,
    pub value: MetaValue,
}

/// Metadata for a built-in marker.
///
/// ## Notes
/// - `meta` lists the meta markers attached to the marker type, in declaration order.
#[derive(Debug, Clone, Copy)]
pub struct MarkerInfo {
    pub item: ItemInfo<BuiltinMarkerId>,
    pub meta: &'static [BuiltinMeta],
}

const MARKER_TYPE_TARGETS: &[&str] = &[targets::MARKER_TYPE];

/// Meta markers shared by every built-in marker: documented, retained at runtime, and only attachable to
/// marker types.
const STRUCTURAL_META: &[BuiltinMeta] = &[
    BuiltinMeta {
        marker: BuiltinMarkerId::Documented,
        value: MetaValue::Absent,
    },
    BuiltinMeta {
        marker: BuiltinMarkerId::Retention,
        value: MetaValue::Text(RETENTION_RUNTIME),
    },
    BuiltinMeta {
        marker: BuiltinMarkerId::Target,
        value: MetaValue::List(MARKER_TYPE_TARGETS),
    },
];

/// Registry of all built-in markers.
pub const BUILTIN_MARKERS: &[MarkerInfo] = &[
    info(
        BuiltinMarkerId::Retention,
        "Retention",
        "Declare how long instances of a marker type are retained.",
    ),
    info(
        BuiltinMarkerId::Target,
        "Target",
        "Declare which element kinds a marker type may be attached to.",
    ),
    info(
        BuiltinMarkerId::Documented,
        "Documented",
        "Declare that a marker type is part of its element's public documentation.",
    ),
    info(
        BuiltinMarkerId::Inherited,
        "Inherited",
        "Declare that type-level instances of a marker type are inherited by subtypes.",
    ),
    info(
        BuiltinMarkerId::Repeatable,
        "Repeatable",
        "Declare that a marker type may repeat; `value` names its container type.",
    ),
];

/// Resolve a marker name to its built-in id.
pub fn from_str(name: &str) -> Option<BuiltinMarkerId> {
    if let Some(info) = BUILTIN_MARKERS.iter().find(|m| m.item.canonical == name) {
        return Some(info.item.id);
    }
    BUILTIN_MARKERS
        .iter()
        .find(|m| m.item.aliases.contains(&name))
        .map(|m| m.item.id)
}

/// Return true if `name` spells a built-in marker.
pub fn is_builtin(name: &str) -> bool {
    from_str(name).is_some()
}

/// Return the canonical spelling for a built-in marker.
pub fn as_str(id: BuiltinMarkerId) -> &'static str {
    info_for(id).item.canonical
}

/// Return the metadata entry for a built-in marker.
pub fn info_for(id: BuiltinMarkerId) -> &'static MarkerInfo {
    match BUILTIN_MARKERS.iter().find(|m| m.item.id == id) {
        Some(info) => info,
        None => unreachable!("INVARIANT: every BuiltinMarkerId has a registry entry"),
    }
}

const fn info(id: BuiltinMarkerId, canonical: &'static str, description: &'static str) -> MarkerInfo {
    MarkerInfo {
        item: ItemInfo {
            id,
            canonical,
            aliases: &[],
            description,
            since: Since(0, 1),
            stability: Stability::Stable,
        },
        meta: STRUCTURAL_META,
    }
}
