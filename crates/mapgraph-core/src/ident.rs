// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Identifier types for map entities.
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Canonical 256-bit digest used to identify graph states.
pub type Hash = [u8; 32];

/// The three entity variants of the OSM data model.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// A point with a location.
    Node,
    /// An ordered chain of nodes.
    Way,
    /// An ordered list of typed, role-tagged members.
    Relation,
}

impl EntityKind {
    /// All kinds, in canonical order.
    pub const ALL: [Self; 3] = [Self::Node, Self::Way, Self::Relation];

    /// Single-character prefix used by locally-created ids (`n-1`, `w-1`, `r-1`).
    #[must_use]
    pub const fn prefix(self) -> char {
        match self {
            Self::Node => 'n',
            Self::Way => 'w',
            Self::Relation => 'r',
        }
    }

    /// Lowercase name as used in relation members (`node`, `way`, `relation`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Node => "node",
            Self::Way => "way",
            Self::Relation => "relation",
        }
    }

    pub(crate) const fn index(self) -> usize {
        match self {
            Self::Node => 0,
            Self::Way => 1,
            Self::Relation => 2,
        }
    }

    const fn from_prefix(c: char) -> Option<Self> {
        match c {
            'n' => Some(Self::Node),
            'w' => Some(Self::Way),
            'r' => Some(Self::Relation),
            _ => None,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable string identifier for an entity.
///
/// Ids are opaque strings. Entities loaded from an upstream store carry
/// whatever id that store assigned; entities created locally receive ids of
/// the form `<prefix>-<n>` (see [`EntityId::local`]), which report
/// [`EntityId::is_new`].
///
/// The backing storage is a shared `Arc<str>`, so clones are cheap and ids can
/// be stored in several indices without copying the text.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(Arc<str>);

impl EntityId {
    /// Wraps an arbitrary identifier string.
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Arc::from(id.as_ref()))
    }

    /// Builds the locally-created id for `kind` with the given ordinal (`n-7`).
    #[must_use]
    pub fn local(kind: EntityKind, ordinal: u64) -> Self {
        Self(Arc::from(format!("{}-{ordinal}", kind.prefix())))
    }

    /// Returns the identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Decodes a locally-created id into its kind and ordinal.
    ///
    /// Returns `None` for ids that do not follow the `<prefix>-<n>` shape with
    /// `n > 0`.
    #[must_use]
    pub fn local_ordinal(&self) -> Option<(EntityKind, u64)> {
        let mut chars = self.0.chars();
        let kind = EntityKind::from_prefix(chars.next()?)?;
        let digits = chars.as_str().strip_prefix('-')?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let ordinal: u64 = digits.parse().ok()?;
        (ordinal > 0).then_some((kind, ordinal))
    }

    /// `true` when the id denotes a locally-created, not-yet-uploaded entity.
    #[must_use]
    pub fn is_new(&self) -> bool {
        self.local_ordinal().is_some()
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({:?})", &*self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for EntityId {
    fn from(value: String) -> Self {
        Self(Arc::from(value))
    }
}

impl From<&EntityId> for EntityId {
    fn from(value: &EntityId) -> Self {
        value.clone()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn local_ids_round_trip_through_ordinal() {
        for kind in EntityKind::ALL {
            let id = EntityId::local(kind, 42);
            assert_eq!(id.local_ordinal(), Some((kind, 42)));
            assert!(id.is_new());
        }
        assert_eq!(EntityId::local(EntityKind::Way, 3).as_str(), "w-3");
    }

    #[test]
    fn upstream_and_arbitrary_ids_are_not_new() {
        for raw in ["n12", "w", "r-", "r-0", "x-1", "n-1a", "=", "*", ""] {
            assert!(!EntityId::from(raw).is_new(), "{raw} must not be local");
        }
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = EntityId::from("w-5");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"w-5\"");
        let back: EntityId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
