// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Entity value types: nodes, ways and relations.
//!
//! Entities are immutable values once placed in a [`Graph`](crate::Graph).
//! The builder-style methods here consume `self` and return the changed
//! entity with its `version` bumped; actions clone an entity out of a graph,
//! change it, and `replace` it into a new graph.
use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::ident::{EntityId, EntityKind};

/// Tag mapping. Ordered so that digests and comparisons are deterministic.
pub type Tags = BTreeMap<String, String>;

/// Tag keys that carry no semantic meaning on their own.
const UNINTERESTING_KEYS: [&str; 4] = ["attribution", "created_by", "source", "odbl"];

/// `true` if any tag carries meaning beyond bookkeeping metadata.
pub fn has_interesting_tags(tags: &Tags) -> bool {
    tags.keys()
        .any(|k| !UNINTERESTING_KEYS.contains(&k.as_str()) && !k.starts_with("tiger:"))
}

const fn visible_default() -> bool {
    true
}

/// Longitude/latitude pair in degrees.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Loc {
    /// Longitude in degrees.
    pub lon: f64,
    /// Latitude in degrees.
    pub lat: f64,
}

impl Loc {
    /// Creates a location from longitude and latitude.
    #[must_use]
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

/// A point entity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Entity id.
    pub id: EntityId,
    /// Per-entity edit counter.
    #[serde(default)]
    pub version: u64,
    /// `false` for tombstoned entities.
    #[serde(default = "visible_default")]
    pub visible: bool,
    /// Tags.
    #[serde(default)]
    pub tags: Tags,
    /// Location.
    pub loc: Loc,
}

impl Node {
    /// Creates an untagged node at `loc`.
    pub fn new(id: impl Into<EntityId>, loc: Loc) -> Self {
        Self {
            id: id.into(),
            version: 0,
            visible: true,
            tags: Tags::new(),
            loc,
        }
    }

    /// Returns the node moved to `loc`.
    #[must_use]
    pub fn with_loc(mut self, loc: Loc) -> Self {
        self.loc = loc;
        self.version += 1;
        self
    }
}

/// An ordered chain of node references.
///
/// Invariant: every id in `nodes` resolves to a [`Node`] in the same graph.
/// The graph does not enforce this on write; see
/// [`Graph::validate`](crate::Graph::validate).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Way {
    /// Entity id.
    pub id: EntityId,
    /// Per-entity edit counter.
    #[serde(default)]
    pub version: u64,
    /// `false` for tombstoned entities.
    #[serde(default = "visible_default")]
    pub visible: bool,
    /// Tags.
    #[serde(default)]
    pub tags: Tags,
    /// Ordered node ids. Closed iff first == last.
    pub nodes: Vec<EntityId>,
}

impl Way {
    /// Creates an untagged way through `nodes`.
    pub fn new<I, T>(id: impl Into<EntityId>, nodes: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<EntityId>,
    {
        Self {
            id: id.into(),
            version: 0,
            visible: true,
            tags: Tags::new(),
            nodes: nodes.into_iter().map(Into::into).collect(),
        }
    }

    /// First node id.
    #[must_use]
    pub fn first(&self) -> Option<&EntityId> {
        self.nodes.first()
    }

    /// Last node id.
    #[must_use]
    pub fn last(&self) -> Option<&EntityId> {
        self.nodes.last()
    }

    /// `true` if the way has at least two nodes and starts where it ends.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.nodes.len() > 1 && self.first() == self.last()
    }

    /// `true` if `node` appears anywhere in the way.
    #[must_use]
    pub fn contains(&self, node: &EntityId) -> bool {
        self.nodes.contains(node)
    }

    /// Index of the first segment joining `a` and `b` in either orientation.
    ///
    /// The returned index `i` means `nodes[i]` and `nodes[i + 1]` form the edge.
    #[must_use]
    pub fn segment_index(&self, a: &EntityId, b: &EntityId) -> Option<usize> {
        self.nodes
            .windows(2)
            .position(|pair| (&pair[0] == a && &pair[1] == b) || (&pair[0] == b && &pair[1] == a))
    }

    /// `true` if `a` and `b` are consecutive somewhere in the way.
    #[must_use]
    pub fn are_adjacent(&self, a: &EntityId, b: &EntityId) -> bool {
        self.segment_index(a, b).is_some()
    }

    /// `true` if the way no longer describes a line (or ring, when closed).
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        let unique: BTreeSet<&EntityId> = self.nodes.iter().collect();
        unique.len() < if self.is_closed() { 3 } else { 2 }
    }

    /// Returns the way with `node` inserted at `index`.
    ///
    /// `index` is clamped to the node count.
    #[must_use]
    pub fn with_node_at(mut self, index: usize, node: EntityId) -> Self {
        let index = index.min(self.nodes.len());
        self.nodes.insert(index, node);
        self.version += 1;
        self
    }

    /// Returns the way with every occurrence of `node` removed.
    ///
    /// Consecutive duplicates left behind are collapsed, and a way that was
    /// closed stays closed.
    #[must_use]
    pub fn without_node(mut self, node: &EntityId) -> Self {
        let was_closed = self.is_closed();
        self.nodes.retain(|n| n != node);
        self.nodes.dedup();
        if was_closed && self.nodes.first() != self.nodes.last() {
            if let Some(first) = self.nodes.first().cloned() {
                self.nodes.push(first);
            }
        }
        self.version += 1;
        self
    }
}

/// A typed, role-tagged reference from a relation to another entity.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Member {
    /// Referenced entity id.
    pub id: EntityId,
    /// Declared kind of the referenced entity.
    #[serde(rename = "type")]
    pub kind: EntityKind,
    /// Free-form role (`from`, `via`, `to`, `outer`, ...).
    #[serde(default)]
    pub role: String,
}

impl Member {
    /// Creates a member reference.
    pub fn new(id: impl Into<EntityId>, kind: EntityKind, role: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            role: role.into(),
        }
    }
}

/// An ordered list of members.
///
/// Invariant: every member id resolves to an entity of the declared kind in
/// the same graph. Checked lazily, like [`Way`] references.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    /// Entity id.
    pub id: EntityId,
    /// Per-entity edit counter.
    #[serde(default)]
    pub version: u64,
    /// `false` for tombstoned entities.
    #[serde(default = "visible_default")]
    pub visible: bool,
    /// Tags.
    #[serde(default)]
    pub tags: Tags,
    /// Ordered members.
    #[serde(default)]
    pub members: Vec<Member>,
}

impl Relation {
    /// Creates a relation with the given tags and members.
    pub fn new(id: impl Into<EntityId>, tags: Tags, members: Vec<Member>) -> Self {
        Self {
            id: id.into(),
            version: 0,
            visible: true,
            tags,
            members,
        }
    }

    /// First member playing `role`.
    #[must_use]
    pub fn member_by_role(&self, role: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.role == role)
    }

    /// All members playing `role`, in member order.
    pub fn members_by_role<'a>(&'a self, role: &'a str) -> impl Iterator<Item = &'a Member> + 'a {
        self.members.iter().filter(move |m| m.role == role)
    }

    /// First member referencing `id`.
    #[must_use]
    pub fn member_by_id(&self, id: &EntityId) -> Option<&Member> {
        self.members.iter().find(|m| &m.id == id)
    }

    /// `true` for `type=restriction` and `type=restriction:<mode>` relations.
    #[must_use]
    pub fn is_restriction(&self) -> bool {
        self.tags
            .get("type")
            .is_some_and(|t| t == "restriction" || t.starts_with("restriction:"))
    }

    /// `true` once the relation has no members left.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.members.is_empty()
    }

    /// Returns the relation with every member referencing `id` removed.
    #[must_use]
    pub fn without_members_with_id(mut self, id: &EntityId) -> Self {
        self.members.retain(|m| &m.id != id);
        self.version += 1;
        self
    }
}

/// Any map entity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Entity {
    /// A node.
    Node(Node),
    /// A way.
    Way(Way),
    /// A relation.
    Relation(Relation),
}

impl Entity {
    /// Entity id.
    #[must_use]
    pub fn id(&self) -> &EntityId {
        match self {
            Self::Node(n) => &n.id,
            Self::Way(w) => &w.id,
            Self::Relation(r) => &r.id,
        }
    }

    /// Variant of this entity.
    #[must_use]
    pub const fn kind(&self) -> EntityKind {
        match self {
            Self::Node(_) => EntityKind::Node,
            Self::Way(_) => EntityKind::Way,
            Self::Relation(_) => EntityKind::Relation,
        }
    }

    /// Per-entity edit counter.
    #[must_use]
    pub const fn version(&self) -> u64 {
        match self {
            Self::Node(n) => n.version,
            Self::Way(w) => w.version,
            Self::Relation(r) => r.version,
        }
    }

    /// `false` for tombstoned entities.
    #[must_use]
    pub const fn visible(&self) -> bool {
        match self {
            Self::Node(n) => n.visible,
            Self::Way(w) => w.visible,
            Self::Relation(r) => r.visible,
        }
    }

    /// Tags.
    #[must_use]
    pub const fn tags(&self) -> &Tags {
        match self {
            Self::Node(n) => &n.tags,
            Self::Way(w) => &w.tags,
            Self::Relation(r) => &r.tags,
        }
    }

    /// Returns the entity with its tags replaced and its version bumped.
    #[must_use]
    pub fn with_tags(mut self, tags: Tags) -> Self {
        match &mut self {
            Self::Node(n) => {
                n.tags = tags;
                n.version += 1;
            }
            Self::Way(w) => {
                w.tags = tags;
                w.version += 1;
            }
            Self::Relation(r) => {
                r.tags = tags;
                r.version += 1;
            }
        }
        self
    }

    /// Node ids referenced by a way; empty for other variants.
    #[must_use]
    pub fn node_refs(&self) -> &[EntityId] {
        match self {
            Self::Way(w) => &w.nodes,
            Self::Node(_) | Self::Relation(_) => &[],
        }
    }

    /// Members of a relation; empty for other variants.
    #[must_use]
    pub fn members(&self) -> &[Member] {
        match self {
            Self::Relation(r) => &r.members,
            Self::Node(_) | Self::Way(_) => &[],
        }
    }

    /// The node, if this entity is one.
    #[must_use]
    pub const fn as_node(&self) -> Option<&Node> {
        match self {
            Self::Node(n) => Some(n),
            _ => None,
        }
    }

    /// The way, if this entity is one.
    #[must_use]
    pub const fn as_way(&self) -> Option<&Way> {
        match self {
            Self::Way(w) => Some(w),
            _ => None,
        }
    }

    /// The relation, if this entity is one.
    #[must_use]
    pub const fn as_relation(&self) -> Option<&Relation> {
        match self {
            Self::Relation(r) => Some(r),
            _ => None,
        }
    }
}

impl From<Node> for Entity {
    fn from(value: Node) -> Self {
        Self::Node(value)
    }
}

impl From<Way> for Entity {
    fn from(value: Way) -> Self {
        Self::Way(value)
    }
}

impl From<Relation> for Entity {
    fn from(value: Relation) -> Self {
        Self::Relation(value)
    }
}
