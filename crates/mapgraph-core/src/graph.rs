// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Immutable, structurally shared entity graph.
//!
//! A [`Graph`] is a snapshot: every "mutation" returns a new value and leaves
//! the receiver untouched. Storage is built on persistent ordered maps
//! (`im::OrdMap`), so cloning is O(1) and replacing one entity costs
//! O(log n) while sharing all untouched structure with the previous snapshot.
//!
//! Two derived indices are maintained alongside the entity map:
//!
//! - `parent_ways`: node id -> ids of ways whose `nodes` reference it.
//! - `parent_relations`: entity id -> ids of relations with a member referencing it.
//!
//! Invariant: the indices are exactly the inverse of the forward references
//! held by the entities in the map. [`Graph::replace`] and [`Graph::remove`]
//! update them incrementally for the references that actually changed.
//!
//! Dangling references (a way naming a node that is not in the graph) are
//! permitted on write and reported lazily on read ([`Graph::child_nodes`]) or
//! by an explicit [`Graph::validate`] pass.
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use im::{OrdMap, OrdSet};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;
use tracing::trace;

use crate::entity::{Entity, Node, Relation, Way};
use crate::ident::{EntityId, EntityKind};

/// Errors raised by graph reads and validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// No entity with this id exists in the graph.
    #[error("entity not found: {0}")]
    NotFound(EntityId),
    /// An entity exists but is not of the expected variant.
    #[error("entity {id} is a {found}, expected a {expected}")]
    WrongKind {
        /// The looked-up id.
        id: EntityId,
        /// The variant the caller asked for.
        expected: EntityKind,
        /// The variant actually stored.
        found: EntityKind,
    },
    /// A way or relation references an entity that does not exist.
    #[error("{from} references missing entity {missing}")]
    DanglingReference {
        /// The referencing way or relation.
        from: EntityId,
        /// The id that failed to resolve.
        missing: EntityId,
    },
    /// A derived parent index disagrees with the forward references.
    #[error("parent index out of sync: {parent} -> {child}")]
    InconsistentIndex {
        /// The referencing way or relation.
        parent: EntityId,
        /// The referenced entity.
        child: EntityId,
    },
}

type ParentIndex = OrdMap<EntityId, OrdSet<EntityId>>;

/// Immutable snapshot of map entities plus derived parent indices.
#[derive(Clone, Default)]
pub struct Graph {
    entities: OrdMap<EntityId, Arc<Entity>>,
    parent_ways: ParentIndex,
    parent_relations: ParentIndex,
    /// Highest local id ordinal observed per kind (see [`Graph::next_local_id`]).
    local_watermark: [u64; 3],
}

impl Graph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a graph by inserting each entity in turn.
    pub fn from_entities<I>(entities: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Entity>,
    {
        let mut graph = Self::new();
        for entity in entities {
            graph.insert_in_place(Arc::new(entity.into()));
        }
        graph
    }

    /// Number of entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// `true` if the graph holds no entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Iterates entities in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values().map(AsRef::as_ref)
    }

    /// `true` if both graphs share the same root storage.
    ///
    /// O(1). A `false` result does not imply the graphs differ by value.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.entities.ptr_eq(&other.entities)
    }

    /// Looks up an entity, returning `None` if absent.
    #[must_use]
    pub fn get(&self, id: &EntityId) -> Option<&Entity> {
        self.entities.get(id).map(AsRef::as_ref)
    }

    /// Looks up an entity.
    pub fn entity(&self, id: &EntityId) -> Result<&Entity, GraphError> {
        self.get(id).ok_or_else(|| GraphError::NotFound(id.clone()))
    }

    /// `true` if an entity with `id` exists.
    #[must_use]
    pub fn has_entity(&self, id: &EntityId) -> bool {
        self.entities.contains_key(id)
    }

    /// Looks up a node.
    pub fn node(&self, id: &EntityId) -> Result<&Node, GraphError> {
        let entity = self.entity(id)?;
        entity
            .as_node()
            .ok_or_else(|| wrong_kind(id, EntityKind::Node, entity))
    }

    /// Looks up a way.
    pub fn way(&self, id: &EntityId) -> Result<&Way, GraphError> {
        let entity = self.entity(id)?;
        entity
            .as_way()
            .ok_or_else(|| wrong_kind(id, EntityKind::Way, entity))
    }

    /// Looks up a relation.
    pub fn relation(&self, id: &EntityId) -> Result<&Relation, GraphError> {
        let entity = self.entity(id)?;
        entity
            .as_relation()
            .ok_or_else(|| wrong_kind(id, EntityKind::Relation, entity))
    }

    /// Resolves a way's node ids, in order.
    ///
    /// Fails with [`GraphError::DanglingReference`] on the first id that does
    /// not resolve, and [`GraphError::WrongKind`] if it resolves to a non-node.
    pub fn child_nodes(&self, way: &Way) -> Result<Vec<&Node>, GraphError> {
        way.nodes
            .iter()
            .map(|id| match self.node(id) {
                Err(GraphError::NotFound(missing)) => Err(GraphError::DanglingReference {
                    from: way.id.clone(),
                    missing,
                }),
                other => other,
            })
            .collect()
    }

    /// Ids of ways referencing `node`, in ascending id order.
    pub fn parent_way_ids<'a>(&'a self, node: &EntityId) -> impl Iterator<Item = &'a EntityId> + 'a {
        self.parent_ways.get(node).into_iter().flat_map(OrdSet::iter)
    }

    /// Ways referencing `node`.
    #[must_use]
    pub fn parent_ways(&self, node: &EntityId) -> Vec<&Way> {
        self.parent_way_ids(node)
            .filter_map(|id| self.get(id).and_then(Entity::as_way))
            .collect()
    }

    /// Ids of relations with a member referencing `entity`, in ascending id order.
    pub fn parent_relation_ids<'a>(
        &'a self,
        entity: &EntityId,
    ) -> impl Iterator<Item = &'a EntityId> + 'a {
        self.parent_relations
            .get(entity)
            .into_iter()
            .flat_map(OrdSet::iter)
    }

    /// Relations with a member referencing `entity`.
    #[must_use]
    pub fn parent_relations(&self, entity: &EntityId) -> Vec<&Relation> {
        self.parent_relation_ids(entity)
            .filter_map(|id| self.get(id).and_then(Entity::as_relation))
            .collect()
    }

    /// Returns a graph where `entity.id()` maps to `entity` (insert or overwrite).
    #[must_use]
    pub fn replace(&self, entity: impl Into<Entity>) -> Self {
        let mut next = self.clone();
        next.insert_in_place(Arc::new(entity.into()));
        next
    }

    /// Returns a graph without the entity `id`.
    ///
    /// The removal does not cascade: ways and relations that still reference
    /// `id` keep doing so. Removing an absent id returns an identical graph.
    #[must_use]
    pub fn remove(&self, id: &EntityId) -> Self {
        let mut next = self.clone();
        if let Some(old) = next.entities.remove(id) {
            next.reindex(id, Some(old.as_ref()), None);
        }
        next
    }

    /// Reads the entity `id`, applies `updater`, and replaces the result.
    pub fn update<F>(&self, id: &EntityId, updater: F) -> Result<Self, GraphError>
    where
        F: FnOnce(Entity) -> Entity,
    {
        let current = self.entity(id)?.clone();
        Ok(self.replace(updater(current)))
    }

    /// Next unused locally-created id for `kind` (`n-1`, `n-2`, ...).
    ///
    /// Derived from the highest local ordinal this graph (or any graph it was
    /// derived from) has held, so allocation is a pure function of the graph.
    #[must_use]
    pub fn next_local_id(&self, kind: EntityKind) -> EntityId {
        EntityId::local(kind, self.local_watermark[kind.index()] + 1)
    }

    /// Checks that every reference resolves to an entity of the right kind,
    /// then runs [`Graph::check_indices`].
    ///
    /// Returns the first problem found, in ascending id order.
    pub fn validate(&self) -> Result<(), GraphError> {
        for entity in self.iter() {
            for node in entity.node_refs() {
                let found = self.get(node).ok_or_else(|| GraphError::DanglingReference {
                    from: entity.id().clone(),
                    missing: node.clone(),
                })?;
                if found.kind() != EntityKind::Node {
                    return Err(wrong_kind(node, EntityKind::Node, found));
                }
            }
            for member in entity.members() {
                let found = self.get(&member.id).ok_or_else(|| GraphError::DanglingReference {
                    from: entity.id().clone(),
                    missing: member.id.clone(),
                })?;
                if found.kind() != member.kind {
                    return Err(wrong_kind(&member.id, member.kind, found));
                }
            }
        }
        self.check_indices()
    }

    /// Verifies that both parent indices are exactly the inverse of the
    /// forward references.
    ///
    /// Unlike [`Graph::validate`] this tolerates dangling references, so it
    /// holds for every graph produced by `replace`/`remove`.
    pub fn check_indices(&self) -> Result<(), GraphError> {
        for (child, parents) in self.parent_ways.iter() {
            if parents.is_empty() {
                return Err(inconsistent(child, child));
            }
            for parent in parents.iter() {
                let backed = self
                    .get(parent)
                    .is_some_and(|e| e.node_refs().contains(child));
                if !backed {
                    return Err(inconsistent(parent, child));
                }
            }
        }
        for (child, parents) in self.parent_relations.iter() {
            if parents.is_empty() {
                return Err(inconsistent(child, child));
            }
            for parent in parents.iter() {
                let backed = self
                    .get(parent)
                    .is_some_and(|e| e.members().iter().any(|m| &m.id == child));
                if !backed {
                    return Err(inconsistent(parent, child));
                }
            }
        }
        for entity in self.iter() {
            for node in entity.node_refs() {
                if !indexed(&self.parent_ways, node, entity.id()) {
                    return Err(inconsistent(entity.id(), node));
                }
            }
            for member in entity.members() {
                if !indexed(&self.parent_relations, &member.id, entity.id()) {
                    return Err(inconsistent(entity.id(), &member.id));
                }
            }
        }
        Ok(())
    }

    /// Entities created, modified and deleted going from `self` to `newer`.
    ///
    /// Entities still shared between both snapshots are skipped by pointer
    /// identity before any value comparison.
    #[must_use]
    pub fn difference(&self, newer: &Self) -> Difference {
        let mut diff = Difference::default();
        if self.ptr_eq(newer) {
            return diff;
        }
        for (id, entity) in newer.entities.iter() {
            match self.entities.get(id) {
                None => diff.created.push(id.clone()),
                Some(old) if !Arc::ptr_eq(old, entity) && old != entity => {
                    diff.modified.push(id.clone());
                }
                Some(_) => {}
            }
        }
        for id in self.entities.keys() {
            if !newer.entities.contains_key(id) {
                diff.deleted.push(id.clone());
            }
        }
        diff
    }

    fn insert_in_place(&mut self, entity: Arc<Entity>) {
        let id = entity.id().clone();
        if let Some((kind, ordinal)) = id.local_ordinal() {
            let slot = &mut self.local_watermark[kind.index()];
            *slot = (*slot).max(ordinal);
        }
        let old = self.entities.insert(id.clone(), Arc::clone(&entity));
        self.reindex(&id, old.as_deref(), Some(entity.as_ref()));
    }

    /// Updates both parent indices for exactly the references of `id` that
    /// differ between `old` and `new`.
    fn reindex(&mut self, id: &EntityId, old: Option<&Entity>, new: Option<&Entity>) {
        let (old_nodes, new_nodes) = (node_refs(old), node_refs(new));
        for node in old_nodes.difference(&new_nodes) {
            unlink(&mut self.parent_ways, node, id);
        }
        for node in new_nodes.difference(&old_nodes) {
            link(&mut self.parent_ways, node, id);
        }

        let (old_members, new_members) = (member_refs(old), member_refs(new));
        for member in old_members.difference(&new_members) {
            unlink(&mut self.parent_relations, member, id);
        }
        for member in new_members.difference(&old_members) {
            link(&mut self.parent_relations, member, id);
        }
        trace!(entity = %id, "reindexed parent references");
    }
}

fn node_refs(entity: Option<&Entity>) -> BTreeSet<&EntityId> {
    entity.map_or(&[][..], Entity::node_refs).iter().collect()
}

fn member_refs(entity: Option<&Entity>) -> BTreeSet<&EntityId> {
    entity
        .map_or(&[][..], Entity::members)
        .iter()
        .map(|m| &m.id)
        .collect()
}

fn indexed(index: &ParentIndex, child: &EntityId, parent: &EntityId) -> bool {
    index.get(child).is_some_and(|parents| parents.contains(parent))
}

fn link(index: &mut ParentIndex, child: &EntityId, parent: &EntityId) {
    let mut parents = index.get(child).cloned().unwrap_or_default();
    parents.insert(parent.clone());
    index.insert(child.clone(), parents);
}

fn unlink(index: &mut ParentIndex, child: &EntityId, parent: &EntityId) {
    let Some(mut parents) = index.get(child).cloned() else {
        return;
    };
    parents.remove(parent);
    if parents.is_empty() {
        index.remove(child);
    } else {
        index.insert(child.clone(), parents);
    }
}

fn wrong_kind(id: &EntityId, expected: EntityKind, found: &Entity) -> GraphError {
    GraphError::WrongKind {
        id: id.clone(),
        expected,
        found: found.kind(),
    }
}

fn inconsistent(parent: &EntityId, child: &EntityId) -> GraphError {
    GraphError::InconsistentIndex {
        parent: parent.clone(),
        child: child.clone(),
    }
}

impl PartialEq for Graph {
    /// Value equality over the entity set. Indices are derived, so equal
    /// entity sets imply equal indices.
    ///
    /// The local id watermark is allocation state, not content: a graph that
    /// once held `n-2` and an equal one that never did compare `==` but
    /// return different [`Graph::next_local_id`] values. Pin ids explicitly
    /// where that matters.
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || self.entities == other.entities
    }
}

impl fmt::Debug for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Graph")
            .field("entities", &self.entities.len())
            .field("indexed_nodes", &self.parent_ways.len())
            .field("indexed_members", &self.parent_relations.len())
            .finish()
    }
}

impl<E: Into<Entity>> FromIterator<E> for Graph {
    fn from_iter<T: IntoIterator<Item = E>>(iter: T) -> Self {
        Self::from_entities(iter)
    }
}

impl Serialize for Graph {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

impl<'de> Deserialize<'de> for Graph {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let entities = Vec::<Entity>::deserialize(deserializer)?;
        Ok(Self::from_entities(entities))
    }
}

/// Ids affected between two snapshots, each list in ascending id order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Difference {
    /// Present only in the newer graph.
    pub created: Vec<EntityId>,
    /// Present in both with different values.
    pub modified: Vec<EntityId>,
    /// Present only in the older graph.
    pub deleted: Vec<EntityId>,
}

impl Difference {
    /// `true` if nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.modified.is_empty() && self.deleted.is_empty()
    }

    /// Total number of affected ids.
    #[must_use]
    pub fn len(&self) -> usize {
        self.created.len() + self.modified.len() + self.deleted.len()
    }

    /// Every affected id: created, then modified, then deleted.
    pub fn affected(&self) -> impl Iterator<Item = &EntityId> {
        self.created
            .iter()
            .chain(&self.modified)
            .chain(&self.deleted)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::entity::{Loc, Member, Tags};

    fn id(s: &str) -> EntityId {
        EntityId::from(s)
    }

    fn line() -> Graph {
        Graph::from_entities([
            Entity::from(Node::new("a", Loc::new(0.0, 0.0))),
            Entity::from(Node::new("b", Loc::new(1.0, 0.0))),
            Entity::from(Node::new("c", Loc::new(2.0, 0.0))),
            Entity::from(Way::new("w1", ["a", "b"])),
        ])
    }

    #[test]
    fn entity_lookup_reports_missing_and_wrong_kind() {
        let g = line();
        assert!(g.has_entity(&id("a")));
        assert_eq!(g.entity(&id("zz")), Err(GraphError::NotFound(id("zz"))));
        assert!(matches!(
            g.way(&id("a")),
            Err(GraphError::WrongKind { expected: EntityKind::Way, found: EntityKind::Node, .. })
        ));
    }

    #[test]
    fn replace_updates_parent_ways_incrementally() {
        let g = line();
        assert_eq!(g.parent_way_ids(&id("a")).collect::<Vec<_>>(), vec![&id("w1")]);
        assert_eq!(g.parent_way_ids(&id("c")).count(), 0);

        let g2 = g.replace(Way::new("w1", ["b", "c"]));
        assert_eq!(g2.parent_way_ids(&id("a")).count(), 0);
        assert_eq!(g2.parent_ways(&id("c")).len(), 1);
        assert_eq!(g2.parent_ways(&id("b")).len(), 1);
        g2.validate().unwrap();

        // the old snapshot is unchanged
        assert_eq!(g.way(&id("w1")).unwrap().nodes, vec![id("a"), id("b")]);
        assert_eq!(g.parent_way_ids(&id("a")).count(), 1);
    }

    #[test]
    fn remove_prunes_forward_references_only() {
        let g = line().remove(&id("w1"));
        assert!(!g.has_entity(&id("w1")));
        assert_eq!(g.parent_way_ids(&id("a")).count(), 0);
        g.validate().unwrap();

        // removing a referenced node leaves a dangling reference behind
        let g = line().remove(&id("a"));
        assert_eq!(g.parent_way_ids(&id("a")).count(), 1);
        g.check_indices().unwrap();
        let way = g.way(&id("w1")).unwrap();
        assert_eq!(
            g.child_nodes(way).unwrap_err(),
            GraphError::DanglingReference { from: id("w1"), missing: id("a") }
        );
        assert!(g.validate().is_err());
    }

    #[test]
    fn child_nodes_resolve_in_way_order() {
        let g = line().replace(Way::new("ring", ["c", "a", "b", "c"]));
        let ring = g.way(&id("ring")).unwrap();
        let ids: Vec<_> = g.child_nodes(ring).unwrap().into_iter().map(|n| &n.id).collect();
        assert_eq!(ids, vec![&id("c"), &id("a"), &id("b"), &id("c")]);
        assert_eq!(g.child_nodes(ring).unwrap()[1].loc, Loc::new(0.0, 0.0));
    }

    #[test]
    fn child_nodes_reject_non_node_references() {
        let g = line()
            .replace(Relation::new("r1", Tags::new(), Vec::new()))
            .replace(Way::new("odd", ["a", "r1"]));
        let odd = g.way(&id("odd")).unwrap();
        assert_eq!(
            g.child_nodes(odd).unwrap_err(),
            GraphError::WrongKind {
                id: id("r1"),
                expected: EntityKind::Node,
                found: EntityKind::Relation
            }
        );
    }

    #[test]
    fn remove_absent_id_keeps_equal_graph() {
        let g = line();
        assert_eq!(g.remove(&id("nope")), g);
    }

    #[test]
    fn equality_ignores_id_watermark() {
        let fresh = line();
        let churned = line()
            .replace(Node::new("n-2", Loc::default()))
            .remove(&id("n-2"));
        assert_eq!(fresh, churned);
        assert_eq!(fresh.next_local_id(EntityKind::Node), id("n-1"));
        assert_eq!(churned.next_local_id(EntityKind::Node), id("n-3"));
    }

    #[test]
    fn closed_way_indexes_repeated_node_once() {
        let g = line().replace(Way::new("ring", ["a", "b", "c", "a"]));
        assert_eq!(g.parent_ways(&id("a")).len(), 2);
        let g = g.replace(Way::new("ring", ["b", "c", "b"]));
        assert_eq!(g.parent_way_ids(&id("a")).collect::<Vec<_>>(), vec![&id("w1")]);
        g.validate().unwrap();
    }

    #[test]
    fn relation_members_feed_parent_relations() {
        let r = Relation::new(
            "r1",
            Tags::new(),
            vec![
                Member::new("w1", EntityKind::Way, "outer"),
                Member::new("a", EntityKind::Node, "label"),
            ],
        );
        let g = line().replace(r);
        assert_eq!(g.parent_relations(&id("w1")).len(), 1);
        assert_eq!(g.parent_relation_ids(&id("a")).collect::<Vec<_>>(), vec![&id("r1")]);
        g.validate().unwrap();

        let g = g.remove(&id("r1"));
        assert_eq!(g.parent_relation_ids(&id("w1")).count(), 0);
    }

    #[test]
    fn member_kind_mismatch_fails_validation() {
        let r = Relation::new("r1", Tags::new(), vec![Member::new("a", EntityKind::Way, "")]);
        let g = line().replace(r);
        assert!(matches!(g.validate(), Err(GraphError::WrongKind { .. })));
    }

    #[test]
    fn update_bumps_through_updater() {
        let mut tags = Tags::new();
        tags.insert("highway".into(), "residential".into());
        let g = line().update(&id("w1"), |e| e.with_tags(tags.clone())).unwrap();
        assert_eq!(g.entity(&id("w1")).unwrap().version(), 1);
        assert!(line().update(&id("zz"), |e| e).is_err());
    }

    #[test]
    fn difference_classifies_changes() {
        let g = line();
        let g2 = g
            .replace(Node::new("d", Loc::new(3.0, 0.0)))
            .replace(Node::new("b", Loc::new(1.5, 0.0)))
            .remove(&id("c"));
        let diff = g.difference(&g2);
        assert_eq!(diff.created, vec![id("d")]);
        assert_eq!(diff.modified, vec![id("b")]);
        assert_eq!(diff.deleted, vec![id("c")]);
        assert_eq!(diff.len(), 3);
        assert!(g.difference(&g.clone()).is_empty());
    }

    #[test]
    fn next_local_id_tracks_watermark() {
        let g = Graph::new();
        assert_eq!(g.next_local_id(EntityKind::Relation), EntityId::from("r-1"));
        let g = g.replace(Node::new(EntityId::local(EntityKind::Node, 4), Loc::default()));
        assert_eq!(g.next_local_id(EntityKind::Node), EntityId::from("n-5"));
        assert_eq!(g.next_local_id(EntityKind::Way), EntityId::from("w-1"));
        // removal does not recycle ids
        let g = g.remove(&id("n-4"));
        assert_eq!(g.next_local_id(EntityKind::Node), EntityId::from("n-5"));
    }

    #[test]
    fn serde_round_trip_rebuilds_indices() {
        let g = line();
        let json = serde_json::to_string(&g).unwrap();
        let back: Graph = serde_json::from_str(&json).unwrap();
        assert_eq!(back, g);
        assert_eq!(back.parent_way_ids(&id("b")).count(), 1);
    }

    #[test]
    fn graph_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Graph>();
    }
}
