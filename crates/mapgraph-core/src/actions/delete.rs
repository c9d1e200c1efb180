// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Cascading deletes.
//!
//! Deleting an entity first detaches it from everything that references it,
//! so the result never holds a reference to the deleted id:
//!
//! - A node is removed from each parent way; ways left degenerate are deleted.
//! - An entity is removed from each parent relation; relations left with no
//!   members are deleted (recursively, up the relation tree).
//! - Deleting a way also removes its child nodes once they have no other
//!   parent and carry no interesting tags.
//!
//! Relation members are never deleted along with the relation.
use std::collections::BTreeSet;

use crate::action::{Action, ActionError, DisabledReason};
use crate::entity::has_interesting_tags;
use crate::graph::Graph;
use crate::ident::{EntityId, EntityKind};

/// Deletes a node, detaching it from parent ways and relations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteNode {
    id: EntityId,
}

impl DeleteNode {
    /// Binds the node to delete.
    pub fn new(id: impl Into<EntityId>) -> Self {
        Self { id: id.into() }
    }
}

impl Action for DeleteNode {
    fn name(&self) -> &'static str {
        "delete_node"
    }

    fn apply(&self, graph: &Graph) -> Result<Graph, ActionError> {
        graph.node(&self.id)?;
        Ok(delete_node(graph.clone(), &self.id))
    }

    fn disabled(&self, graph: &Graph) -> Option<DisabledReason> {
        DisabledReason::check(graph, &self.id, EntityKind::Node)
    }
}

/// Deletes a way, its orphaned untagged nodes, and its relation memberships.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteWay {
    id: EntityId,
}

impl DeleteWay {
    /// Binds the way to delete.
    pub fn new(id: impl Into<EntityId>) -> Self {
        Self { id: id.into() }
    }
}

impl Action for DeleteWay {
    fn name(&self) -> &'static str {
        "delete_way"
    }

    fn apply(&self, graph: &Graph) -> Result<Graph, ActionError> {
        graph.way(&self.id)?;
        Ok(delete_way(graph.clone(), &self.id))
    }

    fn disabled(&self, graph: &Graph) -> Option<DisabledReason> {
        DisabledReason::check(graph, &self.id, EntityKind::Way)
    }
}

/// Deletes a relation and its memberships in other relations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteRelation {
    id: EntityId,
}

impl DeleteRelation {
    /// Binds the relation to delete.
    pub fn new(id: impl Into<EntityId>) -> Self {
        Self { id: id.into() }
    }
}

impl Action for DeleteRelation {
    fn name(&self) -> &'static str {
        "delete_relation"
    }

    fn apply(&self, graph: &Graph) -> Result<Graph, ActionError> {
        graph.relation(&self.id)?;
        Ok(delete_relation(graph.clone(), &self.id))
    }

    fn disabled(&self, graph: &Graph) -> Option<DisabledReason> {
        DisabledReason::check(graph, &self.id, EntityKind::Relation)
    }
}

// The helpers below tolerate ids that are already gone: recursion through
// degenerate parents can reach the same entity twice.

fn delete_node(mut graph: Graph, id: &EntityId) -> Graph {
    let ways: Vec<EntityId> = graph.parent_way_ids(id).cloned().collect();
    for way_id in ways {
        let Ok(way) = graph.way(&way_id) else {
            continue;
        };
        let way = way.clone().without_node(id);
        let degenerate = way.is_degenerate();
        graph = graph.replace(way);
        if degenerate {
            graph = delete_way(graph, &way_id);
        }
    }
    graph = detach_from_relations(graph, id);
    graph.remove(id)
}

fn delete_way(mut graph: Graph, id: &EntityId) -> Graph {
    let Ok(way) = graph.way(id) else {
        return graph;
    };
    let children: BTreeSet<EntityId> = way.nodes.iter().cloned().collect();
    graph = detach_from_relations(graph, id);
    graph = graph.remove(id);
    for child in &children {
        let orphan = graph.node(child).is_ok_and(|node| {
            graph.parent_way_ids(child).next().is_none()
                && graph.parent_relation_ids(child).next().is_none()
                && !has_interesting_tags(&node.tags)
        });
        if orphan {
            graph = graph.remove(child);
        }
    }
    graph
}

fn delete_relation(mut graph: Graph, id: &EntityId) -> Graph {
    if graph.relation(id).is_err() {
        return graph;
    }
    graph = detach_from_relations(graph, id);
    graph.remove(id)
}

/// Removes `id` from every parent relation, deleting relations left empty.
fn detach_from_relations(mut graph: Graph, id: &EntityId) -> Graph {
    let parents: Vec<EntityId> = graph.parent_relation_ids(id).cloned().collect();
    for parent_id in parents {
        let Ok(parent) = graph.relation(&parent_id) else {
            continue;
        };
        let parent = parent.clone().without_members_with_id(id);
        let degenerate = parent.is_degenerate();
        graph = graph.replace(parent);
        if degenerate {
            graph = delete_relation(graph, &parent_id);
        }
    }
    graph
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::entity::{Entity, Loc, Member, Node, Relation, Tags, Way};

    fn id(s: &str) -> EntityId {
        EntityId::from(s)
    }

    fn tagged(key: &str, value: &str) -> Tags {
        let mut tags = Tags::new();
        tags.insert(key.into(), value.into());
        tags
    }

    /// Triangle `a-b-c` plus a spur `c-d`, a tagged node `e` on the spur and
    /// a route relation holding the spur.
    fn graph() -> Graph {
        let mut e = Node::new("e", Loc::new(4.0, 0.0));
        e.tags = tagged("amenity", "bench");
        Graph::from_entities([
            Entity::from(Node::new("a", Loc::new(0.0, 0.0))),
            Entity::from(Node::new("b", Loc::new(1.0, 0.0))),
            Entity::from(Node::new("c", Loc::new(1.0, 1.0))),
            Entity::from(Node::new("d", Loc::new(3.0, 1.0))),
            Entity::from(e),
            Entity::from(Way::new("tri", ["a", "b", "c", "a"])),
            Entity::from(Way::new("spur", ["c", "d", "e"])),
            Entity::from(Relation::new(
                "route",
                tagged("type", "route"),
                vec![Member::new("spur", EntityKind::Way, "")],
            )),
            Entity::from(Relation::new(
                "super",
                tagged("type", "network"),
                vec![Member::new("route", EntityKind::Relation, "")],
            )),
        ])
    }

    #[test]
    fn delete_node_shrinks_parent_ways() {
        let g = DeleteNode::new("d").apply(&graph()).unwrap();
        assert!(!g.has_entity(&id("d")));
        assert_eq!(g.way(&id("spur")).unwrap().nodes, vec![id("c"), id("e")]);
        g.validate().unwrap();
    }

    #[test]
    fn delete_node_removes_degenerate_ways() {
        // removing `b` leaves the ring a-c-a, which is no longer an area
        let g = DeleteNode::new("b").apply(&graph()).unwrap();
        assert!(!g.has_entity(&id("tri")));
        // `a` lost its only parent and is untagged
        assert!(!g.has_entity(&id("a")));
        // `c` is still on the spur
        assert!(g.has_entity(&id("c")));
        g.validate().unwrap();
    }

    #[test]
    fn delete_way_cascades_to_relations_and_orphans() {
        let g = DeleteWay::new("spur").apply(&graph()).unwrap();
        assert!(!g.has_entity(&id("spur")));
        assert!(!g.has_entity(&id("d")));
        // tagged nodes survive, shared nodes survive
        assert!(g.has_entity(&id("e")));
        assert!(g.has_entity(&id("c")));
        // the route lost its only member, then the network lost the route
        assert!(!g.has_entity(&id("route")));
        assert!(!g.has_entity(&id("super")));
        g.validate().unwrap();
    }

    #[test]
    fn delete_relation_keeps_members() {
        let g = DeleteRelation::new("route").apply(&graph()).unwrap();
        assert!(!g.has_entity(&id("route")));
        assert!(g.has_entity(&id("spur")));
        assert!(!g.has_entity(&id("super")));
        g.validate().unwrap();
    }

    #[test]
    fn wrong_kind_and_missing_targets_fail() {
        let g = graph();
        assert!(DeleteWay::new("a").apply(&g).is_err());
        assert!(DeleteNode::new("zz").apply(&g).is_err());
        assert_eq!(
            DeleteRelation::new("zz").disabled(&g),
            Some(DisabledReason::Missing(id("zz")))
        );
    }
}
