// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::action::{Action, ActionError, DisabledReason};
use crate::entity::{Loc, Node};
use crate::graph::Graph;
use crate::ident::{EntityId, EntityKind};

/// Location and edge at which a midpoint is inserted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Midpoint {
    /// Location given to the inserted node.
    pub loc: Loc,
    /// The two adjacent node ids the new node is placed between.
    pub edge: (EntityId, EntityId),
}

impl Midpoint {
    /// Describes a midpoint on the edge `a`-`b`.
    pub fn new(loc: Loc, a: impl Into<EntityId>, b: impl Into<EntityId>) -> Self {
        Self {
            loc,
            edge: (a.into(), b.into()),
        }
    }
}

/// Inserts `node` between the edge endpoints in every way holding that edge.
///
/// Each way gains the node once, after the first segment joining the
/// endpoints (in either orientation). If no way holds the edge the graph is
/// returned unchanged; callers that need to know use [`Action::disabled`].
#[derive(Debug, Clone, PartialEq)]
pub struct AddMidpoint {
    midpoint: Midpoint,
    node: Node,
}

impl AddMidpoint {
    /// Binds the midpoint description and the node to insert.
    #[must_use]
    pub fn new(midpoint: Midpoint, node: Node) -> Self {
        Self { midpoint, node }
    }

    /// Ways holding the edge, paired with the index the node goes in at.
    fn targets(&self, graph: &Graph) -> Vec<(EntityId, usize)> {
        let (a, b) = &self.midpoint.edge;
        graph
            .parent_way_ids(a)
            .filter(|id| graph.parent_way_ids(b).any(|other| other == *id))
            .filter_map(|id| {
                let way = graph.way(id).ok()?;
                way.segment_index(a, b).map(|i| (id.clone(), i + 1))
            })
            .collect()
    }
}

impl Action for AddMidpoint {
    fn name(&self) -> &'static str {
        "add_midpoint"
    }

    fn apply(&self, graph: &Graph) -> Result<Graph, ActionError> {
        let targets = self.targets(graph);
        if targets.is_empty() {
            trace!(a = %self.midpoint.edge.0, b = %self.midpoint.edge.1, "midpoint edge not found");
            return Ok(graph.clone());
        }
        let mut next = graph.replace(self.node.clone().with_loc(self.midpoint.loc));
        for (way_id, index) in targets {
            let way = next.way(&way_id)?.clone();
            next = next.replace(way.with_node_at(index, self.node.id.clone()));
        }
        Ok(next)
    }

    fn disabled(&self, graph: &Graph) -> Option<DisabledReason> {
        let (a, b) = &self.midpoint.edge;
        DisabledReason::check(graph, a, EntityKind::Node)
            .or_else(|| DisabledReason::check(graph, b, EntityKind::Node))
            .or_else(|| {
                self.targets(graph).is_empty().then(|| DisabledReason::NotAdjacent {
                    a: a.clone(),
                    b: b.clone(),
                })
            })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::entity::{Entity, Way};

    fn id(s: &str) -> EntityId {
        EntityId::from(s)
    }

    fn graph() -> Graph {
        Graph::from_entities([
            Entity::from(Node::new("a", Loc::new(0.0, 0.0))),
            Entity::from(Node::new("b", Loc::new(2.0, 0.0))),
            Entity::from(Node::new("c", Loc::new(2.0, 2.0))),
            Entity::from(Way::new("w1", ["a", "b", "c"])),
            Entity::from(Way::new("w2", ["c", "b", "a"])),
        ])
    }

    #[test]
    fn splices_into_every_way_with_the_edge() {
        let action = AddMidpoint::new(
            Midpoint::new(Loc::new(1.0, 0.0), "a", "b"),
            Node::new("n-1", Loc::default()),
        );
        let out = action.apply(&graph()).unwrap();
        assert_eq!(out.way(&id("w1")).unwrap().nodes, vec![id("a"), id("n-1"), id("b"), id("c")]);
        assert_eq!(out.way(&id("w2")).unwrap().nodes, vec![id("c"), id("b"), id("n-1"), id("a")]);
        assert_eq!(out.node(&id("n-1")).unwrap().loc, Loc::new(1.0, 0.0));
        assert_eq!(out.parent_ways(&id("n-1")).len(), 2);
        out.validate().unwrap();
    }

    #[test]
    fn missing_edge_is_a_no_op() {
        let g = graph();
        let action = AddMidpoint::new(
            Midpoint::new(Loc::new(1.0, 1.0), "a", "c"),
            Node::new("n-1", Loc::default()),
        );
        let out = action.apply(&g).unwrap();
        assert_eq!(out, g);
        assert!(out.ptr_eq(&g));
        assert_eq!(
            action.disabled(&g),
            Some(DisabledReason::NotAdjacent { a: id("a"), b: id("c") })
        );
    }
}
