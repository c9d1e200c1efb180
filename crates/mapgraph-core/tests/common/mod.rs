// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(dead_code)]

use mapgraph_core::{Entity, EntityId, EntityKind, Graph, Loc, Member, Node, Relation, Way};

/// Shorthand for building ids in assertions.
pub fn id(s: &str) -> EntityId {
    EntityId::from(s)
}

/// Untagged node at `(lon, lat)`.
pub fn node(id: &str, lon: f64, lat: f64) -> Entity {
    Entity::from(Node::new(id, Loc::new(lon, lat)))
}

/// Untagged way through `nodes`.
pub fn way(id: &str, nodes: &[&str]) -> Entity {
    Entity::from(Way::new(id, nodes.iter().copied()))
}

/// Via-node junction: `u --(=)-- * --(-)-- w`.
pub fn via_node_graph() -> Graph {
    Graph::from_entities([
        node("u", -1.0, 0.0),
        node("*", 0.0, 0.0),
        node("w", 1.0, 0.0),
        way("=", &["u", "*"]),
        way("-", &["*", "w"]),
    ])
}

/// Via-way junction: `u --(=)-- v1 --(|)-- v2 --(-)-- w`.
pub fn via_way_graph() -> Graph {
    Graph::from_entities([
        node("u", -1.0, 0.0),
        node("v1", 0.0, 0.0),
        node("v2", 0.0, 1.0),
        node("w", -1.0, 1.0),
        way("=", &["u", "v1"]),
        way("|", &["v1", "v2"]),
        way("-", &["v2", "w"]),
    ])
}

/// `(id, kind, role)` triples of a relation's members, in order.
pub fn member_triples(relation: &Relation) -> Vec<(String, EntityKind, String)> {
    relation
        .members
        .iter()
        .map(|Member { id, kind, role }| (id.to_string(), *kind, role.clone()))
        .collect()
}
