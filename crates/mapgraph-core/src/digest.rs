// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Canonical graph digests.
//!
//! [`graph_digest`] hashes the entity set of a graph in ascending id order
//! with a fixed binary layout (BLAKE3):
//!
//! - `u16` layout version, then `u64` entity count.
//! - Per entity: kind tag byte, id, `u64` version, visibility byte, tags
//!   (count, then key/value pairs), then the variant payload.
//! - Node payload: `lon` and `lat` as IEEE-754 bit patterns.
//! - Way payload: node count, then node ids.
//! - Relation payload: member count, then `(kind tag, id, role)` triples.
//!
//! Strings are length-prefixed (`u64`, little-endian). Parent indices are
//! derived data and are not hashed, so two graphs with equal entity sets share
//! a digest regardless of how they were built.
use blake3::Hasher;

use crate::entity::{Entity, Tags};
use crate::graph::Graph;
use crate::ident::{EntityKind, Hash};

const DIGEST_LAYOUT_V1: u16 = 1;

/// Computes the canonical digest of a graph's entity set.
#[must_use]
pub fn graph_digest(graph: &Graph) -> Hash {
    let mut hasher = Hasher::new();
    hasher.update(&DIGEST_LAYOUT_V1.to_le_bytes());
    hasher.update(&(graph.len() as u64).to_le_bytes());
    for entity in graph.iter() {
        hash_entity(&mut hasher, entity);
    }
    hasher.finalize().into()
}

/// Lowercase hex rendering of [`graph_digest`].
#[must_use]
pub fn graph_digest_hex(graph: &Graph) -> String {
    hex::encode(graph_digest(graph))
}

fn hash_entity(hasher: &mut Hasher, entity: &Entity) {
    hasher.update(&[kind_tag(entity.kind())]);
    hash_str(hasher, entity.id().as_str());
    hasher.update(&entity.version().to_le_bytes());
    hasher.update(&[u8::from(entity.visible())]);
    hash_tags(hasher, entity.tags());
    match entity {
        Entity::Node(node) => {
            hasher.update(&node.loc.lon.to_bits().to_le_bytes());
            hasher.update(&node.loc.lat.to_bits().to_le_bytes());
        }
        Entity::Way(way) => {
            hasher.update(&(way.nodes.len() as u64).to_le_bytes());
            for node in &way.nodes {
                hash_str(hasher, node.as_str());
            }
        }
        Entity::Relation(relation) => {
            hasher.update(&(relation.members.len() as u64).to_le_bytes());
            for member in &relation.members {
                hasher.update(&[kind_tag(member.kind)]);
                hash_str(hasher, member.id.as_str());
                hash_str(hasher, &member.role);
            }
        }
    }
}

fn hash_tags(hasher: &mut Hasher, tags: &Tags) {
    hasher.update(&(tags.len() as u64).to_le_bytes());
    for (key, value) in tags {
        hash_str(hasher, key);
        hash_str(hasher, value);
    }
}

fn hash_str(hasher: &mut Hasher, value: &str) {
    hasher.update(&(value.len() as u64).to_le_bytes());
    hasher.update(value.as_bytes());
}

const fn kind_tag(kind: EntityKind) -> u8 {
    match kind {
        EntityKind::Node => 1,
        EntityKind::Way => 2,
        EntityKind::Relation => 3,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Loc, Node, Way};

    fn sample() -> Graph {
        Graph::from_entities([
            Entity::from(Node::new("a", Loc::new(0.0, 0.0))),
            Entity::from(Node::new("b", Loc::new(1.0, 0.0))),
            Entity::from(Way::new("w1", ["a", "b"])),
        ])
    }

    #[test]
    fn digest_ignores_insertion_order() {
        let reversed = Graph::from_entities([
            Entity::from(Way::new("w1", ["a", "b"])),
            Entity::from(Node::new("b", Loc::new(1.0, 0.0))),
            Entity::from(Node::new("a", Loc::new(0.0, 0.0))),
        ]);
        assert_eq!(graph_digest(&sample()), graph_digest(&reversed));
    }

    #[test]
    fn digest_sees_node_order_and_location() {
        let base = graph_digest(&sample());
        assert_ne!(base, graph_digest(&sample().replace(Way::new("w1", ["b", "a"]))));
        assert_ne!(
            base,
            graph_digest(&sample().replace(Node::new("a", Loc::new(0.0, 1e-9))))
        );
    }

    #[test]
    fn length_prefixes_prevent_concatenation_collisions() {
        let ab = Graph::from_entities([Way::new("w", ["ab", "c"])]);
        let a_bc = Graph::from_entities([Way::new("w", ["a", "bc"])]);
        assert_ne!(graph_digest(&ab), graph_digest(&a_bc));
    }

    #[test]
    fn hex_is_64_lowercase_chars() {
        let hex = graph_digest_hex(&Graph::new());
        assert_eq!(hex.len(), 64);
        assert!(hex.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b)));
    }
}
