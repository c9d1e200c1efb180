// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Turn-restriction relation builder.
//!
//! A turn is described as an approach leg, a pivot and a departure leg. The
//! pivot is either a single shared node (via-node) or a chain of one or more
//! intermediate ways (via-way). The builder is a pure constructor: it checks
//! the *shape* of the description but does not verify that the referenced
//! entities exist or are mutually incident. Existence is reported by
//! [`Action::disabled`] and, after the fact, by [`Graph::validate`].
use serde::{Deserialize, Serialize};

use crate::action::{Action, ActionError, DisabledReason};
use crate::entity::{Member, Relation, Tags};
use crate::graph::Graph;
use crate::ident::{EntityId, EntityKind};

/// Approach or departure leg of a turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnLeg {
    /// The way travelled along.
    pub way: EntityId,
    /// The far node of the leg, when the caller knows it. Not encoded in the
    /// relation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node: Option<EntityId>,
}

impl TurnLeg {
    /// A leg along `way` ending or starting at `node`.
    pub fn new(node: impl Into<EntityId>, way: impl Into<EntityId>) -> Self {
        Self {
            way: way.into(),
            node: Some(node.into()),
        }
    }

    /// A leg known only by its way.
    pub fn way(way: impl Into<EntityId>) -> Self {
        Self {
            way: way.into(),
            node: None,
        }
    }
}

/// Pivot of a turn. Exactly one of `node` or a non-empty `ways` must be set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Via {
    /// Single pivot node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node: Option<EntityId>,
    /// Intermediate ways, in travel order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ways: Vec<EntityId>,
}

impl Via {
    /// Via-node pivot.
    pub fn node(node: impl Into<EntityId>) -> Self {
        Self {
            node: Some(node.into()),
            ways: Vec::new(),
        }
    }

    /// Via-way pivot.
    pub fn ways<I, T>(ways: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<EntityId>,
    {
        Self {
            node: None,
            ways: ways.into_iter().map(Into::into).collect(),
        }
    }

    fn members(&self) -> Result<Vec<Member>, ActionError> {
        match (&self.node, self.ways.as_slice()) {
            (Some(_), [_, ..]) => Err(ActionError::InvalidTurnDescription(
                "via has both a node and ways",
            )),
            (Some(node), []) => Ok(vec![Member::new(node, EntityKind::Node, "via")]),
            (None, []) => Err(ActionError::InvalidTurnDescription(
                "via needs a node or at least one way",
            )),
            (None, ways) => Ok(ways
                .iter()
                .map(|way| Member::new(way, EntityKind::Way, "via"))
                .collect()),
        }
    }
}

/// A described turn: `from` leg, pivot, `to` leg.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    /// Approach leg.
    pub from: TurnLeg,
    /// Pivot.
    pub via: Via,
    /// Departure leg.
    pub to: TurnLeg,
}

/// Adds a `type=restriction` relation encoding a turn.
///
/// Members are emitted in fixed order: `from` way, then the via node or each
/// via way in the given order, then `to` way. The restriction value
/// (`no_left_turn`, `only_straight_on`, ...) is not checked against any
/// vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestrictTurn {
    turn: Turn,
    restriction: String,
    id: Option<EntityId>,
}

impl RestrictTurn {
    /// Binds a turn and restriction value. The relation gets the graph's next
    /// local relation id unless [`RestrictTurn::with_id`] is used.
    pub fn new(turn: Turn, restriction: impl Into<String>) -> Self {
        Self {
            turn,
            restriction: restriction.into(),
            id: None,
        }
    }

    /// Uses an explicit relation id, making repeated application idempotent.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<EntityId>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Builds the relation this action would insert into `graph`.
    pub fn relation(&self, graph: &Graph) -> Result<Relation, ActionError> {
        let via = self.turn.via.members()?;
        let mut members = Vec::with_capacity(via.len() + 2);
        members.push(Member::new(&self.turn.from.way, EntityKind::Way, "from"));
        members.extend(via);
        members.push(Member::new(&self.turn.to.way, EntityKind::Way, "to"));

        let mut tags = Tags::new();
        tags.insert("type".to_owned(), "restriction".to_owned());
        tags.insert("restriction".to_owned(), self.restriction.clone());

        let id = self
            .id
            .clone()
            .unwrap_or_else(|| graph.next_local_id(EntityKind::Relation));
        Ok(Relation::new(id, tags, members))
    }
}

impl Action for RestrictTurn {
    fn name(&self) -> &'static str {
        "restrict_turn"
    }

    fn apply(&self, graph: &Graph) -> Result<Graph, ActionError> {
        Ok(graph.replace(self.relation(graph)?))
    }

    fn disabled(&self, graph: &Graph) -> Option<DisabledReason> {
        let via = match self.turn.via.members() {
            Ok(via) => via,
            Err(ActionError::InvalidTurnDescription(why)) => {
                return Some(DisabledReason::InvalidTurn(why));
            }
            Err(ActionError::Graph(_)) => Vec::new(),
        };
        let legs = [&self.turn.from, &self.turn.to];
        legs.iter()
            .find_map(|leg| DisabledReason::check(graph, &leg.way, EntityKind::Way))
            .or_else(|| {
                legs.iter()
                    .filter_map(|leg| leg.node.as_ref())
                    .find_map(|node| DisabledReason::check(graph, node, EntityKind::Node))
            })
            .or_else(|| {
                via.iter()
                    .find_map(|m| DisabledReason::check(graph, &m.id, m.kind))
            })
    }
}
