// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
use crate::action::{Action, ActionError, DisabledReason};
use crate::entity::Loc;
use crate::graph::Graph;
use crate::ident::{EntityId, EntityKind};

/// Sets a node's location. Parent ways are unaffected.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveNode {
    id: EntityId,
    loc: Loc,
}

impl MoveNode {
    /// Binds the node and its destination.
    pub fn new(id: impl Into<EntityId>, loc: Loc) -> Self {
        Self { id: id.into(), loc }
    }
}

impl Action for MoveNode {
    fn name(&self) -> &'static str {
        "move_node"
    }

    fn apply(&self, graph: &Graph) -> Result<Graph, ActionError> {
        let node = graph.node(&self.id)?.clone();
        Ok(graph.replace(node.with_loc(self.loc)))
    }

    fn disabled(&self, graph: &Graph) -> Option<DisabledReason> {
        DisabledReason::check(graph, &self.id, EntityKind::Node)
    }
}
