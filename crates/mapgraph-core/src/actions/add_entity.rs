// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
use crate::action::{Action, ActionError};
use crate::entity::Entity;
use crate::graph::Graph;

/// Inserts an entity into the graph.
///
/// If an entity with the same id already exists it is overwritten.
#[derive(Debug, Clone, PartialEq)]
pub struct AddEntity {
    entity: Entity,
}

impl AddEntity {
    /// Binds the entity to insert.
    pub fn new(entity: impl Into<Entity>) -> Self {
        Self {
            entity: entity.into(),
        }
    }

    /// The bound entity.
    #[must_use]
    pub fn entity(&self) -> &Entity {
        &self.entity
    }
}

impl Action for AddEntity {
    fn name(&self) -> &'static str {
        "add_entity"
    }

    fn apply(&self, graph: &Graph) -> Result<Graph, ActionError> {
        Ok(graph.replace(self.entity.clone()))
    }
}
