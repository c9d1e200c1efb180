// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
use crate::action::{Action, ActionError, DisabledReason};
use crate::entity::{Entity, Tags};
use crate::graph::Graph;
use crate::ident::EntityId;

/// Replaces an entity's whole tag mapping and bumps its version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeTags {
    id: EntityId,
    tags: Tags,
}

impl ChangeTags {
    /// Binds the target entity and its new tags.
    pub fn new(id: impl Into<EntityId>, tags: Tags) -> Self {
        Self {
            id: id.into(),
            tags,
        }
    }
}

impl Action for ChangeTags {
    fn name(&self) -> &'static str {
        "change_tags"
    }

    fn apply(&self, graph: &Graph) -> Result<Graph, ActionError> {
        Ok(graph.update(&self.id, |entity: Entity| entity.with_tags(self.tags.clone()))?)
    }

    fn disabled(&self, graph: &Graph) -> Option<DisabledReason> {
        (!graph.has_entity(&self.id)).then(|| DisabledReason::Missing(self.id.clone()))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::entity::{Loc, Node};
    use crate::graph::GraphError;

    #[test]
    fn replaces_tags_and_bumps_version() {
        let g = Graph::from_entities([Node::new("n1", Loc::default())]);
        let mut tags = Tags::new();
        tags.insert("name".into(), "Main".into());
        let out = ChangeTags::new("n1", tags.clone()).apply(&g).unwrap();
        let node = out.entity(&EntityId::from("n1")).unwrap();
        assert_eq!(node.tags(), &tags);
        assert_eq!(node.version(), 1);
        assert!(g.entity(&EntityId::from("n1")).unwrap().tags().is_empty());
    }

    #[test]
    fn missing_target_is_reported() {
        let action = ChangeTags::new("gone", Tags::new());
        assert_eq!(
            action.apply(&Graph::new()),
            Err(ActionError::Graph(GraphError::NotFound(EntityId::from("gone"))))
        );
        assert!(action.disabled(&Graph::new()).is_some());
    }
}
