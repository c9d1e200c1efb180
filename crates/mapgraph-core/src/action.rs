// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Action protocol: pure `Graph -> Graph` transforms with bound parameters.
//!
//! An action is a value object constructed with all of its parameters and
//! then applied to a graph. Applying never mutates the input; it returns a
//! new graph (possibly sharing all structure with the input when nothing
//! changed). Actions are side-effect free, so the same action applied to the
//! same graph always yields the same result.
use std::fmt;

use thiserror::Error;

use crate::graph::{Graph, GraphError};
use crate::ident::{EntityId, EntityKind};

/// Errors raised while applying an action.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    /// A turn restriction was described with an unusable shape.
    #[error("invalid turn description: {0}")]
    InvalidTurnDescription(&'static str),
    /// A graph read failed (missing entity, wrong kind, dangling reference).
    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Why an action cannot currently be applied to a graph.
///
/// Reported by [`Action::disabled`]. Single actions check preconditions
/// without building a new graph; [`Compose`] dry-runs its steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisabledReason {
    /// A referenced entity does not exist.
    Missing(EntityId),
    /// A referenced entity exists with the wrong variant.
    WrongKind {
        /// Offending id.
        id: EntityId,
        /// Variant the action needs.
        expected: EntityKind,
        /// Variant found in the graph.
        found: EntityKind,
    },
    /// The turn description is not a usable restriction shape.
    InvalidTurn(&'static str),
    /// The action's geometry precondition does not hold.
    NotAdjacent {
        /// First endpoint.
        a: EntityId,
        /// Second endpoint.
        b: EntityId,
    },
    /// Applying the action fails for a reason the cases above do not cover.
    Failed(ActionError),
}

impl fmt::Display for DisabledReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing(id) => write!(f, "{id} is not in the graph"),
            Self::WrongKind {
                id,
                expected,
                found,
            } => write!(f, "{id} is a {found}, expected a {expected}"),
            Self::InvalidTurn(why) => write!(f, "invalid turn: {why}"),
            Self::NotAdjacent { a, b } => write!(f, "{a} and {b} share no way segment"),
            Self::Failed(err) => write!(f, "{err}"),
        }
    }
}

impl DisabledReason {
    /// Returns `Some(reason)` when `id` is missing or not of `kind`.
    pub(crate) fn check(graph: &Graph, id: &EntityId, kind: EntityKind) -> Option<Self> {
        match graph.get(id) {
            None => Some(Self::Missing(id.clone())),
            Some(entity) if entity.kind() != kind => Some(Self::WrongKind {
                id: id.clone(),
                expected: kind,
                found: entity.kind(),
            }),
            Some(_) => None,
        }
    }
}

impl From<ActionError> for DisabledReason {
    fn from(err: ActionError) -> Self {
        match err {
            ActionError::InvalidTurnDescription(why) => Self::InvalidTurn(why),
            ActionError::Graph(GraphError::NotFound(id)) => Self::Missing(id),
            ActionError::Graph(GraphError::DanglingReference { missing, .. }) => {
                Self::Missing(missing)
            }
            ActionError::Graph(GraphError::WrongKind {
                id,
                expected,
                found,
            }) => Self::WrongKind {
                id,
                expected,
                found,
            },
            other @ ActionError::Graph(GraphError::InconsistentIndex { .. }) => {
                Self::Failed(other)
            }
        }
    }
}

/// A bound-parameter graph transform.
pub trait Action: fmt::Debug {
    /// Short stable name (`add_entity`, `restrict_turn`, ...), used in logs.
    fn name(&self) -> &'static str;

    /// Applies the transform, returning the new graph.
    fn apply(&self, graph: &Graph) -> Result<Graph, ActionError>;

    /// Precondition check; `None` means the action is applicable.
    ///
    /// The default reports every action as applicable.
    fn disabled(&self, _graph: &Graph) -> Option<DisabledReason> {
        None
    }
}

impl<A: Action + ?Sized> Action for Box<A> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn apply(&self, graph: &Graph) -> Result<Graph, ActionError> {
        (**self).apply(graph)
    }

    fn disabled(&self, graph: &Graph) -> Option<DisabledReason> {
        (**self).disabled(graph)
    }
}

impl<A: Action + ?Sized> Action for &A {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn apply(&self, graph: &Graph) -> Result<Graph, ActionError> {
        (**self).apply(graph)
    }

    fn disabled(&self, graph: &Graph) -> Option<DisabledReason> {
        (**self).disabled(graph)
    }
}

/// Transform function wrapped by [`FnAction`].
pub type ApplyFn = dyn Fn(&Graph) -> Result<Graph, ActionError> + Send + Sync;

/// Ad-hoc action built from a closure.
pub struct FnAction {
    name: &'static str,
    apply: Box<ApplyFn>,
}

/// Wraps a closure as an [`Action`].
pub fn from_fn<F>(name: &'static str, apply: F) -> FnAction
where
    F: Fn(&Graph) -> Result<Graph, ActionError> + Send + Sync + 'static,
{
    FnAction {
        name,
        apply: Box::new(apply),
    }
}

impl fmt::Debug for FnAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnAction").field("name", &self.name).finish()
    }
}

impl Action for FnAction {
    fn name(&self) -> &'static str {
        self.name
    }

    fn apply(&self, graph: &Graph) -> Result<Graph, ActionError> {
        (self.apply)(graph)
    }
}

/// Applies a sequence of actions in order as one transform.
///
/// Stops at the first failing step; intermediate graphs are discarded, so a
/// failure leaves no partial result.
#[derive(Debug, Default)]
pub struct Compose {
    steps: Vec<Box<dyn Action + Send + Sync>>,
}

impl Compose {
    /// Creates an empty composition (the identity transform).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a step.
    #[must_use]
    pub fn then(mut self, action: impl Action + Send + Sync + 'static) -> Self {
        self.steps.push(Box::new(action));
        self
    }

    /// Appends an already boxed step.
    pub fn push(&mut self, action: Box<dyn Action + Send + Sync>) {
        self.steps.push(action);
    }

    /// Number of steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// `true` if there are no steps.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl Action for Compose {
    fn name(&self) -> &'static str {
        "compose"
    }

    fn apply(&self, graph: &Graph) -> Result<Graph, ActionError> {
        self.steps
            .iter()
            .try_fold(graph.clone(), |acc, step| step.apply(&acc))
    }

    /// Reports the first step that is disabled against the graph produced by
    /// the steps before it, or whose application fails.
    fn disabled(&self, graph: &Graph) -> Option<DisabledReason> {
        let mut acc = graph.clone();
        for step in &self.steps {
            if let Some(reason) = step.disabled(&acc) {
                return Some(reason);
            }
            match step.apply(&acc) {
                Ok(next) => acc = next,
                Err(err) => return Some(err.into()),
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::actions::{AddEntity, MoveNode};
    use crate::entity::{Loc, Node};

    #[test]
    fn fn_action_applies_closure() {
        let add = from_fn("add_a", |g| Ok(g.replace(Node::new("a", Loc::default()))));
        let g = add.apply(&Graph::new()).unwrap();
        assert!(g.has_entity(&EntityId::from("a")));
        assert_eq!(add.name(), "add_a");
        assert!(add.disabled(&g).is_none());
    }

    #[test]
    fn compose_is_fail_fast() {
        let ok = from_fn("ok", |g| Ok(g.replace(Node::new("a", Loc::default()))));
        let fail = from_fn("fail", |g| {
            g.entity(&EntityId::from("zz"))?;
            Ok(g.clone())
        });
        let composed = Compose::new().then(ok).then(fail);
        assert_eq!(composed.len(), 2);
        let err = composed.apply(&Graph::new()).unwrap_err();
        assert_eq!(err, ActionError::Graph(GraphError::NotFound(EntityId::from("zz"))));
    }

    #[test]
    fn compose_disabled_checks_later_steps() {
        let g = Graph::new().replace(Node::new("a", Loc::default()));
        let composed = Compose::new()
            .then(MoveNode::new("a", Loc::new(1.0, 1.0)))
            .then(MoveNode::new("missing", Loc::default()));
        assert_eq!(
            composed.disabled(&g),
            Some(DisabledReason::Missing(EntityId::from("missing")))
        );
        assert!(composed.apply(&g).is_err());
    }

    #[test]
    fn compose_disabled_sees_earlier_steps() {
        let composed = Compose::new()
            .then(AddEntity::new(Node::new("a", Loc::default())))
            .then(MoveNode::new("a", Loc::new(1.0, 1.0)));
        assert_eq!(composed.disabled(&Graph::new()), None);

        let failing = Compose::new().then(from_fn("fail", |g| {
            g.entity(&EntityId::from("zz"))?;
            Ok(g.clone())
        }));
        assert_eq!(
            failing.disabled(&Graph::new()),
            Some(DisabledReason::Missing(EntityId::from("zz")))
        );
    }

    #[test]
    fn empty_compose_shares_input() {
        let g = Graph::new().replace(Node::new("a", Loc::default()));
        let out = Compose::new().apply(&g).unwrap();
        assert!(out.ptr_eq(&g));
    }

    #[test]
    fn disabled_reason_check() {
        let g = Graph::new().replace(Node::new("a", Loc::default()));
        let a = EntityId::from("a");
        assert_eq!(DisabledReason::check(&g, &a, EntityKind::Node), None);
        assert_eq!(
            DisabledReason::check(&g, &a, EntityKind::Way),
            Some(DisabledReason::WrongKind {
                id: a.clone(),
                expected: EntityKind::Way,
                found: EntityKind::Node
            })
        );
        assert_eq!(
            DisabledReason::check(&g, &EntityId::from("b"), EntityKind::Way),
            Some(DisabledReason::Missing(EntityId::from("b")))
        );
    }
}
