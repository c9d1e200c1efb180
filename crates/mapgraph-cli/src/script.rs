// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! JSON edit scripts: a base graph plus a sequence of editor calls.
use mapgraph_core::actions::{
    AddEntity, AddMidpoint, ChangeTags, DeleteNode, DeleteRelation, DeleteWay, Midpoint,
    MoveNode, RestrictTurn, Turn,
};
use mapgraph_core::{
    graph_digest_hex, Action, ActionError, CommitOptions, Compose, Difference, Editor,
    EditorConfig, EditorState, Entity, EntityId, Graph, Loc, Navigation, Node, Outcome, Tags,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

/// A replayable editing session.
#[derive(Debug, Clone, Deserialize)]
pub struct Script {
    /// Entities of the graph the editor opens on.
    #[serde(default)]
    pub base: Vec<Entity>,
    /// Editor calls, in order.
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// One editor call.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    /// `Editor::perform`.
    Perform {
        /// The action to apply.
        action: ActionSpec,
    },
    /// `Editor::commit`.
    Commit {
        /// Edit annotation.
        #[serde(default)]
        annotation: Option<String>,
        /// Selection recorded with the edit.
        #[serde(default)]
        selected_ids: Vec<EntityId>,
    },
    /// `Editor::rollback`.
    Rollback,
    /// `Editor::undo`.
    Undo,
    /// `Editor::redo`.
    Redo,
    /// `Editor::mark_saved`.
    MarkSaved,
    /// `Editor::reset`.
    Reset,
}

/// Serializable description of a built-in action.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ActionSpec {
    /// [`AddEntity`].
    AddEntity {
        /// Entity to insert.
        entity: Entity,
    },
    /// [`ChangeTags`].
    ChangeTags {
        /// Target entity.
        id: EntityId,
        /// Replacement tags.
        tags: Tags,
    },
    /// [`MoveNode`].
    MoveNode {
        /// Target node.
        id: EntityId,
        /// New location.
        loc: Loc,
    },
    /// [`AddMidpoint`].
    AddMidpoint {
        /// Edge and location.
        midpoint: Midpoint,
        /// Node to insert.
        node: Node,
    },
    /// [`RestrictTurn`].
    RestrictTurn {
        /// Described turn.
        turn: Turn,
        /// Restriction value, e.g. `no_left_turn`.
        restriction: String,
        /// Explicit relation id; a fresh local id otherwise.
        #[serde(default)]
        id: Option<EntityId>,
    },
    /// [`DeleteNode`].
    DeleteNode {
        /// Target node.
        id: EntityId,
    },
    /// [`DeleteWay`].
    DeleteWay {
        /// Target way.
        id: EntityId,
    },
    /// [`DeleteRelation`].
    DeleteRelation {
        /// Target relation.
        id: EntityId,
    },
    /// [`Compose`].
    Compose {
        /// Nested actions applied in order.
        steps: Vec<ActionSpec>,
    },
}

impl ActionSpec {
    /// Binds the described action.
    pub fn build(self) -> Box<dyn Action + Send + Sync> {
        match self {
            Self::AddEntity { entity } => Box::new(AddEntity::new(entity)),
            Self::ChangeTags { id, tags } => Box::new(ChangeTags::new(id, tags)),
            Self::MoveNode { id, loc } => Box::new(MoveNode::new(id, loc)),
            Self::AddMidpoint { midpoint, node } => Box::new(AddMidpoint::new(midpoint, node)),
            Self::RestrictTurn {
                turn,
                restriction,
                id,
            } => {
                let action = RestrictTurn::new(turn, restriction);
                Box::new(match id {
                    Some(id) => action.with_id(id),
                    None => action,
                })
            }
            Self::DeleteNode { id } => Box::new(DeleteNode::new(id)),
            Self::DeleteWay { id } => Box::new(DeleteWay::new(id)),
            Self::DeleteRelation { id } => Box::new(DeleteRelation::new(id)),
            Self::Compose { steps } => {
                let mut compose = Compose::new();
                for step in steps {
                    compose.push(step.build());
                }
                Box::new(compose)
            }
        }
    }
}

/// Script failure, pointing at the step that failed.
#[derive(Debug, Error)]
#[error("step {index} failed: {source}")]
pub struct StepError {
    /// Zero-based step index.
    pub index: usize,
    /// Action failure.
    #[source]
    pub source: ActionError,
}

/// Final editor state after a replay.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    /// Hex digest of the current graph.
    pub digest: String,
    /// Entity count of the current graph.
    pub entities: usize,
    /// `true` if the replay ended with staged changes.
    pub staging: bool,
    /// History cursor.
    pub cursor: usize,
    /// Annotations of retained edits, oldest first.
    pub edits: Vec<Option<String>>,
    /// Changes since the history base.
    pub difference: Difference,
    /// Unsaved-changes flag.
    pub unsaved: bool,
    /// Validation failure of the current graph, if any.
    pub invalid: Option<String>,
    /// Per-step notes (`unchanged`, `undo: <annotation>`, ...).
    pub log: Vec<String>,
}

impl Script {
    /// Runs every step against a fresh editor.
    pub fn replay(self, config: EditorConfig) -> Result<Report, StepError> {
        let mut editor = Editor::with_config(Graph::from_entities(self.base), config);
        let mut log = Vec::new();
        for (index, step) in self.steps.into_iter().enumerate() {
            let note = run_step(&mut editor, step).map_err(|source| StepError { index, source })?;
            info!(index, note = note.as_str(), "step");
            log.push(note);
        }
        Ok(report(&editor, log))
    }
}

fn run_step(editor: &mut Editor, step: Step) -> Result<String, ActionError> {
    let note = match step {
        Step::Perform { action } => {
            let action = action.build();
            let name = action.name();
            match editor.perform(&action)? {
                Outcome::Changed => format!("{name}: changed"),
                Outcome::Unchanged => format!("{name}: unchanged"),
            }
        }
        Step::Commit {
            annotation,
            selected_ids,
        } => {
            let options = CommitOptions {
                annotation,
                selected_ids,
            };
            match editor.commit(options) {
                Some(edit) => format!("commit: {}", edit.annotation().unwrap_or("")),
                None => "commit: nothing staged".to_owned(),
            }
        }
        Step::Rollback => format!("rollback: {}", editor.rollback()),
        Step::Undo => navigation("undo", editor.undo()),
        Step::Redo => navigation("redo", editor.redo()),
        Step::MarkSaved => {
            editor.mark_saved();
            "mark_saved".to_owned()
        }
        Step::Reset => {
            editor.reset();
            "reset".to_owned()
        }
    };
    Ok(note)
}

fn navigation(op: &str, nav: Navigation) -> String {
    match nav {
        Navigation::Moved { annotation } => {
            format!("{op}: {}", annotation.as_deref().unwrap_or(""))
        }
        Navigation::AtBoundary => format!("{op}: at boundary"),
    }
}

fn report(editor: &Editor, log: Vec<String>) -> Report {
    let current = editor.current();
    Report {
        digest: graph_digest_hex(current),
        entities: current.len(),
        staging: editor.state() == EditorState::Staging,
        cursor: editor.history().cursor(),
        edits: editor
            .history()
            .edits()
            .map(|e| e.annotation().map(str::to_owned))
            .collect(),
        difference: editor.difference(),
        unsaved: editor.has_unsaved_changes(),
        invalid: current.validate().err().map(|e| e.to_string()),
        log,
    }
}
