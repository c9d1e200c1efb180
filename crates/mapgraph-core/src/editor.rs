// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Editor: staging graph on top of a committed history.
//!
//! `perform` applies actions to a staging graph that consumers see as
//! "current" right away (live preview), without touching history. `commit`
//! seals staging into an [`Edit`]; `rollback` discards it. `undo`/`redo` move
//! the history cursor and always leave the editor idle.
//!
//! The editor is single-writer: every mutating call takes `&mut self`. Graph
//! snapshots handed out by [`Editor::snapshot`] and change events are
//! immutable and can be read from any thread while the editor moves on.
use std::fmt;
use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::action::{Action, ActionError, DisabledReason};
use crate::config::EditorConfig;
use crate::graph::{Difference, Graph};
use crate::history::{Edit, History};
use crate::ident::{EntityId, EntityKind};
use crate::sink::{ChangeEvent, ChangeKind, ChangeSink, NullSink, TracingSink};

/// Whether uncommitted changes exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorState {
    /// No staged changes; current is the history cursor's graph.
    Idle,
    /// One or more performed actions await commit or rollback.
    Staging,
}

/// Result of [`Editor::perform`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The action produced a new graph, now staged.
    Changed,
    /// The action returned its input graph untouched (e.g. a midpoint on an
    /// edge no way holds). Editor state is unchanged.
    Unchanged,
}

/// Result of [`Editor::undo`] and [`Editor::redo`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// The cursor moved over the edit with this annotation.
    Moved {
        /// Annotation of the undone or redone edit.
        annotation: Option<String>,
    },
    /// Nothing to undo or redo.
    AtBoundary,
}

/// Parameters of [`Editor::commit`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitOptions {
    /// Human-readable description shown in undo/redo UI.
    pub annotation: Option<String>,
    /// Entities selected when committing, restored on undo/redo by the UI.
    pub selected_ids: Vec<EntityId>,
}

impl CommitOptions {
    /// Options with an annotation and an empty selection.
    pub fn new(annotation: impl Into<String>) -> Self {
        Self {
            annotation: Some(annotation.into()),
            selected_ids: Vec::new(),
        }
    }

    /// Sets the selection.
    #[must_use]
    pub fn with_selected<I, T>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<EntityId>,
    {
        self.selected_ids = ids.into_iter().map(Into::into).collect();
        self
    }
}

/// Staging graph plus linear history for one document.
pub struct Editor {
    history: History,
    staging: Option<Graph>,
    sink: Arc<dyn ChangeSink>,
    config: EditorConfig,
}

impl fmt::Debug for Editor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Editor")
            .field("state", &self.state())
            .field("history", &self.history)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Editor {
    /// Opens an editor on `base` with the default config.
    #[must_use]
    pub fn new(base: Graph) -> Self {
        Self::with_config(base, EditorConfig::default())
    }

    /// Opens an editor on `base` with `config`.
    #[must_use]
    pub fn with_config(base: Graph, config: EditorConfig) -> Self {
        let sink: Arc<dyn ChangeSink> = if config.log_changes {
            Arc::new(TracingSink)
        } else {
            Arc::new(NullSink)
        };
        Self {
            history: History::new(base, config.max_history),
            staging: None,
            sink,
            config,
        }
    }

    /// Replaces the change sink.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn ChangeSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Idle or staging.
    #[must_use]
    pub fn state(&self) -> EditorState {
        if self.staging.is_some() {
            EditorState::Staging
        } else {
            EditorState::Idle
        }
    }

    /// The graph consumers should render: staging if present, else the
    /// history cursor's graph.
    #[must_use]
    pub fn current(&self) -> &Graph {
        self.staging.as_ref().unwrap_or_else(|| self.history.graph())
    }

    /// An owned handle on [`Editor::current`]. O(1).
    #[must_use]
    pub fn snapshot(&self) -> Graph {
        self.current().clone()
    }

    /// The committed history.
    #[must_use]
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Applies `action` to the current graph and stages the result.
    ///
    /// Action errors propagate unchanged and leave the editor untouched.
    #[instrument(level = "debug", skip_all, fields(action = action.name()))]
    pub fn perform<A: Action + ?Sized>(&mut self, action: &A) -> Result<Outcome, ActionError> {
        let next = action.apply(self.current())?;
        if next.ptr_eq(self.current()) {
            debug!("action left graph unchanged");
            return Ok(Outcome::Unchanged);
        }
        debug!(entities = next.len(), "staged");
        self.staging = Some(next);
        self.notify(ChangeKind::Perform, None);
        Ok(Outcome::Changed)
    }

    /// Checks whether `action` is applicable to the current graph.
    pub fn disabled<A: Action + ?Sized>(&self, action: &A) -> Option<DisabledReason> {
        action.disabled(self.current())
    }

    /// Seals staging into a new history edit.
    ///
    /// Edits ahead of the cursor (undone edits) are discarded. Returns `None`
    /// without touching history when nothing is staged.
    #[instrument(level = "debug", skip_all, fields(annotation = options.annotation.as_deref()))]
    pub fn commit(&mut self, options: CommitOptions) -> Option<&Edit> {
        let Some(graph) = self.staging.take() else {
            debug!("nothing staged");
            return None;
        };
        if self.config.validate_on_commit {
            if let Err(err) = graph.validate() {
                warn!(error = %err, "committing graph that fails validation");
            }
        }
        let discarded = self.history.len() - self.history.cursor();
        if discarded > 0 {
            debug!(discarded, "truncating redo edits");
        }
        self.history
            .push(graph, options.annotation, options.selected_ids);
        let annotation = self.history.current().annotation().map(str::to_owned);
        self.notify(ChangeKind::Commit, annotation.as_deref());
        Some(self.history.current())
    }

    /// Discards staging. Returns `false` if nothing was staged.
    pub fn rollback(&mut self) -> bool {
        if self.staging.take().is_none() {
            return false;
        }
        debug!("staging discarded");
        self.notify(ChangeKind::Rollback, None);
        true
    }

    /// Steps the history cursor back, discarding staged changes first.
    ///
    /// At the oldest edit this is a no-op and staging is kept.
    pub fn undo(&mut self) -> Navigation {
        if !self.history.can_undo() {
            debug!("nothing to undo");
            return Navigation::AtBoundary;
        }
        self.rollback();
        let Some(edit) = self.history.undo() else {
            return Navigation::AtBoundary;
        };
        let annotation = edit.annotation().map(str::to_owned);
        debug!(annotation = annotation.as_deref(), "undo");
        self.notify(ChangeKind::Undo, annotation.as_deref());
        Navigation::Moved { annotation }
    }

    /// Steps the history cursor forward, discarding staged changes first.
    ///
    /// With nothing to redo this is a no-op and staging is kept.
    pub fn redo(&mut self) -> Navigation {
        if !self.history.can_redo() {
            debug!("nothing to redo");
            return Navigation::AtBoundary;
        }
        self.rollback();
        let Some(edit) = self.history.redo() else {
            return Navigation::AtBoundary;
        };
        let annotation = edit.annotation().map(str::to_owned);
        debug!(annotation = annotation.as_deref(), "redo");
        self.notify(ChangeKind::Redo, annotation.as_deref());
        Navigation::Moved { annotation }
    }

    /// Drops staging and every committed edit, returning to the base graph.
    pub fn reset(&mut self) {
        self.staging = None;
        self.history.reset();
        self.notify(ChangeKind::Reset, None);
    }

    /// Changes between the history base and the current graph.
    #[must_use]
    pub fn difference(&self) -> Difference {
        self.history.base().difference(self.current())
    }

    /// Next unused local id of `kind` in the current graph.
    #[must_use]
    pub fn next_id(&self, kind: EntityKind) -> EntityId {
        self.current().next_local_id(kind)
    }

    /// Records the current history position as saved.
    pub fn mark_saved(&mut self) {
        self.history.mark_saved();
    }

    /// `true` if staging exists or the cursor moved since the last save.
    #[must_use]
    pub fn has_unsaved_changes(&self) -> bool {
        self.staging.is_some() || self.history.has_unsaved_changes()
    }

    fn notify(&self, kind: ChangeKind, annotation: Option<&str>) {
        self.sink.on_change(&ChangeEvent {
            kind,
            graph: self.current(),
            annotation,
        });
    }
}
