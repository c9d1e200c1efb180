// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Linear undo/redo history of committed graph snapshots.
//!
//! The history is a stack of [`Edit`]s with a cursor. Position 0 is the base
//! edit (the graph the history was opened with); every commit appends after
//! the cursor, discarding anything that was ahead of it. Undo and redo only
//! move the cursor, so both are O(1): each edit holds a whole immutable
//! [`Graph`] that shares structure with its neighbours.
use std::collections::VecDeque;

use crate::graph::{Difference, Graph};
use crate::ident::EntityId;

/// One committed, named point in history. Immutable once committed.
#[derive(Debug, Clone)]
pub struct Edit {
    graph: Graph,
    annotation: Option<String>,
    selected_ids: Vec<EntityId>,
    difference: Difference,
}

impl Edit {
    fn base(graph: Graph) -> Self {
        Self {
            graph,
            annotation: None,
            selected_ids: Vec::new(),
            difference: Difference::default(),
        }
    }

    /// The committed graph.
    #[must_use]
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Human-readable description, if one was given at commit time.
    #[must_use]
    pub fn annotation(&self) -> Option<&str> {
        self.annotation.as_deref()
    }

    /// Entity ids selected when the edit was committed.
    #[must_use]
    pub fn selected_ids(&self) -> &[EntityId] {
        &self.selected_ids
    }

    /// Changes relative to the edit before it.
    #[must_use]
    pub fn difference(&self) -> &Difference {
        &self.difference
    }
}

/// Ordered edits plus a cursor; the cursor's edit is current.
#[derive(Debug, Clone)]
pub struct History {
    /// `edits[0]` is the base; never empty.
    edits: VecDeque<Edit>,
    cursor: usize,
    max_history: usize,
    /// Stack position matching the last save, if still reachable.
    saved: Option<usize>,
}

impl History {
    /// Opens a history on `base`, keeping at most `max_history` undoable
    /// edits (`0` for no limit).
    #[must_use]
    pub fn new(base: Graph, max_history: usize) -> Self {
        Self {
            edits: VecDeque::from([Edit::base(base)]),
            cursor: 0,
            max_history,
            saved: Some(0),
        }
    }

    /// The edit at the cursor.
    #[must_use]
    pub fn current(&self) -> &Edit {
        &self.edits[self.cursor]
    }

    /// The graph at the cursor.
    #[must_use]
    pub fn graph(&self) -> &Graph {
        self.current().graph()
    }

    /// The oldest retained graph.
    #[must_use]
    pub fn base(&self) -> &Graph {
        self.edits[0].graph()
    }

    /// Cursor position: the number of edits that can be undone.
    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Number of retained committed edits (undoable plus redoable).
    #[must_use]
    pub fn len(&self) -> usize {
        self.edits.len() - 1
    }

    /// `true` if nothing has been committed (or everything was collapsed).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Retained committed edits, oldest first, excluding the base.
    pub fn edits(&self) -> impl Iterator<Item = &Edit> {
        self.edits.iter().skip(1)
    }

    /// Appends an edit after the cursor and moves the cursor onto it.
    ///
    /// Edits ahead of the cursor are discarded. When the retained count
    /// exceeds the limit, the oldest edit becomes the new base.
    pub fn push(
        &mut self,
        graph: Graph,
        annotation: Option<String>,
        selected_ids: Vec<EntityId>,
    ) -> &Edit {
        let difference = self.graph().difference(&graph);
        self.edits.truncate(self.cursor + 1);
        if self.saved.is_some_and(|s| s > self.cursor) {
            self.saved = None;
        }
        self.edits.push_back(Edit {
            graph,
            annotation,
            selected_ids,
            difference,
        });
        self.cursor += 1;

        if self.max_history > 0 {
            while self.len() > self.max_history {
                self.edits.pop_front();
                self.cursor -= 1;
                self.saved = self.saved.and_then(|s| s.checked_sub(1));
                if let Some(base) = self.edits.front_mut() {
                    base.difference = Difference::default();
                }
            }
        }
        self.current()
    }

    /// Moves the cursor back one edit, returning the edit that was undone.
    ///
    /// `None` at the base; nothing moves.
    pub fn undo(&mut self) -> Option<&Edit> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        self.edits.get(self.cursor + 1)
    }

    /// Moves the cursor forward one edit, returning the edit redone.
    ///
    /// `None` when nothing is ahead of the cursor; nothing moves.
    pub fn redo(&mut self) -> Option<&Edit> {
        if !self.can_redo() {
            return None;
        }
        self.cursor += 1;
        self.edits.get(self.cursor)
    }

    /// `true` if [`History::undo`] would move.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    /// `true` if [`History::redo`] would move.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.edits.len()
    }

    /// Annotation of the edit [`History::undo`] would undo.
    #[must_use]
    pub fn undo_annotation(&self) -> Option<&str> {
        if self.can_undo() {
            self.current().annotation()
        } else {
            None
        }
    }

    /// Annotation of the edit [`History::redo`] would redo.
    #[must_use]
    pub fn redo_annotation(&self) -> Option<&str> {
        self.edits.get(self.cursor + 1).and_then(Edit::annotation)
    }

    /// Records the cursor position as saved.
    pub fn mark_saved(&mut self) {
        self.saved = Some(self.cursor);
    }

    /// `true` unless the cursor sits on the last saved position.
    #[must_use]
    pub fn has_unsaved_changes(&self) -> bool {
        self.saved != Some(self.cursor)
    }

    /// Drops every committed edit, returning to the base.
    pub fn reset(&mut self) {
        self.edits.truncate(1);
        self.cursor = 0;
        if self.saved != Some(0) {
            self.saved = None;
        }
    }
}
