// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Change notifications.
//!
//! The editor never exposes its current graph by mutable reference. Instead,
//! after each call that changes what `current()` returns it hands the new
//! snapshot to a [`ChangeSink`]. Sinks can clone the snapshot cheaply and keep
//! reading it while the editor moves on.
use std::fmt;

use tracing::info;

use crate::digest::graph_digest;
use crate::graph::Graph;

/// Which editor call produced a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    /// An action was applied to the staging graph.
    Perform,
    /// Staging was sealed into a history edit.
    Commit,
    /// Staging was discarded.
    Rollback,
    /// The history cursor moved back.
    Undo,
    /// The history cursor moved forward.
    Redo,
    /// History was cleared back to its base.
    Reset,
}

impl ChangeKind {
    /// Lowercase name used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Perform => "perform",
            Self::Commit => "commit",
            Self::Rollback => "rollback",
            Self::Undo => "undo",
            Self::Redo => "redo",
            Self::Reset => "reset",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A change notification: the call that caused it and the resulting current graph.
#[derive(Debug, Clone, Copy)]
pub struct ChangeEvent<'a> {
    /// The editor call.
    pub kind: ChangeKind,
    /// The editor's current graph after the call.
    pub graph: &'a Graph,
    /// Annotation of the edit involved (commit, undo, redo), if any.
    pub annotation: Option<&'a str>,
}

/// Receiver for editor change notifications.
pub trait ChangeSink: Send + Sync {
    /// Called synchronously after each change.
    fn on_change(&self, event: &ChangeEvent<'_>);
}

/// Sink that drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ChangeSink for NullSink {
    fn on_change(&self, _event: &ChangeEvent<'_>) {}
}

/// Sink that logs each event (with the graph digest) at `info` level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl ChangeSink for TracingSink {
    fn on_change(&self, event: &ChangeEvent<'_>) {
        let digest = graph_digest(event.graph);
        info!(
            kind = %event.kind,
            entities = event.graph.len(),
            annotation = event.annotation.unwrap_or(""),
            digest = %hex::encode(&digest[..8]),
            "graph changed"
        );
    }
}
