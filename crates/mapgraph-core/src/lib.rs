// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! mapgraph-core: versioned OSM entity graph for map editing.
//!
//! The crate has three layers:
//!
//! - [`Graph`]: an immutable snapshot of nodes, ways and relations with
//!   derived parent-way and parent-relation indices. Every change returns a
//!   new graph that shares untouched structure with the old one.
//! - [`Action`]: bound-parameter value objects applied as pure
//!   `Graph -> Graph` transforms (see [`actions`]).
//! - [`Editor`]: a staging graph for live previews on top of a linear
//!   undo/redo [`History`] of committed, annotated edits.
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
#![allow(
    clippy::must_use_candidate,
    clippy::return_self_not_must_use,
    clippy::missing_const_for_fn,
    clippy::redundant_pub_crate,
    clippy::module_name_repetitions,
    clippy::use_self
)]

mod action;
pub mod actions;
mod config;
mod digest;
mod editor;
mod entity;
mod graph;
mod history;
mod ident;
mod sink;

/// Action protocol, composition and precondition reporting.
pub use action::{from_fn, Action, ActionError, ApplyFn, Compose, DisabledReason, FnAction};
/// Editor configuration and its storage port.
pub use config::{
    ConfigError, ConfigService, ConfigStore, EditorConfig, MemoryConfigStore,
    DEFAULT_MAX_HISTORY, EDITOR_CONFIG_KEY,
};
/// Canonical BLAKE3 digests of graph state.
pub use digest::{graph_digest, graph_digest_hex};
/// Staging editor over a linear history.
pub use editor::{CommitOptions, Editor, EditorState, Navigation, Outcome};
/// Entity value types.
pub use entity::{has_interesting_tags, Entity, Loc, Member, Node, Relation, Tags, Way};
/// Immutable entity graph.
pub use graph::{Difference, Graph, GraphError};
/// Committed edits.
pub use history::{Edit, History};
/// Identifiers.
pub use ident::{EntityId, EntityKind, Hash};
/// Change notifications.
pub use sink::{ChangeEvent, ChangeKind, ChangeSink, NullSink, TracingSink};
