// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Built-in editing actions.
//!
//! Each action is a plain struct holding its bound parameters and implements
//! [`Action`](crate::Action). Constructing an action never touches a graph;
//! applying it is a pure function of the input graph.
//!
//! | Action | Effect |
//! |---|---|
//! | [`AddEntity`] | insert a new entity |
//! | [`ChangeTags`] | replace an entity's tags |
//! | [`MoveNode`] | set a node's location |
//! | [`AddMidpoint`] | splice a node into every way holding an edge |
//! | [`RestrictTurn`] | build a `type=restriction` relation |
//! | [`DeleteNode`], [`DeleteWay`], [`DeleteRelation`] | cascading removal |

mod add_entity;
mod add_midpoint;
mod change_tags;
mod delete;
mod move_node;
mod restrict_turn;

pub use add_entity::AddEntity;
pub use add_midpoint::{AddMidpoint, Midpoint};
pub use change_tags::ChangeTags;
pub use delete::{DeleteNode, DeleteRelation, DeleteWay};
pub use move_node::MoveNode;
pub use restrict_turn::{RestrictTurn, Turn, TurnLeg, Via};
