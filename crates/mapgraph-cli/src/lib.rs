// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! mapgraph CLI: replay JSON edit scripts against the editor core.

pub mod cli;
pub mod fs_store;
pub mod script;
