//! State hierarchy model.
//!
//! States own regions, regions own sub-states. A state with more than one
//! region is orthogonal: while it is active, every one of its regions has an
//! active sub-state of its own.

mod transition;
mod tree;

pub(crate) use transition::Transition;
pub(crate) use tree::{RegionKey, StateKey, StateTree};
