//! Selection of the transitions an event fires.
//!
//! Every active leaf starts a chain that climbs towards the root one level
//! per round. All chains sitting at the current level are evaluated, then
//! moved to their super states. Chains that reach the same state are merged,
//! so a shared ancestor is asked at most once, and a chain that already fired
//! a transition never asks its ancestors again.

use crate::core::{ActionError, EventId, StateId, TransitionContext};
use crate::hierarchy::{StateKey, StateTree};

/// A transition selected for firing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Candidate {
    /// Active leaf whose chain selected the transition.
    pub(crate) leaf: StateKey,
    /// State declaring the transition.
    pub(crate) state: StateKey,
    /// Position of the transition among the state's transitions for the event.
    pub(crate) index: usize,
}

pub(crate) struct GuardFailure {
    pub(crate) leaf: StateKey,
    pub(crate) error: ActionError,
}

#[derive(Default)]
pub(crate) struct Resolution {
    pub(crate) candidates: Vec<Candidate>,
    pub(crate) guard_failures: Vec<GuardFailure>,
}

#[derive(Debug, Clone, Copy)]
struct Chain {
    state: StateKey,
    level: usize,
    leaf: StateKey,
    consumed: bool,
}

/// Resolve `event` against the active leaves.
///
/// `context` builds the context a guard sees for a given leaf. A guard that
/// fails counts as not passing; its error is returned for reporting.
pub(crate) fn resolve<S, E, F>(
    tree: &StateTree<S, E>,
    leaves: &[StateKey],
    event: &E,
    context: F,
) -> Resolution
where
    S: StateId,
    E: EventId,
    F: Fn(StateKey) -> TransitionContext<S, E>,
{
    let mut resolution = Resolution::default();
    let mut frontier: Vec<Chain> = leaves
        .iter()
        .map(|leaf| Chain {
            state: *leaf,
            level: tree.state(*leaf).level,
            leaf: *leaf,
            consumed: false,
        })
        .collect();

    let mut level = frontier.iter().map(|chain| chain.level).max().unwrap_or(0);

    while !frontier.is_empty() && level > 0 {
        frontier.sort_by(|a, b| {
            b.level
                .cmp(&a.level)
                .then_with(|| tree.id(a.state).cmp(tree.id(b.state)))
        });
        merge(&mut frontier);

        let mut climbed = Vec::with_capacity(frontier.len());
        for mut chain in frontier {
            if chain.level == level {
                if !chain.consumed {
                    let ctx = context(chain.leaf);
                    if let Some(index) =
                        transition_to_fire(tree, chain.state, event, &ctx, &mut resolution, chain.leaf)
                    {
                        chain.consumed = true;
                        resolution.candidates.push(Candidate {
                            leaf: chain.leaf,
                            state: chain.state,
                            index,
                        });
                    }
                }
                match tree.state(chain.state).super_state {
                    Some(parent) => {
                        chain.state = parent;
                        chain.level -= 1;
                    }
                    None => continue,
                }
            }
            climbed.push(chain);
        }
        frontier = climbed;
        level -= 1;
    }

    resolution
}

/// Collapse chains that reached the same state.
fn merge(frontier: &mut Vec<Chain>) {
    let mut merged: Vec<Chain> = Vec::with_capacity(frontier.len());
    for chain in frontier.drain(..) {
        match merged.iter_mut().find(|existing| existing.state == chain.state) {
            Some(existing) => existing.consumed |= chain.consumed,
            None => merged.push(chain),
        }
    }
    *frontier = merged;
}

/// First transition of `state` for `event` whose guard passes.
fn transition_to_fire<S: StateId, E: EventId>(
    tree: &StateTree<S, E>,
    state: StateKey,
    event: &E,
    context: &TransitionContext<S, E>,
    resolution: &mut Resolution,
    leaf: StateKey,
) -> Option<usize> {
    for (index, transition) in tree.transitions(state, event).iter().enumerate() {
        match transition.will_fire(context) {
            Ok(true) => return Some(index),
            Ok(false) => {}
            Err(error) => resolution.guard_failures.push(GuardFailure { leaf, error }),
        }
    }
    None
}
