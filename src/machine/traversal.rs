//! Exit and entry paths between states.
//!
//! `state_changes` walks the source and the target up towards their common
//! ancestor. States passed on the source side are exited, states passed on the
//! target side are entered. `None` stands for the synthetic root above every
//! root state.
//!
//! History is resolved separately with `entry_sequence`, after the exits ran,
//! so the history pointers written by those exits are taken into account.

use crate::core::{EventId, HistoryType, StateId};
use crate::hierarchy::{RegionKey, StateKey, StateTree};

/// Compute the states to exit and to enter when moving from `from` to `to`
/// on the way to `destination`.
///
/// Exits are emitted while climbing from the source side, entries while
/// climbing back down into the target, so `entries` ends with `destination`.
pub(crate) fn state_changes<S: StateId, E: EventId>(
    tree: &StateTree<S, E>,
    from: Option<StateKey>,
    to: Option<StateKey>,
    destination: StateKey,
    exits: &mut Vec<StateKey>,
    entries: &mut Vec<StateKey>,
) {
    if from == Some(destination) {
        exits.push(destination);
        entries.push(destination);
    } else if from == to {
        // meeting point
    } else if tree.super_state(from) == tree.super_state(to) {
        exits.extend(from);
        entries.extend(to);
    } else if tree.level(from) > tree.level(to) {
        exits.extend(from);
        state_changes(tree, tree.super_state(from), to, destination, exits, entries);
    } else if tree.level(from) < tree.level(to) {
        state_changes(tree, from, tree.super_state(to), destination, exits, entries);
        entries.extend(to);
    } else {
        exits.extend(from);
        state_changes(
            tree,
            tree.super_state(from),
            tree.super_state(to),
            destination,
            exits,
            entries,
        );
        entries.extend(to);
    }
}

/// Expand an exit list so every state is preceded by its active descendants.
///
/// Leaving an orthogonal state leaves every one of its regions, not only the
/// region the transition started in.
pub(crate) fn with_active_descendants<S: StateId, E: EventId>(
    tree: &StateTree<S, E>,
    exits: &[StateKey],
) -> Vec<StateKey> {
    let mut expanded: Vec<StateKey> = Vec::with_capacity(exits.len());
    for state in exits {
        for descendant in tree.active_descendants(*state) {
            if !expanded.contains(&descendant) {
                expanded.push(descendant);
            }
        }
        if !expanded.contains(state) {
            expanded.push(*state);
        }
    }
    expanded
}

/// Resolve the full entry sequence for an entry path.
///
/// The path is entered as computed. The destination then descends according
/// to its own history type. Finally every composite state on the path enters
/// the regions the path did not pass through, using that state's history.
pub(crate) fn entry_sequence<S: StateId, E: EventId>(
    tree: &StateTree<S, E>,
    path: &[StateKey],
) -> Vec<StateKey> {
    let mut entries = path.to_vec();
    let Some(destination) = path.last().copied() else {
        return entries;
    };

    descend(
        tree,
        destination,
        tree.state(destination).history,
        &mut entries,
    );

    for pair in path.windows(2) {
        let (state, next) = (pair[0], pair[1]);
        let Some(through) = tree.state(next).region else {
            continue;
        };
        if tree.state(next).super_state != Some(state) {
            continue;
        }
        let history = tree.state(state).history;
        for region in &tree.state(state).regions {
            if *region != through {
                descend_region(tree, *region, history, &mut entries);
            }
        }
    }

    entries
}

/// Descend from `state` into each of its regions.
pub(crate) fn descend<S: StateId, E: EventId>(
    tree: &StateTree<S, E>,
    state: StateKey,
    history: HistoryType,
    out: &mut Vec<StateKey>,
) {
    for region in &tree.state(state).regions {
        descend_region(tree, *region, history, out);
    }
}

fn descend_region<S: StateId, E: EventId>(
    tree: &StateTree<S, E>,
    region: RegionKey,
    history: HistoryType,
    out: &mut Vec<StateKey>,
) {
    let region = tree.region(region);
    let remembered = history.remembers().then_some(region.last_active).flatten();

    let (next, below) = match remembered {
        Some(state) => (Some(state), history.below()),
        None => (region.initial, HistoryType::None),
    };

    if let Some(next) = next {
        out.push(next);
        descend(tree, next, below, out);
    }
}
